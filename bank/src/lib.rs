mod ledger;
mod timeline;
mod transaction;

pub use crate::ledger::{Ledger, LedgerError};
pub use crate::timeline::Timeline;
pub use crate::transaction::{Generator, Operation, ParseError, Transaction};
