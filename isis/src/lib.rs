#[macro_use] extern crate derivative;
#[macro_use] extern crate log;

mod config;
mod error;
mod handle;
mod internal;
mod message;
mod queue;
mod registry;
mod shared;
mod socket;
mod state;
mod thread;

pub use crate::config::Config;
pub use crate::error::{ConfigError, DecodeError, Error, SocketError};
pub use crate::handle::Handle;
pub use crate::internal::{Rx, Tx};
pub use crate::message::{Delivery, Priority};
pub use crate::registry::{Peer, Registry};
pub use crate::state::{Identifier, Payload};
