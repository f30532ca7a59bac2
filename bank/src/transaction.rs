use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("unknown transaction type {0:?}")]
    Unknown(String),

    #[error("expected `DEPOSIT <account> <amount>`, found {0:?}")]
    Deposit(String),

    #[error("expected `TRANSFER <from> -> <to> <amount>`, found {0:?}")]
    Transfer(String),

    #[error("invalid amount {0:?}")]
    Amount(String),
}

/// Ledger operation, as typed on standard input.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Deposit {
        account: String,
        amount: u64,
    },
    Transfer {
        source: String,
        destination: String,
        amount: u64,
    },
}

fn amount(token: &str) -> Result<u64, ParseError> {
    token.parse().map_err(|_| ParseError::Amount(token.to_string()))
}

impl std::str::FromStr for Operation {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = s.split_whitespace().collect::<Vec<_>>();
        match tokens.as_slice() {
        | [] => Err(ParseError::Empty),
        | ["DEPOSIT", account, value] => Ok(Operation::Deposit {
            account: account.to_string(),
            amount: amount(value)?,
        }),
        | ["DEPOSIT", ..] => Err(ParseError::Deposit(s.trim().to_string())),
        | ["TRANSFER", source, "->", destination, value] => Ok(Operation::Transfer {
            source: source.to_string(),
            destination: destination.to_string(),
            amount: amount(value)?,
        }),
        | ["TRANSFER", ..] => Err(ParseError::Transfer(s.trim().to_string())),
        | [other, ..] => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Uniquely identified operation submitted by one node.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub operation: Operation,
}

impl isis::Payload for Transaction {
    type ID = String;
    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Numbers the transactions submitted by a single node.
#[derive(Clone, Debug)]
pub struct Generator {
    node: String,
    count: usize,
}

impl Generator {
    pub fn new<S: Into<String>>(node: S) -> Self {
        Generator { node: node.into(), count: 0 }
    }

    /// Identifiers are `<node>_<n>_T` with `n` counting from zero.
    pub fn next(&mut self, operation: Operation) -> Transaction {
        let id = format!("{}_{}_T", self.node, self.count);
        self.count += 1;
        Transaction { id, operation }
    }
}
