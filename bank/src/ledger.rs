use std::collections::BTreeMap;

use thiserror::Error;

use crate::transaction::Operation;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {account:?} has {balance}, cannot transfer {amount}")]
    Insufficient {
        account: String,
        balance: u64,
        amount: u64,
    },

    #[error("balance of {0:?} would overflow")]
    Overflow(String),
}

/// Account balances, applied in delivery order.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    accounts: BTreeMap<String, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &str) -> u64 {
        self.accounts.get(account).copied().unwrap_or(0)
    }

    /// Applies `operation`, leaving every balance unchanged if it is rejected.
    pub fn apply(&mut self, operation: &Operation) -> Result<(), LedgerError> {
        match operation {
        | Operation::Deposit { account, amount } => {
            let balance = self.balance(account)
                .checked_add(*amount)
                .ok_or_else(|| LedgerError::Overflow(account.clone()))?;
            self.accounts.insert(account.clone(), balance);
        }
        | Operation::Transfer { source, destination, amount } => {
            let balance = self.balance(source);
            if balance < *amount {
                return Err(LedgerError::Insufficient {
                    account: source.clone(),
                    balance,
                    amount: *amount,
                })
            }
            if source == destination { return Ok(()) }
            let credited = self.balance(destination)
                .checked_add(*amount)
                .ok_or_else(|| LedgerError::Overflow(destination.clone()))?;
            self.accounts.insert(source.clone(), balance - amount);
            self.accounts.insert(destination.clone(), credited);
        }
        }
        Ok(())
    }
}

/// `BALANCES a:10 b:5`, listing non-zero accounts in account order.
impl std::fmt::Display for Ledger {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "BALANCES")?;
        for (account, balance) in self.accounts.iter().filter(|(_, balance)| **balance > 0) {
            write!(fmt, " {}:{}", account, balance)?;
        }
        Ok(())
    }
}
