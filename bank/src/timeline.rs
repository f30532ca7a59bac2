//! Per-node record of when each transaction was generated and delivered,
//! written as CSV on shutdown for offline latency analysis.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_derive::Serialize;

#[derive(Serialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
struct Event {
    transaction_id: String,

    /// Nanoseconds since the Unix epoch
    time: u64,
}

#[derive(Debug, Default)]
pub struct Timeline {
    events: Vec<Event>,
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Records an event for `transaction_id` at the current time.
    pub fn record<S: Into<String>>(&mut self, transaction_id: S) {
        self.events.push(Event {
            transaction_id: transaction_id.into(),
            time: now(),
        });
    }

    /// `<dir>/<node>_transactions_log.csv`
    pub fn path<A: AsRef<Path>>(dir: A, node: &str) -> PathBuf {
        dir.as_ref().join(format!("{}_transactions_log.csv", node))
    }

    pub fn write<A: AsRef<Path>>(&self, path: A) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        if self.events.is_empty() {
            writer.write_record(["transaction_id", "time"])?;
        }
        for event in &self.events {
            writer.serialize(event)?;
        }
        writer.flush()?;
        Ok(())
    }
}
