//! # Summary
//!
//! Drives a set of `bank-node` processes through a scripted scenario:
//! starting them, feeding them transactions, crashing some of them, and
//! finally interrupting the survivors so they write their timelines.

use std::collections::HashMap as Map;
use std::path::PathBuf;

use log::{error, info, warn};

mod command;
mod node;

pub use crate::command::{Command, Scenario};
pub use crate::node::Node;

/// Settings shared by every node in a scenario.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Path to the `bank-node` binary
    pub node: PathBuf,

    /// Peer list shared by every node
    pub config: PathBuf,

    /// Directory for the nodes' transaction timelines
    pub log_dir: PathBuf,

    /// Grace period passed on to every node (in milliseconds)
    pub grace_ms: Option<u64>,

    pub verbose: u8,
}

/// Executes `scenario`, then interrupts every node still running.
pub fn run(scenario: Scenario, settings: &Settings) {
    let mut nodes: Map<String, Node> = Map::default();

    for command in scenario.0 {
        info!("executing {:?}", command);
        match command {
        | Command::Start { id } => {
            match Node::spawn(settings, &id) {
            | Ok(node) => { nodes.insert(id, node); }
            | Err(error) => error!("could not start {}: {}", id, error),
            }
        }
        | Command::Submit { id, line } => {
            match nodes.get_mut(&id).map(|node| node.submit(&line)) {
            | Some(Ok(())) => (),
            | Some(Err(error)) => warn!("could not submit to {}: {}", id, error),
            | None => warn!("{} is not running", id),
            }
        }
        | Command::Crash { id } => {
            match nodes.remove(&id) {
            | Some(mut node) => node.kill(),
            | None => warn!("{} is not running", id),
            }
        }
        | Command::Sleep { ms } => {
            std::thread::sleep(std::time::Duration::from_millis(ms))
        }
        }
    }

    info!("scenario complete, stopping {} nodes", nodes.len());
    for (id, mut node) in nodes {
        if let Err(error) = node.stop() {
            warn!("could not interrupt {}: {}", id, error);
        }
    }
}
