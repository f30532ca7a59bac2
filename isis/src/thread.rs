//! # Summary
//!
//! This module contains all of the long-running tasks of the multicast stack.
//!
//! Each layer only talks to the layers directly above and below it, through
//! unbounded channels:
//!
//! ```text
//! application -> ordering -> reliable::Writer -> forward -> peer::Outbound -> TCP
//! TCP -> peer::Inbound -> reliable::Receiver -> ordering -> application
//! ```

/// Connection layer setup.
pub(crate) mod basic;

/// Connection layer fan-out.
pub(crate) mod forward;

/// Total-order (ISIS) agreement.
pub(crate) mod ordering;

/// Per-peer streams.
pub(crate) mod peer;

/// Flood-based reliable broadcast.
pub(crate) mod reliable;
