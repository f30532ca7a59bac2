//! # Summary
//!
//! Holding area for messages awaiting agreement, or awaiting their turn
//! once agreed. The front of the queue is the entry with the smallest
//! priority. Entries are found by transaction identifier, since agreeing
//! on a priority moves an entry away from where it was inserted.

use std::collections::BTreeMap;
use std::collections::HashMap as Map;
use std::time::Instant;

use crate::message::Priority;
use crate::state::Payload;

/// Message waiting in the queue.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct Entry<P: Payload> {
    /// Node that submitted the message
    pub origin: String,

    pub transaction: P,

    /// Local proposal until agreed, agreed priority afterwards
    pub priority: Priority,

    /// Set only once the agreed priority is known
    pub deliverable: bool,

    /// Local insertion time, for the liveness bound
    pub created: Instant,
}

/// Priority-ordered queue with lookup by transaction identifier.
#[derive(Derivative)]
#[derivative(Default(bound = ""), Debug(bound = ""))]
pub struct Queue<P: Payload> {
    order: BTreeMap<(Priority, P::ID), Entry<P>>,
    index: Map<P::ID, Priority>,
}

impl<P: Payload> Queue<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, id: &P::ID) -> bool {
        self.index.contains_key(id)
    }

    /// Inserts an entry, replacing any entry with the same transaction identifier.
    pub fn push(&mut self, entry: Entry<P>) {
        let id = entry.transaction.id();
        if let Some(stale) = self.index.insert(id.clone(), entry.priority.clone()) {
            self.order.remove(&(stale, id.clone()));
        }
        self.order.insert((entry.priority.clone(), id), entry);
    }

    /// Moves the entry for `id` to its agreed priority and marks it deliverable.
    /// Returns `false` if there is no such entry.
    pub fn agree(&mut self, id: &P::ID, priority: Priority) -> bool {
        let current = match self.index.get_mut(id) {
        | Some(current) => current,
        | None => return false,
        };
        let stale = std::mem::replace(current, priority.clone());
        let mut entry = match self.order.remove(&(stale, id.clone())) {
        | Some(entry) => entry,
        | None => return false,
        };
        entry.priority = priority.clone();
        entry.deliverable = true;
        self.order.insert((priority, id.clone()), entry);
        true
    }

    /// Entry with the smallest priority.
    pub fn front(&self) -> Option<&Entry<P>> {
        self.order.values().next()
    }

    /// Removes and returns the entry with the smallest priority.
    pub fn pop(&mut self) -> Option<Entry<P>> {
        let ((_, id), entry) = self.order.pop_first()?;
        self.index.remove(&id);
        Some(entry)
    }

    /// Entries in delivery order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Entry<P>> {
        self.order.values()
    }
}
