//! # Summary
//!
//! This module implements the state shared between connection tasks: the
//! connection table, the failed-peer set, and the readiness barrier. We
//! wrap it in an `Arc` so every per-peer task can hold a handle, and only
//! expose narrow accessors that do their check-then-set inside a single
//! critical section.

use std::collections::HashMap as Map;
use std::collections::HashSet as Set;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::internal;
use crate::message;
use crate::registry;
use crate::state;

/// Thread-safe handle to the mesh state.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct Mesh<P: state::Payload>(Arc<State<P>>);

/// Connection status for a single peer. Flags only ever go from `false` to `true`.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Link<P: state::Payload> {
    pub outbound: bool,
    pub inbound: bool,

    /// Private outbound queue, claimed by whichever connector wins the dial
    #[derivative(Debug = "ignore")]
    rx: Option<internal::Rx<message::Basic<P>>>,
}

pub struct State<P: state::Payload> {
    registry: registry::Registry,
    links: Mutex<Map<String, Link<P>>>,
    failed: Mutex<Set<String>>,
    failure_tx: internal::Tx<String>,
    ready: watch::Sender<bool>,
}

impl<P: state::Payload> Mesh<P> {

    /// Initializes the table with one link per peer, each owning the receiving
    /// end of that peer's private outbound channel.
    ///
    /// Returns the sending ends, keyed by peer, and the receiver for failure
    /// notifications.
    pub fn new(registry: registry::Registry) -> (
        Self,
        Map<String, internal::Tx<message::Basic<P>>>,
        internal::Rx<String>,
    ) {
        let mut links = Map::default();
        let mut peer_txs = Map::default();
        for peer in registry.all() {
            let (rx, tx) = internal::new();
            peer_txs.insert(peer.id.clone(), tx);
            links.insert(peer.id.clone(), Link {
                outbound: false,
                inbound: false,
                rx: Some(rx),
            });
        }
        let (failure_rx, failure_tx) = internal::new();
        let (ready, _) = watch::channel(false);
        let mesh = Mesh(Arc::new(State {
            registry,
            links: Mutex::new(links),
            failed: Mutex::new(Set::default()),
            failure_tx,
            ready,
        }));
        (mesh, peer_txs, failure_rx)
    }

    /// Identifier of this node.
    pub fn id(&self) -> &str {
        &self.0.registry.me().id
    }

    pub fn registry(&self) -> &registry::Registry {
        &self.0.registry
    }

    pub fn peer(&self, id: &str) -> Option<&registry::Peer> {
        self.0.registry.get(id)
    }

    /// Marks the outbound link to `id` as established, unless another connector
    /// already did. Only the winner receives the peer's outbound queue.
    pub fn try_mark_outbound(&self, id: &str) -> Option<internal::Rx<message::Basic<P>>> {
        let mut links = self.0.links.lock();
        let link = links.get_mut(id)?;
        if link.outbound { return None }
        link.outbound = true;
        let rx = link.rx.take();
        self.publish(&links);
        rx
    }

    /// Marks the inbound link from `id` as established.
    ///
    /// Returns `None` for an unknown peer, otherwise whether the outbound link
    /// to that peer is already up.
    pub fn mark_inbound(&self, id: &str) -> Option<bool> {
        let mut links = self.0.links.lock();
        let link = links.get_mut(id)?;
        link.inbound = true;
        let outbound = link.outbound;
        self.publish(&links);
        Some(outbound)
    }

    /// Whether every peer has both directions established.
    pub fn is_ready(&self) -> bool {
        *self.0.ready.borrow()
    }

    /// Resolves once every peer has both directions established.
    pub async fn wait_ready(&self) {
        let mut ready = self.0.ready.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    /// Records that the outbound stream to `id` broke.
    pub fn mark_failed(&self, id: &str) {
        if self.0.failed.lock().insert(id.to_string()) {
            warn!("marking {} as failed", id);
            self.0.failure_tx.try_send(id.to_string());
        }
    }

    pub fn is_failed(&self, id: &str) -> bool {
        self.0.failed.lock().contains(id)
    }

    /// Snapshot of the failed-peer set.
    pub fn failed(&self) -> Vec<String> {
        let mut failed = self.0.failed.lock().iter().cloned().collect::<Vec<_>>();
        failed.sort();
        failed
    }

    /// Flips the readiness barrier exactly once. Called with the table lock held.
    fn publish(&self, links: &Map<String, Link<P>>) {
        if *self.0.ready.borrow() { return }
        if links.values().all(|link| link.inbound && link.outbound) {
            info!("all {} peers connected", links.len());
            self.0.ready.send_replace(true);
        }
    }
}

/// Source of failure information for quorum and skip-ahead decisions.
pub trait Detector {
    fn is_failed(&self, id: &str) -> bool;
}

impl<P: state::Payload> Detector for Mesh<P> {
    fn is_failed(&self, id: &str) -> bool {
        Mesh::is_failed(self, id)
    }
}

impl Detector for Set<String> {
    fn is_failed(&self, id: &str) -> bool {
        self.contains(id)
    }
}
