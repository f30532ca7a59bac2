//! # Summary
//!
//! Application-facing end of a running node.

use crate::internal::{Rx, Tx};
use crate::message::Delivery;
use crate::shared::Mesh;
use crate::state;

pub struct Handle<P: state::Payload> {
    mesh: Mesh<P>,
    tx: Tx<P>,
    rx: Rx<Delivery<P>>,
}

impl<P: state::Payload> Handle<P> {
    pub(crate) fn new(mesh: Mesh<P>, tx: Tx<P>, rx: Rx<Delivery<P>>) -> Self {
        Handle { mesh, tx, rx }
    }

    pub fn id(&self) -> &str {
        self.mesh.id()
    }

    /// Multicasts `transaction` in total order. Returns immediately; the
    /// transaction comes back through `next` once its position is agreed.
    pub fn submit(&self, transaction: P) {
        self.tx.send(transaction)
    }

    /// Next totally ordered delivery.
    pub async fn next(&mut self) -> Option<Delivery<P>> {
        self.rx.recv().await
    }

    /// Resolves once every peer is connected in both directions.
    pub async fn ready(&self) {
        self.mesh.wait_ready().await
    }

    pub fn is_ready(&self) -> bool {
        self.mesh.is_ready()
    }

    /// Peers whose outbound stream has broken, sorted.
    pub fn failed(&self) -> Vec<String> {
        self.mesh.failed()
    }

    /// Separates submission from delivery so each can move to its own task.
    pub fn split(self) -> (Tx<P>, Rx<Delivery<P>>) {
        (self.tx, self.rx)
    }
}
