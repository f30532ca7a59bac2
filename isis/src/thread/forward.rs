//! # Summary
//!
//! Fan-out for the connection layer. A single task copies every outgoing
//! message into each peer's private queue, finishing one message before
//! taking the next, so every peer sees the same relative order.

use std::collections::HashMap as Map;

use crate::internal::{Rx, Tx};
use crate::message;
use crate::state;

pub struct Forward<P: state::Payload> {
    rx: Rx<message::Basic<P>>,
    peer_txs: Map<String, Tx<message::Basic<P>>>,
}

impl<P: state::Payload> Forward<P> {
    pub fn new(rx: Rx<message::Basic<P>>, peer_txs: Map<String, Tx<message::Basic<P>>>) -> Self {
        Forward { rx, peer_txs }
    }

    /// Broadcasts go to every peer including ourselves. Unicasts are routed
    /// straight to the addressee instead of being filtered at every peer.
    pub fn forward(&self, message: message::Basic<P>) {
        match &message.destination {
        | Some(id) => match self.peer_txs.get(id) {
            | Some(tx) => tx.send(message),
            | None => warn!("dropping message for unknown peer {}", id),
            },
        | None => {
            for tx in self.peer_txs.values() {
                tx.send(message.clone());
            }
        }
        }
    }

    pub async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            self.forward(message);
        }
    }
}

#[cfg(test)]
mod tests {

    use std::collections::HashMap as Map;

    use super::Forward;
    use crate::internal;
    use crate::message::Basic;
    use crate::message::tests::{note, Note};

    fn basic(destination: Option<&str>) -> Basic<Note> {
        Basic {
            origin: "node1".to_string(),
            payload: Vec::new(),
            transaction: note("t"),
            destination: destination.map(str::to_string),
        }
    }

    #[test]
    fn test_broadcast_and_unicast() {
        let mut peer_txs = Map::new();
        let mut peer_rxs = Map::new();
        for id in ["node1", "node2", "node3"] {
            let (rx, tx) = internal::new();
            peer_txs.insert(id.to_string(), tx);
            peer_rxs.insert(id, rx);
        }
        let (rx, _tx) = internal::new();
        let forward = Forward::new(rx, peer_txs);

        forward.forward(basic(None));
        forward.forward(basic(Some("node2")));
        forward.forward(basic(Some("node9")));

        for (id, rx) in peer_rxs.iter_mut() {
            assert!(rx.try_recv().unwrap().destination.is_none());
            let unicast = rx.try_recv();
            assert_eq!(unicast.is_some(), *id == "node2");
            assert!(rx.try_recv().is_none());
        }
    }
}
