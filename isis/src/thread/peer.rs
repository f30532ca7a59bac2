//! # Summary
//!
//! This module defines the two halves of a link to a peer server.
//!
//! Every pair of nodes is joined by two TCP streams, one dialed by each
//! side, and each stream only carries traffic in the dialing direction.
//! `Outbound` dials, introduces itself, waits for the whole mesh to come up
//! and then writes queued messages. `Inbound` learns who dialed it from the
//! handshake and pushes everything it reads into the reliable layer.

use serde_derive::{Deserialize, Serialize};
use tokio::net::TcpStream;

use crate::error::SocketError;
use crate::internal;
use crate::message;
use crate::registry;
use crate::shared;
use crate::socket;
use crate::state;

/// Frames exchanged between peers.
#[derive(Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub enum In<P: state::Payload> {
    /// Handshake naming the dialing node
    Connect(String),
    Message(message::Basic<P>),
}

/// Context shared by every connection task.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct Connection<P: state::Payload> {
    pub mesh: shared::Mesh<P>,

    /// Shared inbound channel into the reliable layer
    pub inbound_tx: internal::Tx<message::Basic<P>>,

    /// Delay between the mesh becoming ready and the first write
    pub grace: std::time::Duration,
}

/// Outgoing half of a peer link.
pub struct Outbound<P: state::Payload> {
    peer: registry::Peer,
    connection: Connection<P>,
}

impl<P: state::Payload> Outbound<P> {
    pub fn new(peer: registry::Peer, connection: Connection<P>) -> Self {
        Outbound { peer, connection }
    }

    pub async fn run(self) {
        let Outbound { peer, connection } = self;
        let mesh = connection.mesh;

        let stream = match TcpStream::connect(peer.address()).await {
        | Ok(stream) => stream,
        | Err(error) => {
            debug!("trying to connect to {} but failed: {}", peer.id, error);
            return
        }
        };

        // Another connector may have raced us to this peer.
        let mut rx = match mesh.try_mark_outbound(&peer.id) {
        | Some(rx) => rx,
        | None => {
            debug!("already connected to {}, dropping duplicate stream", peer.id);
            return
        }
        };

        stream.set_nodelay(true).ok();
        let mut peer_tx = socket::Tx::<In<P>>::new(stream);
        let hello = In::Connect(mesh.id().to_string());

        let result = match peer_tx.send(&hello).await {
        | Ok(()) => {
            debug!("connection message sent to {}, waiting for ready", peer.id);
            mesh.wait_ready().await;
            debug!("ready, sleeping {:?} before sending to {}", connection.grace, peer.id);
            tokio::time::sleep(connection.grace).await;
            Self::send_loop(&peer.id, &mut rx, &mut peer_tx).await
        }
        | Err(error) => Err(error),
        };

        if let Err(error) = result {
            warn!("lost connection to {}: {}", peer.id, error);
            mesh.mark_failed(&peer.id);
        }

        // Keep the fan-out from piling up messages for a dead peer.
        while rx.recv().await.is_some() {}
    }

    /// Writes queued messages until the stream breaks.
    async fn send_loop(
        peer_id: &str,
        rx: &mut internal::Rx<message::Basic<P>>,
        peer_tx: &mut socket::Tx<In<P>>,
    ) -> Result<(), SocketError> {
        while let Some(message) = rx.recv().await {
            trace!("sending {:?} to {}", message, peer_id);
            peer_tx.send(&In::Message(message)).await?;
        }
        Ok(())
    }
}

/// Incoming half of a peer link.
pub struct Inbound<P: state::Payload> {
    peer_rx: socket::Rx<In<P>>,
    connection: Connection<P>,
}

impl<P: state::Payload> Inbound<P> {
    pub fn new(stream: TcpStream, connection: Connection<P>) -> Self {
        Inbound {
            peer_rx: socket::Rx::new(stream),
            connection,
        }
    }

    pub async fn run(mut self) {
        let mesh = self.connection.mesh.clone();

        let peer_id = match self.peer_rx.recv().await {
        | Ok(Some(In::Connect(peer_id))) => peer_id,
        | Ok(Some(In::Message(_))) => {
            warn!("received a message before any handshake, dropping stream");
            return
        }
        | Ok(None) => return,
        | Err(error) => {
            debug!("failed to read handshake: {}", error);
            return
        }
        };

        match mesh.mark_inbound(&peer_id) {
        | None => {
            warn!("unknown peer {} connected, dropping stream", peer_id);
            return
        }
        | Some(true) => (),
        | Some(false) => {
            // They dialed us before we managed to dial them.
            if let Some(peer) = mesh.peer(&peer_id).cloned() {
                tokio::spawn(Outbound::new(peer, self.connection.clone()).run());
            }
        }
        }

        info!("connected from {}", peer_id);

        // A broken inbound stream ends this task without marking the peer failed.
        loop {
            match self.peer_rx.recv().await {
            | Ok(Some(In::Message(message))) => {
                trace!("received {:?} from {}", message, peer_id);
                self.connection.inbound_tx.send(message);
            }
            | Ok(Some(In::Connect(_))) => (),
            | Ok(None) => {
                info!("disconnected from {}", peer_id);
                return
            }
            | Err(error) => {
                warn!("dropping stream from {}: {}", peer_id, error);
                return
            }
            }
        }
    }
}
