//! # Summary
//!
//! Starts the connection layer: binds the listening socket, dials every
//! peer (ourselves included, so bookkeeping is uniform), accepts the
//! inbound streams, and starts the fan-out task.

use std::collections::HashMap as Map;

use tokio::net::TcpListener;

use crate::error::Error;
use crate::internal;
use crate::message;
use crate::shared;
use crate::state;
use crate::thread::{forward, peer};

/// Brings up the mesh and returns the connection layer's write side.
///
/// Returns as soon as the listener is bound. Connections are made in the
/// background, and anything written before the mesh is ready is queued.
pub async fn setup<P: state::Payload>(
    mesh: shared::Mesh<P>,
    peer_txs: Map<String, internal::Tx<message::Basic<P>>>,
    inbound_tx: internal::Tx<message::Basic<P>>,
    grace: std::time::Duration,
) -> Result<internal::Tx<message::Basic<P>>, Error> {
    let port = mesh.registry().me().port;
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|source| Error::Bind { port, source })?;

    info!("{} listening on port {}", mesh.id(), port);

    let connection = peer::Connection {
        mesh: mesh.clone(),
        inbound_tx,
        grace,
    };

    for node in mesh.registry().all() {
        tokio::spawn(peer::Outbound::new(node.clone(), connection.clone()).run());
    }

    tokio::spawn(accept(listener, connection));

    let (basic_rx, basic_tx) = internal::new();
    tokio::spawn(forward::Forward::new(basic_rx, peer_txs).run());
    Ok(basic_tx)
}

/// Hands every inbound stream to its own task until each peer has both
/// directions up. Accepting stops there, so a duplicate dial during startup
/// cannot use up a slot meant for a slower peer.
async fn accept<P: state::Payload>(listener: TcpListener, connection: peer::Connection<P>) {
    let mesh = connection.mesh.clone();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
            | Ok((stream, address)) => {
                debug!("accepted connection from {}", address);
                stream.set_nodelay(true).ok();
                tokio::spawn(peer::Inbound::new(stream, connection.clone()).run());
            }
            | Err(error) => warn!("failed to accept connection: {}", error),
            },
            _ = mesh.wait_ready() => {
                debug!("mesh complete, no longer accepting connections");
                return
            }
        }
    }
}
