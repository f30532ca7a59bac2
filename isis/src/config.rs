use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, Error};
use crate::handle::Handle;
use crate::internal;
use crate::registry::Registry;
use crate::shared;
use crate::state;
use crate::thread;

#[derive(Clone, Debug)]
pub struct Config<P> {
    /// Static peer set, ourselves included
    registry: Registry,

    /// Delay between the mesh becoming ready and the first payload write
    grace: Duration,

    /// Age after which a stuck message from a failed origin is dropped
    liveness: Duration,

    /// Period of the delivery sweep
    sweep: Duration,

    _marker: std::marker::PhantomData<P>,
}

impl<P: state::Payload> Config<P> {
    pub fn new(registry: Registry) -> Self {
        Config {
            registry,
            grace: Duration::from_secs(5),
            liveness: Duration::from_secs(10),
            sweep: Duration::from_secs(1),
            _marker: Default::default(),
        }
    }

    /// Reads the peer list at `path` and runs as node `id`.
    pub fn load<A: AsRef<Path>>(id: &str, path: A) -> Result<Self, ConfigError> {
        Registry::load(id, path).map(Self::new)
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn with_liveness_bound(mut self, liveness: Duration) -> Self {
        self.liveness = liveness;
        self
    }

    pub fn with_sweep_interval(mut self, sweep: Duration) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Binds the listener and spawns every layer of the stack onto the
    /// current runtime. Connecting to peers continues in the background.
    pub async fn run(self) -> Result<Handle<P>, Error> {
        let id = self.registry.me().id.clone();
        let nodes = self.registry
            .all()
            .map(|peer| peer.id.clone())
            .collect::<Vec<_>>();

        let (mesh, peer_txs, failure_rx) = shared::Mesh::new(self.registry);
        let (inbound_rx, inbound_tx) = internal::new();
        let (outgoing_rx, outgoing_tx) = internal::new();
        let (reliable_rx, reliable_tx) = internal::new();
        let (submit_rx, submit_tx) = internal::new();
        let (delivery_rx, delivery_tx) = internal::new();

        let basic_tx = thread::basic::setup(
            mesh.clone(),
            peer_txs,
            inbound_tx.clone(),
            self.grace,
        ).await?;

        let writer = thread::reliable::Writer::new(
            id.clone(),
            outgoing_rx,
            basic_tx.clone(),
            inbound_tx,
        );

        let receiver = thread::reliable::Receiver::new(
            id.clone(),
            inbound_rx,
            basic_tx,
            reliable_tx,
        );

        let agreement = thread::ordering::Agreement::new(
            thread::ordering::Ordering::new(id, nodes, self.liveness),
            mesh.clone(),
            submit_rx,
            reliable_rx,
            failure_rx,
            outgoing_tx,
            delivery_tx,
            self.sweep,
        );

        tokio::spawn(writer.run());
        tokio::spawn(receiver.run());
        tokio::spawn(agreement.run());

        Ok(Handle::new(mesh, submit_tx, delivery_rx))
    }
}
