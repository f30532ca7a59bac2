//! # Summary
//!
//! Static peer membership, loaded once at startup.
//!
//! The peer list file starts with a header line, which is ignored, followed
//! by one `<id> <host> <port>` line per peer. The local node is listed
//! alongside everyone else and is picked out by identifier.

use std::collections::HashSet as Set;
use std::path::Path;

use crate::error::ConfigError;

/// Address and identity of a single node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Peer {
    pub id: String,
    pub host: String,
    pub port: u16,
}

impl Peer {
    /// Dialable `host:port` address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The fixed peer set, split into this node and everyone else.
#[derive(Clone, Debug)]
pub struct Registry {
    me: Peer,
    others: Vec<Peer>,
}

impl Registry {
    /// Builds a registry from an explicit peer list.
    pub fn new(id: &str, peers: Vec<Peer>) -> Result<Self, ConfigError> {
        let mut seen = Set::new();
        let mut me = None;
        let mut others = Vec::with_capacity(peers.len());
        for peer in peers {
            if peer.id.contains(':') || peer.id.contains(',') {
                return Err(ConfigError::Reserved(peer.id))
            }
            if !seen.insert(peer.id.clone()) {
                return Err(ConfigError::Duplicate(peer.id))
            }
            if peer.id == id {
                me = Some(peer);
            } else {
                others.push(peer);
            }
        }
        let me = me.ok_or_else(|| ConfigError::Missing(id.to_string()))?;
        Ok(Registry { me, others })
    }

    /// Parses the contents of a peer list file.
    pub fn parse(id: &str, text: &str) -> Result<Self, ConfigError> {
        let mut peers = Vec::new();
        for (index, content) in text.lines().enumerate().skip(1) {
            if content.trim().is_empty() { continue }
            let line = index + 1;
            let mut fields = content.split_whitespace();
            let (id, host, port) = match (fields.next(), fields.next(), fields.next()) {
            | (Some(id), Some(host), Some(port)) => (id, host, port),
            | _ => return Err(ConfigError::Malformed { line, content: content.to_string() }),
            };
            let port = port.parse::<u16>()
                .map_err(|_| ConfigError::Port { line, port: port.to_string() })?;
            peers.push(Peer {
                id: id.to_string(),
                host: host.to_string(),
                port,
            });
        }
        Self::new(id, peers)
    }

    /// Reads and parses a peer list file.
    pub fn load<P: AsRef<Path>>(id: &str, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::parse(id, &text)
    }

    pub fn me(&self) -> &Peer {
        &self.me
    }

    pub fn others(&self) -> &[Peer] {
        &self.others
    }

    /// Every peer including this node.
    pub fn all(&self) -> impl Iterator<Item = &Peer> {
        std::iter::once(&self.me).chain(self.others.iter())
    }

    pub fn len(&self) -> usize {
        self.others.len() + 1
    }

    pub fn get(&self, id: &str) -> Option<&Peer> {
        self.all().find(|peer| peer.id == id)
    }
}
