//! Error types for the multicast stack.
//!
//! Only `ConfigError` and `Error` are fatal. `SocketError` ends a single
//! peer link and `DecodeError` drops a single message.

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the static peer list.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read peer list {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected `<id> <host> <port>`, found {content:?}")]
    Malformed { line: usize, content: String },

    #[error("line {line}: invalid port {port:?}")]
    Port { line: usize, port: String },

    #[error("peer {0:?} listed more than once")]
    Duplicate(String),

    #[error("peer id {0:?} contains a reserved character (':' or ',')")]
    Reserved(String),

    #[error("node {0:?} is not in the peer list")]
    Missing(String),
}

/// Fatal errors while starting a node.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not listen on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Failure on an established peer stream.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Malformed payload while translating between layers.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("reliable payload has no identifier separator")]
    Separator,

    #[error("reliable identifier is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed total-order content: {0}")]
    Content(#[from] bincode::Error),
}
