//! # Summary
//!
//! This module abstracts over connections to peer servers.
//!
//! Uses `tokio_util`'s length-delimited codec over an asynchronous stream,
//! with every frame holding exactly one `bincode`-encoded value. This lets
//! us send Rust structs through a TCP connection with minimal boilerplate
//! on the sending and receiving ends. Each stream is used in a single
//! direction, so the halves are never split.

use std::marker::PhantomData;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use crate::error::SocketError;

/// External receiving channel. Expects length-delimited, bincode-encoded
/// Rust data of type `T`.
pub struct Rx<T, S = TcpStream> {
    inner: FramedRead<S, LengthDelimitedCodec>,
    _marker: PhantomData<fn() -> T>,
}

/// External transmission channel. Sends length-delimited, bincode-encoded
/// Rust data of type `T`.
pub struct Tx<T, S = TcpStream> {
    inner: FramedWrite<S, LengthDelimitedCodec>,
    _marker: PhantomData<fn(T)>,
}

impl<T, S> Rx<T, S>
where T: serde::de::DeserializeOwned,
      S: AsyncRead + Unpin,
{
    pub fn new(stream: S) -> Self {
        Rx {
            inner: FramedRead::new(stream, LengthDelimitedCodec::new()),
            _marker: PhantomData,
        }
    }

    /// Reads the next value, or `None` on a clean end of stream.
    pub async fn recv(&mut self) -> Result<Option<T>, SocketError> {
        match self.inner.next().await {
        | None => Ok(None),
        | Some(frame) => Ok(Some(bincode::deserialize(&frame?)?)),
        }
    }
}

impl<T, S> Tx<T, S>
where T: serde::Serialize,
      S: AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Tx {
            inner: FramedWrite::new(stream, LengthDelimitedCodec::new()),
            _marker: PhantomData,
        }
    }

    /// Writes and flushes a single value.
    pub async fn send(&mut self, item: &T) -> Result<(), SocketError> {
        let frame = bincode::serialize(item)?;
        self.inner.send(Bytes::from(frame)).await?;
        Ok(())
    }
}
