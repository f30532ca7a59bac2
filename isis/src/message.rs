//! # Summary
//!
//! Envelopes for each layer of the stack, and the translations between them.
//!
//! Only `Basic` ever crosses the network. The reliable layer carries its
//! identifier inside `Basic::payload` as `<id>:<payload>`, and the ordering
//! layer carries its `Kind` inside the reliable payload as bincode.

use serde_derive::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::state::Payload;

/// Separator between the reliable identifier and the wrapped payload.
const SEPARATOR: u8 = b':';

/// Position in the global delivery order.
///
/// Field order matters: the derived ordering compares `sequence` first and
/// breaks ties with the lexicographically larger `node`, which makes this a
/// strict total order shared by every peer.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority {
    pub sequence: u64,
    pub node: String,
}

impl Priority {
    pub fn new<S: Into<String>>(sequence: u64, node: S) -> Self {
        Priority { sequence, node: node.into() }
    }
}

/// Unit of wire transmission.
#[derive(Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct Basic<P: Payload> {
    /// Node that created the reliable message inside
    pub origin: String,

    /// Encoded upper-layer content
    pub payload: Vec<u8>,

    pub transaction: P,

    /// `None` for broadcast, otherwise the only peer that should receive it
    pub destination: Option<String>,
}

/// Message handed to the reliable layer, before it has been assigned an identifier.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct Outgoing<P: Payload> {
    pub payload: Vec<u8>,
    pub transaction: P,
    pub destination: Option<String>,
}

/// Message with a globally unique identifier, used for deduplication.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct Reliable<P: Payload> {
    pub origin: String,
    pub id: String,
    pub payload: Vec<u8>,
    pub transaction: P,
    pub destination: Option<String>,
}

impl<P: Payload> Reliable<P> {
    pub fn into_basic(self) -> Basic<P> {
        let mut payload = Vec::with_capacity(self.id.len() + 1 + self.payload.len());
        payload.extend_from_slice(self.id.as_bytes());
        payload.push(SEPARATOR);
        payload.extend_from_slice(&self.payload);
        Basic {
            origin: self.origin,
            payload,
            transaction: self.transaction,
            destination: self.destination,
        }
    }

    pub fn from_basic(basic: Basic<P>) -> Result<Self, DecodeError> {
        let split = basic.payload
            .iter()
            .position(|byte| *byte == SEPARATOR)
            .ok_or(DecodeError::Separator)?;
        let id = std::str::from_utf8(&basic.payload[..split])?.to_string();
        let payload = basic.payload[split + 1..].to_vec();
        Ok(Reliable {
            origin: basic.origin,
            id,
            payload,
            transaction: basic.transaction,
            destination: basic.destination,
        })
    }
}

/// Role of a message in the agreement protocol.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Original multicast awaiting ordering
    Request,

    /// A peer's suggested priority, unicast to the originator
    Proposal(Priority),

    /// Final priority chosen by the originator
    Agreement(Priority),
}

/// Total-order envelope.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct Isis<P: Payload> {
    pub origin: String,

    /// Reliable identifier of this particular message
    pub id: String,

    pub transaction: P,
    pub destination: Option<String>,
    pub kind: Kind,
}

impl<P: Payload> Isis<P> {
    pub fn decode(reliable: Reliable<P>) -> Result<Self, DecodeError> {
        let kind = bincode::deserialize(&reliable.payload)?;
        Ok(Isis {
            origin: reliable.origin,
            id: reliable.id,
            transaction: reliable.transaction,
            destination: reliable.destination,
            kind,
        })
    }

    pub fn encode(kind: &Kind, transaction: P, destination: Option<String>) -> Result<Outgoing<P>, bincode::Error> {
        Ok(Outgoing {
            payload: bincode::serialize(kind)?,
            transaction,
            destination,
        })
    }
}

/// Totally ordered message handed to the application.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct Delivery<P: Payload> {
    /// Node that submitted the message
    pub origin: String,
    pub transaction: P,

    /// Agreed position in the global order
    pub priority: Priority,
}
