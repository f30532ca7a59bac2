//! # Summary
//!
//! Reliable broadcast on top of the connection layer's fan-out.
//!
//! Every message gets a globally unique identifier. The first time a node
//! sees an identifier it relays the message to all of its links and then
//! delivers it locally; any later copy is dropped. The originator feeds its
//! own messages straight back into its receiver, so its own delivery never
//! depends on the network.
//!
//! The set of seen identifiers only grows. Any peer may relay an old message
//! again, and forgetting its identifier would deliver it twice.

use std::collections::HashSet as Set;

use crate::error::DecodeError;
use crate::internal::{Rx, Tx};
use crate::message;
use crate::state;

/// Assigns identifiers to outgoing messages.
pub struct Writer<P: state::Payload> {
    id: String,
    counter: u64,
    rx: Rx<message::Outgoing<P>>,

    /// Connection layer write side
    basic_tx: Tx<message::Basic<P>>,

    /// Local loop-back into our own receiver
    inbound_tx: Tx<message::Basic<P>>,
}

impl<P: state::Payload> Writer<P> {
    pub fn new(
        id: String,
        rx: Rx<message::Outgoing<P>>,
        basic_tx: Tx<message::Basic<P>>,
        inbound_tx: Tx<message::Basic<P>>,
    ) -> Self {
        Writer { id, counter: 0, rx, basic_tx, inbound_tx }
    }

    /// Wraps a message with the next identifier from this node.
    pub fn stamp(&mut self, outgoing: message::Outgoing<P>) -> message::Basic<P> {
        let id = format!("{},{}", self.id, self.counter);
        self.counter += 1;
        message::Reliable {
            origin: self.id.clone(),
            id,
            payload: outgoing.payload,
            transaction: outgoing.transaction,
            destination: outgoing.destination,
        }.into_basic()
    }

    pub async fn run(mut self) {
        while let Some(outgoing) = self.rx.recv().await {
            let basic = self.stamp(outgoing);
            self.basic_tx.send(basic.clone());
            self.inbound_tx.send(basic);
        }
    }
}

/// Outcome of handing a message to the receiver.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub enum Received<P: state::Payload> {
    /// First copy: relay this (if anything) to every link, then deliver the message
    Fresh {
        relay: Option<message::Basic<P>>,
        message: message::Reliable<P>,
    },

    /// Already delivered
    Duplicate,
}

/// Deduplicates and relays incoming messages.
pub struct Receiver<P: state::Payload> {
    id: String,
    received: Set<String>,
    rx: Rx<message::Basic<P>>,
    basic_tx: Tx<message::Basic<P>>,
    reliable_tx: Tx<message::Reliable<P>>,
}

impl<P: state::Payload> Receiver<P> {
    pub fn new(
        id: String,
        rx: Rx<message::Basic<P>>,
        basic_tx: Tx<message::Basic<P>>,
        reliable_tx: Tx<message::Reliable<P>>,
    ) -> Self {
        Receiver {
            id,
            received: Set::default(),
            rx,
            basic_tx,
            reliable_tx,
        }
    }

    pub fn receive(&mut self, basic: message::Basic<P>) -> Result<Received<P>, DecodeError> {
        let message = message::Reliable::from_basic(basic.clone())?;
        if !self.received.insert(message.id.clone()) {
            return Ok(Received::Duplicate)
        }
        let relay = if basic.origin != self.id { Some(basic) } else { None };
        Ok(Received::Fresh { relay, message })
    }

    pub async fn run(mut self) {
        while let Some(basic) = self.rx.recv().await {
            match self.receive(basic) {
            | Ok(Received::Fresh { relay, message }) => {
                trace!("delivering {}", message.id);
                if let Some(relay) = relay {
                    self.basic_tx.send(relay);
                }
                self.reliable_tx.send(message);
            }
            | Ok(Received::Duplicate) => (),
            | Err(error) => warn!("dropping malformed message: {}", error),
            }
        }
    }
}
