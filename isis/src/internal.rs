//! # Summary
//!
//! This module abstracts over internal connections between tasks.
//!
//! Currently backed by `tokio::sync::mpsc` unbounded channels. Since the
//! channels are unbounded, the only way for a send to fail is if the
//! receiving task has exited. Every layer of the stack keeps running
//! over whatever peers survive, so a closed receiver is logged and the
//! message is discarded instead of tearing the sender down.

use tokio::sync::mpsc;

/// Intra-process receiving channel.
#[derive(Debug)]
pub struct Rx<T>(mpsc::UnboundedReceiver<T>);

/// Intra-process transmission channel. All clones send to the same receiving end.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
#[derive(Debug)]
pub struct Tx<T>(mpsc::UnboundedSender<T>);

/// Create a new pair of linked receiving and transmitting channels.
pub fn new<T>() -> (Rx<T>, Tx<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Rx(rx), Tx(tx))
}

impl<T> Tx<T> {
    /// Push a message through the channel.
    /// Logs and drops the message if the receiving end has been dropped.
    pub fn send(&self, message: T) {
        if self.0.send(message).is_err() {
            warn!("[INTERNAL ERROR]: receiver dropped");
        }
    }

    /// Attempt to send a message through the channel.
    /// Returns `false` if the receiving end has been dropped.
    pub fn try_send(&self, message: T) -> bool {
        self.0.send(message).is_ok()
    }

    /// Whether the receiving end has been dropped.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

impl<T> Rx<T> {
    /// Waits for the next message, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.0.recv().await
    }

    /// Takes the next message if one is already buffered.
    pub fn try_recv(&mut self) -> Option<T> {
        self.0.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {

    #[tokio::test]
    async fn test_clones_share_receiver() {
        let (mut rx, tx) = super::new();
        let other = tx.clone();
        tx.send(1);
        other.send(2);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn test_send_after_close() {
        let (rx, tx) = super::new::<usize>();
        drop(rx);
        assert!(tx.is_closed());
        assert!(!tx.try_send(1));
        tx.send(2);
    }
}
