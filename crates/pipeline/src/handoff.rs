//! Zero-capacity channel: a send completes only once the receiver has taken
//! the item, so a busy consumer holds the producer back.

use futures::channel::{mpsc, oneshot};
use futures::future::poll_fn;
use futures::StreamExt;
use thiserror::Error;

type Envelope<T> = (T, oneshot::Sender<()>);

pub fn handoff<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (tx, rx) = mpsc::channel(0);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

/// The receiving side is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("receiver disconnected")]
pub struct Disconnected;

pub struct HandoffSender<T> {
    tx: mpsc::Sender<Envelope<T>>,
}

impl<T> HandoffSender<T> {
    /// Hand `item` over, waiting until the receiver has taken it.
    pub async fn send(&mut self, item: T) -> Result<(), Disconnected> {
        poll_fn(|cx| self.tx.poll_ready(cx))
            .await
            .map_err(|_| Disconnected)?;

        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .try_send((item, ack_tx))
            .map_err(|_| Disconnected)?;

        // Cancelled means the receiver was dropped with the item still queued.
        ack_rx.await.map_err(|_| Disconnected)
    }
}

pub struct HandoffReceiver<T> {
    rx: mpsc::Receiver<Envelope<T>>,
}

impl<T> HandoffReceiver<T> {
    /// Next item, or `None` once the sender is dropped.
    pub async fn recv(&mut self) -> Option<T> {
        let (item, ack) = self.rx.next().await?;
        let _ = ack.send(());
        Some(item)
    }
}
