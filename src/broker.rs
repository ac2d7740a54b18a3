// ABOUTME: The queue of outgoing user messages the session pulls from
// ABOUTME: Pluggable so applications can back it with durable storage

use std::future::Future;
use tokio::sync::{mpsc, Mutex};

use crate::datatypes::SubmitSm;
use crate::error::{SmppError, SmppResult};

/// The outbound message queue capability.
///
/// The session dequeues whenever it is bound for transmit, a window slot
/// is free and the writer is not throttled. Implementations must make
/// `dequeue` cancel-safe: a dequeue future dropped by the session loop
/// must not lose a message.
pub trait Broker: Send + Sync + 'static {
    /// Queue a message for submission. May await storage; never blocks
    /// the caller beyond that.
    fn enqueue(&self, message: SubmitSm) -> impl Future<Output = SmppResult<()>> + Send;

    /// Wait until a message is available and take it.
    fn dequeue(&self) -> impl Future<Output = SubmitSm> + Send;
}

/// In-memory bounded queue, the default broker.
#[derive(Debug)]
pub struct InMemoryBroker {
    sender: mpsc::Sender<SubmitSm>,
    receiver: Mutex<mpsc::Receiver<SubmitSm>>,
}

impl InMemoryBroker {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        InMemoryBroker {
            sender,
            receiver: Mutex::new(receiver),
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        InMemoryBroker::new(2500)
    }
}

impl Broker for InMemoryBroker {
    async fn enqueue(&self, message: SubmitSm) -> SmppResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| SmppError::SessionClosed)
    }

    async fn dequeue(&self) -> SubmitSm {
        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(message) => message,
            // The broker holds its own sender, so the channel cannot
            // close while it is alive.
            None => std::future::pending::<SubmitSm>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(log_id: &str) -> SubmitSm {
        SubmitSm {
            log_id: log_id.to_owned(),
            ..SubmitSm::default()
        }
    }

    #[tokio::test]
    async fn fifo_order() {
        let broker = InMemoryBroker::new(8);
        broker.enqueue(message("first")).await.unwrap();
        broker.enqueue(message("second")).await.unwrap();
        assert_eq!(broker.dequeue().await.log_id, "first");
        assert_eq!(broker.dequeue().await.log_id, "second");
    }

    #[tokio::test]
    async fn dequeue_waits_for_producer() {
        let broker = std::sync::Arc::new(InMemoryBroker::new(2));
        let consumer = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.dequeue().await.log_id })
        };
        tokio::task::yield_now().await;
        broker.enqueue(message("late")).await.unwrap();
        assert_eq!(consumer.await.unwrap(), "late");
    }
}
