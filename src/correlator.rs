// ABOUTME: Correlates responses to requests by sequence number and receipts to submissions by message id
// ABOUTME: The short-lived map doubles as the in-flight window; the long-lived map may be persisted

use std::collections::HashMap;
use std::future::Future;
use tokio::time::Instant;

use crate::datatypes::{CommandId, SubmitSm};
use crate::error::{SmppError, SmppResult};

/// Lowest valid sequence number.
pub const MIN_SEQUENCE_NUMBER: u32 = 0x0000_0001;
/// Highest valid sequence number; the counter wraps back to 1 past this.
pub const MAX_SEQUENCE_NUMBER: u32 = 0x7FFF_FFFF;

/// What kind of request is awaiting a response.
#[derive(Clone, Debug)]
pub enum PendingKind {
    /// A user message; carries the original request so its `log_id` and
    /// `extra_data` can be surfaced with the outcome.
    Submit { submit: Box<SubmitSm> },
    /// A keepalive probe; an expiry here means the connection is dead.
    EnquireLink,
    /// A graceful-shutdown unbind.
    Unbind,
}

/// An in-flight request awaiting its response.
#[derive(Clone, Debug)]
pub struct PendingRequest {
    pub sequence_number: u32,
    /// The response command that would complete this request.
    pub expected: CommandId,
    pub kind: PendingKind,
    pub deadline: Instant,
}

/// A submitted message awaiting its delivery receipt.
///
/// Keyed by the SMSC-assigned message id from `submit_sm_resp`; receipts
/// can arrive days later, so implementations may persist this map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub log_id: String,
    pub extra_data: String,
    pub submitted_at: Instant,
}

/// Correlation storage used by the session.
///
/// The sequence-number map is bounded (it is the request window); the
/// delivery map is unbounded from the core's point of view and may be
/// backed by durable storage, which is why its accessors are async and
/// may fail with [`SmppError::StorageError`].
pub trait Correlator: Send {
    /// Next sequence number: monotonically increasing, wrapping from
    /// 0x7FFFFFFF back to 1. Zero is reserved and never returned.
    fn next_sequence(&mut self) -> u32;

    /// Register an in-flight request, taking a window slot.
    ///
    /// Fails with [`SmppError::WindowFull`] when the window is saturated.
    fn put(&mut self, pending: PendingRequest) -> SmppResult<()>;

    /// Remove and return the request matching a response's sequence
    /// number, releasing its window slot.
    fn get(&mut self, sequence_number: u32) -> Option<PendingRequest>;

    /// Whether another request may currently be admitted.
    fn has_capacity(&self) -> bool;

    /// Number of requests currently in flight.
    fn in_flight(&self) -> usize;

    /// Store a receipt-awaiting record under the SMSC message id.
    fn put_delivery(
        &mut self,
        smsc_message_id: &str,
        log_id: String,
        extra_data: String,
    ) -> impl Future<Output = SmppResult<()>> + Send;

    /// Remove and return the record for a receipt's message id.
    fn get_delivery(
        &mut self,
        smsc_message_id: &str,
    ) -> impl Future<Output = SmppResult<Option<DeliveryRecord>>> + Send;

    /// Remove and return every pending request whose deadline has passed.
    fn expire(&mut self, now: Instant) -> Vec<PendingRequest>;

    /// Remove and return all pending requests, regardless of deadline.
    /// Called on session teardown so each waiter can be failed.
    fn drain(&mut self) -> Vec<PendingRequest>;
}

/// The in-memory reference correlator.
///
/// Suitable for transmit-only use and for tests; submit-to-receipt
/// correlation is lost on restart, so production receivers should plug in
/// an implementation with a durable delivery map.
#[derive(Debug)]
pub struct InMemoryCorrelator {
    sequence: u32,
    window: usize,
    pending: HashMap<u32, PendingRequest>,
    deliveries: HashMap<String, DeliveryRecord>,
}

impl InMemoryCorrelator {
    pub fn new(window: usize) -> Self {
        InMemoryCorrelator {
            sequence: MIN_SEQUENCE_NUMBER - 1,
            window,
            pending: HashMap::new(),
            deliveries: HashMap::new(),
        }
    }

    /// Number of receipt-awaiting records currently held.
    pub fn delivery_records(&self) -> usize {
        self.deliveries.len()
    }

    /// Drop delivery records older than `age`. The core imposes no TTL;
    /// this is the user-driven eviction knob.
    pub fn evict_older_than(&mut self, age: tokio::time::Duration) {
        let Some(cutoff) = Instant::now().checked_sub(age) else {
            return;
        };
        self.deliveries
            .retain(|_, record| record.submitted_at > cutoff);
    }
}

impl Default for InMemoryCorrelator {
    fn default() -> Self {
        InMemoryCorrelator::new(10)
    }
}

impl Correlator for InMemoryCorrelator {
    fn next_sequence(&mut self) -> u32 {
        self.sequence = if self.sequence >= MAX_SEQUENCE_NUMBER {
            MIN_SEQUENCE_NUMBER
        } else {
            self.sequence + 1
        };
        self.sequence
    }

    fn put(&mut self, pending: PendingRequest) -> SmppResult<()> {
        if self.pending.len() >= self.window {
            return Err(SmppError::WindowFull {
                capacity: self.window,
            });
        }
        self.pending.insert(pending.sequence_number, pending);
        Ok(())
    }

    fn get(&mut self, sequence_number: u32) -> Option<PendingRequest> {
        self.pending.remove(&sequence_number)
    }

    fn has_capacity(&self) -> bool {
        self.pending.len() < self.window
    }

    fn in_flight(&self) -> usize {
        self.pending.len()
    }

    async fn put_delivery(
        &mut self,
        smsc_message_id: &str,
        log_id: String,
        extra_data: String,
    ) -> SmppResult<()> {
        self.deliveries.insert(
            smsc_message_id.to_owned(),
            DeliveryRecord {
                log_id,
                extra_data,
                submitted_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn get_delivery(&mut self, smsc_message_id: &str) -> SmppResult<Option<DeliveryRecord>> {
        Ok(self.deliveries.remove(smsc_message_id))
    }

    fn expire(&mut self, now: Instant) -> Vec<PendingRequest> {
        let expired_keys: Vec<u32> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(&sequence, _)| sequence)
            .collect();
        let mut expired: Vec<PendingRequest> = expired_keys
            .into_iter()
            .filter_map(|sequence| self.pending.remove(&sequence))
            .collect();
        expired.sort_by_key(|pending| pending.deadline);
        expired
    }

    fn drain(&mut self) -> Vec<PendingRequest> {
        self.pending.drain().map(|(_, pending)| pending).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    fn pending(sequence: u32, deadline: Instant) -> PendingRequest {
        PendingRequest {
            sequence_number: sequence,
            expected: CommandId::EnquireLinkResp,
            kind: PendingKind::EnquireLink,
            deadline,
        }
    }

    #[test]
    fn sequence_starts_at_one() {
        let mut correlator = InMemoryCorrelator::new(4);
        assert_eq!(correlator.next_sequence(), 1);
        assert_eq!(correlator.next_sequence(), 2);
    }

    #[test]
    fn sequence_wraps_to_one() {
        let mut correlator = InMemoryCorrelator::new(4);
        correlator.sequence = MAX_SEQUENCE_NUMBER - 1;
        assert_eq!(correlator.next_sequence(), MAX_SEQUENCE_NUMBER);
        assert_eq!(correlator.next_sequence(), MIN_SEQUENCE_NUMBER);
    }

    #[tokio::test]
    async fn window_is_enforced() {
        let mut correlator = InMemoryCorrelator::new(2);
        let deadline = Instant::now() + Duration::from_secs(20);
        correlator.put(pending(1, deadline)).unwrap();
        correlator.put(pending(2, deadline)).unwrap();
        assert!(!correlator.has_capacity());
        assert!(matches!(
            correlator.put(pending(3, deadline)),
            Err(SmppError::WindowFull { capacity: 2 })
        ));

        // A response frees the slot.
        assert!(correlator.get(1).is_some());
        assert!(correlator.get(1).is_none());
        assert!(correlator.has_capacity());
        correlator.put(pending(3, deadline)).unwrap();
        assert_eq!(correlator.in_flight(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_returns_overdue_requests_in_order() {
        let mut correlator = InMemoryCorrelator::new(8);
        let now = Instant::now();
        correlator
            .put(pending(1, now + Duration::from_secs(1)))
            .unwrap();
        correlator
            .put(pending(2, now + Duration::from_secs(3)))
            .unwrap();
        correlator
            .put(pending(3, now + Duration::from_secs(2)))
            .unwrap();

        assert!(correlator.expire(now).is_empty());
        let expired = correlator.expire(now + Duration::from_secs(2));
        assert_eq!(
            expired
                .iter()
                .map(|pending| pending.sequence_number)
                .collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(correlator.in_flight(), 1);
    }

    #[tokio::test]
    async fn delivery_records_round_trip() {
        let mut correlator = InMemoryCorrelator::new(4);
        correlator
            .put_delivery("msg-9", "log-1".into(), "meta".into())
            .await
            .unwrap();
        assert_eq!(correlator.delivery_records(), 1);

        let record = correlator.get_delivery("msg-9").await.unwrap().unwrap();
        assert_eq!(record.log_id, "log-1");
        assert_eq!(record.extra_data, "meta");
        assert_eq!(correlator.get_delivery("msg-9").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_by_age() {
        let mut correlator = InMemoryCorrelator::new(4);
        correlator
            .put_delivery("old", "a".into(), String::new())
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(120)).await;
        correlator
            .put_delivery("new", "b".into(), String::new())
            .await
            .unwrap();
        correlator.evict_older_than(Duration::from_secs(60));
        assert_eq!(correlator.delivery_records(), 1);
        assert!(correlator.get_delivery("new").await.unwrap().is_some());
    }

    #[test]
    fn drain_empties_the_window() {
        let mut correlator = InMemoryCorrelator::new(4);
        let deadline = Instant::now() + Duration::from_secs(20);
        correlator.put(pending(1, deadline)).unwrap();
        correlator.put(pending(2, deadline)).unwrap();
        assert_eq!(correlator.drain().len(), 2);
        assert_eq!(correlator.in_flight(), 0);
    }
}
