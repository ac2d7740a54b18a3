// ABOUTME: User callback capability invoked around every wire event
// ABOUTME: Hooks run inline in the session; a slow hook backpressures the whole session

use std::future::Future;
use tracing::{debug, trace, warn};

use crate::datatypes::Pdu;
use crate::error::SmppError;

/// Observer callbacks for wire traffic and send failures.
///
/// All three methods run inline in the session task: they are called in
/// strict wire order, and a hook that suspends for long slows the whole
/// session down. Applications wanting isolation should post to their own
/// queue and return. Hooks cannot fail; whatever they need to signal goes
/// through their own channels.
pub trait Hook: Send + Sync + 'static {
    /// Called just before `bytes` is written to the socket.
    fn sending(&self, pdu: &Pdu, bytes: &[u8], client_id: &str)
        -> impl Future<Output = ()> + Send;

    /// Called after every inbound frame. `pdu` is `None` when the frame
    /// could not be decoded; `bytes` always holds the raw frame.
    fn received(
        &self,
        pdu: Option<&Pdu>,
        bytes: &[u8],
        client_id: &str,
    ) -> impl Future<Output = ()> + Send;

    /// Called when an outgoing message is dropped: encode or validation
    /// failure, request timeout, or session teardown with the request
    /// still in flight. Each failed message is surfaced exactly once.
    fn send_error(
        &self,
        pdu: &Pdu,
        error: &SmppError,
        client_id: &str,
    ) -> impl Future<Output = ()> + Send;
}

/// Default hook: logs every event through `tracing` and nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingHook;

impl Hook for LoggingHook {
    async fn sending(&self, pdu: &Pdu, bytes: &[u8], client_id: &str) {
        trace!(
            client_id,
            command = ?pdu.command_id(),
            sequence_number = pdu.sequence_number,
            pdu_len = bytes.len(),
            "sending PDU"
        );
    }

    async fn received(&self, pdu: Option<&Pdu>, bytes: &[u8], client_id: &str) {
        match pdu {
            Some(pdu) => trace!(
                client_id,
                command = ?pdu.command_id(),
                sequence_number = pdu.sequence_number,
                status = %pdu.command_status,
                pdu_len = bytes.len(),
                "received PDU"
            ),
            None => debug!(client_id, pdu_len = bytes.len(), "received undecodable frame"),
        }
    }

    async fn send_error(&self, pdu: &Pdu, error: &SmppError, client_id: &str) {
        warn!(
            client_id,
            command = ?pdu.command_id(),
            sequence_number = pdu.sequence_number,
            %error,
            "outgoing message failed"
        );
    }
}
