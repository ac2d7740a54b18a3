// ABOUTME: The session actor: one select! loop drives reader, writer and timekeeper
// ABOUTME: Owns the socket and the correlator for the lifetime of one connection

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep_until, timeout, Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::broker::Broker;
use crate::codec::CodecOptions;
use crate::config::EsmeConfig;
use crate::connection::{Connection, Inbound};
use crate::correlator::{Correlator, PendingKind, PendingRequest};
use crate::datatypes::{CommandId, CommandStatus, Pdu, PduBody, SubmitSm};
use crate::error::{SmppError, SmppResult};
use crate::hook::Hook;
use crate::rate_limiter::RateLimiter;
use crate::throttle::ThrottleBackoff;

/// Lifecycle of an SMPP session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Closed,
    Connecting,
    Open,
    Binding,
    BoundTx,
    BoundRx,
    BoundTrx,
    Unbinding,
    Reconnecting,
}

impl SessionState {
    /// Outbound submit_sm is allowed in these states.
    pub fn can_transmit(self) -> bool {
        matches!(self, SessionState::BoundTx | SessionState::BoundTrx)
    }

    /// Inbound deliver_sm is processed in these states.
    pub fn can_receive(self) -> bool {
        matches!(self, SessionState::BoundRx | SessionState::BoundTrx)
    }

    pub fn is_bound(self) -> bool {
        matches!(
            self,
            SessionState::BoundTx | SessionState::BoundRx | SessionState::BoundTrx
        )
    }
}

/// Why the session loop returned.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    /// `stop()` was requested; do not reconnect.
    Stopped,
    /// The connection died or the peer unbound; reconnect with back-off.
    Reconnect,
}

/// Dial the SMSC and perform the bind handshake.
///
/// This is the `connect()` path: one attempt, errors surface to the
/// caller. On success the returned connection is bound and ready for
/// [`Session::run`].
pub(crate) async fn connect_and_bind<C, H>(
    config: &EsmeConfig,
    options: &CodecOptions,
    correlator: &mut C,
    hook: &H,
    state: &mut SessionState,
) -> SmppResult<(Connection, SessionState)>
where
    C: Correlator,
    H: Hook,
{
    *state = SessionState::Connecting;
    info!(
        client_id = %config.client_id,
        host = %config.smsc_host,
        port = config.smsc_port,
        "connecting to SMSC"
    );
    let dial = TcpStream::connect((config.smsc_host.as_str(), config.smsc_port));
    let socket = timeout(config.connect_timeout, dial)
        .await
        .map_err(|_| {
            SmppError::Transport(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "timed out dialing the SMSC",
            ))
        })??;
    let mut conn = Connection::new(socket, options.clone());
    *state = SessionState::Open;

    info!(
        client_id = %config.client_id,
        mode = config.bind_mode.description(),
        "connected, binding"
    );
    let bind = config.bind_body();
    let body = match config.bind_mode.command_id() {
        CommandId::BindTransmitter => PduBody::BindTransmitter(bind),
        CommandId::BindReceiver => PduBody::BindReceiver(bind),
        _ => PduBody::BindTransceiver(bind),
    };
    // The correlator starts at zero, so the very first bind of this
    // client uses sequence number 1.
    let sequence = correlator.next_sequence();
    let pdu = Pdu {
        command_status: CommandStatus::Ok,
        sequence_number: sequence,
        body,
    };
    let bytes = pdu.to_bytes(options)?;
    hook.sending(&pdu, &bytes, &config.client_id).await;
    conn.write_all(&bytes).await?;
    *state = SessionState::Binding;

    let expected = config
        .bind_mode
        .command_id()
        .response_id()
        .unwrap_or(CommandId::GenericNack);
    let handshake = async {
        loop {
            match conn.read_pdu().await? {
                None => {
                    return Err(SmppError::Transport(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed during bind",
                    )))
                }
                Some(Inbound::Malformed { error, frame, .. }) => {
                    hook.received(None, &frame, &config.client_id).await;
                    return Err(error);
                }
                Some(Inbound::Pdu(response, frame)) => {
                    hook.received(Some(&response), &frame, &config.client_id).await;
                    if response.command_id() == expected && response.sequence_number == sequence {
                        return Ok(response.command_status);
                    }
                    if response.command_id() == CommandId::GenericNack {
                        return Err(SmppError::BindRejected {
                            status: response.command_status,
                        });
                    }
                    // Nothing else is legal before the bind completes.
                    return Err(SmppError::DecodeError {
                        reason: format!(
                            "unexpected {:?} while waiting for the bind response",
                            response.command_id()
                        ),
                    });
                }
            }
        }
    };
    let status = timeout(config.bind_timeout, handshake)
        .await
        .map_err(|_| SmppError::BindTimeout)??;

    // ESME_RALYBND means we are somehow already bound; tolerated.
    if !matches!(status, CommandStatus::Ok | CommandStatus::AlreadyBound) {
        return Err(SmppError::BindRejected { status });
    }
    let state = config.bind_mode.bound_state();
    info!(
        client_id = %config.client_id,
        mode = config.bind_mode.description(),
        "bound to SMSC"
    );
    Ok((conn, state))
}

enum Event {
    Stop,
    Inbound(SmppResult<Option<Inbound>>),
    Outbound(SubmitSm),
    Keepalive,
    Expire,
    ThrottleResume,
}

/// One bound connection's worth of session. Created by the ESME façade
/// after [`connect_and_bind`]; drops back to the façade for reconnect
/// handling when the connection ends.
pub(crate) struct Session<'a, B, C, H, R> {
    config: &'a EsmeConfig,
    options: CodecOptions,
    broker: &'a B,
    correlator: &'a mut C,
    hook: &'a H,
    rate_limiter: &'a mut R,
    conn: Connection,
    state: SessionState,
    throttle: ThrottleBackoff,
    stop: watch::Receiver<bool>,
    last_write: Instant,
    expiry_at: Instant,
    orphan_responses: u64,
}

impl<'a, B, C, H, R> Session<'a, B, C, H, R>
where
    B: Broker,
    C: Correlator,
    H: Hook,
    R: RateLimiter,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: &'a EsmeConfig,
        options: CodecOptions,
        conn: Connection,
        state: SessionState,
        broker: &'a B,
        correlator: &'a mut C,
        hook: &'a H,
        rate_limiter: &'a mut R,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Session {
            config,
            options,
            broker,
            correlator,
            hook,
            rate_limiter,
            conn,
            state,
            throttle: ThrottleBackoff::new(config.throttle_initial, config.throttle_max),
            stop,
            last_write: Instant::now(),
            expiry_at: Instant::now() + Duration::from_secs(1),
            orphan_responses: 0,
        }
    }

    /// Drive the session until stop, transport failure or peer unbind.
    pub(crate) async fn run(&mut self) -> SessionEnd {
        loop {
            if *self.stop.borrow() {
                return self.graceful_shutdown().await;
            }

            let keepalive_at = self.last_write + self.config.enquire_link_interval;
            let throttle_at = self.throttle.paused_until();
            let can_dequeue = self.state.can_transmit()
                && self.correlator.has_capacity()
                && throttle_at.is_none();

            let event = tokio::select! {
                biased;
                _ = self.stop.changed() => Event::Stop,
                inbound = self.conn.read_pdu() => Event::Inbound(inbound),
                _ = sleep_until(self.expiry_at) => Event::Expire,
                _ = sleep_until(throttle_at.unwrap_or_else(Instant::now)),
                    if throttle_at.is_some() => Event::ThrottleResume,
                _ = sleep_until(keepalive_at), if self.state.is_bound() => Event::Keepalive,
                message = self.broker.dequeue(), if can_dequeue => Event::Outbound(message),
            };

            let end = match event {
                Event::Stop => None,
                Event::Inbound(inbound) => self.handle_inbound(inbound).await,
                Event::Outbound(message) => self.send_submit(message).await,
                Event::Keepalive => self.send_enquire_link().await,
                Event::Expire => self.handle_expirations().await,
                Event::ThrottleResume => {
                    debug!(client_id = %self.config.client_id, "throttle pause over, resuming writer");
                    self.throttle.resume();
                    None
                }
            };
            if let Some(end) = end {
                return end;
            }
        }
    }

    async fn handle_inbound(&mut self, inbound: SmppResult<Option<Inbound>>) -> Option<SessionEnd> {
        match inbound {
            Err(error) => {
                error!(client_id = %self.config.client_id, %error, "read failed");
                Some(self.teardown().await)
            }
            Ok(None) => {
                info!(client_id = %self.config.client_id, "SMSC closed the connection");
                Some(self.teardown().await)
            }
            Ok(Some(Inbound::Malformed {
                sequence_number,
                error,
                frame,
            })) => {
                warn!(
                    client_id = %self.config.client_id,
                    sequence_number,
                    %error,
                    "dropping malformed inbound frame"
                );
                self.hook.received(None, &frame, &self.config.client_id).await;
                let nack = Pdu::generic_nack(sequence_number, error.to_command_status());
                self.transmit_or_teardown(&nack).await
            }
            Ok(Some(Inbound::Pdu(pdu, frame))) => self.handle_pdu(pdu, frame).await,
        }
    }

    async fn handle_pdu(&mut self, mut pdu: Pdu, frame: bytes::Bytes) -> Option<SessionEnd> {
        if pdu.is_response() {
            self.handle_response(&mut pdu).await;
            self.hook
                .received(Some(&pdu), &frame, &self.config.client_id)
                .await;
            return None;
        }

        let sequence = pdu.sequence_number;
        match &mut pdu.body {
            PduBody::EnquireLink => {
                self.hook
                    .received(Some(&pdu), &frame, &self.config.client_id)
                    .await;
                self.transmit_or_teardown(&Pdu::enquire_link_resp(sequence))
                    .await
            }
            PduBody::Unbind => {
                info!(client_id = %self.config.client_id, "SMSC requested unbind");
                self.hook
                    .received(Some(&pdu), &frame, &self.config.client_id)
                    .await;
                let _ = self.transmit(&Pdu::unbind_resp(sequence)).await;
                Some(self.teardown().await)
            }
            PduBody::DeliverSm(deliver) => {
                if !self.state.can_receive() {
                    warn!(
                        client_id = %self.config.client_id,
                        state = ?self.state,
                        "deliver_sm outside a receive-capable state"
                    );
                    self.hook
                        .received(Some(&pdu), &frame, &self.config.client_id)
                        .await;
                    return self
                        .transmit_or_teardown(&Pdu::deliver_sm_resp(
                            sequence,
                            CommandStatus::InvalidBindStatus,
                        ))
                        .await;
                }

                if deliver.is_receipt() {
                    let receipt_id = deliver.parse_receipt().and_then(|receipt| receipt.id);
                    match receipt_id {
                        Some(message_id) => match self.correlator.get_delivery(&message_id).await {
                            Ok(Some(record)) => {
                                debug!(
                                    client_id = %self.config.client_id,
                                    smsc_message_id = %message_id,
                                    log_id = %record.log_id,
                                    "correlated delivery receipt"
                                );
                                deliver.log_id = record.log_id;
                                deliver.extra_data = record.extra_data;
                            }
                            Ok(None) => warn!(
                                client_id = %self.config.client_id,
                                smsc_message_id = %message_id,
                                "no submission matches this delivery receipt"
                            ),
                            Err(error) => {
                                // Correlation for this receipt is lost but
                                // the session keeps running.
                                error!(
                                    client_id = %self.config.client_id,
                                    %error,
                                    "delivery store lookup failed"
                                );
                                self.hook
                                    .send_error(&pdu, &error, &self.config.client_id)
                                    .await;
                            }
                        },
                        None => warn!(
                            client_id = %self.config.client_id,
                            "delivery receipt carries no message id"
                        ),
                    }
                }
                self.hook
                    .received(Some(&pdu), &frame, &self.config.client_id)
                    .await;
                self.transmit_or_teardown(&Pdu::deliver_sm_resp(sequence, CommandStatus::Ok))
                    .await
            }
            PduBody::AlertNotification(_) => {
                // One-way notification, nothing to answer.
                self.hook
                    .received(Some(&pdu), &frame, &self.config.client_id)
                    .await;
                None
            }
            PduBody::Outbind(_) => {
                warn!(
                    client_id = %self.config.client_id,
                    "ignoring outbind; this client does not accept SMSC-initiated sessions"
                );
                self.hook
                    .received(Some(&pdu), &frame, &self.config.client_id)
                    .await;
                None
            }
            _ => {
                warn!(
                    client_id = %self.config.client_id,
                    command = ?pdu.command_id(),
                    "unexpected request from SMSC"
                );
                self.hook
                    .received(Some(&pdu), &frame, &self.config.client_id)
                    .await;
                self.transmit_or_teardown(&Pdu::generic_nack(
                    sequence,
                    CommandStatus::InvalidCommandId,
                ))
                .await
            }
        }
    }

    async fn handle_response(&mut self, pdu: &mut Pdu) {
        let sequence = pdu.sequence_number;
        let status = pdu.command_status;
        let Some(pending) = self.correlator.get(sequence) else {
            // Late (already timed out), duplicate, or never ours: count
            // and drop. The hook still observes the frame.
            self.orphan_responses += 1;
            warn!(
                client_id = %self.config.client_id,
                sequence_number = sequence,
                orphan_responses = self.orphan_responses,
                "response does not match any pending request"
            );
            return;
        };
        if pdu.command_id() != pending.expected && pdu.command_id() != CommandId::GenericNack {
            warn!(
                client_id = %self.config.client_id,
                sequence_number = sequence,
                expected = ?pending.expected,
                actual = ?pdu.command_id(),
                "response command does not match the correlated request"
            );
        }

        match pending.kind {
            PendingKind::EnquireLink => {
                debug!(client_id = %self.config.client_id, "keepalive answered");
            }
            PendingKind::Unbind => {}
            PendingKind::Submit { submit } => {
                if status.is_throttling() {
                    let pause = self.throttle.on_throttled();
                    warn!(
                        client_id = %self.config.client_id,
                        status = %status,
                        pause_ms = pause.as_millis() as u64,
                        "SMSC is throttling, pausing the writer"
                    );
                } else {
                    self.throttle.on_ok();
                }

                if let PduBody::SubmitSmResp(resp) = &mut pdu.body {
                    resp.log_id = submit.log_id.clone();
                    resp.extra_data = submit.extra_data.clone();
                    if status == CommandStatus::Ok && !resp.message_id.is_empty() {
                        let message_id = resp.message_id.clone();
                        debug!(
                            client_id = %self.config.client_id,
                            smsc_message_id = %message_id,
                            log_id = %submit.log_id,
                            "storing delivery receipt correlation"
                        );
                        if let Err(error) = self
                            .correlator
                            .put_delivery(
                                &message_id,
                                submit.log_id.clone(),
                                submit.extra_data.clone(),
                            )
                            .await
                        {
                            error!(
                                client_id = %self.config.client_id,
                                %error,
                                "failed to store delivery correlation"
                            );
                            let request = Pdu {
                                command_status: CommandStatus::Ok,
                                sequence_number: sequence,
                                body: PduBody::SubmitSm(submit),
                            };
                            self.hook
                                .send_error(&request, &error, &self.config.client_id)
                                .await;
                        }
                    }
                }
            }
        }
    }

    /// Validate, window-admit and send one user message. A message that
    /// cannot be sent is reported through the hook and dropped, never
    /// requeued.
    async fn send_submit(&mut self, message: SubmitSm) -> Option<SessionEnd> {
        // Self-imposed pacing comes first; it runs inline, so a dry
        // token bucket backpressures the whole session.
        self.rate_limiter.limit().await;
        if let Err(error) = message.validate() {
            let pdu = Pdu::request(PduBody::SubmitSm(Box::new(message)));
            self.hook
                .send_error(&pdu, &error, &self.config.client_id)
                .await;
            return None;
        }

        let sequence = self.correlator.next_sequence();
        let pdu = Pdu {
            command_status: CommandStatus::Ok,
            sequence_number: sequence,
            body: PduBody::SubmitSm(Box::new(message)),
        };
        let bytes = match pdu.to_bytes(&self.options) {
            Ok(bytes) => bytes,
            Err(error) => {
                self.hook
                    .send_error(&pdu, &error, &self.config.client_id)
                    .await;
                return None;
            }
        };

        let PduBody::SubmitSm(submit) = &pdu.body else {
            return None;
        };
        let pending = PendingRequest {
            sequence_number: sequence,
            expected: CommandId::SubmitSmResp,
            kind: PendingKind::Submit {
                submit: submit.clone(),
            },
            deadline: Instant::now() + self.config.request_timeout,
        };
        if let Err(error) = self.correlator.put(pending) {
            // The dequeue gate keeps this from happening; a custom
            // correlator may still refuse.
            self.hook
                .send_error(&pdu, &error, &self.config.client_id)
                .await;
            return None;
        }

        self.hook
            .sending(&pdu, &bytes, &self.config.client_id)
            .await;
        match self.conn.write_all(&bytes).await {
            Ok(()) => {
                self.last_write = Instant::now();
                None
            }
            Err(error) => {
                error!(client_id = %self.config.client_id, %error, "write failed");
                Some(self.teardown().await)
            }
        }
    }

    async fn send_enquire_link(&mut self) -> Option<SessionEnd> {
        let sequence = self.correlator.next_sequence();
        debug!(
            client_id = %self.config.client_id,
            sequence_number = sequence,
            "link idle, sending enquire_link"
        );
        let pending = PendingRequest {
            sequence_number: sequence,
            expected: CommandId::EnquireLinkResp,
            kind: PendingKind::EnquireLink,
            deadline: Instant::now() + self.config.request_timeout,
        };
        if self.correlator.put(pending).is_err() {
            // Window full of unanswered submits; those will expire and
            // flag the connection before an untracked probe could.
            debug!(client_id = %self.config.client_id, "window full, keepalive not tracked");
        }
        self.transmit_or_teardown(&Pdu::enquire_link(sequence)).await
    }

    async fn handle_expirations(&mut self) -> Option<SessionEnd> {
        self.expiry_at = Instant::now() + Duration::from_secs(1);
        let expired = self.correlator.expire(Instant::now());
        let mut link_dead = false;
        for pending in expired {
            match pending.kind {
                PendingKind::EnquireLink => link_dead = true,
                PendingKind::Unbind => {}
                PendingKind::Submit { submit } => {
                    warn!(
                        client_id = %self.config.client_id,
                        sequence_number = pending.sequence_number,
                        log_id = %submit.log_id,
                        "request timed out"
                    );
                    let request = Pdu {
                        command_status: CommandStatus::Ok,
                        sequence_number: pending.sequence_number,
                        body: PduBody::SubmitSm(submit),
                    };
                    self.hook
                        .send_error(&request, &SmppError::RequestTimeout, &self.config.client_id)
                        .await;
                }
            }
        }
        if link_dead {
            error!(
                client_id = %self.config.client_id,
                "no response to enquire_link, assuming dead connection"
            );
            return Some(self.teardown().await);
        }
        None
    }

    async fn transmit(&mut self, pdu: &Pdu) -> SmppResult<()> {
        let bytes = pdu.to_bytes(&self.options)?;
        self.hook
            .sending(pdu, &bytes, &self.config.client_id)
            .await;
        self.conn.write_all(&bytes).await?;
        self.last_write = Instant::now();
        Ok(())
    }

    async fn transmit_or_teardown(&mut self, pdu: &Pdu) -> Option<SessionEnd> {
        match self.transmit(pdu).await {
            Ok(()) => None,
            Err(error) => {
                error!(client_id = %self.config.client_id, %error, "write failed");
                Some(self.teardown().await)
            }
        }
    }

    /// Connection is gone or unusable: close, fail every pending request
    /// with `SessionClosed`, hand control back for reconnect.
    async fn teardown(&mut self) -> SessionEnd {
        self.close_and_fail_pendings().await;
        SessionEnd::Reconnect
    }

    /// `stop()` path: best-effort unbind with a hard cap, then close.
    async fn graceful_shutdown(&mut self) -> SessionEnd {
        info!(client_id = %self.config.client_id, "stopping session");
        if self.state.is_bound() {
            self.state = SessionState::Unbinding;
            let sequence = self.correlator.next_sequence();
            let _ = self.correlator.put(PendingRequest {
                sequence_number: sequence,
                expected: CommandId::UnbindResp,
                kind: PendingKind::Unbind,
                deadline: Instant::now() + self.config.unbind_timeout,
            });
            if self.transmit(&Pdu::unbind(sequence)).await.is_ok() {
                let conn = &mut self.conn;
                let hook = self.hook;
                let client_id = &self.config.client_id;
                let wait_for_resp = async {
                    loop {
                        match conn.read_pdu().await {
                            Ok(Some(Inbound::Pdu(pdu, frame))) => {
                                let done = pdu.command_id() == CommandId::UnbindResp
                                    && pdu.sequence_number == sequence;
                                hook.received(Some(&pdu), &frame, client_id).await;
                                if done {
                                    break;
                                }
                            }
                            Ok(Some(Inbound::Malformed { .. })) => {}
                            Ok(None) | Err(_) => break,
                        }
                    }
                };
                if timeout(self.config.unbind_timeout, wait_for_resp)
                    .await
                    .is_err()
                {
                    warn!(
                        client_id = %self.config.client_id,
                        "no unbind_resp before the shutdown deadline"
                    );
                }
            }
        }
        self.close_and_fail_pendings().await;
        SessionEnd::Stopped
    }

    async fn close_and_fail_pendings(&mut self) {
        let _ = self.conn.shutdown().await;
        self.state = SessionState::Closed;
        for pending in self.correlator.drain() {
            if let PendingKind::Submit { submit } = pending.kind {
                let request = Pdu {
                    command_status: CommandStatus::Ok,
                    sequence_number: pending.sequence_number,
                    body: PduBody::SubmitSm(submit),
                };
                self.hook
                    .send_error(&request, &SmppError::SessionClosed, &self.config.client_id)
                    .await;
            }
        }
    }
}
