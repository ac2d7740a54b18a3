// ABOUTME: The ESME façade: composes broker, correlator, hook and session
// ABOUTME: start() keeps a session alive with reconnect back-off until stop()

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::broker::{Broker, InMemoryBroker};
use crate::codec::CodecOptions;
use crate::config::EsmeConfig;
use crate::connection::Connection;
use crate::correlator::{Correlator, InMemoryCorrelator};
use crate::datatypes::SubmitSm;
use crate::error::{SmppError, SmppResult};
use crate::hook::{Hook, LoggingHook};
use crate::rate_limiter::{RateLimiter, TokenBucketRateLimiter};
use crate::session::{connect_and_bind, Session, SessionEnd, SessionState};
use crate::throttle::RetryTimer;

/// An External Short Messaging Entity: one SMPP client talking to one
/// SMSC.
///
/// The default composition uses the in-memory broker and correlator, the
/// logging hook, and a token-bucket rate limiter driven by
/// `EsmeConfig::send_rate` (pass-through when no rate is set); plug in
/// custom implementations with [`Esme::with_parts`].
///
/// ```no_run
/// use esmpp::{Esme, EsmeConfig, PhoneNumber, SubmitSm};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = EsmeConfig::new("localhost", 2775, "test", "test");
///     let mut esme = Esme::new(config)?;
///     let handle = esme.handle();
///
///     let runner = tokio::spawn(async move { esme.start().await });
///
///     handle
///         .enqueue(SubmitSm::new(
///             PhoneNumber::international("38164111222")?,
///             PhoneNumber::international("38164333444")?,
///             "Hello!",
///             "msg-1",
///         ))
///         .await?;
///
///     handle.stop().await;
///     runner.await??;
///     Ok(())
/// }
/// ```
pub struct Esme<B = InMemoryBroker, C = InMemoryCorrelator, H = LoggingHook, R = TokenBucketRateLimiter>
{
    config: EsmeConfig,
    options: CodecOptions,
    broker: Arc<B>,
    correlator: C,
    hook: Arc<H>,
    rate_limiter: R,
    retry: RetryTimer,
    state: SessionState,
    /// A connection produced by `connect()`, waiting for `start()`.
    bound: Option<(Connection, SessionState)>,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

impl Esme {
    /// An ESME with the default in-memory parts. The rate limiter comes
    /// from `config.send_rate`: a token bucket when set, pass-through
    /// otherwise.
    pub fn new(config: EsmeConfig) -> SmppResult<Esme> {
        let window = config.max_in_flight;
        let rate_limiter = match config.send_rate {
            Some(send_rate) => TokenBucketRateLimiter::new(send_rate),
            None => TokenBucketRateLimiter::unlimited(),
        };
        Esme::with_parts(
            config,
            InMemoryBroker::default(),
            InMemoryCorrelator::new(window),
            LoggingHook,
            rate_limiter,
        )
    }
}

impl<B, C, H, R> Esme<B, C, H, R>
where
    B: Broker,
    C: Correlator,
    H: Hook,
    R: RateLimiter,
{
    /// Compose an ESME from explicit broker, correlator, hook and rate
    /// limiter implementations.
    pub fn with_parts(
        config: EsmeConfig,
        broker: B,
        correlator: C,
        hook: H,
        rate_limiter: R,
    ) -> SmppResult<Self> {
        config.validate()?;
        let options = config.codec_options();
        let retry = RetryTimer::new(config.reconnect_initial, config.reconnect_max);
        let (stop_tx, stop_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(false);
        Ok(Esme {
            config,
            options,
            broker: Arc::new(broker),
            correlator,
            hook: Arc::new(hook),
            rate_limiter,
            retry,
            state: SessionState::Closed,
            bound: None,
            stop_tx,
            stop_rx,
            done_tx,
            done_rx,
        })
    }

    /// A cheap handle for enqueueing messages and stopping the ESME from
    /// other tasks.
    pub fn handle(&self) -> EsmeHandle<B> {
        EsmeHandle {
            broker: self.broker.clone(),
            stop_tx: self.stop_tx.clone(),
            done_rx: self.done_rx.clone(),
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.state
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// Queue one message for submission.
    pub async fn enqueue(&self, message: SubmitSm) -> SmppResult<()> {
        self.broker.enqueue(message).await
    }

    /// Dial and bind once, surfacing any failure to the caller. The
    /// bound connection is kept for a subsequent [`Esme::start`].
    pub async fn connect(&mut self) -> SmppResult<()> {
        if self.bound.is_some() {
            return Ok(());
        }
        match connect_and_bind(
            &self.config,
            &self.options,
            &mut self.correlator,
            self.hook.as_ref(),
            &mut self.state,
        )
        .await
        {
            Ok((conn, state)) => {
                self.state = state;
                self.retry.reset();
                self.bound = Some((conn, state));
                Ok(())
            }
            Err(error) => {
                self.state = SessionState::Closed;
                Err(error)
            }
        }
    }

    /// Run until [`EsmeHandle::stop`], reconnecting with exponential
    /// back-off whenever the connection drops.
    ///
    /// A rejected bind ends the run with [`SmppError::BindRejected`]:
    /// wrong credentials will not become right by retrying.
    pub async fn start(&mut self) -> SmppResult<()> {
        info!(client_id = %self.config.client_id, "starting ESME");
        let result = loop {
            if *self.stop_rx.borrow() {
                break Ok(());
            }

            if self.bound.is_none() {
                match connect_and_bind(
                    &self.config,
                    &self.options,
                    &mut self.correlator,
                    self.hook.as_ref(),
                    &mut self.state,
                )
                .await
                {
                    Ok(pair) => {
                        self.retry.reset();
                        self.bound = Some(pair);
                    }
                    Err(SmppError::BindRejected { status }) => {
                        error!(
                            client_id = %self.config.client_id,
                            %status,
                            "bind rejected, not retrying"
                        );
                        break Err(SmppError::BindRejected { status });
                    }
                    Err(error) => {
                        self.state = SessionState::Reconnecting;
                        let delay = self.retry.next_delay();
                        warn!(
                            client_id = %self.config.client_id,
                            %error,
                            delay_ms = delay.as_millis() as u64,
                            "connect failed, retrying"
                        );
                        let mut stop = self.stop_rx.clone();
                        tokio::select! {
                            _ = sleep(delay) => {}
                            _ = stop.changed() => {}
                        }
                        continue;
                    }
                }
            }

            let Some((conn, bound_state)) = self.bound.take() else {
                continue;
            };
            self.state = bound_state;
            let mut session = Session::new(
                &self.config,
                self.options.clone(),
                conn,
                bound_state,
                self.broker.as_ref(),
                &mut self.correlator,
                self.hook.as_ref(),
                &mut self.rate_limiter,
                self.stop_rx.clone(),
            );
            match session.run().await {
                SessionEnd::Stopped => break Ok(()),
                SessionEnd::Reconnect => {
                    self.state = SessionState::Reconnecting;
                }
            }
        };
        self.state = SessionState::Closed;
        let _ = self.done_tx.send(true);
        info!(client_id = %self.config.client_id, "ESME stopped");
        result
    }
}

/// Control handle for a running [`Esme`]; clones freely across tasks.
pub struct EsmeHandle<B> {
    broker: Arc<B>,
    stop_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

impl<B> Clone for EsmeHandle<B> {
    fn clone(&self) -> Self {
        EsmeHandle {
            broker: self.broker.clone(),
            stop_tx: self.stop_tx.clone(),
            done_rx: self.done_rx.clone(),
        }
    }
}

impl<B: Broker> EsmeHandle<B> {
    /// Queue one message for submission.
    pub async fn enqueue(&self, message: SubmitSm) -> SmppResult<()> {
        self.broker.enqueue(message).await
    }

    /// Request a graceful shutdown and wait for [`Esme::start`] to
    /// finish: the writer drains, an unbind is attempted (capped at the
    /// configured unbind timeout) and every pending request fails with
    /// `SessionClosed`.
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(true);
        let mut done = self.done_rx.clone();
        loop {
            if *done.borrow_and_update() {
                return;
            }
            if done.changed().await.is_err() {
                // The ESME is gone entirely; nothing left to wait for.
                return;
            }
        }
    }
}
