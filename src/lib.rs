//! Asynchronous SMPP 3.4 client (ESME) library.
//!
//! `esmpp` speaks the Short Message Peer-to-Peer protocol v3.4 in the
//! ESME role over a single TCP connection to an SMSC: it submits
//! messages, receives inbound messages and delivery receipts, answers
//! keepalives and reconnects with back-off when the link drops.
//!
//! The crate is layered leaves-first:
//!
//! * [`codec`] and [`datatypes`]: bit-exact PDU encoding and decoding,
//!   one [`datatypes::Pdu`] value over the whole command set.
//! * [`text`]: conversion between strings and data-coding-scheme byte
//!   encodings (GSM 03.38, ASCII, Latin-1, UCS-2, octet pass-through)
//!   plus delivery-receipt text parsing.
//! * [`correlator`]: pairs responses with requests by sequence number
//!   inside a bounded window, and receipts with submissions by SMSC
//!   message id.
//! * [`session`]: the state machine driving the connection, with reader,
//!   writer and timekeeper multiplexed in one task.
//! * [`esme`]: the façade wiring a [`broker::Broker`],
//!   [`correlator::Correlator`], [`hook::Hook`] and
//!   [`rate_limiter::RateLimiter`] to a session.
//!
//! # Sending a message
//!
//! ```no_run
//! use esmpp::{Esme, EsmeConfig, PhoneNumber, SubmitSm};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EsmeConfig::new("smsc.example.net", 2775, "system", "secret");
//!     let mut esme = Esme::new(config)?;
//!     let handle = esme.handle();
//!     tokio::spawn(async move { esme.start().await });
//!
//!     let message = SubmitSm::new(
//!         PhoneNumber::international("38164111222")?,
//!         PhoneNumber::international("38164333444")?,
//!         "Hello from esmpp!",
//!         "order-1234",
//!     );
//!     handle.enqueue(message).await?;
//!     # handle.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! Outcomes are observed through the [`hook::Hook`] capability: the
//! `submit_sm_resp`, a possible timeout and the eventual delivery
//! receipt all carry the `log_id` given at enqueue time.

pub mod broker;
pub mod codec;
pub mod config;
mod connection;
pub mod correlator;
pub mod datatypes;
pub mod error;
pub mod esme;
pub mod hook;
pub mod rate_limiter;
pub mod session;
pub mod text;
pub mod throttle;

pub use broker::{Broker, InMemoryBroker};
pub use codec::CodecOptions;
pub use config::{BindMode, EsmeConfig, DEFAULT_SMPP_PORT};
pub use correlator::{Correlator, DeliveryRecord, InMemoryCorrelator, PendingKind, PendingRequest};
pub use datatypes::{
    Bind, BindResp, CommandId, CommandStatus, DataCoding, DeliverSm, DeliverSmResp, EsmClass, Pdu,
    PduBody, PhoneNumber, SmppTime, SubmitSm, SubmitSmResp, Tlv, Udh,
};
pub use error::{SmppError, SmppResult};
pub use esme::{Esme, EsmeHandle};
pub use hook::{Hook, LoggingHook};
pub use rate_limiter::{RateLimiter, TokenBucketRateLimiter};
pub use session::SessionState;
pub use text::{DeliveryReceipt, ReceiptState, SmsEncoding};
