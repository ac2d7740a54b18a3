// ABOUTME: Crate-wide error type for codec, session and correlator failures
// ABOUTME: Maps decode failures to the SMPP command_status used in generic_nack replies

use std::io;
use thiserror::Error;

use crate::datatypes::CommandStatus;

/// All the ways an SMPP operation can fail.
///
/// One enum serves the whole crate: codec errors, session lifecycle errors
/// and correlator storage errors all end up here, so the hook and the
/// session loop only ever deal with a single error type.
#[derive(Debug, Error)]
pub enum SmppError {
    /// The peer sent bytes that cannot be parsed as an SMPP PDU.
    #[error("malformed PDU at offset {offset}: {reason}")]
    MalformedPdu { reason: String, offset: usize },

    /// `command_length` exceeds the configured cap.
    #[error("frame of {length} bytes exceeds the maximum PDU size of {max}")]
    FrameTooLarge { length: u32, max: u32 },

    /// The peer sent a request with a `command_id` this client does not know.
    #[error("unknown command_id {command_id:#010x}")]
    UnknownCommand { command_id: u32 },

    /// A character in the message text has no representation in the
    /// selected data coding scheme.
    #[error("character {ch:?} at offset {offset} cannot be encoded")]
    EncodeError { ch: char, offset: usize },

    /// Inbound message text could not be converted back to a string.
    #[error("text decoding failed: {reason}")]
    DecodeError { reason: String },

    /// The in-flight request window is saturated.
    #[error("request window is full ({capacity} requests in flight)")]
    WindowFull { capacity: usize },

    /// No response arrived within `request_timeout`.
    #[error("no response received within the request timeout")]
    RequestTimeout,

    /// No bind response arrived within `bind_timeout`.
    #[error("no bind response received within the bind timeout")]
    BindTimeout,

    /// The SMSC refused the bind. This is a credentials or configuration
    /// problem and is never retried automatically.
    #[error("bind rejected by SMSC with status {status}")]
    BindRejected { status: CommandStatus },

    /// The session went away before the request completed.
    #[error("session closed before the request completed")]
    SessionClosed,

    /// The SMSC asked us to slow down (ESME_RTHROTTLED / ESME_RMSGQFUL).
    #[error("request throttled by SMSC with status {status}")]
    Throttled { status: CommandStatus },

    /// The correlator's backing store failed.
    #[error("correlator storage error: {reason}")]
    StorageError { reason: String },

    /// Socket-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// A caller-supplied value fails pre-send validation.
    #[error("invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
}

/// A specialized `Result` for SMPP operations.
pub type SmppResult<T> = Result<T, SmppError>;

impl SmppError {
    /// The `command_status` to put in a `generic_nack` reply when this
    /// error was produced by an inbound frame.
    pub fn to_command_status(&self) -> CommandStatus {
        match self {
            SmppError::MalformedPdu { .. } | SmppError::FrameTooLarge { .. } => {
                CommandStatus::InvalidCommandLength
            }
            SmppError::UnknownCommand { .. } => CommandStatus::InvalidCommandId,
            _ => CommandStatus::SystemError,
        }
    }

    /// True for errors that invalidate the TCP connection itself.
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(
            self,
            SmppError::Transport(_) | SmppError::SessionClosed | SmppError::BindTimeout
        )
    }
}
