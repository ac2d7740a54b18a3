use bytes::BytesMut;
use std::io::Cursor;

use crate::codec::{decode_cstring, decode_u8, encode_cstring};
use crate::datatypes::bind::{decode_npi, decode_ton};
use crate::datatypes::submit_sm::MAX_MESSAGE_ID_LEN;
use crate::datatypes::{PhoneNumber, SmppTime};
use crate::error::{SmppError, SmppResult};

/// Body of query_sm (section 4.8.1): ask the SMSC for the current state
/// of a previously submitted message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuerySm {
    pub message_id: String,
    pub source: PhoneNumber,
}

impl QuerySm {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LEN + 1, "message_id")?;
        buf.extend_from_slice(&[self.source.ton as u8, self.source.npi as u8]);
        encode_cstring(buf, &self.source.address, 21, "source_addr")?;
        Ok(())
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<QuerySm> {
        let message_id = decode_cstring(cur, MAX_MESSAGE_ID_LEN + 1, "message_id")?;
        let ton = decode_ton(cur, "source_addr_ton")?;
        let npi = decode_npi(cur, "source_addr_npi")?;
        let address = decode_cstring(cur, 21, "source_addr")?;
        Ok(QuerySm {
            message_id,
            source: PhoneNumber { address, ton, npi },
        })
    }
}

/// Message states reported by query_sm_resp (section 5.2.28).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageState {
    Enroute,
    Delivered,
    Expired,
    Deleted,
    Undeliverable,
    Accepted,
    Unknown,
    Rejected,
    Other(u8),
}

impl MessageState {
    pub fn value(self) -> u8 {
        match self {
            MessageState::Enroute => 1,
            MessageState::Delivered => 2,
            MessageState::Expired => 3,
            MessageState::Deleted => 4,
            MessageState::Undeliverable => 5,
            MessageState::Accepted => 6,
            MessageState::Unknown => 7,
            MessageState::Rejected => 8,
            MessageState::Other(value) => value,
        }
    }
}

impl From<u8> for MessageState {
    fn from(value: u8) -> Self {
        match value {
            1 => MessageState::Enroute,
            2 => MessageState::Delivered,
            3 => MessageState::Expired,
            4 => MessageState::Deleted,
            5 => MessageState::Undeliverable,
            6 => MessageState::Accepted,
            7 => MessageState::Unknown,
            8 => MessageState::Rejected,
            other => MessageState::Other(other),
        }
    }
}

/// Body of query_sm_resp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySmResp {
    pub message_id: String,
    pub final_date: SmppTime,
    pub message_state: MessageState,
    pub error_code: u8,
}

impl Default for QuerySmResp {
    fn default() -> Self {
        QuerySmResp {
            message_id: String::new(),
            final_date: SmppTime::immediate(),
            message_state: MessageState::Unknown,
            error_code: 0,
        }
    }
}

impl QuerySmResp {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LEN + 1, "message_id")?;
        encode_cstring(buf, self.final_date.as_str(), 17, "final_date")?;
        buf.extend_from_slice(&[self.message_state.value(), self.error_code]);
        Ok(())
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<QuerySmResp> {
        let message_id = decode_cstring(cur, MAX_MESSAGE_ID_LEN + 1, "message_id")?;
        let final_date_raw = decode_cstring(cur, 17, "final_date")?;
        let final_date =
            SmppTime::parse(&final_date_raw).map_err(|_| SmppError::MalformedPdu {
                reason: format!("invalid final_date '{final_date_raw}'"),
                offset: cur.position() as usize,
            })?;
        let message_state = MessageState::from(decode_u8(cur, "message_state")?);
        let error_code = decode_u8(cur, "error_code")?;
        Ok(QuerySmResp {
            message_id,
            final_date,
            message_state,
            error_code,
        })
    }
}
