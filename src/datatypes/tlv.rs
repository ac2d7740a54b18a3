use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

use crate::error::{SmppError, SmppResult};

/// Standard TLV tag constants per the SMPP v3.4 specification.
pub mod tags {
    pub const DEST_ADDR_SUBUNIT: u16 = 0x0005;
    pub const DEST_NETWORK_TYPE: u16 = 0x0006;
    pub const DEST_BEARER_TYPE: u16 = 0x0007;
    pub const DEST_TELEMATICS_ID: u16 = 0x0008;
    pub const SOURCE_ADDR_SUBUNIT: u16 = 0x000D;
    pub const SOURCE_NETWORK_TYPE: u16 = 0x000E;
    pub const SOURCE_BEARER_TYPE: u16 = 0x000F;
    pub const SOURCE_TELEMATICS_ID: u16 = 0x0010;
    pub const QOS_TIME_TO_LIVE: u16 = 0x0017;
    pub const PAYLOAD_TYPE: u16 = 0x0019;
    pub const ADDITIONAL_STATUS_INFO_TEXT: u16 = 0x001D;
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const MS_MSG_WAIT_FACILITIES: u16 = 0x0030;
    pub const PRIVACY_INDICATOR: u16 = 0x0201;
    pub const SOURCE_SUBADDRESS: u16 = 0x0202;
    pub const DEST_SUBADDRESS: u16 = 0x0203;
    pub const USER_MESSAGE_REFERENCE: u16 = 0x0204;
    pub const USER_RESPONSE_CODE: u16 = 0x0205;
    pub const SOURCE_PORT: u16 = 0x020A;
    pub const DESTINATION_PORT: u16 = 0x020B;
    pub const SAR_MSG_REF_NUM: u16 = 0x020C;
    pub const LANGUAGE_INDICATOR: u16 = 0x020D;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020E;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x020F;
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const CALLBACK_NUM_PRES_IND: u16 = 0x0302;
    pub const CALLBACK_NUM_ATAG: u16 = 0x0303;
    pub const NUMBER_OF_MESSAGES: u16 = 0x0304;
    pub const CALLBACK_NUM: u16 = 0x0381;
    pub const DPF_RESULT: u16 = 0x0420;
    pub const SET_DPF: u16 = 0x0421;
    pub const MS_AVAILABILITY_STATUS: u16 = 0x0422;
    pub const NETWORK_ERROR_CODE: u16 = 0x0423;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const DELIVERY_FAILURE_REASON: u16 = 0x0425;
    pub const MORE_MESSAGES_TO_SEND: u16 = 0x0426;
    pub const MESSAGE_STATE: u16 = 0x0427;
    pub const USSD_SERVICE_OP: u16 = 0x0501;
    pub const DISPLAY_TIME: u16 = 0x1201;
    pub const SMS_SIGNAL: u16 = 0x1203;
    pub const MS_VALIDITY: u16 = 0x1204;
    pub const ALERT_ON_MESSAGE_DELIVERY: u16 = 0x130C;
    pub const ITS_REPLY_TYPE: u16 = 0x1380;
    pub const ITS_SESSION_INFO: u16 = 0x1383;
}

/// The decoded shape of a known optional parameter's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlvKind {
    U8,
    U16,
    U32,
    /// NUL-terminated ASCII.
    COctetString,
    /// Raw octets.
    OctetString,
    /// Zero-length marker parameter.
    Flag,
}

/// The semantic kind for a known tag; `None` for tags this crate does not
/// know, which round-trip as opaque octets.
pub fn kind_of(tag: u16) -> Option<TlvKind> {
    use tags::*;
    let kind = match tag {
        DEST_ADDR_SUBUNIT | DEST_NETWORK_TYPE | DEST_BEARER_TYPE | SOURCE_ADDR_SUBUNIT
        | SOURCE_NETWORK_TYPE | SOURCE_BEARER_TYPE | SOURCE_TELEMATICS_ID | PAYLOAD_TYPE
        | MS_MSG_WAIT_FACILITIES | PRIVACY_INDICATOR | USER_RESPONSE_CODE | LANGUAGE_INDICATOR
        | SAR_TOTAL_SEGMENTS | SAR_SEGMENT_SEQNUM | SC_INTERFACE_VERSION
        | CALLBACK_NUM_PRES_IND | NUMBER_OF_MESSAGES | DPF_RESULT | SET_DPF
        | MS_AVAILABILITY_STATUS | DELIVERY_FAILURE_REASON | MORE_MESSAGES_TO_SEND
        | MESSAGE_STATE | DISPLAY_TIME | MS_VALIDITY | ITS_REPLY_TYPE => TlvKind::U8,
        DEST_TELEMATICS_ID | USER_MESSAGE_REFERENCE | SOURCE_PORT | DESTINATION_PORT
        | SAR_MSG_REF_NUM | SMS_SIGNAL => TlvKind::U16,
        QOS_TIME_TO_LIVE => TlvKind::U32,
        ADDITIONAL_STATUS_INFO_TEXT | RECEIPTED_MESSAGE_ID => TlvKind::COctetString,
        SOURCE_SUBADDRESS | DEST_SUBADDRESS | CALLBACK_NUM | CALLBACK_NUM_ATAG
        | NETWORK_ERROR_CODE | MESSAGE_PAYLOAD | USSD_SERVICE_OP | ITS_SESSION_INFO => {
            TlvKind::OctetString
        }
        ALERT_ON_MESSAGE_DELIVERY => TlvKind::Flag,
        _ => return None,
    };
    Some(kind)
}

/// An optional parameter in Tag-Length-Value form.
///
/// Parameters may appear in any order at the tail of a PDU; this crate
/// preserves insertion order on encode and never depends on order on
/// decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    pub tag: u16,
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Tlv {
            tag,
            value: value.into(),
        }
    }

    pub fn u8_value(tag: u16, value: u8) -> Self {
        Tlv::new(tag, Bytes::copy_from_slice(&[value]))
    }

    pub fn u16_value(tag: u16, value: u16) -> Self {
        Tlv::new(tag, Bytes::copy_from_slice(&value.to_be_bytes()))
    }

    pub fn u32_value(tag: u16, value: u32) -> Self {
        Tlv::new(tag, Bytes::copy_from_slice(&value.to_be_bytes()))
    }

    /// A NUL-terminated ASCII value (e.g. `receipted_message_id`).
    pub fn cstring(tag: u16, value: &str) -> Self {
        let mut bytes = BytesMut::with_capacity(value.len() + 1);
        bytes.put_slice(value.as_bytes());
        bytes.put_u8(0);
        Tlv::new(tag, bytes.freeze())
    }

    pub fn as_u8(&self) -> Option<u8> {
        (self.value.len() == 1).then(|| self.value[0])
    }

    pub fn as_u16(&self) -> Option<u16> {
        (self.value.len() == 2).then(|| u16::from_be_bytes([self.value[0], self.value[1]]))
    }

    pub fn as_u32(&self) -> Option<u32> {
        (self.value.len() == 4).then(|| {
            u32::from_be_bytes([self.value[0], self.value[1], self.value[2], self.value[3]])
        })
    }

    /// The value as ASCII text, with a trailing NUL stripped if present.
    pub fn as_cstring(&self) -> Option<String> {
        let end = self
            .value
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(self.value.len());
        std::str::from_utf8(&self.value[..end])
            .ok()
            .map(str::to_owned)
    }

    pub fn encoded_len(&self) -> usize {
        4 + self.value.len()
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.tag);
        buf.put_u16(self.value.len() as u16);
        buf.put_slice(&self.value);
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> SmppResult<Self> {
        if buf.remaining() < 4 {
            return Err(SmppError::MalformedPdu {
                reason: "truncated TLV header".into(),
                offset: buf.position() as usize,
            });
        }
        let tag = buf.get_u16();
        let length = buf.get_u16() as usize;
        if buf.remaining() < length {
            return Err(SmppError::MalformedPdu {
                reason: format!(
                    "TLV {tag:#06x} declares {length} octets but only {} remain",
                    buf.remaining()
                ),
                offset: buf.position() as usize,
            });
        }
        let value = buf.copy_to_bytes(length);
        Ok(Tlv { tag, value })
    }
}

/// First TLV with the given tag, if any.
pub fn find_tlv(tlvs: &[Tlv], tag: u16) -> Option<&Tlv> {
    tlvs.iter().find(|tlv| tlv.tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout() {
        let tlv = Tlv::u16_value(tags::USER_MESSAGE_REFERENCE, 0xBEEF);
        let mut buf = BytesMut::new();
        tlv.encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0x02, 0x04, 0x00, 0x02, 0xBE, 0xEF]);
    }

    #[test]
    fn decode_round_trip() {
        let original = Tlv::cstring(tags::RECEIPTED_MESSAGE_ID, "abc123");
        let mut buf = BytesMut::new();
        original.encode(&mut buf);
        let bytes = buf.freeze();
        let mut cursor = Cursor::new(bytes.as_ref());
        let decoded = Tlv::decode(&mut cursor).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(cursor.position() as usize, bytes.len());
        assert_eq!(decoded.as_cstring().as_deref(), Some("abc123"));
    }

    #[test]
    fn truncated_value_is_rejected() {
        let data = [0x02, 0x04, 0x00, 0x04, 0x01];
        let mut cursor = Cursor::new(&data[..]);
        assert!(Tlv::decode(&mut cursor).is_err());
    }

    #[test]
    fn unknown_tags_have_no_kind() {
        assert_eq!(kind_of(0x1400), None);
        assert_eq!(kind_of(tags::SAR_MSG_REF_NUM), Some(TlvKind::U16));
        assert_eq!(kind_of(tags::MESSAGE_PAYLOAD), Some(TlvKind::OctetString));
    }

    #[test]
    fn integer_accessors_check_width() {
        let tlv = Tlv::u8_value(tags::SAR_SEGMENT_SEQNUM, 2);
        assert_eq!(tlv.as_u8(), Some(2));
        assert_eq!(tlv.as_u16(), None);
    }
}
