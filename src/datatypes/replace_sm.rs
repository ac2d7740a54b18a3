use bytes::BytesMut;
use std::io::Cursor;

use crate::codec::{decode_cstring, decode_octets, decode_u8, encode_cstring, CodecOptions};
use crate::datatypes::bind::{decode_npi, decode_ton};
use crate::datatypes::submit_sm::{MAX_MESSAGE_ID_LEN, MAX_SHORT_MESSAGE_LEN};
use crate::datatypes::{PhoneNumber, SmppTime};
use crate::error::{SmppError, SmppResult};
use crate::text::{decode_text, encode_text};

/// Body of replace_sm (section 4.10.1): swap the text and delivery
/// parameters of a message still waiting on the SMSC.
///
/// The body has no data_coding field; the text travels in the default
/// alphabet, and must fit the mandatory field (no payload TLV here).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplaceSm {
    pub message_id: String,
    pub source: PhoneNumber,
    pub schedule_delivery_time: SmppTime,
    pub validity_period: SmppTime,
    pub registered_delivery: u8,
    pub sm_default_msg_id: u8,
    pub short_message: String,
}

impl ReplaceSm {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut, options: &CodecOptions) -> SmppResult<()> {
        let encoded = encode_text(&self.short_message, options.default_encoding, false)?;
        if encoded.len() > MAX_SHORT_MESSAGE_LEN {
            return Err(SmppError::InvalidParameter {
                field: "short_message",
                reason: format!(
                    "{} octets exceeds the replace_sm maximum of {MAX_SHORT_MESSAGE_LEN}",
                    encoded.len()
                ),
            });
        }
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LEN + 1, "message_id")?;
        buf.extend_from_slice(&[self.source.ton as u8, self.source.npi as u8]);
        encode_cstring(buf, &self.source.address, 21, "source_addr")?;
        encode_cstring(
            buf,
            self.schedule_delivery_time.as_str(),
            17,
            "schedule_delivery_time",
        )?;
        encode_cstring(buf, self.validity_period.as_str(), 17, "validity_period")?;
        buf.extend_from_slice(&[
            self.registered_delivery,
            self.sm_default_msg_id,
            encoded.len() as u8,
        ]);
        buf.extend_from_slice(&encoded);
        Ok(())
    }

    pub(crate) fn decode_body(
        cur: &mut Cursor<&[u8]>,
        options: &CodecOptions,
    ) -> SmppResult<ReplaceSm> {
        let message_id = decode_cstring(cur, MAX_MESSAGE_ID_LEN + 1, "message_id")?;
        let ton = decode_ton(cur, "source_addr_ton")?;
        let npi = decode_npi(cur, "source_addr_npi")?;
        let address = decode_cstring(cur, 21, "source_addr")?;
        let schedule_raw = decode_cstring(cur, 17, "schedule_delivery_time")?;
        let validity_raw = decode_cstring(cur, 17, "validity_period")?;
        let registered_delivery = decode_u8(cur, "registered_delivery")?;
        let sm_default_msg_id = decode_u8(cur, "sm_default_msg_id")?;
        let sm_length = decode_u8(cur, "sm_length")? as usize;
        let message = decode_octets(cur, sm_length, "short_message")?;
        Ok(ReplaceSm {
            message_id,
            source: PhoneNumber { address, ton, npi },
            schedule_delivery_time: parse_time(&schedule_raw, "schedule_delivery_time")?,
            validity_period: parse_time(&validity_raw, "validity_period")?,
            registered_delivery,
            sm_default_msg_id,
            short_message: decode_text(&message, options.default_encoding, false)?,
        })
    }
}

fn parse_time(raw: &str, field: &'static str) -> SmppResult<SmppTime> {
    SmppTime::parse(raw).map_err(|_| SmppError::MalformedPdu {
        reason: format!("field '{field}' holds an invalid SMPP time '{raw}'"),
        offset: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let options = CodecOptions::default();
        let replace = ReplaceSm {
            message_id: "r-7".into(),
            source: PhoneNumber::international("38164111222").unwrap(),
            registered_delivery: 1,
            short_message: "updated text".into(),
            ..ReplaceSm::default()
        };
        let mut buf = BytesMut::new();
        replace.encode_body(&mut buf, &options).unwrap();
        let bytes = buf.freeze();
        let mut cursor = Cursor::new(bytes.as_ref());
        assert_eq!(
            ReplaceSm::decode_body(&mut cursor, &options).unwrap(),
            replace
        );
    }

    #[test]
    fn long_replacement_text_is_rejected() {
        let options = CodecOptions::default();
        let replace = ReplaceSm {
            message_id: "r-8".into(),
            short_message: "y".repeat(300),
            ..ReplaceSm::default()
        };
        let mut buf = BytesMut::new();
        assert!(replace.encode_body(&mut buf, &options).is_err());
    }
}
