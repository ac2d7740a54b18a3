use bytes::BytesMut;
use std::io::Cursor;

use crate::codec::{
    decode_cstring, decode_octets, decode_u8, encode_cstring, CodecOptions,
};
use crate::datatypes::bind::{decode_npi, decode_ton, has_remaining};
use crate::datatypes::tlv::{tags, Tlv};
use crate::datatypes::{DataCoding, EsmClass, PhoneNumber, SmppTime, Udh};
use crate::error::{SmppError, SmppResult};
use crate::text::{decode_text, encode_text, SmsEncoding};

pub const MAX_SERVICE_TYPE_LEN: usize = 5;
pub const MAX_SHORT_MESSAGE_LEN: usize = 254;
pub const MAX_MESSAGE_ID_LEN: usize = 64;

/// Body of submit_sm (section 4.4.1): an outbound short message.
///
/// `log_id` and `extra_data` are tracking identifiers supplied by the
/// application. They never appear on the wire; the correlator carries
/// them so the response, a timeout report and the eventual delivery
/// receipt all surface the same identifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSm {
    pub service_type: String,
    pub source: PhoneNumber,
    pub destination: PhoneNumber,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: SmppTime,
    pub validity_period: SmppTime,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    /// `None` selects the configured default alphabet with automatic
    /// fallback to UCS-2 when the text does not fit it.
    pub encoding: Option<SmsEncoding>,
    pub sm_default_msg_id: u8,
    pub short_message: String,
    /// Optional User Data Header; sets the UDHI bit on the wire.
    pub udh: Option<Udh>,
    pub tlvs: Vec<Tlv>,
    pub log_id: String,
    pub extra_data: String,
}

impl Default for SubmitSm {
    fn default() -> Self {
        SubmitSm {
            service_type: "CMT".into(),
            source: PhoneNumber::default(),
            destination: PhoneNumber::default(),
            esm_class: EsmClass::default(),
            protocol_id: 0,
            priority_flag: 0,
            schedule_delivery_time: SmppTime::immediate(),
            validity_period: SmppTime::immediate(),
            // Request a delivery receipt on final state by default.
            registered_delivery: 0b0000_0001,
            replace_if_present_flag: 0,
            encoding: None,
            sm_default_msg_id: 0,
            short_message: String::new(),
            udh: None,
            tlvs: Vec::new(),
            log_id: String::new(),
            extra_data: String::new(),
        }
    }
}

impl SubmitSm {
    pub fn new(
        source: PhoneNumber,
        destination: PhoneNumber,
        short_message: impl Into<String>,
        log_id: impl Into<String>,
    ) -> Self {
        SubmitSm {
            source,
            destination,
            short_message: short_message.into(),
            log_id: log_id.into(),
            ..SubmitSm::default()
        }
    }

    /// Pre-send validation; failures surface through the send-error hook
    /// and the message is dropped, never sent.
    pub(crate) fn validate(&self) -> SmppResult<()> {
        if self.log_id.is_empty() {
            return Err(SmppError::InvalidParameter {
                field: "log_id",
                reason: "a non-empty log_id is required for tracking".into(),
            });
        }
        if self.destination.is_empty() {
            return Err(SmppError::InvalidParameter {
                field: "destination",
                reason: "destination address must not be empty".into(),
            });
        }
        self.source.validate("source")?;
        self.destination.validate("destination")?;
        if self.service_type.len() > MAX_SERVICE_TYPE_LEN {
            return Err(SmppError::InvalidParameter {
                field: "service_type",
                reason: format!(
                    "{} characters exceeds the maximum of {MAX_SERVICE_TYPE_LEN}",
                    self.service_type.len()
                ),
            });
        }
        if self.tlvs.iter().any(|tlv| tlv.tag == tags::MESSAGE_PAYLOAD) {
            return Err(SmppError::InvalidParameter {
                field: "tlvs",
                reason: "message_payload is managed by the codec, set short_message instead"
                    .into(),
            });
        }
        Ok(())
    }

    pub(crate) fn encode_body(&self, buf: &mut BytesMut, options: &CodecOptions) -> SmppResult<()> {
        let (message, data_coding) =
            encode_message(&self.short_message, self.udh.as_ref(), self.encoding, options)?;
        let esm_class = if self.udh.is_some() {
            self.esm_class.with_udhi()
        } else {
            self.esm_class
        };
        let raw = RawSm {
            service_type: self.service_type.clone(),
            source: self.source.clone(),
            destination: self.destination.clone(),
            esm_class,
            protocol_id: self.protocol_id,
            priority_flag: self.priority_flag,
            schedule_delivery_time: self.schedule_delivery_time.clone(),
            validity_period: self.validity_period.clone(),
            registered_delivery: self.registered_delivery,
            replace_if_present_flag: self.replace_if_present_flag,
            data_coding,
            sm_default_msg_id: self.sm_default_msg_id,
            message,
            tlvs: self.tlvs.clone(),
        };
        encode_raw_sm(&raw, buf)
    }

    pub(crate) fn decode_body(
        cur: &mut Cursor<&[u8]>,
        options: &CodecOptions,
    ) -> SmppResult<SubmitSm> {
        let raw = decode_raw_sm(cur)?;
        let (short_message, udh, encoding) = decode_message(&raw, options)?;
        Ok(SubmitSm {
            service_type: raw.service_type,
            source: raw.source,
            destination: raw.destination,
            esm_class: raw.esm_class,
            protocol_id: raw.protocol_id,
            priority_flag: raw.priority_flag,
            schedule_delivery_time: raw.schedule_delivery_time,
            validity_period: raw.validity_period,
            registered_delivery: raw.registered_delivery,
            replace_if_present_flag: raw.replace_if_present_flag,
            encoding,
            sm_default_msg_id: raw.sm_default_msg_id,
            short_message,
            udh,
            tlvs: raw.tlvs,
            log_id: String::new(),
            extra_data: String::new(),
        })
    }
}

/// Body of submit_sm_resp: the SMSC-assigned message id.
///
/// `log_id`/`extra_data` are restored from the correlated request before
/// the response reaches the hook.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitSmResp {
    pub message_id: String,
    pub log_id: String,
    pub extra_data: String,
}

impl SubmitSmResp {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LEN + 1, "message_id")
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<SubmitSmResp> {
        // An error response may have no body at all.
        let message_id = if has_remaining(cur) {
            decode_cstring(cur, MAX_MESSAGE_ID_LEN + 1, "message_id")?
        } else {
            String::new()
        };
        Ok(SubmitSmResp {
            message_id,
            log_id: String::new(),
            extra_data: String::new(),
        })
    }
}

/// The wire-level short-message body shared by submit_sm and deliver_sm.
pub(crate) struct RawSm {
    pub service_type: String,
    pub source: PhoneNumber,
    pub destination: PhoneNumber,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: SmppTime,
    pub validity_period: SmppTime,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: DataCoding,
    pub sm_default_msg_id: u8,
    /// Raw message octets; after decode a `message_payload` TLV has
    /// already been folded in here.
    pub message: Vec<u8>,
    pub tlvs: Vec<Tlv>,
}

pub(crate) fn encode_raw_sm(raw: &RawSm, buf: &mut BytesMut) -> SmppResult<()> {
    encode_cstring(buf, &raw.service_type, MAX_SERVICE_TYPE_LEN + 1, "service_type")?;
    buf.extend_from_slice(&[raw.source.ton as u8, raw.source.npi as u8]);
    encode_cstring(buf, &raw.source.address, 21, "source_addr")?;
    buf.extend_from_slice(&[raw.destination.ton as u8, raw.destination.npi as u8]);
    encode_cstring(buf, &raw.destination.address, 21, "destination_addr")?;
    buf.extend_from_slice(&[raw.esm_class.to_byte(), raw.protocol_id, raw.priority_flag]);
    encode_cstring(
        buf,
        raw.schedule_delivery_time.as_str(),
        17,
        "schedule_delivery_time",
    )?;
    encode_cstring(buf, raw.validity_period.as_str(), 17, "validity_period")?;
    buf.extend_from_slice(&[
        raw.registered_delivery,
        raw.replace_if_present_flag,
        raw.data_coding.value(),
        raw.sm_default_msg_id,
    ]);
    if raw.message.len() > MAX_SHORT_MESSAGE_LEN {
        // Spill into the message_payload TLV; the mandatory field stays
        // empty with sm_length zero.
        buf.extend_from_slice(&[0]);
        Tlv::new(tags::MESSAGE_PAYLOAD, raw.message.clone()).encode(buf);
    } else {
        buf.extend_from_slice(&[raw.message.len() as u8]);
        buf.extend_from_slice(&raw.message);
    }
    for tlv in &raw.tlvs {
        tlv.encode(buf);
    }
    Ok(())
}

pub(crate) fn decode_raw_sm(cur: &mut Cursor<&[u8]>) -> SmppResult<RawSm> {
    let service_type = decode_cstring(cur, MAX_SERVICE_TYPE_LEN + 1, "service_type")?;
    let source_ton = decode_ton(cur, "source_addr_ton")?;
    let source_npi = decode_npi(cur, "source_addr_npi")?;
    let source_addr = decode_cstring(cur, 21, "source_addr")?;
    let dest_ton = decode_ton(cur, "dest_addr_ton")?;
    let dest_npi = decode_npi(cur, "dest_addr_npi")?;
    let dest_addr = decode_cstring(cur, 21, "destination_addr")?;
    let esm_class = EsmClass::from_byte(decode_u8(cur, "esm_class")?);
    let protocol_id = decode_u8(cur, "protocol_id")?;
    let priority_flag = decode_u8(cur, "priority_flag")?;
    let schedule_delivery_time = decode_time(cur, "schedule_delivery_time")?;
    let validity_period = decode_time(cur, "validity_period")?;
    let registered_delivery = decode_u8(cur, "registered_delivery")?;
    let replace_if_present_flag = decode_u8(cur, "replace_if_present_flag")?;
    let data_coding = DataCoding::from(decode_u8(cur, "data_coding")?);
    let sm_default_msg_id = decode_u8(cur, "sm_default_msg_id")?;
    let sm_length = decode_u8(cur, "sm_length")? as usize;
    let mut message = decode_octets(cur, sm_length, "short_message")?;

    let mut tlvs = Vec::new();
    while has_remaining(cur) {
        tlvs.push(Tlv::decode(cur)?);
    }
    // A present message_payload supersedes the mandatory field.
    if let Some(index) = tlvs.iter().position(|tlv| tlv.tag == tags::MESSAGE_PAYLOAD) {
        message = tlvs.remove(index).value.to_vec();
    }

    Ok(RawSm {
        service_type,
        source: PhoneNumber {
            address: source_addr,
            ton: source_ton,
            npi: source_npi,
        },
        destination: PhoneNumber {
            address: dest_addr,
            ton: dest_ton,
            npi: dest_npi,
        },
        esm_class,
        protocol_id,
        priority_flag,
        schedule_delivery_time,
        validity_period,
        registered_delivery,
        replace_if_present_flag,
        data_coding,
        sm_default_msg_id,
        message,
        tlvs,
    })
}

/// Resolve the effective encoding and produce the message octets,
/// UDH included.
pub(crate) fn encode_message(
    text: &str,
    udh: Option<&Udh>,
    chosen: Option<SmsEncoding>,
    options: &CodecOptions,
) -> SmppResult<(Vec<u8>, DataCoding)> {
    let (encoded, data_coding) = match chosen {
        Some(encoding) => (encode_text(text, encoding, false)?, encoding.data_coding()),
        // Auto mode: the configured default alphabet first, UCS-2 when
        // the text does not fit it.
        None => match encode_text(text, options.default_encoding, false) {
            Ok(bytes) => (bytes, DataCoding::SmscDefault),
            Err(SmppError::EncodeError { .. }) => (
                encode_text(text, SmsEncoding::Ucs2, false)?,
                DataCoding::Ucs2,
            ),
            Err(other) => return Err(other),
        },
    };
    let message = match udh {
        Some(udh) => {
            let mut buf = BytesMut::with_capacity(udh.encoded_len() + encoded.len());
            udh.encode(&mut buf);
            buf.extend_from_slice(&encoded);
            buf.to_vec()
        }
        None => encoded,
    };
    Ok((message, data_coding))
}

/// Split a UDH off the raw octets (when UDHI is set) and decode the rest
/// as text.
pub(crate) fn decode_message(
    raw: &RawSm,
    options: &CodecOptions,
) -> SmppResult<(String, Option<Udh>, Option<SmsEncoding>)> {
    let mut data = raw.message.as_slice();
    let udh = if raw.esm_class.has_udhi() && !data.is_empty() {
        let (udh, consumed) = Udh::parse(data)?;
        data = &data[consumed..];
        Some(udh)
    } else {
        None
    };
    let encoding = SmsEncoding::for_data_coding(raw.data_coding, options.default_encoding)
        .ok_or_else(|| SmppError::DecodeError {
            reason: format!("no codec for data_coding {:#04x}", raw.data_coding.value()),
        })?;
    let text = decode_text(data, encoding, false)?;
    // Report the SMSC default alphabet as "auto" so values re-encode
    // identically.
    let encoding = match raw.data_coding {
        DataCoding::SmscDefault => None,
        _ => Some(encoding),
    };
    Ok((text, udh, encoding))
}

fn decode_time(cur: &mut Cursor<&[u8]>, field: &'static str) -> SmppResult<SmppTime> {
    let raw = decode_cstring(cur, 17, field)?;
    SmppTime::parse(&raw).map_err(|_| SmppError::MalformedPdu {
        reason: format!("field '{field}' holds an invalid SMPP time '{raw}'"),
        offset: cur.position() as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(buf: &BytesMut, options: &CodecOptions) -> SubmitSm {
        let bytes = buf.clone().freeze();
        let mut cursor = Cursor::new(bytes.as_ref());
        SubmitSm::decode_body(&mut cursor, options).unwrap()
    }

    fn sample() -> SubmitSm {
        SubmitSm::new(
            PhoneNumber::international("38164111222").unwrap(),
            PhoneNumber::international("38164333444").unwrap(),
            "Hello",
            "msg-1",
        )
    }

    #[test]
    fn body_round_trip() {
        let options = CodecOptions::default();
        let submit = sample();
        let mut buf = BytesMut::new();
        submit.encode_body(&mut buf, &options).unwrap();

        let decoded = decode(&buf, &options);
        assert_eq!(decoded.short_message, "Hello");
        assert_eq!(decoded.destination, submit.destination);
        assert_eq!(decoded.encoding, None);
        // Tracking identifiers never travel on the wire.
        assert_eq!(decoded.log_id, "");
    }

    #[test]
    fn long_message_spills_into_payload_tlv() {
        let options = CodecOptions::default();
        let submit = SubmitSm {
            short_message: "x".repeat(300),
            ..sample()
        };
        let mut buf = BytesMut::new();
        submit.encode_body(&mut buf, &options).unwrap();

        // The mandatory field must be empty and the payload TLV present.
        let bytes: &[u8] = &buf;
        assert!(bytes
            .windows(2)
            .any(|pair| pair == tags::MESSAGE_PAYLOAD.to_be_bytes()));

        let decoded = decode(&buf, &options);
        assert_eq!(decoded.short_message.len(), 300);
        assert!(decoded.tlvs.is_empty());
    }

    #[test]
    fn auto_encoding_falls_back_to_ucs2() {
        let options = CodecOptions::default();
        let submit = SubmitSm {
            short_message: "Ћао".into(),
            ..sample()
        };
        let mut buf = BytesMut::new();
        submit.encode_body(&mut buf, &options).unwrap();

        let decoded = decode(&buf, &options);
        assert_eq!(decoded.encoding, Some(SmsEncoding::Ucs2));
        assert_eq!(decoded.short_message, "Ћао");
    }

    #[test]
    fn udh_round_trip_sets_udhi() {
        let options = CodecOptions::default();
        let submit = SubmitSm {
            udh: Some(Udh::concat_8bit(9, 2, 1)),
            ..sample()
        };
        let mut buf = BytesMut::new();
        submit.encode_body(&mut buf, &options).unwrap();

        let decoded = decode(&buf, &options);
        assert!(decoded.esm_class.has_udhi());
        assert_eq!(decoded.udh, Some(Udh::concat_8bit(9, 2, 1)));
        assert_eq!(decoded.short_message, "Hello");
    }

    #[test]
    fn validation_requires_log_id_and_destination() {
        let mut submit = sample();
        submit.log_id.clear();
        assert!(matches!(
            submit.validate(),
            Err(SmppError::InvalidParameter { field: "log_id", .. })
        ));

        let mut submit = sample();
        submit.destination = PhoneNumber::default();
        assert!(matches!(
            submit.validate(),
            Err(SmppError::InvalidParameter {
                field: "destination",
                ..
            })
        ));
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn explicit_payload_tlv_is_rejected() {
        let submit = SubmitSm {
            tlvs: vec![Tlv::new(tags::MESSAGE_PAYLOAD, vec![1, 2])],
            ..sample()
        };
        assert!(submit.validate().is_err());
    }

    #[test]
    fn resp_round_trip() {
        let resp = SubmitSmResp {
            message_id: "id-123".into(),
            ..SubmitSmResp::default()
        };
        let mut buf = BytesMut::new();
        resp.encode_body(&mut buf).unwrap();
        let bytes = buf.freeze();
        let mut cursor = Cursor::new(bytes.as_ref());
        assert_eq!(SubmitSmResp::decode_body(&mut cursor).unwrap(), resp);
    }

    #[test]
    fn empty_resp_body_is_tolerated() {
        let mut cursor = Cursor::new(&[][..]);
        let resp = SubmitSmResp::decode_body(&mut cursor).unwrap();
        assert_eq!(resp.message_id, "");
    }
}
