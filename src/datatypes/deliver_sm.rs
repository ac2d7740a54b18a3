use bytes::BytesMut;
use std::io::Cursor;

use crate::codec::{decode_cstring, encode_cstring, CodecOptions};
use crate::datatypes::bind::has_remaining;
use crate::datatypes::submit_sm::{
    decode_message, decode_raw_sm, encode_message, encode_raw_sm, RawSm, MAX_MESSAGE_ID_LEN,
};
use crate::datatypes::tlv::{tags, Tlv};
use crate::datatypes::{EsmClass, PhoneNumber, SmppTime, Udh};
use crate::error::SmppResult;
use crate::text::{DeliveryReceipt, SmsEncoding};

/// Body of deliver_sm (section 4.6.1): an inbound short message or a
/// delivery receipt, distinguished by the esm_class message-type bits.
///
/// For a correlated receipt, `log_id`/`extra_data` are restored from the
/// original submission before the PDU reaches the hook.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeliverSm {
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
    pub encoding: Option<SmsEncoding>,
    pub sm_default_msg_id: u8,
    pub short_message: String,
    pub udh: Option<Udh>,
    pub tlvs: Vec<Tlv>,
    pub log_id: String,
    pub extra_data: String,
}

impl DeliverSm {
    /// Build a delivery receipt deliver_sm, mostly useful to SMSC
    /// simulators and tests.
    pub fn receipt(source: PhoneNumber, destination: PhoneNumber, receipt: &DeliveryReceipt) -> Self {
        DeliverSm {
            source,
            destination,
            esm_class: EsmClass::delivery_receipt(),
            short_message: receipt.to_text(),
            ..DeliverSm::default()
        }
    }

    /// True when the esm_class marks this as an SMSC delivery receipt.
    pub fn is_receipt(&self) -> bool {
        self.esm_class.is_delivery_receipt()
    }

    /// Parse the receipt carried in the message text.
    ///
    /// When the text lacks an `id:` field, the `receipted_message_id`
    /// optional parameter is consulted; some SMSCs only send the latter.
    pub fn parse_receipt(&self) -> Option<DeliveryReceipt> {
        if !self.is_receipt() {
            return None;
        }
        let mut receipt = DeliveryReceipt::parse(&self.short_message);
        if receipt.id.is_none() {
            receipt.id = crate::datatypes::tlv::find_tlv(&self.tlvs, tags::RECEIPTED_MESSAGE_ID)
                .and_then(Tlv::as_cstring);
        }
        Some(receipt)
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
    ) -> SmppResult<DeliverSm> {
        let raw = decode_raw_sm(cur)?;
        let (short_message, udh, encoding) = decode_message(&raw, options)?;
        Ok(DeliverSm {
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

/// Body of deliver_sm_resp. The message_id field is unused and always
/// NULL per the specification; it is kept for byte fidelity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliverSmResp {
    pub message_id: String,
}

impl DeliverSmResp {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LEN + 1, "message_id")
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<DeliverSmResp> {
        let message_id = if has_remaining(cur) {
            decode_cstring(cur, MAX_MESSAGE_ID_LEN + 1, "message_id")?
        } else {
            String::new()
        };
        Ok(DeliverSmResp { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ReceiptState;

    #[test]
    fn receipt_round_trip() {
        let options = CodecOptions::default();
        let receipt = DeliveryReceipt {
            id: Some("abc123".into()),
            sub: Some(1),
            dlvrd: Some(1),
            stat: Some(ReceiptState::Delivered),
            err: Some("000".into()),
            text: Some("Hello".into()),
            ..DeliveryReceipt::default()
        };
        let deliver = DeliverSm::receipt(
            PhoneNumber::international("38164333444").unwrap(),
            PhoneNumber::international("38164111222").unwrap(),
            &receipt,
        );
        assert!(deliver.is_receipt());

        let mut buf = BytesMut::new();
        deliver.encode_body(&mut buf, &options).unwrap();
        let bytes = buf.freeze();
        let mut cursor = Cursor::new(bytes.as_ref());
        let decoded = DeliverSm::decode_body(&mut cursor, &options).unwrap();

        let parsed = decoded.parse_receipt().unwrap();
        assert_eq!(parsed.id.as_deref(), Some("abc123"));
        assert_eq!(parsed.stat, Some(ReceiptState::Delivered));
    }

    #[test]
    fn receipt_id_falls_back_to_tlv() {
        let deliver = DeliverSm {
            esm_class: EsmClass::delivery_receipt(),
            short_message: "stat:DELIVRD err:000".into(),
            tlvs: vec![Tlv::cstring(tags::RECEIPTED_MESSAGE_ID, "tlv-id-7")],
            ..DeliverSm::default()
        };
        let receipt = deliver.parse_receipt().unwrap();
        assert_eq!(receipt.id.as_deref(), Some("tlv-id-7"));
    }

    #[test]
    fn plain_mobile_originated_message_is_not_a_receipt() {
        let deliver = DeliverSm {
            short_message: "hi there".into(),
            ..DeliverSm::default()
        };
        assert!(!deliver.is_receipt());
        assert_eq!(deliver.parse_receipt(), None);
    }

    #[test]
    fn resp_is_effectively_header_plus_null() {
        let resp = DeliverSmResp::default();
        let mut buf = BytesMut::new();
        resp.encode_body(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"\0");
    }
}
