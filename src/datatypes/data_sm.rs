use bytes::BytesMut;
use std::io::Cursor;

use crate::codec::{decode_cstring, decode_u8, encode_cstring};
use crate::datatypes::bind::{decode_npi, decode_ton, has_remaining};
use crate::datatypes::submit_sm::{MAX_MESSAGE_ID_LEN, MAX_SERVICE_TYPE_LEN};
use crate::datatypes::tlv::Tlv;
use crate::datatypes::{DataCoding, EsmClass, PhoneNumber};
use crate::error::SmppResult;

/// Body of data_sm (section 4.7.1): the interactive-application variant
/// of message exchange. It has no mandatory short_message field; any
/// payload travels in the `message_payload` TLV, which this crate keeps
/// in `tlvs` untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSm {
    pub service_type: String,
    pub source: PhoneNumber,
    pub destination: PhoneNumber,
    pub esm_class: EsmClass,
    pub registered_delivery: u8,
    pub data_coding: DataCoding,
    pub tlvs: Vec<Tlv>,
}

impl DataSm {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.service_type, MAX_SERVICE_TYPE_LEN + 1, "service_type")?;
        buf.extend_from_slice(&[self.source.ton as u8, self.source.npi as u8]);
        encode_cstring(buf, &self.source.address, 65, "source_addr")?;
        buf.extend_from_slice(&[self.destination.ton as u8, self.destination.npi as u8]);
        encode_cstring(buf, &self.destination.address, 65, "destination_addr")?;
        buf.extend_from_slice(&[
            self.esm_class.to_byte(),
            self.registered_delivery,
            self.data_coding.value(),
        ]);
        for tlv in &self.tlvs {
            tlv.encode(buf);
        }
        Ok(())
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<DataSm> {
        let service_type = decode_cstring(cur, MAX_SERVICE_TYPE_LEN + 1, "service_type")?;
        let source_ton = decode_ton(cur, "source_addr_ton")?;
        let source_npi = decode_npi(cur, "source_addr_npi")?;
        let source_addr = decode_cstring(cur, 65, "source_addr")?;
        let dest_ton = decode_ton(cur, "dest_addr_ton")?;
        let dest_npi = decode_npi(cur, "dest_addr_npi")?;
        let dest_addr = decode_cstring(cur, 65, "destination_addr")?;
        let esm_class = EsmClass::from_byte(decode_u8(cur, "esm_class")?);
        let registered_delivery = decode_u8(cur, "registered_delivery")?;
        let data_coding = DataCoding::from(decode_u8(cur, "data_coding")?);
        let mut tlvs = Vec::new();
        while has_remaining(cur) {
            tlvs.push(Tlv::decode(cur)?);
        }
        Ok(DataSm {
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
            registered_delivery,
            data_coding,
            tlvs,
        })
    }
}

/// Body of data_sm_resp.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataSmResp {
    pub message_id: String,
}

impl DataSmResp {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LEN + 1, "message_id")
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<DataSmResp> {
        let message_id = if has_remaining(cur) {
            decode_cstring(cur, MAX_MESSAGE_ID_LEN + 1, "message_id")?
        } else {
            String::new()
        };
        Ok(DataSmResp { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::tlv::tags;

    #[test]
    fn round_trip_with_payload_tlv() {
        let data_sm = DataSm {
            source: PhoneNumber::international("38164111222").unwrap(),
            destination: PhoneNumber::international("38164333444").unwrap(),
            data_coding: DataCoding::OctetUnspecified,
            tlvs: vec![Tlv::new(tags::MESSAGE_PAYLOAD, vec![0xDE, 0xAD, 0xBE, 0xEF])],
            ..DataSm::default()
        };
        let mut buf = BytesMut::new();
        data_sm.encode_body(&mut buf).unwrap();
        let bytes = buf.freeze();
        let mut cursor = Cursor::new(bytes.as_ref());
        assert_eq!(DataSm::decode_body(&mut cursor).unwrap(), data_sm);
    }
}
