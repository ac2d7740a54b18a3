use bytes::BytesMut;
use std::io::Cursor;

use crate::codec::{decode_cstring, encode_cstring};
use crate::datatypes::bind::{decode_npi, decode_ton, has_remaining};
use crate::datatypes::tlv::Tlv;
use crate::datatypes::PhoneNumber;
use crate::error::SmppResult;

/// Body of alert_notification (section 4.12.1): the SMSC signals that a
/// mobile subscriber has become reachable. One-way, no response PDU.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlertNotification {
    pub source: PhoneNumber,
    pub esme_addr: PhoneNumber,
    /// Typically a single `ms_availability_status` parameter.
    pub tlvs: Vec<Tlv>,
}

impl AlertNotification {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        buf.extend_from_slice(&[self.source.ton as u8, self.source.npi as u8]);
        encode_cstring(buf, &self.source.address, 65, "source_addr")?;
        buf.extend_from_slice(&[self.esme_addr.ton as u8, self.esme_addr.npi as u8]);
        encode_cstring(buf, &self.esme_addr.address, 65, "esme_addr")?;
        for tlv in &self.tlvs {
            tlv.encode(buf);
        }
        Ok(())
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<AlertNotification> {
        let source_ton = decode_ton(cur, "source_addr_ton")?;
        let source_npi = decode_npi(cur, "source_addr_npi")?;
        let source_addr = decode_cstring(cur, 65, "source_addr")?;
        let esme_ton = decode_ton(cur, "esme_addr_ton")?;
        let esme_npi = decode_npi(cur, "esme_addr_npi")?;
        let esme_addr = decode_cstring(cur, 65, "esme_addr")?;
        let mut tlvs = Vec::new();
        while has_remaining(cur) {
            tlvs.push(Tlv::decode(cur)?);
        }
        Ok(AlertNotification {
            source: PhoneNumber {
                address: source_addr,
                ton: source_ton,
                npi: source_npi,
            },
            esme_addr: PhoneNumber {
                address: esme_addr,
                ton: esme_ton,
                npi: esme_npi,
            },
            tlvs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::tlv::tags;

    #[test]
    fn round_trip() {
        let alert = AlertNotification {
            source: PhoneNumber::international("38164111222").unwrap(),
            esme_addr: PhoneNumber::international("38164999888").unwrap(),
            tlvs: vec![Tlv::u8_value(tags::MS_AVAILABILITY_STATUS, 0)],
        };
        let mut buf = BytesMut::new();
        alert.encode_body(&mut buf).unwrap();
        let bytes = buf.freeze();
        let mut cursor = Cursor::new(bytes.as_ref());
        assert_eq!(
            AlertNotification::decode_body(&mut cursor).unwrap(),
            alert
        );
    }
}
