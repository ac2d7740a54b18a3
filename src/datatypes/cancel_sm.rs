use bytes::BytesMut;
use std::io::Cursor;

use crate::codec::{decode_cstring, encode_cstring};
use crate::datatypes::bind::{decode_npi, decode_ton};
use crate::datatypes::submit_sm::{MAX_MESSAGE_ID_LEN, MAX_SERVICE_TYPE_LEN};
use crate::datatypes::PhoneNumber;
use crate::error::SmppResult;

/// Body of cancel_sm (section 4.9.1): withdraw a previously submitted
/// message, addressed either by message_id or by service_type plus the
/// source/destination pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CancelSm {
    pub service_type: String,
    pub message_id: String,
    pub source: PhoneNumber,
    pub destination: PhoneNumber,
}

impl CancelSm {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.service_type, MAX_SERVICE_TYPE_LEN + 1, "service_type")?;
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LEN + 1, "message_id")?;
        buf.extend_from_slice(&[self.source.ton as u8, self.source.npi as u8]);
        encode_cstring(buf, &self.source.address, 21, "source_addr")?;
        buf.extend_from_slice(&[self.destination.ton as u8, self.destination.npi as u8]);
        encode_cstring(buf, &self.destination.address, 21, "destination_addr")?;
        Ok(())
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<CancelSm> {
        let service_type = decode_cstring(cur, MAX_SERVICE_TYPE_LEN + 1, "service_type")?;
        let message_id = decode_cstring(cur, MAX_MESSAGE_ID_LEN + 1, "message_id")?;
        let source_ton = decode_ton(cur, "source_addr_ton")?;
        let source_npi = decode_npi(cur, "source_addr_npi")?;
        let source_addr = decode_cstring(cur, 21, "source_addr")?;
        let dest_ton = decode_ton(cur, "dest_addr_ton")?;
        let dest_npi = decode_npi(cur, "dest_addr_npi")?;
        let dest_addr = decode_cstring(cur, 21, "destination_addr")?;
        Ok(CancelSm {
            service_type,
            message_id,
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
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cancel = CancelSm {
            message_id: "c-42".into(),
            source: PhoneNumber::international("38164111222").unwrap(),
            destination: PhoneNumber::international("38164333444").unwrap(),
            ..CancelSm::default()
        };
        let mut buf = BytesMut::new();
        cancel.encode_body(&mut buf).unwrap();
        let bytes = buf.freeze();
        let mut cursor = Cursor::new(bytes.as_ref());
        assert_eq!(CancelSm::decode_body(&mut cursor).unwrap(), cancel);
        assert_eq!(cursor.position() as usize, bytes.len());
    }
}
