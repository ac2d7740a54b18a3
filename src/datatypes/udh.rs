// ABOUTME: User Data Header parsing and encoding for short message payloads
// ABOUTME: Exposes concatenation information elements without reassembling parts

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{SmppError, SmppResult};

/// Information element identifier for 8-bit reference concatenation.
pub const IE_CONCAT_8: u8 = 0x00;
/// Information element identifier for 16-bit reference concatenation.
pub const IE_CONCAT_16: u8 = 0x08;

/// A single information element inside a User Data Header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UdhElement {
    pub id: u8,
    pub data: Bytes,
}

/// A parsed User Data Header (3GPP TS 23.040 section 9.2.3.24).
///
/// Present at the start of the short message payload when the esm_class
/// UDHI bit is set. The codec only parses the header; reassembly of
/// concatenated parts is left to the application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Udh {
    pub elements: Vec<UdhElement>,
}

/// Concatenation data extracted from a UDH.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConcatInfo {
    pub reference: u16,
    pub total_parts: u8,
    pub sequence: u8,
}

impl Udh {
    /// Parse a UDH from the start of a short message payload.
    ///
    /// Returns the header and the number of octets it occupied
    /// (the length byte plus the declared length).
    pub fn parse(payload: &[u8]) -> SmppResult<(Udh, usize)> {
        let udh_len = *payload.first().ok_or_else(|| SmppError::MalformedPdu {
            reason: "empty payload with UDHI set".into(),
            offset: 0,
        })? as usize;
        let total = udh_len + 1;
        if payload.len() < total {
            return Err(SmppError::MalformedPdu {
                reason: format!(
                    "UDH declares {udh_len} octets but only {} available",
                    payload.len() - 1
                ),
                offset: 0,
            });
        }

        let mut elements = Vec::new();
        let mut index = 1;
        while index < total {
            if total - index < 2 {
                return Err(SmppError::MalformedPdu {
                    reason: "truncated UDH information element".into(),
                    offset: index,
                });
            }
            let id = payload[index];
            let len = payload[index + 1] as usize;
            index += 2;
            if index + len > total {
                return Err(SmppError::MalformedPdu {
                    reason: format!("UDH information element {id:#04x} overruns the header"),
                    offset: index,
                });
            }
            elements.push(UdhElement {
                id,
                data: Bytes::copy_from_slice(&payload[index..index + len]),
            });
            index += len;
        }

        Ok((Udh { elements }, total))
    }

    pub fn encoded_len(&self) -> usize {
        1 + self
            .elements
            .iter()
            .map(|element| 2 + element.data.len())
            .sum::<usize>()
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8((self.encoded_len() - 1) as u8);
        for element in &self.elements {
            buf.put_u8(element.id);
            buf.put_u8(element.data.len() as u8);
            buf.put_slice(&element.data);
        }
    }

    /// Build a UDH holding a single 8-bit concatenation element.
    pub fn concat_8bit(reference: u8, total_parts: u8, sequence: u8) -> Udh {
        Udh {
            elements: vec![UdhElement {
                id: IE_CONCAT_8,
                data: Bytes::copy_from_slice(&[reference, total_parts, sequence]),
            }],
        }
    }

    /// Concatenation info, if this header carries an 8- or 16-bit
    /// concatenation element.
    pub fn concat(&self) -> Option<ConcatInfo> {
        for element in &self.elements {
            match (element.id, element.data.len()) {
                (IE_CONCAT_8, 3) => {
                    return Some(ConcatInfo {
                        reference: element.data[0] as u16,
                        total_parts: element.data[1],
                        sequence: element.data[2],
                    })
                }
                (IE_CONCAT_16, 4) => {
                    return Some(ConcatInfo {
                        reference: u16::from_be_bytes([element.data[0], element.data[1]]),
                        total_parts: element.data[2],
                        sequence: element.data[3],
                    })
                }
                _ => {}
            }
        }
        None
    }
}
