// ABOUTME: Conversion between application strings and DCS-indexed byte encodings
// ABOUTME: Dispatches over the encodings this client speaks; receipt text parsing lives here too

pub mod gsm7;
pub mod receipt;

pub use receipt::{DeliveryReceipt, ReceiptState, ReceiptTimestamp};

use crate::datatypes::DataCoding;
use crate::error::{SmppError, SmppResult};

/// The text encodings this client can produce and consume.
///
/// `Gsm7Packed` is not a distinct data coding value on the wire (both GSM
/// forms use `data_coding = 0`); whether the default alphabet is packed is
/// a property of the SMSC and is configured, not negotiated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SmsEncoding {
    /// GSM 03.38 default alphabet, one septet per octet.
    #[default]
    Gsm7,
    /// GSM 03.38 with septets packed into octets.
    Gsm7Packed,
    /// IA5 / ASCII.
    Ascii,
    /// ISO-8859-1.
    Latin1,
    /// 8-bit binary pass-through.
    Octet,
    /// UCS-2 big endian.
    Ucs2,
}

impl SmsEncoding {
    /// The `data_coding` byte advertising this encoding.
    pub fn data_coding(self) -> DataCoding {
        match self {
            SmsEncoding::Gsm7 | SmsEncoding::Gsm7Packed => DataCoding::SmscDefault,
            SmsEncoding::Ascii => DataCoding::Ascii,
            SmsEncoding::Latin1 => DataCoding::Latin1,
            SmsEncoding::Octet => DataCoding::OctetUnspecified,
            SmsEncoding::Ucs2 => DataCoding::Ucs2,
        }
    }

    /// The encoding to use for an inbound message with the given
    /// `data_coding`; `default` applies when the SMSC default alphabet (0)
    /// is indicated. `None` for schemes this client has no codec for.
    pub fn for_data_coding(coding: DataCoding, default: SmsEncoding) -> Option<SmsEncoding> {
        match coding {
            DataCoding::SmscDefault => Some(default),
            DataCoding::Ascii => Some(SmsEncoding::Ascii),
            DataCoding::Latin1 => Some(SmsEncoding::Latin1),
            DataCoding::OctetUnspecified | DataCoding::OctetUnspecified2 => {
                Some(SmsEncoding::Octet)
            }
            DataCoding::Ucs2 => Some(SmsEncoding::Ucs2),
            _ => None,
        }
    }
}

/// Encode `text` under `encoding`.
///
/// In strict mode an unrepresentable character fails with
/// [`SmppError::EncodeError`]; with `lossy` it is substituted (`?`, or a
/// homoglyph for GSM), and UCS-2 surrogate-encodes astral code points.
pub fn encode_text(text: &str, encoding: SmsEncoding, lossy: bool) -> SmppResult<Vec<u8>> {
    match encoding {
        SmsEncoding::Gsm7 => gsm7::encode(text, lossy),
        SmsEncoding::Gsm7Packed => gsm7::encode_packed(text, lossy),
        SmsEncoding::Ascii => encode_single_byte(text, 0x7F, lossy),
        SmsEncoding::Latin1 | SmsEncoding::Octet => encode_single_byte(text, 0xFF, lossy),
        SmsEncoding::Ucs2 => encode_ucs2(text, lossy),
    }
}

/// Decode `data` under `encoding`.
pub fn decode_text(data: &[u8], encoding: SmsEncoding, lossy: bool) -> SmppResult<String> {
    match encoding {
        SmsEncoding::Gsm7 => gsm7::decode(data, lossy),
        SmsEncoding::Gsm7Packed => gsm7::decode_packed(data, lossy),
        SmsEncoding::Ascii => decode_single_byte(data, 0x7F, lossy),
        SmsEncoding::Latin1 | SmsEncoding::Octet => decode_single_byte(data, 0xFF, lossy),
        SmsEncoding::Ucs2 => decode_ucs2(data, lossy),
    }
}

fn encode_single_byte(text: &str, max: u32, lossy: bool) -> SmppResult<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for (offset, ch) in text.chars().enumerate() {
        let code = ch as u32;
        if code <= max {
            out.push(code as u8);
        } else if lossy {
            out.push(b'?');
        } else {
            return Err(SmppError::EncodeError { ch, offset });
        }
    }
    Ok(out)
}

fn decode_single_byte(data: &[u8], max: u8, lossy: bool) -> SmppResult<String> {
    let mut out = String::with_capacity(data.len());
    for (offset, &byte) in data.iter().enumerate() {
        if byte <= max {
            out.push(byte as char);
        } else if lossy {
            out.push('?');
        } else {
            return Err(SmppError::DecodeError {
                reason: format!("octet {byte:#04x} at offset {offset} is outside the alphabet"),
            });
        }
    }
    Ok(out)
}

fn encode_ucs2(text: &str, lossy: bool) -> SmppResult<Vec<u8>> {
    if !lossy {
        if let Some((offset, ch)) = text
            .chars()
            .enumerate()
            .find(|(_, ch)| (*ch as u32) > 0xFFFF)
        {
            return Err(SmppError::EncodeError { ch, offset });
        }
    }
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    Ok(out)
}

fn decode_ucs2(data: &[u8], lossy: bool) -> SmppResult<String> {
    if data.len() % 2 != 0 && !lossy {
        return Err(SmppError::DecodeError {
            reason: format!("UCS-2 payload has odd length {}", data.len()),
        });
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    if lossy {
        return Ok(String::from_utf16_lossy(&units));
    }
    String::from_utf16(&units).map_err(|_| SmppError::DecodeError {
        reason: "UCS-2 payload contains unpaired surrogates".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ucs2_round_trip() {
        let text = "Ћао свете";
        let encoded = encode_text(text, SmsEncoding::Ucs2, false).unwrap();
        assert_eq!(encoded.len(), text.chars().count() * 2);
        assert_eq!(decode_text(&encoded, SmsEncoding::Ucs2, false).unwrap(), text);
    }

    #[test]
    fn ucs2_rejects_astral_strict() {
        let err = encode_text("🚀", SmsEncoding::Ucs2, false).unwrap_err();
        assert!(matches!(err, SmppError::EncodeError { .. }));
        // Lossy surrogate-encodes and decodes back.
        let encoded = encode_text("🚀", SmsEncoding::Ucs2, true).unwrap();
        assert_eq!(encoded.len(), 4);
        assert_eq!(decode_text(&encoded, SmsEncoding::Ucs2, false).unwrap(), "🚀");
    }

    #[test]
    fn latin1_limits() {
        assert_eq!(
            encode_text("café", SmsEncoding::Latin1, false).unwrap(),
            vec![b'c', b'a', b'f', 0xE9]
        );
        assert!(encode_text("čaj", SmsEncoding::Latin1, false).is_err());
        assert_eq!(
            encode_text("čaj", SmsEncoding::Latin1, true).unwrap(),
            vec![b'?', b'a', b'j']
        );
    }

    #[test]
    fn ascii_is_seven_bit() {
        assert!(encode_text("plain", SmsEncoding::Ascii, false).is_ok());
        assert!(encode_text("café", SmsEncoding::Ascii, false).is_err());
        assert!(decode_text(&[0x80], SmsEncoding::Ascii, false).is_err());
    }

    #[test]
    fn octet_pass_through_round_trips_all_bytes() {
        let data: Vec<u8> = (0..=255).collect();
        let text = decode_text(&data, SmsEncoding::Octet, false).unwrap();
        assert_eq!(encode_text(&text, SmsEncoding::Octet, false).unwrap(), data);
    }

    #[test]
    fn data_coding_dispatch() {
        assert_eq!(
            SmsEncoding::for_data_coding(DataCoding::SmscDefault, SmsEncoding::Gsm7Packed),
            Some(SmsEncoding::Gsm7Packed)
        );
        assert_eq!(
            SmsEncoding::for_data_coding(DataCoding::Ucs2, SmsEncoding::Gsm7),
            Some(SmsEncoding::Ucs2)
        );
        assert_eq!(
            SmsEncoding::for_data_coding(DataCoding::Cyrillic, SmsEncoding::Gsm7),
            None
        );
        assert_eq!(SmsEncoding::Gsm7Packed.data_coding(), DataCoding::SmscDefault);
    }
}
