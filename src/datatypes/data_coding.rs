/// Data Coding Scheme values (SMPP v3.4 section 5.2.19).
///
/// Only a subset has a text codec in this crate (see [`crate::text`]);
/// the rest round-trip so inbound PDUs using them still parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DataCoding {
    /// SMSC default alphabet, conventionally GSM 03.38.
    #[default]
    SmscDefault,
    /// IA5 (CCITT T.50) / ASCII (ANSI X3.4).
    Ascii,
    /// Octet unspecified (8-bit binary).
    OctetUnspecified,
    /// Latin 1 (ISO-8859-1).
    Latin1,
    /// Octet unspecified (8-bit binary), second allocation.
    OctetUnspecified2,
    /// JIS (X 0208-1990).
    Jis,
    /// Cyrillic (ISO-8859-5).
    Cyrillic,
    /// Latin/Hebrew (ISO-8859-8).
    LatinHebrew,
    /// UCS2 (ISO/IEC-10646), big endian.
    Ucs2,
    /// Pictogram encoding.
    Pictogram,
    /// ISO-2022-JP (music codes).
    MusicCodes,
    /// Extended Kanji JIS (X 0212-1990).
    ExtendedKanji,
    /// KS C 5601.
    KsC5601,
    Other(u8),
}

impl DataCoding {
    pub fn value(self) -> u8 {
        match self {
            DataCoding::SmscDefault => 0b0000_0000,
            DataCoding::Ascii => 0b0000_0001,
            DataCoding::OctetUnspecified => 0b0000_0010,
            DataCoding::Latin1 => 0b0000_0011,
            DataCoding::OctetUnspecified2 => 0b0000_0100,
            DataCoding::Jis => 0b0000_0101,
            DataCoding::Cyrillic => 0b0000_0110,
            DataCoding::LatinHebrew => 0b0000_0111,
            DataCoding::Ucs2 => 0b0000_1000,
            DataCoding::Pictogram => 0b0000_1001,
            DataCoding::MusicCodes => 0b0000_1010,
            DataCoding::ExtendedKanji => 0b0000_1101,
            DataCoding::KsC5601 => 0b0000_1110,
            DataCoding::Other(value) => value,
        }
    }
}

impl From<u8> for DataCoding {
    fn from(value: u8) -> Self {
        match value {
            0b0000_0000 => DataCoding::SmscDefault,
            0b0000_0001 => DataCoding::Ascii,
            0b0000_0010 => DataCoding::OctetUnspecified,
            0b0000_0011 => DataCoding::Latin1,
            0b0000_0100 => DataCoding::OctetUnspecified2,
            0b0000_0101 => DataCoding::Jis,
            0b0000_0110 => DataCoding::Cyrillic,
            0b0000_0111 => DataCoding::LatinHebrew,
            0b0000_1000 => DataCoding::Ucs2,
            0b0000_1001 => DataCoding::Pictogram,
            0b0000_1010 => DataCoding::MusicCodes,
            0b0000_1101 => DataCoding::ExtendedKanji,
            0b0000_1110 => DataCoding::KsC5601,
            other => DataCoding::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for raw in [0u8, 1, 2, 3, 4, 8, 14, 0xF1] {
            assert_eq!(DataCoding::from(raw).value(), raw);
        }
    }
}
