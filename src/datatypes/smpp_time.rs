use std::fmt;

use crate::error::{SmppError, SmppResult};

/// An SMPP time field in `YYMMDDhhmmsstnnp` form (section 7.1.1).
///
/// The empty value means "immediate" for delivery times and "SMSC default"
/// for validity periods. Absolute times end in `+`/`-` with a UTC offset in
/// quarter hours; relative times end in `R`.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SmppTime(String);

impl SmppTime {
    pub fn immediate() -> Self {
        SmppTime(String::new())
    }

    pub fn is_immediate(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_relative(&self) -> bool {
        self.0.ends_with('R')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate and wrap a raw time string.
    pub fn parse(value: &str) -> SmppResult<Self> {
        if value.is_empty() {
            return Ok(SmppTime::immediate());
        }
        let bytes = value.as_bytes();
        if bytes.len() != 16 {
            return Err(SmppError::InvalidParameter {
                field: "smpp_time",
                reason: format!("expected 16 characters, got {}", bytes.len()),
            });
        }
        if !bytes[..15].iter().all(u8::is_ascii_digit) {
            return Err(SmppError::InvalidParameter {
                field: "smpp_time",
                reason: "positions 1-15 must be digits".into(),
            });
        }
        if !matches!(bytes[15], b'+' | b'-' | b'R') {
            return Err(SmppError::InvalidParameter {
                field: "smpp_time",
                reason: "time must end in '+', '-' or 'R'".into(),
            });
        }
        Ok(SmppTime(value.to_owned()))
    }

    /// An absolute time; `offset_quarter_hours` is the UTC offset in
    /// 15-minute units, signed.
    pub fn absolute(
        year: u8,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        offset_quarter_hours: i8,
    ) -> SmppResult<Self> {
        let sign = if offset_quarter_hours < 0 { '-' } else { '+' };
        SmppTime::parse(&format!(
            "{year:02}{month:02}{day:02}{hour:02}{minute:02}{second:02}0{:02}{sign}",
            offset_quarter_hours.unsigned_abs()
        ))
    }

    /// A relative validity expressed in days/hours/minutes/seconds from now.
    pub fn relative(days: u16, hours: u8, minutes: u8, seconds: u8) -> SmppResult<Self> {
        // Years use 365 days and months 30, mirroring the decode direction.
        let years = days / 365;
        let months = (days % 365) / 30;
        let days = (days % 365) % 30;
        SmppTime::parse(&format!(
            "{years:02}{months:02}{days:02}{hours:02}{minutes:02}{seconds:02}000R"
        ))
    }
}

impl fmt::Debug for SmppTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_immediate() {
            write!(f, "SmppTime(immediate)")
        } else {
            write!(f, "SmppTime({})", self.0)
        }
    }
}

impl fmt::Display for SmppTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_immediate() {
        let time = SmppTime::parse("").unwrap();
        assert!(time.is_immediate());
        assert_eq!(time.as_str(), "");
    }

    #[test]
    fn absolute_formatting() {
        let time = SmppTime::absolute(24, 3, 1, 13, 45, 0, 4).unwrap();
        assert_eq!(time.as_str(), "240301134500004+");
        assert!(!time.is_relative());
    }

    #[test]
    fn relative_formatting() {
        let time = SmppTime::relative(400, 2, 0, 0).unwrap();
        assert_eq!(time.as_str(), "010105020000000R");
        assert!(time.is_relative());
    }

    #[test]
    fn invalid_inputs() {
        assert!(SmppTime::parse("not a time").is_err());
        assert!(SmppTime::parse("2403011345000040").is_err());
        assert!(SmppTime::parse("24030113450000+").is_err());
    }
}
