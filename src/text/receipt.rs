// ABOUTME: Parser and formatter for the conventional delivery-receipt text
// ABOUTME: Tolerates vendor deviations; unknown key/value pairs are preserved verbatim

use std::fmt;

/// Final state of a receipted message, as reported in the `stat` field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiptState {
    Delivered,
    Expired,
    Deleted,
    Undeliverable,
    Accepted,
    Unknown,
    Rejected,
    /// A vendor state outside the conventional seven.
    Other(String),
}

impl ReceiptState {
    pub fn from_code(code: &str) -> ReceiptState {
        match code {
            "DELIVRD" => ReceiptState::Delivered,
            "EXPIRED" => ReceiptState::Expired,
            "DELETED" => ReceiptState::Deleted,
            "UNDELIV" => ReceiptState::Undeliverable,
            "ACCEPTD" => ReceiptState::Accepted,
            "UNKNOWN" => ReceiptState::Unknown,
            "REJECTD" => ReceiptState::Rejected,
            other => ReceiptState::Other(other.to_owned()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ReceiptState::Delivered => "DELIVRD",
            ReceiptState::Expired => "EXPIRED",
            ReceiptState::Deleted => "DELETED",
            ReceiptState::Undeliverable => "UNDELIV",
            ReceiptState::Accepted => "ACCEPTD",
            ReceiptState::Unknown => "UNKNOWN",
            ReceiptState::Rejected => "REJECTD",
            ReceiptState::Other(code) => code,
        }
    }

    /// True when the message reached a final state (nothing more will
    /// come for it).
    pub fn is_final(&self) -> bool {
        !matches!(self, ReceiptState::Accepted | ReceiptState::Unknown)
    }
}

impl fmt::Display for ReceiptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A receipt timestamp in `YYMMDDhhmm` form, optionally with seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl ReceiptTimestamp {
    pub fn parse(value: &str) -> Option<ReceiptTimestamp> {
        if !matches!(value.len(), 10 | 12) || !value.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        let digits = |range: std::ops::Range<usize>| value[range].parse::<u16>().ok();
        Some(ReceiptTimestamp {
            year: 2000 + digits(0..2)?,
            month: digits(2..4)? as u8,
            day: digits(4..6)? as u8,
            hour: digits(6..8)? as u8,
            minute: digits(8..10)? as u8,
            second: if value.len() == 12 {
                digits(10..12)? as u8
            } else {
                0
            },
        })
    }
}

impl fmt::Display for ReceiptTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}{:02}{:02}{:02}{:02}",
            self.year % 100,
            self.month,
            self.day,
            self.hour,
            self.minute
        )
    }
}

/// The parsed form of the conventional delivery-receipt text carried in
/// `deliver_sm.short_message` (SMPP v3.4 appendix B).
///
/// The format is conventional rather than normative and SMSC vendors
/// diverge; every field is optional and pairs with unrecognized keys are
/// kept in `extra` under their literal key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Message id assigned by the SMSC at submission.
    pub id: Option<String>,
    /// Number of short messages originally submitted.
    pub sub: Option<u32>,
    /// Number of short messages delivered.
    pub dlvrd: Option<u32>,
    pub submit_date: Option<ReceiptTimestamp>,
    pub done_date: Option<ReceiptTimestamp>,
    pub stat: Option<ReceiptState>,
    /// Network- or SMSC-specific error code, kept verbatim.
    pub err: Option<String>,
    /// First characters of the original message, at most 20.
    pub text: Option<String>,
    /// Unrecognized key/value pairs in order of appearance.
    pub extra: Vec<(String, String)>,
}

impl DeliveryReceipt {
    /// Parse receipt text of the conventional
    /// `id:… sub:… dlvrd:… submit date:… done date:… stat:… err:… text:…`
    /// shape. Keys are matched case-insensitively; `text` swallows the
    /// rest of the line. Unparseable values land in `extra`.
    pub fn parse(input: &str) -> DeliveryReceipt {
        let mut receipt = DeliveryReceipt::default();
        let mut index = 0usize;
        while let Some(colon) = input[index..].find(':') {
            let key = input[index..index + colon].trim().to_ascii_lowercase();
            index += colon + 1;
            let value_end = match input[index..].find(' ') {
                // The text field is last and may itself contain spaces.
                Some(_) if key == "text" => input.len(),
                Some(space) => index + space,
                None => input.len(),
            };
            let value = &input[index..value_end];
            index = (value_end + 1).min(input.len());
            receipt.assign(&key, value);
            if key == "text" {
                break;
            }
        }
        receipt
    }

    fn assign(&mut self, key: &str, value: &str) {
        match key {
            "id" => self.id = Some(value.to_owned()),
            "sub" => match value.parse() {
                Ok(count) => self.sub = Some(count),
                Err(_) => self.keep_extra(key, value),
            },
            "dlvrd" => match value.parse() {
                Ok(count) => self.dlvrd = Some(count),
                Err(_) => self.keep_extra(key, value),
            },
            "submit date" => match ReceiptTimestamp::parse(value) {
                Some(stamp) => self.submit_date = Some(stamp),
                None => self.keep_extra(key, value),
            },
            "done date" => match ReceiptTimestamp::parse(value) {
                Some(stamp) => self.done_date = Some(stamp),
                None => self.keep_extra(key, value),
            },
            "stat" => self.stat = Some(ReceiptState::from_code(value)),
            "err" => self.err = Some(value.to_owned()),
            "text" => self.text = Some(value.trim_end().to_owned()),
            _ => self.keep_extra(key, value),
        }
    }

    fn keep_extra(&mut self, key: &str, value: &str) {
        self.extra.push((key.to_owned(), value.to_owned()));
    }

    /// Render in the conventional shape. Feeds tests and lets an
    /// application synthesize receipt text for its own records.
    pub fn to_text(&self) -> String {
        let date = |stamp: &Option<ReceiptTimestamp>| {
            stamp.map(|value| value.to_string()).unwrap_or_default()
        };
        format!(
            "id:{} sub:{:03} dlvrd:{:03} submit date:{} done date:{} stat:{} err:{} Text:{:<20}",
            self.id.as_deref().unwrap_or(""),
            self.sub.unwrap_or(0),
            self.dlvrd.unwrap_or(0),
            date(&self.submit_date),
            date(&self.done_date),
            self.stat.as_ref().map(ReceiptState::code).unwrap_or(""),
            self.err.as_deref().unwrap_or(""),
            self.text.as_deref().unwrap_or(""),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONVENTIONAL: &str = "id:0123456789 sub:001 dlvrd:001 submit date:2402291330 \
                                done date:2402291331 stat:DELIVRD err:000 text:Hello world";

    #[test]
    fn parses_conventional_receipt() {
        let receipt = DeliveryReceipt::parse(CONVENTIONAL);
        assert_eq!(receipt.id.as_deref(), Some("0123456789"));
        assert_eq!(receipt.sub, Some(1));
        assert_eq!(receipt.dlvrd, Some(1));
        assert_eq!(receipt.stat, Some(ReceiptState::Delivered));
        assert_eq!(receipt.err.as_deref(), Some("000"));
        assert_eq!(receipt.text.as_deref(), Some("Hello world"));
        let submitted = receipt.submit_date.unwrap();
        assert_eq!(submitted.year, 2024);
        assert_eq!(submitted.month, 2);
        assert_eq!(submitted.day, 29);
        assert_eq!(submitted.hour, 13);
        assert_eq!(submitted.minute, 30);
        assert!(receipt.extra.is_empty());
    }

    #[test]
    fn missing_fields_stay_absent() {
        let receipt = DeliveryReceipt::parse("id:77 stat:EXPIRED");
        assert_eq!(receipt.id.as_deref(), Some("77"));
        assert_eq!(receipt.stat, Some(ReceiptState::Expired));
        assert_eq!(receipt.sub, None);
        assert_eq!(receipt.submit_date, None);
        assert_eq!(receipt.text, None);
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let receipt = DeliveryReceipt::parse("id:9 foo:bar stat:DELIVRD");
        assert_eq!(receipt.extra, vec![("foo".to_owned(), "bar".to_owned())]);
    }

    #[test]
    fn unparseable_numbers_fall_through_to_extra() {
        let receipt = DeliveryReceipt::parse("sub:many dlvrd:002");
        assert_eq!(receipt.sub, None);
        assert_eq!(receipt.dlvrd, Some(2));
        assert_eq!(receipt.extra, vec![("sub".to_owned(), "many".to_owned())]);
    }

    #[test]
    fn vendor_state_is_kept() {
        let receipt = DeliveryReceipt::parse("stat:QUEUED");
        assert_eq!(receipt.stat, Some(ReceiptState::Other("QUEUED".into())));
        assert!(!ReceiptState::Accepted.is_final());
        assert!(ReceiptState::Rejected.is_final());
    }

    #[test]
    fn format_then_parse_round_trips() {
        let receipt = DeliveryReceipt {
            id: Some("abc123".into()),
            sub: Some(1),
            dlvrd: Some(1),
            submit_date: ReceiptTimestamp::parse("2402291330"),
            done_date: ReceiptTimestamp::parse("2402291331"),
            stat: Some(ReceiptState::Delivered),
            err: Some("000".into()),
            text: Some("ping".into()),
            extra: Vec::new(),
        };
        let parsed = DeliveryReceipt::parse(&receipt.to_text());
        assert_eq!(parsed, receipt);
    }
}
