use crate::datatypes::{NumericPlanIndicator, TypeOfNumber};
use crate::error::{SmppError, SmppResult};

/// Maximum address length in submit/deliver operations, excluding the
/// NUL terminator.
pub const MAX_ADDRESS_LEN: usize = 20;

/// An SMPP address: the digits plus their type-of-number and
/// numbering-plan indicator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoneNumber {
    pub address: String,
    pub ton: TypeOfNumber,
    pub npi: NumericPlanIndicator,
}

impl PhoneNumber {
    pub fn new(
        address: impl Into<String>,
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
    ) -> SmppResult<Self> {
        let number = PhoneNumber {
            address: address.into(),
            ton,
            npi,
        };
        number.validate("address")?;
        Ok(number)
    }

    /// Convenience constructor for the common international/ISDN case.
    pub fn international(address: impl Into<String>) -> SmppResult<Self> {
        PhoneNumber::new(
            address,
            TypeOfNumber::International,
            NumericPlanIndicator::Isdn,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty()
    }

    pub(crate) fn validate(&self, field: &'static str) -> SmppResult<()> {
        if self.address.len() > MAX_ADDRESS_LEN {
            return Err(SmppError::InvalidParameter {
                field,
                reason: format!(
                    "{} characters exceeds the maximum of {MAX_ADDRESS_LEN}",
                    self.address.len()
                ),
            });
        }
        if !self.address.is_ascii() {
            return Err(SmppError::InvalidParameter {
                field,
                reason: "address must be ASCII".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn international_number() {
        let number = PhoneNumber::international("38164123456").unwrap();
        assert_eq!(number.ton, TypeOfNumber::International);
        assert_eq!(number.npi, NumericPlanIndicator::Isdn);
        assert!(!number.is_empty());
    }

    #[test]
    fn over_long_address_is_rejected() {
        let err = PhoneNumber::international("123456789012345678901").unwrap_err();
        assert!(matches!(err, SmppError::InvalidParameter { field, .. } if field == "address"));
    }

    #[test]
    fn non_ascii_address_is_rejected() {
        assert!(PhoneNumber::international("06\u{17d}1").is_err());
    }
}
