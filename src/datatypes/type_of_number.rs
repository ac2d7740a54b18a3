/// Type of Number (SMPP v3.4 section 5.2.5).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeOfNumber {
    #[default]
    Unknown = 0b0000_0000,
    International = 0b0000_0001,
    National = 0b0000_0010,
    NetworkSpecific = 0b0000_0011,
    SubscriberNumber = 0b0000_0100,
    Alphanumeric = 0b0000_0101,
    Abbreviated = 0b0000_0110,
}

impl TryFrom<u8> for TypeOfNumber {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0 => Ok(TypeOfNumber::Unknown),
            1 => Ok(TypeOfNumber::International),
            2 => Ok(TypeOfNumber::National),
            3 => Ok(TypeOfNumber::NetworkSpecific),
            4 => Ok(TypeOfNumber::SubscriberNumber),
            5 => Ok(TypeOfNumber::Alphanumeric),
            6 => Ok(TypeOfNumber::Abbreviated),
            other => Err(other),
        }
    }
}
