/// Numbering Plan Indicator (SMPP v3.4 section 5.2.6).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NumericPlanIndicator {
    #[default]
    Unknown = 0b0000_0000,
    Isdn = 0b0000_0001,
    Data = 0b0000_0011,
    Telex = 0b0000_0100,
    LandMobile = 0b0000_0110,
    National = 0b0000_1000,
    Private = 0b0000_1001,
    Ermes = 0b0000_1010,
    Internet = 0b0000_1110,
    WapClientId = 0b0001_0010,
}

impl TryFrom<u8> for NumericPlanIndicator {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0b0000_0000 => Ok(NumericPlanIndicator::Unknown),
            0b0000_0001 => Ok(NumericPlanIndicator::Isdn),
            0b0000_0011 => Ok(NumericPlanIndicator::Data),
            0b0000_0100 => Ok(NumericPlanIndicator::Telex),
            0b0000_0110 => Ok(NumericPlanIndicator::LandMobile),
            0b0000_1000 => Ok(NumericPlanIndicator::National),
            0b0000_1001 => Ok(NumericPlanIndicator::Private),
            0b0000_1010 => Ok(NumericPlanIndicator::Ermes),
            0b0000_1110 => Ok(NumericPlanIndicator::Internet),
            0b0001_0010 => Ok(NumericPlanIndicator::WapClientId),
            other => Err(other),
        }
    }
}
