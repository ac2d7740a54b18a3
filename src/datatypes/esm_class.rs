use std::fmt;

/// The esm_class bitfield (SMPP v3.4 section 5.2.12).
///
/// A thin wrapper over the raw byte: unknown bit patterns from a peer are
/// carried as-is rather than rejected. Bits 5..2 are the message type (1 =
/// SMSC delivery receipt), bit 6 is UDHI, bit 7 is the reply path flag.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EsmClass(u8);

const MESSAGE_TYPE_MASK: u8 = 0b0011_1100;
const MESSAGE_TYPE_RECEIPT: u8 = 0b0000_0100;
const UDHI: u8 = 0b0100_0000;
const REPLY_PATH: u8 = 0b1000_0000;

impl EsmClass {
    pub fn from_byte(value: u8) -> Self {
        EsmClass(value)
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// The esm_class marking an SMSC delivery receipt in deliver_sm.
    pub fn delivery_receipt() -> Self {
        EsmClass(MESSAGE_TYPE_RECEIPT)
    }

    pub fn with_udhi(self) -> Self {
        EsmClass(self.0 | UDHI)
    }

    /// User Data Header Indicator: the short message starts with a UDH.
    pub fn has_udhi(self) -> bool {
        self.0 & UDHI != 0
    }

    pub fn has_reply_path(self) -> bool {
        self.0 & REPLY_PATH != 0
    }

    /// Message type bits 5..2; 1 marks a delivery receipt.
    pub fn message_type(self) -> u8 {
        (self.0 & MESSAGE_TYPE_MASK) >> 2
    }

    pub fn is_delivery_receipt(self) -> bool {
        self.0 & MESSAGE_TYPE_MASK == MESSAGE_TYPE_RECEIPT
    }
}

impl fmt::Debug for EsmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EsmClass({:#04x})", self.0)
    }
}
