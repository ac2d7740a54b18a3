/// SMPP v3.4 command identifiers (specification section 5.1.2.1).
///
/// Response commands set the high bit of the matching request command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandId {
    GenericNack = 0x8000_0000,
    BindReceiver = 0x0000_0001,
    BindReceiverResp = 0x8000_0001,
    BindTransmitter = 0x0000_0002,
    BindTransmitterResp = 0x8000_0002,
    QuerySm = 0x0000_0003,
    QuerySmResp = 0x8000_0003,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    ReplaceSm = 0x0000_0007,
    ReplaceSmResp = 0x8000_0007,
    CancelSm = 0x0000_0008,
    CancelSmResp = 0x8000_0008,
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,
    Outbind = 0x0000_000B,
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    AlertNotification = 0x0000_0102,
    DataSm = 0x0000_0103,
    DataSmResp = 0x8000_0103,
}

impl CommandId {
    /// Check if this command_id represents a response PDU.
    pub fn is_response(self) -> bool {
        (self as u32) & 0x8000_0000 != 0
    }

    /// The response command expected for this request, if it has one.
    ///
    /// `outbind` and `alert_notification` are one-way and return `None`,
    /// as do responses themselves.
    pub fn response_id(self) -> Option<CommandId> {
        match self {
            CommandId::BindReceiver => Some(CommandId::BindReceiverResp),
            CommandId::BindTransmitter => Some(CommandId::BindTransmitterResp),
            CommandId::BindTransceiver => Some(CommandId::BindTransceiverResp),
            CommandId::QuerySm => Some(CommandId::QuerySmResp),
            CommandId::SubmitSm => Some(CommandId::SubmitSmResp),
            CommandId::DeliverSm => Some(CommandId::DeliverSmResp),
            CommandId::Unbind => Some(CommandId::UnbindResp),
            CommandId::ReplaceSm => Some(CommandId::ReplaceSmResp),
            CommandId::CancelSm => Some(CommandId::CancelSmResp),
            CommandId::EnquireLink => Some(CommandId::EnquireLinkResp),
            CommandId::DataSm => Some(CommandId::DataSmResp),
            _ => None,
        }
    }
}

impl TryFrom<u32> for CommandId {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        let id = match value {
            0x8000_0000 => CommandId::GenericNack,
            0x0000_0001 => CommandId::BindReceiver,
            0x8000_0001 => CommandId::BindReceiverResp,
            0x0000_0002 => CommandId::BindTransmitter,
            0x8000_0002 => CommandId::BindTransmitterResp,
            0x0000_0003 => CommandId::QuerySm,
            0x8000_0003 => CommandId::QuerySmResp,
            0x0000_0004 => CommandId::SubmitSm,
            0x8000_0004 => CommandId::SubmitSmResp,
            0x0000_0005 => CommandId::DeliverSm,
            0x8000_0005 => CommandId::DeliverSmResp,
            0x0000_0006 => CommandId::Unbind,
            0x8000_0006 => CommandId::UnbindResp,
            0x0000_0007 => CommandId::ReplaceSm,
            0x8000_0007 => CommandId::ReplaceSmResp,
            0x0000_0008 => CommandId::CancelSm,
            0x8000_0008 => CommandId::CancelSmResp,
            0x0000_0009 => CommandId::BindTransceiver,
            0x8000_0009 => CommandId::BindTransceiverResp,
            0x0000_000B => CommandId::Outbind,
            0x0000_0015 => CommandId::EnquireLink,
            0x8000_0015 => CommandId::EnquireLinkResp,
            0x0000_0102 => CommandId::AlertNotification,
            0x0000_0103 => CommandId::DataSm,
            0x8000_0103 => CommandId::DataSmResp,
            other => return Err(other),
        };
        Ok(id)
    }
}
