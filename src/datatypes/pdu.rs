// ABOUTME: The tagged PDU value shared by the whole crate, with encode/decode dispatch
// ABOUTME: One header struct plus a body variant per SMPP 3.4 command

use bytes::{BufMut, Bytes, BytesMut};
use std::io::Cursor;

use crate::codec::{CodecOptions, PduHeader, PDU_HEADER_LENGTH};
use crate::datatypes::{
    AlertNotification, Bind, BindResp, CancelSm, CommandId, CommandStatus, DataSm, DataSmResp,
    DeliverSm, DeliverSmResp, Outbind, QuerySm, QuerySmResp, ReplaceSm, SubmitSm, SubmitSmResp,
};
use crate::error::{SmppError, SmppResult};

/// One SMPP protocol data unit: the shared header fields plus a
/// per-command body. `command_length` is implied and computed at encode
/// time; `command_id` is implied by the body variant.
#[derive(Clone, Debug, PartialEq)]
pub struct Pdu {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: PduBody,
}

/// The body variant for every command this crate models. Large bodies
/// are boxed so the enum stays cheap to move around the session.
#[derive(Clone, Debug, PartialEq)]
pub enum PduBody {
    BindTransmitter(Bind),
    BindTransmitterResp(BindResp),
    BindReceiver(Bind),
    BindReceiverResp(BindResp),
    BindTransceiver(Bind),
    BindTransceiverResp(BindResp),
    Outbind(Outbind),
    Unbind,
    UnbindResp,
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResp),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResp),
    QuerySm(QuerySm),
    QuerySmResp(QuerySmResp),
    CancelSm(CancelSm),
    CancelSmResp,
    ReplaceSm(Box<ReplaceSm>),
    ReplaceSmResp,
    DataSm(Box<DataSm>),
    DataSmResp(DataSmResp),
    EnquireLink,
    EnquireLinkResp,
    AlertNotification(AlertNotification),
    GenericNack,
}

impl Pdu {
    /// A request PDU with status OK; the session assigns the sequence
    /// number just before sending.
    pub fn request(body: PduBody) -> Pdu {
        Pdu {
            command_status: CommandStatus::Ok,
            sequence_number: 0,
            body,
        }
    }

    pub fn enquire_link(sequence_number: u32) -> Pdu {
        Pdu {
            command_status: CommandStatus::Ok,
            sequence_number,
            body: PduBody::EnquireLink,
        }
    }

    pub fn enquire_link_resp(sequence_number: u32) -> Pdu {
        Pdu {
            command_status: CommandStatus::Ok,
            sequence_number,
            body: PduBody::EnquireLinkResp,
        }
    }

    pub fn unbind(sequence_number: u32) -> Pdu {
        Pdu {
            command_status: CommandStatus::Ok,
            sequence_number,
            body: PduBody::Unbind,
        }
    }

    pub fn unbind_resp(sequence_number: u32) -> Pdu {
        Pdu {
            command_status: CommandStatus::Ok,
            sequence_number,
            body: PduBody::UnbindResp,
        }
    }

    pub fn generic_nack(sequence_number: u32, status: CommandStatus) -> Pdu {
        Pdu {
            command_status: status,
            sequence_number,
            body: PduBody::GenericNack,
        }
    }

    pub fn deliver_sm_resp(sequence_number: u32, status: CommandStatus) -> Pdu {
        Pdu {
            command_status: status,
            sequence_number,
            body: PduBody::DeliverSmResp(DeliverSmResp::default()),
        }
    }

    pub fn command_id(&self) -> CommandId {
        match &self.body {
            PduBody::BindTransmitter(_) => CommandId::BindTransmitter,
            PduBody::BindTransmitterResp(_) => CommandId::BindTransmitterResp,
            PduBody::BindReceiver(_) => CommandId::BindReceiver,
            PduBody::BindReceiverResp(_) => CommandId::BindReceiverResp,
            PduBody::BindTransceiver(_) => CommandId::BindTransceiver,
            PduBody::BindTransceiverResp(_) => CommandId::BindTransceiverResp,
            PduBody::Outbind(_) => CommandId::Outbind,
            PduBody::Unbind => CommandId::Unbind,
            PduBody::UnbindResp => CommandId::UnbindResp,
            PduBody::SubmitSm(_) => CommandId::SubmitSm,
            PduBody::SubmitSmResp(_) => CommandId::SubmitSmResp,
            PduBody::DeliverSm(_) => CommandId::DeliverSm,
            PduBody::DeliverSmResp(_) => CommandId::DeliverSmResp,
            PduBody::QuerySm(_) => CommandId::QuerySm,
            PduBody::QuerySmResp(_) => CommandId::QuerySmResp,
            PduBody::CancelSm(_) => CommandId::CancelSm,
            PduBody::CancelSmResp => CommandId::CancelSmResp,
            PduBody::ReplaceSm(_) => CommandId::ReplaceSm,
            PduBody::ReplaceSmResp => CommandId::ReplaceSmResp,
            PduBody::DataSm(_) => CommandId::DataSm,
            PduBody::DataSmResp(_) => CommandId::DataSmResp,
            PduBody::EnquireLink => CommandId::EnquireLink,
            PduBody::EnquireLinkResp => CommandId::EnquireLinkResp,
            PduBody::AlertNotification(_) => CommandId::AlertNotification,
            PduBody::GenericNack => CommandId::GenericNack,
        }
    }

    pub fn is_response(&self) -> bool {
        self.command_id().is_response()
    }

    /// Encode to wire bytes. `command_length` is patched in last, from
    /// the serialized length.
    pub fn to_bytes(&self, options: &CodecOptions) -> SmppResult<Bytes> {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u32(0);
        buf.put_u32(self.command_id() as u32);
        buf.put_u32(self.command_status.value());
        buf.put_u32(self.sequence_number);

        match &self.body {
            PduBody::BindTransmitter(bind)
            | PduBody::BindReceiver(bind)
            | PduBody::BindTransceiver(bind) => bind.encode_body(&mut buf)?,
            PduBody::BindTransmitterResp(resp)
            | PduBody::BindReceiverResp(resp)
            | PduBody::BindTransceiverResp(resp) => resp.encode_body(&mut buf)?,
            PduBody::Outbind(outbind) => outbind.encode_body(&mut buf)?,
            PduBody::SubmitSm(submit) => submit.encode_body(&mut buf, options)?,
            PduBody::SubmitSmResp(resp) => resp.encode_body(&mut buf)?,
            PduBody::DeliverSm(deliver) => deliver.encode_body(&mut buf, options)?,
            PduBody::DeliverSmResp(resp) => resp.encode_body(&mut buf)?,
            PduBody::QuerySm(query) => query.encode_body(&mut buf)?,
            PduBody::QuerySmResp(resp) => resp.encode_body(&mut buf)?,
            PduBody::CancelSm(cancel) => cancel.encode_body(&mut buf)?,
            PduBody::ReplaceSm(replace) => replace.encode_body(&mut buf, options)?,
            PduBody::DataSm(data) => data.encode_body(&mut buf)?,
            PduBody::DataSmResp(resp) => resp.encode_body(&mut buf)?,
            PduBody::AlertNotification(alert) => alert.encode_body(&mut buf)?,
            PduBody::Unbind
            | PduBody::UnbindResp
            | PduBody::CancelSmResp
            | PduBody::ReplaceSmResp
            | PduBody::EnquireLink
            | PduBody::EnquireLinkResp
            | PduBody::GenericNack => {}
        }

        let length = buf.len() as u32;
        if length > options.max_pdu_size {
            return Err(SmppError::FrameTooLarge {
                length,
                max: options.max_pdu_size,
            });
        }
        buf[0..4].copy_from_slice(&length.to_be_bytes());
        Ok(buf.freeze())
    }

    /// Decode one PDU from the front of `buf`.
    ///
    /// Consumes exactly `command_length` bytes and returns that count;
    /// trailing bytes beyond the frame are never touched. An unknown
    /// command with a non-zero status decodes as a `generic_nack`
    /// equivalent (status preserved, body discarded); with status zero it
    /// fails with [`SmppError::UnknownCommand`].
    pub fn decode(buf: &[u8], options: &CodecOptions) -> SmppResult<(Pdu, usize)> {
        let header = PduHeader::decode(buf, options.max_pdu_size)?;
        let frame_len = header.command_length as usize;
        if buf.len() < frame_len {
            return Err(SmppError::MalformedPdu {
                reason: format!(
                    "frame declares {frame_len} bytes but only {} are available",
                    buf.len()
                ),
                offset: 0,
            });
        }
        let frame = &buf[..frame_len];
        let mut cur = Cursor::new(frame);
        cur.set_position(PDU_HEADER_LENGTH as u64);

        let command = match CommandId::try_from(header.command_id) {
            Ok(command) => command,
            Err(raw) => {
                if header.command_status != CommandStatus::Ok {
                    // A response to something we never sent, using a
                    // command we do not know: keep the status, drop the
                    // body, treat it as a generic_nack.
                    let pdu = Pdu {
                        command_status: header.command_status,
                        sequence_number: header.sequence_number,
                        body: PduBody::GenericNack,
                    };
                    return Ok((pdu, frame_len));
                }
                return Err(SmppError::UnknownCommand { command_id: raw });
            }
        };

        let body = match command {
            CommandId::BindTransmitter => PduBody::BindTransmitter(Bind::decode_body(&mut cur)?),
            CommandId::BindReceiver => PduBody::BindReceiver(Bind::decode_body(&mut cur)?),
            CommandId::BindTransceiver => PduBody::BindTransceiver(Bind::decode_body(&mut cur)?),
            CommandId::BindTransmitterResp => {
                PduBody::BindTransmitterResp(BindResp::decode_body(&mut cur)?)
            }
            CommandId::BindReceiverResp => {
                PduBody::BindReceiverResp(BindResp::decode_body(&mut cur)?)
            }
            CommandId::BindTransceiverResp => {
                PduBody::BindTransceiverResp(BindResp::decode_body(&mut cur)?)
            }
            CommandId::Outbind => PduBody::Outbind(Outbind::decode_body(&mut cur)?),
            CommandId::Unbind => PduBody::Unbind,
            CommandId::UnbindResp => PduBody::UnbindResp,
            CommandId::SubmitSm => {
                PduBody::SubmitSm(Box::new(SubmitSm::decode_body(&mut cur, options)?))
            }
            CommandId::SubmitSmResp => PduBody::SubmitSmResp(SubmitSmResp::decode_body(&mut cur)?),
            CommandId::DeliverSm => {
                PduBody::DeliverSm(Box::new(DeliverSm::decode_body(&mut cur, options)?))
            }
            CommandId::DeliverSmResp => {
                PduBody::DeliverSmResp(DeliverSmResp::decode_body(&mut cur)?)
            }
            CommandId::QuerySm => PduBody::QuerySm(QuerySm::decode_body(&mut cur)?),
            CommandId::QuerySmResp => PduBody::QuerySmResp(QuerySmResp::decode_body(&mut cur)?),
            CommandId::CancelSm => PduBody::CancelSm(CancelSm::decode_body(&mut cur)?),
            CommandId::CancelSmResp => PduBody::CancelSmResp,
            CommandId::ReplaceSm => {
                PduBody::ReplaceSm(Box::new(ReplaceSm::decode_body(&mut cur, options)?))
            }
            CommandId::ReplaceSmResp => PduBody::ReplaceSmResp,
            CommandId::DataSm => PduBody::DataSm(Box::new(DataSm::decode_body(&mut cur)?)),
            CommandId::DataSmResp => PduBody::DataSmResp(DataSmResp::decode_body(&mut cur)?),
            CommandId::EnquireLink => PduBody::EnquireLink,
            CommandId::EnquireLinkResp => PduBody::EnquireLinkResp,
            CommandId::AlertNotification => {
                PduBody::AlertNotification(AlertNotification::decode_body(&mut cur)?)
            }
            CommandId::GenericNack => PduBody::GenericNack,
        };

        let pdu = Pdu {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            body,
        };
        Ok((pdu, frame_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::PhoneNumber;

    fn options() -> CodecOptions {
        CodecOptions::default()
    }

    fn round_trip(pdu: &Pdu) {
        let bytes = pdu.to_bytes(&options()).unwrap();
        let (decoded, consumed) = Pdu::decode(&bytes, &options()).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(&decoded, pdu);
    }

    #[test]
    fn length_field_matches_emitted_bytes() {
        let pdu = Pdu::enquire_link(77);
        let bytes = pdu.to_bytes(&options()).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 16);
    }

    #[test]
    fn header_only_pdus_round_trip() {
        round_trip(&Pdu::enquire_link(1));
        round_trip(&Pdu::enquire_link_resp(2));
        round_trip(&Pdu::unbind(3));
        round_trip(&Pdu::unbind_resp(4));
        round_trip(&Pdu::generic_nack(5, CommandStatus::InvalidCommandId));
    }

    #[test]
    fn bind_round_trip() {
        let mut pdu = Pdu::request(PduBody::BindTransceiver(Bind {
            system_id: "test".into(),
            password: "secret".into(),
            ..Bind::default()
        }));
        pdu.sequence_number = 1;
        round_trip(&pdu);
    }

    #[test]
    fn submit_sm_round_trip() {
        let submit = SubmitSm::new(
            PhoneNumber::international("38164111222").unwrap(),
            PhoneNumber::international("38164333444").unwrap(),
            "Hello",
            "msg-1",
        );
        let mut pdu = Pdu::request(PduBody::SubmitSm(Box::new(SubmitSm {
            log_id: String::new(),
            ..submit
        })));
        pdu.sequence_number = 9;
        round_trip(&pdu);
    }

    #[test]
    fn frame_independence() {
        let pdu = Pdu::enquire_link(11);
        let mut bytes = pdu.to_bytes(&options()).unwrap().to_vec();
        let frame_len = bytes.len();
        bytes.extend_from_slice(b"garbage-after-frame");
        let (decoded, consumed) = Pdu::decode(&bytes, &options()).unwrap();
        assert_eq!(consumed, frame_len);
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn unknown_command_with_error_status_becomes_generic_nack() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&20u32.to_be_bytes());
        bytes.extend_from_slice(&0x0000_00AAu32.to_be_bytes());
        bytes.extend_from_slice(&CommandStatus::SystemError.value().to_be_bytes());
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4]);

        let (pdu, consumed) = Pdu::decode(&bytes, &options()).unwrap();
        assert_eq!(consumed, 20);
        assert_eq!(pdu.body, PduBody::GenericNack);
        assert_eq!(pdu.command_status, CommandStatus::SystemError);
        assert_eq!(pdu.sequence_number, 13);
    }

    #[test]
    fn unknown_request_command_is_an_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&16u32.to_be_bytes());
        bytes.extend_from_slice(&0x0000_00AAu32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&14u32.to_be_bytes());

        assert!(matches!(
            Pdu::decode(&bytes, &options()),
            Err(SmppError::UnknownCommand {
                command_id: 0x0000_00AA
            })
        ));
    }

    #[test]
    fn truncated_frame_is_malformed() {
        let pdu = Pdu::unbind(5);
        let bytes = pdu.to_bytes(&options()).unwrap();
        let mut truncated = bytes.to_vec();
        truncated[3] = 20; // claim a longer body than present
        assert!(matches!(
            Pdu::decode(&truncated, &options()),
            Err(SmppError::MalformedPdu { .. })
        ));
    }
}
