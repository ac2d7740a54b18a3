use bytes::BytesMut;
use std::io::Cursor;

use crate::codec::{decode_cstring, decode_u8, encode_cstring};
use crate::datatypes::tlv::{tags, Tlv};
use crate::datatypes::{NumericPlanIndicator, TypeOfNumber};
use crate::error::{SmppError, SmppResult};

/// SMPP protocol version spoken by this crate.
pub const SMPP_VERSION_3_4: u8 = 0x34;

pub const MAX_SYSTEM_ID_LEN: usize = 15;
pub const MAX_PASSWORD_LEN: usize = 8;
pub const MAX_SYSTEM_TYPE_LEN: usize = 12;
pub const MAX_ADDRESS_RANGE_LEN: usize = 40;

/// Body of bind_transmitter, bind_receiver and bind_transceiver
/// (sections 4.1.1/4.1.3/4.1.5; the three share a layout, only the
/// command_id differs).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bind {
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: u8,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    pub address_range: String,
}

impl Default for Bind {
    fn default() -> Self {
        Bind {
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            interface_version: SMPP_VERSION_3_4,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
        }
    }
}

impl Bind {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.system_id, MAX_SYSTEM_ID_LEN + 1, "system_id")?;
        encode_cstring(buf, &self.password, MAX_PASSWORD_LEN + 1, "password")?;
        encode_cstring(buf, &self.system_type, MAX_SYSTEM_TYPE_LEN + 1, "system_type")?;
        buf.extend_from_slice(&[
            self.interface_version,
            self.addr_ton as u8,
            self.addr_npi as u8,
        ]);
        encode_cstring(
            buf,
            &self.address_range,
            MAX_ADDRESS_RANGE_LEN + 1,
            "address_range",
        )?;
        Ok(())
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<Bind> {
        let system_id = decode_cstring(cur, MAX_SYSTEM_ID_LEN + 1, "system_id")?;
        let password = decode_cstring(cur, MAX_PASSWORD_LEN + 1, "password")?;
        let system_type = decode_cstring(cur, MAX_SYSTEM_TYPE_LEN + 1, "system_type")?;
        let interface_version = decode_u8(cur, "interface_version")?;
        let addr_ton = decode_ton(cur, "addr_ton")?;
        let addr_npi = decode_npi(cur, "addr_npi")?;
        let address_range = decode_cstring(cur, MAX_ADDRESS_RANGE_LEN + 1, "address_range")?;
        Ok(Bind {
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

/// Body of the three bind responses.
///
/// An error response may carry no body at all; that decodes to the
/// default value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindResp {
    pub system_id: String,
    /// `sc_interface_version` optional parameter.
    pub sc_interface_version: Option<u8>,
}

impl BindResp {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.system_id, MAX_SYSTEM_ID_LEN + 1, "system_id")?;
        if let Some(version) = self.sc_interface_version {
            Tlv::u8_value(tags::SC_INTERFACE_VERSION, version).encode(buf);
        }
        Ok(())
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<BindResp> {
        if !has_remaining(cur) {
            return Ok(BindResp::default());
        }
        let system_id = decode_cstring(cur, MAX_SYSTEM_ID_LEN + 1, "system_id")?;
        let mut sc_interface_version = None;
        while has_remaining(cur) {
            let tlv = Tlv::decode(cur)?;
            if tlv.tag == tags::SC_INTERFACE_VERSION {
                sc_interface_version = tlv.as_u8();
            }
        }
        Ok(BindResp {
            system_id,
            sc_interface_version,
        })
    }
}

/// Body of outbind (section 4.1.7): the SMSC asks the ESME to start a
/// bind_receiver. This client only decodes it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outbind {
    pub system_id: String,
    pub password: String,
}

impl Outbind {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> SmppResult<()> {
        encode_cstring(buf, &self.system_id, MAX_SYSTEM_ID_LEN + 1, "system_id")?;
        encode_cstring(buf, &self.password, MAX_PASSWORD_LEN + 1, "password")?;
        Ok(())
    }

    pub(crate) fn decode_body(cur: &mut Cursor<&[u8]>) -> SmppResult<Outbind> {
        Ok(Outbind {
            system_id: decode_cstring(cur, MAX_SYSTEM_ID_LEN + 1, "system_id")?,
            password: decode_cstring(cur, MAX_PASSWORD_LEN + 1, "password")?,
        })
    }
}

pub(crate) fn has_remaining(cur: &Cursor<&[u8]>) -> bool {
    (cur.position() as usize) < cur.get_ref().len()
}

pub(crate) fn decode_ton(cur: &mut Cursor<&[u8]>, field: &'static str) -> SmppResult<TypeOfNumber> {
    let raw = decode_u8(cur, field)?;
    TypeOfNumber::try_from(raw).map_err(|value| SmppError::MalformedPdu {
        reason: format!("{value:#04x} is not a valid type_of_number in '{field}'"),
        offset: cur.position() as usize - 1,
    })
}

pub(crate) fn decode_npi(
    cur: &mut Cursor<&[u8]>,
    field: &'static str,
) -> SmppResult<NumericPlanIndicator> {
    let raw = decode_u8(cur, field)?;
    NumericPlanIndicator::try_from(raw).map_err(|value| SmppError::MalformedPdu {
        reason: format!("{value:#04x} is not a valid numbering_plan_indicator in '{field}'"),
        offset: cur.position() as usize - 1,
    })
}
