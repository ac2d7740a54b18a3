// ABOUTME: ESME configuration: SMSC endpoint, credentials, timers and codec knobs
// ABOUTME: Validated once at construction; field limits follow SMPP 3.4 section 4.1

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::time::Duration;

use crate::codec::{CodecOptions, DEFAULT_MAX_PDU_SIZE};
use crate::datatypes::bind::{
    MAX_ADDRESS_RANGE_LEN, MAX_PASSWORD_LEN, MAX_SYSTEM_ID_LEN, MAX_SYSTEM_TYPE_LEN,
};
use crate::datatypes::{
    Bind, CommandId, NumericPlanIndicator, TypeOfNumber, SMPP_VERSION_3_4,
};
use crate::error::{SmppError, SmppResult};
use crate::session::SessionState;
use crate::text::SmsEncoding;

/// IANA-registered default SMPP port.
pub const DEFAULT_SMPP_PORT: u16 = 2775;

/// Which session mode to bind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BindMode {
    Transmitter,
    Receiver,
    #[default]
    Transceiver,
}

impl BindMode {
    pub fn command_id(self) -> CommandId {
        match self {
            BindMode::Transmitter => CommandId::BindTransmitter,
            BindMode::Receiver => CommandId::BindReceiver,
            BindMode::Transceiver => CommandId::BindTransceiver,
        }
    }

    pub(crate) fn bound_state(self) -> SessionState {
        match self {
            BindMode::Transmitter => SessionState::BoundTx,
            BindMode::Receiver => SessionState::BoundRx,
            BindMode::Transceiver => SessionState::BoundTrx,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BindMode::Transmitter => "transmitter",
            BindMode::Receiver => "receiver",
            BindMode::Transceiver => "transceiver",
        }
    }
}

/// Everything an [`crate::Esme`] needs to talk to one SMSC.
#[derive(Clone, Debug)]
pub struct EsmeConfig {
    pub smsc_host: String,
    pub smsc_port: u16,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub bind_mode: BindMode,
    pub interface_version: u8,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    pub address_range: String,
    /// Send an enquire_link after this long without writing anything.
    pub enquire_link_interval: Duration,
    /// How long a request may wait for its response.
    pub request_timeout: Duration,
    /// How long the bind handshake may take.
    pub bind_timeout: Duration,
    /// How long the TCP dial may take.
    pub connect_timeout: Duration,
    /// Cap on waiting for unbind_resp during graceful shutdown.
    pub unbind_timeout: Duration,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
    pub throttle_initial: Duration,
    pub throttle_max: Duration,
    /// Window size: maximum outstanding requests.
    pub max_in_flight: usize,
    pub max_pdu_size: u32,
    pub default_encoding: SmsEncoding,
    /// Self-imposed cap on outbound messages per second; `None` sends
    /// unpaced. Drives the default token-bucket rate limiter.
    pub send_rate: Option<f64>,
    /// Identifies this client instance in hook calls and logs.
    pub client_id: String,
}

impl EsmeConfig {
    pub fn new(
        smsc_host: impl Into<String>,
        smsc_port: u16,
        system_id: impl Into<String>,
        password: impl Into<String>,
    ) -> EsmeConfig {
        EsmeConfig {
            smsc_host: smsc_host.into(),
            smsc_port,
            system_id: system_id.into(),
            password: password.into(),
            system_type: String::new(),
            bind_mode: BindMode::Transceiver,
            interface_version: SMPP_VERSION_3_4,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
            enquire_link_interval: Duration::from_secs(55),
            request_timeout: Duration::from_secs(20),
            bind_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            unbind_timeout: Duration::from_secs(5),
            reconnect_initial: Duration::from_secs(1),
            reconnect_max: Duration::from_secs(60),
            throttle_initial: Duration::from_secs(1),
            throttle_max: Duration::from_secs(30),
            max_in_flight: 10,
            max_pdu_size: DEFAULT_MAX_PDU_SIZE,
            default_encoding: SmsEncoding::Gsm7,
            send_rate: None,
            client_id: generate_client_id(),
        }
    }

    pub fn with_bind_mode(mut self, bind_mode: BindMode) -> Self {
        self.bind_mode = bind_mode;
        self
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }

    pub fn with_address_range(
        mut self,
        addr_ton: TypeOfNumber,
        addr_npi: NumericPlanIndicator,
        address_range: impl Into<String>,
    ) -> Self {
        self.addr_ton = addr_ton;
        self.addr_npi = addr_npi;
        self.address_range = address_range.into();
        self
    }

    pub fn with_default_encoding(mut self, encoding: SmsEncoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    /// Cap outbound sends at `send_rate` messages per second.
    pub fn with_send_rate(mut self, send_rate: f64) -> Self {
        self.send_rate = Some(send_rate);
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub(crate) fn validate(&self) -> SmppResult<()> {
        check_len(&self.system_id, MAX_SYSTEM_ID_LEN, "system_id")?;
        check_len(&self.password, MAX_PASSWORD_LEN, "password")?;
        check_len(&self.system_type, MAX_SYSTEM_TYPE_LEN, "system_type")?;
        check_len(&self.address_range, MAX_ADDRESS_RANGE_LEN, "address_range")?;
        if self.smsc_host.is_empty() {
            return Err(SmppError::InvalidParameter {
                field: "smsc_host",
                reason: "SMSC host must not be empty".into(),
            });
        }
        if self.max_in_flight == 0 {
            return Err(SmppError::InvalidParameter {
                field: "max_in_flight",
                reason: "the request window needs at least one slot".into(),
            });
        }
        if (self.max_pdu_size as usize) < crate::codec::PDU_HEADER_LENGTH {
            return Err(SmppError::InvalidParameter {
                field: "max_pdu_size",
                reason: "maximum PDU size cannot be below the header size".into(),
            });
        }
        if let Some(send_rate) = self.send_rate {
            if !send_rate.is_finite() || send_rate <= 0.0 {
                return Err(SmppError::InvalidParameter {
                    field: "send_rate",
                    reason: format!("{send_rate} is not a positive message rate"),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            max_pdu_size: self.max_pdu_size,
            default_encoding: self.default_encoding,
        }
    }

    /// The bind body for this configuration.
    pub(crate) fn bind_body(&self) -> Bind {
        Bind {
            system_id: self.system_id.clone(),
            password: self.password.clone(),
            system_type: self.system_type.clone(),
            interface_version: self.interface_version,
            addr_ton: self.addr_ton,
            addr_npi: self.addr_npi,
            address_range: self.address_range.clone(),
        }
    }
}

fn check_len(value: &str, max: usize, field: &'static str) -> SmppResult<()> {
    if value.len() > max {
        return Err(SmppError::InvalidParameter {
            field,
            reason: format!("{} characters exceeds the maximum of {max}", value.len()),
        });
    }
    if !value.is_ascii() {
        return Err(SmppError::InvalidParameter {
            field,
            reason: "value must be ASCII".into(),
        });
    }
    Ok(())
}

fn generate_client_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(17)
        .map(|byte| (byte as char).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_protocol() {
        let config = EsmeConfig::new("localhost", DEFAULT_SMPP_PORT, "test", "test");
        assert_eq!(config.interface_version, 0x34);
        assert_eq!(config.bind_mode, BindMode::Transceiver);
        assert_eq!(config.enquire_link_interval, Duration::from_secs(55));
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.max_in_flight, 10);
        assert_eq!(config.max_pdu_size, 262_144);
        assert_eq!(config.send_rate, None);
        assert_eq!(config.client_id.len(), 17);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn send_rate_must_be_positive() {
        let config =
            EsmeConfig::new("localhost", DEFAULT_SMPP_PORT, "test", "test").with_send_rate(0.0);
        assert!(matches!(
            config.validate(),
            Err(SmppError::InvalidParameter {
                field: "send_rate",
                ..
            })
        ));
        let config =
            EsmeConfig::new("localhost", DEFAULT_SMPP_PORT, "test", "test").with_send_rate(50.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn generated_client_ids_differ() {
        assert_ne!(generate_client_id(), generate_client_id());
    }

    #[test]
    fn credential_limits_are_enforced() {
        let config = EsmeConfig::new("localhost", 2775, "a-system-id-that-is-too-long", "pw");
        assert!(matches!(
            config.validate(),
            Err(SmppError::InvalidParameter {
                field: "system_id",
                ..
            })
        ));

        let config = EsmeConfig::new("localhost", 2775, "ok", "password9");
        assert!(matches!(
            config.validate(),
            Err(SmppError::InvalidParameter {
                field: "password",
                ..
            })
        ));
    }

    #[test]
    fn bind_mode_mapping() {
        assert_eq!(
            BindMode::Transmitter.command_id(),
            CommandId::BindTransmitter
        );
        assert_eq!(BindMode::Receiver.command_id(), CommandId::BindReceiver);
        assert_eq!(
            BindMode::Transceiver.command_id(),
            CommandId::BindTransceiver
        );
    }
}
