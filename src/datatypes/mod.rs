// ABOUTME: SMPP 3.4 domain types: enums, value types and per-command PDU bodies
// ABOUTME: The Pdu enum in pdu.rs ties them together for the codec and session

mod address;
mod alert_notification;
pub(crate) mod bind;
mod cancel_sm;
mod command_id;
mod command_status;
mod data_coding;
mod data_sm;
mod deliver_sm;
mod esm_class;
mod numeric_plan_indicator;
mod pdu;
mod query_sm;
mod replace_sm;
mod smpp_time;
pub(crate) mod submit_sm;
pub mod tlv;
mod type_of_number;
mod udh;

pub use address::{PhoneNumber, MAX_ADDRESS_LEN};
pub use alert_notification::AlertNotification;
pub use bind::{Bind, BindResp, Outbind, SMPP_VERSION_3_4};
pub use cancel_sm::CancelSm;
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::DataCoding;
pub use data_sm::{DataSm, DataSmResp};
pub use deliver_sm::{DeliverSm, DeliverSmResp};
pub use esm_class::EsmClass;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use pdu::{Pdu, PduBody};
pub use query_sm::{MessageState, QuerySm, QuerySmResp};
pub use replace_sm::ReplaceSm;
pub use smpp_time::SmppTime;
pub use submit_sm::{SubmitSm, SubmitSmResp};
pub use tlv::Tlv;
pub use type_of_number::TypeOfNumber;
pub use udh::{ConcatInfo, Udh, UdhElement};
