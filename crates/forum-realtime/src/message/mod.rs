//! Chat wire protocol.

pub mod types;
pub mod validator;

pub use types::{CreatePayload, DeletePayload, InboundAction, OutboundMessage};
pub use validator::{parse_inbound, validate_inbound};
