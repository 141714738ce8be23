//! Response bodies not covered by the session RPC types.

pub mod response;

pub use response::{HealthResponse, SuccessResponse};
