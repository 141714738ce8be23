//! Inbound message validation and parsing.

use validator::Validate;

use forum_core::error::AppError;
use forum_core::result::AppResult;

use super::types::{CreatePayload, DeletePayload, InboundAction, InboundEnvelope};

/// Rejects frames that are oversized or blank.
pub fn validate_inbound(raw: &str, max_size: usize) -> AppResult<()> {
    if raw.len() > max_size {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_size} bytes"
        )));
    }
    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }
    Ok(())
}

/// Parses a client frame into an action. `get_all` is accepted as an alias
/// of `list`.
pub fn parse_inbound(raw: &str) -> AppResult<InboundAction> {
    let envelope: InboundEnvelope = serde_json::from_str(raw)
        .map_err(|e| AppError::validation(format!("Invalid message format: {e}")))?;

    match envelope.action.as_str() {
        "create" => {
            let payload: CreatePayload = serde_json::from_value(envelope.payload)
                .map_err(|e| AppError::validation(format!("Invalid create payload: {e}")))?;
            payload
                .validate()
                .map_err(|e| AppError::validation(e.to_string()))?;
            if payload.text.trim().is_empty() {
                return Err(AppError::validation("Message text is blank"));
            }
            Ok(InboundAction::Create(payload))
        }
        "delete" => {
            let payload: DeletePayload = serde_json::from_value(envelope.payload)
                .map_err(|e| AppError::validation(format!("Invalid delete payload: {e}")))?;
            Ok(InboundAction::Delete(payload))
        }
        "list" | "get_all" => Ok(InboundAction::List),
        other => Err(AppError::validation(format!("Unknown action: {other}"))),
    }
}
