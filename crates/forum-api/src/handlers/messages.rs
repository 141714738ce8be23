//! Chat message endpoints behind the session guard.

use axum::Json;
use axum::extract::State;

use forum_entity::message::ChatMessage;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    tracing::debug!(user_id = auth.user_id, "Listing chat messages");
    Ok(Json(state.chat.list().await?))
}
