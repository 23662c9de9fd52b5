//! FAQ chat endpoints.
//!
//! `send` answers synchronously from the canned FAQ rules; there is no
//! streaming and no model behind it.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::chat;

#[derive(Deserialize)]
pub struct ChatSendRequest {
    pub conversation_id: Option<String>,
    pub message: String,
}

/// `POST /api/chat/send`
pub async fn send(
    State(ctx): State<ApiContext>,
    Json(req): Json<ChatSendRequest>,
) -> Result<Json<chat::ChatMessage>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("El mensaje no puede estar vacío".into()));
    }
    if req.message.chars().count() > 2000 {
        return Err(ApiError::BadRequest(
            "El mensaje supera los 2000 caracteres".into(),
        ));
    }

    let conn = ctx.core.open_db()?;
    let reply = chat::send_message(&conn, req.conversation_id.as_deref(), &req.message)?;
    Ok(Json(reply))
}

/// `GET /api/chat/conversations`
pub async fn conversations(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<chat::ConversationSummary>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(chat::list_conversation_summaries(&conn)?))
}

/// `GET /api/chat/conversations/:id`
pub async fn conversation(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<chat::ConversationDetail>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(chat::get_conversation(&conn, &id)?))
}

/// `GET /api/chat/suggestions`
pub async fn suggestions() -> Json<Vec<chat::PromptSuggestion>> {
    Json(chat::default_suggestions())
}
