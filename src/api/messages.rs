//! Admin view of contact-form messages.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::email::mailer::OutgoingEmail;
use crate::error::{AppError, AppResult};
use crate::models::ContactMessage;
use crate::state::AppState;

pub async fn list_messages(State(state): State<AppState>) -> AppResult<Json<Vec<ContactMessage>>> {
    let messages = sqlx::query_as::<_, ContactMessage>(
        "SELECT * FROM contact_messages ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(messages))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ContactMessage>> {
    let message = sqlx::query_as::<_, ContactMessage>(
        "UPDATE contact_messages SET is_read = TRUE WHERE id = $1 RETURNING *",
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Message {id} not found")))?;
    Ok(Json(message))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplyRequest {
    #[validate(length(max = 255, message = "Subject too long"))]
    pub subject: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "Reply message is required"))]
    pub message: String,
}

/// Replies go straight through the mailer; unlike status notifications this is
/// the whole point of the request, so a transport failure is surfaced.
pub async fn reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReplyRequest>,
) -> AppResult<Json<serde_json::Value>> {
    req.validate()?;
    let message =
        sqlx::query_as::<_, ContactMessage>("SELECT * FROM contact_messages WHERE id = $1")
            .bind(&id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message {id} not found")))?;

    let subject = req
        .subject
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Re: your message to JB Inverters".to_string());
    state
        .mailer
        .send(OutgoingEmail {
            to: message.email.clone(),
            from: None,
            subject,
            html: crate::email::render::escape_html(&req.message).replace('\n', "<br>"),
        })
        .await?;

    sqlx::query("UPDATE contact_messages SET is_read = TRUE WHERE id = $1")
        .bind(&id)
        .execute(&state.db)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Message {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
