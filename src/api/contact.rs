//! Public contact form.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::api::client_ip;
use crate::error::AppResult;
use crate::models::{new_id, ContactMessage};
use crate::rate_limit::CONTACT_QUOTA;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"), length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 2000, message = "Message is required"))]
    pub message: String,
}

pub async fn submit_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ContactRequest>,
) -> AppResult<(StatusCode, Json<ContactMessage>)> {
    state
        .rate_limiter
        .check(&format!("contact:{}", client_ip(&headers)), CONTACT_QUOTA)?;
    req.validate()?;

    let message = sqlx::query_as::<_, ContactMessage>(
        "INSERT INTO contact_messages (id, name, email, message) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(new_id())
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.message)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_contact_fields() {
        let ok = ContactRequest {
            name: "Pat".into(),
            email: "pat@example.com".into(),
            message: "My inverter hums.".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = ContactRequest {
            email: "nope".into(),
            ..ok
        };
        assert!(bad_email.validate().is_err());

        let empty_message = ContactRequest {
            name: "Pat".into(),
            email: "pat@example.com".into(),
            message: String::new(),
        };
        assert!(empty_message.validate().is_err());
    }
}
