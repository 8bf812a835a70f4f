//! Admin editing and previewing of the email template documents.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::domain::status::{OrderStatus, OrderType};
use crate::email::render::{
    render_initial_confirmation, render_status_update, OrderSnapshot, RenderedEmail,
};
use crate::email::templates::EmailTemplateSet;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Both template documents, read fresh through the cache.
pub async fn read_all(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let product = state.templates.get(OrderType::Product)?;
    let repair = state.templates.get(OrderType::Repair)?;
    Ok(Json(serde_json::json!({
        "product": &*product,
        "repair": &*repair,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteTemplatesRequest {
    pub template_type: String,
    /// The full replacement document; deserializing it is the structural
    /// validation.
    pub templates: EmailTemplateSet,
}

pub async fn write_one(
    State(state): State<AppState>,
    Json(req): Json<WriteTemplatesRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let order_type = parse_template_type(&req.template_type)?;
    state.templates.save(order_type, &req.templates)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub template_type: String,
    /// Either a status name or `"initial"` for the confirmation email.
    pub status: String,
    pub order_data: OrderSnapshot,
}

/// Renders a template against a synthetic order supplied by the admin UI.
pub async fn preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> AppResult<Json<RenderedEmail>> {
    let order_type = parse_template_type(&req.template_type)?;
    let set = state.templates.get(order_type)?;

    let rendered = if req.status == "initial" {
        render_initial_confirmation(&set, order_type, &req.order_data)?.0
    } else {
        let status: OrderStatus = req
            .status
            .parse()
            .map_err(|_| AppError::Validation(format!("Unknown status: {}", req.status)))?;
        render_status_update(&set, order_type, &req.order_data, status)?
    };
    Ok(Json(rendered))
}

fn parse_template_type(raw: &str) -> Result<OrderType, AppError> {
    raw.parse().map_err(|_| {
        AppError::Validation(
            "Invalid template type. Must be \"product\" or \"repair\"".to_string(),
        )
    })
}
