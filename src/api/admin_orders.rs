//! Admin order management: filtered listing, the status state machine entry
//! point, and the free-text field updates.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use sqlx::QueryBuilder;

use crate::api::{attach_items, order_with_items};
use crate::domain::status::{validate_transition, OrderStatus};
use crate::email::send_status_notification;
use crate::error::AppResult;
use crate::models::{Order, OrderWithItems};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub archived: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    let mut qb = QueryBuilder::new("SELECT * FROM orders WHERE TRUE");

    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        qb.push(" AND (order_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR internal_notes ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = query.status.as_deref().filter(|s| *s != "ALL") {
        let status: OrderStatus = status.parse().map_err(|_| {
            crate::error::AppError::Validation(format!("Unknown status filter: {status}"))
        })?;
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(archived) = query.archived {
        qb.push(" AND is_archived = ").push_bind(archived);
    }

    // Sort column and direction are whitelisted, never interpolated from input.
    let column = match query.sort_by.as_deref() {
        Some("orderNumber") => "order_number",
        Some("total") => "total",
        Some("status") => "status",
        _ => "created_at",
    };
    let direction = match query.sort_order.as_deref() {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    qb.push(format!(" ORDER BY {column} {direction}"));

    let orders: Vec<Order> = qb.build_query_as().fetch_all(&state.db).await?;
    Ok(Json(attach_items(&state.db, orders).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub send_email: bool,
}

/// Persists a new status after checking it against the order's vocabulary.
/// Any status within the vocabulary is accepted regardless of the current one.
/// The notification is strictly after the commit and never fails the request.
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> AppResult<Json<OrderWithItems>> {
    let order = order_with_items(&state.db, &id).await?;
    validate_transition(order.order_type(), req.status)?;

    sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
        .bind(req.status)
        .bind(&id)
        .execute(&state.db)
        .await?;

    let updated = order_with_items(&state.db, &id).await?;
    if req.send_email {
        send_status_notification(&state.templates, state.mailer.as_ref(), &updated, req.status)
            .await;
    }
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

pub async fn update_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NotesRequest>,
) -> AppResult<Json<OrderWithItems>> {
    update_field(&state, &id, "internal_notes", req.notes).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    pub tracking_number: String,
}

pub async fn update_tracking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TrackingRequest>,
) -> AppResult<Json<OrderWithItems>> {
    update_field(&state, &id, "tracking_number", req.tracking_number).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairQuoteRequest {
    pub repair_quote: String,
}

pub async fn update_repair_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RepairQuoteRequest>,
) -> AppResult<Json<OrderWithItems>> {
    update_field(&state, &id, "repair_quote", req.repair_quote).await
}

#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    pub archived: bool,
}

pub async fn set_archived(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ArchiveRequest>,
) -> AppResult<Json<OrderWithItems>> {
    let result = sqlx::query("UPDATE orders SET is_archived = $1 WHERE id = $2")
        .bind(req.archived)
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(crate::error::AppError::NotFound(format!(
            "Order {id} not found"
        )));
    }
    Ok(Json(order_with_items(&state.db, &id).await?))
}

async fn update_field(
    state: &AppState,
    id: &str,
    column: &'static str,
    value: String,
) -> AppResult<Json<OrderWithItems>> {
    // `column` is one of three compile-time literals above, never user input.
    let result = sqlx::query(&format!("UPDATE orders SET {column} = $1 WHERE id = $2"))
        .bind(value)
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(crate::error::AppError::NotFound(format!(
            "Order {id} not found"
        )));
    }
    Ok(Json(order_with_items(&state.db, id).await?))
}
