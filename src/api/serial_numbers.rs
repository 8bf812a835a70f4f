//! Serial-number ledger: per-unit inventory records linked to orders.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::collections::HashSet;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{new_id, SerialNumber, SerialNumberWithOrder, SerialStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub product_id: String,
}

/// Serial numbers for one product, newest first, each annotated with the
/// order number it is assigned to (if any).
pub async fn list_for_product(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<SerialNumberWithOrder>>> {
    let rows = sqlx::query_as::<_, SerialNumberWithOrder>(
        "SELECT sn.id, sn.product_id, sn.order_id, sn.serial_number, sn.status, sn.notes, \
                sn.created_at, o.order_number \
         FROM serial_numbers sn \
         LEFT JOIN orders o ON o.id = sn.order_id \
         WHERE sn.product_id = $1 \
         ORDER BY sn.created_at DESC",
    )
    .bind(&query.product_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    #[validate(length(min = 1, message = "Product ID is required"))]
    pub product_id: String,
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 serial numbers required"))]
    pub serial_numbers: Vec<String>,
    #[validate(length(max = 500, message = "Notes too long"))]
    pub notes: Option<String>,
}

/// Creates a batch of serials. The batch is all-or-nothing: any duplicate,
/// against the table or within the batch itself, rejects the whole request
/// with the offending values listed and nothing inserted.
pub async fn create_batch(
    State(state): State<AppState>,
    Json(req): Json<CreateBatchRequest>,
) -> AppResult<(StatusCode, Json<Vec<SerialNumber>>)> {
    req.validate()?;
    let serials = normalize_batch(&req.serial_numbers)?;

    let mut tx = state.db.begin().await?;

    let product_exists: Option<(String,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(&req.product_id)
        .fetch_optional(&mut *tx)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Product with ID {} not found",
            req.product_id
        )));
    }

    let existing: Vec<(String,)> =
        sqlx::query_as("SELECT serial_number FROM serial_numbers WHERE serial_number = ANY($1)")
            .bind(&serials)
            .fetch_all(&mut *tx)
            .await?;
    if !existing.is_empty() {
        let duplicates: Vec<String> = existing.into_iter().map(|(s,)| s).collect();
        return Err(AppError::Conflict(format!(
            "Duplicate serial numbers: {}",
            duplicates.join(", ")
        )));
    }

    let mut created = Vec::with_capacity(serials.len());
    for serial in &serials {
        let row = sqlx::query_as::<_, SerialNumber>(
            "INSERT INTO serial_numbers (id, product_id, serial_number, status, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(new_id())
        .bind(&req.product_id)
        .bind(serial)
        .bind(SerialStatus::Available)
        .bind(&req.notes)
        .fetch_one(&mut *tx)
        .await?;
        created.push(row);
    }

    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub order_id: String,
    pub serial_number_ids: Vec<String>,
}

/// Links serials to an order as one atomic multi-row update. Every listed
/// serial must exist and be AVAILABLE, otherwise nothing is written.
pub async fn assign_to_order(
    State(state): State<AppState>,
    Json(req): Json<AssignRequest>,
) -> AppResult<Json<Vec<SerialNumber>>> {
    if req.serial_number_ids.is_empty() {
        return Err(AppError::Validation(
            "serialNumberIds must not be empty".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let order: Option<(String,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1")
        .bind(&req.order_id)
        .fetch_optional(&mut *tx)
        .await?;
    if order.is_none() {
        return Err(AppError::NotFound(format!(
            "Order {} not found",
            req.order_id
        )));
    }

    let rows: Vec<(String, SerialStatus)> = sqlx::query_as(
        "SELECT id, status FROM serial_numbers WHERE id = ANY($1) FOR UPDATE",
    )
    .bind(&req.serial_number_ids)
    .fetch_all(&mut *tx)
    .await?;

    let found: HashSet<&str> = rows.iter().map(|(id, _)| id.as_str()).collect();
    let missing: Vec<&str> = req
        .serial_number_ids
        .iter()
        .map(String::as_str)
        .filter(|id| !found.contains(id))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::NotFound(format!(
            "Serial numbers not found: {}",
            missing.join(", ")
        )));
    }

    let unavailable: Vec<&str> = rows
        .iter()
        .filter(|(_, status)| *status != SerialStatus::Available)
        .map(|(id, _)| id.as_str())
        .collect();
    if !unavailable.is_empty() {
        return Err(AppError::Conflict(format!(
            "Serial numbers not available for assignment: {}",
            unavailable.join(", ")
        )));
    }

    let updated = sqlx::query_as::<_, SerialNumber>(
        "UPDATE serial_numbers SET order_id = $1, status = $2 WHERE id = ANY($3) RETURNING *",
    )
    .bind(&req.order_id)
    .bind(SerialStatus::Sold)
    .bind(&req.serial_number_ids)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSerialRequest {
    pub status: Option<SerialStatus>,
    #[validate(length(max = 500, message = "Notes too long"))]
    pub notes: Option<String>,
}

pub async fn update_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSerialRequest>,
) -> AppResult<Json<SerialNumber>> {
    req.validate()?;
    let updated = sqlx::query_as::<_, SerialNumber>(
        "UPDATE serial_numbers \
         SET status = COALESCE($2, status), notes = COALESCE($3, notes) \
         WHERE id = $1 RETURNING *",
    )
    .bind(&id)
    .bind(req.status)
    .bind(&req.notes)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Serial number {id} not found")))?;
    Ok(Json(updated))
}

/// Removes a serial record outright. A SOLD serial loses its link to the
/// order's history; the admin UI warns before calling this.
pub async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM serial_numbers WHERE id = $1")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Serial number {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Trims each raw serial and rejects empties and intra-batch duplicates
/// (case-sensitive exact matches, like the table's uniqueness check).
fn normalize_batch(raw: &[String]) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "Serial numbers must not be empty".to_string(),
            ));
        }
        if !seen.insert(trimmed.to_string()) {
            duplicates.push(trimmed.to_string());
            continue;
        }
        out.push(trimmed.to_string());
    }
    if !duplicates.is_empty() {
        return Err(AppError::Conflict(format!(
            "Duplicate serial numbers: {}",
            duplicates.join(", ")
        )));
    }
    Ok(out)
}
