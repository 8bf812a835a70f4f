//! Product catalog: public listing and admin CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{new_id, Product};
use crate::state::AppState;

/// Active products in catalog order.
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_active = TRUE ORDER BY display_order ASC, created_at ASC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,
    #[validate(range(min = 0.01, max = 999999.99, message = "Price out of range"))]
    pub price: f64,
    #[validate(range(min = 0, max = 99999, message = "Stock out of range"))]
    pub stock: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 9999, message = "Display order out of range"))]
    pub display_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[validate(length(max = 500, message = "Image URL too long"))]
    pub image_url: Option<String>,
}

fn default_active() -> bool {
    true
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<ProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    req.validate()?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, price, stock, display_order, is_active, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(new_id())
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.stock)
    .bind(req.display_order)
    .bind(req.is_active)
    .bind(&req.image_url)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ProductRequest>,
) -> AppResult<Json<Product>> {
    req.validate()?;
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products \
         SET name = $2, description = $3, price = $4, stock = $5, display_order = $6, \
             is_active = $7, image_url = $8, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.stock)
    .bind(req.display_order)
    .bind(req.is_active)
    .bind(&req.image_url)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product with ID {id} not found")))?;
    Ok(Json(product))
}

/// Deactivates rather than deletes: order items keep their product reference.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Product with ID {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> serde_json::Value {
        serde_json::json!({
            "name": "Pure Sine Wave Inverter 1000W",
            "price": 299.99,
            "stock": 10
        })
    }

    #[test]
    fn defaults_apply_on_deserialize() {
        let req: ProductRequest = serde_json::from_value(valid()).unwrap();
        assert!(req.is_active);
        assert_eq!(req.display_order, 0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut raw = valid();
        raw["price"] = serde_json::json!(0.0);
        let req: ProductRequest = serde_json::from_value(raw).unwrap();
        assert!(req.validate().is_err());

        let mut raw = valid();
        raw["stock"] = serde_json::json!(-1);
        let req: ProductRequest = serde_json::from_value(raw).unwrap();
        assert!(req.validate().is_err());

        let mut raw = valid();
        raw["name"] = serde_json::json!("");
        let req: ProductRequest = serde_json::from_value(raw).unwrap();
        assert!(req.validate().is_err());
    }
}
