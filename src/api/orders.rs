//! Public order creation and lookup.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::{client_ip, order_with_items};
use crate::domain::status::OrderStatus;
use crate::domain::order_number;
use crate::email::send_initial_confirmation;
use crate::error::{AppError, AppResult};
use crate::models::{new_id, OrderWithItems};
use crate::rate_limit::ORDER_QUOTA;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(max = 255, message = "Customer name too long"))]
    pub customer_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub customer_email: Option<String>,
    #[validate(length(max = 1000, message = "Address too long"))]
    pub customer_address: Option<String>,
    #[validate(length(max = 50, message = "Phone number too long"))]
    pub customer_phone: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Between 1 and 50 items required"))]
    pub items: Vec<OrderItemRequest>,
    #[validate(range(min = 0.01, max = 999999.99, message = "Total out of range"))]
    pub total: f64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[validate(length(min = 1, message = "Product ID is required"))]
    pub product_id: String,
    #[validate(range(min = 1, max = 999, message = "Quantity out of range"))]
    pub quantity: i32,
    #[validate(range(min = 0.01, max = 999999.99, message = "Price out of range"))]
    pub price: f64,
}

/// Creates an order inside one transaction: every product is checked for
/// stock first, then the order and items are written and stock decremented.
/// Any failure aborts the whole thing with no partial writes.
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderWithItems>)> {
    state
        .rate_limiter
        .check(&format!("order:{}", client_ip(&headers)), ORDER_QUOTA)?;

    req.validate()?;
    for item in &req.items {
        item.validate()?;
    }
    verify_total(&req)?;

    let order_id = new_id();
    let order_number = order_number::generate();

    let mut tx = state.db.begin().await?;

    for item in &req.items {
        let product: Option<(String, i32)> =
            sqlx::query_as("SELECT name, stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(&item.product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (name, stock) = product.ok_or_else(|| {
            AppError::NotFound(format!("Product with ID {} not found", item.product_id))
        })?;
        if stock < item.quantity {
            return Err(AppError::Conflict(format!(
                "Insufficient stock for {name}. Available: {stock}, Requested: {}",
                item.quantity
            )));
        }
    }

    sqlx::query(
        "INSERT INTO orders \
         (id, order_number, customer_name, customer_email, customer_address, customer_phone, total, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&order_id)
    .bind(&order_number)
    .bind(&req.customer_name)
    .bind(&req.customer_email)
    .bind(&req.customer_address)
    .bind(&req.customer_phone)
    .bind(req.total)
    .bind(OrderStatus::OrderReceived)
    .execute(&mut *tx)
    .await?;

    for item in &req.items {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, quantity, price) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(new_id())
        .bind(&order_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET stock = stock - $1, updated_at = NOW() WHERE id = $2")
            .bind(item.quantity)
            .bind(&item.product_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    let order = order_with_items(&state.db, &order_id).await?;
    // Best-effort; the order is committed regardless of what the mailer does.
    send_initial_confirmation(&state.templates, state.mailer.as_ref(), &order).await;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<OrderWithItems>> {
    Ok(Json(order_with_items(&state.db, &id).await?))
}

/// The stored total must equal the sum of `quantity * price` over the items.
fn verify_total(req: &CreateOrderRequest) -> AppResult<()> {
    let computed: f64 = req
        .items
        .iter()
        .map(|item| f64::from(item.quantity) * item.price)
        .sum();
    if (computed - req.total).abs() > 0.005 {
        return Err(AppError::Validation(format!(
            "Total {:.2} does not match item sum {computed:.2}",
            req.total
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<OrderItemRequest>, total: f64) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_name: None,
            customer_email: None,
            customer_address: None,
            customer_phone: None,
            items,
            total,
        }
    }

    fn item(product_id: &str, quantity: i32, price: f64) -> OrderItemRequest {
        OrderItemRequest {
            product_id: product_id.to_string(),
            quantity,
            price,
        }
    }

    #[test]
    fn total_must_match_item_sum() {
        let req = request(vec![item("product-1", 2, 50.0)], 100.0);
        assert!(verify_total(&req).is_ok());

        let req = request(vec![item("product-1", 2, 50.0)], 120.0);
        assert!(matches!(verify_total(&req), Err(AppError::Validation(_))));
    }

    #[test]
    fn validation_catches_bad_fields() {
        let mut req = request(vec![item("product-1", 1, 10.0)], 10.0);
        req.customer_email = Some("not-an-email".to_string());
        assert!(req.validate().is_err());

        let req = request(vec![], 10.0);
        assert!(req.validate().is_err());

        assert!(item("product-1", 0, 10.0).validate().is_err());
        assert!(item("", 1, 10.0).validate().is_err());
        assert!(item("product-1", 1, 0.0).validate().is_err());
    }
}
