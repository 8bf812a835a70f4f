//! HTTP surface: route table and helpers shared by the handlers.
//!
//! Admin routes carry no session handling here; authentication is terminated
//! by the deployment's proxy layer.

pub mod admin_orders;
pub mod contact;
pub mod email_templates;
pub mod messages;
pub mod orders;
pub mod products;
pub mod serial_numbers;

use axum::http::HeaderMap;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use std::collections::HashMap;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderItem, OrderWithItems};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Public storefront
        .route("/api/products", get(products::list_products))
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/:id", get(orders::get_order))
        .route("/api/contact", post(contact::submit_message))
        // Admin back-office
        .route("/api/admin/orders", get(admin_orders::list_orders))
        .route("/api/admin/orders/:id/status", put(admin_orders::set_status))
        .route("/api/admin/orders/:id/notes", put(admin_orders::update_notes))
        .route(
            "/api/admin/orders/:id/tracking",
            put(admin_orders::update_tracking),
        )
        .route(
            "/api/admin/orders/:id/repair-quote",
            put(admin_orders::update_repair_quote),
        )
        .route("/api/admin/orders/:id/archive", put(admin_orders::set_archived))
        .route("/api/admin/products", post(products::create_product))
        .route(
            "/api/admin/products/:id",
            put(products::update_product).delete(products::delete_product),
        )
        .route(
            "/api/admin/serial-numbers",
            get(serial_numbers::list_for_product).post(serial_numbers::create_batch),
        )
        .route(
            "/api/admin/serial-numbers/assign",
            post(serial_numbers::assign_to_order),
        )
        .route(
            "/api/admin/serial-numbers/:id",
            put(serial_numbers::update_one).delete(serial_numbers::delete_one),
        )
        .route(
            "/api/admin/email-templates",
            get(email_templates::read_all).put(email_templates::write_one),
        )
        .route(
            "/api/admin/email-templates/preview",
            post(email_templates::preview),
        )
        .route("/api/admin/messages", get(messages::list_messages))
        .route("/api/admin/messages/:id/read", put(messages::mark_read))
        .route("/api/admin/messages/:id/reply", post(messages::reply))
        .route("/api/admin/messages/:id", delete(messages::delete_message))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "jb-storefront" }))
}

/// Best-effort client address for rate limiting, read from proxy headers.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    for key in ["cf-connecting-ip", "x-real-ip", "x-forwarded-for"] {
        if let Some(value) = headers.get(key).and_then(|v| v.to_str().ok()) {
            if let Some(ip) = value.split(',').next().map(str::trim) {
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }
    "unknown".to_string()
}

/// Loads one order plus its line items, or a not-found error.
pub(crate) async fn order_with_items(db: &sqlx::PgPool, id: &str) -> AppResult<OrderWithItems> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))?;
    let mut with_items = attach_items(db, vec![order]).await?;
    Ok(with_items.remove(0))
}

/// Joins line items (with product names) onto a batch of orders.
pub(crate) async fn attach_items(
    db: &sqlx::PgPool,
    orders: Vec<Order>,
) -> AppResult<Vec<OrderWithItems>> {
    let ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name, oi.quantity, oi.price \
         FROM order_items oi JOIN products p ON p.id = oi.product_id \
         WHERE oi.order_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id.clone()).or_default().push(item);
    }
    Ok(orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect())
}
