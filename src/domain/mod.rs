//! Business rules that do not touch the database: status vocabularies,
//! order-number generation and money formatting.

pub mod order_number;
pub mod status;

pub use status::{OrderStatus, OrderType, REPAIR_SERVICE_PRODUCT_ID};

/// Formats an amount the way it appears in customer emails: two decimals, no
/// currency symbol (callers add the `$`).
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}
