//! Persisted record types. Column names are snake_case in Postgres; the JSON
//! wire format is camelCase to match the storefront client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::status::{OrderStatus, OrderType, UnknownValue};

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub display_order: i32,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub customer_phone: Option<String>,
    pub total: f64,
    pub status: OrderStatus,
    pub internal_notes: Option<String>,
    pub tracking_number: Option<String>,
    pub repair_quote: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Line item joined with the name of its product, as returned by the API.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    /// Unit price captured at order time; never re-read from the product.
    pub price: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    pub fn order_type(&self) -> OrderType {
        OrderType::from_product_ids(self.items.iter().map(|i| i.product_id.as_str()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum SerialStatus {
    Available,
    Sold,
    Reserved,
    Defective,
    Returned,
}

impl SerialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Sold => "SOLD",
            Self::Reserved => "RESERVED",
            Self::Defective => "DEFECTIVE",
            Self::Returned => "RETURNED",
        }
    }
}

impl fmt::Display for SerialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerialStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, UnknownValue> {
        match s {
            "AVAILABLE" => Ok(Self::Available),
            "SOLD" => Ok(Self::Sold),
            "RESERVED" => Ok(Self::Reserved),
            "DEFECTIVE" => Ok(Self::Defective),
            "RETURNED" => Ok(Self::Returned),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SerialNumber {
    pub id: String,
    pub product_id: String,
    pub order_id: Option<String>,
    pub serial_number: String,
    pub status: SerialStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Serial number annotated with the human-readable number of its linked order.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SerialNumberWithOrder {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub serial: SerialNumber,
    pub order_number: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
