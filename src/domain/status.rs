//! Order status vocabularies for the two order kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Product id of the mail-in repair service line item. An order containing it
/// follows the repair status vocabulary instead of the regular one.
pub const REPAIR_SERVICE_PRODUCT_ID: &str = "mail-in-service";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Product,
    Repair,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Repair => "repair",
        }
    }

    /// Classifies an order from the product ids of its line items.
    pub fn from_product_ids<'a>(mut ids: impl Iterator<Item = &'a str>) -> Self {
        if ids.any(|id| id == REPAIR_SERVICE_PRODUCT_ID) {
            Self::Repair
        } else {
            Self::Product
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, UnknownValue> {
        match s {
            "product" => Ok(Self::Product),
            "repair" => Ok(Self::Repair),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    OrderReceived,
    PaidPendingShipment,
    Paid,
    Received,
    QuoteSent,
    Repairing,
    ShippedAndComplete,
    Cancelled,
}

/// Statuses a regular product order may hold.
const PRODUCT_VOCABULARY: &[OrderStatus] = &[
    OrderStatus::OrderReceived,
    OrderStatus::PaidPendingShipment,
    OrderStatus::ShippedAndComplete,
    OrderStatus::Cancelled,
];

/// Statuses a mail-in repair order may hold.
const REPAIR_VOCABULARY: &[OrderStatus] = &[
    OrderStatus::OrderReceived,
    OrderStatus::Paid,
    OrderStatus::Received,
    OrderStatus::QuoteSent,
    OrderStatus::Repairing,
    OrderStatus::ShippedAndComplete,
    OrderStatus::Cancelled,
];

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderReceived => "ORDER_RECEIVED",
            Self::PaidPendingShipment => "PAID_PENDING_SHIPMENT",
            Self::Paid => "PAID",
            Self::Received => "RECEIVED",
            Self::QuoteSent => "QUOTE_SENT",
            Self::Repairing => "REPAIRING",
            Self::ShippedAndComplete => "SHIPPED_AND_COMPLETE",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ShippedAndComplete | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, UnknownValue> {
        match s {
            "ORDER_RECEIVED" => Ok(Self::OrderReceived),
            "PAID_PENDING_SHIPMENT" => Ok(Self::PaidPendingShipment),
            "PAID" => Ok(Self::Paid),
            "RECEIVED" => Ok(Self::Received),
            "QUOTE_SENT" => Ok(Self::QuoteSent),
            "REPAIRING" => Ok(Self::Repairing),
            "SHIPPED_AND_COMPLETE" => Ok(Self::ShippedAndComplete),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownValue(pub String);

pub fn vocabulary(order_type: OrderType) -> &'static [OrderStatus] {
    match order_type {
        OrderType::Product => PRODUCT_VOCABULARY,
        OrderType::Repair => REPAIR_VOCABULARY,
    }
}

/// The single gate every status change goes through. Any status within the
/// order's vocabulary is currently accepted regardless of the present status;
/// admins use free jumps for manual corrections. A transition graph, if one is
/// ever wanted, belongs here and nowhere else.
pub fn validate_transition(
    order_type: OrderType,
    new_status: OrderStatus,
) -> Result<(), InvalidStatus> {
    if vocabulary(order_type).contains(&new_status) {
        Ok(())
    } else {
        Err(InvalidStatus {
            status: new_status,
            order_type,
        })
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("status {status} is not valid for {order_type} orders")]
pub struct InvalidStatus {
    pub status: OrderStatus,
    pub order_type: OrderType,
}
