//! JB Storefront
//!
//! E-commerce storefront and admin back-office for a hardware repair and
//! retail shop: product catalog, order creation with stock accounting, a
//! status-driven order lifecycle with templated email notifications, a
//! serial-number ledger and a contact inbox.

pub mod api;
pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod state;
