//! On-disk email template documents, cached per order type.
//!
//! Templates are plain JSON files the admin UI edits live; every write goes
//! through [`TemplateStore::save`] which invalidates the cache.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::domain::status::{OrderStatus, OrderType};

pub const PRODUCT_TEMPLATES_FILE: &str = "product-orders.json";
pub const REPAIR_TEMPLATES_FILE: &str = "repair-orders.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplateSet {
    pub order_type: String,
    #[serde(default)]
    pub description: String,
    pub initial_confirmation: InitialConfirmation,
    /// Keyed by status name (`ORDER_RECEIVED`, `QUOTE_SENT`, ...).
    pub status_updates: HashMap<String, StatusTemplate>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialConfirmation {
    pub subject: String,
    pub content: String,
    pub from_email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTemplate {
    pub subject: String,
    pub message: String,
    /// Alternate body used for QUOTE_SENT when the order carries a quote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_with_quote: Option<String>,
}

impl EmailTemplateSet {
    pub fn status_template(
        &self,
        order_type: OrderType,
        status: OrderStatus,
    ) -> Result<&StatusTemplate, TemplateError> {
        self.status_updates
            .get(status.as_str())
            .ok_or(TemplateError::UnknownStatus { order_type, status })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read email template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("email template {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write email template {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("status template not found for {order_type} orders: {status}")]
    UnknownStatus {
        order_type: OrderType,
        status: OrderStatus,
    },
}

pub struct TemplateStore {
    dir: PathBuf,
    cache: RwLock<HashMap<OrderType, Arc<EmailTemplateSet>>>,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn path_for(&self, order_type: OrderType) -> PathBuf {
        let file = match order_type {
            OrderType::Product => PRODUCT_TEMPLATES_FILE,
            OrderType::Repair => REPAIR_TEMPLATES_FILE,
        };
        self.dir.join(file)
    }

    /// Returns the template set for an order type, reading it from disk on
    /// first use and caching it until [`invalidate`](Self::invalidate).
    pub fn get(&self, order_type: OrderType) -> Result<Arc<EmailTemplateSet>, TemplateError> {
        if let Some(set) = self
            .cache
            .read()
            .expect("template cache poisoned")
            .get(&order_type)
        {
            return Ok(Arc::clone(set));
        }
        let set = Arc::new(load_template_file(&self.path_for(order_type))?);
        self.cache
            .write()
            .expect("template cache poisoned")
            .insert(order_type, Arc::clone(&set));
        Ok(set)
    }

    /// Drops every cached document so the next `get` re-reads from disk.
    pub fn invalidate(&self) {
        self.cache
            .write()
            .expect("template cache poisoned")
            .clear();
        tracing::info!("email template cache cleared");
    }

    /// Persists one template document and invalidates the cache.
    pub fn save(&self, order_type: OrderType, set: &EmailTemplateSet) -> Result<(), TemplateError> {
        let path = self.path_for(order_type);
        let json = serde_json::to_string_pretty(set).map_err(|source| TemplateError::Parse {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| TemplateError::Write { path, source })?;
        self.invalidate();
        Ok(())
    }
}

fn load_template_file(path: &Path) -> Result<EmailTemplateSet, TemplateError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| TemplateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> EmailTemplateSet {
        let mut status_updates = HashMap::new();
        status_updates.insert(
            "ORDER_RECEIVED".to_string(),
            StatusTemplate {
                subject: "Order [orderNumber] received".to_string(),
                message: "Hello [customerName]".to_string(),
                message_with_quote: None,
            },
        );
        EmailTemplateSet {
            order_type: "product".to_string(),
            description: String::new(),
            initial_confirmation: InitialConfirmation {
                subject: "Thanks".to_string(),
                content: "Thanks [customerName]".to_string(),
                from_email: "orders@jbinverters.com".to_string(),
            },
            status_updates,
        }
    }

    fn store_with_sample() -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        let json = serde_json::to_string_pretty(&sample_set()).unwrap();
        std::fs::write(dir.path().join(PRODUCT_TEMPLATES_FILE), json).unwrap();
        let store = TemplateStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn loads_and_caches_by_order_type() {
        let (_dir, store) = store_with_sample();
        let first = store.get(OrderType::Product).unwrap();
        let second = store.get(OrderType::Product).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.initial_confirmation.from_email, "orders@jbinverters.com");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let (_dir, store) = store_with_sample();
        assert!(matches!(
            store.get(OrderType::Repair),
            Err(TemplateError::Read { .. })
        ));
    }

    #[test]
    fn invalidate_forces_reread() {
        let (dir, store) = store_with_sample();
        store.get(OrderType::Product).unwrap();

        let mut edited = sample_set();
        edited.initial_confirmation.subject = "Edited".to_string();
        std::fs::write(
            dir.path().join(PRODUCT_TEMPLATES_FILE),
            serde_json::to_string(&edited).unwrap(),
        )
        .unwrap();

        // Cached copy still served until invalidation.
        assert_eq!(
            store.get(OrderType::Product).unwrap().initial_confirmation.subject,
            "Thanks"
        );
        store.invalidate();
        assert_eq!(
            store.get(OrderType::Product).unwrap().initial_confirmation.subject,
            "Edited"
        );
    }

    #[test]
    fn save_writes_and_invalidates() {
        let (dir, store) = store_with_sample();
        store.get(OrderType::Product).unwrap();

        let mut edited = sample_set();
        edited.description = "updated".to_string();
        store.save(OrderType::Product, &edited).unwrap();

        assert_eq!(store.get(OrderType::Product).unwrap().description, "updated");
        let on_disk = std::fs::read_to_string(dir.path().join(PRODUCT_TEMPLATES_FILE)).unwrap();
        assert!(on_disk.contains("updated"));
    }

    #[test]
    fn unknown_status_lookup_fails() {
        let set = sample_set();
        assert!(matches!(
            set.status_template(OrderType::Product, OrderStatus::Cancelled),
            Err(TemplateError::UnknownStatus { .. })
        ));
        assert!(set
            .status_template(OrderType::Product, OrderStatus::OrderReceived)
            .is_ok());
    }
}
