//! Templated customer notifications: template documents on disk, a pure
//! renderer, and the mail-transport seam.
//!
//! Notification sending is always best-effort. The order mutation that
//! triggered it has already been committed, so failures here are logged and
//! swallowed, never propagated.

pub mod mailer;
pub mod render;
pub mod templates;

use tracing::warn;

use crate::domain::status::OrderStatus;
use crate::email::mailer::{Mailer, OutgoingEmail};
use crate::email::render::{render_initial_confirmation, render_status_update, OrderSnapshot};
use crate::email::templates::TemplateStore;
use crate::models::OrderWithItems;

/// Renders and sends the status-update email for an order, if it has a
/// customer email on file.
pub async fn send_status_notification(
    store: &TemplateStore,
    mailer: &dyn Mailer,
    order: &OrderWithItems,
    status: OrderStatus,
) {
    let Some(to) = customer_email(order) else {
        return;
    };
    let order_type = order.order_type();
    let set = match store.get(order_type) {
        Ok(set) => set,
        Err(err) => {
            warn!(order = %order.order.order_number, error = %err, "skipping notification");
            return;
        }
    };
    let snapshot = OrderSnapshot::from(order);
    let rendered = match render_status_update(&set, order_type, &snapshot, status) {
        Ok(rendered) => rendered,
        Err(err) => {
            warn!(order = %order.order.order_number, error = %err, "skipping notification");
            return;
        }
    };
    let email = OutgoingEmail {
        to,
        from: None,
        subject: rendered.subject,
        html: rendered.html,
    };
    if let Err(err) = mailer.send(email).await {
        warn!(order = %order.order.order_number, error = %err, "failed to send status email");
    }
}

/// Sends the order-received confirmation right after an order is created.
pub async fn send_initial_confirmation(
    store: &TemplateStore,
    mailer: &dyn Mailer,
    order: &OrderWithItems,
) {
    let Some(to) = customer_email(order) else {
        return;
    };
    let order_type = order.order_type();
    let set = match store.get(order_type) {
        Ok(set) => set,
        Err(err) => {
            warn!(order = %order.order.order_number, error = %err, "skipping confirmation");
            return;
        }
    };
    let snapshot = OrderSnapshot::from(order);
    let (rendered, from_email) = match render_initial_confirmation(&set, order_type, &snapshot) {
        Ok(out) => out,
        Err(err) => {
            warn!(order = %order.order.order_number, error = %err, "skipping confirmation");
            return;
        }
    };
    let email = OutgoingEmail {
        to,
        from: Some(from_email),
        subject: rendered.subject,
        html: rendered.html,
    };
    if let Err(err) = mailer.send(email).await {
        warn!(order = %order.order.order_number, error = %err, "failed to send confirmation email");
    }
}

fn customer_email(order: &OrderWithItems) -> Option<String> {
    order
        .order
        .customer_email
        .as_deref()
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::OrderType;
    use crate::email::mailer::testing::RecordingMailer;
    use crate::email::templates::{
        EmailTemplateSet, InitialConfirmation, StatusTemplate, PRODUCT_TEMPLATES_FILE,
    };
    use crate::models::{Order, OrderItem};
    use chrono::Utc;
    use std::collections::HashMap;

    fn sample_order(email: Option<&str>) -> OrderWithItems {
        OrderWithItems {
            order: Order {
                id: "o1".into(),
                order_number: "JB-1-AAAA".into(),
                customer_name: Some("Pat".into()),
                customer_email: email.map(str::to_string),
                customer_address: None,
                customer_phone: None,
                total: 50.0,
                status: crate::domain::OrderStatus::OrderReceived,
                internal_notes: None,
                tracking_number: None,
                repair_quote: None,
                is_archived: false,
                created_at: Utc::now(),
            },
            items: vec![OrderItem {
                id: "i1".into(),
                order_id: "o1".into(),
                product_id: "product-1".into(),
                product_name: "Charger".into(),
                quantity: 1,
                price: 50.0,
            }],
        }
    }

    fn store_with_templates() -> (tempfile::TempDir, TemplateStore) {
        let mut status_updates = HashMap::new();
        status_updates.insert(
            "ORDER_RECEIVED".to_string(),
            StatusTemplate {
                subject: "Order [orderNumber]".to_string(),
                message: "Hi [customerName]".to_string(),
                message_with_quote: None,
            },
        );
        status_updates.insert(
            "SHIPPED_AND_COMPLETE".to_string(),
            StatusTemplate {
                subject: "Shipped".to_string(),
                message: "On the way, [customerName]".to_string(),
                message_with_quote: None,
            },
        );
        let set = EmailTemplateSet {
            order_type: OrderType::Product.as_str().to_string(),
            description: String::new(),
            initial_confirmation: InitialConfirmation {
                subject: "x".to_string(),
                content: "x".to_string(),
                from_email: "orders@jbinverters.com".to_string(),
            },
            status_updates,
        };
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PRODUCT_TEMPLATES_FILE),
            serde_json::to_string(&set).unwrap(),
        )
        .unwrap();
        let store = TemplateStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn sends_status_email_when_address_present() {
        let (_dir, store) = store_with_templates();
        let mailer = RecordingMailer::default();
        let order = sample_order(Some("pat@example.com"));
        send_status_notification(&store, &mailer, &order, OrderStatus::ShippedAndComplete).await;

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "pat@example.com");
        assert_eq!(sent[0].subject, "Shipped");
    }

    #[tokio::test]
    async fn skips_when_no_customer_email() {
        let (_dir, store) = store_with_templates();
        let mailer = RecordingMailer::default();
        send_status_notification(&store, &mailer, &sample_order(None), OrderStatus::OrderReceived)
            .await;
        send_status_notification(
            &store,
            &mailer,
            &sample_order(Some("")),
            OrderStatus::OrderReceived,
        )
        .await;
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed() {
        let (_dir, store) = store_with_templates();
        let mailer = RecordingMailer {
            fail: true,
            ..Default::default()
        };
        // Must not panic or propagate.
        send_status_notification(
            &store,
            &mailer,
            &sample_order(Some("pat@example.com")),
            OrderStatus::OrderReceived,
        )
        .await;
    }

    #[tokio::test]
    async fn confirmation_carries_template_sender() {
        let (_dir, store) = store_with_templates();
        let mailer = RecordingMailer::default();
        send_initial_confirmation(&store, &mailer, &sample_order(Some("pat@example.com"))).await;

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from.as_deref(), Some("orders@jbinverters.com"));
        assert_eq!(sent[0].subject, "Order JB-1-AAAA");
    }
}
