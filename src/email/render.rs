//! Turns a template entry plus an order snapshot into `{subject, html}`.
//!
//! Placeholder tokens are square-bracketed (`[customerName]`, `[total]`, ...).
//! Everything substituted into the HTML body is escaped except the numeric
//! total; the subject line stays plain text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::status::{OrderStatus, OrderType};
use crate::domain::format_amount;
use crate::email::templates::{EmailTemplateSet, TemplateError};
use crate::models::OrderWithItems;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Everything the renderer needs to know about one order. Also the shape the
/// admin preview endpoint accepts as synthetic order data.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub order_number: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    pub total: f64,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub repair_quote: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<SnapshotItem>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotItem {
    pub product_name: String,
    pub quantity: i32,
    pub price: f64,
}

impl From<&OrderWithItems> for OrderSnapshot {
    fn from(order: &OrderWithItems) -> Self {
        Self {
            order_number: order.order.order_number.clone(),
            customer_name: order.order.customer_name.clone(),
            customer_address: order.order.customer_address.clone(),
            total: order.order.total,
            tracking_number: order.order.tracking_number.clone(),
            repair_quote: order.order.repair_quote.clone(),
            created_at: order.order.created_at,
            items: order
                .items
                .iter()
                .map(|item| SnapshotItem {
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        }
    }
}

/// Renders the status-update email for one order. Pure: identical input yields
/// identical output.
pub fn render_status_update(
    set: &EmailTemplateSet,
    order_type: OrderType,
    order: &OrderSnapshot,
    status: OrderStatus,
) -> Result<RenderedEmail, TemplateError> {
    let template = set.status_template(order_type, status)?;

    let body = match (&template.message_with_quote, status) {
        (Some(with_quote), OrderStatus::QuoteSent)
            if order.repair_quote.as_deref().is_some_and(|q| !q.is_empty()) =>
        {
            with_quote
        }
        _ => &template.message,
    };

    let fields = field_values(order);
    let message = substitute(body, &fields, true);
    let subject = substitute(&template.subject, &fields, false);

    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <div style=\"white-space: pre-line;\">{message}</div></div>"
    );

    Ok(RenderedEmail { subject, html })
}

/// The initial confirmation reuses the ORDER_RECEIVED status template; the
/// `initialConfirmation` block only contributes the sender address.
pub fn render_initial_confirmation(
    set: &EmailTemplateSet,
    order_type: OrderType,
    order: &OrderSnapshot,
) -> Result<(RenderedEmail, String), TemplateError> {
    let rendered = render_status_update(set, order_type, order, OrderStatus::OrderReceived)?;
    Ok((rendered, set.initial_confirmation.from_email.clone()))
}

fn field_values(order: &OrderSnapshot) -> Vec<(&'static str, String, bool)> {
    let order_date = order
        .created_at
        .format("%B %-d, %Y, %-I:%M %p")
        .to_string();
    let items_list = items_list(&order.items);
    let or = |value: &Option<String>, fallback: &str| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };
    // (token, value, escape-when-in-body)
    vec![
        ("[customerName]", or(&order.customer_name, "Valued Customer"), true),
        ("[orderNumber]", order.order_number.clone(), true),
        ("[orderDate]", order_date, true),
        (
            "[customerAddress]",
            or(&order.customer_address, "No address provided"),
            true,
        ),
        ("[itemsList]", items_list, true),
        ("[total]", format_amount(order.total), false),
        (
            "[trackingNumber]",
            or(&order.tracking_number, "Not yet assigned"),
            true,
        ),
        (
            "[repairQuote]",
            or(&order.repair_quote, "No quote available"),
            true,
        ),
    ]
}

fn substitute(text: &str, fields: &[(&'static str, String, bool)], escape: bool) -> String {
    let mut out = text.to_string();
    for (token, value, escape_field) in fields {
        let replacement = if escape && *escape_field {
            escape_html(value)
        } else {
            value.clone()
        };
        out = out.replace(token, &replacement);
    }
    out
}

/// One line per item: `- <name> (Qty: <n>) - $<price>`.
fn items_list(items: &[SnapshotItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "- {} (Qty: {}) - ${}",
                item.product_name,
                item.quantity,
                format_amount(item.price)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escapes the characters that matter inside an HTML body, including the
/// forward slash to keep closing tags inert.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::templates::{InitialConfirmation, StatusTemplate};
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn template_set() -> EmailTemplateSet {
        let mut status_updates = HashMap::new();
        status_updates.insert(
            "ORDER_RECEIVED".to_string(),
            StatusTemplate {
                subject: "Order [orderNumber] received".to_string(),
                message: "Hello [customerName],\n\nPlaced [orderDate].\nShip to: [customerAddress]\n\n[itemsList]\n\nTotal: $[total]\nTracking: [trackingNumber]".to_string(),
                message_with_quote: None,
            },
        );
        status_updates.insert(
            "QUOTE_SENT".to_string(),
            StatusTemplate {
                subject: "Your repair quote".to_string(),
                message: "Hello [customerName], your quote is being prepared.".to_string(),
                message_with_quote: Some(
                    "Hello [customerName], your quote:\n[repairQuote]".to_string(),
                ),
            },
        );
        EmailTemplateSet {
            order_type: "repair".to_string(),
            description: String::new(),
            initial_confirmation: InitialConfirmation {
                subject: "unused".to_string(),
                content: "unused".to_string(),
                from_email: "repairs@jbinverters.com".to_string(),
            },
            status_updates,
        }
    }

    fn snapshot() -> OrderSnapshot {
        OrderSnapshot {
            order_number: "JB-1700000000000-AB12".to_string(),
            customer_name: Some("Ada & Co <admin>".to_string()),
            customer_address: Some("1 Main St".to_string()),
            total: 100.0,
            tracking_number: None,
            repair_quote: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 0).unwrap(),
            items: vec![
                SnapshotItem {
                    product_name: "Pure Sine Wave Inverter 1000W".to_string(),
                    quantity: 2,
                    price: 50.0,
                },
            ],
        }
    }

    #[test]
    fn substitutes_every_token() {
        let rendered =
            render_status_update(&template_set(), OrderType::Repair, &snapshot(), OrderStatus::OrderReceived)
                .unwrap();
        assert!(!rendered.html.contains('['), "unreplaced token in {}", rendered.html);
        assert!(rendered.subject.contains("JB-1700000000000-AB12"));
        assert!(rendered.html.contains("Total: $100.00"));
        assert!(rendered.html.contains("Not yet assigned"));
        assert!(rendered
            .html
            .contains("- Pure Sine Wave Inverter 1000W (Qty: 2) - $50.00"));
    }

    #[test]
    fn body_fields_are_html_escaped_subject_is_not() {
        let rendered =
            render_status_update(&template_set(), OrderType::Repair, &snapshot(), OrderStatus::OrderReceived)
                .unwrap();
        assert!(rendered.html.contains("Ada &amp; Co &lt;admin&gt;"));
        assert!(!rendered.html.contains("<admin>"));

        let mut set = template_set();
        set.status_updates
            .get_mut("ORDER_RECEIVED")
            .unwrap()
            .subject = "For [customerName]".to_string();
        let rendered =
            render_status_update(&set, OrderType::Repair, &snapshot(), OrderStatus::OrderReceived)
                .unwrap();
        assert_eq!(rendered.subject, "For Ada & Co <admin>");
    }

    #[test]
    fn date_uses_twelve_hour_clock() {
        let rendered =
            render_status_update(&template_set(), OrderType::Repair, &snapshot(), OrderStatus::OrderReceived)
                .unwrap();
        assert!(rendered.html.contains("March 7, 2025, 2:05 PM"));
    }

    #[test]
    fn quote_sent_uses_alternate_body_only_with_quote() {
        let set = template_set();
        let mut order = snapshot();

        let rendered =
            render_status_update(&set, OrderType::Repair, &order, OrderStatus::QuoteSent).unwrap();
        assert!(rendered.html.contains("being prepared"));

        order.repair_quote = Some("Parts: $50, Labor: $40".to_string());
        let rendered =
            render_status_update(&set, OrderType::Repair, &order, OrderStatus::QuoteSent).unwrap();
        assert!(rendered.html.contains("Parts: $50, Labor: $40"));
        assert!(!rendered.html.contains("[repairQuote]"));

        // Empty quote falls back to the plain body.
        order.repair_quote = Some(String::new());
        let rendered =
            render_status_update(&set, OrderType::Repair, &order, OrderStatus::QuoteSent).unwrap();
        assert!(rendered.html.contains("being prepared"));
    }

    #[test]
    fn quote_text_is_escaped() {
        let set = template_set();
        let mut order = snapshot();
        order.repair_quote = Some("Diodes <5A> & labor".to_string());
        let rendered =
            render_status_update(&set, OrderType::Repair, &order, OrderStatus::QuoteSent).unwrap();
        assert!(rendered.html.contains("Diodes &lt;5A&gt; &amp; labor"));
    }

    #[test]
    fn missing_status_template_is_an_error() {
        let err = render_status_update(
            &template_set(),
            OrderType::Repair,
            &snapshot(),
            OrderStatus::Repairing,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::UnknownStatus { .. }));
    }

    #[test]
    fn rendering_is_idempotent() {
        let first =
            render_status_update(&template_set(), OrderType::Repair, &snapshot(), OrderStatus::OrderReceived)
                .unwrap();
        let second =
            render_status_update(&template_set(), OrderType::Repair, &snapshot(), OrderStatus::OrderReceived)
                .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_contact_fields_fall_back() {
        let mut order = snapshot();
        order.customer_name = None;
        order.customer_address = Some(String::new());
        let rendered =
            render_status_update(&template_set(), OrderType::Repair, &order, OrderStatus::OrderReceived)
                .unwrap();
        assert!(rendered.html.contains("Valued Customer"));
        assert!(rendered.html.contains("No address provided"));
    }

    #[test]
    fn initial_confirmation_reuses_order_received() {
        let (rendered, from) =
            render_initial_confirmation(&template_set(), OrderType::Repair, &snapshot()).unwrap();
        assert!(rendered.subject.contains("received"));
        assert_eq!(from, "repairs@jbinverters.com");
    }

    #[test]
    fn escape_html_covers_all_characters() {
        assert_eq!(
            escape_html(r#"&<>"'/"#),
            "&amp;&lt;&gt;&quot;&#39;&#x2F;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
