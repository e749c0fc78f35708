//! Notifications: three message templates delivered through the client.
//!
//! Delivery is best effort. A failed send is logged and dropped so it can
//! never abort the processing of sibling gifts in the same cycle.

use crate::catalog::{CatalogClient, Gift};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// One of the three notification templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    InsufficientFunds { glyph: String, price: u64, id: String, balance: u64 },
    Purchased { glyph: String, price: u64, id: String },
    PurchaseFailed { glyph: String, price: u64, id: String, error: String },
}

impl Notice {
    pub fn insufficient_funds(gift: &Gift, balance: u64) -> Self {
        Notice::InsufficientFunds {
            glyph: gift.glyph().to_string(),
            price: gift.price,
            id: gift.id.to_string(),
            balance,
        }
    }

    pub fn purchased(gift: &Gift) -> Self {
        Notice::Purchased {
            glyph: gift.glyph().to_string(),
            price: gift.price,
            id: gift.id.to_string(),
        }
    }

    pub fn purchase_failed(gift: &Gift, error: &dyn fmt::Display) -> Self {
        Notice::PurchaseFailed {
            glyph: gift.glyph().to_string(),
            price: gift.price,
            id: gift.id.to_string(),
            error: error.to_string(),
        }
    }

    /// Human-readable message text.
    pub fn render(&self) -> String {
        match self {
            Notice::InsufficientFunds { glyph, price, id, balance } => {
                let shortfall = price.saturating_sub(*balance);
                format!(
                    "🚫 Payment blocked: balance {balance}⭐ is {shortfall}⭐ short for gift {glyph} {price}⭐ (ID: {id})"
                )
            }
            Notice::Purchased { glyph, price, id } => {
                format!("🔔 New gift: {glyph} for {price}⭐ (ID: {id})")
            }
            Notice::PurchaseFailed { glyph, price, id, error } => {
                format!("🚫 Failed to send gift {glyph} {price}⭐ (ID: {id}): {error}")
            }
        }
    }
}

/// Thin pass-through to the client's messaging primitive.
pub struct Notifier {
    client: Arc<dyn CatalogClient>,
    recipient: String,
}

impl Notifier {
    pub fn new(client: Arc<dyn CatalogClient>, recipient: impl Into<String>) -> Self {
        Self { client, recipient: recipient.into() }
    }

    /// Render and deliver. Errors are logged, never propagated.
    pub async fn send(&self, notice: Notice) {
        let text = notice.render();
        if let Err(err) = self.client.send_message(&self.recipient, &text).await {
            warn!(error = %err, "notification delivery failed");
        }
    }
}
