//! Catalog boundary: gift snapshots and the client trait.
//!
//! The monitor never talks to Telegram directly. Everything it needs from
//! the remote account goes through [`CatalogClient`], so the real Bot API
//! client and the in-memory test doubles are interchangeable.

mod botapi;

pub use botapi::BotApiCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Glyph used when a gift carries no sticker emoji.
pub const DEFAULT_GLYPH: &str = "🎁";

/// Opaque stable gift identifier, unique for the catalog's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiftId(String);

impl GiftId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for GiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GiftId {
    fn from(id: &str) -> Self { Self(id.to_string()) }
}

/// Immutable snapshot of one catalog entry from one poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gift {
    pub id: GiftId,
    /// Price in Stars.
    pub price: u64,
    pub is_limited: bool,
    pub is_sold_out: bool,
    /// Sticker emoji, when the catalog provides one.
    pub emoji: Option<String>,
}

impl Gift {
    /// Display glyph, falling back to [`DEFAULT_GLYPH`].
    pub fn glyph(&self) -> &str {
        self.emoji.as_deref().unwrap_or(DEFAULT_GLYPH)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("api error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Remote account boundary. Auth, rate limiting and transport retries are
/// the implementation's business; the monitor only sees success or error.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Current Stars balance of the monitored account.
    async fn get_balance(&self) -> Result<u64, CatalogError>;

    /// Snapshot of the gifts currently offered by the catalog.
    async fn list_available_gifts(&self) -> Result<Vec<Gift>, CatalogError>;

    /// Buy the gift and forward it to `recipient`.
    async fn send_gift(
        &self,
        id: &GiftId,
        recipient: &str,
        hide_identity: bool,
    ) -> Result<(), CatalogError>;

    /// Deliver a plain text message to `recipient`.
    async fn send_message(&self, recipient: &str, text: &str) -> Result<(), CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_falls_back_when_emoji_missing() {
        let gift = Gift {
            id: GiftId::new("g1"),
            price: 100,
            is_limited: false,
            is_sold_out: false,
            emoji: None,
        };
        assert_eq!(gift.glyph(), DEFAULT_GLYPH);

        let gift = Gift { emoji: Some("🧸".into()), ..gift };
        assert_eq!(gift.glyph(), "🧸");
    }

    #[test]
    fn gift_id_is_transparent_in_json() {
        let id = GiftId::new("5170233102089322756");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"5170233102089322756\"");
    }
}
