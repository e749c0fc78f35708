//! Telegram Bot API catalog client.
//!
//! Maps the gift surface of the Bot API onto [`CatalogClient`]:
//!
//! | Method | Endpoint |
//! |--------|----------|
//! | `get_balance` | `getMyStarBalance` |
//! | `list_available_gifts` | `getAvailableGifts` |
//! | `send_gift` | `sendGift` |
//! | `send_message` | `sendMessage` |
//!
//! A gift with `total_count` set is a limited release; `remaining_count`
//! of zero means it is sold out.

use super::{CatalogClient, CatalogError, Gift, GiftId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

pub struct BotApiCatalog {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl BotApiCatalog {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base(DEFAULT_API_BASE, token)
    }

    /// Point at a non-default API server (local Bot API server, test stub).
    pub fn with_base(base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, CatalogError> {
        let url = format!("{}/bot{}/{}", self.base, self.token, method);
        let response = self
            .http
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;

        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| CatalogError::Malformed("ok response without result".into()))
        } else {
            Err(CatalogError::Api {
                code: envelope.error_code.unwrap_or(0),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".into()),
            })
        }
    }

    /// Numeric recipients go through as integer ids, anything else (e.g.
    /// `@channel`) verbatim.
    fn chat_value(recipient: &str) -> Value {
        match recipient.parse::<i64>() {
            Ok(id) => json!(id),
            Err(_) => json!(recipient),
        }
    }
}

#[async_trait]
impl CatalogClient for BotApiCatalog {
    async fn get_balance(&self) -> Result<u64, CatalogError> {
        let amount: StarAmount = self.call("getMyStarBalance", json!({})).await?;
        Ok(amount.amount)
    }

    async fn list_available_gifts(&self) -> Result<Vec<Gift>, CatalogError> {
        let payload: GiftsPayload = self.call("getAvailableGifts", json!({})).await?;
        Ok(payload.gifts.into_iter().map(Gift::from).collect())
    }

    async fn send_gift(
        &self,
        id: &GiftId,
        recipient: &str,
        hide_identity: bool,
    ) -> Result<(), CatalogError> {
        let mut params = json!({
            "gift_id": id.as_str(),
            "hide_my_name": hide_identity,
        });
        match recipient.parse::<i64>() {
            Ok(user_id) => params["user_id"] = json!(user_id),
            Err(_) => params["chat_id"] = json!(recipient),
        }
        let _: Value = self.call("sendGift", params).await?;
        Ok(())
    }

    async fn send_message(&self, recipient: &str, text: &str) -> Result<(), CatalogError> {
        // sendMessage only knows chat_id; a bare user id is a valid one.
        let params = json!({
            "chat_id": Self::chat_value(recipient),
            "text": text,
        });
        let _: Value = self.call("sendMessage", params).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StarAmount {
    amount: u64,
}

#[derive(Debug, Deserialize)]
struct GiftsPayload {
    gifts: Vec<ApiGift>,
}

#[derive(Debug, Deserialize)]
struct ApiGift {
    id: String,
    star_count: u64,
    total_count: Option<u64>,
    remaining_count: Option<u64>,
    sticker: Option<ApiSticker>,
}

#[derive(Debug, Deserialize)]
struct ApiSticker {
    emoji: Option<String>,
}

impl From<ApiGift> for Gift {
    fn from(raw: ApiGift) -> Self {
        Gift {
            id: GiftId::new(raw.id),
            price: raw.star_count,
            is_limited: raw.total_count.is_some(),
            is_sold_out: raw.remaining_count == Some(0),
            emoji: raw.sticker.and_then(|s| s.emoji),
        }
    }
}
