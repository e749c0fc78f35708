//! Giftwatch: Telegram Stars gift monitor. Poll, filter, buy, notify.
//!
//! # Architecture
//!
//! ```text
//! Monitor (the loop)
//!   │
//!   ├── CatalogClient (trait boundary)
//!   │     └── BotApiCatalog (reqwest → Telegram Bot API)
//!   │
//!   ├── Decision policy (pure: evaluate per gift)
//!   │     └── SeenSet (process-lifetime dedup)
//!   │
//!   └── Notifier (best-effort messages via the client)
//! ```
//!
//! # Cycle
//!
//! Every `poll_interval` the monitor fetches the Stars balance and the
//! current gift list, then for each gift, in order: already seen → skip;
//! sold out → skip; not limited (when `only_limited`) → skip; price out
//! of the inclusive `[min_price, max_price]` range → skip. A surviving
//! gift is marked seen, then either purchased and forwarded to the
//! recipient or reported as unaffordable. A cycle-level fetch failure
//! sleeps `error_backoff` instead and the loop carries on.
//!
//! # Usage
//!
//! ```ignore
//! use giftwatch::{BotApiCatalog, Monitor, MonitorConfig, Shutdown};
//! use std::sync::Arc;
//!
//! let client = Arc::new(BotApiCatalog::new(token));
//! let config = MonitorConfig::new("@giftdrop")
//!     .with_price_range(100, 5_000)
//!     .with_only_limited(true);
//!
//! let shutdown = Shutdown::new();
//! let mut monitor = Monitor::new(client, config)?;
//! monitor.run(shutdown.subscribe()).await;
//! ```

pub mod catalog;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod runtime;

pub use catalog::{BotApiCatalog, CatalogClient, CatalogError, Gift, GiftId, DEFAULT_GLYPH};
pub use logging::init_logging;
pub use monitor::{evaluate, ConfigError, Decision, Monitor, MonitorConfig};
pub use notify::{Notice, Notifier};
pub use runtime::{install_signal_handlers, Shutdown};
