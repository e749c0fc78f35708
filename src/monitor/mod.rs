//! Monitor: the poll → filter → act loop.
//!
//! One cycle fetches the balance and the current gift list, runs every
//! gift through the decision policy and performs the resulting side
//! effects. Cycle-level fetch failures are contained: the loop logs,
//! sleeps the extended backoff and polls again. Only the shutdown signal
//! ends the loop.
//!
//! Deduplication is a process-lifetime set of gift ids. An id enters the
//! set *before* its purchase is attempted, so a failed attempt is never
//! retried on later polls; it surfaces as a notified failure instead.

mod config;

pub use config::{ConfigError, MonitorConfig, DEFAULT_ERROR_BACKOFF, DEFAULT_POLL_INTERVAL};

use crate::catalog::{CatalogClient, CatalogError, Gift, GiftId};
use crate::notify::{Notice, Notifier};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Outcome of the pure per-gift decision. First failing predicate wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    SkipSeen,
    SkipSoldOut,
    SkipNotLimited,
    SkipPrice,
    InsufficientFunds,
    Buy,
}

/// Pure decision policy: no side effects, no client, unit-testable.
///
/// Predicate order matters: the seen check runs before any other filter,
/// and price bounds are inclusive on both ends.
pub fn evaluate(
    gift: &Gift,
    balance: u64,
    config: &MonitorConfig,
    seen: &HashSet<GiftId>,
) -> Decision {
    if seen.contains(&gift.id) {
        return Decision::SkipSeen;
    }
    if gift.is_sold_out {
        return Decision::SkipSoldOut;
    }
    if config.only_limited && !gift.is_limited {
        return Decision::SkipNotLimited;
    }
    if gift.price < config.min_price || gift.price > config.max_price {
        return Decision::SkipPrice;
    }
    if balance < gift.price {
        return Decision::InsufficientFunds;
    }
    Decision::Buy
}

/// The long-running monitor. Owns the seen set; everything else is
/// borrowed from the config or reached through the client.
pub struct Monitor {
    client: Arc<dyn CatalogClient>,
    config: MonitorConfig,
    notifier: Notifier,
    seen: HashSet<GiftId>,
    started_at: DateTime<Utc>,
    cycles: u64,
}

impl Monitor {
    /// Validates the config up front; a monitor that constructs is a
    /// monitor that may run.
    pub fn new(client: Arc<dyn CatalogClient>, config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let notifier = Notifier::new(client.clone(), config.recipient.clone());
        Ok(Self {
            client,
            config,
            notifier,
            seen: HashSet::new(),
            started_at: Utc::now(),
            cycles: 0,
        })
    }

    /// Run until `shutdown` fires. Never returns on its own: fetch errors
    /// back off and resume, per-gift errors are absorbed within the cycle.
    ///
    /// Cancellation is cooperative and lands between cycles; an in-flight
    /// cycle runs to completion.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            recipient = %self.config.recipient,
            min_price = self.config.min_price,
            max_price = self.config.max_price,
            only_limited = self.config.only_limited,
            "monitor started"
        );

        loop {
            let pause = match self.cycle().await {
                Ok(acted) => {
                    if acted > 0 {
                        debug!(cycle = self.cycles, acted, "cycle complete");
                    }
                    self.config.poll_interval
                }
                Err(err) => {
                    warn!(cycle = self.cycles, error = %err, "cycle failed, backing off");
                    self.config.error_backoff
                }
            };

            tokio::select! {
                _ = shutdown.recv() => {
                    let uptime = Utc::now().signed_duration_since(self.started_at);
                    info!(cycles = self.cycles, uptime_secs = uptime.num_seconds(), "monitor stopped");
                    return;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    /// One poll-filter-act pass over the current catalog snapshot.
    /// Returns the number of gifts acted upon (purchase attempts plus
    /// funds notifications). Fetch errors bubble up to [`Monitor::run`].
    pub async fn cycle(&mut self) -> Result<usize, CatalogError> {
        self.cycles += 1;

        // Balance is a fresh snapshot per cycle and deliberately not
        // decremented as gifts are approved within the cycle.
        let balance = self.client.get_balance().await?;
        let gifts = self.client.list_available_gifts().await?;
        debug!(cycle = self.cycles, balance, gifts = gifts.len(), "polled catalog");

        let mut acted = 0;
        for gift in &gifts {
            match evaluate(gift, balance, &self.config, &self.seen) {
                Decision::SkipSeen | Decision::SkipSoldOut
                | Decision::SkipNotLimited | Decision::SkipPrice => {}
                Decision::InsufficientFunds => {
                    self.seen.insert(gift.id.clone());
                    warn!(id = %gift.id, price = gift.price, balance, "insufficient funds");
                    self.notifier.send(Notice::insufficient_funds(gift, balance)).await;
                    acted += 1;
                }
                Decision::Buy => {
                    // Mark seen first: a failed purchase must not be
                    // retried on the next poll.
                    self.seen.insert(gift.id.clone());
                    match self
                        .client
                        .send_gift(&gift.id, &self.config.recipient, true)
                        .await
                    {
                        Ok(()) => {
                            info!(id = %gift.id, price = gift.price, "gift purchased");
                            self.notifier.send(Notice::purchased(gift)).await;
                        }
                        Err(err) => {
                            error!(id = %gift.id, error = %err, "purchase failed");
                            self.notifier.send(Notice::purchase_failed(gift, &err)).await;
                        }
                    }
                    acted += 1;
                }
            }
        }
        Ok(acted)
    }

    /// Ids already acted upon this process lifetime.
    pub fn seen(&self) -> &HashSet<GiftId> {
        &self.seen
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}
