//! Monitor test suite: the decision loop against a scripted catalog.
//!
//! Test 1: Successful purchase path (send_gift then success notice)
//! Test 2: At-most-once across re-polled cycles
//! Test 3: Sold-out suppression leaves no trace
//! Test 4: Limited-only filter
//! Test 5: Inclusive price bounds
//! Test 6: Insufficient funds notifies exactly once
//! Test 7: Failed purchase is never retried
//! Test 8: Listing failure recovers on the next cycle
//! Test 9: Notification failures do not abort sibling gifts
//! Test 10: Balance snapshot is not decremented within a cycle
//! Test 11: The loop backs off after a failure and stops on shutdown

use async_trait::async_trait;
use giftwatch::{CatalogClient, CatalogError, Gift, GiftId, Monitor, MonitorConfig, Shutdown};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted catalog: fixed listing, optional queued failures, recorded calls.
#[derive(Default)]
struct ScriptedCatalog {
    balance: Mutex<u64>,
    gifts: Mutex<Vec<Gift>>,
    listing_failures: Mutex<VecDeque<CatalogError>>,
    fail_gift_sends: AtomicBool,
    fail_messages: AtomicBool,
    gift_calls: Mutex<Vec<(GiftId, String, bool)>>,
    messages: Mutex<Vec<String>>,
}

impl ScriptedCatalog {
    fn new(balance: u64, gifts: Vec<Gift>) -> Arc<Self> {
        Arc::new(Self {
            balance: Mutex::new(balance),
            gifts: Mutex::new(gifts),
            ..Default::default()
        })
    }

    fn fail_next_listing(&self) {
        self.listing_failures
            .lock()
            .unwrap()
            .push_back(CatalogError::Transport("connection reset".into()));
    }

    fn gift_calls(&self) -> Vec<(GiftId, String, bool)> {
        self.gift_calls.lock().unwrap().clone()
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogClient for ScriptedCatalog {
    async fn get_balance(&self) -> Result<u64, CatalogError> {
        Ok(*self.balance.lock().unwrap())
    }

    async fn list_available_gifts(&self) -> Result<Vec<Gift>, CatalogError> {
        if let Some(err) = self.listing_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.gifts.lock().unwrap().clone())
    }

    async fn send_gift(
        &self,
        id: &GiftId,
        recipient: &str,
        hide_identity: bool,
    ) -> Result<(), CatalogError> {
        self.gift_calls
            .lock()
            .unwrap()
            .push((id.clone(), recipient.to_string(), hide_identity));
        if self.fail_gift_sends.load(Ordering::SeqCst) {
            return Err(CatalogError::Api {
                code: 400,
                description: "BALANCE_TOO_LOW".into(),
            });
        }
        Ok(())
    }

    async fn send_message(&self, _recipient: &str, text: &str) -> Result<(), CatalogError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(CatalogError::Transport("message dropped".into()));
        }
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn gift(id: &str, price: u64) -> Gift {
    Gift {
        id: GiftId::new(id),
        price,
        is_limited: true,
        is_sold_out: false,
        emoji: Some("🧸".into()),
    }
}

fn config() -> MonitorConfig {
    MonitorConfig::new("@drop").with_price_range(100, 500)
}

/// Test 1: balance 200, qualifying gift at 150 → one send_gift, then one
/// success notification, hidden identity, right recipient.
#[tokio::test]
async fn successful_purchase_sends_gift_then_notice() {
    let catalog = ScriptedCatalog::new(200, vec![gift("g1", 150)]);
    let mut monitor = Monitor::new(catalog.clone(), config()).unwrap();

    let acted = monitor.cycle().await.unwrap();
    assert_eq!(acted, 1);

    let calls = catalog.gift_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], (GiftId::new("g1"), "@drop".to_string(), true));

    let messages = catalog.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("New gift"), "unexpected: {}", messages[0]);
    assert!(messages[0].contains("150⭐"));
}

/// Test 2: the catalog keeps listing the same gift; only the first cycle acts.
#[tokio::test]
async fn at_most_once_across_cycles() {
    let catalog = ScriptedCatalog::new(1_000, vec![gift("g1", 150)]);
    let mut monitor = Monitor::new(catalog.clone(), config()).unwrap();

    for _ in 0..3 {
        monitor.cycle().await.unwrap();
    }

    assert_eq!(catalog.gift_calls().len(), 1);
    assert_eq!(catalog.messages().len(), 1);
    assert!(monitor.seen().contains(&GiftId::new("g1")));
}

/// Test 3: a sold-out gift is skipped without side effects and without
/// being marked seen.
#[tokio::test]
async fn sold_out_suppression_leaves_no_trace() {
    let sold_out = Gift { is_sold_out: true, ..gift("g1", 150) };
    let catalog = ScriptedCatalog::new(1_000, vec![sold_out]);
    let mut monitor = Monitor::new(catalog.clone(), config()).unwrap();

    monitor.cycle().await.unwrap();
    monitor.cycle().await.unwrap();

    assert!(catalog.gift_calls().is_empty());
    assert!(catalog.messages().is_empty());
    assert!(monitor.seen().is_empty());
}

/// Test 4: with only_limited, an unlimited gift is skipped whatever its price.
#[tokio::test]
async fn limited_only_filter_skips_unlimited() {
    let unlimited = Gift { is_limited: false, ..gift("g1", 150) };
    let catalog = ScriptedCatalog::new(1_000, vec![unlimited]);
    let mut monitor = Monitor::new(catalog.clone(), config().with_only_limited(true)).unwrap();

    monitor.cycle().await.unwrap();

    assert!(catalog.gift_calls().is_empty());
    assert!(monitor.seen().is_empty());
}

/// Test 5: gifts exactly at min and max are bought; one Star outside is not.
#[tokio::test]
async fn price_bounds_are_inclusive() {
    let catalog = ScriptedCatalog::new(10_000, vec![
        gift("at-min", 100),
        gift("below-min", 99),
        gift("at-max", 500),
        gift("above-max", 501),
    ]);
    let mut monitor = Monitor::new(catalog.clone(), config()).unwrap();

    monitor.cycle().await.unwrap();

    let bought: Vec<String> = catalog
        .gift_calls()
        .iter()
        .map(|(id, _, _)| id.to_string())
        .collect();
    assert_eq!(bought, vec!["at-min", "at-max"]);
}

/// Test 6: balance 50 against price 100 → one shortfall notice naming the
/// gap, no purchase, seen thereafter.
#[tokio::test]
async fn insufficient_funds_notifies_once() {
    let catalog = ScriptedCatalog::new(50, vec![gift("g1", 100)]);
    let mut monitor = Monitor::new(catalog.clone(), config()).unwrap();

    monitor.cycle().await.unwrap();
    monitor.cycle().await.unwrap();

    assert!(catalog.gift_calls().is_empty());
    let messages = catalog.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("blocked"), "unexpected: {}", messages[0]);
    assert!(messages[0].contains("50⭐"), "balance missing: {}", messages[0]);
    assert!(monitor.seen().contains(&GiftId::new("g1")));
}

/// Test 7: send_gift errors → one failure notice with the error detail,
/// and no second attempt even though nothing else changed.
#[tokio::test]
async fn failed_purchase_is_never_retried() {
    let catalog = ScriptedCatalog::new(1_000, vec![gift("g1", 150)]);
    catalog.fail_gift_sends.store(true, Ordering::SeqCst);
    let mut monitor = Monitor::new(catalog.clone(), config()).unwrap();

    monitor.cycle().await.unwrap();

    // The fault clears, but the gift stays consumed.
    catalog.fail_gift_sends.store(false, Ordering::SeqCst);
    monitor.cycle().await.unwrap();

    assert_eq!(catalog.gift_calls().len(), 1);
    let messages = catalog.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("BALANCE_TOO_LOW"), "detail missing: {}", messages[0]);
    assert!(monitor.seen().contains(&GiftId::new("g1")));
}

/// Test 8: a failed listing produces no actions; the next cycle proceeds
/// normally.
#[tokio::test]
async fn listing_failure_recovers_next_cycle() {
    let catalog = ScriptedCatalog::new(1_000, vec![gift("g1", 150)]);
    catalog.fail_next_listing();
    let mut monitor = Monitor::new(catalog.clone(), config()).unwrap();

    assert!(monitor.cycle().await.is_err());
    assert!(catalog.gift_calls().is_empty());

    let acted = monitor.cycle().await.unwrap();
    assert_eq!(acted, 1);
    assert_eq!(catalog.gift_calls().len(), 1);
}

/// Test 9: message delivery failing must not stop the other gifts in the
/// same cycle from being bought.
#[tokio::test]
async fn notification_failure_does_not_abort_siblings() {
    let catalog = ScriptedCatalog::new(10_000, vec![gift("g1", 150), gift("g2", 200)]);
    catalog.fail_messages.store(true, Ordering::SeqCst);
    let mut monitor = Monitor::new(catalog.clone(), config()).unwrap();

    let acted = monitor.cycle().await.unwrap();
    assert_eq!(acted, 2);
    assert_eq!(catalog.gift_calls().len(), 2);
}

/// Test 10: both gifts are checked against the same pre-cycle balance
/// snapshot; approving the first does not starve the second.
#[tokio::test]
async fn balance_snapshot_is_not_decremented_within_a_cycle() {
    let catalog = ScriptedCatalog::new(200, vec![gift("g1", 150), gift("g2", 150)]);
    let mut monitor = Monitor::new(catalog.clone(), config()).unwrap();

    monitor.cycle().await.unwrap();

    // 150 + 150 > 200, yet both purchases go out against the snapshot.
    assert_eq!(catalog.gift_calls().len(), 2);
}

/// Test 11: the loop survives a failed cycle, buys once the catalog
/// recovers, and exits promptly on shutdown.
#[tokio::test]
async fn loop_backs_off_and_stops_on_shutdown() {
    let catalog = ScriptedCatalog::new(1_000, vec![gift("g1", 150)]);
    catalog.fail_next_listing();
    let config = config()
        .with_poll_interval(Duration::from_millis(10))
        .with_error_backoff(Duration::from_millis(20));
    let mut monitor = Monitor::new(catalog.clone(), config).unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        monitor.run(rx).await;
        monitor
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.trigger();

    let monitor = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("monitor did not stop on shutdown")
        .unwrap();

    assert_eq!(catalog.gift_calls().len(), 1);
    assert!(monitor.cycles() >= 2, "expected a retry after the failed cycle");
}
