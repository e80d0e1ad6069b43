// holdings/cache.rs
// Short-lived per-wallet cache that gates the start of catalog loading

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::types::{Holding, HoldingsLoadOutcome, HoldingsSnapshot};
use crate::apis::HoldingsApi;
use crate::catalog::LoadingCoordinator;
use crate::config::CatalogConfig;
use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use crate::utils::{Listener, RetryPolicy, SingleFlight, Subscription, SubscriptionHub};

#[derive(Debug, Default)]
struct HoldingsState {
    wallet_address: Option<String>,
    entries: Arc<Vec<Holding>>,
    is_loading: bool,
    last_error: Option<FetchError>,
    last_fetch: Option<Instant>,
    last_updated: Option<DateTime<Utc>>,
    /// Bumped on every wallet change; a load only lands if it still matches
    generation: u64,
}

impl HoldingsState {
    fn switch_wallet(&mut self, address: Option<String>) {
        let generation = self.generation + 1;
        *self = HoldingsState {
            wallet_address: address,
            generation,
            ..HoldingsState::default()
        };
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.last_fetch.map(|at| at.elapsed() < ttl).unwrap_or(false)
    }

    fn snapshot(&self) -> HoldingsSnapshot {
        HoldingsSnapshot {
            wallet_address: self.wallet_address.clone(),
            entries: Arc::clone(&self.entries),
            is_loading: self.is_loading,
            error: self.last_error.clone(),
            last_updated: self.last_updated,
        }
    }
}

type HoldingsResult = Result<Vec<Holding>, FetchError>;

pub struct HoldingsCache {
    api: Arc<dyn HoldingsApi>,
    policy: RetryPolicy,
    ttl: Duration,
    fallback_delay: Duration,
    coordinator: LoadingCoordinator,
    state: RwLock<HoldingsState>,
    hub: SubscriptionHub<HoldingsSnapshot>,
    inflight: SingleFlight<String, HoldingsResult>,
    address_seen: Arc<AtomicBool>,
}

impl HoldingsCache {
    pub fn new(api: Arc<dyn HoldingsApi>, coordinator: LoadingCoordinator, config: &CatalogConfig) -> Self {
        Self {
            api,
            policy: RetryPolicy::from_config(&config.fetcher),
            ttl: config.holdings.ttl(),
            fallback_delay: config.holdings.fallback_trigger(),
            coordinator,
            state: RwLock::new(HoldingsState::default()),
            hub: SubscriptionHub::new(),
            inflight: SingleFlight::new(),
            address_seen: Arc::new(AtomicBool::new(false)),
        }
    }

    fn mutate<R>(&self, change: impl FnOnce(&mut HoldingsState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write();
            let result = change(&mut state);
            (result, state.snapshot())
        };
        self.hub.notify(&snapshot);
        result
    }

    /// Load holdings for the connected wallet
    ///
    /// `None` or a blank address clears the cache. A new address is always
    /// fetched; the same address is refetched only once its TTL has passed or
    /// after a failure. Whatever happens to the fetch, the catalog load is
    /// triggered afterwards.
    pub async fn load_holdings(&self, address: Option<&str>) -> HoldingsLoadOutcome {
        let address = match address.map(str::trim).filter(|a| !a.is_empty()) {
            Some(address) => address.to_string(),
            None => {
                self.mutate(|s| s.switch_wallet(None));
                logger::debug(LogTag::Holdings, "No wallet connected, holdings cleared");
                return HoldingsLoadOutcome::Cleared;
            }
        };
        self.address_seen.store(true, Ordering::SeqCst);

        let cached = {
            let state = self.state.read();
            state.wallet_address.as_deref() == Some(address.as_str())
                && state.last_error.is_none()
                && state.is_fresh(self.ttl)
        };
        if cached {
            logger::debug(
                LogTag::Holdings,
                &format!("Holdings for {} still fresh", address),
            );
            self.trigger_catalog();
            return HoldingsLoadOutcome::Cached;
        }

        let generation = self.mutate(|s| {
            if s.wallet_address.as_deref() != Some(address.as_str()) {
                s.switch_wallet(Some(address.clone()));
            }
            s.is_loading = true;
            s.generation
        });

        let result = self.fetch(&address).await;

        let outcome = self.mutate(|s| {
            if s.generation != generation {
                return HoldingsLoadOutcome::Superseded;
            }
            s.is_loading = false;
            match result {
                Ok(holdings) => {
                    let count = holdings.len();
                    s.entries = Arc::new(holdings);
                    s.last_fetch = Some(Instant::now());
                    s.last_updated = Some(Utc::now());
                    s.last_error = None;
                    HoldingsLoadOutcome::Loaded(count)
                }
                Err(err) => {
                    s.last_error = Some(err.clone());
                    HoldingsLoadOutcome::Failed(err)
                }
            }
        });

        match &outcome {
            HoldingsLoadOutcome::Loaded(count) => {
                logger::info(
                    LogTag::Holdings,
                    &format!("Loaded {} holdings for {}", count, address),
                );
            }
            HoldingsLoadOutcome::Failed(err) => {
                logger::warning(
                    LogTag::Holdings,
                    &format!("Holdings load failed for {}: {}", address, err),
                );
            }
            _ => {
                logger::debug(
                    LogTag::Holdings,
                    &format!("Discarding holdings for {}: wallet changed", address),
                );
                return outcome;
            }
        }

        self.trigger_catalog();
        outcome
    }

    async fn fetch(&self, address: &str) -> HoldingsResult {
        let key = format!("holdings:{}", address);
        let api = Arc::clone(&self.api);
        let policy = self.policy.clone();
        let address = address.to_string();
        let flight_key = key.clone();

        self.inflight
            .run(key, move || async move {
                policy
                    .execute(&flight_key, LogTag::Holdings, || api.fetch_holdings(&address))
                    .await
                    // end-of-data for a wallet means nothing to show
                    .map(Option::unwrap_or_default)
            })
            .await
    }

    fn trigger_catalog(&self) {
        let outcome = self.coordinator.trigger_load(Duration::ZERO);
        logger::debug(
            LogTag::Holdings,
            &format!("Catalog load requested after holdings: {:?}", outcome),
        );
    }

    /// Start the catalog anyway if no wallet address shows up in time
    ///
    /// The task resolves to `true` when it had to trigger the load itself.
    pub fn arm_fallback_trigger(&self) -> JoinHandle<bool> {
        let delay = self.fallback_delay;
        let address_seen = Arc::clone(&self.address_seen);
        let coordinator = self.coordinator.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if address_seen.load(Ordering::SeqCst) {
                return false;
            }
            logger::info(
                LogTag::Holdings,
                &format!("No wallet after {:?}, starting catalog load", delay),
            );
            coordinator.trigger_load(Duration::ZERO);
            true
        })
    }

    pub fn snapshot(&self) -> HoldingsSnapshot {
        self.state.read().snapshot()
    }

    pub fn wallet_address(&self) -> Option<String> {
        self.state.read().wallet_address.clone()
    }

    pub fn subscribe(&self, listener: impl Listener<HoldingsSnapshot> + 'static) -> Subscription {
        let current = self.snapshot();
        self.hub.subscribe(listener, &current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogStore, PageFetcher};
    use crate::mocks::{make_test_holdings, MockCatalogApi, MockHoldingsApi};
    use parking_lot::Mutex;

    const WALLET_A: &str = "EQwalletA";
    const WALLET_B: &str = "EQwalletB";

    fn setup(api: MockHoldingsApi) -> (Arc<MockHoldingsApi>, HoldingsCache, LoadingCoordinator) {
        let config = CatalogConfig::default();
        let catalog_api = Arc::new(MockCatalogApi::with_entries(20, 100));
        let store = Arc::new(CatalogStore::new());
        let fetcher = Arc::new(PageFetcher::new(catalog_api, &config));
        let coordinator = LoadingCoordinator::new(store, fetcher, &config);

        let api = Arc::new(api);
        let cache = HoldingsCache::new(api.clone(), coordinator.clone(), &config);
        (api, cache, coordinator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_then_trigger_catalog() {
        let (api, cache, coordinator) =
            setup(MockHoldingsApi::new().with_wallet(WALLET_A, make_test_holdings(3)));

        assert_eq!(cache.load_holdings(Some(WALLET_A)).await, HoldingsLoadOutcome::Loaded(3));
        assert_eq!(api.calls_for(WALLET_A), 1);

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.wallet_address.as_deref(), Some(WALLET_A));
        assert_eq!(snapshot.entries.len(), 3);
        assert!(!snapshot.is_loading);
        assert_eq!(coordinator.stats().runs_started, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_wallet_uses_ttl() {
        let (api, cache, _coordinator) =
            setup(MockHoldingsApi::new().with_wallet(WALLET_A, make_test_holdings(2)));

        cache.load_holdings(Some(WALLET_A)).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(cache.load_holdings(Some(WALLET_A)).await, HoldingsLoadOutcome::Cached);
        assert_eq!(api.calls_for(WALLET_A), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(cache.load_holdings(Some(WALLET_A)).await, HoldingsLoadOutcome::Loaded(2));
        assert_eq!(api.calls_for(WALLET_A), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_change_clears_before_fetching() {
        let (_api, cache, _coordinator) = setup(
            MockHoldingsApi::new()
                .with_wallet(WALLET_A, make_test_holdings(3))
                .with_wallet(WALLET_B, make_test_holdings(1)),
        );
        cache.load_holdings(Some(WALLET_A)).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = cache.subscribe(move |s: &HoldingsSnapshot| {
            sink.lock().push((s.wallet_address.clone(), s.entries.len()));
        });

        cache.load_holdings(Some(WALLET_B)).await;

        let seen = seen.lock();
        assert_eq!(seen[0], (Some(WALLET_A.to_string()), 3));
        // never shows wallet A's holdings under wallet B
        assert_eq!(seen[1], (Some(WALLET_B.to_string()), 0));
        assert_eq!(seen.last(), Some(&(Some(WALLET_B.to_string()), 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_for_old_wallet_is_discarded() {
        let (_api, cache, _coordinator) = setup(
            MockHoldingsApi::new()
                .with_latency(Duration::from_secs(1))
                .with_wallet(WALLET_A, make_test_holdings(3))
                .with_wallet(WALLET_B, make_test_holdings(1)),
        );

        let (a, b) = tokio::join!(cache.load_holdings(Some(WALLET_A)), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cache.load_holdings(Some(WALLET_B)).await
        });

        assert_eq!(a, HoldingsLoadOutcome::Superseded);
        assert_eq!(b, HoldingsLoadOutcome::Loaded(1));
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.wallet_address.as_deref(), Some(WALLET_B));
        assert_eq!(snapshot.entries.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_still_triggers_catalog() {
        let api = MockHoldingsApi::new();
        api.fail_wallet(WALLET_A, vec![500, 500, 500]);
        let (api, cache, coordinator) = setup(api);

        let outcome = cache.load_holdings(Some(WALLET_A)).await;
        assert!(matches!(outcome, HoldingsLoadOutcome::Failed(FetchError::RetriesExhausted { .. })));
        assert_eq!(api.calls_for(WALLET_A), 3);
        assert!(cache.snapshot().error.is_some());
        assert_eq!(coordinator.stats().runs_started, 1);

        // failed state is not cached
        assert_eq!(cache.load_holdings(Some(WALLET_A)).await, HoldingsLoadOutcome::Loaded(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_address_clears() {
        let (api, cache, _coordinator) =
            setup(MockHoldingsApi::new().with_wallet(WALLET_A, make_test_holdings(2)));
        cache.load_holdings(Some(WALLET_A)).await;

        assert_eq!(cache.load_holdings(Some("  ")).await, HoldingsLoadOutcome::Cleared);
        let snapshot = cache.snapshot();
        assert!(snapshot.wallet_address.is_none());
        assert!(snapshot.entries.is_empty());
        assert_eq!(api.total_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_fires_without_wallet() {
        let (_api, cache, coordinator) = setup(MockHoldingsApi::new());

        let fallback = cache.arm_fallback_trigger();
        assert!(fallback.await.unwrap());
        assert_eq!(coordinator.stats().runs_started, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_skipped_when_wallet_arrives() {
        let (_api, cache, coordinator) =
            setup(MockHoldingsApi::new().with_wallet(WALLET_A, make_test_holdings(1)));

        let fallback = cache.arm_fallback_trigger();
        cache.load_holdings(Some(WALLET_A)).await;
        assert!(!fallback.await.unwrap());
        assert_eq!(coordinator.stats().runs_started, 1);
    }
}
