//! Catalog service: the one object UI code talks to.
//!
//! Bundles the store, fetcher, loading coordinator and holdings cache built
//! from one [`CatalogConfig`]. There is no global instance; construct one per
//! process (or per test) and share it behind an `Arc`, then call
//! [`CatalogService::start`] once so the catalog loads even when no wallet
//! ever connects.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::apis::{CatalogApi, HoldingsApi, HttpCatalogClient};
use crate::catalog::{
    CatalogEntry, CatalogSnapshot, CatalogStore, CoordinatorStats, LoadingCoordinator, PageFetcher,
    RefreshOutcome, RunSummary, TriggerOutcome,
};
use crate::config::CatalogConfig;
use crate::errors::{ConfigError, FetchError};
use crate::holdings::HoldingsCache;
use crate::logger::{self, LogTag};
use crate::utils::{Listener, Subscription};

pub struct CatalogService {
    config: CatalogConfig,
    store: Arc<CatalogStore>,
    fetcher: Arc<PageFetcher>,
    coordinator: LoadingCoordinator,
    holdings: HoldingsCache,
}

impl CatalogService {
    /// Build the service over injected provider implementations
    pub fn new(
        config: CatalogConfig,
        catalog_api: Arc<dyn CatalogApi>,
        holdings_api: Arc<dyn HoldingsApi>,
    ) -> Self {
        let store = Arc::new(CatalogStore::new());
        let fetcher = Arc::new(PageFetcher::new(catalog_api, &config));
        let coordinator = LoadingCoordinator::new(Arc::clone(&store), Arc::clone(&fetcher), &config);
        let holdings = HoldingsCache::new(holdings_api, coordinator.clone(), &config);

        Self {
            config,
            store,
            fetcher,
            coordinator,
            holdings,
        }
    }

    /// Build the service against the HTTP provider configured in `config.api`
    pub fn from_config(config: CatalogConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Arc::new(HttpCatalogClient::new(&config)?);
        logger::info(
            LogTag::Catalog,
            &format!("Catalog service using provider {}", client.base_url()),
        );
        Ok(Self::new(config, client.clone(), client))
    }

    /// Arm the no-wallet fallback; call once after construction
    ///
    /// Resolves to `true` when the fallback started the catalog load itself.
    pub fn start(&self) -> JoinHandle<bool> {
        logger::debug(LogTag::Catalog, "Catalog service started");
        self.holdings.arm_fallback_trigger()
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Register a listener; it receives the current snapshot immediately
    pub fn subscribe(&self, listener: impl Listener<CatalogSnapshot> + 'static) -> Subscription {
        self.store.subscribe(listener)
    }

    pub fn get_snapshot(&self) -> CatalogSnapshot {
        self.store.snapshot()
    }

    /// Substring search over the entries loaded so far
    pub fn search(&self, query: &str) -> Vec<CatalogEntry> {
        self.store.search(query)
    }

    pub fn refresh(&self) -> RefreshOutcome {
        self.coordinator.refresh()
    }

    pub fn trigger_load(&self, delay: Duration) -> TriggerOutcome {
        self.coordinator.trigger_load(delay)
    }

    pub async fn wait_for_idle(&self) -> Option<RunSummary> {
        self.coordinator.wait_for_idle().await
    }

    /// Cached entry for `address`, falling back to a single-entry request
    ///
    /// Fetched entries are returned only; the paged store is left alone.
    pub async fn resolve_entry(&self, address: &str) -> Result<Option<CatalogEntry>, FetchError> {
        if let Some(entry) = self.store.get(address) {
            return Ok(Some(entry));
        }
        logger::debug(
            LogTag::Catalog,
            &format!("{} not loaded yet, requesting it directly", address),
        );
        self.fetcher.fetch_entry(address).await
    }

    pub fn holdings(&self) -> &HoldingsCache {
        &self.holdings
    }

    pub fn coordinator_stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }
}
