//! Loading coordinator
//!
//! Any number of consumers may ask for the catalog to be loaded. The
//! coordinator absorbs bursts of triggers (debounce), skips work while the
//! cache is fresh and guarantees that at most one loading run exists at a
//! time. The active run is a shared future: everybody who arrives late awaits
//! the same run instead of starting another.
//!
//! A run walks the catalog page by page from the store's cursor, merging each
//! page as it arrives so subscribers see the list grow. It stops on an empty
//! page, when the provider says there is nothing more and the
//! [`SafetyGovernor`] agrees, at the page ceiling, or on a terminal error.
//! Entries merged before an error stay visible.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;

use super::fetcher::PageFetcher;
use super::governor::{GovernorDecision, PageObservation, SafetyGovernor};
use super::store::CatalogStore;
use crate::config::{CatalogConfig, LoaderConfig};
use crate::logger::{self, LogTag};

/// Which branch a `trigger_load` call took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Too close to the previous trigger
    Debounced,
    /// A run is active; it will notify everyone when done
    AlreadyRunning,
    /// Cache is populated and within its TTL
    Fresh,
    Started,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Cache is populated and within its TTL; nothing changed
    Fresh,
    AlreadyRunning,
    /// Store reset and a new run started
    Started,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Provider returned no items
    EmptyPage,
    /// Provider reported the end and the governor agreed
    Exhausted,
    /// Run hit `max_pages_per_run`
    PageCeiling,
    /// Terminal fetch error, stored as the store's last error
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Successful page responses, including an empty final page
    pub pages_fetched: u32,
    pub entries_added: usize,
    pub duplicates: usize,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub trigger_count: u64,
    pub runs_started: u64,
    pub run_in_progress: bool,
}

type RunHandle = Shared<BoxFuture<'static, RunSummary>>;

#[derive(Default)]
struct CoordinatorState {
    run_in_progress: bool,
    active_run: Option<RunHandle>,
    last_trigger: Option<Instant>,
    trigger_count: u64,
    runs_started: u64,
    last_summary: Option<RunSummary>,
}

struct CoordinatorInner {
    store: Arc<CatalogStore>,
    fetcher: Arc<PageFetcher>,
    governor: SafetyGovernor,
    settings: LoaderConfig,
    rate_limit_pause: Duration,
    state: Mutex<CoordinatorState>,
}

#[derive(Clone)]
pub struct LoadingCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl LoadingCoordinator {
    pub fn new(store: Arc<CatalogStore>, fetcher: Arc<PageFetcher>, config: &CatalogConfig) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                store,
                fetcher,
                governor: SafetyGovernor::new(config.governor.clone()),
                settings: config.loader.clone(),
                rate_limit_pause: config.fetcher.rate_limit_pause(),
                state: Mutex::new(CoordinatorState::default()),
            }),
        }
    }

    /// Start a loading run after `delay` unless one is pointless or already active
    ///
    /// Must be called from within a Tokio runtime; the run is spawned.
    pub fn trigger_load(&self, delay: Duration) -> TriggerOutcome {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        state.trigger_count += 1;

        let now = Instant::now();
        if let Some(last) = state.last_trigger {
            if now.duration_since(last) < inner.settings.debounce() {
                logger::debug(LogTag::Loader, "Trigger debounced");
                return TriggerOutcome::Debounced;
            }
        }
        state.last_trigger = Some(now);

        if state.run_in_progress {
            logger::debug(LogTag::Loader, "Trigger ignored: run already in progress");
            return TriggerOutcome::AlreadyRunning;
        }

        if !inner.store.is_empty() && inner.store.is_fresh(inner.settings.cache_ttl()) {
            logger::debug(LogTag::Loader, "Trigger ignored: catalog is fresh");
            return TriggerOutcome::Fresh;
        }

        self.start_run(&mut state, delay, false);
        TriggerOutcome::Started
    }

    /// Drop everything and reload, unless the cache is still fresh
    ///
    /// Bypasses the debounce window. The reset happens at the start of the
    /// spawned run, so entries stay visible until then. After a failed run
    /// the catalog is never fresh; the refresh resumes from the cursor
    /// instead of resetting.
    pub fn refresh(&self) -> RefreshOutcome {
        let inner = &self.inner;
        let mut state = inner.state.lock();

        if state.run_in_progress {
            return RefreshOutcome::AlreadyRunning;
        }
        let failed = inner.store.read(|s| s.last_error.is_some());
        if !failed && !inner.store.is_empty() && inner.store.is_fresh(inner.settings.cache_ttl()) {
            logger::debug(LogTag::Loader, "Refresh skipped: catalog is fresh");
            return RefreshOutcome::Fresh;
        }
        if failed {
            logger::info(LogTag::Loader, "Refresh resumes the failed run");
        }

        state.last_trigger = Some(Instant::now());
        self.start_run(&mut state, Duration::ZERO, !failed);
        RefreshOutcome::Started
    }

    /// Await the active run, if any
    pub async fn wait_for_idle(&self) -> Option<RunSummary> {
        let run = self.inner.state.lock().active_run.clone();
        match run {
            Some(run) => Some(run.await),
            None => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().run_in_progress
    }

    pub fn last_summary(&self) -> Option<RunSummary> {
        self.inner.state.lock().last_summary.clone()
    }

    pub fn stats(&self) -> CoordinatorStats {
        let state = self.inner.state.lock();
        CoordinatorStats {
            trigger_count: state.trigger_count,
            runs_started: state.runs_started,
            run_in_progress: state.run_in_progress,
        }
    }

    fn start_run(&self, state: &mut CoordinatorState, delay: Duration, reset_first: bool) {
        state.run_in_progress = true;
        state.runs_started += 1;
        let run_number = state.runs_started;

        logger::info(
            LogTag::Loader,
            &format!(
                "Starting loading run #{} (delay {:?}, reset {})",
                run_number, delay, reset_first
            ),
        );

        let inner = Arc::clone(&self.inner);
        let run: RunHandle = async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if reset_first {
                inner.store.reset();
            }

            let summary = inner.execute_run().await;

            {
                let mut state = inner.state.lock();
                state.run_in_progress = false;
                state.active_run = None;
                state.last_summary = Some(summary.clone());
            }
            inner.store.mutate(|s| {
                s.is_loading_initial = false;
                s.is_fetching_more = false;
            });

            logger::info(
                LogTag::Loader,
                &format!(
                    "Loading run #{} finished: {:?} after {} pages, {} new entries, {} duplicates",
                    run_number,
                    summary.stop_reason,
                    summary.pages_fetched,
                    summary.entries_added,
                    summary.duplicates
                ),
            );
            summary
        }
        .boxed()
        .shared();

        state.active_run = Some(run.clone());
        tokio::spawn(run);
    }
}

impl CoordinatorInner {
    async fn execute_run(&self) -> RunSummary {
        let page_size = self.fetcher.page_size();
        let max_pages = self.settings.max_pages_per_run.max(1);
        let max_restarts = self.settings.max_rate_limit_restarts;

        self.store.mutate(|s| {
            if s.is_empty() {
                s.is_loading_initial = true;
                s.is_fetching_more = false;
            } else {
                s.is_fetching_more = true;
            }
        });

        let mut pages_fetched = 0u32;
        let mut entries_added = 0usize;
        let mut duplicates = 0usize;
        let mut requests = 0u32;
        let mut rate_limit_restarts = 0u32;

        let stop_reason = loop {
            if requests >= max_pages {
                logger::warning(
                    LogTag::Loader,
                    &format!("Page ceiling of {} requests reached, stopping run", max_pages),
                );
                break StopReason::PageCeiling;
            }

            let page = self.store.next_page();
            requests += 1;

            let result = match self.fetcher.fetch_page(page).await {
                Ok(result) => result,
                Err(err) if err.is_rate_limited() && rate_limit_restarts < max_restarts => {
                    rate_limit_restarts += 1;
                    logger::warning(
                        LogTag::Loader,
                        &format!(
                            "Page {} still rate limited, pausing {:?} before retrying ({}/{})",
                            page, self.rate_limit_pause, rate_limit_restarts, max_restarts
                        ),
                    );
                    tokio::time::sleep(self.rate_limit_pause).await;
                    continue;
                }
                Err(err) => {
                    logger::error(
                        LogTag::Loader,
                        &format!("Loading run stopped at page {}: {}", page, err),
                    );
                    self.store.mutate(|s| s.last_error = Some(err));
                    break StopReason::Failed;
                }
            };
            pages_fetched += 1;

            if result.is_empty() {
                self.store.mutate(|s| {
                    s.has_more = false;
                    s.mark_success();
                });
                logger::debug(LogTag::Loader, &format!("Page {} empty, catalog complete", page));
                break StopReason::EmptyPage;
            }

            let received = result.items.len();
            let reported_has_more = result.has_more;
            let total = result.total;
            let (stats, total_loaded) = self.store.mutate(|s| {
                let stats = s.merge_page(result.items);
                s.next_page = page + 1;
                s.has_more = reported_has_more;
                if total.is_some() {
                    s.total_hint = total;
                }
                s.mark_success();
                s.is_loading_initial = false;
                s.is_fetching_more = true;
                (stats, s.len())
            });
            entries_added += stats.added;
            duplicates += stats.duplicates;

            logger::debug(
                LogTag::Loader,
                &format!(
                    "Merged page {}: {} received, {} new, {} total",
                    page, received, stats.added, total_loaded
                ),
            );

            let observation = PageObservation {
                page,
                items_received: received,
                page_size,
                reported_has_more,
                total_loaded,
                pages_tried: requests,
            };
            match self.governor.evaluate(&observation) {
                GovernorDecision::Continue => {}
                GovernorDecision::Override(reason) => {
                    logger::info(
                        LogTag::Governor,
                        &format!("Ignoring end signal after page {}: {}", page, reason),
                    );
                    self.store.mutate(|s| s.has_more = true);
                }
                GovernorDecision::Stop => break StopReason::Exhausted,
            }

            tokio::time::sleep(self.settings.politeness_delay()).await;
        };

        RunSummary {
            pages_fetched,
            entries_added,
            duplicates,
            stop_reason,
        }
    }
}
