use std::time::Duration;

use crate::config_struct;

// ============================================================================
// FETCHER CONFIGURATION
// ============================================================================

config_struct! {
    /// Page fetching and retry policy
    pub struct FetcherConfig {
        /// Items per page; the provider caps this at 100
        page_size: u32 = 100,

        /// Retries after the first attempt for transient failures
        max_retries: u32 = 2,

        /// Fixed delay between transient retries
        retry_delay_ms: u64 = 1000,

        /// Pause applied when the provider answers 429
        rate_limit_pause_ms: u64 = 2000,

        /// Pauses allowed per request before rate limiting surfaces as an error
        max_rate_limit_pauses: u32 = 5,
    }
}

impl FetcherConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn rate_limit_pause(&self) -> Duration {
        Duration::from_millis(self.rate_limit_pause_ms)
    }
}

// ============================================================================
// LOADER CONFIGURATION
// ============================================================================

config_struct! {
    /// Loading coordinator settings
    pub struct LoaderConfig {
        /// Trigger calls closer together than this are absorbed
        debounce_ms: u64 = 1000,

        /// Sleep between consecutive page requests within a run
        politeness_delay_ms: u64 = 200,

        /// Hard ceiling on page requests in one run
        max_pages_per_run: u32 = 100,

        /// Catalog freshness window
        cache_ttl_secs: u64 = 300,

        /// Times a run re-requests a rate limited page before giving up
        max_rate_limit_restarts: u32 = 3,
    }
}

impl LoaderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

// ============================================================================
// SAFETY GOVERNOR CONFIGURATION
// ============================================================================

config_struct! {
    /// Overrides applied before honoring a `hasMore = false` from the provider
    pub struct GovernorConfig {
        /// A full page reported as the last one is followed by one more request
        continue_after_full_last_page: bool = true,

        /// Keep going while fewer entries than this are loaded (0 disables)
        min_expected_entries: usize = 500,

        /// ...but only while fewer pages than this have been tried in the run
        min_expected_page_limit: u32 = 50,
    }
}
