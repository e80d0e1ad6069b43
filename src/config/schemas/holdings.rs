use std::time::Duration;

use crate::config_struct;

// ============================================================================
// HOLDINGS CONFIGURATION
// ============================================================================

config_struct! {
    /// Per-wallet holdings cache
    pub struct HoldingsConfig {
        /// Same-address refetch window
        ttl_secs: u64 = 120,

        /// Catalog loading starts after this long if no wallet address arrives
        fallback_trigger_ms: u64 = 500,
    }
}

impl HoldingsConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn fallback_trigger(&self) -> Duration {
        Duration::from_millis(self.fallback_trigger_ms)
    }
}
