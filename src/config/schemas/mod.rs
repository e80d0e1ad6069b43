// Config schema submodule - one file per cache concern

use crate::config_struct;

mod api;
mod holdings;
mod loader;

pub use api::*;
pub use holdings::*;
pub use loader::*;

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct CatalogConfig {
        /// Remote catalog / holdings provider
        api: ApiConfig = ApiConfig::default(),

        /// Per-page fetch and retry behaviour
        fetcher: FetcherConfig = FetcherConfig::default(),

        /// Background loading runs
        loader: LoaderConfig = LoaderConfig::default(),

        /// Heuristics that keep loading past an untrusted "no more data" signal
        governor: GovernorConfig = GovernorConfig::default(),

        /// Per-wallet holdings cache
        holdings: HoldingsConfig = HoldingsConfig::default(),
    }
}
