/// Token catalog cache
///
/// - `types`: catalog entries and subscriber snapshots
/// - `store`: deduplicated entries plus loading/pagination state
/// - `fetcher`: coalesced, retried page requests
/// - `governor`: heuristics applied before trusting "no more pages"
/// - `coordinator`: the single background loading run
/// - `search`: substring search over whatever is loaded
pub mod coordinator;
pub mod fetcher;
pub mod governor;
pub mod search;
pub mod store;
pub mod types;

pub use coordinator::{
    CoordinatorStats, LoadingCoordinator, RefreshOutcome, RunSummary, StopReason, TriggerOutcome,
};
pub use fetcher::{CatalogPage, PageFetcher};
pub use governor::{GovernorDecision, OverrideReason, PageObservation, SafetyGovernor};
pub use search::search_entries;
pub use store::{CatalogState, CatalogStore, MergeStats};
pub use types::{CatalogEntry, CatalogSnapshot, MarketStats, VerificationTier};
