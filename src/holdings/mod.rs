/// Per-wallet holdings cache
///
/// Holdings load first; once they land (or fail) the catalog load is
/// triggered, so the two caches do not compete for bandwidth.
pub mod cache;
pub mod types;

pub use cache::HoldingsCache;
pub use types::{Holding, HoldingsLoadOutcome, HoldingsSnapshot};
