pub mod apis;
pub mod catalog;
pub mod config;
pub mod errors; // Structured fetch/api/config errors
pub mod holdings; // Per-wallet holdings cache
pub mod logger;
pub mod mocks; // Scripted API doubles used by tests and debug tooling
pub mod service;
pub mod utils;

pub use catalog::types::{CatalogEntry, CatalogSnapshot, MarketStats, VerificationTier};
pub use config::CatalogConfig;
pub use errors::{ApiError, ConfigError, ErrorClass, FetchError};
pub use service::CatalogService;
