//! Mock implementations for testing.
//!
//! Scripted implementations of [`crate::apis::CatalogApi`] and
//! [`crate::apis::HoldingsApi`] so the caches can be exercised without a
//! provider. Latency uses `tokio::time`, so tests running with a paused clock
//! stay instant.

pub mod catalog;
pub mod holdings;

pub use catalog::{make_test_entries, MockCatalogApi};
pub use holdings::{make_test_holdings, MockHoldingsApi};

use crate::errors::ApiError;

/// Status error as the HTTP client would report it
pub(crate) fn status_error(endpoint: impl Into<String>, status: u16) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.into(),
        status,
        body: Some(format!("mock status {}", status)),
    }
}
