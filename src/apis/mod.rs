//! Remote provider boundary
//!
//! The cache core only talks to the traits below; [`HttpCatalogClient`] is the
//! production implementation and [`crate::mocks`] provides scripted doubles.

use async_trait::async_trait;

use crate::catalog::types::CatalogEntry;
use crate::errors::ApiError;
use crate::holdings::types::Holding;

pub mod catalog;
pub mod client;
pub mod types;

pub use catalog::HttpCatalogClient;
pub use client::{HttpClient, RateLimitGuard, RateLimiter};
pub use types::{CatalogPageResponse, HoldingsResponse, PageRequest};

/// Paged token catalog
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /catalog?page&size&verification[]`
    async fn fetch_page(&self, request: &PageRequest) -> Result<CatalogPageResponse, ApiError>;

    /// `GET /catalog/{address}`
    async fn fetch_entry(&self, address: &str) -> Result<CatalogEntry, ApiError>;
}

/// Per-wallet token balances
#[async_trait]
pub trait HoldingsApi: Send + Sync {
    /// `GET /accounts/{address}/holdings`
    async fn fetch_holdings(&self, address: &str) -> Result<Vec<Holding>, ApiError>;
}
