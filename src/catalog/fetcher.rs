//! Paginated catalog fetcher
//!
//! One page per call, coalesced per page number: concurrent callers asking
//! for the same page share a single provider request. Transient failures are
//! retried by [`RetryPolicy`]; the provider's "past the end" answer becomes an
//! empty final page instead of an error.

use std::sync::Arc;

use crate::apis::{CatalogApi, CatalogPageResponse, PageRequest};
use crate::catalog::types::{CatalogEntry, VerificationTier};
use crate::config::{CatalogConfig, PROVIDER_MAX_PAGE_SIZE};
use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use crate::utils::{RetryPolicy, SingleFlight};

/// One fetched page as seen by the loading coordinator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<CatalogEntry>,
    /// Provider's claim; the coordinator does not trust it blindly
    pub has_more: bool,
    pub total: Option<u64>,
}

impl CatalogPage {
    /// Terminal page used when the provider reports the page is out of range
    pub fn end() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self, page_size: u32) -> bool {
        page_size > 0 && self.items.len() >= page_size as usize
    }
}

impl From<CatalogPageResponse> for CatalogPage {
    fn from(response: CatalogPageResponse) -> Self {
        Self {
            items: response.data,
            has_more: response.has_more,
            total: response.total,
        }
    }
}

type PageResult = Result<CatalogPage, FetchError>;
type EntryResult = Result<Option<CatalogEntry>, FetchError>;

pub struct PageFetcher {
    api: Arc<dyn CatalogApi>,
    policy: RetryPolicy,
    page_size: u32,
    verification: Vec<VerificationTier>,
    pages: SingleFlight<String, PageResult>,
    entries: SingleFlight<String, EntryResult>,
}

impl PageFetcher {
    pub fn new(api: Arc<dyn CatalogApi>, config: &CatalogConfig) -> Self {
        let page_size = config.fetcher.page_size.clamp(1, PROVIDER_MAX_PAGE_SIZE);
        if page_size != config.fetcher.page_size {
            logger::warning(
                LogTag::Fetcher,
                &format!(
                    "Page size {} outside provider limits, using {}",
                    config.fetcher.page_size, page_size
                ),
            );
        }

        Self {
            api,
            policy: RetryPolicy::from_config(&config.fetcher),
            page_size,
            verification: config.api.verification.clone(),
            pages: SingleFlight::new(),
            entries: SingleFlight::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Page requests currently waiting on the provider
    pub fn inflight_pages(&self) -> usize {
        self.pages.len()
    }

    /// Fetch 1-based `page`, joining an identical request already in flight
    pub async fn fetch_page(&self, page: u32) -> PageResult {
        if page == 0 {
            return Err(FetchError::InvalidPage { page });
        }

        let key = format!("page:{}", page);
        let request = PageRequest {
            page,
            size: self.page_size,
            verification: self.verification.clone(),
        };
        let api = Arc::clone(&self.api);
        let policy = self.policy.clone();
        let flight_key = key.clone();

        self.pages
            .run(key, move || async move {
                logger::debug(LogTag::Fetcher, &format!("Requesting {}", flight_key));
                let response = policy
                    .execute(&flight_key, LogTag::Fetcher, || api.fetch_page(&request))
                    .await;

                response.map(|response| {
                    let page = response.map(CatalogPage::from).unwrap_or_else(CatalogPage::end);
                    logger::debug(
                        LogTag::Fetcher,
                        &format!(
                            "{}: {} items, has_more={}",
                            flight_key,
                            page.items.len(),
                            page.has_more
                        ),
                    );
                    page
                })
            })
            .await
    }

    /// Fetch a single entry by address; `Ok(None)` when the provider does not know it (404)
    pub async fn fetch_entry(&self, address: &str) -> EntryResult {
        let key = format!("entry:{}", address);
        let api = Arc::clone(&self.api);
        let policy = self.policy.clone();
        let address = address.to_string();
        let flight_key = key.clone();

        self.entries
            .run(key, move || async move {
                let result = policy
                    .execute(&flight_key, LogTag::Fetcher, || api.fetch_entry(&address))
                    .await;
                match result {
                    // unknown address
                    Err(FetchError::NonRetriable { ref source, .. }) if source.status() == Some(404) => {
                        Ok(None)
                    }
                    other => other,
                }
            })
            .await
    }
}
