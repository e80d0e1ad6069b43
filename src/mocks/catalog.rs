//! Mock catalog provider.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::status_error;
use crate::apis::{CatalogApi, CatalogPageResponse, PageRequest};
use crate::catalog::types::CatalogEntry;
use crate::errors::ApiError;

/// Entries `addr-{i}` / `T{i}` / `Token {i}` for `i` in `0..count`
pub fn make_test_entries(count: usize) -> Vec<CatalogEntry> {
    (0..count)
        .map(|i| CatalogEntry::new(format!("addr-{}", i), format!("T{}", i), format!("Token {}", i)))
        .collect()
}

#[derive(Debug, Clone)]
struct ScriptedPage {
    items: Vec<CatalogEntry>,
    has_more: bool,
}

/// Mock catalog API serving fixed pages.
///
/// Pages are 1-based. Requests past the last page get either an empty page
/// with `hasMore = false` or, with [`MockCatalogApi::with_end_status`], the
/// given HTTP status. The request's `size` is ignored: page boundaries are
/// fixed when the mock is built.
#[derive(Debug, Default)]
pub struct MockCatalogApi {
    pages: Vec<ScriptedPage>,
    total: Option<u64>,
    end_status: Option<u16>,
    latency: Option<Duration>,
    /// Statuses returned, in order, before a page starts succeeding
    failures: Mutex<HashMap<u32, VecDeque<u16>>>,
    page_calls: Mutex<HashMap<u32, usize>>,
    entry_calls: AtomicUsize,
    total_calls: AtomicUsize,
}

impl MockCatalogApi {
    /// `count` generated entries split into pages of `page_size`; `hasMore` is accurate
    pub fn with_entries(count: usize, page_size: usize) -> Self {
        Self::from_entries(make_test_entries(count), page_size)
    }

    pub fn from_entries(entries: Vec<CatalogEntry>, page_size: usize) -> Self {
        let total = entries.len();
        let page_size = page_size.max(1);
        let chunks: Vec<Vec<CatalogEntry>> = entries.chunks(page_size).map(|c| c.to_vec()).collect();
        let page_count = chunks.len();
        let pages = chunks
            .into_iter()
            .enumerate()
            .map(|(i, items)| ScriptedPage {
                items,
                has_more: i + 1 < page_count,
            })
            .collect();

        Self {
            pages,
            total: Some(total as u64),
            ..Self::default()
        }
    }

    /// Explicit pages, served exactly as given
    pub fn from_pages(pages: Vec<(Vec<CatalogEntry>, bool)>) -> Self {
        let total: usize = pages.iter().map(|(items, _)| items.len()).sum();
        Self {
            pages: pages
                .into_iter()
                .map(|(items, has_more)| ScriptedPage { items, has_more })
                .collect(),
            total: Some(total as u64),
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answer requests past the last page with `status` (422 in production)
    pub fn with_end_status(mut self, status: u16) -> Self {
        self.end_status = Some(status);
        self
    }

    /// Override the `hasMore` flag reported for `page`
    pub fn report_has_more(mut self, page: u32, has_more: bool) -> Self {
        if let Some(scripted) = page
            .checked_sub(1)
            .and_then(|index| self.pages.get_mut(index as usize))
        {
            scripted.has_more = has_more;
        }
        self
    }

    /// Fail the next requests for `page` with `statuses`, in order
    pub fn fail_page(&self, page: u32, statuses: Vec<u16>) {
        self.failures
            .lock()
            .entry(page)
            .or_default()
            .extend(statuses);
    }

    pub fn calls_for_page(&self, page: u32) -> usize {
        self.page_calls.lock().get(&page).copied().unwrap_or(0)
    }

    /// Page and entry requests received
    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn entry_calls(&self) -> usize {
        self.entry_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CatalogApi for MockCatalogApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<CatalogPageResponse, ApiError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.page_calls.lock().entry(request.page).or_insert(0) += 1;
        self.simulate_latency().await;

        let scripted_failure = self
            .failures
            .lock()
            .get_mut(&request.page)
            .and_then(|queue| queue.pop_front());
        if let Some(status) = scripted_failure {
            return Err(status_error("/catalog", status));
        }

        let index = request.page.saturating_sub(1) as usize;
        match self.pages.get(index) {
            Some(page) if request.page > 0 => Ok(CatalogPageResponse {
                data: page.items.clone(),
                has_more: page.has_more,
                total: self.total,
            }),
            _ => match self.end_status {
                Some(status) => Err(status_error("/catalog", status)),
                None => Ok(CatalogPageResponse {
                    data: Vec::new(),
                    has_more: false,
                    total: self.total,
                }),
            },
        }
    }

    async fn fetch_entry(&self, address: &str) -> Result<CatalogEntry, ApiError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        self.entry_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        self.pages
            .iter()
            .flat_map(|page| page.items.iter())
            .find(|entry| entry.address == address)
            .cloned()
            .ok_or_else(|| status_error(format!("/catalog/{}", address), 404))
    }
}
