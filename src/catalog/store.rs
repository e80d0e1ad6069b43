//! Canonical in-memory catalog state for the swap UI.
//!
//! The store keeps the deduplicated list of catalog entries in fetch order
//! together with loading/error/pagination state. All mutations go through
//! [`CatalogStore::mutate`], which applies the change under the write lock,
//! builds a snapshot, releases the lock and only then notifies subscribers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::time::Instant;

use super::search::search_entries;
use super::types::{CatalogEntry, CatalogSnapshot};
use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use crate::utils::hub::{Listener, Subscription, SubscriptionHub};

/// Result of merging one page into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub received: usize,
    pub added: usize,
    pub duplicates: usize,
}

/// Mutable catalog state. Entries and the address index are private so the
/// uniqueness invariant can only be changed through [`CatalogState::merge_page`].
#[derive(Debug)]
pub struct CatalogState {
    entries: Arc<Vec<CatalogEntry>>,
    index: HashMap<String, usize>,
    pub is_loading_initial: bool,
    pub is_fetching_more: bool,
    pub last_error: Option<FetchError>,
    pub has_more: bool,
    /// Next page to request (1-based)
    pub next_page: u32,
    pub total_hint: Option<u64>,
    last_success: Option<Instant>,
    last_updated: Option<DateTime<Utc>>,
    duplicates_seen: u64,
}

impl CatalogState {
    fn new() -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            index: HashMap::new(),
            is_loading_initial: false,
            is_fetching_more: false,
            last_error: None,
            has_more: true,
            next_page: 1,
            total_hint: None,
            last_success: None,
            last_updated: None,
            duplicates_seen: 0,
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&CatalogEntry> {
        self.index.get(address).map(|&pos| &self.entries[pos])
    }

    /// Append `items`, keeping only the first occurrence of every address.
    ///
    /// A repeated address means the provider served inconsistent pages; it is
    /// logged and counted, never treated as an error.
    pub fn merge_page(&mut self, items: Vec<CatalogEntry>) -> MergeStats {
        let mut stats = MergeStats {
            received: items.len(),
            ..MergeStats::default()
        };
        if items.is_empty() {
            return stats;
        }

        let entries = Arc::make_mut(&mut self.entries);
        entries.reserve(items.len());

        let mut duplicate_addresses = Vec::new();
        for item in items {
            if self.index.contains_key(&item.address) {
                stats.duplicates += 1;
                duplicate_addresses.push(item.address);
                continue;
            }
            self.index.insert(item.address.clone(), entries.len());
            entries.push(item);
            stats.added += 1;
        }

        if stats.duplicates > 0 {
            self.duplicates_seen += stats.duplicates as u64;
            logger::warning(
                LogTag::Catalog,
                &format!(
                    "Dropped {} duplicate addresses from page (upstream inconsistency): {}",
                    stats.duplicates,
                    duplicate_addresses.join(", ")
                ),
            );
        }

        stats
    }

    /// Back to an empty catalog starting at page 1.
    pub fn reset(&mut self) {
        self.entries = Arc::new(Vec::new());
        self.index.clear();
        self.next_page = 1;
        self.has_more = true;
        self.last_error = None;
        self.total_hint = None;
        self.last_success = None;
    }

    /// Record a successful page request (including an empty final page).
    pub fn mark_success(&mut self) {
        self.last_success = Some(Instant::now());
        self.last_updated = Some(Utc::now());
        self.last_error = None;
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.last_success
            .map(|at| at.elapsed() < ttl)
            .unwrap_or(false)
    }

    pub fn duplicates_seen(&self) -> u64 {
        self.duplicates_seen
    }

    fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            entries: Arc::clone(&self.entries),
            is_loading: self.is_loading_initial,
            is_fetching: self.is_fetching_more,
            error: self.last_error.clone(),
            has_more: self.has_more,
            next_page: self.next_page,
            total_hint: self.total_hint,
            last_updated: self.last_updated,
        }
    }
}

/// Catalog store with change notification.
pub struct CatalogStore {
    state: RwLock<CatalogState>,
    hub: SubscriptionHub<CatalogSnapshot>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState::new()),
            hub: SubscriptionHub::new(),
        }
    }

    /// Apply `change` and notify every subscriber with the resulting snapshot.
    pub fn mutate<R>(&self, change: impl FnOnce(&mut CatalogState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write();
            let result = change(&mut state);
            (result, state.snapshot())
        };
        self.hub.notify(&snapshot);
        result
    }

    /// Read state without notifying anyone.
    pub fn read<R>(&self, view: impl FnOnce(&CatalogState) -> R) -> R {
        view(&self.state.read())
    }

    pub fn merge_page(&self, items: Vec<CatalogEntry>) -> MergeStats {
        self.mutate(|state| state.merge_page(items))
    }

    pub fn reset(&self) {
        logger::info(LogTag::Catalog, "Resetting catalog cache");
        self.mutate(CatalogState::reset)
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.read(|state| state.is_fresh(ttl))
    }

    pub fn search(&self, query: &str) -> Vec<CatalogEntry> {
        let entries = self.read(|state| Arc::clone(&state.entries));
        search_entries(&entries, query)
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.read(CatalogState::snapshot)
    }

    pub fn get(&self, address: &str) -> Option<CatalogEntry> {
        self.read(|state| state.get(address).cloned())
    }

    pub fn len(&self) -> usize {
        self.read(CatalogState::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next_page(&self) -> u32 {
        self.read(|state| state.next_page)
    }

    /// Register a listener; it immediately receives the current snapshot.
    pub fn subscribe(&self, listener: impl Listener<CatalogSnapshot> + 'static) -> Subscription {
        let current = self.snapshot();
        self.hub.subscribe(listener, &current)
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.listener_count()
    }

    pub fn notification_count(&self) -> u64 {
        self.hub.notification_count()
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page(range: std::ops::Range<usize>) -> Vec<CatalogEntry> {
        range
            .map(|i| CatalogEntry::new(format!("addr-{}", i), format!("T{}", i), format!("Token {}", i)))
            .collect()
    }

    #[test]
    fn test_merge_keeps_addresses_unique() {
        let store = CatalogStore::new();
        store.merge_page(page(0..100));
        let stats = store.merge_page(page(90..150));
        assert_eq!(stats, MergeStats { received: 60, added: 50, duplicates: 10 });

        // duplicates inside a single page too
        let mut repeated = page(200..203);
        repeated.push(repeated[0].clone());
        let stats = store.merge_page(repeated);
        assert_eq!(stats.added, 3);
        assert_eq!(stats.duplicates, 1);

        let snapshot = store.snapshot();
        let unique: HashSet<&str> = snapshot.entries.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(unique.len(), snapshot.len());
        assert_eq!(snapshot.len(), 153);
        assert_eq!(store.read(|s| s.duplicates_seen()), 11);
    }

    #[test]
    fn test_merge_preserves_first_occurrence_order() {
        let store = CatalogStore::new();
        let mut first = page(0..3);
        first[1].name = "original".to_string();
        store.merge_page(first);

        let mut again = page(1..2);
        again[0].name = "replacement".to_string();
        store.merge_page(again);

        let snapshot = store.snapshot();
        let addresses: Vec<&str> = snapshot.entries.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(addresses, vec!["addr-0", "addr-1", "addr-2"]);
        assert_eq!(store.get("addr-1").unwrap().name, "original");
    }

    #[test]
    fn test_reset_clears_entries_and_cursor() {
        let store = CatalogStore::new();
        store.mutate(|s| {
            s.merge_page(page(0..10));
            s.next_page = 4;
            s.has_more = false;
            s.mark_success();
        });

        store.reset();
        let snapshot = store.snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.next_page, 1);
        assert!(snapshot.has_more);
        assert!(snapshot.error.is_none());
        assert!(store.get("addr-0").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_freshness_window() {
        let store = CatalogStore::new();
        let ttl = Duration::from_secs(300);
        assert!(!store.is_fresh(ttl));

        store.mutate(CatalogState::mark_success);
        assert!(store.is_fresh(ttl));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(store.is_fresh(ttl));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!store.is_fresh(ttl));
    }

    #[test]
    fn test_every_mutation_notifies() {
        let store = CatalogStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _sub = store.subscribe(move |_: &CatalogSnapshot| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        store.merge_page(page(0..5));
        store.reset();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_snapshot_shares_entries() {
        let store = CatalogStore::new();
        store.merge_page(page(0..5));
        let before = store.snapshot();
        store.merge_page(page(5..6));

        // the earlier snapshot is unaffected by later merges
        assert_eq!(before.len(), 5);
        assert_eq!(store.snapshot().len(), 6);
    }

    #[test]
    fn test_search_over_store() {
        let store = CatalogStore::new();
        store.merge_page(vec![
            CatalogEntry::new("a1", "TON", "Toncoin"),
            CatalogEntry::new("a2", "STON", "Tonstart"),
        ]);
        let results = store.search("ton");
        assert_eq!(results.len(), 2);
        assert_eq!(store.search("").len(), 2);
    }
}
