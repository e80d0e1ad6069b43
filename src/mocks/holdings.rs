//! Mock holdings provider.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::status_error;
use crate::apis::HoldingsApi;
use crate::errors::ApiError;
use crate::holdings::types::Holding;

/// `count` holdings of 1.0 token each (9 decimals), addresses `addr-{i}`
pub fn make_test_holdings(count: usize) -> Vec<Holding> {
    (0..count)
        .map(|i| Holding {
            address: format!("addr-{}", i),
            symbol: format!("T{}", i),
            name: format!("Token {}", i),
            decimals: 9,
            balance: "1000000000".to_string(),
            price_usd: None,
            image_url: None,
        })
        .collect()
}

/// Mock holdings API keyed by wallet address.
///
/// Unknown wallets hold nothing.
#[derive(Debug, Default)]
pub struct MockHoldingsApi {
    wallets: Mutex<HashMap<String, Vec<Holding>>>,
    failures: Mutex<HashMap<String, VecDeque<u16>>>,
    calls: Mutex<HashMap<String, usize>>,
    latency: Option<Duration>,
}

impl MockHoldingsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_wallet(self, address: &str, holdings: Vec<Holding>) -> Self {
        self.set_wallet(address, holdings);
        self
    }

    pub fn set_wallet(&self, address: &str, holdings: Vec<Holding>) {
        self.wallets.lock().insert(address.to_string(), holdings);
    }

    /// Fail the next requests for `address` with `statuses`, in order
    pub fn fail_wallet(&self, address: &str, statuses: Vec<u16>) {
        self.failures
            .lock()
            .entry(address.to_string())
            .or_default()
            .extend(statuses);
    }

    pub fn calls_for(&self, address: &str) -> usize {
        self.calls.lock().get(address).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl HoldingsApi for MockHoldingsApi {
    async fn fetch_holdings(&self, address: &str) -> Result<Vec<Holding>, ApiError> {
        *self.calls.lock().entry(address.to_string()).or_insert(0) += 1;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted_failure = self
            .failures
            .lock()
            .get_mut(address)
            .and_then(|queue| queue.pop_front());
        if let Some(status) = scripted_failure {
            return Err(status_error(format!("/accounts/{}/holdings", address), status));
        }

        Ok(self.wallets.lock().get(address).cloned().unwrap_or_default())
    }
}
