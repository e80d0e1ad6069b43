// holdings/types.rs
// Wallet balances and the snapshot handed to subscribers

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FetchError;

/// One token balance of a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Token address (same key space as catalog entries)
    pub address: String,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub decimals: u8,
    /// Raw integer amount in the token's smallest unit
    pub balance: String,
    #[serde(default)]
    pub price_usd: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Holding {
    /// Balance scaled by `decimals`; `None` if the raw amount is not an integer
    pub fn ui_amount(&self) -> Option<f64> {
        let raw: u128 = self.balance.parse().ok()?;
        Some(raw as f64 / 10f64.powi(self.decimals as i32))
    }

    pub fn value_usd(&self) -> Option<f64> {
        Some(self.ui_amount()? * self.price_usd?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HoldingsSnapshot {
    pub wallet_address: Option<String>,
    pub entries: Arc<Vec<Holding>>,
    pub is_loading: bool,
    pub error: Option<FetchError>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// What a `load_holdings` call ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldingsLoadOutcome {
    /// No wallet: state cleared, nothing fetched
    Cleared,
    /// Same wallet, still fresh: nothing fetched
    Cached,
    /// Fetched this many holdings
    Loaded(usize),
    Failed(FetchError),
    /// Wallet changed while the fetch was running; result dropped
    Superseded,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(balance: &str, decimals: u8, price: Option<f64>) -> Holding {
        Holding {
            address: "a1".to_string(),
            symbol: "TON".to_string(),
            name: "Toncoin".to_string(),
            decimals,
            balance: balance.to_string(),
            price_usd: price,
            image_url: None,
        }
    }

    #[test]
    fn test_ui_amount_scales_by_decimals() {
        assert_eq!(holding("1500000000", 9, None).ui_amount(), Some(1.5));
        assert_eq!(holding("not-a-number", 9, None).ui_amount(), None);
    }

    #[test]
    fn test_value_needs_price() {
        assert_eq!(holding("2000000", 6, Some(3.0)).value_usd(), Some(6.0));
        assert_eq!(holding("2000000", 6, None).value_usd(), None);
    }
}
