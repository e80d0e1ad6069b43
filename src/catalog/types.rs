// catalog/types.rs
// Catalog entries and the snapshot handed to subscribers

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FetchError;

/// Provider-assigned trust level of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationTier {
    Blacklisted,
    Unknown,
    Community,
    Whitelisted,
}

impl VerificationTier {
    /// Query-string value for `verification[]`
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationTier::Blacklisted => "blacklisted",
            VerificationTier::Unknown => "unknown",
            VerificationTier::Community => "community",
            VerificationTier::Whitelisted => "whitelisted",
        }
    }
}

impl Default for VerificationTier {
    fn default() -> Self {
        VerificationTier::Unknown
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    pub price_usd: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub volume_24h_usd: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub holders_count: Option<u64>,
}

/// One swappable token as listed by the remote catalog
///
/// `address` is the primary key; the store never holds two entries with the
/// same address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(default, alias = "verification")]
    pub verification_tier: VerificationTier,
    #[serde(default)]
    pub market_stats: Option<MarketStats>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CatalogEntry {
    /// Minimal entry, mostly useful for fixtures
    pub fn new(address: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            symbol: symbol.into(),
            name: name.into(),
            decimals: 9,
            verification_tier: VerificationTier::Unknown,
            market_stats: None,
            image_url: None,
        }
    }

    pub fn is_blacklisted(&self) -> bool {
        self.verification_tier == VerificationTier::Blacklisted
    }
}

/// Immutable view of the catalog state, delivered to every subscriber
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Deduplicated entries in fetch order
    pub entries: Arc<Vec<CatalogEntry>>,
    /// First page of a run still outstanding
    pub is_loading: bool,
    /// Subsequent pages of a run still outstanding
    pub is_fetching: bool,
    pub error: Option<FetchError>,
    pub has_more: bool,
    pub next_page: u32,
    /// Provider's `total`, treated as a hint only
    pub total_hint: Option<u64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loading indicator for UI consumers: any page of a run outstanding
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_fetching
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_decodes_provider_json() {
        let raw = r#"{
            "address": "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs",
            "symbol": "USDT",
            "name": "Tether USD",
            "decimals": 6,
            "verification": "whitelisted",
            "marketStats": { "priceUsd": 1.0, "holdersCount": 1200000 },
            "imageUrl": "https://cdn.example.org/usdt.png"
        }"#;

        let entry: CatalogEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.symbol, "USDT");
        assert_eq!(entry.decimals, 6);
        assert_eq!(entry.verification_tier, VerificationTier::Whitelisted);
        assert_eq!(entry.market_stats.unwrap().holders_count, Some(1_200_000));
        assert!(entry.image_url.is_some());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let raw = r#"{"address":"a1","symbol":"AAA","name":"Alpha","decimals":9}"#;
        let entry: CatalogEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.verification_tier, VerificationTier::Unknown);
        assert!(entry.market_stats.is_none());
        assert!(!entry.is_blacklisted());
    }
}
