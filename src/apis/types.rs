/// Wire types for the catalog and holdings endpoints
use serde::{Deserialize, Serialize};

use crate::catalog::types::{CatalogEntry, VerificationTier};
use crate::holdings::types::Holding;

/// One `GET /catalog` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page index
    pub page: u32,
    pub size: u32,
    pub verification: Vec<VerificationTier>,
}

impl PageRequest {
    /// Query pairs in provider order: page, size, then one `verification[]` per tier
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        pairs.extend(
            self.verification
                .iter()
                .map(|tier| ("verification[]", tier.as_str().to_string())),
        );
        pairs
    }
}

/// `GET /catalog` response body
///
/// `has_more` and `total` are not trusted blindly; the loading coordinator
/// applies its own heuristics on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPageResponse {
    #[serde(default)]
    pub data: Vec<CatalogEntry>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub total: Option<u64>,
}

/// `GET /accounts/{address}/holdings` response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldingsResponse {
    #[serde(default)]
    pub items: Vec<Holding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs() {
        let request = PageRequest {
            page: 2,
            size: 100,
            verification: vec![VerificationTier::Whitelisted, VerificationTier::Community],
        };
        let pairs = request.query_pairs();
        assert_eq!(pairs[0], ("page", "2".to_string()));
        assert_eq!(pairs[1], ("size", "100".to_string()));
        assert_eq!(pairs[2], ("verification[]", "whitelisted".to_string()));
        assert_eq!(pairs[3], ("verification[]", "community".to_string()));
    }

    #[test]
    fn test_page_response_decodes() {
        let raw = r#"{
            "data": [{"address":"a1","symbol":"TON","name":"Toncoin","decimals":9}],
            "hasMore": true,
            "total": 2731
        }"#;
        let page: CatalogPageResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.has_more);
        assert_eq!(page.total, Some(2731));
    }
}
