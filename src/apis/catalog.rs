/// HTTP client for the token catalog provider
///
/// Endpoints implemented:
/// 1. /catalog?page&size&verification[] - One page of the catalog (max 100 per page)
/// 2. /catalog/{address} - Single catalog entry
/// 3. /accounts/{address}/holdings - Token balances of a wallet
///
/// Every request goes through the shared [`RateLimiter`]. Status codes are kept
/// on the error so the retry layer can classify them.
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::client::{HttpClient, RateLimiter};
use super::types::{CatalogPageResponse, HoldingsResponse, PageRequest};
use super::{CatalogApi, HoldingsApi};
use crate::catalog::types::CatalogEntry;
use crate::config::CatalogConfig;
use crate::errors::{ApiError, ConfigError};
use crate::holdings::types::Holding;
use crate::logger::{self, LogTag};

/// Longest response body kept on an error
const MAX_ERROR_BODY_LEN: usize = 512;

pub struct HttpCatalogClient {
    http: HttpClient,
    rate_limiter: RateLimiter,
    base_url: url::Url,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, ConfigError> {
        let mut base_url = config.api_base_url()?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: HttpClient::new(config.api.timeout_secs)?,
            rate_limiter: RateLimiter::new(config.api.max_requests_per_minute),
            base_url,
        })
    }

    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Result<url::Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Network {
                endpoint: segments.join("/"),
                message: format!("Base URL {} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let endpoint = url.path().to_string();

        let guard = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|message| ApiError::Network {
                endpoint: endpoint.clone(),
                message,
            })?;

        logger::debug(LogTag::Api, &format!("GET {} {:?}", endpoint, query));

        let response = self
            .http
            .client()
            .get(url)
            .query(query)
            .timeout(self.http.timeout())
            .send()
            .await
            .map_err(|e| self.transport_error(&endpoint, e))?;

        drop(guard);

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok().filter(|b| !b.is_empty()).map(|mut b| {
                if b.len() > MAX_ERROR_BODY_LEN {
                    let mut cut = MAX_ERROR_BODY_LEN;
                    while !b.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    b.truncate(cut);
                }
                b
            });
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&endpoint, e))?;

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            endpoint,
            message: e.to_string(),
        })
    }

    fn transport_error(&self, endpoint: &str, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms: self.http.timeout().as_millis() as u64,
            }
        } else {
            ApiError::Network {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<CatalogPageResponse, ApiError> {
        self.get_json(&["catalog"], &request.query_pairs()).await
    }

    async fn fetch_entry(&self, address: &str) -> Result<CatalogEntry, ApiError> {
        self.get_json(&["catalog", address], &[]).await
    }
}

#[async_trait]
impl HoldingsApi for HttpCatalogClient {
    async fn fetch_holdings(&self, address: &str) -> Result<Vec<Holding>, ApiError> {
        let response: HoldingsResponse = self
            .get_json(&["accounts", address, "holdings"], &[])
            .await?;
        Ok(response.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> CatalogConfig {
        let mut config = CatalogConfig::default();
        config.api.base_url = base_url.to_string();
        config
    }

    #[test]
    fn test_requires_base_url() {
        assert!(matches!(
            HttpCatalogClient::new(&CatalogConfig::default()),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let client = HttpCatalogClient::new(&config("https://api.example.org/v1")).unwrap();
        assert_eq!(
            client.endpoint(&["catalog"]).unwrap().as_str(),
            "https://api.example.org/v1/catalog"
        );
        assert_eq!(
            client.endpoint(&["accounts", "EQabc", "holdings"]).unwrap().as_str(),
            "https://api.example.org/v1/accounts/EQabc/holdings"
        );

        let bare = HttpCatalogClient::new(&config("https://api.example.org")).unwrap();
        assert_eq!(
            bare.endpoint(&["catalog"]).unwrap().as_str(),
            "https://api.example.org/catalog"
        );
    }

    #[test]
    fn test_addresses_stay_one_path_segment() {
        let client = HttpCatalogClient::new(&config("https://api.example.org/v1/")).unwrap();

        let url = client.endpoint(&["accounts", "EQAB/cd+ef", "holdings"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.org/v1/accounts/EQAB%2Fcd+ef/holdings");
        assert_eq!(url.path_segments().unwrap().count(), 4);

        let url = client.endpoint(&["catalog", "EQx?admin=1#top"]).unwrap();
        assert_eq!(url.path(), "/v1/catalog/EQx%3Fadmin=1%23top");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transient() {
        let client = HttpCatalogClient::new(&config("http://127.0.0.1:9/")).unwrap();
        let request = PageRequest {
            page: 1,
            size: 100,
            verification: Vec::new(),
        };
        let err = client.fetch_page(&request).await.unwrap_err();
        assert_eq!(err.class(), crate::errors::ErrorClass::Transient);
    }
}
