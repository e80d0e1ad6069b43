/// Structured error handling for the catalog cache
///
/// Branching on provider signals happens on enums, never on message text:
/// the HTTP layer produces [`ApiError`] with the status attached, the retry
/// layer classifies it with [`ApiError::class`] and surfaces [`FetchError`].
/// Every type is `Clone` because single-flight hands one result to many waiters.
use thiserror::Error;

// =============================================================================
// API ERRORS - transport level
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP {status} from {endpoint}: {}", .body.as_deref().unwrap_or("No body"))]
    Status {
        endpoint: String,
        status: u16,
        body: Option<String>,
    },

    #[error("Request to {endpoint} timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    #[error("Network error talking to {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

/// How the retry layer should react to an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network failure, timeout or 5xx: retry after a fixed delay
    Transient,
    /// Provider says the page is past the end (422/416): success with no items
    EndOfData,
    /// 429: pause and retry without spending the retry budget
    RateLimited,
    /// Anything else: give up immediately
    Fatal,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Status { endpoint, .. }
            | ApiError::Timeout { endpoint, .. }
            | ApiError::Network { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => endpoint,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::Status { status, .. } => match *status {
                416 | 422 => ErrorClass::EndOfData,
                429 => ErrorClass::RateLimited,
                408 | 500..=599 => ErrorClass::Transient,
                _ => ErrorClass::Fatal,
            },
            ApiError::Timeout { .. } | ApiError::Network { .. } => ErrorClass::Transient,
            ApiError::Decode { .. } => ErrorClass::Fatal,
        }
    }
}

// =============================================================================
// FETCH ERRORS - what the fetcher surfaces after retries
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid page {page}: pages are 1-based")]
    InvalidPage { page: u32 },

    #[error("{key}: giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        key: String,
        attempts: u32,
        source: ApiError,
    },

    #[error("{key}: non-retriable error: {source}")]
    NonRetriable { key: String, source: ApiError },

    #[error("{key}: still rate limited after {pauses} pauses")]
    RateLimited { key: String, pauses: u32 },
}

impl FetchError {
    /// Request key the failure belongs to (`page:<n>`, `holdings:<address>`, ...)
    pub fn key(&self) -> String {
        match self {
            FetchError::InvalidPage { page } => format!("page:{}", page),
            FetchError::RetriesExhausted { key, .. }
            | FetchError::NonRetriable { key, .. }
            | FetchError::RateLimited { key, .. } => key.clone(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }

    /// Underlying provider error, when there was one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            FetchError::RetriesExhausted { source, .. } | FetchError::NonRetriable { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

// =============================================================================
// CONFIGURATION ERRORS
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Missing config field '{field}'")]
    Missing { field: String },

    #[error("Invalid config field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}
