//! Structured, tagged logging for the catalog cache
//!
//! This module provides a small, ergonomic logging API on top of the `log`
//! facade:
//! - Standard log levels (Error/Warning/Info/Debug)
//! - One [`LogTag`] per component, mapped to a `log` target for filtering
//! - Optional colored console backend (`logging` feature, `env_logger`)
//!
//! ## Usage
//!
//! ```rust
//! use token_catalog::logger::{self, LogTag};
//!
//! logger::error(LogTag::Fetcher, "page:3 failed after 3 attempts");
//! logger::warning(LogTag::Catalog, "duplicate address in page");
//! logger::info(LogTag::Loader, "loading run finished");
//! logger::debug(LogTag::Api, "GET /catalog?page=1&size=100");
//! ```
//!
//! ## Initialization
//!
//! Applications call [`init`] once at startup; libraries embedding the cache
//! can install any other `log` backend instead. Filtering follows `RUST_LOG`,
//! e.g. `RUST_LOG=info,fetcher=debug`.

mod core;
#[cfg(feature = "logging")]
mod format;
mod levels;
mod tags;

pub use levels::LogLevel;
pub use tags::LogTag;

/// Install the colored console backend
///
/// Defaults to `info` when `RUST_LOG` is unset. Calling it again, or after
/// another backend was installed, is a no-op.
#[cfg(feature = "logging")]
pub fn init() {
    static INITIALIZED: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();

    INITIALIZED.get_or_init(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format(format::format_record)
            .try_init();
    });
}

/// Log at ERROR level (failures surfaced to callers)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (recoverable anomalies)
///
/// # Example
/// ```rust
/// use token_catalog::logger::{self, LogTag};
/// logger::warning(LogTag::Governor, "full page reported as last page; continuing");
/// ```
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (run lifecycle)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (per-request detail)
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}
