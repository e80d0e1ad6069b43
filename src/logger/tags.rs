/// Log tags: one per cache component
///
/// Each tag maps to a `log` target, so `RUST_LOG=fetcher=debug,loader=info`
/// filters per component the same way `--debug-<module>` flags would.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    Catalog,
    Fetcher,
    Loader,
    Governor,
    Holdings,
    Api,
    Config,
}

impl LogTag {
    pub const ALL: [LogTag; 7] = [
        LogTag::Catalog,
        LogTag::Fetcher,
        LogTag::Loader,
        LogTag::Governor,
        LogTag::Holdings,
        LogTag::Api,
        LogTag::Config,
    ];

    /// `log` target used for records with this tag
    pub fn target(&self) -> &'static str {
        match self {
            LogTag::Catalog => "catalog",
            LogTag::Fetcher => "fetcher",
            LogTag::Loader => "loader",
            LogTag::Governor => "governor",
            LogTag::Holdings => "holdings",
            LogTag::Api => "api",
            LogTag::Config => "config",
        }
    }

    /// Short upper-case label for console output
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::Catalog => "CATALOG",
            LogTag::Fetcher => "FETCH",
            LogTag::Loader => "LOADER",
            LogTag::Governor => "GOVERNOR",
            LogTag::Holdings => "HOLDINGS",
            LogTag::Api => "API",
            LogTag::Config => "CONFIG",
        }
    }

    pub fn from_target(target: &str) -> Option<LogTag> {
        LogTag::ALL.iter().copied().find(|tag| tag.target() == target)
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
