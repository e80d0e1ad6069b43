use crate::catalog::types::VerificationTier;
use crate::config_struct;

// ============================================================================
// API CONFIGURATION
// ============================================================================

config_struct! {
    /// Remote provider settings shared by the catalog and holdings endpoints
    pub struct ApiConfig {
        /// Base URL of the provider, e.g. "https://api.example.org/v1"
        base_url: String = String::new(),

        /// Per-request timeout
        timeout_secs: u64 = 10,

        /// Client-side request budget (0 disables spacing)
        max_requests_per_minute: usize = 120,

        /// Verification tiers requested from the catalog (`verification[]` query values)
        verification: Vec<VerificationTier> = vec![
            VerificationTier::Whitelisted,
            VerificationTier::Community,
            VerificationTier::Unknown,
        ],
    }
}
