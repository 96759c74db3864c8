use serde::Deserialize;

/// Main configuration structure for Freshlist
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub client: ClientConfig,
    pub output: OutputConfig,
}

/// Search feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the marketplace search feed (category path included)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Search keywords
    pub query: String,

    /// Minimum price filter, in whole currency units
    #[serde(rename = "min-price")]
    pub min_price: u32,

    /// Number of listings requested per result page
    #[serde(rename = "page-size")]
    pub page_size: u32,
}

/// HTTP client behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum number of item detail fetches in flight for one result page
    #[serde(rename = "max-concurrent-items", default = "default_max_concurrent_items")]
    pub max_concurrent_items: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite ledger of already-seen items
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,

    /// Directory receiving one CSV export per run
    #[serde(rename = "export-dir")]
    pub export_dir: String,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_concurrent_items() -> u32 {
    4
}
