//! Freshlist: an incremental marketplace listing harvester
//!
//! This crate walks a paginated search feed newest-first, enriches every
//! listing it has not collected before with detail-page data, and remembers
//! what it has seen in a durable ledger so repeated runs only pick up newly
//! posted items.

pub mod config;
pub mod crawler;
pub mod export;
pub mod ledger;
pub mod url;

use thiserror::Error;

/// Main error type for Freshlist operations
#[derive(Debug, Error)]
pub enum FreshlistError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Search page fetch failed for {url}: HTTP {status}")]
    SearchFetch { url: String, status: u16 },

    #[error("Search page unreachable at {url}: {message}")]
    SearchUnreachable { url: String, message: String },

    #[error("Malformed search page at {url}: {message}")]
    PageStructure { url: String, message: String },

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Export error: {0}")]
    Export(#[from] export::ExportError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL has no item path segment: {0}")]
    MissingItemSegment(String),
}

/// Result type alias for Freshlist operations
pub type Result<T> = std::result::Result<T, FreshlistError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, Controller, ItemRecord, RunReport};
pub use ledger::{Ledger, LedgerEntry, SqliteLedger};
pub use self::url::{canonical_listing_url, derive_item_id};
