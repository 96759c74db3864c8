//! HTTP fetcher
//!
//! All network requests go through this module: building the shared client
//! with the configured identity and timeouts, and classifying the outcome
//! of a single GET so callers can decide between fatal and degraded paths.

use crate::config::ClientConfig;
use reqwest::Client;
use std::time::Duration;

/// Result of a single fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response with its body
    Success {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Response arrived with a non-success status
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// Transport-level failure (connection refused, timeout, TLS)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds the HTTP client used for search, detail and description fetches
///
/// # Arguments
///
/// * `config` - The HTTP client configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// The caller decides what a failure means: a non-success status on the
/// search page is fatal for the run, while the same status on an item
/// detail page only degrades that one record.
pub async fn fetch_url(client: &Client, url: &str) -> FetchOutcome {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();

            if !status.is_success() {
                return FetchOutcome::HttpError {
                    status: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchOutcome::Success {
                    status: status.as_u16(),
                    body,
                },
                Err(e) => FetchOutcome::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                "request timeout".to_string()
            } else if e.is_connect() {
                "connection refused".to_string()
            } else {
                e.to_string()
            };
            FetchOutcome::NetworkError { error }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> ClientConfig {
        ClientConfig {
            user_agent: "freshlist-test/1.0".to_string(),
            request_timeout_secs: 30,
            max_concurrent_items: 4,
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        assert!(build_http_client(&config).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_network_error() {
        let config = create_test_config();
        let client = build_http_client(&config).unwrap();

        // Port 9 on localhost is the discard port; nothing listens there.
        let outcome = fetch_url(&client, "http://127.0.0.1:9/").await;
        assert!(matches!(outcome, FetchOutcome::NetworkError { .. }));
    }
}
