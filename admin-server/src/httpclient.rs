//! JSON HTTP client with retry
//!
//! Retries network errors and 5xx responses with exponential backoff
//! (base × 2ⁿ); anything else returns immediately. Used by the periodic
//! health-check task.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned status code {0}")]
    Status(u16),
    #[error("decode response: {0}")]
    Decode(String),
}

impl HttpClientError {
    /// Network errors and 5xx responses are worth retrying
    pub fn is_retriable(&self) -> bool {
        match self {
            HttpClientError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            HttpClientError::Status(code) => *code >= 500,
            HttpClientError::Decode(_) => false,
        }
    }
}

/// HTTP client with a base URL, default headers, and retry policy
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
    retries: u32,
    backoff: Duration,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            retries: 3,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Delay before retry `attempt` (0-based): backoff × 2ⁿ
    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(attempt)
    }

    async fn run_with_retry<F, Fut>(&self, mut call: F) -> Result<reqwest::Response, HttpClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = match call().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() {
                        Err(HttpClientError::Status(status.as_u16()))
                    } else {
                        Ok(response)
                    }
                }
                Err(e) => Err(HttpClientError::Transport(e)),
            };

            match outcome {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retriable() && attempt < self.retries => {
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "Retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// GET returning the raw response
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, HttpClientError> {
        let url = self.url_for(path);
        self.run_with_retry(|| self.client.get(&url).send()).await
    }

    /// GET decoded as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpClientError> {
        let response = self.get(path).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| HttpClientError::Decode(e.to_string()))
    }

    /// POST a JSON body, decoded as JSON
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, HttpClientError> {
        let url = self.url_for(path);
        let response = self
            .run_with_retry(|| self.client.post(&url).json(body).send())
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| HttpClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let client = HttpClient::new("http://localhost").with_backoff(Duration::from_millis(200));
        assert_eq!(client.backoff_for(0), Duration::from_millis(200));
        assert_eq!(client.backoff_for(1), Duration::from_millis(400));
        assert_eq!(client.backoff_for(2), Duration::from_millis(800));
    }

    #[test]
    fn test_status_retriability() {
        assert!(HttpClientError::Status(500).is_retriable());
        assert!(HttpClientError::Status(503).is_retriable());
        assert!(!HttpClientError::Status(404).is_retriable());
        assert!(!HttpClientError::Decode("x".into()).is_retriable());
    }

    #[test]
    fn test_url_join() {
        let client = HttpClient::new("http://localhost:8080");
        assert_eq!(client.url_for("/health"), "http://localhost:8080/health");
    }
}
