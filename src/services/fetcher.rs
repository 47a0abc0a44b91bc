// src/services/fetcher.rs

//! Retrying JSON fetcher.
//!
//! Every URL gets a fixed number of attempts. After each attempt, whether it
//! succeeded or not, the fetcher pauses for a flat delay so the registry is
//! never hit faster than one request per delay.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;

use crate::error::Result;
use crate::models::ApiConfig;
use crate::utils::http::{create_async_client, is_json_content_type, looks_like_html};

/// Why a single attempt was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Connection, TLS, timeout or body read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx status
    #[error("unexpected status {0}")]
    Status(u16),

    /// Response is not JSON (content type or HTML body)
    #[error("non-JSON response ({0})")]
    ContentType(String),

    /// Body claimed to be JSON but did not parse
    #[error("unparsable body: {0}")]
    Body(String),
}

/// All attempts for a URL were rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{url} failed after {attempts} attempt(s): {last_error}")]
pub struct FetchFailure {
    pub url: String,
    pub attempts: u32,
    pub last_error: AttemptError,
}

/// JSON GET with a fixed attempt budget and a flat post-attempt delay.
#[derive(Debug, Clone)]
pub struct ResilientFetcher {
    client: reqwest::Client,
    max_attempts: u32,
    delay: Duration,
}

impl ResilientFetcher {
    /// At least one attempt is always made.
    pub fn new(client: reqwest::Client, max_attempts: u32, delay: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        Ok(Self::new(client, config.max_attempts, config.retry_delay()))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fetch `url` and parse it as JSON.
    ///
    /// Returns the first successfully parsed body, or a [`FetchFailure`]
    /// carrying the last rejection once every attempt has been used.
    pub async fn fetch_json(&self, url: &str) -> std::result::Result<Value, FetchFailure> {
        let mut last_error = AttemptError::Transport("no attempt made".to_string());

        for attempt in 1..=self.max_attempts {
            let outcome = self.attempt(url, attempt).await;

            if !self.delay.is_zero() {
                log::debug!("Throttling for {}ms", self.delay.as_millis());
                tokio::time::sleep(self.delay).await;
            }

            match outcome {
                Ok(value) => return Ok(value),
                Err(error) => {
                    log::warn!(
                        "[{}/{}] {} rejected: {}",
                        attempt,
                        self.max_attempts,
                        url,
                        error
                    );
                    last_error = error;
                }
            }
        }

        Err(FetchFailure {
            url: url.to_string(),
            attempts: self.max_attempts,
            last_error,
        })
    }

    /// `[attempt/max] url -> outcome`, logged once per attempt.
    fn attempt_line(&self, attempt: u32, url: &str, outcome: &str) -> String {
        format!("[{}/{}] {} -> {}", attempt, self.max_attempts, url, outcome)
    }

    /// One GET, validated for status, content type and JSON body.
    async fn attempt(&self, url: &str, attempt: u32) -> std::result::Result<Value, AttemptError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = AttemptError::Transport(e.to_string());
                log::info!("{}", self.attempt_line(attempt, url, &error.to_string()));
                return Err(error);
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        log::info!(
            "{}",
            self.attempt_line(
                attempt,
                url,
                &format!("{} ({})", status.as_u16(), content_type)
            )
        );

        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }
        if !is_json_content_type(&content_type) || looks_like_html(&body) {
            return Err(AttemptError::ContentType(content_type));
        }

        serde_json::from_str(&body).map_err(|e| AttemptError::Body(e.to_string()))
    }
}
