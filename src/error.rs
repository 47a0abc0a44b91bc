// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A listing page could not be fetched or decoded
    #[error("Competition listing unavailable at page {page}: {reason}")]
    ListingUnavailable { page: u32, reason: String },

    /// A competition detail could not be turned into a record
    #[error("Malformed detail for {id}: {reason}")]
    MalformedDetail { id: String, reason: String },

    /// Membership directory lookup failed
    #[error("Directory error: {0}")]
    Directory(String),

    /// Notification delivery failed
    #[error("Notification error: {0}")]
    Notify(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a listing error for the given page.
    pub fn listing(page: u32, reason: impl fmt::Display) -> Self {
        Self::ListingUnavailable {
            page,
            reason: reason.to_string(),
        }
    }

    /// Create a malformed-detail error.
    pub fn malformed(id: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::MalformedDetail {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a directory error.
    pub fn directory(message: impl fmt::Display) -> Self {
        Self::Directory(message.to_string())
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }
}
