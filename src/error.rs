// src/error.rs

//! Unified error handling for the scraping engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for engine operations.
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

    /// The login page did not expose a login token
    #[error("Login token not found on login page")]
    LoginTokenNotFound,

    /// An authenticated page did not expose a sesskey
    #[error("Session key not found")]
    SessionKeyNotFound,

    /// The portal bounced the request back to the login page
    #[error("Session expired or invalid cookies, login again")]
    SessionExpired,

    /// Every candidate listing page redirected to the login form
    #[error("No authenticated page found, all candidate URLs bounce to login")]
    NoAuthenticatedPage,

    /// Expected markup was missing or unparsable
    #[error("Scrape error for {context}: {message}")]
    Scrape { context: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a scrape error with context.
    pub fn scrape(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Scrape {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error means the cookie jar must be refreshed by the
    /// caller before retrying.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired | Self::SessionKeyNotFound | Self::NoAuthenticatedPage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_reauth() {
        assert!(AppError::SessionExpired.needs_reauth());
        assert!(AppError::SessionKeyNotFound.needs_reauth());
        assert!(!AppError::LoginTokenNotFound.needs_reauth());
        assert!(!AppError::scrape("calendar", "missing wrapper").needs_reauth());
    }
}
