//! Error handling for the dashboard
//!
//! This module defines custom error types and a Result alias for use
//! throughout the application.

use thiserror::Error;

/// Main error type for dashboard operations
#[derive(Error, Debug)]
pub enum DashError {
    /// Errors talking to the telemetry endpoint
    #[error("HTTP error: {0}")]
    Http(String),

    /// The payload parsed but does not have the expected shape
    #[error("Payload error: {0}")]
    Payload(String),

    /// The payload is not valid JSON for the expected schema
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// The push stream is not connected
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Timeout errors
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DashError>,
    },
}

impl DashError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DashError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an HTTP error from a ureq error
    pub fn from_ureq_error(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => {
                DashError::Http(format!("server returned status {}", status))
            }
            ureq::Error::Timeout(_) => DashError::Timeout(err.to_string()),
            other => DashError::Http(other.to_string()),
        }
    }
}

impl From<ureq::Error> for DashError {
    fn from(err: ureq::Error) -> Self {
        DashError::from_ureq_error(err)
    }
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
