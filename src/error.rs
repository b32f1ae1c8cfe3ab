//! Error handling for the price watch client

use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for the price watch client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Local filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The product API answered with a non-success status
    #[error("API error {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        /// HTTP status code
        status: u16,
        /// `message` field of the JSON error body, when present
        message: Option<String>,
    },

    /// Input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// The stored session cannot be used as-is
    #[error("Session error: {0}")]
    Session(String),

    /// Persisted key-value storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Navigation errors
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation finished after its controller was torn down
    #[error("result discarded: controller is no longer active")]
    Detached,
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new session error
    pub fn session<T: fmt::Display>(msg: T) -> Self {
        Error::Session(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new navigation error
    pub fn navigation<T: fmt::Display>(msg: T) -> Self {
        Error::Navigation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// HTTP status of an API rejection, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Render the error as the single line shown to the user.
    ///
    /// `action` completes the sentence "could not ...". Server-provided
    /// messages are only used when `prefer_server_message` is set.
    pub fn user_message(&self, action: &str, prefer_server_message: bool) -> String {
        match self {
            Error::Api {
                message: Some(message),
                ..
            } if prefer_server_message && !message.trim().is_empty() => message.clone(),
            Error::Api { status, .. } => format!("Error {}: could not {}.", status, action),
            Error::Validation(message) => message.clone(),
            Error::Session(_) => format!(
                "Your session is no longer valid: could not {}. Please log in again.",
                action
            ),
            Error::Json(_) => format!(
                "Unexpected response from the product service: could not {}.",
                action
            ),
            _ => format!("Network error: could not {}.", action),
        }
    }
}
