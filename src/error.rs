//! Error types and handling for Velarium
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Velarium operations
pub type Result<T> = std::result::Result<T, VelariumError>;

/// Main error type for Velarium
#[derive(Debug, Error)]
pub enum VelariumError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Authentication/session errors against the remote store
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Remote store read/write errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// Change-subscription stream errors
    #[error("Subscription error: {message}")]
    Subscription { message: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl VelariumError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        VelariumError::Config {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        VelariumError::Auth {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        VelariumError::Store {
            message: message.into(),
        }
    }

    /// Create a new subscription error
    pub fn subscription<S: Into<String>>(message: S) -> Self {
        VelariumError::Subscription {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        VelariumError::Web {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        VelariumError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        VelariumError::Network {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        VelariumError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        VelariumError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for VelariumError {
    fn from(err: std::io::Error) -> Self {
        VelariumError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for VelariumError {
    fn from(err: serde_yaml::Error) -> Self {
        VelariumError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for VelariumError {
    fn from(err: serde_json::Error) -> Self {
        VelariumError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for VelariumError {
    fn from(err: reqwest::Error) -> Self {
        VelariumError::network(err.to_string())
    }
}
