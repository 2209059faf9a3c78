//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Error types for the framebridge query bridge
//!
//! Every failure that can be attached to a query response is a [`BridgeError`].
//! Value coercion never produces one; odd cells degrade to strings or zero.

use std::error::Error as StdError;
use thiserror::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Main error type for the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Missing or malformed settings (e.g. no host and no default host)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Credentials rejected by a backend
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Backend unreachable or transport failure
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Backend accepted the connection but failed the query
    #[error("Query error: {message}")]
    Query {
        message: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// The batch was cancelled before the query completed
    #[error("Query cancelled: {message}")]
    Cancelled { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout {
        message: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Data validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Internal errors, including panics recovered at the batch boundary
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl BridgeError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        BridgeError::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        BridgeError::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        BridgeError::Authentication {
            message: message.into(),
            source: None,
        }
    }

    /// Create an authentication error with source
    pub fn authentication_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        BridgeError::Authentication {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        BridgeError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error with source
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        BridgeError::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        BridgeError::Query {
            message: message.into(),
            source: None,
        }
    }

    /// Create a query error with source
    pub fn query_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        BridgeError::Query {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(message: impl Into<String>) -> Self {
        BridgeError::Cancelled {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        BridgeError::Timeout {
            message: message.into(),
            source: None,
        }
    }

    /// Create a timeout error with source
    pub fn timeout_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        BridgeError::Timeout {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        BridgeError::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a validation error with source
    pub fn validation_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        BridgeError::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        BridgeError::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// Create a serialization error with source
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        BridgeError::Serialization {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        BridgeError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error with source
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        BridgeError::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            BridgeError::Configuration { message, .. }
            | BridgeError::Authentication { message, .. }
            | BridgeError::Connection { message, .. }
            | BridgeError::Query { message, .. }
            | BridgeError::Cancelled { message }
            | BridgeError::Timeout { message, .. }
            | BridgeError::Validation { message, .. }
            | BridgeError::Serialization { message, .. }
            | BridgeError::Internal { message, .. } => message,
        }
    }

    /// Check if the error is retryable by the caller.
    ///
    /// The bridge itself never retries; this is advice for whoever wraps it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Connection { .. } | BridgeError::Timeout { .. }
        )
    }

    /// Check if the error is transient
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BridgeError::Connection { .. }
                | BridgeError::Timeout { .. }
                | BridgeError::Cancelled { .. }
        )
    }

    /// Check if the error is permanent
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            BridgeError::Configuration { .. }
                | BridgeError::Validation { .. }
                | BridgeError::Authentication { .. }
        )
    }

    /// Get error context for logging
    pub fn context(&self) -> crate::error::ErrorContext {
        crate::error::ErrorContext {
            error_type: self.error_type(),
            retryable: self.is_retryable(),
            transient: self.is_transient(),
            permanent: self.is_permanent(),
        }
    }

    /// Get the error type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            BridgeError::Configuration { .. } => "Configuration",
            BridgeError::Authentication { .. } => "Authentication",
            BridgeError::Connection { .. } => "Connection",
            BridgeError::Query { .. } => "Query",
            BridgeError::Cancelled { .. } => "Cancelled",
            BridgeError::Timeout { .. } => "Timeout",
            BridgeError::Validation { .. } => "Validation",
            BridgeError::Serialization { .. } => "Serialization",
            BridgeError::Internal { .. } => "Internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = BridgeError::configuration("no host supplied for connection");
        assert!(matches!(config_err, BridgeError::Configuration { .. }));
        assert!(!config_err.is_retryable());
        assert!(config_err.is_permanent());

        let conn_err = BridgeError::connection("connection refused");
        assert!(matches!(conn_err, BridgeError::Connection { .. }));
        assert!(conn_err.is_retryable());
        assert!(conn_err.is_transient());
    }

    #[test]
    fn test_error_context() {
        let err = BridgeError::timeout("Operation timed out");
        let context = err.context();
        assert_eq!(context.error_type, "Timeout");
        assert!(context.retryable);
        assert!(context.transient);
        assert!(!context.permanent);
    }

    #[test]
    fn test_auth_and_config_are_distinct() {
        let auth = BridgeError::authentication("bad password");
        let config = BridgeError::configuration("missing host");
        assert_ne!(auth.error_type(), config.error_type());
        assert_eq!(auth.message(), "bad password");
        assert_eq!(config.to_string(), "Configuration error: missing host");
    }

    #[test]
    fn test_cancelled_is_not_retryable() {
        let err = BridgeError::cancelled("batch cancelled");
        assert!(!err.is_retryable());
        assert!(err.is_transient());
        assert_eq!(err.error_type(), "Cancelled");
    }
}
