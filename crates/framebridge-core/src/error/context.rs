//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Error context attached to log lines for failed queries.

use std::fmt;

/// Error context for logging and monitoring
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub error_type: &'static str,
    pub retryable: bool,
    pub transient: bool,
    pub permanent: bool,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ErrorContext {{ type: {}, retryable: {}, transient: {}, permanent: {} }}",
            self.error_type, self.retryable, self.transient, self.permanent
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::error::BridgeError;

    #[test]
    fn test_context_display() {
        let rendered = BridgeError::authentication("rejected").context().to_string();
        assert!(rendered.contains("type: Authentication"));
        assert!(rendered.contains("permanent: true"));
    }

    #[test]
    fn test_context_classifies_transient_failures() {
        let context = BridgeError::timeout("slow backend").context();
        assert_eq!(context.error_type, "Timeout");
        assert!(context.retryable);
        assert!(context.transient);
        assert!(!context.permanent);

        let context = BridgeError::cancelled("stopped").context();
        assert!(!context.retryable);
        assert!(context.transient);
    }
}
