//! Error types for the checkout core.

/// Boxed error, used where a delegate failure wraps another library's error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by an earn-pool delegate.
///
/// The `Display` form is what checkout surfaces to callers, so each variant
/// renders a complete human-readable message on its own.
#[derive(Debug, thiserror::Error)]
pub enum EarnPoolError {
    /// The pool rejected or failed the operation and said why.
    ///
    /// The message is forwarded verbatim to the caller.
    #[error("{0}")]
    Pool(String),

    /// The delegate could not be reached or timed out.
    #[error("earn pool unreachable during {context}")]
    Transport {
        /// Operation being performed when the failure occurred.
        context: &'static str,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },

    /// The delegate answered, but not with a receipt.
    #[error("invalid earn pool response during {context}")]
    InvalidResponse {
        /// Operation being performed when the failure occurred.
        context: &'static str,
        /// Underlying decode error.
        #[source]
        source: BoxError,
    },

    /// The delegate answered an error status without a usable message.
    #[error("earn pool returned HTTP {status} during {context}")]
    HttpStatus {
        /// Operation being performed when the failure occurred.
        context: &'static str,
        /// Status code the delegate returned.
        status: u16,
    },
}

impl EarnPoolError {
    /// A pool-reported failure whose message surfaces to the caller.
    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_displays_message_verbatim() {
        let err = EarnPoolError::pool("pool full");
        assert_eq!(err.to_string(), "pool full");
    }

    #[test]
    fn test_structural_errors_name_the_operation() {
        let err = EarnPoolError::HttpStatus {
            context: "deposit",
            status: 503,
        };
        assert_eq!(err.to_string(), "earn pool returned HTTP 503 during deposit");

        let err = EarnPoolError::Transport {
            context: "withdraw",
            source: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "earn pool unreachable during withdraw");
        assert!(std::error::Error::source(&err).is_some());
    }
}
