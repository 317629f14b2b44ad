//! Error types for the subscriber session

use thiserror::Error;

/// Subscriber session errors
///
/// Every variant is local to the operation that produced it. The session
/// stays usable after any of them.
#[derive(Debug, Error)]
pub enum Error {
    /// No leader could be resolved from the coordinator
    #[error("Coordinator unreachable: {0}")]
    CoordinatorUnreachable(String),

    /// A leader is not known or did not answer
    #[error("Leader unavailable: {0}")]
    LeaderUnavailable(String),

    /// The broker rejected the request because this subscriber is not registered with it
    #[error("Subscriber is not registered with the current leader")]
    NotRegistered,

    #[error("Subscription to '{topic}' failed: {reason}")]
    SubscriptionFailed { topic: String, reason: String },

    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for subscriber session operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_subscription_failed() {
        let err = Error::SubscriptionFailed {
            topic: "weather".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Subscription to 'weather' failed: connection refused"
        );
    }

    #[test]
    fn test_error_display_not_registered() {
        assert_eq!(
            Error::NotRegistered.to_string(),
            "Subscriber is not registered with the current leader"
        );
    }
}
