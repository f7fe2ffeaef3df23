//! Error type definitions.
//!
//! `LinkbackError` is the taxonomy visible to callers of the pipeline; the
//! other enums cover initialization and store failures. Outbound senders never
//! surface errors (failures are logged and swallowed); inbound handlers map
//! each variant to the protocol-appropriate wire response.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Errors surfaced by the backlink pipeline.
#[derive(Error, Debug)]
pub enum LinkbackError {
    /// The remote resource could not be fetched (timeout, connection refused,
    /// TLS failure).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// URL the fetch was issued against.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The remote server answered with a status the caller requires to be 2xx.
    #[error("unexpected HTTP status {status} from {url}")]
    Http {
        /// URL the request was issued against.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The target URL does not resolve to locally owned content.
    #[error("target does not resolve to local content: {0}")]
    UnresolvableTarget(String),

    /// The source document does not reference the claimed target. Guards
    /// against spam pings naming arbitrary content.
    #[error("source does not reference the target: {0}")]
    UnconfirmedBacklink(String),

    /// The resolved author profile URL is owned by a local account. Rejected
    /// outright so a remote page cannot impersonate a local user.
    #[error("author profile URL belongs to a local account: {0}")]
    LocalActorConflict(String),

    /// The mention record could not be persisted.
    #[error("failed to persist mention from {url}: {message}")]
    Persistence {
        /// Source URL of the mention that failed to persist.
        url: String,
        /// Store-reported failure detail.
        message: String,
    },
}

impl LinkbackError {
    /// Whether the error is the remote sender's fault (client error) rather
    /// than a local failure. Inbound handlers use this to pick 4xx vs 5xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LinkbackError::UnresolvableTarget(_)
                | LinkbackError::UnconfirmedBacklink(_)
                | LinkbackError::LocalActorConflict(_)
        )
    }
}

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

/// Counter categories for pipeline statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// Fetch failed at the network layer
    FetchNetworkError,
    /// Fetch returned an unacceptable HTTP status
    FetchStatusError,
    /// Inbound target did not resolve to local content
    TargetUnresolvable,
    /// Inbound source did not reference the target
    BacklinkUnconfirmed,
    /// Author resolution collided with a local account
    ActorConflict,
    /// Mention record failed to persist
    PersistenceFailure,
    /// Outbound delivery failed (logged, never raised)
    OutboundDeliveryFailure,
    /// Remote XML-RPC endpoint returned a fault
    XmlRpcFault,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::FetchNetworkError => "Fetch network error",
            ErrorType::FetchStatusError => "Fetch status error",
            ErrorType::TargetUnresolvable => "Target unresolvable",
            ErrorType::BacklinkUnconfirmed => "Backlink unconfirmed",
            ErrorType::ActorConflict => "Local actor conflict",
            ErrorType::PersistenceFailure => "Persistence failure",
            ErrorType::OutboundDeliveryFailure => "Outbound delivery failure",
            ErrorType::XmlRpcFault => "XML-RPC fault",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_as_str() {
        assert_eq!(
            ErrorType::FetchNetworkError.as_str(),
            "Fetch network error"
        );
        assert_eq!(ErrorType::ActorConflict.as_str(), "Local actor conflict");
    }

    #[test]
    fn test_all_error_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(
                !error_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                error_type
            );
        }
    }

    #[test]
    fn test_client_error_classification() {
        assert!(LinkbackError::UnresolvableTarget("x".into()).is_client_error());
        assert!(LinkbackError::UnconfirmedBacklink("x".into()).is_client_error());
        assert!(LinkbackError::LocalActorConflict("x".into()).is_client_error());
        assert!(!LinkbackError::Persistence {
            url: "x".into(),
            message: "y".into()
        }
        .is_client_error());
        assert!(!LinkbackError::Http {
            url: "x".into(),
            status: 502
        }
        .is_client_error());
    }
}
