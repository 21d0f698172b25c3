//! Error taxonomy for the query pipeline.
//!
//! The three failure kinds a caller must tell apart (upstream failure,
//! broken upstream contract, nothing found) stay separate variants all the
//! way out of [`crate::Aggregator::query`].

use thiserror::Error;

/// A single upstream GET failed before any payload could be normalized.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("response from {url} is not valid JSON: {source}")]
    Body {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Upstream payload did not have the shape a normalizer relies on.
///
/// This signals a provider contract change, not a transient fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{provider} payload rejected: {reason}")]
pub struct NormalizationError {
    pub provider: &'static str,
    pub reason: String,
}

impl NormalizationError {
    pub fn new(provider: &'static str, reason: impl Into<String>) -> Self {
        Self {
            provider,
            reason: reason.into(),
        }
    }

    /// A required field was absent.
    pub fn missing(provider: &'static str, field: &str) -> Self {
        Self::new(provider, format!("missing required field `{}`", field))
    }

    /// A field was present but its value could not be interpreted.
    pub fn invalid(provider: &'static str, field: &str, value: impl std::fmt::Display) -> Self {
        Self::new(provider, format!("invalid value for `{}`: {}", field, value))
    }
}

/// Error returned by the aggregator for a logical query.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("upstream unavailable: {0}")]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    /// Well-formed request with no matching data. A normal negative result.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected before any fetch; the caller must change the request.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl QueryError {
    /// Only upstream failures are worth retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(self, QueryError::Upstream(_))
    }

    /// Short machine-readable code used by the HTTP surface.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Upstream(_) => "upstream_error",
            QueryError::Normalization(_) => "normalization_error",
            QueryError::NotFound(_) => "not_found",
            QueryError::InvalidQuery(_) => "invalid_query",
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_upstream_is_transient() {
        let upstream = QueryError::Upstream(UpstreamError::Status {
            url: "http://example.test".to_string(),
            status: 503,
            body: String::new(),
        });
        assert!(upstream.is_transient());
        assert!(!QueryError::NotFound("no game".into()).is_transient());
        assert!(!QueryError::from(NormalizationError::missing("live-score", "status")).is_transient());
    }

    #[test]
    fn test_normalization_message_names_field() {
        let err = NormalizationError::missing("multi-division", "home.names");
        assert_eq!(
            err.to_string(),
            "multi-division payload rejected: missing required field `home.names`"
        );
        assert_eq!(QueryError::from(err).code(), "normalization_error");
    }
}
