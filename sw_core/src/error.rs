use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

/// Failure modes of a single query against the remote service.
///
/// The change detector matches on these to decide what a skipped tick
/// means, so the kinds must stay distinguishable. Transport failures are
/// stringified at the client boundary to keep the core free of HTTP
/// types.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("not authenticated: no access token has been acquired")]
    NotAuthenticated,

    #[error("credential rejected by the remote service")]
    Unauthorized,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("rate limited: retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Graph API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("download failed: {0}")]
    Download(String),
}

impl QueryError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Whether a later attempt with the same credential could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::RateLimited { .. } | Self::Api { .. }
        )
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(QueryError::NotAuthenticated.is_auth());
        assert!(QueryError::Unauthorized.is_auth());
        assert!(!QueryError::NotFound("x".to_string()).is_auth());

        assert!(
            QueryError::RateLimited {
                retry_after_seconds: 60
            }
            .is_retryable()
        );
        assert!(QueryError::transport("connection reset").is_retryable());
        assert!(!QueryError::Unauthorized.is_retryable());
    }

    #[test]
    fn test_transport_preserves_message() {
        let err = QueryError::transport("connection refused");
        assert_eq!(err.to_string(), "HTTP request failed: connection refused");
    }
}
