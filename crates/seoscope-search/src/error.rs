use thiserror::Error;

use crate::types::BackendKind;

/// Why a single outbound request (backend tier, competitor page, suggestion
/// lookup) produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("rate limited (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("no results")]
    Empty,
}

impl FailureReason {
    /// Classifies a transport-level `reqwest` error.
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return FailureReason::Timeout;
        }
        if let Some(status) = err.status() {
            return FailureReason::from_status(status.as_u16());
        }
        if err.is_connect() {
            return FailureReason::Connect(err.to_string());
        }
        if err.is_decode() {
            return FailureReason::Malformed(err.to_string());
        }
        FailureReason::Request(err.to_string())
    }

    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            403 | 429 => FailureReason::RateLimited { status },
            other => FailureReason::Status(other),
        }
    }

    /// `true` when repeating the same request later could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            FailureReason::Timeout
            | FailureReason::Connect(_)
            | FailureReason::Request(_)
            | FailureReason::RateLimited { .. } => true,
            FailureReason::Status(status) => *status >= 500,
            FailureReason::NotConfigured(_) | FailureReason::Malformed(_) | FailureReason::Empty => {
                false
            }
        }
    }
}

/// One failed tier inside an [`SearchError::AllBackendsExhausted`] report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAttempt {
    pub backend: BackendKind,
    pub reason: FailureReason,
}

impl std::fmt::Display for BackendAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.backend, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("search backend {backend} unavailable: {reason}")]
    BackendUnavailable {
        backend: BackendKind,
        reason: FailureReason,
    },

    #[error("all search backends exhausted for \"{query}\": [{}]", format_attempts(.attempts))]
    AllBackendsExhausted {
        query: String,
        attempts: Vec<BackendAttempt>,
    },
}

impl SearchError {
    #[must_use]
    pub fn unavailable(backend: BackendKind, reason: FailureReason) -> Self {
        SearchError::BackendUnavailable { backend, reason }
    }
}

fn format_attempts(attempts: &[BackendAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
