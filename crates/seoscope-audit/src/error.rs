use seoscope_search::FailureReason;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The audited page itself could not be fetched; no score is produced.
    #[error("failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: FailureReason },
}
