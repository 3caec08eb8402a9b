use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium refused the append. Snapshot durability is a hard
    /// requirement, so callers treat this as fatal.
    #[error("failed to write snapshot to {path}: {source}")]
    StoreWriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read snapshots from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("snapshot of {subject_id} has no usable {field}")]
    InvalidPayload { subject_id: String, field: String },
}
