//! Append-only snapshot persistence and the analyses built on it: deltas
//! between the two latest snapshots and windowed trend reports.

pub mod delta;
pub mod error;
pub mod file;
pub mod memory;
pub mod report;
pub mod snapshot;

pub use delta::{diff, Delta, DeltaOutcome, Direction, Thresholds};
pub use error::StoreError;
pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use report::{aggregate, Mover, Report, SubjectSummary, Trend, Window};
pub use snapshot::{position_subject, Snapshot, SnapshotKind, SnapshotStore};
