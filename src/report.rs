use std::time::{Duration, SystemTime};

use crate::callbacks::ErrorInfo;

/// The result of one cleaning invocation.
///
/// Deletion counts come from the delete phase itself, not the scan-time
/// estimate, so they reflect what actually happened on disk.
#[derive(Debug, Default)]
pub struct CleaningReport {
    /// Number of deleted files
    pub deleted_files: usize,
    /// Logical bytes deleted
    pub deleted_size: u64,
    /// Block-aligned bytes reclaimed
    pub deleted_block_size: u64,
    /// Number of removed empty directories
    pub deleted_dirs: usize,

    /// Time spent scanning files
    pub scan_duration: Duration,
    /// Time spent deleting files and pruning directories
    pub delete_duration: Duration,
    /// Total processing time
    pub total_duration: Duration,

    /// Total number of regular files seen by the scan
    pub scanned_files: usize,
    /// Files strictly older than this instant were deleted; `None` when no
    /// deletion took place
    pub time_threshold: Option<SystemTime>,
    /// The filesystem allocation unit used for accounting
    pub block_size: u64,

    /// First non-fatal per-entry error, if any occurred.
    ///
    /// A populated value does not mean the run did no work; fatal failures
    /// are returned as [`SweepError`](crate::error::SweepError) instead.
    pub first_error: Option<ErrorInfo>,
}
