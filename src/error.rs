//! Error types for backsweep.
//!
//! Fatal errors abort an invocation before or between phases and surface as
//! [`SweepError`]. Per-entry filesystem failures during the scan, delete, and
//! directory-pruning phases are deliberately not represented here: they are
//! reported through the `on_error` callback and retained on
//! [`CleaningReport::first_error`](crate::report::CleaningReport::first_error)
//! so a partially-failed run still reports the work it did.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors that abort a cleaning invocation.
#[derive(Error, Debug, Diagnostic)]
pub enum SweepError {
    /// No capacity constraint was supplied.
    ///
    /// At least one of `max_size`, `max_usage_percent`, or `min_free_space`
    /// must be set; without a constraint there is no way to decide how much
    /// to delete.
    #[error("no capacity limit specified")]
    #[diagnostic(
        code(backsweep::config::no_capacity),
        help("Set at least one of max_size, max_usage_percent, or min_free_space.")
    )]
    NoCapacitySpecified,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    #[diagnostic(code(backsweep::config::invalid))]
    InvalidConfig(String),

    /// The directory to clean does not exist.
    #[error("directory not found: '{0}'")]
    #[diagnostic(
        code(backsweep::dir_not_found),
        help("Check that the path exists and is reachable.")
    )]
    DirectoryNotFound(PathBuf),

    /// The disk-info provider could not report usage for the target path.
    ///
    /// Fatal unless only `max_size` is configured, in which case the engine
    /// falls back to absolute mode and sizes the deletion from the scan
    /// itself.
    #[error("failed to query disk usage for '{path}'")]
    #[diagnostic(
        code(backsweep::disk::usage),
        help(
            "Percentage and free-space constraints need a usage snapshot. Configure only \
             max_size to clean without one."
        )
    )]
    DiskUsage {
        /// The path whose filesystem was queried
        path: PathBuf,
        /// The underlying provider error
        #[source]
        source: std::io::Error,
    },

    /// The disk-info provider could not report the allocation unit.
    ///
    /// Always fatal: without the allocation unit, reclaimed-space accounting
    /// would be wrong.
    #[error("failed to query block size for '{path}'")]
    #[diagnostic(code(backsweep::disk::block_size))]
    BlockSize {
        /// The path whose filesystem was queried
        path: PathBuf,
        /// The underlying provider error
        #[source]
        source: std::io::Error,
    },

    /// File system I/O error outside the per-entry phases.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(backsweep::io_error))]
    Io {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Deleting everything scanned still cannot satisfy the constraints.
    ///
    /// Declared for callers; the engine itself deletes what it can and does
    /// not construct this variant.
    #[error("cannot free enough space")]
    #[diagnostic(code(backsweep::insufficient_space))]
    InsufficientSpace,
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SweepError>;
