//! # backsweep
//!
//! A capacity-driven backup retention engine: given a directory tree of
//! backup files and one or more capacity constraints, delete the oldest
//! files until the constraints are satisfied, then remove the directories
//! this emptied.
//!
//! ## Overview
//!
//! backsweep answers one question — "which files must go so the disk stays
//! within bounds?" — without ever sorting individual files. Scanned files
//! are bucketed into fixed-width modification-time windows with running
//! size totals, so memory stays bounded over millions of files, and the
//! deletion cut-off is chosen by accumulating whole buckets oldest-first.
//!
//! ## Key features
//!
//! - **Three capacity constraints**: a cap on used bytes, a cap on usage
//!   percentage, and a floor on free space; the tightest active constraint
//!   decides how much to free
//! - **Block-size accurate**: all accounting rounds file sizes up to the
//!   filesystem allocation unit, which is what deletion actually reclaims
//! - **Bounded memory**: time-windowed histogram instead of per-file
//!   sorting
//! - **Concurrent walks**: scan and delete phases run on a small worker
//!   pool with dynamic work distribution and partial-failure tolerance
//! - **Absolute mode**: with only a byte cap configured, cleaning works
//!   even when filesystem usage cannot be queried
//!
//! ## Example
//!
//! ```no_run
//! use backsweep::{CleaningConfig, clean_backup};
//!
//! let config = CleaningConfig::builder()
//!     .min_free_space(10 * 1024 * 1024 * 1024) // keep 10 GiB free
//!     .build();
//!
//! let report = clean_backup("/var/backups", config)?;
//! println!(
//!     "deleted {} files, reclaimed {} bytes",
//!     report.deleted_files, report.deleted_block_size
//! );
//! # Ok::<(), backsweep::SweepError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`config`]: invocation configuration and its builder
//! - [`callbacks`]: progress callbacks fired from engine threads
//! - [`disk`]: disk-usage snapshots, the pluggable provider trait, and the
//!   platform implementation
//! - [`report`]: the per-invocation result
//! - [`error`]: fatal error types with thiserror + miette
//!
//! Internal modules (not part of the public API):
//! - `walker`: bounded-queue worker pool shared by the scan and delete
//!   phases
//! - `histogram`: time-windowed file aggregation
//! - `target` / `threshold`: constraint reduction and cut-off selection
//! - `scanner` / `deleter` / `reaper`: the three phases
//!
//! ## Error handling
//!
//! Fatal problems (bad configuration, missing root, unusable disk-info
//! provider) return [`SweepError`]. Per-entry filesystem failures never
//! abort a run: they are reported through the `on_error` callback and the
//! first one is retained on the report.

// Re-export public modules for library usage
pub mod callbacks;
pub mod config;
pub mod disk;
pub mod error;
pub mod report;

// Internal modules
mod cleaner;
mod deleter;
mod histogram;
mod reaper;
mod scanner;
mod target;
mod threshold;
mod timestamp;
mod walker;

pub use cleaner::clean_backup;
pub use config::{CleaningConfig, CleaningConfigBuilder};
pub use error::{Result, SweepError};
pub use report::CleaningReport;
