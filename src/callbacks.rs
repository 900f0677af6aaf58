//! Progress callbacks for the cleaning phases.
//!
//! Callbacks run inline on whichever thread produced the event — for
//! `on_file_deleted` and `on_error` that is a walker worker — so they must
//! be cheap and re-entrant. Unset slots cost nothing.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::disk::DiskUsage;

/// Phase the engine was in when a per-entry error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// During the scan walk
    Scan,
    /// During the delete walk
    Delete,
    /// During empty-directory pruning
    Dir,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Scan => "scan",
            ErrorKind::Delete => "delete",
            ErrorKind::Dir => "dir",
        })
    }
}

/// A non-fatal per-entry failure.
#[derive(Debug)]
pub struct ErrorInfo {
    /// Which phase failed
    pub kind: ErrorKind,
    /// The entry that failed
    pub path: PathBuf,
    /// The underlying I/O error
    pub error: io::Error,
}

/// Payload for [`Callbacks::on_start`].
#[derive(Debug, Clone)]
pub struct StartInfo {
    /// The directory being cleaned
    pub target_dir: PathBuf,
    /// Usage snapshot, absent in absolute mode
    pub current_usage: Option<DiskUsage>,
    /// Bytes the engine intends to free (0 in absolute mode, where the
    /// budget is unknown before the scan)
    pub target_size: u64,
}

/// Payload for [`Callbacks::on_scan_complete`].
#[derive(Debug, Clone)]
pub struct ScanCompleteInfo {
    /// Regular files seen by the scan
    pub scanned_files: usize,
    /// Sum of logical sizes
    pub total_size: u64,
    /// The filesystem allocation unit used for accounting
    pub block_size: u64,
    /// Files strictly older than this will be deleted
    pub time_threshold: Option<SystemTime>,
    /// Wall-clock time of the scan phase
    pub scan_duration: Duration,
}

/// Payload for [`Callbacks::on_delete_start`].
#[derive(Debug, Clone, Copy)]
pub struct DeleteStartInfo {
    /// Files expected to be deleted
    pub estimated_files: usize,
    /// Block-aligned bytes expected to be reclaimed
    pub estimated_size: u64,
}

/// Payload for [`Callbacks::on_file_deleted`].
#[derive(Debug, Clone)]
pub struct FileDeletedInfo {
    /// The deleted file
    pub path: PathBuf,
    /// Logical size
    pub size: u64,
    /// Block-aligned size
    pub block_size: u64,
    /// Modification time the file had
    pub mod_time: SystemTime,
}

/// Payload for [`Callbacks::on_dir_deleted`].
#[derive(Debug, Clone)]
pub struct DirDeletedInfo {
    /// The removed directory
    pub path: PathBuf,
}

/// Payload for [`Callbacks::on_complete`].
#[derive(Debug, Clone, Copy)]
pub struct CompleteInfo {
    /// Files actually deleted
    pub deleted_files: usize,
    /// Logical bytes deleted
    pub deleted_size: u64,
    /// Block-aligned bytes reclaimed
    pub deleted_block_size: u64,
    /// Empty directories removed
    pub deleted_dirs: usize,
    /// Wall-clock time of the delete phase (including directory pruning)
    pub delete_duration: Duration,
}

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// The seven callback slots. All are optional.
#[derive(Default)]
pub struct Callbacks {
    /// Invoked once, after the deletion budget is known
    pub on_start: Option<Callback<StartInfo>>,
    /// Invoked once, after the scan and threshold computation
    pub on_scan_complete: Option<Callback<ScanCompleteInfo>>,
    /// Invoked once, before the delete walk
    pub on_delete_start: Option<Callback<DeleteStartInfo>>,
    /// Invoked per deleted file, from worker threads
    pub on_file_deleted: Option<Callback<FileDeletedInfo>>,
    /// Invoked per removed directory
    pub on_dir_deleted: Option<Callback<DirDeletedInfo>>,
    /// Invoked once, after the delete phase
    pub on_complete: Option<Callback<CompleteInfo>>,
    /// Invoked per non-fatal entry error, from worker threads
    pub on_error: Option<Callback<ErrorInfo>>,
}

impl Callbacks {
    /// An empty callback set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `on_start` slot.
    pub fn on_start(mut self, f: impl Fn(&StartInfo) + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Set the `on_scan_complete` slot.
    pub fn on_scan_complete(mut self, f: impl Fn(&ScanCompleteInfo) + Send + Sync + 'static) -> Self {
        self.on_scan_complete = Some(Box::new(f));
        self
    }

    /// Set the `on_delete_start` slot.
    pub fn on_delete_start(mut self, f: impl Fn(&DeleteStartInfo) + Send + Sync + 'static) -> Self {
        self.on_delete_start = Some(Box::new(f));
        self
    }

    /// Set the `on_file_deleted` slot.
    pub fn on_file_deleted(mut self, f: impl Fn(&FileDeletedInfo) + Send + Sync + 'static) -> Self {
        self.on_file_deleted = Some(Box::new(f));
        self
    }

    /// Set the `on_dir_deleted` slot.
    pub fn on_dir_deleted(mut self, f: impl Fn(&DirDeletedInfo) + Send + Sync + 'static) -> Self {
        self.on_dir_deleted = Some(Box::new(f));
        self
    }

    /// Set the `on_complete` slot.
    pub fn on_complete(mut self, f: impl Fn(&CompleteInfo) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Set the `on_error` slot.
    pub fn on_error(mut self, f: impl Fn(&ErrorInfo) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub(crate) fn start(&self, info: &StartInfo) {
        if let Some(cb) = &self.on_start {
            cb(info);
        }
    }

    pub(crate) fn scan_complete(&self, info: &ScanCompleteInfo) {
        if let Some(cb) = &self.on_scan_complete {
            cb(info);
        }
    }

    pub(crate) fn delete_start(&self, info: &DeleteStartInfo) {
        if let Some(cb) = &self.on_delete_start {
            cb(info);
        }
    }

    pub(crate) fn file_deleted(&self, info: &FileDeletedInfo) {
        if let Some(cb) = &self.on_file_deleted {
            cb(info);
        }
    }

    pub(crate) fn dir_deleted(&self, info: &DirDeletedInfo) {
        if let Some(cb) = &self.on_dir_deleted {
            cb(info);
        }
    }

    pub(crate) fn complete(&self, info: &CompleteInfo) {
        if let Some(cb) = &self.on_complete {
            cb(info);
        }
    }

    pub(crate) fn error(&self, info: &ErrorInfo) {
        if let Some(cb) = &self.on_error {
            cb(info);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_scan_complete", &self.on_scan_complete.is_some())
            .field("on_delete_start", &self.on_delete_start.is_some())
            .field("on_file_deleted", &self.on_file_deleted.is_some())
            .field("on_dir_deleted", &self.on_dir_deleted.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
