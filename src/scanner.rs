//! Phase 1: walk the tree and populate the time histogram.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::disk::block_aligned;
use crate::histogram::{FileRecord, TimeSlot, TimeSlotHistogram};
use crate::walker::{Visitor, Walk, Walker};

pub(crate) struct Scanner {
    histogram: TimeSlotHistogram,
    allocation_unit: u64,
    workers: usize,
}

impl Scanner {
    pub(crate) fn new(window: Duration, allocation_unit: u64, workers: usize) -> Self {
        Self {
            histogram: TimeSlotHistogram::new(window),
            allocation_unit,
            workers,
        }
    }

    /// Walk `root`, recording every regular file into the histogram.
    ///
    /// Per-entry failures go to `on_error`; the walk keeps going.
    pub(crate) fn scan(&self, root: &Path, on_error: impl FnMut(PathBuf, io::Error)) {
        let visitor = ScanVisitor {
            histogram: &self.histogram,
            allocation_unit: self.allocation_unit,
        };
        Walker::new(self.workers).run(root, &visitor, on_error);
    }

    pub(crate) fn total_files(&self) -> usize {
        self.histogram.total_files()
    }

    pub(crate) fn total_size(&self) -> u64 {
        self.histogram.total_size()
    }

    /// Finish the scan, yielding slots sorted oldest first.
    pub(crate) fn into_slots(self) -> Vec<TimeSlot> {
        self.histogram.finalize()
    }
}

struct ScanVisitor<'a> {
    histogram: &'a TimeSlotHistogram,
    allocation_unit: u64,
}

impl Visitor for ScanVisitor<'_> {
    fn visit(&self, path: &Path, walk: &Walk<'_>) -> io::Result<()> {
        // Link-preserving stat: symlinks are skipped, not followed.
        let meta = fs::symlink_metadata(path)?;
        let file_type = meta.file_type();

        if file_type.is_symlink() {
            return Ok(());
        }

        if file_type.is_dir() {
            for entry in fs::read_dir(path)? {
                walk.schedule(entry?.path());
            }
            return Ok(());
        }

        if file_type.is_file() {
            let size = meta.len();
            self.histogram.add(FileRecord {
                path: path.to_path_buf(),
                size,
                block_size: block_aligned(size, self.allocation_unit),
                mod_time: meta.modified()?,
            });
        }

        // Sockets, devices, FIFOs: not backups, not counted.
        Ok(())
    }
}
