//! Phase 2: walk the tree again and remove files older than the cut-off.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::debug;

use crate::callbacks::{Callbacks, FileDeletedInfo};
use crate::disk::block_aligned;
use crate::walker::{Visitor, Walk, Walker};

/// What the delete phase actually removed.
///
/// These counters, not the scan-time estimate, feed the final report.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DeleteStats {
    pub(crate) files: usize,
    pub(crate) bytes: u64,
    pub(crate) block_bytes: u64,
}

pub(crate) struct Deleter<'a> {
    cutoff: SystemTime,
    allocation_unit: u64,
    workers: usize,
    callbacks: &'a Callbacks,
    stats: Mutex<DeleteStats>,
    /// Parents of deleted files, for the empty-directory pass.
    deleted_dirs: Mutex<HashSet<PathBuf>>,
}

impl<'a> Deleter<'a> {
    pub(crate) fn new(
        cutoff: SystemTime,
        allocation_unit: u64,
        workers: usize,
        callbacks: &'a Callbacks,
    ) -> Self {
        Self {
            cutoff,
            allocation_unit,
            workers,
            callbacks,
            stats: Mutex::new(DeleteStats::default()),
            deleted_dirs: Mutex::new(HashSet::new()),
        }
    }

    /// Delete everything under `root` strictly older than the cut-off.
    pub(crate) fn run(&self, root: &Path, on_error: impl FnMut(PathBuf, io::Error)) {
        debug!(cutoff = ?self.cutoff, workers = self.workers, "starting delete walk");
        Walker::new(self.workers).run(root, self, on_error);
    }

    pub(crate) fn stats(&self) -> DeleteStats {
        *self.stats.lock()
    }

    /// Snapshot of the directories that lost at least one file.
    pub(crate) fn deleted_dirs(&self) -> Vec<PathBuf> {
        self.deleted_dirs.lock().iter().cloned().collect()
    }
}

impl Visitor for Deleter<'_> {
    fn visit(&self, path: &Path, walk: &Walk<'_>) -> io::Result<()> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            // Raced with an external delete; nothing to do here.
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
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

        if !file_type.is_file() {
            return Ok(());
        }

        let mod_time = meta.modified()?;
        if mod_time >= self.cutoff {
            return Ok(());
        }

        match fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        }

        let size = meta.len();
        let block_size = block_aligned(size, self.allocation_unit);
        {
            let mut stats = self.stats.lock();
            stats.files += 1;
            stats.bytes += size;
            stats.block_bytes += block_size;
        }

        if let Some(parent) = path.parent() {
            self.deleted_dirs.lock().insert(parent.to_path_buf());
        }

        self.callbacks.file_deleted(&FileDeletedInfo {
            path: path.to_path_buf(),
            size,
            block_size,
            mod_time,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use filetime::FileTime;
    use tempfile::TempDir;

    use super::*;

    fn create_aged_file(path: &Path, size: usize, age: Duration) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, vec![b'x'; size]).expect("write");
        let mtime = SystemTime::now() - age;
        filetime::set_file_mtime(path, FileTime::from_system_time(mtime)).expect("set mtime");
    }

    #[test]
    fn removes_only_files_older_than_cutoff() {
        let tmp = TempDir::new().expect("tempdir");
        create_aged_file(&tmp.path().join("old.txt"), 1024, Duration::from_secs(72 * 3600));
        create_aged_file(&tmp.path().join("sub/older.txt"), 2048, Duration::from_secs(96 * 3600));
        create_aged_file(&tmp.path().join("new.txt"), 512, Duration::from_secs(60));

        let cutoff = SystemTime::now() - Duration::from_secs(24 * 3600);
        let callbacks = Callbacks::default();
        let deleter = Deleter::new(cutoff, 4096, 2, &callbacks);
        deleter.run(tmp.path(), |_, _| {});

        let stats = deleter.stats();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.bytes, 1024 + 2048);
        assert_eq!(stats.block_bytes, 2 * 4096);

        assert!(!tmp.path().join("old.txt").exists());
        assert!(!tmp.path().join("sub/older.txt").exists());
        assert!(tmp.path().join("new.txt").exists());

        let dirs = deleter.deleted_dirs();
        assert_eq!(dirs.len(), 2);
        assert!(dirs.contains(&tmp.path().to_path_buf()));
        assert!(dirs.contains(&tmp.path().join("sub")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_survive_even_when_stale() {
        let tmp = TempDir::new().expect("tempdir");
        let target = tmp.path().join("keep.txt");
        create_aged_file(&target, 64, Duration::from_secs(60));

        let link = tmp.path().join("stale-link");
        std::os::unix::fs::symlink(&target, &link).expect("symlink");
        let old = FileTime::from_system_time(SystemTime::now() - Duration::from_secs(72 * 3600));
        filetime::set_symlink_file_times(&link, old, old).expect("age link");

        let cutoff = SystemTime::now() - Duration::from_secs(24 * 3600);
        let callbacks = Callbacks::default();
        let deleter = Deleter::new(cutoff, 4096, 1, &callbacks);
        deleter.run(tmp.path(), |_, _| {});

        assert_eq!(deleter.stats().files, 0);
        assert!(link.symlink_metadata().is_ok());
        assert!(target.exists());
    }

    #[test]
    fn emits_callback_per_deleted_file() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let tmp = TempDir::new().expect("tempdir");
        create_aged_file(&tmp.path().join("a"), 100, Duration::from_secs(72 * 3600));
        create_aged_file(&tmp.path().join("b"), 200, Duration::from_secs(48 * 3600));

        let counter = Arc::new(AtomicUsize::new(0));
        let shared = counter.clone();
        let callbacks = Callbacks::new().on_file_deleted(move |info| {
            assert!(info.size > 0);
            shared.fetch_add(1, Ordering::SeqCst);
        });

        let cutoff = SystemTime::now() - Duration::from_secs(3600);
        let deleter = Deleter::new(cutoff, 4096, 2, &callbacks);
        deleter.run(tmp.path(), |_, _| {});

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(deleter.stats().files, 2);
    }
}
