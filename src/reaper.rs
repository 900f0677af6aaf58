//! Phase 3: prune the directories the delete phase emptied.

use std::cmp::Reverse;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::callbacks::{Callbacks, DirDeletedInfo};

/// Removes now-empty directories bottom-up, strictly sequentially.
///
/// Candidates are the parents of deleted files. Sorting them by descending
/// depth guarantees children are tried before their parents regardless of
/// the order the delete workers discovered them; ascending after each
/// removal then catches parents that only became empty during this pass.
pub(crate) struct EmptyDirReaper<'a> {
    root: PathBuf,
    callbacks: &'a Callbacks,
}

impl<'a> EmptyDirReaper<'a> {
    pub(crate) fn new(root: &Path, callbacks: &'a Callbacks) -> Self {
        Self {
            root: root.to_path_buf(),
            callbacks,
        }
    }

    /// Prune every empty directory reachable from `dirs`.
    ///
    /// Returns the number of directories removed. Failures go to `on_error`
    /// and never abort the pass.
    pub(crate) fn reap(
        &self,
        mut dirs: Vec<PathBuf>,
        mut on_error: impl FnMut(PathBuf, io::Error),
    ) -> usize {
        dirs.sort_by_key(|dir| Reverse(dir.components().count()));
        debug!(candidates = dirs.len(), "pruning emptied directories");

        let mut removed = 0usize;
        for dir in dirs {
            self.prune_upward(&dir, &mut removed, &mut on_error);
        }
        removed
    }

    fn prune_upward(
        &self,
        start: &Path,
        removed: &mut usize,
        on_error: &mut impl FnMut(PathBuf, io::Error),
    ) {
        let mut current = start;
        while self.removable(current) {
            match self.remove_if_empty(current) {
                Ok(true) => {
                    *removed += 1;
                    self.callbacks.dir_deleted(&DirDeletedInfo {
                        path: current.to_path_buf(),
                    });
                }
                Ok(false) => return,
                Err(err) => {
                    on_error(current.to_path_buf(), err);
                    return;
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => return,
            }
        }
    }

    /// Remove `dir` if it has no entries. `Ok(false)` means it was not
    /// empty, or vanished before we got to it.
    fn remove_if_empty(&self, dir: &Path) -> io::Result<bool> {
        let mut entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err),
        };
        if entries.next().is_some() {
            return Ok(false);
        }
        fs::remove_dir(dir)?;
        Ok(true)
    }

    /// Only directories strictly below the cleaning root are fair game; the
    /// root itself, the filesystem root, and relative-path sentinels stay.
    fn removable(&self, dir: &Path) -> bool {
        dir.starts_with(&self.root)
            && dir != self.root
            && dir.parent().is_some()
            && !dir.as_os_str().is_empty()
            && dir != Path::new(".")
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn reap_with(root: &Path, callbacks: &Callbacks, dirs: Vec<PathBuf>) -> usize {
        EmptyDirReaper::new(root, callbacks).reap(dirs, |_, _| {})
    }

    #[test]
    fn ascends_through_emptied_parents() {
        let tmp = TempDir::new().expect("tempdir");
        let deep = tmp.path().join("a/b/c");
        fs::create_dir_all(&deep).expect("mkdir");

        let callbacks = Callbacks::default();
        let removed = reap_with(tmp.path(), &callbacks, vec![deep.clone()]);

        assert_eq!(removed, 3);
        assert!(!tmp.path().join("a").exists());
        assert!(tmp.path().exists());
    }

    #[test]
    fn never_removes_the_cleaning_root() {
        let tmp = TempDir::new().expect("tempdir");

        let callbacks = Callbacks::default();
        let removed = reap_with(tmp.path(), &callbacks, vec![tmp.path().to_path_buf()]);

        assert_eq!(removed, 0);
        assert!(tmp.path().exists());
    }

    #[test]
    fn stops_at_non_empty_directories() {
        let tmp = TempDir::new().expect("tempdir");
        let keeper = tmp.path().join("a/keep.txt");
        fs::create_dir_all(tmp.path().join("a/b")).expect("mkdir");
        fs::write(&keeper, b"x").expect("write");

        let callbacks = Callbacks::default();
        let removed = reap_with(tmp.path(), &callbacks, vec![tmp.path().join("a/b")]);

        assert_eq!(removed, 1);
        assert!(!tmp.path().join("a/b").exists());
        assert!(keeper.exists());
    }

    #[test]
    fn deep_candidates_are_pruned_before_shallow_ones() {
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir_all(tmp.path().join("x/y")).expect("mkdir");

        // Insertion order is shallow-first; the depth sort must still let
        // y's removal empty x before x is tried.
        let callbacks = Callbacks::default();
        let removed = reap_with(
            tmp.path(),
            &callbacks,
            vec![tmp.path().join("x"), tmp.path().join("x/y")],
        );

        assert_eq!(removed, 2);
        assert!(!tmp.path().join("x").exists());
    }

    #[test]
    fn vanished_candidates_are_skipped() {
        let tmp = TempDir::new().expect("tempdir");

        let callbacks = Callbacks::default();
        let removed = reap_with(tmp.path(), &callbacks, vec![tmp.path().join("gone")]);

        assert_eq!(removed, 0);
    }

    #[test]
    fn emits_dir_deleted_callbacks() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir_all(tmp.path().join("a/b")).expect("mkdir");

        let counter = Arc::new(AtomicUsize::new(0));
        let shared = counter.clone();
        let callbacks = Callbacks::new().on_dir_deleted(move |_| {
            shared.fetch_add(1, Ordering::SeqCst);
        });

        let removed = reap_with(tmp.path(), &callbacks, vec![tmp.path().join("a/b")]);
        assert_eq!(removed, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
