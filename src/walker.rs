//! A work-distributing file-tree walker shared by the scan and delete phases.
//!
//! Workers pull paths from a bounded queue and hand each one to a visitor;
//! directory visitors push their children back through [`Walk::schedule`].
//! The queue is bounded, and workers are themselves producers, so a blocking
//! send could deadlock with every worker stuck sending and nobody receiving.
//! `schedule` therefore never blocks: when the queue is full the scheduling
//! worker recurses into the child on its own stack, which guarantees forward
//! progress under any worker count.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded, unbounded};

/// Capacity of the pending-path queue.
const TASK_QUEUE_CAPACITY: usize = 100;

/// How often idle workers re-check the outstanding-task counter.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Per-entry processing for one walk.
///
/// `visit` is called concurrently from every worker; implementations hold
/// their shared state behind locks.
pub(crate) trait Visitor: Sync {
    fn visit(&self, path: &Path, walk: &Walk<'_>) -> io::Result<()>;
}

/// Handle given to visitors for scheduling child paths.
pub(crate) struct Walk<'a> {
    visitor: &'a dyn Visitor,
    tasks: Sender<PathBuf>,
    pending: &'a AtomicUsize,
    errors: Sender<(PathBuf, io::Error)>,
}

impl Walk<'_> {
    /// Hand a child path to the pool, or process it inline when the queue
    /// is full.
    ///
    /// Inline-processing errors are routed to the error channel against the
    /// child path; siblings keep getting scheduled either way.
    pub(crate) fn schedule(&self, path: PathBuf) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        match self.tasks.try_send(path) {
            Ok(()) => {}
            Err(TrySendError::Full(path)) | Err(TrySendError::Disconnected(path)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                if let Err(err) = self.visitor.visit(&path, self) {
                    let _ = self.errors.send((path, err));
                }
            }
        }
    }
}

/// A fixed-size pool of walker workers.
pub(crate) struct Walker {
    workers: usize,
}

impl Walker {
    pub(crate) fn new(workers: usize) -> Self {
        Self { workers }
    }

    /// Walk the tree under `root`, feeding every path to `visitor`.
    ///
    /// Per-entry errors are delivered to `on_error` on the calling thread,
    /// concurrently with the walk. A worker count of zero runs the whole
    /// walk inline on the calling thread.
    pub(crate) fn run(
        &self,
        root: &Path,
        visitor: &dyn Visitor,
        mut on_error: impl FnMut(PathBuf, io::Error),
    ) {
        let (err_tx, err_rx) = unbounded();

        if self.workers == 0 {
            self.run_sequential(root, visitor, err_tx, &err_rx, &mut on_error);
            return;
        }

        let (task_tx, task_rx) = bounded(TASK_QUEUE_CAPACITY);
        let pending = AtomicUsize::new(1);
        let _ = task_tx.send(root.to_path_buf());

        std::thread::scope(|scope| {
            for _ in 0..self.workers {
                let task_rx = task_rx.clone();
                let task_tx = task_tx.clone();
                let err_tx = err_tx.clone();
                let pending = &pending;
                scope.spawn(move || worker_loop(visitor, task_rx, task_tx, err_tx, pending));
            }
            drop(task_tx);
            drop(task_rx);
            drop(err_tx);

            // Ends once every worker has exited and dropped its sender.
            for (path, err) in err_rx.iter() {
                on_error(path, err);
            }
        });
    }

    fn run_sequential(
        &self,
        root: &Path,
        visitor: &dyn Visitor,
        err_tx: Sender<(PathBuf, io::Error)>,
        err_rx: &Receiver<(PathBuf, io::Error)>,
        on_error: &mut impl FnMut(PathBuf, io::Error),
    ) {
        // With the receiver dropped, every schedule() call falls back to
        // inline recursion, so the visitor runs entirely on this thread.
        let (task_tx, task_rx) = bounded(TASK_QUEUE_CAPACITY);
        drop(task_rx);
        let pending = AtomicUsize::new(0);

        let walk = Walk {
            visitor,
            tasks: task_tx,
            pending: &pending,
            errors: err_tx.clone(),
        };
        if let Err(err) = visitor.visit(root, &walk) {
            let _ = walk.errors.send((root.to_path_buf(), err));
        }
        drop(walk);
        drop(err_tx);

        for (path, err) in err_rx.iter() {
            on_error(path, err);
        }
    }
}

fn worker_loop(
    visitor: &dyn Visitor,
    task_rx: Receiver<PathBuf>,
    task_tx: Sender<PathBuf>,
    err_tx: Sender<(PathBuf, io::Error)>,
    pending: &AtomicUsize,
) {
    let walk = Walk {
        visitor,
        tasks: task_tx,
        pending,
        errors: err_tx,
    };

    loop {
        match task_rx.recv_timeout(IDLE_POLL) {
            Ok(path) => {
                if let Err(err) = visitor.visit(&path, &walk) {
                    let _ = walk.errors.send((path, err));
                }
                // Decrement after the visit: children scheduled during the
                // visit keep the counter above zero until the subtree is done.
                pending.fetch_sub(1, Ordering::SeqCst);
            }
            Err(RecvTimeoutError::Timeout) => {
                if pending.load(Ordering::SeqCst) == 0 {
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;

    use parking_lot::Mutex;
    use tempfile::TempDir;

    use super::*;

    /// Visits every entry, recording paths and descending into directories.
    struct Collector {
        seen: Mutex<HashSet<PathBuf>>,
    }

    impl Collector {
        fn new() -> Self {
            Self {
                seen: Mutex::new(HashSet::new()),
            }
        }
    }

    impl Visitor for Collector {
        fn visit(&self, path: &Path, walk: &Walk<'_>) -> io::Result<()> {
            self.seen.lock().insert(path.to_path_buf());
            if fs::symlink_metadata(path)?.is_dir() {
                for entry in fs::read_dir(path)? {
                    walk.schedule(entry?.path());
                }
            }
            Ok(())
        }
    }

    fn build_tree(files_per_dir: usize) -> TempDir {
        let tmp = TempDir::new().expect("tempdir");
        for dir in ["a", "a/b", "c"] {
            fs::create_dir_all(tmp.path().join(dir)).expect("mkdir");
        }
        for dir in ["", "a", "a/b", "c"] {
            for i in 0..files_per_dir {
                fs::write(tmp.path().join(dir).join(format!("f{i}")), b"x").expect("write");
            }
        }
        tmp
    }

    fn expected_count(files_per_dir: usize) -> usize {
        // root + 3 dirs + the files in each
        4 + 4 * files_per_dir
    }

    #[test]
    fn visits_every_entry_once() {
        let tmp = build_tree(5);
        let collector = Collector::new();

        Walker::new(2).run(tmp.path(), &collector, |_, _| {});

        assert_eq!(collector.seen.lock().len(), expected_count(5));
    }

    #[test]
    fn wide_directories_overflow_the_queue_without_deadlock() {
        // 300 children per directory dwarfs the queue capacity, forcing the
        // inline-recursion path even with a single worker.
        let tmp = build_tree(300);
        let collector = Collector::new();

        Walker::new(1).run(tmp.path(), &collector, |_, _| {});

        assert_eq!(collector.seen.lock().len(), expected_count(300));
    }

    #[test]
    fn zero_workers_runs_on_the_calling_thread() {
        let tmp = build_tree(10);
        let collector = Collector::new();

        Walker::new(0).run(tmp.path(), &collector, |_, _| {});

        assert_eq!(collector.seen.lock().len(), expected_count(10));
    }

    #[test]
    fn visitor_errors_reach_the_error_sink() {
        let tmp = build_tree(1);

        struct Failing;
        impl Visitor for Failing {
            fn visit(&self, path: &Path, walk: &Walk<'_>) -> io::Result<()> {
                if fs::symlink_metadata(path)?.is_dir() {
                    for entry in fs::read_dir(path)? {
                        walk.schedule(entry?.path());
                    }
                    Ok(())
                } else {
                    Err(io::Error::other("boom"))
                }
            }
        }

        let mut failures = Vec::new();
        Walker::new(2).run(tmp.path(), &Failing, |path, err| {
            failures.push((path, err));
        });

        // One failure per file, none for directories.
        assert_eq!(failures.len(), 4);
        assert!(failures.iter().all(|(_, err)| err.to_string() == "boom"));
    }

    #[test]
    fn missing_root_is_reported_not_fatal() {
        let collector = Collector::new();
        let mut errors = Vec::new();

        Walker::new(2).run(Path::new("/no/such/backsweep/root"), &collector, |path, err| {
            errors.push((path, err));
        });

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].1.kind(), io::ErrorKind::NotFound);
    }
}
