//! The orchestrator: phases the scan, threshold, delete, and prune steps.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, warn};

use crate::callbacks::{
    Callbacks, CompleteInfo, DeleteStartInfo, ErrorInfo, ErrorKind, ScanCompleteInfo, StartInfo,
};
use crate::config::CleaningConfig;
use crate::deleter::{DeleteStats, Deleter};
use crate::disk::{DiskInfoProvider, DiskUsage, PlatformDiskInfo};
use crate::error::{Result, SweepError};
use crate::reaper::EmptyDirReaper;
use crate::report::CleaningReport;
use crate::scanner::Scanner;
use crate::target::calculate_target;
use crate::threshold::{ThresholdDecision, absolute_cutoff, budget_cutoff};

/// How the deletion amount was decided.
enum Goal {
    /// Usage snapshot available: free this many bytes.
    FreeBytes { budget: u64, usage: DiskUsage },
    /// No snapshot, `max_size` only: bring the scanned block total under
    /// this cap.
    CapTotal(u64),
}

/// Clean backup files under `root` until the configured capacity
/// constraints are satisfied.
///
/// Deletes the oldest files first, grouped by modification-time window,
/// then removes the directories this emptied (unless disabled). Fatal
/// errors — bad configuration, a missing root, an unusable disk-info
/// provider — return `Err`; per-entry filesystem failures are reported
/// through the `on_error` callback, retained on the report, and do not
/// stop the run.
///
/// Callbacks fire inline on engine threads; see
/// [`Callbacks`](crate::callbacks::Callbacks).
pub fn clean_backup(root: impl AsRef<Path>, config: CleaningConfig) -> Result<CleaningReport> {
    clean(root.as_ref(), config)
}

fn clean(root: &Path, mut config: CleaningConfig) -> Result<CleaningReport> {
    let started = Instant::now();

    config.apply_defaults();
    config.validate()?;

    match fs::metadata(root) {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(SweepError::DirectoryNotFound(root.to_path_buf()));
        }
        Err(source) => {
            return Err(SweepError::Io {
                path: root.to_path_buf(),
                source,
            });
        }
    }

    let platform = PlatformDiskInfo;
    let provider: &dyn DiskInfoProvider = config.disk_info.as_deref().unwrap_or(&platform);

    let goal = match provider.disk_usage(root) {
        Ok(usage) => {
            let budget = calculate_target(&usage, &config);
            debug!(budget, used = usage.used, free = usage.free, "computed deletion budget");
            if budget == 0 {
                return Ok(CleaningReport {
                    total_duration: started.elapsed(),
                    ..CleaningReport::default()
                });
            }
            Goal::FreeBytes { budget, usage }
        }
        Err(source) => {
            // Absolute mode works from the scan alone, but only a plain
            // byte cap can: percentage and free-space constraints are
            // meaningless without a snapshot.
            if config.absolute_mode_eligible()
                && let Some(cap) = config.max_size
            {
                debug!(cap, "disk usage unavailable, entering absolute mode");
                Goal::CapTotal(cap)
            } else {
                return Err(SweepError::DiskUsage {
                    path: root.to_path_buf(),
                    source,
                });
            }
        }
    };

    let allocation_unit =
        provider
            .block_size(root)
            .map_err(|source| SweepError::BlockSize {
                path: root.to_path_buf(),
                source,
            })?;

    config.callbacks.start(&StartInfo {
        target_dir: root.to_path_buf(),
        current_usage: match &goal {
            Goal::FreeBytes { usage, .. } => Some(*usage),
            Goal::CapTotal(_) => None,
        },
        target_size: match &goal {
            Goal::FreeBytes { budget, .. } => *budget,
            Goal::CapTotal(_) => 0,
        },
    });

    let mut first_error: Option<ErrorInfo> = None;
    let workers = config.effective_workers();

    // Phase 1: scan.
    let scan_started = Instant::now();
    let scanner = Scanner::new(config.time_window, allocation_unit, workers);
    scanner.scan(
        root,
        error_sink(ErrorKind::Scan, &config.callbacks, &mut first_error),
    );

    let scanned_files = scanner.total_files();
    let total_size = scanner.total_size();
    let slots = scanner.into_slots();

    if slots.is_empty() {
        return Ok(CleaningReport {
            scan_duration: scan_started.elapsed(),
            total_duration: started.elapsed(),
            block_size: allocation_unit,
            first_error,
            ..CleaningReport::default()
        });
    }

    let decision = match &goal {
        Goal::FreeBytes { budget, .. } => budget_cutoff(&slots, *budget, config.time_window),
        Goal::CapTotal(cap) => absolute_cutoff(&slots, *cap, config.time_window),
    };
    drop(slots);
    let scan_duration = scan_started.elapsed();
    debug!(
        scanned_files,
        estimated_files = decision.files,
        estimated_bytes = decision.bytes,
        "scan complete"
    );

    config.callbacks.scan_complete(&ScanCompleteInfo {
        scanned_files,
        total_size,
        block_size: allocation_unit,
        time_threshold: decision.cutoff,
        scan_duration,
    });

    // Phase 2: delete, then prune what it emptied.
    let delete_started = Instant::now();
    config.callbacks.delete_start(&DeleteStartInfo {
        estimated_files: decision.files,
        estimated_size: decision.bytes,
    });

    let (stats, deleted_dirs) = run_delete_phase(
        root,
        &config,
        &decision,
        allocation_unit,
        workers,
        &mut first_error,
    );
    let delete_duration = delete_started.elapsed();

    config.callbacks.complete(&CompleteInfo {
        deleted_files: stats.files,
        deleted_size: stats.bytes,
        deleted_block_size: stats.block_bytes,
        deleted_dirs,
        delete_duration,
    });

    Ok(CleaningReport {
        deleted_files: stats.files,
        deleted_size: stats.bytes,
        deleted_block_size: stats.block_bytes,
        deleted_dirs,
        scan_duration,
        delete_duration,
        total_duration: started.elapsed(),
        scanned_files,
        time_threshold: decision.cutoff,
        block_size: allocation_unit,
        first_error,
    })
}

fn run_delete_phase(
    root: &Path,
    config: &CleaningConfig,
    decision: &ThresholdDecision,
    allocation_unit: u64,
    workers: usize,
    first_error: &mut Option<ErrorInfo>,
) -> (DeleteStats, usize) {
    let Some(cutoff) = decision.cutoff else {
        return (DeleteStats::default(), 0);
    };

    let deleter = Deleter::new(cutoff, allocation_unit, workers, &config.callbacks);
    deleter.run(
        root,
        error_sink(ErrorKind::Delete, &config.callbacks, first_error),
    );

    let deleted_dirs = if config.remove_empty_dirs {
        EmptyDirReaper::new(root, &config.callbacks).reap(
            deleter.deleted_dirs(),
            error_sink(ErrorKind::Dir, &config.callbacks, first_error),
        )
    } else {
        0
    };

    (deleter.stats(), deleted_dirs)
}

/// Per-entry error handling: log, invoke the callback, retain the first.
fn error_sink<'a>(
    kind: ErrorKind,
    callbacks: &'a Callbacks,
    first: &'a mut Option<ErrorInfo>,
) -> impl FnMut(PathBuf, io::Error) + 'a {
    move |path, error| {
        warn!(phase = %kind, path = %path.display(), %error, "entry failed");
        let info = ErrorInfo { kind, path, error };
        callbacks.error(&info);
        if first.is_none() {
            *first = Some(info);
        }
    }
}
