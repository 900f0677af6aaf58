//! Configuration for a cleaning invocation.

use std::fmt;
use std::time::Duration;

use crate::callbacks::Callbacks;
use crate::disk::DiskInfoProvider;
use crate::error::{Result, SweepError};

/// Default bucketing window for the scan histogram.
pub const DEFAULT_TIME_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Default ceiling on walker workers.
///
/// Disk I/O saturates well before CPU does; benchmarks on the original
/// implementation showed diminishing returns past four workers.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Configuration for [`clean_backup`](crate::clean_backup).
///
/// At least one of the three capacity constraints must be set. When several
/// are set, the tightest one decides how much gets deleted.
pub struct CleaningConfig {
    /// Cap on used bytes. The only constraint usable without a disk-usage
    /// snapshot (absolute mode).
    pub max_size: Option<u64>,
    /// Cap on `used / total`, in percent (0–100).
    pub max_usage_percent: Option<f64>,
    /// Floor on free bytes. The recommended constraint for most setups.
    pub min_free_space: Option<u64>,

    /// Histogram bucket width; `Duration::ZERO` resolves to
    /// [`DEFAULT_TIME_WINDOW`].
    pub time_window: Duration,
    /// Remove directories emptied by the delete phase.
    pub remove_empty_dirs: bool,

    /// Desired walker workers; `0` resolves to the hardware parallelism.
    pub concurrency: usize,
    /// Ceiling on walker workers; `0` resolves to
    /// [`DEFAULT_MAX_CONCURRENCY`]. Effective workers =
    /// `min(concurrency, max_concurrency)`.
    pub max_concurrency: usize,

    /// Progress callbacks.
    pub callbacks: Callbacks,
    /// Disk-info provider; `None` uses the platform implementation.
    pub disk_info: Option<Box<dyn DiskInfoProvider>>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            max_size: None,
            max_usage_percent: None,
            min_free_space: None,
            time_window: Duration::ZERO,
            remove_empty_dirs: true,
            concurrency: 0,
            max_concurrency: 0,
            callbacks: Callbacks::default(),
            disk_info: None,
        }
    }
}

impl CleaningConfig {
    /// Creates a new builder for [`CleaningConfig`]
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Resolve zero-valued knobs to their defaults.
    pub(crate) fn apply_defaults(&mut self) {
        if self.time_window.is_zero() {
            self.time_window = DEFAULT_TIME_WINDOW;
        }
        if self.concurrency == 0 {
            self.concurrency = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
        }
        if self.max_concurrency == 0 {
            self.max_concurrency = DEFAULT_MAX_CONCURRENCY;
        }
    }

    /// Check the configuration after defaults have been applied.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_size.is_none() && self.max_usage_percent.is_none() && self.min_free_space.is_none()
        {
            return Err(SweepError::NoCapacitySpecified);
        }

        if let Some(percent) = self.max_usage_percent
            && !(0.0..=100.0).contains(&percent)
        {
            return Err(SweepError::InvalidConfig(format!(
                "max_usage_percent must be within 0..=100, got {percent}"
            )));
        }

        Ok(())
    }

    /// The number of walker workers this configuration yields.
    pub fn effective_workers(&self) -> usize {
        self.concurrency.min(self.max_concurrency)
    }

    /// Whether the engine may fall back to absolute mode when the provider
    /// cannot report usage: only `max_size` is active.
    pub(crate) fn absolute_mode_eligible(&self) -> bool {
        self.max_size.is_some() && self.max_usage_percent.is_none() && self.min_free_space.is_none()
    }
}

impl fmt::Debug for CleaningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleaningConfig")
            .field("max_size", &self.max_size)
            .field("max_usage_percent", &self.max_usage_percent)
            .field("min_free_space", &self.min_free_space)
            .field("time_window", &self.time_window)
            .field("remove_empty_dirs", &self.remove_empty_dirs)
            .field("concurrency", &self.concurrency)
            .field("max_concurrency", &self.max_concurrency)
            .field("callbacks", &self.callbacks)
            .field("disk_info", &self.disk_info.is_some())
            .finish()
    }
}

/// Builder for [`CleaningConfig`]
#[derive(Default)]
pub struct CleaningConfigBuilder {
    config: CleaningConfig,
}

impl CleaningConfigBuilder {
    /// Set the cap on used bytes
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.config.max_size = Some(bytes);
        self
    }

    /// Set the cap on disk usage, in percent
    pub fn max_usage_percent(mut self, percent: f64) -> Self {
        self.config.max_usage_percent = Some(percent);
        self
    }

    /// Set the floor on free bytes
    pub fn min_free_space(mut self, bytes: u64) -> Self {
        self.config.min_free_space = Some(bytes);
        self
    }

    /// Set the histogram bucket width
    pub fn time_window(mut self, window: Duration) -> Self {
        self.config.time_window = window;
        self
    }

    /// Enable or disable removal of emptied directories
    pub fn remove_empty_dirs(mut self, enabled: bool) -> Self {
        self.config.remove_empty_dirs = enabled;
        self
    }

    /// Set the desired worker count
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.config.concurrency = workers;
        self
    }

    /// Set the worker-count ceiling
    pub fn max_concurrency(mut self, workers: usize) -> Self {
        self.config.max_concurrency = workers;
        self
    }

    /// Set the progress callbacks
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.config.callbacks = callbacks;
        self
    }

    /// Substitute a disk-info provider
    pub fn disk_info(mut self, provider: impl DiskInfoProvider + 'static) -> Self {
        self.config.disk_info = Some(Box::new(provider));
        self
    }

    /// Build the [`CleaningConfig`]
    pub fn build(self) -> CleaningConfig {
        self.config
    }
}
