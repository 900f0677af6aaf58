//! Disk usage snapshots and block-size accounting.
//!
//! The engine sees the filesystem through the [`DiskInfoProvider`] trait so
//! tests (and callers on exotic storage) can substitute their own numbers.
//! [`PlatformDiskInfo`] is the default implementation, backed by `statfs` on
//! Unix and the drive-information APIs on Windows.

use std::io;
use std::path::Path;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

/// A point-in-time snapshot of filesystem capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskUsage {
    /// Total capacity in bytes
    pub total: u64,
    /// Bytes available to unprivileged callers
    pub free: u64,
    /// Bytes in use
    pub used: u64,
    /// `used / total`, in percent
    pub used_percent: f64,
}

/// Reports filesystem capacity and allocation granularity for a path.
///
/// Implementations must fail rather than report a total of zero.
pub trait DiskInfoProvider: Send + Sync {
    /// Capacity snapshot for the filesystem containing `path`.
    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage>;

    /// Allocation unit of the filesystem containing `path`, in bytes.
    ///
    /// A returned `0` means the granularity is unknown; the engine then
    /// accounts with logical sizes.
    fn block_size(&self, path: &Path) -> io::Result<u64>;

    /// Free bytes on the filesystem containing `path`.
    fn free_space(&self, path: &Path) -> io::Result<u64> {
        Ok(self.disk_usage(path)?.free)
    }
}

/// The platform's native [`DiskInfoProvider`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformDiskInfo;

#[cfg(unix)]
impl DiskInfoProvider for PlatformDiskInfo {
    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage> {
        unix::disk_usage(path)
    }

    fn block_size(&self, path: &Path) -> io::Result<u64> {
        unix::block_size(path)
    }
}

#[cfg(windows)]
impl DiskInfoProvider for PlatformDiskInfo {
    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage> {
        windows::disk_usage(path)
    }

    fn block_size(&self, path: &Path) -> io::Result<u64> {
        windows::block_size(path)
    }
}

/// Round a file's logical size up to a whole number of allocation units.
///
/// The rounded size is what deleting the file actually reclaims. An unknown
/// allocation unit (`0`) leaves the logical size unchanged.
pub(crate) fn block_aligned(file_bytes: u64, allocation_unit: u64) -> u64 {
    if allocation_unit == 0 {
        return file_bytes;
    }
    file_bytes.div_ceil(allocation_unit) * allocation_unit
}
