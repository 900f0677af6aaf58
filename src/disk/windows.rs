#![allow(unsafe_code)]

use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use windows::Win32::Storage::FileSystem::{GetDiskFreeSpaceExW, GetDiskFreeSpaceW};
use windows::core::PCWSTR;

use super::DiskUsage;

/// Capacity snapshot via `GetDiskFreeSpaceExW`.
pub(super) fn disk_usage(path: &Path) -> io::Result<DiskUsage> {
    let path_wide = to_wide_path(path);

    let mut free_bytes_available = 0u64;
    let mut total_number_of_bytes = 0u64;
    let mut total_number_of_free_bytes = 0u64;

    // SAFETY:
    // 1. `path_wide` is a valid null-terminated UTF-16 string.
    // 2. Pointers to `u64` variables are valid and point to initialized stack memory.
    unsafe {
        GetDiskFreeSpaceExW(
            PCWSTR::from_raw(path_wide.as_ptr()),
            Some(&mut free_bytes_available),
            Some(&mut total_number_of_bytes),
            Some(&mut total_number_of_free_bytes),
        )
        .map_err(|e| io::Error::from_raw_os_error(e.code().0))?;
    }

    let total = total_number_of_bytes;
    if total == 0 {
        return Err(io::Error::other(format!(
            "total disk size is 0 for '{}'",
            path.display()
        )));
    }

    let free = free_bytes_available;
    let used = total.saturating_sub(free);
    let used_percent = used as f64 / total as f64 * 100.0;

    Ok(DiskUsage {
        total,
        free,
        used,
        used_percent,
    })
}

/// Cluster size: sectors-per-cluster × bytes-per-sector.
pub(super) fn block_size(path: &Path) -> io::Result<u64> {
    let path_wide = to_wide_path(path);

    let mut sectors_per_cluster = 0u32;
    let mut bytes_per_sector = 0u32;
    let mut number_of_free_clusters = 0u32;
    let mut total_number_of_clusters = 0u32;

    // SAFETY:
    // 1. `path_wide` is a valid null-terminated UTF-16 string.
    // 2. Pointers to `u32` variables are valid and point to initialized stack memory.
    unsafe {
        GetDiskFreeSpaceW(
            PCWSTR::from_raw(path_wide.as_ptr()),
            Some(&mut sectors_per_cluster),
            Some(&mut bytes_per_sector),
            Some(&mut number_of_free_clusters),
            Some(&mut total_number_of_clusters),
        )
        .map_err(|e| io::Error::from_raw_os_error(e.code().0))?;
    }

    Ok(u64::from(sectors_per_cluster) * u64::from(bytes_per_sector))
}

fn to_wide_path(path: &Path) -> Vec<u16> {
    path.as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}
