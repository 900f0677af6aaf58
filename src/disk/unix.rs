use std::io;
use std::path::Path;

use nix::sys::statfs::statfs;

use super::DiskUsage;

/// Capacity snapshot via `statfs`.
///
/// `free` is `f_bavail` (blocks available to unprivileged callers), not
/// `f_bfree`, so reserved blocks count as used.
pub(super) fn disk_usage(path: &Path) -> io::Result<DiskUsage> {
    let stat = statfs(path)?;

    let bsize = fragment_size(stat.block_size() as i64);
    let total = (stat.blocks() as u64).saturating_mul(bsize);
    if total == 0 {
        return Err(io::Error::other(format!(
            "total disk size is 0 for '{}'",
            path.display()
        )));
    }

    let free = (stat.blocks_available() as u64).saturating_mul(bsize);
    let used = total.saturating_sub(free);
    let used_percent = used as f64 / total as f64 * 100.0;

    Ok(DiskUsage {
        total,
        free,
        used,
        used_percent,
    })
}

/// The filesystem's preferred block size.
pub(super) fn block_size(path: &Path) -> io::Result<u64> {
    let stat = statfs(path)?;
    Ok(fragment_size(stat.block_size() as i64))
}

fn fragment_size(bsize: i64) -> u64 {
    bsize.max(0) as u64
}
