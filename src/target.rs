//! Reduce the active capacity constraints to a single deletion budget.

use crate::config::CleaningConfig;
use crate::disk::DiskUsage;

/// Bytes that must be freed to satisfy every active constraint.
///
/// Each constraint yields a candidate; the largest one wins, so the
/// tightest constraint decides. Zero means everything is already
/// satisfied.
pub(crate) fn calculate_target(usage: &DiskUsage, config: &CleaningConfig) -> u64 {
    let mut target = 0u64;

    if let Some(max_size) = config.max_size
        && usage.used > max_size
    {
        target = target.max(usage.used - max_size);
    }

    if let Some(percent) = config.max_usage_percent
        && usage.used_percent > percent
    {
        let target_used = (usage.total as f64 * (percent / 100.0)) as u64;
        if usage.used > target_used {
            target = target.max(usage.used - target_used);
        }
    }

    if let Some(min_free) = config.min_free_space
        && usage.free < min_free
    {
        target = target.max(min_free - usage.free);
    }

    target
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn usage(total: u64, used: u64) -> DiskUsage {
        DiskUsage {
            total,
            used,
            free: total - used,
            used_percent: used as f64 / total as f64 * 100.0,
        }
    }

    #[test]
    fn max_size_candidate() {
        let config = CleaningConfig::builder().max_size(5 * GIB).build();
        assert_eq!(calculate_target(&usage(10 * GIB, 8 * GIB), &config), 3 * GIB);
    }

    #[test]
    fn max_usage_percent_candidate() {
        let config = CleaningConfig::builder().max_usage_percent(60.0).build();
        assert_eq!(calculate_target(&usage(10 * GIB, 8 * GIB), &config), 2 * GIB);
    }

    #[test]
    fn min_free_space_candidate() {
        let config = CleaningConfig::builder().min_free_space(4 * GIB).build();
        assert_eq!(calculate_target(&usage(10 * GIB, 8 * GIB), &config), 2 * GIB);
    }

    #[test]
    fn tightest_constraint_wins() {
        // Candidates: max_size 2 GiB, percent 3 GiB, free space 1 GiB.
        let config = CleaningConfig::builder()
            .max_size(6 * GIB)
            .max_usage_percent(50.0)
            .min_free_space(3 * GIB)
            .build();
        assert_eq!(calculate_target(&usage(10 * GIB, 8 * GIB), &config), 3 * GIB);
    }

    #[test]
    fn satisfied_constraints_yield_zero() {
        let config = CleaningConfig::builder()
            .max_size(6 * GIB)
            .max_usage_percent(60.0)
            .min_free_space(3 * GIB)
            .build();
        assert_eq!(calculate_target(&usage(10 * GIB, 4 * GIB), &config), 0);
    }

    #[test]
    fn percent_exactly_at_limit_is_satisfied() {
        let config = CleaningConfig::builder().max_usage_percent(80.0).build();
        assert_eq!(calculate_target(&usage(10 * GIB, 8 * GIB), &config), 0);
    }
}
