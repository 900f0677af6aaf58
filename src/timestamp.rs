use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Compute a duration from nanoseconds with saturation at [`Duration::MAX`].
pub(crate) fn saturating_duration_from_nanos(nanos: u128) -> Duration {
    let seconds = nanos / NANOS_PER_SECOND;
    if seconds > u64::MAX as u128 {
        return Duration::MAX;
    }

    let nanos_remainder = (nanos % NANOS_PER_SECOND) as u32;
    Duration::new(seconds as u64, nanos_remainder)
}

/// Convert a [`SystemTime`] to nanoseconds since `UNIX_EPOCH`.
///
/// Instants before the epoch clamp to zero; the engine treats them as
/// belonging to the oldest possible slot, which sorts them first for
/// deletion.
pub(crate) fn system_time_to_nanos(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos()
}

/// Convert nanoseconds since `UNIX_EPOCH` to a [`SystemTime`].
pub(crate) fn nanos_to_system_time(nanos: u128) -> SystemTime {
    UNIX_EPOCH + saturating_duration_from_nanos(nanos)
}

/// Floor an instant to a whole multiple of `window` since the epoch.
///
/// This is the slot key for the time histogram: every file whose
/// modification time falls in `[slot, slot + window)` maps to the same
/// result. Works in nanoseconds so sub-second windows floor correctly.
pub(crate) fn floor_to_window(instant: SystemTime, window: Duration) -> SystemTime {
    let window_nanos = window.as_nanos();
    if window_nanos == 0 {
        return instant;
    }

    let nanos = system_time_to_nanos(instant);
    nanos_to_system_time(nanos - nanos % window_nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_within_window() {
        let window = Duration::from_secs(3600);
        let base = UNIX_EPOCH + Duration::from_secs(1_000_000 * 3600);

        for offset in [0, 1, 59, 1800, 3599] {
            let floored = floor_to_window(base + Duration::from_secs(offset), window);
            assert_eq!(floored, base);
        }

        let next = floor_to_window(base + Duration::from_secs(3600), window);
        assert_eq!(next, base + window);
    }

    #[test]
    fn sub_second_window_floors_in_nanos() {
        let window = Duration::from_millis(250);
        let instant = UNIX_EPOCH + Duration::from_millis(1_130);

        let floored = floor_to_window(instant, window);
        assert_eq!(floored, UNIX_EPOCH + Duration::from_millis(1_000));
    }

    #[test]
    fn zero_window_is_identity() {
        let instant = UNIX_EPOCH + Duration::from_secs(42);
        assert_eq!(floor_to_window(instant, Duration::ZERO), instant);
    }

    #[test]
    fn pre_epoch_clamps_to_zero() {
        let instant = UNIX_EPOCH - Duration::from_secs(10);
        let floored = floor_to_window(instant, Duration::from_secs(60));
        assert_eq!(floored, UNIX_EPOCH);
    }

    #[test]
    fn nanos_round_trip() {
        let instant = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        assert_eq!(nanos_to_system_time(system_time_to_nanos(instant)), instant);
    }
}
