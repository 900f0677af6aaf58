//! Choose the deletion cut-off from the ordered slot histogram.

use std::time::{Duration, SystemTime};

use crate::histogram::TimeSlot;

/// The chosen cut-off and the deletion it is expected to cause.
///
/// A `None` cutoff means nothing needs deleting. `files` and `bytes` are
/// scan-time estimates; the delete phase recounts what it actually removes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ThresholdDecision {
    pub(crate) cutoff: Option<SystemTime>,
    pub(crate) files: usize,
    pub(crate) bytes: u64,
}

impl ThresholdDecision {
    fn none() -> Self {
        Self {
            cutoff: None,
            files: 0,
            bytes: 0,
        }
    }
}

/// Cut-off for a known byte budget.
///
/// Accumulates slots oldest first until the budget is covered; the cut-off
/// is the end of the slot that crossed it, so the whole slot is included.
/// When even the full histogram cannot cover the budget, the cut-off lands
/// past the newest slot and everything scanned is deleted.
pub(crate) fn budget_cutoff(slots: &[TimeSlot], budget: u64, window: Duration) -> ThresholdDecision {
    let Some(last) = slots.last() else {
        return ThresholdDecision::none();
    };

    let mut cutoff = last.slot_time + window;
    let mut bytes = 0u64;
    let mut files = 0usize;

    for slot in slots {
        bytes += slot.total_block_size;
        files += slot.files.len();
        if bytes >= budget {
            cutoff = slot.slot_time + window;
            break;
        }
    }

    ThresholdDecision {
        cutoff: Some(cutoff),
        files,
        bytes,
    }
}

/// Cut-off for absolute mode: bring the scanned block total under `cap`.
pub(crate) fn absolute_cutoff(slots: &[TimeSlot], cap: u64, window: Duration) -> ThresholdDecision {
    let mut remaining: u64 = slots.iter().map(|slot| slot.total_block_size).sum();
    if remaining <= cap {
        return ThresholdDecision::none();
    }

    let mut cutoff = None;
    let mut bytes = 0u64;
    let mut files = 0usize;

    for slot in slots {
        remaining -= slot.total_block_size;
        bytes += slot.total_block_size;
        files += slot.files.len();
        cutoff = Some(slot.slot_time + window);
        if remaining <= cap {
            break;
        }
    }

    ThresholdDecision {
        cutoff,
        files,
        bytes,
    }
}
