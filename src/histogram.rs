//! Time-windowed aggregation of scanned files.
//!
//! Per-file sorting over millions of backups would cost memory proportional
//! to the tree; bucketing by a fixed time window keeps the threshold
//! computation bounded by the number of distinct windows instead.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

use crate::timestamp::floor_to_window;

/// One scanned regular file.
#[derive(Debug, Clone)]
pub(crate) struct FileRecord {
    pub(crate) path: PathBuf,
    pub(crate) size: u64,
    pub(crate) block_size: u64,
    pub(crate) mod_time: SystemTime,
}

/// One histogram bucket: every record whose modification time falls in
/// `[slot_time, slot_time + window)`.
#[derive(Debug)]
pub(crate) struct TimeSlot {
    pub(crate) slot_time: SystemTime,
    pub(crate) files: Vec<FileRecord>,
    pub(crate) total_size: u64,
    pub(crate) total_block_size: u64,
}

impl TimeSlot {
    fn new(slot_time: SystemTime) -> Self {
        Self {
            slot_time,
            files: Vec::new(),
            total_size: 0,
            total_block_size: 0,
        }
    }
}

/// Slot map shared by all scan workers.
pub(crate) struct TimeSlotHistogram {
    window: Duration,
    slots: Mutex<HashMap<SystemTime, TimeSlot>>,
}

impl TimeSlotHistogram {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Add a record to its slot, creating the slot on first use.
    pub(crate) fn add(&self, record: FileRecord) {
        let slot_time = floor_to_window(record.mod_time, self.window);

        let mut slots = self.slots.lock();
        let slot = slots
            .entry(slot_time)
            .or_insert_with(|| TimeSlot::new(slot_time));
        slot.total_size += record.size;
        slot.total_block_size += record.block_size;
        slot.files.push(record);
    }

    pub(crate) fn total_files(&self) -> usize {
        self.slots.lock().values().map(|slot| slot.files.len()).sum()
    }

    pub(crate) fn total_size(&self) -> u64 {
        self.slots.lock().values().map(|slot| slot.total_size).sum()
    }

    /// Consume the histogram, returning slots sorted oldest first.
    pub(crate) fn finalize(self) -> Vec<TimeSlot> {
        let mut slots: Vec<TimeSlot> = self.slots.into_inner().into_values().collect();
        slots.sort_by_key(|slot| slot.slot_time);
        slots
    }
}
