//! In-memory cache of the most recent pin per source

use crate::package::PackageRecord;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Most recently pinned package per normalized source url.
///
/// Not persisted; a restart starts empty.
#[derive(Debug, Default)]
pub struct RecentPins {
    entries: Mutex<HashMap<String, PackageRecord>>,
}

impl RecentPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `record.url`
    pub fn record(&self, record: PackageRecord) {
        self.lock().insert(record.url.clone(), record);
    }

    /// Copy of all current entries, in no particular order
    pub fn snapshot(&self) -> Vec<PackageRecord> {
        self.lock().values().cloned().collect()
    }

    pub fn get(&self, url: &str) -> Option<PackageRecord> {
        self.lock().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the guard cannot leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, PackageRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
