use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entry::CacheEntry;

/// One preallocated cache slot behind its own readers/writer lock.
///
/// Any number of readers may hold the slot at once; a writer waits until
/// every reader has released it. Guards must never be held across an
/// `.await`.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    entry: RwLock<CacheEntry>,
}

impl Slot {
    // Entries are replaced field by field under the write guard with no
    // fallible step in between, so a poisoned lock still holds a usable entry.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, CacheEntry> {
        self.entry.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, CacheEntry> {
        self.entry.write().unwrap_or_else(PoisonError::into_inner)
    }
}
