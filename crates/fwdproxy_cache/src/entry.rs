use bytes::Bytes;

/// Contents of one cache slot.
///
/// `recency` is a stamp from the table's insert clock: larger means inserted
/// later. Reads never change it.
#[derive(Clone, Debug, Default)]
pub struct CacheEntry {
    pub url: String,
    pub payload: Bytes,
    pub recency: u64,
    pub occupied: bool,
}

impl CacheEntry {
    pub fn holds(&self, key: &str) -> bool {
        self.occupied && self.url == key
    }

    pub(crate) fn clear(&mut self) {
        self.url.clear();
        self.payload = Bytes::new();
        self.recency = 0;
        self.occupied = false;
    }
}

/// Read-only view of an occupied slot, for diagnostics and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub index: usize,
    pub url: String,
    pub size: usize,
    pub recency: u64,
}
