use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tracing::debug;

use crate::{
    entry::SlotSnapshot,
    policy::{CachePolicy, RejectReason},
    slot::Slot,
    stats::{CacheStats, CacheStatsSnapshot},
};

/// Result of [`CacheTable::insert`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored in `slot`; `evicted` names the url that previously lived there.
    Stored { slot: usize, evicted: Option<String> },
    Rejected(RejectReason),
}

/// Fixed-size table of cached responses keyed by the exact request target.
///
/// Eviction order is insertion order among the surviving entries: the insert
/// clock stamps the slot being written and nothing else ever touches
/// `recency`, so hits do not refresh an entry.
#[derive(Debug)]
pub struct CacheTable {
    slots: Box<[Slot]>,
    clock: AtomicU64,
    policy: CachePolicy,
    stats: CacheStats,
}

impl CacheTable {
    /// Preallocates `capacity` slots (at least one).
    pub fn new(capacity: usize, policy: CachePolicy) -> Self {
        let slots = (0..capacity.max(1)).map(|_| Slot::default()).collect();
        Self {
            slots,
            clock: AtomicU64::new(0),
            policy,
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Index of the first slot holding `key`. Each slot is read-locked only
    /// while it is compared.
    pub fn find(&self, key: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.read().holds(key))
    }

    /// Payload of slot `index`, provided it still holds `key`.
    pub fn get(&self, index: usize, key: &str) -> Option<Bytes> {
        let entry = self.slots.get(index)?.read();
        entry.holds(key).then(|| entry.payload.clone())
    }

    /// `find` + `get` under a single read admission per slot. Counts a hit or
    /// a miss; never changes recency.
    pub fn lookup(&self, key: &str) -> Option<Bytes> {
        let found = self.slots.iter().find_map(|slot| {
            let entry = slot.read();
            entry.holds(key).then(|| entry.payload.clone())
        });

        match &found {
            Some(payload) => {
                self.stats.hit();
                debug!(target: "fwdproxy::cache", %key, size = payload.len(), "Cache hit");
            }
            None => {
                self.stats.miss();
                debug!(target: "fwdproxy::cache", %key, "Cache miss");
            }
        }

        found
    }

    /// Store `payload` under `key`.
    ///
    /// Target slot: the one already holding `key`, else the first empty slot,
    /// else the occupied slot with the smallest recency. The written slot gets
    /// the next clock value; afterwards every other slot is visited under its
    /// write lock and an older copy of `key` (left by a concurrent insert) is
    /// cleared, so at most one slot holds a given url.
    pub fn insert(&self, key: &str, payload: Bytes) -> InsertOutcome {
        if let Err(reason) = self.policy.check(key, payload.len()) {
            self.stats.rejection();
            debug!(target: "fwdproxy::cache", %key, %reason, "Not caching response");
            return InsertOutcome::Rejected(reason);
        }

        let target = self.select_slot(key);
        let size = payload.len();

        let (stamp, evicted) = {
            let mut entry = self.slots[target].write();
            let evicted = if entry.occupied && entry.url != key {
                Some(std::mem::take(&mut entry.url))
            } else {
                None
            };
            entry.url.clear();
            entry.url.push_str(key);
            entry.payload = payload;
            entry.occupied = true;
            entry.recency = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
            (entry.recency, evicted)
        };

        self.age_others(target, key, stamp);

        self.stats.insert();
        if let Some(old) = &evicted {
            self.stats.eviction();
            debug!(
                target: "fwdproxy::cache",
                slot = target,
                evicted = %old,
                "Evicted cache entry"
            );
        }
        debug!(
            target: "fwdproxy::cache",
            %key,
            slot = target,
            size,
            recency = stamp,
            "Stored response in cache"
        );

        InsertOutcome::Stored {
            slot: target,
            evicted,
        }
    }

    fn select_slot(&self, key: &str) -> usize {
        let mut first_empty = None;
        let mut oldest: Option<(usize, u64)> = None;

        for (index, slot) in self.slots.iter().enumerate() {
            let entry = slot.read();
            if entry.holds(key) {
                return index;
            }
            if !entry.occupied {
                first_empty.get_or_insert(index);
                continue;
            }
            if oldest.is_none_or(|(_, recency)| entry.recency < recency) {
                oldest = Some((index, entry.recency));
            }
        }

        first_empty
            .or(oldest.map(|(index, _)| index))
            .unwrap_or(0)
    }

    fn age_others(&self, target: usize, key: &str, stamp: u64) {
        for (index, slot) in self.slots.iter().enumerate() {
            if index == target {
                continue;
            }
            let mut entry = slot.write();
            if entry.holds(key) && entry.recency < stamp {
                entry.clear();
                debug!(
                    target: "fwdproxy::cache",
                    %key,
                    slot = index,
                    "Dropped older duplicate cache entry"
                );
            }
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.read().occupied).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let entry = slot.read();
                entry.occupied.then(|| SlotSnapshot {
                    index,
                    url: entry.url.clone(),
                    size: entry.payload.len(),
                    recency: entry.recency,
                })
            })
            .collect()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
