//! Fixed-capacity response cache shared by every connection.
//!
//! The table is a preallocated array of slots. Each slot carries its own
//! readers/writer lock; nothing ever locks the whole table, so lookups and
//! the eviction scan look at one slot at a time and the eviction choice is
//! best-effort under concurrent inserts.

mod entry;
mod policy;
mod slot;
mod stats;
mod table;

pub use entry::{CacheEntry, SlotSnapshot};
pub use policy::{CachePolicy, RejectReason};
pub use stats::CacheStatsSnapshot;
pub use table::{CacheTable, InsertOutcome};
