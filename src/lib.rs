//! chained-hashmap: a separate-chaining hash table over fixed-size byte
//! keys and values, with interchangeable bucket layouts and compact
//! entry handles.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one chaining algorithm, several physical layouts, so storage
//!   can be tuned for lookup-heavy or enumeration-heavy workloads without
//!   touching the probing logic.
//! - Layers:
//!   - `ElementArray`: a growable run of equally sized byte elements.
//!   - `BucketStore`: how one bucket keeps its hashes, keys and values.
//!     Three stores ship: `InterleavedStore`, `HashSeparatedStore` and
//!     `FullySeparatedStore`.
//!   - `Chained<L>`: the chaining algorithm over any store. It implements
//!     `Backend`, the slot-level interface the table talks to.
//!   - `HashTable<B>`: the façade. Owns the sizing metadata and the
//!     hash/compare policy, and turns slot coordinates into `Entry`
//!     handles.
//!   - `Dictionary<B>`: a `HashTable` that grows itself once the load
//!     factor reaches 0.75.
//!
//! Slots
//! - Every slot stores a 64-bit word next to its key. Bit 63 marks a
//!   tombstone, bit 62 marks that a value has been written, and the low
//!   62 bits hold the truncated key hash.
//! - Removal tombstones a slot in place; it is never shifted. An
//!   insertion into a bucket reuses the first tombstone before growing
//!   the chain.
//! - A key can be reserved without a value (`entry_for_key`). Such a slot
//!   counts as live, shows up in key enumeration, and reads as `None`
//!   until `set_entry` writes it.
//!
//! Entries
//! - An `Entry` packs `(bucket + 1, item)` into a nonzero `u64`: the low
//!   bits are wide enough for `bucket_count + 1`, the item index sits
//!   above them. Decoding needs the bucket count current when the entry
//!   was made, so any rehash invalidates every outstanding entry.
//! - Handles are not generational. A stale entry may resolve to an
//!   unrelated slot; out-of-range ones resolve to nothing.
//!
//! Rehashing
//! - The table only knows how to rehash. Deciding when belongs to
//!   `Dictionary` or to the caller.
//! - Stores may redistribute in place (the interleaved store moves whole
//!   records and drops tombstones). Others fall back to rebuilding a
//!   fresh backend from enumeration.
//!
//! Notes and non-goals
//! - Single-threaded: no internal synchronization.
//! - Keys are hashed and compared as raw bytes by default; custom
//!   closures can replace either.
//! - Enumerators borrow the table, so the table cannot be mutated while
//!   one is alive.

mod array;
mod backend;
mod chained;
mod dictionary;
mod entry;
mod enumerator;
mod error;
mod fully_separated;
mod hash_separated;
mod hash_table;
mod hash_table_proptest;
mod interleaved;
mod policy;
pub mod rehash;
mod slot_hash;

// Public surface
pub use array::ElementArray;
pub use backend::{Backend, Cursor, Direction, Reservation};
pub use chained::{BucketStore, Chained};
pub use dictionary::{next_bucket_count, Dictionary, SizeHint, BUCKET_SIZES, REHASH_LOAD_FACTOR};
pub use entry::{decode, decode_raw, encode, Entry, SlotIndex};
pub use enumerator::{Enumerator, EnumeratorAction, EnumeratorKind};
pub use error::TableError;
pub use fully_separated::{FullySeparated, FullySeparatedStore};
pub use hash_separated::{HashSeparated, HashSeparatedStore};
pub use hash_table::{HashTable, HashTableBuilder, Iter, DEFAULT_BUCKET_COUNT};
pub use interleaved::{Interleaved, InterleavedStore};
pub use policy::{structural_hash, KeyComparator, KeyHasher, KeyPolicy};
pub use slot_hash::SlotHash;
