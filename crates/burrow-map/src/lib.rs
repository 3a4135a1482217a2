//! Burrow Map — disk-backed maps over the Burrow storage engine
//!
//! Exposes an ordinary key-to-value map whose entries live in a storage
//! engine rather than on the heap, so a map's contents can outgrow working
//! memory without the caller touching serialization or disk access.
//!
//! # Architecture
//!
//! - A [`MapFactory`] owns one engine handle and the file pair
//!   `<name>.db` / `<name>.lg` in its base directory
//! - Each [`PersistentMap`] is two coordinated trees: a data tree
//!   (key → value) and an index tree (key → sentinel) whose key sets mirror
//!   each other; presence and cardinality read the index tree only
//! - A shared [`CommitCoordinator`] batches mutations into periodic
//!   durability checkpoints; crossing any map's commit threshold checkpoints
//!   the engine and resets every sibling map's counter
//! - [`PersistentMap::values`] is lazy end-to-end: a single forward cursor,
//!   a one-element look-ahead, and no materialization unless
//!   [`LazyValues::to_vec`] is called explicitly

pub mod coordinator;
pub mod error;
pub mod factory;
pub mod map;
pub mod sentinel;
pub mod values;

pub use coordinator::CommitCoordinator;
pub use error::{MapError, MapResult};
pub use factory::MapFactory;
pub use map::PersistentMap;
pub use sentinel::{Sentinel, SentinelCodec};
pub use values::{LazyValues, ValuesIter};

// Re-export the engine-side seam types callers need to create maps
pub use burrow_core::{
    BurrowError, BytesCodec, Codec, KeyComparator, OrdComparator, StrCodec, U64Codec,
};
