//! Burrow Core — ordered-tree storage engine
//!
//! A key-value engine whose working set lives in RAM and whose durability
//! comes from an append-only mutation log plus snapshot checkpoints. The
//! flat byte keyspace is carved into independent *trees* by a 4-byte id
//! prefix; each tree carries its own comparator and key/value codecs, so
//! callers work with typed, ordered maps while the engine only ever moves
//! bytes.
//!
//! # Architecture
//!
//! - **Read path**: RAM hash table behind an RwLock
//! - **Write path**: log-first, then RAM (a failed append never mutates RAM)
//! - **Checkpoint**: `commit()` syncs the log and, past a size threshold,
//!   folds it into the `.db` snapshot file
//!
//! Adapters that expose higher-level container contracts live in separate
//! crates (e.g. burrow-map).

pub mod codec;
pub mod config;
pub mod datafile;
pub mod engine;
pub mod error;
pub mod format;
pub mod log;
pub mod sync;
pub mod tree;

// Re-export key types for convenience
pub use codec::{BytesCodec, Codec, KeyComparator, OrdComparator, StrCodec, U64Codec};
pub use config::{CacheMode, EngineConfig};
pub use engine::{BurrowEngine, TreeId};
pub use error::{BurrowError, BurrowResult};
pub use tree::{Tree, TreeCursor, Tuple};
