//! Sentinel value for the index tree
//!
//! The index tree mirrors the data tree's key set but its values carry no
//! information; every slot holds the same fixed placeholder. Presence and
//! cardinality queries read the index tree and therefore never run a real
//! value codec — which matters when a value codec can itself reach back into
//! maps of this kind.

use burrow_core::{BurrowError, BurrowResult, Codec};

/// The content-irrelevant placeholder stored against every index-tree key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sentinel;

const SENTINEL_BYTES: [u8; 4] = [0, 0, 0, 0];

/// Fixed codec for [`Sentinel`]: always four zero bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentinelCodec;

impl Codec<Sentinel> for SentinelCodec {
    fn encode(&self, _value: &Sentinel) -> BurrowResult<Vec<u8>> {
        Ok(SENTINEL_BYTES.to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> BurrowResult<Sentinel> {
        if bytes.len() != SENTINEL_BYTES.len() {
            return Err(BurrowError::Codec {
                reason: format!("sentinel must be {} bytes, got {}", SENTINEL_BYTES.len(), bytes.len()),
            });
        }
        Ok(Sentinel)
    }
}
