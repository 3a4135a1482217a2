//! Pluggable key/value serialization and key ordering
//!
//! Trees do not constrain their key and value types beyond what the caller's
//! codec and comparator can handle. The engine itself only ever sees bytes.

use std::cmp::Ordering;

use crate::error::{BurrowError, BurrowResult};

/// Converts values of one type to and from their stored byte form.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> BurrowResult<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> BurrowResult<T>;
}

/// Total order over decoded keys. Trees iterate in this order.
pub trait KeyComparator<K>: Send + Sync {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their `Ord` implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdComparator;

impl<K: Ord> KeyComparator<K> for OrdComparator {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// UTF-8 string codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrCodec;

impl Codec<String> for StrCodec {
    fn encode(&self, value: &String) -> BurrowResult<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> BurrowResult<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| BurrowError::Codec {
            reason: format!("invalid UTF-8 in stored string: {}", e),
        })
    }
}

/// Little-endian u64 codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Codec;

impl Codec<u64> for U64Codec {
    fn encode(&self, value: &u64) -> BurrowResult<Vec<u8>> {
        Ok(value.to_le_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> BurrowResult<u64> {
        let arr: [u8; 8] = bytes.try_into().map_err(|_| BurrowError::Codec {
            reason: format!("expected 8 bytes for u64, got {}", bytes.len()),
        })?;
        Ok(u64::from_le_bytes(arr))
    }
}

/// Identity codec for raw byte values.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn encode(&self, value: &Vec<u8>) -> BurrowResult<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> BurrowResult<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
