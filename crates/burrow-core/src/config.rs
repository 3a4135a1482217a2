//! Engine configuration
//!
//! Two knobs matter: whether each mutation is individually durable
//! (`transactions`), and how large the log may grow before a commit folds it
//! into the snapshot file (`compact_threshold_bytes`).

use crate::error::{BurrowError, BurrowResult};

/// Caching strategy for the engine's working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Keep the working set resident in RAM. The only supported mode.
    #[default]
    Normal,
}

/// Burrow engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Working-set caching strategy
    pub cache: CacheMode,
    /// When true, every mutation is durably synced before the call returns.
    /// When false, mutations reach the OS page cache only and durability
    /// comes from explicit `commit()` checkpoints.
    pub transactions: bool,
    /// Log size that triggers compaction into the snapshot file on commit
    pub compact_threshold_bytes: u64,
}

impl EngineConfig {
    /// Validate all configuration parameters
    pub fn validate(&self) -> BurrowResult<()> {
        if self.compact_threshold_bytes < 4096 {
            return Err(BurrowError::InvalidConfig {
                reason: "compact_threshold_bytes must be >= 4096".into(),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheMode::Normal,
            transactions: false,
            compact_threshold_bytes: 4 * 1024 * 1024,
        }
    }
}
