//! Core storage engine
//!
//! BurrowEngine keeps the whole keyspace resident in a RAM working set and
//! makes it durable through an append-only log plus periodic snapshot
//! checkpoints. Trees are carved out of the flat keyspace by a 4-byte id
//! prefix on every stored key.
//!
//! **Read path**: RAM via RwLock, concurrent readers
//! **Write path**: log-first, then RAM - if the log append fails, RAM is
//! never modified
//! **Checkpoint**: `commit()` syncs the log; once the log outgrows the
//! configured threshold the keyspace is rewritten into the snapshot file and
//! the log is truncated

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::config::EngineConfig;
use crate::datafile;
use crate::error::{BurrowError, BurrowResult};
use crate::format::Op;
use crate::log::{self, LogWriter};

/// Identifier of one tree within an engine's keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(u32);

impl TreeId {
    /// The 4-byte prefix under which this tree's keys live.
    pub(crate) fn prefix(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

/// Extract the tree id prefix from a stored key, if it has one.
fn key_tree_id(key: &[u8]) -> Option<u32> {
    let prefix: [u8; 4] = key.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(prefix))
}

/// Append a tree prefix to user key bytes.
pub(crate) fn prefixed_key(prefix: &[u8; 4], key_bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + key_bytes.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(key_bytes);
    out
}

/// Storage engine: RAM keyspace + mutation log + snapshot checkpoints.
///
/// All public methods take `&self`; readers run concurrently through the
/// RwLock and writers serialize through the log Mutex.
pub struct BurrowEngine {
    /// RAM working set - prefixed key to value bytes
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
    /// Mutation log - single writer via Mutex
    log: Mutex<LogWriter>,
    /// Next tree id to hand out
    next_tree_id: AtomicU32,
    /// Set once by `close()`; all operations fail afterwards
    closed: AtomicBool,
    /// Checkpoints issued since open
    commits: AtomicU64,
    /// Snapshot file path (`<prefix>.db`)
    data_path: PathBuf,
    config: EngineConfig,
}

impl BurrowEngine {
    /// Open or create an engine whose files are `<path_prefix>.db` and
    /// `<path_prefix>.lg`.
    ///
    /// Loads the snapshot if one exists, then replays the log over it, and
    /// reconstructs the tree-id allocator from the highest id seen.
    pub fn open<P: AsRef<Path>>(path_prefix: P, config: EngineConfig) -> BurrowResult<Self> {
        config.validate()?;

        let data_path = suffixed(path_prefix.as_ref(), ".db");
        let log_path = suffixed(path_prefix.as_ref(), ".lg");

        let mut max_id = 0u32;
        let mut data: HashMap<Vec<u8>, Vec<u8>> = HashMap::new();

        for (key, value) in datafile::load_snapshot(&data_path)? {
            if let Some(id) = key_tree_id(&key) {
                max_id = max_id.max(id);
            }
            data.insert(key, value);
        }

        let records = log::replay(&log_path)?;
        let replayed = records.len();
        for record in records {
            match record.op {
                Op::Put => {
                    if let Some(id) = key_tree_id(&record.key) {
                        max_id = max_id.max(id);
                    }
                    data.insert(record.key, record.value);
                }
                Op::Delete => {
                    data.remove(&record.key);
                }
                Op::DropTree => {
                    if let Some(id) = key_tree_id(&record.key) {
                        max_id = max_id.max(id);
                        let prefix = id.to_le_bytes();
                        data.retain(|k, _| !k.starts_with(&prefix));
                    }
                }
            }
        }

        if replayed > 0 || !data.is_empty() {
            debug!(entries = data.len(), replayed, "recovered engine state");
        }

        let log = LogWriter::new(&log_path)?;

        Ok(Self {
            data: RwLock::new(data),
            log: Mutex::new(log),
            next_tree_id: AtomicU32::new(max_id + 1),
            closed: AtomicBool::new(false),
            commits: AtomicU64::new(0),
            data_path,
            config,
        })
    }

    /// Hand out the next unused tree id. See [`Tree::create`].
    ///
    /// [`Tree::create`]: crate::tree::Tree::create
    pub(crate) fn allocate_tree_id(&self) -> BurrowResult<TreeId> {
        self.check_open()?;
        Ok(TreeId(self.next_tree_id.fetch_add(1, Ordering::Relaxed)))
    }

    /// Issue a durability checkpoint.
    ///
    /// Syncs every pending log append to persistent storage. When the log
    /// has outgrown `compact_threshold_bytes`, the keyspace is rewritten
    /// into the snapshot file and the log truncated.
    pub fn commit(&self) -> BurrowResult<()> {
        self.check_open()?;
        let mut log = self.log.lock();
        log.sync()?;

        if log.size() > self.config.compact_threshold_bytes {
            let log_size = log.size();
            {
                let data = self.data.read();
                datafile::write_snapshot(&self.data_path, data.iter())?;
            }
            log.truncate()?;
            debug!(log_size, "compacted log into snapshot");
        }

        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Flush everything and mark the engine closed. Idempotent.
    ///
    /// The final state is folded into the snapshot file so a later engine
    /// can open it without replaying a log. Operations after close fail
    /// with `EngineClosed`.
    pub fn close(&self) -> BurrowResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut log = self.log.lock();
        log.sync()?;
        {
            let data = self.data.read();
            datafile::write_snapshot(&self.data_path, data.iter())?;
        }
        log.truncate()?;
        debug!("engine closed");
        Ok(())
    }

    /// Drop every key belonging to a tree.
    pub fn delete_tree(&self, id: TreeId) -> BurrowResult<()> {
        self.check_open()?;
        self.append(&id.prefix(), &[], Op::DropTree)?;
        let prefix = id.prefix();
        let mut data = self.data.write();
        data.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }

    /// Checkpoints issued since this engine was opened.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Number of entries in the whole keyspace, across all trees.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if no tree holds any entry.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    // ------------------------------------------------------------------
    // Raw keyspace operations consumed by Tree
    // ------------------------------------------------------------------

    pub(crate) fn insert_raw(
        &self,
        key: &[u8],
        value: &[u8],
        overwrite: bool,
    ) -> BurrowResult<Option<Vec<u8>>> {
        self.check_open()?;

        if !overwrite {
            let data = self.data.read();
            if let Some(prev) = data.get(key) {
                // Existing entry wins; nothing is written
                return Ok(Some(prev.clone()));
            }
        }

        self.append(key, value, Op::Put)?;
        let mut data = self.data.write();
        Ok(data.insert(key.to_vec(), value.to_vec()))
    }

    pub(crate) fn find_raw(&self, key: &[u8]) -> BurrowResult<Option<Vec<u8>>> {
        self.check_open()?;
        let data = self.data.read();
        Ok(data.get(key).cloned())
    }

    pub(crate) fn remove_raw(&self, key: &[u8]) -> BurrowResult<Option<Vec<u8>>> {
        self.check_open()?;

        {
            let data = self.data.read();
            if !data.contains_key(key) {
                // Absent key: no log traffic
                return Ok(None);
            }
        }

        self.append(key, &[], Op::Delete)?;
        let mut data = self.data.write();
        Ok(data.remove(key))
    }

    /// All user key bytes (prefix stripped) currently stored under a tree
    /// prefix. Unordered.
    pub(crate) fn prefix_keys(&self, prefix: &[u8; 4]) -> Vec<Vec<u8>> {
        let data = self.data.read();
        data.keys()
            .filter(|k| k.starts_with(prefix))
            .map(|k| k[4..].to_vec())
            .collect()
    }

    /// Count entries under a tree prefix.
    pub(crate) fn prefix_count(&self, prefix: &[u8; 4]) -> usize {
        let data = self.data.read();
        data.keys().filter(|k| k.starts_with(prefix)).count()
    }

    fn append(&self, key: &[u8], value: &[u8], op: Op) -> BurrowResult<()> {
        let mut log = self.log.lock();
        if self.config.transactions {
            log.append_durable(key, value, op)
        } else {
            log.append_fast(key, value, op)
        }
    }

    fn check_open(&self) -> BurrowResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BurrowError::EngineClosed);
        }
        Ok(())
    }
}

/// `<prefix>` + extension, preserving any dots already in the name.
fn suffixed(prefix: &Path, ext: &str) -> PathBuf {
    let mut os = prefix.as_os_str().to_os_string();
    os.push(ext);
    PathBuf::from(os)
}
