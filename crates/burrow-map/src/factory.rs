//! Map factory — lifecycle owner for an engine and its maps
//!
//! One factory owns one engine handle and every map built on it. The engine
//! files are the pair `<name>.db` / `<name>.lg` inside the base directory,
//! exclusively owned by this factory: any pre-existing pair is deleted on
//! open, and the pair is deleted again after disposal.
//!
//! Disposal is explicit - callers release the factory with `dispose()` on
//! every exit path. The `Drop` impl is a last-resort safety net only, and
//! failures on that path are swallowed (an accepted silent-leak risk);
//! failures during an explicit `dispose()` surface normally.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use burrow_core::{BurrowEngine, BurrowError, Codec, EngineConfig, KeyComparator, Tree, TreeId};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::coordinator::CommitCoordinator;
use crate::error::{MapError, MapResult};
use crate::map::PersistentMap;
use crate::sentinel::SentinelCodec;

/// Tree pair owned by one map, retained for disposal.
struct MapRegistration {
    data_tree: TreeId,
    index_tree: TreeId,
}

/// Creates maps over one shared storage engine and tears them down together.
pub struct MapFactory {
    base_dir: PathBuf,
    name: String,
    engine: Arc<BurrowEngine>,
    coordinator: Arc<CommitCoordinator>,
    /// `None` once disposed - the idempotency guard
    registry: Mutex<Option<Vec<MapRegistration>>>,
}

impl MapFactory {
    /// Open a factory whose engine files live in `base_dir` under `name`.
    ///
    /// Any pre-existing `<name>.db` / `<name>.lg` pair is deleted first; a
    /// deletion failure is an error. The engine is opened with the normal
    /// working-set cache and transactions disabled - durability comes only
    /// from the periodic checkpoints driven by the maps' commit thresholds.
    pub fn open<P: AsRef<Path>>(base_dir: P, name: &str) -> MapResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_dir).map_err(|e| {
            MapError::Storage(BurrowError::Io {
                path: Some(base_dir.clone()),
                kind: e.kind(),
                message: format!("failed to create base directory: {}", e),
            })
        })?;

        clear_files(&base_dir, name)?;

        let config = EngineConfig {
            transactions: false,
            ..EngineConfig::default()
        };
        let engine = Arc::new(BurrowEngine::open(base_dir.join(name), config)?);
        let coordinator = Arc::new(CommitCoordinator::new(Arc::clone(&engine)));

        Ok(Self {
            base_dir,
            name: name.to_string(),
            engine,
            coordinator,
            registry: Mutex::new(Some(Vec::new())),
        })
    }

    /// Create a new map on the factory's engine.
    ///
    /// `commit_threshold` is the number of write events on this map that
    /// trigger a shared durability checkpoint (higher = faster, lower =
    /// less unsynced data at risk). Must be at least 1.
    pub fn create_map<K: 'static, V: 'static>(
        &self,
        comparator: impl KeyComparator<K> + Clone + 'static,
        key_codec: impl Codec<K> + Clone + 'static,
        value_codec: impl Codec<V> + 'static,
        commit_threshold: u64,
    ) -> MapResult<PersistentMap<K, V>> {
        if commit_threshold == 0 {
            return Err(MapError::InvalidCommitThreshold);
        }

        let data = Tree::create(
            Arc::clone(&self.engine),
            comparator.clone(),
            key_codec.clone(),
            value_codec,
        )?;
        let index = Tree::create(Arc::clone(&self.engine), comparator, key_codec, SentinelCodec)?;

        {
            let mut registry = self.registry.lock();
            match registry.as_mut() {
                Some(registrations) => registrations.push(MapRegistration {
                    data_tree: data.id(),
                    index_tree: index.id(),
                }),
                None => return Err(MapError::Storage(BurrowError::EngineClosed)),
            }
        }

        let slot = self.coordinator.register(commit_threshold);
        Ok(PersistentMap::new(data, index, Arc::clone(&self.coordinator), slot))
    }

    /// Destroy every map created by this factory and delete the backing
    /// store. Idempotent: the second and later calls perform no engine
    /// operations and return Ok.
    pub fn dispose(&self) -> MapResult<()> {
        let registrations = match self.registry.lock().take() {
            Some(r) => r,
            None => return Ok(()),
        };

        for registration in &registrations {
            self.engine.delete_tree(registration.data_tree)?;
            self.engine.delete_tree(registration.index_tree)?;
        }
        self.engine.commit()?;
        self.engine.close()?;
        clear_files(&self.base_dir, &self.name)?;

        debug!(name = %self.name, maps = registrations.len(), "factory disposed");
        Ok(())
    }

    /// The shared engine handle (diagnostics and tests).
    pub fn engine(&self) -> &BurrowEngine {
        &self.engine
    }
}

impl std::fmt::Debug for MapFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapFactory")
            .field("base_dir", &self.base_dir)
            .field("name", &self.name)
            .field("entries", &self.engine.len())
            .finish()
    }
}

impl Drop for MapFactory {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            warn!(error = %e, "disposal safety net failed, backing files may remain");
        }
    }
}

/// Delete the factory's backing file pair. Missing files are fine; a file
/// that exists but cannot be deleted is an error.
fn clear_files(base_dir: &Path, name: &str) -> MapResult<()> {
    for ext in [".db", ".lg"] {
        let path = base_dir.join(format!("{}{}", name, ext));
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(MapError::Storage(BurrowError::Io {
                    path: Some(path),
                    kind: e.kind(),
                    message: format!("failed to delete backing file: {}", e),
                }))
            }
        }
    }
    Ok(())
}
