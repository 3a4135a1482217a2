//! Append-only mutation log
//!
//! One `.lg` file per engine. Mutations are appended as CRC32C-checked
//! records; with transactions disabled the append only reaches the OS page
//! cache and `sync()` is what makes a batch durable. After a checkpoint has
//! folded the log into the snapshot file, `truncate()` resets it.
//!
//! Replay walks the file record by record. A torn record at the tail is the
//! crash point and ends replay cleanly; corruption in the middle is skipped
//! by scanning forward to the next magic marker.

use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{BurrowError, BurrowResult};
use crate::format::{deserialize_record, serialize_record, LogRecord, Op, HEADER_SIZE, MAGIC_ARRAY};
use crate::sync::durable_sync;

/// Appends records to the engine's log file.
pub struct LogWriter {
    file: File,
    path: PathBuf,
    /// Current file size in bytes (tracked to avoid stat calls)
    size: u64,
}

impl LogWriter {
    /// Open the log file for appending, creating it if absent.
    pub fn new<P: AsRef<Path>>(path: P) -> BurrowResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| BurrowError::Io {
                path: Some(path.clone()),
                kind: e.kind(),
                message: format!("failed to open log file: {}", e),
            })?;

        let size = file
            .metadata()
            .map_err(|e| BurrowError::Io {
                path: Some(path.clone()),
                kind: e.kind(),
                message: format!("failed to stat log file: {}", e),
            })?
            .len();

        Ok(Self { file, path, size })
    }

    /// Append a record and durably sync it before returning.
    ///
    /// Write ordering: serialize, append, sync, return. Only after this
    /// returns Ok may the caller update the RAM working set.
    pub fn append_durable(&mut self, key: &[u8], value: &[u8], op: Op) -> BurrowResult<()> {
        self.append_fast(key, value, op)?;
        self.sync()
    }

    /// Append a record WITHOUT syncing. Data lands in the OS page cache and
    /// is only guaranteed durable after the next `sync()`.
    pub fn append_fast(&mut self, key: &[u8], value: &[u8], op: Op) -> BurrowResult<()> {
        use std::io::Write;

        let record_bytes = serialize_record(key, value, op)?;

        self.file.write_all(&record_bytes).map_err(|e| BurrowError::Io {
            path: Some(self.path.clone()),
            kind: e.kind(),
            message: format!("log write failed: {}", e),
        })?;

        self.size += record_bytes.len() as u64;
        Ok(())
    }

    /// Sync the log file to persistent storage without writing any record.
    /// One sync makes every preceding `append_fast` durable at once.
    pub fn sync(&self) -> BurrowResult<()> {
        durable_sync(&self.file).map_err(|e| BurrowError::Io {
            path: Some(self.path.clone()),
            kind: e.kind(),
            message: format!("log sync failed: {}", e),
        })
    }

    /// Reset the log to empty after its contents have been checkpointed.
    pub fn truncate(&mut self) -> BurrowResult<()> {
        self.file.set_len(0).map_err(|e| BurrowError::Io {
            path: Some(self.path.clone()),
            kind: e.kind(),
            message: format!("log truncate failed: {}", e),
        })?;
        self.size = 0;
        self.sync()
    }

    /// Current log file size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current log file path (for diagnostics).
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Replay every recoverable record from a log file, in write order.
///
/// A missing file yields an empty vec. A torn record at the tail stops
/// replay (that is the crash point); corrupt records in the middle are
/// skipped by resynchronizing on the next magic marker.
pub fn replay<P: AsRef<Path>>(path: P) -> BurrowResult<Vec<LogRecord>> {
    let path = path.as_ref();

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(BurrowError::Io {
                path: Some(path.to_path_buf()),
                kind: e.kind(),
                message: format!("failed to open log for replay: {}", e),
            })
        }
    };

    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer).map_err(|e| BurrowError::Io {
        path: Some(path.to_path_buf()),
        kind: e.kind(),
        message: format!("failed to read log file: {}", e),
    })?;

    let mut records = Vec::new();
    let mut offset = 0;

    while offset + HEADER_SIZE <= buffer.len() {
        if buffer[offset..offset + 4] != MAGIC_ARRAY {
            warn!(offset, "bad magic in log, scanning for next record");
            match find_next_magic(&buffer, offset + 1) {
                Some(next) => {
                    offset = next;
                    continue;
                }
                None => break,
            }
        }

        let length = u32::from_le_bytes([
            buffer[offset + 4],
            buffer[offset + 5],
            buffer[offset + 6],
            buffer[offset + 7],
        ]) as usize;
        let total_size = HEADER_SIZE + length;

        if offset + total_size > buffer.len() {
            // Torn write - the record started but never completed. This is
            // the crash point; everything after it is garbage.
            warn!(
                offset,
                need = total_size,
                have = buffer.len() - offset,
                "torn record at log tail, stopping replay"
            );
            break;
        }

        match deserialize_record(&buffer[offset..offset + total_size]) {
            Ok(record) => {
                records.push(record);
                offset += total_size;
            }
            Err(e) => {
                warn!(offset, error = %e, "corrupt log record, resynchronizing");
                match find_next_magic(&buffer, offset + 1) {
                    Some(next) => {
                        offset = next;
                        continue;
                    }
                    None => break,
                }
            }
        }
    }

    Ok(records)
}

/// Scan forward for the next occurrence of the magic marker.
fn find_next_magic(buffer: &[u8], start: usize) -> Option<usize> {
    (start..buffer.len().saturating_sub(3)).find(|&i| buffer[i..i + 4] == MAGIC_ARRAY)
}
