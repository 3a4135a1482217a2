//! Snapshot data file
//!
//! The `.db` file holds one complete checkpoint of the engine's keyspace.
//! Each entry carries a CRC32C checksum so silent corruption (bit rot) is
//! detected at load time. A snapshot is written to a temp file, synced, and
//! renamed over the previous one, so the `.db` file is always either the old
//! snapshot or the new one, never a mix.
//!
//! Entry layout: SnapshotHeader (16 bytes) + key_bytes + value_bytes
//!   [0..4]   magic:     [u8;4] - "BRRW"
//!   [4..6]   key_len:   u16 LE
//!   [6..10]  value_len: u32 LE
//!   [10..14] checksum:  u32 LE - CRC32C of (key_bytes + value_bytes)
//!   [14..16] reserved:  [u8;2]

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{BurrowError, BurrowResult};
use crate::format::MAGIC_ARRAY;
use crate::sync::durable_sync;

const SNAPSHOT_HEADER_SIZE: usize = 16;

fn io_err(path: &Path, e: std::io::Error, what: &str) -> BurrowError {
    BurrowError::Io {
        path: Some(path.to_path_buf()),
        kind: e.kind(),
        message: format!("{}: {}", what, e),
    }
}

/// Write a full snapshot of the keyspace to `path`, atomically.
pub fn write_snapshot<'a, P, I>(path: P, entries: I) -> BurrowResult<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (&'a Vec<u8>, &'a Vec<u8>)>,
{
    let path = path.as_ref();
    let tmp_path = {
        let mut os = path.as_os_str().to_os_string();
        os.push(".tmp");
        std::path::PathBuf::from(os)
    };

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(|e| io_err(&tmp_path, e, "failed to create snapshot temp file"))?;

    for (key, value) in entries {
        let mut checked = Vec::with_capacity(key.len() + value.len());
        checked.extend_from_slice(key);
        checked.extend_from_slice(value);
        let checksum = crc32c::crc32c(&checked);

        let mut header = [0u8; SNAPSHOT_HEADER_SIZE];
        header[0..4].copy_from_slice(&MAGIC_ARRAY);
        header[4..6].copy_from_slice(&(key.len() as u16).to_le_bytes());
        header[6..10].copy_from_slice(&(value.len() as u32).to_le_bytes());
        header[10..14].copy_from_slice(&checksum.to_le_bytes());

        file.write_all(&header)
            .and_then(|_| file.write_all(key))
            .and_then(|_| file.write_all(value))
            .map_err(|e| io_err(&tmp_path, e, "snapshot write failed"))?;
    }

    durable_sync(&file).map_err(|e| io_err(&tmp_path, e, "snapshot sync failed"))?;
    drop(file);

    std::fs::rename(&tmp_path, path)
        .map_err(|e| io_err(path, e, "snapshot rename failed"))?;
    Ok(())
}

/// Load every entry from a snapshot file.
///
/// A missing file is an empty snapshot. Corruption inside the file is a hard
/// error - snapshots are written atomically, so a damaged one means the
/// storage itself has gone bad.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> BurrowResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let path = path.as_ref();

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(path, e, "failed to open snapshot")),
    };

    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)
        .map_err(|e| io_err(path, e, "failed to read snapshot"))?;

    let mut entries = Vec::new();
    let mut offset = 0;

    while offset < buffer.len() {
        if offset + SNAPSHOT_HEADER_SIZE > buffer.len() {
            return Err(BurrowError::TornWrite {
                expected_size: SNAPSHOT_HEADER_SIZE as u32,
                available_bytes: (buffer.len() - offset) as u64,
                offset: offset as u64,
            });
        }

        if buffer[offset..offset + 4] != MAGIC_ARRAY {
            let mut found = [0u8; 4];
            found.copy_from_slice(&buffer[offset..offset + 4]);
            return Err(BurrowError::NoMagicFound {
                offset: offset as u64,
                found_bytes: found,
            });
        }

        let key_len = u16::from_le_bytes([buffer[offset + 4], buffer[offset + 5]]) as usize;
        let value_len = u32::from_le_bytes([
            buffer[offset + 6],
            buffer[offset + 7],
            buffer[offset + 8],
            buffer[offset + 9],
        ]) as usize;
        let checksum = u32::from_le_bytes([
            buffer[offset + 10],
            buffer[offset + 11],
            buffer[offset + 12],
            buffer[offset + 13],
        ]);

        let key_start = offset + SNAPSHOT_HEADER_SIZE;
        let value_end = key_start + key_len + value_len;
        if value_end > buffer.len() {
            return Err(BurrowError::TornWrite {
                expected_size: (key_len + value_len) as u32,
                available_bytes: (buffer.len() - key_start) as u64,
                offset: key_start as u64,
            });
        }

        let computed = crc32c::crc32c(&buffer[key_start..value_end]);
        if computed != checksum {
            return Err(BurrowError::ChecksumMismatch {
                expected: checksum,
                actual: computed,
                offset: key_start as u64,
            });
        }

        entries.push((
            buffer[key_start..key_start + key_len].to_vec(),
            buffer[key_start + key_len..value_end].to_vec(),
        ));
        offset = value_end;
    }

    Ok(entries)
}
