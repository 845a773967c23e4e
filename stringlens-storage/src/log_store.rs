// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Log-backed record store
//!
//! Keeps every live record in an in-memory index and, when opened on a
//! directory, mirrors each change into an append-only log. The log is replayed
//! on open and can be compacted down to live records.
//!
//! ## Log format
//!
//! ```text
//! [magic "SLRS"][version u32 LE]
//! [entry type u8][len u32 LE][json payload][crc32 u32 LE]  (repeated)
//! ```
//!
//! Entry type 1 carries a full [`PropertyRecord`], type 2 a tombstone with the
//! deleted content hash. Replay skips damaged entries and resumes at the next
//! entry whose CRC checks out. A partial entry at the end of the file is cut
//! off so later appends stay readable, and a failed append is rolled back.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use stringlens_core::{FilterCriteria, PropertyRecord, Result, StringLensError};

use crate::error::StorageError;
use crate::store::{RecordStore, StoreStatistics};

const LOG_FILE_NAME: &str = "records.log";
const RECORD_LOG_MAGIC: &[u8; 4] = b"SLRS";
const RECORD_LOG_VERSION: u32 = 1;
const HEADER_LEN: u64 = 8;
const ENTRY_TYPE_INSERT: u8 = 1;
const ENTRY_TYPE_DELETE: u8 = 2;
/// Type byte, length prefix, and trailing CRC
const ENTRY_OVERHEAD: usize = 1 + 4 + 4;

/// Options for [`LogRecordStore::open_with_config`]
#[derive(Debug, Clone)]
pub struct LogStoreConfig {
    /// Rewrite the log on open when dead entries outnumber live records
    pub compact_on_open: bool,
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            compact_on_open: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Tombstone {
    id: String,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    seq: u64,
    record: PropertyRecord,
}

#[derive(Debug, Default)]
struct Index {
    records: HashMap<String, StoredRecord>,
    next_seq: u64,
    /// Log entries that no longer describe a live record
    dead_entries: usize,
}

impl Index {
    fn put(&mut self, record: PropertyRecord) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self
            .records
            .insert(record.content_hash.clone(), StoredRecord { seq, record })
            .is_some()
        {
            self.dead_entries += 1;
        }
    }

    /// Apply one checksummed log entry
    fn apply(&mut self, entry_type: u8, payload: &[u8]) {
        match entry_type {
            ENTRY_TYPE_INSERT => match serde_json::from_slice::<PropertyRecord>(payload) {
                Ok(record) => self.put(record),
                Err(e) => {
                    tracing::warn!("Unreadable record in log, skipping: {}", e);
                    self.dead_entries += 1;
                }
            },
            ENTRY_TYPE_DELETE => match serde_json::from_slice::<Tombstone>(payload) {
                Ok(tombstone) => {
                    if self.records.remove(&tombstone.id).is_some() {
                        self.dead_entries += 2;
                    } else {
                        self.dead_entries += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("Unreadable tombstone in log, skipping: {}", e);
                    self.dead_entries += 1;
                }
            },
            other => {
                tracing::warn!("Unknown entry type {} in record log", other);
                self.dead_entries += 1;
            }
        }
    }
}

/// Record store with an in-memory index and optional append-only log
pub struct LogRecordStore {
    log_path: Option<PathBuf>,
    index: RwLock<Index>,
}

impl LogRecordStore {
    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            log_path: None,
            index: RwLock::new(Index::default()),
        }
    }

    /// Open or create a store in `data_dir` with default options
    pub fn open(data_dir: impl AsRef<Path>) -> std::result::Result<Self, StorageError> {
        Self::open_with_config(data_dir, LogStoreConfig::default())
    }

    pub fn open_with_config(
        data_dir: impl AsRef<Path>,
        config: LogStoreConfig,
    ) -> std::result::Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let log_path = data_dir.join(LOG_FILE_NAME);

        let needs_header = match std::fs::metadata(&log_path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if needs_header {
            let mut file = File::create(&log_path)?;
            write_header(&mut file)?;
            file.flush()?;
        }

        let index = Self::replay(&log_path)?;
        tracing::info!(
            path = %log_path.display(),
            records = index.records.len(),
            dead_entries = index.dead_entries,
            "Opened record log"
        );

        let store = Self {
            log_path: Some(log_path),
            index: RwLock::new(index),
        };

        let should_compact = {
            let index = store.index.read();
            index.dead_entries > 0 && index.dead_entries > index.records.len()
        };
        if config.compact_on_open && should_compact {
            store.compact()?;
        }

        Ok(store)
    }

    /// Rebuild the index from the log file.
    ///
    /// A damaged entry never stops replay while valid entries follow it: the
    /// reader skips ahead to the next offset that decodes with a matching CRC.
    /// Only a partial entry at the physical end of the file is cut off.
    fn replay(path: &Path) -> std::result::Result<Index, StorageError> {
        let bytes = std::fs::read(path)?;
        if bytes.len() < HEADER_LEN as usize {
            return Err(StorageError::Corrupt(format!(
                "{} is too short to hold a record log header",
                path.display()
            )));
        }

        if &bytes[..4] != RECORD_LOG_MAGIC {
            return Err(StorageError::Corrupt(format!(
                "{} is not a record log (bad magic)",
                path.display()
            )));
        }

        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != RECORD_LOG_VERSION {
            return Err(StorageError::Corrupt(format!(
                "unsupported record log version {} (expected {})",
                version, RECORD_LOG_VERSION
            )));
        }

        let mut index = Index::default();
        let mut pos = HEADER_LEN as usize;
        while pos < bytes.len() {
            if let Some(entry) = decode_entry(&bytes, pos) {
                index.apply(entry.entry_type, entry.payload);
                pos = entry.end;
                continue;
            }

            match find_next_entry(&bytes, pos + 1) {
                Some(next) => {
                    tracing::warn!(
                        offset = pos,
                        skipped = next - pos,
                        "Corrupt region in record log, resuming at next valid entry"
                    );
                    index.dead_entries += 1;
                    pos = next;
                }
                None if is_partial_entry(&bytes, pos) => {
                    tracing::warn!(
                        valid_len = pos,
                        "Record log ends with a partial entry, truncating"
                    );
                    OpenOptions::new()
                        .write(true)
                        .open(path)?
                        .set_len(pos as u64)?;
                    break;
                }
                None => {
                    tracing::warn!(offset = pos, "Unreadable final entry in record log, skipping");
                    index.dead_entries += 1;
                    break;
                }
            }
        }

        Ok(index)
    }

    fn append(&self, entry_type: u8, data: &[u8]) -> std::result::Result<(), StorageError> {
        let Some(path) = &self.log_path else {
            return Ok(());
        };

        let mut entry = Vec::with_capacity(ENTRY_OVERHEAD + data.len());
        write_entry(&mut entry, entry_type, data)?;

        let mut file = OpenOptions::new().append(true).open(path)?;
        append_entry(&mut file, &entry)?;
        Ok(())
    }

    /// Rewrite the log so it holds only live records
    pub fn compact(&self) -> std::result::Result<(), StorageError> {
        let Some(path) = &self.log_path else {
            return Ok(());
        };

        let mut index = self.index.write();
        let mut live: Vec<&StoredRecord> = index.records.values().collect();
        live.sort_by_key(|stored| stored.seq);

        let tmp_path = path.with_extension("log.new");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            write_header(&mut writer)?;
            for stored in &live {
                let data = serde_json::to_vec(&stored.record)?;
                write_entry(&mut writer, ENTRY_TYPE_INSERT, &data)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, path)?;

        tracing::info!(
            records = live.len(),
            reclaimed = index.dead_entries,
            "Compacted record log"
        );
        index.dead_entries = 0;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_persistent(&self) -> bool {
        self.log_path.is_some()
    }
}

fn write_header(writer: &mut impl Write) -> std::io::Result<()> {
    writer.write_all(RECORD_LOG_MAGIC)?;
    writer.write_all(&RECORD_LOG_VERSION.to_le_bytes())
}

fn write_entry(writer: &mut impl Write, entry_type: u8, data: &[u8]) -> std::io::Result<()> {
    writer.write_all(&[entry_type])?;
    writer.write_all(&(data.len() as u32).to_le_bytes())?;
    writer.write_all(data)?;
    writer.write_all(&crc32fast::hash(data).to_le_bytes())
}

struct RawEntry<'a> {
    entry_type: u8,
    payload: &'a [u8],
    /// Offset just past the trailing CRC
    end: usize,
}

/// Decode the entry at `pos`. `None` when it runs past the end of the buffer
/// or its CRC does not match.
fn decode_entry(bytes: &[u8], pos: usize) -> Option<RawEntry<'_>> {
    let header = bytes.get(pos..pos.checked_add(5)?)?;
    let len = u32::from_le_bytes([header[1], header[2], header[3], header[4]]) as usize;

    let payload_start = pos + 5;
    let payload_end = payload_start.checked_add(len)?;
    let payload = bytes.get(payload_start..payload_end)?;
    let end = payload_end.checked_add(4)?;
    let crc = bytes.get(payload_end..end)?;

    if u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]) != crc32fast::hash(payload) {
        return None;
    }

    Some(RawEntry {
        entry_type: header[0],
        payload,
        end,
    })
}

/// First offset at or after `from` holding a known, intact entry
fn find_next_entry(bytes: &[u8], from: usize) -> Option<usize> {
    (from..bytes.len()).find(|&pos| {
        matches!(bytes[pos], ENTRY_TYPE_INSERT | ENTRY_TYPE_DELETE)
            && decode_entry(bytes, pos).is_some()
    })
}

/// Whether the entry at `pos` claims more bytes than the file holds
fn is_partial_entry(bytes: &[u8], pos: usize) -> bool {
    let remaining = bytes.len() - pos;
    if remaining < ENTRY_OVERHEAD {
        return true;
    }
    let len = u32::from_le_bytes([bytes[pos + 1], bytes[pos + 2], bytes[pos + 3], bytes[pos + 4]]);
    len as usize > remaining - ENTRY_OVERHEAD
}

/// Append target that can be cut back after a failed write
trait LogSink: Write {
    fn end_offset(&self) -> std::io::Result<u64>;
    fn truncate_to(&self, len: u64) -> std::io::Result<()>;
}

impl LogSink for File {
    fn end_offset(&self) -> std::io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }
}

/// Write a whole encoded entry or leave the log as it was.
fn append_entry(sink: &mut impl LogSink, entry: &[u8]) -> std::io::Result<()> {
    let offset = sink.end_offset()?;
    let written = sink.write_all(entry).and_then(|()| sink.flush());

    if let Err(e) = written {
        if let Err(rollback) = sink.truncate_to(offset) {
            tracing::error!(
                offset,
                "Failed to roll back partial record log entry: {}",
                rollback
            );
        }
        return Err(e);
    }

    Ok(())
}

impl RecordStore for LogRecordStore {
    fn insert(&self, record: PropertyRecord) -> Result<PropertyRecord> {
        let mut index = self.index.write();
        if index.records.contains_key(&record.content_hash) {
            return Err(StringLensError::Conflict(format!(
                "String already exists with hash {}",
                record.content_hash
            )));
        }

        let data = serde_json::to_vec(&record).map_err(StorageError::from)?;
        self.append(ENTRY_TYPE_INSERT, &data)?;

        tracing::debug!(hash = %record.content_hash, "Stored record");
        index.put(record.clone());
        Ok(record)
    }

    fn find_by_hash(&self, hash: &str) -> Result<Option<PropertyRecord>> {
        Ok(self
            .index
            .read()
            .records
            .get(hash)
            .map(|stored| stored.record.clone()))
    }

    fn find_by_filters(&self, criteria: &FilterCriteria) -> Result<Vec<PropertyRecord>> {
        let index = self.index.read();
        let mut matches: Vec<&StoredRecord> = index
            .records
            .values()
            .filter(|stored| criteria.matches(&stored.record))
            .collect();

        matches.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(matches.into_iter().map(|stored| stored.record.clone()).collect())
    }

    fn delete_by_hash(&self, hash: &str) -> Result<bool> {
        let mut index = self.index.write();
        if !index.records.contains_key(hash) {
            return Ok(false);
        }

        let data = serde_json::to_vec(&Tombstone { id: hash.to_string() })
            .map_err(StorageError::from)?;
        self.append(ENTRY_TYPE_DELETE, &data)?;

        index.records.remove(hash);
        index.dead_entries += 2;
        tracing::debug!(hash = %hash, "Deleted record");
        Ok(true)
    }

    fn aggregate_statistics(&self) -> Result<StoreStatistics> {
        let index = self.index.read();
        Ok(StoreStatistics::from_records(
            index.records.values().map(|stored| &stored.record),
        ))
    }
}
