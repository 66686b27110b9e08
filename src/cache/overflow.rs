//! Overflow Store Module
//!
//! Capacity-bounded secondary store for passivated entries, backed by one
//! append-only JSON-lines log per region. Only offsets are kept in memory;
//! values stay on disk until they are activated.
//!
//! Log format: one record per line, either
//! `{"op":"put","key":..,"value":..,"created_at":..}` or
//! `{"op":"remove","key":..}`. The latest record for a key wins on replay.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};
use xxhash_rust::xxh64::xxh64;

/// Dead records tolerated before compaction is considered.
const MIN_DEAD_RECORDS_FOR_COMPACTION: usize = 64;
/// Compact once dead records outnumber live entries by this factor.
const COMPACTION_RATIO: usize = 2;

// == Log Records ==
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum LogRecord {
    Put {
        key: String,
        value: Value,
        created_at: u64,
    },
    Remove {
        key: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum LogRecordRef<'a> {
    Put {
        key: &'a str,
        value: &'a Value,
        created_at: u64,
    },
    Remove {
        key: &'a str,
    },
}

// == Passivated Entry ==
/// An entry read back from the overflow store.
#[derive(Debug, Clone, PartialEq)]
pub struct PassivatedEntry {
    pub value: Value,
    pub created_at: u64,
}

/// Location of a live `put` record in the log.
#[derive(Debug, Clone, Copy)]
struct Slot {
    offset: u64,
    len: u64,
    seq: u64,
    created_at: u64,
}

// == Overflow Store ==
#[derive(Debug)]
pub struct OverflowStore {
    path: PathBuf,
    file: File,
    /// Live keys and where their record sits
    index: HashMap<String, Slot>,
    /// Live keys by store order (first = oldest)
    by_age: BTreeMap<u64, String>,
    next_seq: u64,
    /// Current log length
    end: u64,
    /// Records in the log that no longer describe a live entry
    dead_records: usize,
    max_entries: usize,
    #[cfg(test)]
    fail_writes: bool,
}

impl OverflowStore {
    // == Open ==
    /// Opens the log for `region` under `dir`.
    ///
    /// With `purge` the existing log is deleted first; otherwise it is
    /// replayed. A truncated trailing record is cut off and corrupt records
    /// are skipped.
    pub async fn open(dir: &Path, region: &str, max_entries: usize, purge: bool) -> io::Result<Self> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(log_file_name(region));

        if purge {
            match fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Purged overflow log"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        let file = open_log(&path).await?;
        let mut store = Self {
            path,
            file,
            index: HashMap::new(),
            by_age: BTreeMap::new(),
            next_seq: 0,
            end: 0,
            dead_records: 0,
            max_entries,
            #[cfg(test)]
            fail_writes: false,
        };

        store.replay().await?;
        while store.index.len() > store.max_entries {
            store.discard_oldest().await?;
        }

        debug!(
            path = %store.path.display(),
            entries = store.index.len(),
            "Overflow store opened"
        );
        Ok(store)
    }

    async fn replay(&mut self) -> io::Result<()> {
        let data = fs::read(&self.path).await?;
        let mut offset = 0usize;
        let mut records = 0usize;

        while offset < data.len() {
            let Some(newline) = data[offset..].iter().position(|b| *b == b'\n') else {
                warn!(
                    path = %self.path.display(),
                    offset,
                    "Discarding truncated overflow record"
                );
                break;
            };

            let line = &data[offset..offset + newline];
            records += 1;
            match serde_json::from_slice::<LogRecord>(line) {
                Ok(LogRecord::Put { key, created_at, .. }) => {
                    self.track(key, offset as u64, newline as u64, created_at);
                }
                Ok(LogRecord::Remove { key }) => {
                    self.untrack(&key);
                }
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        offset,
                        error = %e,
                        "Skipping corrupt overflow record"
                    );
                }
            }
            offset += newline + 1;
        }

        if offset < data.len() {
            self.file.set_len(offset as u64).await?;
        }
        self.end = offset as u64;
        self.dead_records = records - self.index.len();
        Ok(())
    }

    // == Store ==
    /// Writes an entry, discarding the oldest stored entry first when full.
    pub async fn store(&mut self, key: &str, value: &Value, created_at: u64) -> io::Result<()> {
        if !self.index.contains_key(key) && self.index.len() >= self.max_entries {
            self.discard_oldest().await?;
        }

        let (offset, len) = self
            .append(&LogRecordRef::Put {
                key,
                value,
                created_at,
            })
            .await?;
        if self.track(key.to_string(), offset, len, created_at) {
            self.dead_records += 1;
        }

        self.maybe_compact().await
    }

    // == Load ==
    /// Reads and removes an entry.
    ///
    /// The key leaves the index before the read, so a failed read loses it.
    pub async fn load(&mut self, key: &str) -> io::Result<Option<PassivatedEntry>> {
        let Some(slot) = self.untrack(key) else {
            return Ok(None);
        };

        let bytes = self.read_slot(slot).await?;
        let entry = match serde_json::from_slice::<LogRecord>(&bytes)? {
            LogRecord::Put {
                key: stored,
                value,
                created_at,
            } if stored == key => PassivatedEntry { value, created_at },
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "overflow record at offset {} does not hold key '{}'",
                        slot.offset, key
                    ),
                ))
            }
        };

        // The value is already in hand; a missing tombstone only means a
        // stale copy may come back on the next replay.
        self.dead_records += 1;
        match self.append(&LogRecordRef::Remove { key }).await {
            Ok(_) => self.dead_records += 1,
            Err(e) => warn!(path = %self.path.display(), key, error = %e, "Failed to record overflow removal"),
        }
        if let Err(e) = self.maybe_compact().await {
            warn!(path = %self.path.display(), error = %e, "Overflow compaction failed");
        }

        Ok(Some(entry))
    }

    // == Remove ==
    /// Deletes an entry without reading it. Returns whether it was present.
    pub async fn remove(&mut self, key: &str) -> io::Result<bool> {
        if self.untrack(key).is_none() {
            return Ok(false);
        }
        self.append(&LogRecordRef::Remove { key }).await?;
        self.dead_records += 2;
        self.maybe_compact().await?;
        Ok(true)
    }

    // == Clear ==
    pub async fn clear(&mut self) -> io::Result<()> {
        self.file.set_len(0).await?;
        self.index.clear();
        self.by_age.clear();
        self.end = 0;
        self.dead_records = 0;
        Ok(())
    }

    // == Compact ==
    /// Rewrites the log with live records only, via a temp file and rename.
    pub async fn compact(&mut self) -> io::Result<()> {
        let temp_path = self.path.with_extension("log.tmp");
        let mut temp = File::create(&temp_path).await?;

        let live: Vec<(u64, String)> = self
            .by_age
            .iter()
            .map(|(seq, key)| (*seq, key.clone()))
            .collect();

        let mut index = HashMap::with_capacity(live.len());
        let mut offset = 0u64;
        for (seq, key) in live {
            let Some(slot) = self.index.get(&key).copied() else {
                continue;
            };
            let mut line = self.read_slot(slot).await?;
            line.push(b'\n');
            temp.write_all(&line).await?;
            index.insert(
                key,
                Slot {
                    offset,
                    len: slot.len,
                    seq,
                    created_at: slot.created_at,
                },
            );
            offset += slot.len + 1;
        }
        temp.flush().await?;
        temp.sync_all().await?;
        drop(temp);

        fs::rename(&temp_path, &self.path).await?;
        self.file = open_log(&self.path).await?;

        debug!(
            path = %self.path.display(),
            dropped = self.dead_records,
            live = index.len(),
            "Compacted overflow log"
        );
        self.index = index;
        self.end = offset;
        self.dead_records = 0;
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Creation time of a stored entry, without reading it from disk.
    pub fn created_at(&self, key: &str) -> Option<u64> {
        self.index.get(key).map(|slot| slot.created_at)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dead_records(&self) -> usize {
        self.dead_records
    }

    // == Internals ==
    /// Indexes a put record; returns true when it replaced an older one.
    fn track(&mut self, key: String, offset: u64, len: u64, created_at: u64) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;

        let previous = self.index.insert(
            key.clone(),
            Slot {
                offset,
                len,
                seq,
                created_at,
            },
        );
        if let Some(old) = previous {
            self.by_age.remove(&old.seq);
        }
        self.by_age.insert(seq, key);
        previous.is_some()
    }

    fn untrack(&mut self, key: &str) -> Option<Slot> {
        let slot = self.index.remove(key)?;
        self.by_age.remove(&slot.seq);
        Some(slot)
    }

    async fn discard_oldest(&mut self) -> io::Result<()> {
        let Some((_, key)) = self.by_age.pop_first() else {
            return Ok(());
        };
        self.index.remove(&key);
        self.append(&LogRecordRef::Remove { key: &key }).await?;
        self.dead_records += 2;
        debug!(path = %self.path.display(), key = %key, "Overflow store full, discarded oldest entry");
        Ok(())
    }

    async fn append(&mut self, record: &LogRecordRef<'_>) -> io::Result<(u64, u64)> {
        let mut line = serde_json::to_vec(record)?;
        let len = line.len() as u64;
        line.push(b'\n');

        if let Err(e) = self.write_line(&line).await {
            // Drop whatever part of the record reached the file
            if let Err(truncate) = self.file.set_len(self.end).await {
                warn!(
                    path = %self.path.display(),
                    error = %truncate,
                    "Failed to cut partial overflow record"
                );
                if let Ok(meta) = fs::metadata(&self.path).await {
                    self.end = meta.len();
                }
            }
            return Err(e);
        }

        let offset = self.end;
        self.end += len + 1;
        Ok((offset, len))
    }

    #[cfg(not(test))]
    async fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.file.write_all(line).await?;
        self.file.flush().await
    }

    /// With `fail_writes` set, writes half the record and fails like a full disk.
    #[cfg(test)]
    async fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            self.file.write_all(&line[..line.len() / 2]).await?;
            self.file.flush().await?;
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.file.write_all(line).await?;
        self.file.flush().await
    }

    #[cfg(test)]
    pub(crate) fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    async fn read_slot(&mut self, slot: Slot) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(slot.offset)).await?;
        let mut buf = vec![0u8; slot.len as usize];
        self.file.read_exact(&mut buf).await?;
        Ok(buf)
    }

    async fn maybe_compact(&mut self) -> io::Result<()> {
        if self.dead_records >= MIN_DEAD_RECORDS_FOR_COMPACTION
            && self.dead_records > self.index.len() * COMPACTION_RATIO
        {
            self.compact().await?;
        }
        Ok(())
    }
}

async fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .await
}

/// Log file name for a region.
///
/// The sanitized name keeps the file recognizable; the hash of the raw name
/// keeps regions whose names sanitize alike in separate logs.
pub fn log_file_name(region: &str) -> String {
    format!(
        "{}-{:016x}.log",
        sanitize_file_name(region),
        xxh64(region.as_bytes(), 0)
    )
}

/// Maps a region name onto a safe file name.
pub fn sanitize_file_name(region: &str) -> String {
    let name: String = region
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        format!("_{}", name)
    } else {
        name
    }
}
