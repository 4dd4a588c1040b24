//! The consumption log: a persistent, append-only record of which byte
//! ranges of each key file have already been used.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::errors::{Error, KeyStoreError};

/// Tracks non-overlapping used ranges per key-file identity, and persists
/// newly committed ranges to an append-only text log.
pub struct ConsumptionLog {
    path: PathBuf,
    used: BTreeMap<String, Vec<Range<u64>>>,
}

impl ConsumptionLog {
    /// Load (or create) the log file at `path` and reconstruct the
    /// in-memory used-range sets from it.
    pub fn load(path: impl AsRef<Path>) -> Result<ConsumptionLog, Error> {
        let path = path.as_ref().to_path_buf();
        let mut used: BTreeMap<String, Vec<Range<u64>>> = BTreeMap::new();

        if path.exists() {
            let file = File::open(&path).map_err(|_| KeyStoreError::InvalidLogFileName)?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|_| KeyStoreError::InvalidLogFileName)?;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let mut parts = line.rsplitn(3, ' ');
                let hi: u64 = parts
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or(KeyStoreError::InvalidLogFileName)?;
                let lo: u64 = parts
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or(KeyStoreError::InvalidLogFileName)?;
                let identity = parts.next().ok_or(KeyStoreError::InvalidLogFileName)?;
                insert_range(used.entry(identity.to_string()).or_default(), lo..hi);
            }
        } else {
            fs::write(&path, b"").map_err(|_| KeyStoreError::InvalidLogFileName)?;
        }

        Ok(ConsumptionLog { path, used })
    }

    /// First-fit allocation of `len` contiguous unused bytes within
    /// `[0, key_file_len)` for `identity`. Does not commit the range; call
    /// [`ConsumptionLog::commit`] once the caller has successfully used it.
    pub fn allocate(&self, identity: &str, key_file_len: u64, len: u64) -> Result<u64, Error> {
        if len == 0 {
            return Ok(0);
        }
        let used = self.used.get(identity).cloned().unwrap_or_default();
        let mut cursor = 0u64;
        for range in &used {
            if range.start >= cursor && range.start - cursor >= len {
                return Ok(cursor);
            }
            cursor = cursor.max(range.end);
        }
        if key_file_len >= cursor && key_file_len - cursor >= len {
            return Ok(cursor);
        }
        Err(KeyStoreError::RanOutOfKey.into())
    }

    /// Record `range` as consumed for `identity`, both in memory and
    /// (under an advisory exclusive file lock) in the persistent log.
    pub fn commit(&mut self, identity: &str, range: Range<u64>) -> Result<(), Error> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|_| KeyStoreError::InvalidLogFileName)?;
        file.lock_exclusive()
            .map_err(|_| KeyStoreError::InvalidLogFileName)?;
        let result = writeln!(&file, "{} {} {}", identity, range.start, range.end)
            .map_err(|_| KeyStoreError::InvalidLogFileName);
        let _ = file.unlock();
        result?;

        insert_range(self.used.entry(identity.to_string()).or_default(), range);
        Ok(())
    }
}

fn insert_range(ranges: &mut Vec<Range<u64>>, range: Range<u64>) {
    ranges.push(range);
    ranges.sort_by_key(|r| r.start);
}

/// Canonical identity string for a key file, used as the log key so the
/// same file is recognized regardless of how its path was spelled.
pub fn key_file_identity(path: &Path) -> String {
    fs::canonicalize(path)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string_lossy().into_owned())
}
