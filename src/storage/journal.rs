//! Durable decision journal.
//!
//! Append-only JSON-lines file: one serialized [`LedgerEntry`] per line,
//! flushed on every append, replayed on open to rebuild the in-memory
//! index. The format is deliberately a full-scan audit log—any line-based
//! tool can read the decision history.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::Utc;

use crate::evidence::FrameId;
use crate::ruling::Ruling;
use crate::storage::traits::{DecisionStore, EntryId, LedgerEntry, StorageError};

fn io_err(err: &std::io::Error) -> StorageError {
    StorageError::Journal {
        message: err.to_string(),
    }
}

#[derive(Debug, Default)]
struct JournalState {
    entries: Vec<LedgerEntry>,
    latest: HashMap<FrameId, usize>,
}

impl JournalState {
    fn push(&mut self, entry: LedgerEntry) {
        let frame_id = entry.ruling.frame_id;
        let index = self.entries.len();
        self.entries.push(entry);
        self.latest.insert(frame_id, index);
    }
}

/// File-backed ledger with replay-on-open recovery.
#[derive(Debug)]
pub struct JournalDecisionStore {
    path: PathBuf,
    state: RwLock<JournalState>,
    writer: Mutex<BufWriter<File>>,
}

impl JournalDecisionStore {
    /// Opens (or creates) a journal file and replays its entries.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Journal` on I/O failure and
    /// `StorageError::Corrupt` when an existing line fails to parse.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let mut state = JournalState::default();
        match File::open(&path) {
            Ok(file) => {
                let reader = BufReader::new(file);
                for (idx, line) in reader.lines().enumerate() {
                    let line = line.map_err(|e| io_err(&e))?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let entry: LedgerEntry =
                        serde_json::from_str(&line).map_err(|e| StorageError::Corrupt {
                            line: idx + 1,
                            message: e.to_string(),
                        })?;
                    state.push(entry);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(&e)),
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_err(&e))?;

        Ok(Self {
            path,
            state: RwLock::new(state),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// The journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DecisionStore for JournalDecisionStore {
    fn append(&self, ruling: Ruling) -> Result<EntryId, StorageError> {
        // State write lock first, then the writer lock; append order in the
        // file matches entry IDs.
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::LockPoisoned { context: "append" })?;

        let id = EntryId::new(state.entries.len() as u64);
        let entry = LedgerEntry {
            id,
            ruling,
            recorded_at: Utc::now(),
        };

        let line = serde_json::to_string(&entry).map_err(|e| StorageError::Journal {
            message: e.to_string(),
        })?;

        {
            let mut writer = self
                .writer
                .lock()
                .map_err(|_| StorageError::LockPoisoned { context: "journal" })?;
            writer.write_all(line.as_bytes()).map_err(|e| io_err(&e))?;
            writer.write_all(b"\n").map_err(|e| io_err(&e))?;
            writer.flush().map_err(|e| io_err(&e))?;
        }

        state.push(entry);
        Ok(id)
    }

    fn latest(&self, frame_id: FrameId) -> Result<Option<LedgerEntry>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::LockPoisoned { context: "latest" })?;
        Ok(state
            .latest
            .get(&frame_id)
            .map(|&idx| state.entries[idx].clone()))
    }

    fn history(&self, frame_id: FrameId) -> Result<Vec<LedgerEntry>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::LockPoisoned { context: "history" })?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.ruling.frame_id == frame_id)
            .cloned()
            .collect())
    }

    fn list(&self) -> Result<Vec<LedgerEntry>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::LockPoisoned { context: "list" })?;
        Ok(state.entries.clone())
    }

    fn len(&self) -> Result<usize, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::LockPoisoned { context: "len" })?;
        Ok(state.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certainty::Certainty;
    use crate::ruling::Verdict;

    fn ruling(frame: u64, verdict: Verdict) -> Ruling {
        Ruling::fused(
            FrameId::new(frame),
            verdict,
            Certainty::new(90.0).unwrap(),
        )
    }

    #[test]
    fn test_replay_rebuilds_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");

        {
            let store = JournalDecisionStore::open(&path).unwrap();
            store.append(ruling(1, Verdict::HandballPenalty)).unwrap();
            store.append(ruling(2, Verdict::NoHandball)).unwrap();
            store.append(ruling(1, Verdict::NoHandball)).unwrap();
        }

        let reopened = JournalDecisionStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 3);
        let latest = reopened.latest(FrameId::new(1)).unwrap().unwrap();
        assert_eq!(latest.ruling.verdict, Verdict::NoHandball);
        assert_eq!(latest.id.value(), 2);

        // Appends continue the sequence after replay.
        let id = reopened.append(ruling(3, Verdict::NoHandball)).unwrap();
        assert_eq!(id.value(), 3);
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JournalDecisionStore::open(dir.path().join("fresh.jsonl")).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");

        {
            let store = JournalDecisionStore::open(&path).unwrap();
            store.append(ruling(1, Verdict::NoHandball)).unwrap();
        }
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"{not json\n")
            .unwrap();

        let err = JournalDecisionStore::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 2, .. }));
    }
}
