//! In-memory decision ledger.
//!
//! Thread-safe reference implementation of [`DecisionStore`]: a single
//! `RwLock` serializes appends while readers snapshot under the read
//! lock, so a reader never observes a partially written entry.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use crate::evidence::FrameId;
use crate::ruling::Ruling;
use crate::storage::traits::{DecisionStore, EntryId, LedgerEntry, StorageError};

#[derive(Debug, Default)]
struct LedgerState {
    entries: Vec<LedgerEntry>,
    // Index of the latest entry per frame, kept current on append.
    latest: HashMap<FrameId, usize>,
}

/// Thread-safe in-memory ledger.
#[derive(Debug, Default)]
pub struct InMemoryDecisionStore {
    state: RwLock<LedgerState>,
}

impl InMemoryDecisionStore {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecisionStore for InMemoryDecisionStore {
    fn append(&self, ruling: Ruling) -> Result<EntryId, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::LockPoisoned { context: "append" })?;

        let id = EntryId::new(state.entries.len() as u64);
        let frame_id = ruling.frame_id;
        let entry = LedgerEntry {
            id,
            ruling,
            recorded_at: Utc::now(),
        };

        let index = state.entries.len();
        state.entries.push(entry);
        state.latest.insert(frame_id, index);
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
