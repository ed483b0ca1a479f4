//! Abstract storage trait for the decision ledger.
//!
//! The ledger is append-only and strictly ordered: an override appends a
//! new entry referencing the same frame rather than rewriting history, so
//! the full audit trail is always reconstructible from `list()`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evidence::FrameId;
use crate::ruling::Ruling;

/// Errors that can occur during ledger storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A lock guarding ledger state was poisoned.
    #[error("Ledger lock poisoned: {context}")]
    LockPoisoned {
        /// Which operation observed the poisoned lock.
        context: &'static str,
    },

    /// Journal I/O failed.
    #[error("Journal error: {message}")]
    Journal {
        /// Underlying I/O description.
        message: String,
    },

    /// A journal line failed to parse during replay.
    #[error("Corrupt journal entry at line {line}: {message}")]
    Corrupt {
        /// 1-based line number in the journal file.
        line: usize,
        /// Parse failure description.
        message: String,
    },
}

/// Position of an entry in the ledger, assigned at append time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    /// Creates an entry ID from its raw sequence number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One persisted record in the decision ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Append position; strictly increasing.
    pub id: EntryId,

    /// The ruling state at the time of this entry.
    pub ruling: Ruling,

    /// When the entry was appended.
    pub recorded_at: DateTime<Utc>,
}

/// Storage trait for the decision ledger.
///
/// # Ordering and isolation
/// - `append` is serialized with respect to itself; entry IDs reflect
///   strict insertion order and `list()` never reorders.
/// - Reads may proceed concurrently with appends and must never observe a
///   partially written entry.
pub trait DecisionStore: Send + Sync {
    /// Appends a ruling state as a new entry, returning its ID.
    fn append(&self, ruling: Ruling) -> Result<EntryId, StorageError>;

    /// The most recent entry for a frame, if any. Override entries win
    /// over the original fusion entry by construction (they are newer).
    fn latest(&self, frame_id: FrameId) -> Result<Option<LedgerEntry>, StorageError>;

    /// All entries for a frame, in append order.
    fn history(&self, frame_id: FrameId) -> Result<Vec<LedgerEntry>, StorageError>;

    /// All entries, in append order.
    fn list(&self) -> Result<Vec<LedgerEntry>, StorageError>;

    /// Number of entries appended so far.
    fn len(&self) -> Result<usize, StorageError>;

    /// True when nothing has been appended.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}
