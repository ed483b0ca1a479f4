//! Decision ledger storage.
//!
//! The trait defines the append-only contract; backends provide an
//! in-memory implementation for embedded use and tests, and a durable
//! JSON-lines journal behind the `persistent` feature.

mod memory;
mod traits;

#[cfg(feature = "persistent")]
mod journal;

pub use memory::InMemoryDecisionStore;
pub use traits::{DecisionStore, EntryId, LedgerEntry, StorageError};

#[cfg(feature = "persistent")]
pub use journal::JournalDecisionStore;
