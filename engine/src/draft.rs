//! # Draft Persistence
//!
//! A draft is the form snapshot, saved after every edit and replayed
//! exactly once when a session reopens on the same account. Drafts are
//! keyed by account, so switching accounts never leaks a half-typed
//! payment across.
//!
//! Two stores implement the contract: an in-memory one for tests and
//! ephemeral sessions, and a sled-backed one for the real wallet. Both
//! are infallible *reads* from the session's point of view — a draft
//! that fails to load is treated as absent, because a stale or corrupt
//! draft must never block composing a fresh one.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DRAFT_TREE;
use crate::form::snapshot::FormSnapshot;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One persisted form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// The form as last edited.
    pub form: FormSnapshot,

    /// When the draft was written.
    pub saved_at: DateTime<Utc>,
}

impl Draft {
    pub fn new(form: FormSnapshot) -> Self {
        Self {
            form,
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("draft serialization error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Persistence contract for drafts, keyed by account key.
pub trait DraftStore: Send + Sync {
    /// The stored draft, or `None`. Implementations treat undecodable
    /// drafts as absent.
    fn get(&self, account_key: &str) -> Option<Draft>;

    fn save(&self, account_key: &str, draft: &Draft) -> Result<(), DraftError>;

    fn remove(&self, account_key: &str) -> Result<(), DraftError>;
}

// ---------------------------------------------------------------------------
// MemoryDraftStore
// ---------------------------------------------------------------------------

/// Drafts held in process memory. Tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: DashMap<String, Draft>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, account_key: &str) -> Option<Draft> {
        self.drafts.get(account_key).map(|d| d.clone())
    }

    fn save(&self, account_key: &str, draft: &Draft) -> Result<(), DraftError> {
        self.drafts.insert(account_key.to_string(), draft.clone());
        Ok(())
    }

    fn remove(&self, account_key: &str) -> Result<(), DraftError> {
        self.drafts.remove(account_key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SledDraftStore
// ---------------------------------------------------------------------------

/// Drafts persisted in a sled tree, bincode-encoded.
pub struct SledDraftStore {
    tree: sled::Tree,
}

impl SledDraftStore {
    /// Open (or create) the draft tree inside a database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DraftError> {
        let db = sled::open(path)?;
        let tree = db.open_tree(DRAFT_TREE)?;
        Ok(Self { tree })
    }

    /// An in-memory sled instance that vanishes on drop.
    pub fn open_temporary() -> Result<Self, DraftError> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree(DRAFT_TREE)?;
        Ok(Self { tree })
    }
}

impl DraftStore for SledDraftStore {
    fn get(&self, account_key: &str) -> Option<Draft> {
        let bytes = match self.tree.get(account_key.as_bytes()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(account = account_key, %err, "draft read failed, treating as absent");
                return None;
            }
        };
        match bincode::deserialize(&bytes) {
            Ok(draft) => Some(draft),
            Err(err) => {
                warn!(account = account_key, %err, "draft undecodable, treating as absent");
                None
            }
        }
    }

    fn save(&self, account_key: &str, draft: &Draft) -> Result<(), DraftError> {
        let bytes = bincode::serialize(draft)?;
        self.tree.insert(account_key.as_bytes(), bytes)?;
        debug!(account = account_key, "draft saved");
        Ok(())
    }

    fn remove(&self, account_key: &str) -> Result<(), DraftError> {
        self.tree.remove(account_key.as_bytes())?;
        debug!(account = account_key, "draft removed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> Draft {
        let mut form = FormSnapshot::new();
        form.set_address(0, "addr1");
        form.set_amount(0, "0.5");
        Draft::new(form)
    }

    fn exercise_store(store: &dyn DraftStore) {
        assert!(store.get("acct-1").is_none());

        let draft = sample_draft();
        store.save("acct-1", &draft).unwrap();
        assert_eq!(store.get("acct-1"), Some(draft.clone()));

        // Keys are isolated per account.
        assert!(store.get("acct-2").is_none());

        store.remove("acct-1").unwrap();
        assert!(store.get("acct-1").is_none());

        // Removing an absent draft is not an error.
        store.remove("acct-1").unwrap();
    }

    #[test]
    fn memory_store_round_trip() {
        exercise_store(&MemoryDraftStore::new());
    }

    #[test]
    fn sled_store_round_trip() {
        exercise_store(&SledDraftStore::open_temporary().unwrap());
    }

    #[test]
    fn sled_store_overwrites_in_place() {
        let store = SledDraftStore::open_temporary().unwrap();
        store.save("acct-1", &sample_draft()).unwrap();

        let mut form = FormSnapshot::new();
        form.set_amount(0, "2");
        let newer = Draft::new(form);
        store.save("acct-1", &newer).unwrap();
        assert_eq!(store.get("acct-1"), Some(newer));
    }

    #[test]
    fn sled_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let draft = sample_draft();
        {
            let store = SledDraftStore::open(dir.path()).unwrap();
            store.save("acct-1", &draft).unwrap();
        }
        let store = SledDraftStore::open(dir.path()).unwrap();
        assert_eq!(store.get("acct-1"), Some(draft));
    }

    #[test]
    fn undecodable_draft_reads_as_absent() {
        let store = SledDraftStore::open_temporary().unwrap();
        store.tree.insert(b"acct-1", b"not bincode".as_slice()).unwrap();
        assert!(store.get("acct-1").is_none());
    }
}
