//! Edit session: working buffer over the committed document
//!
//! Editor panels change the buffer through path-addressed mutations. Nothing
//! reaches the store until [`EditSession::commit`], and then only the whole
//! committed document is written.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::assets::ResolvedAsset;
use crate::document::{Document, EntryId, Node, Path};
use crate::engine::{Applied, Mutation, PathError};
use crate::storage::{loader, Store, StoreError, CONTENT_KEY};

/// Whether the buffer differs from the committed document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Clean,
    Dirty,
}

/// Record of a successful write
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub at: DateTime<Utc>,
    pub bytes: usize,
    /// SHA-256 of the written snapshot, hex encoded
    pub digest: String,
}

impl CommitReceipt {
    fn for_snapshot(text: &str) -> Self {
        Self {
            at: Utc::now(),
            bytes: text.len(),
            digest: hex::encode(Sha256::digest(text.as_bytes())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing to write
    Unchanged,
    Saved(CommitReceipt),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to save content: {0}")]
    StorageWrite(#[from] StoreError),
}

/// An editing session over one stored content document
pub struct EditSession<S: Store> {
    store: S,
    key: String,
    committed: Document,
    buffer: Document,
    state: SessionState,
    /// The committed document has not reached the store yet
    persist_pending: bool,
}

impl<S: Store> EditSession<S> {
    /// Load the content slot from `store` and start a clean session
    pub fn open(store: S) -> Self {
        Self::open_with_key(store, CONTENT_KEY)
    }

    pub fn open_with_key(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let document = loader::load_from(&store, &key);
        Self::with_document(store, key, document)
    }

    /// Start a clean session on an already loaded document
    pub fn with_document(store: S, key: impl Into<String>, document: Document) -> Self {
        Self {
            store,
            key: key.into(),
            committed: document.clone(),
            buffer: document,
            state: SessionState::Clean,
            persist_pending: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == SessionState::Dirty
    }

    /// The working buffer, including uncommitted edits
    pub fn document(&self) -> &Document {
        &self.buffer
    }

    pub fn committed(&self) -> &Document {
        &self.committed
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The last commit has not been written to the store
    pub fn persist_pending(&self) -> bool {
        self.persist_pending
    }

    /// Apply a mutation to the buffer, returning the engine's error if it
    /// does not apply. The buffer is untouched on error.
    pub fn try_apply(&mut self, mutation: &Mutation) -> Result<Applied, PathError> {
        let applied = mutation.apply(&self.buffer)?;
        if !applied.document.ptr_eq(&self.buffer) {
            self.buffer = applied.document.clone();
            self.state = SessionState::Dirty;
        }
        Ok(applied)
    }

    /// Apply a mutation to the buffer. A mutation that does not apply is
    /// logged and ignored.
    pub fn apply(&mut self, mutation: &Mutation) -> Option<Applied> {
        match self.try_apply(mutation) {
            Ok(applied) => Some(applied),
            Err(e) => {
                warn!("Ignoring edit at '{}': {}", mutation.target(), e);
                None
            }
        }
    }

    pub fn set(&mut self, path: Path, value: Node) -> bool {
        self.apply(&Mutation::Set { path, value }).is_some()
    }

    /// Prepend an entry, returning its id
    pub fn insert(&mut self, collection: Path, entry: Node) -> Option<EntryId> {
        self.apply(&Mutation::Insert { collection, entry })
            .and_then(|applied| applied.inserted)
    }

    pub fn remove(&mut self, collection: Path, id: EntryId) -> bool {
        self.apply(&Mutation::Remove { collection, id }).is_some()
    }

    pub fn reorder(&mut self, collection: Path, from: usize, to: usize) -> bool {
        self.apply(&Mutation::Reorder {
            collection,
            from,
            to,
        })
        .is_some()
    }

    /// Write an uploaded asset's reference into the buffer
    pub fn apply_asset(&mut self, resolved: &ResolvedAsset) -> bool {
        self.set(resolved.path.clone(), Node::text(resolved.asset.as_str()))
    }

    /// Drop uncommitted edits
    pub fn discard(&mut self) {
        if self.state == SessionState::Dirty {
            debug!("Discarding uncommitted edits");
            self.buffer = self.committed.clone();
            self.state = SessionState::Clean;
        }
    }

    /// Commit the buffer and write it to the store.
    ///
    /// The in-memory commit happens even when the write fails. The failed
    /// write is retried by the next call.
    pub fn commit(&mut self) -> Result<CommitOutcome, SessionError> {
        match self.state {
            SessionState::Dirty => {
                self.committed = self.buffer.clone();
                self.state = SessionState::Clean;
                self.persist_pending = true;
            }
            SessionState::Clean if !self.persist_pending => return Ok(CommitOutcome::Unchanged),
            SessionState::Clean => info!("Retrying write of committed content"),
        }

        let text = loader::serialize(&self.committed)?;
        if let Err(e) = self.store.write(&self.key, &text) {
            error!("Failed to write '{}': {}", self.key, e);
            return Err(e.into());
        }
        self.persist_pending = false;

        let receipt = CommitReceipt::for_snapshot(&text);
        info!("Saved '{}' ({} bytes, {})", self.key, receipt.bytes, &receipt.digest[..12]);
        Ok(CommitOutcome::Saved(receipt))
    }

    /// Replace both committed document and buffer, e.g. after an import
    pub fn reload(&mut self, document: Document) {
        self.committed = document.clone();
        self.buffer = document;
        self.state = SessionState::Clean;
        self.persist_pending = false;
    }
}
