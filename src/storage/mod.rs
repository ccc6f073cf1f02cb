//! Storage boundary for the content document
//!
//! The whole document lives in one key-value slot as JSON text. This module
//! defines the slot abstraction, two providers, and the loader that turns
//! whatever is in the slot into a document of the baseline shape.

pub mod loader;
pub mod local;
pub mod memory;

use thiserror::Error;

pub use loader::{load_from, reconcile, serialize};
pub use local::LocalStore;
pub use memory::MemoryStore;

/// Slot holding the serialized content document
pub const CONTENT_KEY: &str = "institute.site-content.v1";

/// Error types for storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} available")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A key-value slot store holding text.
///
/// Reads and writes are synchronous; a write either replaces the whole slot or
/// fails and leaves the previous content in place.
pub trait Store {
    /// Read the slot, `None` if it was never written
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the slot's content
    fn write(&self, key: &str, text: &str) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for &S {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, text: &str) -> Result<(), StoreError> {
        (**self).write(key, text)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, text: &str) -> Result<(), StoreError> {
        (**self).write(key, text)
    }
}
