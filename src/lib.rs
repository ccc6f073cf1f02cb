// Sitedoc - Content document engine for an institute website admin panel

pub mod assets;
pub mod config;
pub mod document;
pub mod engine;
pub mod schema;
pub mod session;
pub mod storage;

pub use config::SiteConfig;
pub use document::{Document, EntryId, Node, Path};
pub use engine::{Mutation, PathError};
pub use session::{CommitOutcome, EditSession, SessionState};
pub use storage::{LocalStore, MemoryStore, Store, StoreError};
