//! Asset uploads
//!
//! Bridges an upload control in the editor to a document mutation. When an
//! upload starts, its target is captured by value in an [`UploadTicket`].
//! The encode may finish long after the user has clicked something else, and
//! the result still goes to the field the ticket names.
//!
//! There is a single "active upload" slot for the editor to display. Starting
//! a new upload takes over the slot, but it never redirects an upload that is
//! already in flight.

mod encoder;

pub use encoder::{encode_data_url, AssetRef, DataUrlEncoder, EncodeError, EncodeLimits, ImageEncoder};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

use crate::document::{Document, EntryId, Node, Path, Step};
use crate::engine::{self, PathError};

/// The control an upload was started from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadTarget {
    /// A fixed asset field, e.g. `site.logo`
    Field(Path),

    /// A field of one collection entry, e.g. a gallery item's `image`
    EntryField {
        collection: Path,
        id: EntryId,
        field: String,
    },
}

impl UploadTarget {
    /// The document path the asset reference will be written to.
    ///
    /// An `EntryField` collection must end in the collection's field;
    /// anything else is `NotACollection`.
    pub fn path(&self) -> Result<Path, PathError> {
        match self {
            UploadTarget::Field(path) => Ok(path.clone()),
            UploadTarget::EntryField {
                collection,
                id,
                field,
            } => entry_field_path(collection, id, field),
        }
    }
}

/// Replace the collection's last field step with an entry step
fn entry_field_path(collection: &Path, id: &EntryId, field: &str) -> Result<Path, PathError> {
    let Some((Step::Field(name), parents)) = collection.steps().split_last() else {
        return Err(PathError::NotACollection {
            path: collection.to_string(),
        });
    };

    let mut path = Path::root();
    for step in parents {
        path = match step {
            Step::Field(name) => path.field(name.clone()),
            Step::Entry { collection, id } => path.entry(collection.clone(), id.clone()),
        };
    }
    Ok(path.entry(name.clone(), id.clone()).field(field))
}

/// Kind of asset, selecting the encode limits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Logo,
    Banner,
    Gallery,
    Default,
}

/// Encode limits per asset kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLimits {
    pub logo: EncodeLimits,
    pub banner: EncodeLimits,
    pub gallery: EncodeLimits,
    pub default: EncodeLimits,
}

impl Default for AssetLimits {
    fn default() -> Self {
        Self {
            logo: EncodeLimits {
                max_dimension: 400,
                quality: 90,
            },
            banner: EncodeLimits {
                max_dimension: 1920,
                quality: 80,
            },
            gallery: EncodeLimits {
                max_dimension: 1200,
                quality: 75,
            },
            default: EncodeLimits::default(),
        }
    }
}

impl AssetLimits {
    pub fn for_kind(&self, kind: AssetKind) -> EncodeLimits {
        match kind {
            AssetKind::Logo => self.logo,
            AssetKind::Banner => self.banner,
            AssetKind::Gallery => self.gallery,
            AssetKind::Default => self.default,
        }
    }
}

/// An upload in progress, holding its own copy of the target
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTicket {
    serial: u64,
    target: UploadTarget,
    kind: AssetKind,
}

impl UploadTicket {
    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }
}

/// An encoded asset and where it belongs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub path: Path,
    pub asset: AssetRef,
}

impl ResolvedAsset {
    /// Write the asset reference into `doc`
    pub fn apply(&self, doc: &Document) -> Result<Document, PathError> {
        engine::set(doc, &self.path, Node::text(self.asset.as_str()))
    }
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to encode image: {0}")]
    Encode(#[from] EncodeError),

    #[error("Upload target is not addressable: {0}")]
    Target(#[from] PathError),
}

/// Resolves uploads into document paths and asset references
pub struct AssetResolver<E: ImageEncoder> {
    encoder: E,
    limits: AssetLimits,
    active: Mutex<Option<UploadTicket>>,
    next_serial: AtomicU64,
}

impl<E: ImageEncoder> AssetResolver<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            limits: AssetLimits::default(),
            active: Mutex::new(None),
            next_serial: AtomicU64::new(1),
        }
    }

    pub fn with_limits(mut self, limits: AssetLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Start an upload for `target`, making it the active one
    pub fn begin(&self, target: UploadTarget, kind: AssetKind) -> UploadTicket {
        let ticket = UploadTicket {
            serial: self.next_serial.fetch_add(1, Ordering::SeqCst),
            target,
            kind,
        };
        match self.active.lock() {
            Ok(mut active) => {
                if let Some(previous) = active.replace(ticket.clone()) {
                    debug!(
                        "Upload for {:?} superseded by {:?}",
                        previous.target, ticket.target
                    );
                }
            }
            Err(_) => warn!("Active upload slot lock poisoned, not tracking {:?}", ticket.target),
        }
        ticket
    }

    /// Target of the most recently started upload that has not finished
    pub fn active(&self) -> Option<UploadTarget> {
        match self.active.lock() {
            Ok(active) => active.as_ref().map(|t| t.target.clone()),
            Err(_) => {
                warn!("Active upload slot lock poisoned");
                None
            }
        }
    }

    /// Encode `bytes` for the ticket's target.
    ///
    /// The result always refers to the ticket's own target, whatever uploads
    /// were started in the meantime.
    pub async fn resolve(
        &self,
        ticket: UploadTicket,
        bytes: Vec<u8>,
    ) -> Result<ResolvedAsset, AssetError> {
        let path = match ticket.target.path() {
            Ok(path) => path,
            Err(e) => {
                self.release(&ticket);
                warn!("Upload for {:?} has no target: {}", ticket.target, e);
                return Err(e.into());
            }
        };

        let limits = self.limits.for_kind(ticket.kind);
        let encoded = self.encoder.encode(bytes, limits).await;
        self.release(&ticket);

        match encoded {
            Ok(asset) => Ok(ResolvedAsset { path, asset }),
            Err(e) => {
                warn!("Upload for '{}' failed: {}", path, e);
                Err(e.into())
            }
        }
    }

    /// Start and resolve an upload in one step
    pub async fn upload(
        &self,
        target: UploadTarget,
        kind: AssetKind,
        bytes: Vec<u8>,
    ) -> Result<ResolvedAsset, AssetError> {
        let ticket = self.begin(target, kind);
        self.resolve(ticket, bytes).await
    }

    /// Clear the active slot if it still holds this ticket
    fn release(&self, ticket: &UploadTicket) {
        match self.active.lock() {
            Ok(mut active) => {
                if active.as_ref().is_some_and(|t| t.serial == ticket.serial) {
                    *active = None;
                }
            }
            Err(_) => warn!("Active upload slot lock poisoned, cannot release {:?}", ticket.target),
        }
    }
}
