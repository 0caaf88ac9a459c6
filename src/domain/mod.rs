//! Domain layer - core types and the live document model.
//!
//! This layer contains the document tree, locator data, domain models and
//! error types, without any filesystem or presentation concerns.

pub mod dom;
pub mod error;
pub mod locator;
pub mod models;
pub mod settings;

pub use dom::{Document, DomEvent, Node, NodeKind, NodeRef, WeakNode};
pub use error::{ExportError, Result};
pub use locator::{LocatorChain, LocatorStrategy, SelectorConfig};
pub use models::{
    ExtractedUnit, ExtractionStats, NavState, NavigationEpisode, Role, SavedExport, StudioItem,
    Transcript, SIGNATURE_LEN,
};
pub use settings::{AppConfig, ExportConfig, TimingConfig};
