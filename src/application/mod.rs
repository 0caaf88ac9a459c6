//! Application layer - use cases and orchestration.
//!
//! This layer contains the export pipeline proper: locating content in
//! the live tree, cleaning it, assembling Markdown and driving the
//! Studio navigation and reconciliation flows.

pub mod assembler;
pub mod extractor;
pub mod navigator;
pub mod orchestrator;
pub mod reconciler;
pub mod resolver;
pub mod sanitizer;

pub use assembler::{ConvertOptions, MarkdownAssembler, MarkdownConvert};
pub use extractor::MessageExtractor;
pub use navigator::StudioNavigator;
pub use orchestrator::{ExportOrchestrator, CHAT_IDLE_LABEL, STUDIO_IDLE_LABEL};
pub use reconciler::{
    ReconcileOutcome, Reconciler, EXPORT_BUTTON_ID, SELECT_MARKER_ATTR, STUDIO_BUTTON_ID,
};
pub use resolver::{matches_within, resolve, resolve_all};
pub use sanitizer::ChromeSanitizer;
