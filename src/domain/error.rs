//! Domain-level error types for nlm-exporter.
//!
//! All errors are typed with `thiserror`. Export failures abort the current
//! export only; they never touch the reconciliation loop or other page state.

use thiserror::Error;

/// Application-level errors surfaced to the triggering control.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No conversation container matched any locator strategy.
    #[error("conversation container not found")]
    ContainerNotFound,

    /// Extraction produced an empty transcript.
    #[error("no messages found to export")]
    NoMessagesFound,

    /// Studio export was triggered with nothing selected.
    #[error("no Studio item is selected")]
    NoItemSelected,

    /// The selected item's trigger element disappeared before activation.
    #[error("trigger element missing for item: {title}")]
    ItemButtonMissing { title: String },

    /// The content viewer never reached non-trivial text within the bound.
    #[error("content did not load within {waited_ms} ms")]
    ContentLoadTimeout { waited_ms: u64 },

    /// Extracted content was below the minimum useful length.
    #[error("extracted content too short: {len} chars")]
    ContentTooShort { len: usize },

    /// View restoration failed. By policy this is logged, never escalated.
    #[error("back navigation failed: {message}")]
    BackNavigationFailed { message: String },

    /// Configuration or invariant error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A saved page snapshot could not be parsed.
    #[error("snapshot error: {message}")]
    Snapshot { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl ExportError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Result type alias using `ExportError`.
pub type Result<T> = std::result::Result<T, ExportError>;
