//! Export orchestration.
//!
//! Wires a user-initiated trigger to extraction, assembly and the save
//! collaborator, and owns the user-facing feedback on the triggering
//! control: disable while an export is in flight, flash the outcome,
//! restore the idle label. One export at a time; errors abort the current
//! export only and never touch the reconciliation loop.

use std::cell::Cell;

use chrono::Utc;

use crate::domain::{
    AppConfig, Document, ExportError, NodeRef, Result, SavedExport,
};
use crate::infrastructure::FileSink;

use super::assembler::{MarkdownAssembler, MarkdownConvert};
use super::extractor::MessageExtractor;
use super::navigator::StudioNavigator;
use super::reconciler::{EXPORT_BUTTON_ID, STUDIO_BUTTON_ID};
use super::resolver::resolve;

/// Idle label of the chat-export control.
pub const CHAT_IDLE_LABEL: &str = "Export to Markdown";

/// Idle label of the Studio-export control.
pub const STUDIO_IDLE_LABEL: &str = "Export selected item";

const WORKING_LABEL: &str = "Exporting…";
const SUCCESS_LABEL: &str = "Exported ✓";

/// Drives exports end to end and manages trigger-control feedback.
pub struct ExportOrchestrator {
    extractor: MessageExtractor,
    assembler: MarkdownAssembler,
    navigator: StudioNavigator,
    convert: Box<dyn MarkdownConvert>,
    sink: Box<dyn FileSink>,
    config: AppConfig,
    in_flight: Cell<bool>,
}

impl ExportOrchestrator {
    #[must_use]
    pub fn new(
        config: AppConfig,
        convert: Box<dyn MarkdownConvert>,
        sink: Box<dyn FileSink>,
    ) -> Self {
        Self {
            extractor: MessageExtractor::new(config.selectors.clone()),
            assembler: MarkdownAssembler::new(
                &config.export.source_label,
                &config.export.file_prefix,
            ),
            navigator: StudioNavigator::new(config.selectors.clone(), config.timing),
            convert,
            sink,
            config,
            in_flight: Cell::new(false),
        }
    }

    /// Handle an activation of the chat-export control.
    pub async fn trigger_chat_export(&self, doc: &Document) -> Result<SavedExport> {
        self.guarded(doc, EXPORT_BUTTON_ID, CHAT_IDLE_LABEL, |orch, doc| {
            Box::pin(orch.export_conversation(doc))
        })
        .await
    }

    /// Handle an activation of the Studio-export control.
    pub async fn trigger_studio_export(&self, doc: &Document) -> Result<SavedExport> {
        self.guarded(doc, STUDIO_BUTTON_ID, STUDIO_IDLE_LABEL, |orch, doc| {
            Box::pin(orch.navigator.export_selected(
                doc,
                &orch.assembler,
                orch.convert.as_ref(),
                orch.sink.as_ref(),
            ))
        })
        .await
    }

    /// Extract and save the current conversation. No trigger-control
    /// feedback; use `trigger_chat_export` for the full user path.
    pub async fn export_conversation(&self, doc: &Document) -> Result<SavedExport> {
        let container = resolve(&self.config.selectors.main_container, doc.root())
            .ok_or(ExportError::ContainerNotFound)?;
        let (transcript, stats) = self.extractor.extract(&container);
        if transcript.is_empty() {
            return Err(ExportError::NoMessagesFound);
        }

        let now = Utc::now();
        let markdown = self
            .assembler
            .assemble(self.convert.as_ref(), &transcript, now);
        let filename = self.assembler.chat_filename(now);
        self.sink.save(&markdown, &filename)?;
        tracing::info!(
            filename = %filename,
            messages = stats.extracted,
            "conversation exported"
        );
        Ok(SavedExport {
            bytes: markdown.len(),
            filename,
        })
    }

    /// Run one export behind the in-flight guard, with label feedback on
    /// the triggering control. Feedback reverts after a fixed delay and the
    /// control is re-enabled then.
    async fn guarded<'a, F>(
        &'a self,
        doc: &'a Document,
        button_id: &str,
        idle_label: &str,
        export: F,
    ) -> Result<SavedExport>
    where
        F: FnOnce(
            &'a Self,
            &'a Document,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<SavedExport>> + 'a>,
        >,
    {
        if self.in_flight.get() {
            tracing::warn!("export already in flight, ignoring trigger");
            return Err(ExportError::config("an export is already in flight"));
        }
        self.in_flight.set(true);

        let button = find_button(doc, button_id);
        if let Some(button) = &button {
            button.set_attr("disabled", "");
            button.set_text(WORKING_LABEL);
        }

        let result = export(self, doc).await;

        // Flash the outcome on the control, then restore it. The button is
        // re-resolved after the await: the host may have replaced it.
        let button = find_button(doc, button_id);
        if let Some(button) = &button {
            match &result {
                Ok(_) => button.set_text(SUCCESS_LABEL),
                Err(err) => button.set_text(&format!("Export failed: {err}")),
            }
            tokio::time::sleep(self.config.timing.feedback()).await;
        }
        if let Some(button) = find_button(doc, button_id) {
            button.set_text(idle_label);
            button.remove_attr("disabled");
        }
        self.in_flight.set(false);
        result
    }
}

fn find_button(doc: &Document, id: &str) -> Option<NodeRef> {
    doc.root()
        .descendants()
        .into_iter()
        .find(|n| n.attr("id").as_deref() == Some(id))
}
