//! Studio item navigation.
//!
//! Opening a Studio item is a multi-step journey through the host's panel:
//! activate the item, wait for its viewer to render, extract, and put the
//! panel back the way it was. Each step is a state of an explicit machine,
//! carried in a `NavigationEpisode` across every await point. The machine
//! never retries; each export invocation starts fresh from `Idle`. Because
//! reconciliation passes interleave with these awaits, every step re-queries
//! the live document instead of caching node references across a wait.

use std::rc::Rc;

use chrono::Utc;

use crate::domain::{
    Document, ExportError, LocatorStrategy, NavState, NavigationEpisode, NodeRef, Result,
    SavedExport, SelectorConfig, StudioItem, TimingConfig,
};
use crate::infrastructure::FileSink;

use super::assembler::{MarkdownAssembler, MarkdownConvert};
use super::extractor::{MessageExtractor, MIN_ITEM_CHARS};
use super::reconciler::SELECT_MARKER_ATTR;
use super::resolver::{resolve, resolve_all};

/// Attribute value marking a selection control as toggled on.
pub const SELECTED_VALUE: &str = "true";

/// Drives one Studio export episode through the state machine.
pub struct StudioNavigator {
    selectors: SelectorConfig,
    timing: TimingConfig,
    extractor: MessageExtractor,
}

impl StudioNavigator {
    #[must_use]
    pub fn new(selectors: SelectorConfig, timing: TimingConfig) -> Self {
        let extractor = MessageExtractor::new(selectors.clone());
        Self {
            selectors,
            timing,
            extractor,
        }
    }

    /// The single currently selected Studio item. Zero selected is an
    /// error; nothing is ever silently picked as a default. Extra selected
    /// markers (a host quirk) resolve to the first in document order.
    pub fn selected_item(&self, doc: &Document) -> Result<StudioItem> {
        let panel = resolve(&self.selectors.studio_panel, doc.root())
            .ok_or(ExportError::ContainerNotFound)?;
        let list =
            resolve(&self.selectors.studio_item_list, &panel).unwrap_or_else(|| Rc::clone(&panel));

        let selected: Vec<NodeRef> = resolve_all(&self.selectors.studio_item, &list)
            .into_iter()
            .filter(|item| is_selected(item))
            .collect();

        match selected.len() {
            0 => Err(ExportError::NoItemSelected),
            n => {
                if n > 1 {
                    tracing::warn!(count = n, "multiple items selected, taking the first");
                }
                let item = &selected[0];
                Ok(StudioItem {
                    title: item_title(item),
                    node: Rc::downgrade(item),
                })
            }
        }
    }

    /// Run one full export episode for the currently selected item.
    pub async fn export_selected(
        &self,
        doc: &Document,
        assembler: &MarkdownAssembler,
        convert: &dyn MarkdownConvert,
        sink: &dyn FileSink,
    ) -> Result<SavedExport> {
        // Zero selected fails here, before any navigation or content query.
        let item = self.selected_item(doc)?;
        let mut episode = NavigationEpisode::new(&item);
        self.enter(&mut episode, NavState::ItemSelected);

        let result = self.run(doc, &mut episode, assembler, convert, sink).await;

        // View restoration is cleanup: attempted whenever we navigated,
        // including after an error, and its own failure never escalates.
        if episode.navigated {
            self.enter(&mut episode, NavState::RestoringView);
            self.restore_view(doc).await;
        }

        let terminal = if result.is_ok() {
            NavState::Done
        } else {
            NavState::Failed
        };
        self.enter(&mut episode, terminal);
        result
    }

    async fn run(
        &self,
        doc: &Document,
        episode: &mut NavigationEpisode,
        assembler: &MarkdownAssembler,
        convert: &dyn MarkdownConvert,
        sink: &dyn FileSink,
    ) -> Result<SavedExport> {
        let viewer = if let Some(viewer) = self.find_viewer(doc) {
            // Item was pre-opened; skip straight to extraction.
            episode.panel_was_open = true;
            viewer
        } else {
            self.enter(episode, NavState::Opening);
            let item = episode.item.upgrade().ok_or_else(|| {
                ExportError::ItemButtonMissing {
                    title: episode.item_title.clone(),
                }
            })?;
            find_trigger(&item).activate();
            episode.navigated = true;

            self.enter(episode, NavState::AwaitingContent);
            self.await_content(doc).await?
        };

        self.enter(episode, NavState::Extracting);
        let content = self.extractor.extract_single(&viewer)?;

        self.enter(episode, NavState::Converting);
        let now = Utc::now();
        let markdown = assembler.assemble_single_item(convert, &episode.item_title, &content, now);

        self.enter(episode, NavState::Saving);
        let filename = assembler.studio_filename(&episode.item_title, now);
        sink.save(&markdown, &filename)?;
        tracing::info!(filename = %filename, bytes = markdown.len(), "studio item exported");

        Ok(SavedExport {
            bytes: markdown.len(),
            filename,
        })
    }

    /// Poll, bounded, for the viewer to appear and hold non-trivial text.
    /// The viewer is re-resolved on every poll; nothing stale is kept
    /// across the sleeps.
    async fn await_content(&self, doc: &Document) -> Result<NodeRef> {
        let poll = self.timing.poll_interval();
        let mut waited = std::time::Duration::ZERO;
        loop {
            if let Some(viewer) = self.find_viewer(doc) {
                if viewer.normalized_text().chars().count() > MIN_ITEM_CHARS {
                    return Ok(viewer);
                }
            }
            if waited >= self.timing.content_wait() {
                return Err(ExportError::ContentLoadTimeout {
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(poll).await;
            waited += poll;
        }
    }

    fn find_viewer(&self, doc: &Document) -> Option<NodeRef> {
        resolve(&self.selectors.content_viewer, doc.root())
    }

    /// Best-effort return to the panel's list view. Never escalated: a
    /// missing back control is logged and the export outcome stands.
    async fn restore_view(&self, doc: &Document) {
        let control = resolve(&self.selectors.back_control, doc.root())
            .or_else(|| self.positional_back_control(doc));
        match control {
            Some(control) => {
                control.activate();
                tokio::time::sleep(self.timing.settle()).await;
            }
            None => {
                let err = ExportError::BackNavigationFailed {
                    message: "no back control matched any strategy".to_string(),
                };
                tracing::warn!(error = %err, "leaving panel as-is");
            }
        }
    }

    /// Positional fallback: the first control inside the panel header.
    fn positional_back_control(&self, doc: &Document) -> Option<NodeRef> {
        let panel = resolve(&self.selectors.studio_panel, doc.root())?;
        let header = resolve(&self.selectors.panel_header, &panel)?;
        let button = LocatorStrategy::tag("button");
        header.descendants().into_iter().find(|n| button.matches(n))
    }

    fn enter(&self, episode: &mut NavigationEpisode, state: NavState) {
        tracing::debug!(item = %episode.item_title, state = %state, "episode transition");
        episode.state = state;
    }
}

/// Whether a Studio item carries a toggled-on selection control.
fn is_selected(item: &NodeRef) -> bool {
    item.descendants().iter().any(|n| {
        n.has_attr(SELECT_MARKER_ATTR) && n.attr("data-selected").as_deref() == Some(SELECTED_VALUE)
    })
}

/// The element to activate for opening an item: an inner button if the item
/// has one, else the item node itself.
fn find_trigger(item: &NodeRef) -> NodeRef {
    let button = LocatorStrategy::tag("button");
    item.descendants()
        .into_iter()
        .find(|n| button.matches(n) && !n.has_attr(SELECT_MARKER_ATTR))
        .unwrap_or_else(|| Rc::clone(item))
}

/// Display title for an item: its label attribute if present, else the
/// first line of its text.
#[must_use]
pub fn item_title(item: &NodeRef) -> String {
    if let Some(label) = item.attr("aria-label").or_else(|| item.attr("data-title")) {
        return label;
    }
    item.normalized_text().chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::assembler::ConvertOptions;
    use crate::domain::DomEvent;
    use crate::infrastructure::MemorySink;

    struct TextConvert;

    impl MarkdownConvert for TextConvert {
        fn convert(&self, node: &NodeRef, _options: &ConvertOptions) -> String {
            node.normalized_text()
        }
    }

    fn assembler() -> MarkdownAssembler {
        MarkdownAssembler::new("NotebookLM", "notebooklm")
    }

    fn navigator() -> StudioNavigator {
        StudioNavigator::new(SelectorConfig::default(), TimingConfig::default())
    }

    /// Document with a Studio panel holding `titles` items. Returns the
    /// item nodes for test-side selection toggling.
    fn studio_doc(titles: &[&str]) -> (Document, Vec<NodeRef>) {
        let doc = Document::new("https://host.test/studio");
        let panel = doc.create_element("aside");
        panel.set_attr("class", "studio-panel");

        let header = doc.create_element("header");
        let back = doc.create_element("button");
        back.set_attr("aria-label", "Back");
        header.append_child(&back);
        panel.append_child(&header);

        let list = doc.create_element("div");
        list.set_attr("class", "artifact-list");
        let mut items = Vec::new();
        for title in titles {
            let item = doc.create_element("div");
            item.set_attr("class", "artifact-item");
            item.set_attr("data-title", title);
            let marker = doc.create_element("span");
            marker.set_attr(SELECT_MARKER_ATTR, "");
            item.append_child(&marker);
            item.append_child(&doc.create_text(title));
            list.append_child(&item);
            items.push(item);
        }
        panel.append_child(&list);
        doc.root().append_child(&panel);
        (doc, items)
    }

    fn select(item: &NodeRef) {
        for n in item.descendants() {
            if n.has_attr(SELECT_MARKER_ATTR) {
                n.set_attr("data-selected", SELECTED_VALUE);
            }
        }
    }

    fn open_viewer(doc: &Document, text: &str) -> NodeRef {
        let viewer = doc.create_element("div");
        viewer.set_attr("class", "artifact-viewer");
        viewer.append_child(&doc.create_text(text));
        doc.root().append_child(&viewer);
        viewer
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn no_selection_fails_before_any_navigation() {
        let (doc, _items) = studio_doc(&["Briefing"]);
        let mut rx = doc.subscribe();
        let err = navigator()
            .export_selected(&doc, &assembler(), &TextConvert, &MemorySink::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::NoItemSelected));
        // No activation was attempted.
        while let Ok(event) = rx.try_recv() {
            assert!(!matches!(event, DomEvent::Activated(_)));
        }
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn preopened_viewer_skips_navigation() {
        let (doc, items) = studio_doc(&["Q1 Report"]);
        select(&items[0]);
        open_viewer(&doc, &"long document body text. ".repeat(10));

        let sink = MemorySink::new();
        let saved = navigator()
            .export_selected(&doc, &assembler(), &TextConvert, &sink)
            .await
            .unwrap();
        assert!(saved.filename.contains("studio-q1-report"));
        let files = sink.saved();
        assert_eq!(files.len(), 1);
        assert!(files[0].1.contains("title: Q1 Report"));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn content_timeout_still_attempts_back_navigation() {
        let (doc, items) = studio_doc(&["Slow Item"]);
        select(&items[0]);
        let mut rx = doc.subscribe();

        let err = navigator()
            .export_selected(&doc, &assembler(), &TextConvert, &MemorySink::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::ContentLoadTimeout { .. }));

        // The item trigger was activated, and so was the back control.
        let mut activations = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let DomEvent::Activated(weak) = event {
                if let Some(node) = weak.upgrade() {
                    activations.push(node);
                }
            }
        }
        assert_eq!(activations.len(), 2);
        assert_eq!(
            activations[1].attr("aria-label").as_deref(),
            Some("Back")
        );
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn host_rendering_the_viewer_completes_the_export() {
        let (doc, items) = studio_doc(&["Notes"]);
        select(&items[0]);

        let local = tokio::task::LocalSet::new();
        let host_doc = doc.clone();
        local
            .run_until(async move {
                // Simulated host: opens the viewer shortly after the click.
                let mut rx = host_doc.subscribe();
                tokio::task::spawn_local(async move {
                    while let Some(event) = rx.recv().await {
                        if matches!(event, DomEvent::Activated(_)) {
                            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
                            open_viewer(&host_doc, &"rendered item content. ".repeat(10));
                            break;
                        }
                    }
                });

                let sink = MemorySink::new();
                let saved = navigator()
                    .export_selected(&doc, &assembler(), &TextConvert, &sink)
                    .await
                    .unwrap();
                assert!(saved.bytes > 0);
                assert_eq!(sink.saved().len(), 1);
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn multiple_selected_takes_first_in_document_order() {
        let (doc, items) = studio_doc(&["First", "Second"]);
        select(&items[0]);
        select(&items[1]);
        let item = navigator().selected_item(&doc).unwrap();
        assert_eq!(item.title, "First");
    }
}
