//! Control reconciliation.
//!
//! The host destroys injected UI at will: panel reloads, client-side
//! navigation, full re-renders. Rather than reacting to specific removals,
//! a level-triggered loop continuously re-asserts the desired state
//! ("every relevant toolbar contains its export control, every selectable
//! item has an adjacent selection control") on every document change and
//! on a fixed timer as a safety net against missed or coalesced
//! notifications. The reconcile procedure is idempotent: presence of a
//! stable identity is checked before every insertion, so calling it
//! arbitrarily often inserts each control exactly once.

use std::rc::Rc;

use crate::domain::{Document, DomEvent, NodeRef, SelectorConfig, TimingConfig};

use super::orchestrator::{CHAT_IDLE_LABEL, STUDIO_IDLE_LABEL};
use super::resolver::{resolve, resolve_all};

/// Stable identity of the chat-export control.
pub const EXPORT_BUTTON_ID: &str = "nlm-export-btn";

/// Stable identity of the Studio-export control.
pub const STUDIO_BUTTON_ID: &str = "nlm-studio-export-btn";

/// Attribute marking an injected per-item selection control.
pub const SELECT_MARKER_ATTR: &str = "data-nlm-select";

/// What a single reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub export_controls_added: usize,
    pub select_markers_added: usize,
}

impl ReconcileOutcome {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.export_controls_added == 0 && self.select_markers_added == 0
    }
}

/// Keeps injected controls present for the lifetime of the page.
pub struct Reconciler {
    selectors: SelectorConfig,
    timing: TimingConfig,
    last_url: String,
}

impl Reconciler {
    #[must_use]
    pub fn new(selectors: SelectorConfig, timing: TimingConfig) -> Self {
        Self {
            selectors,
            timing,
            last_url: String::new(),
        }
    }

    /// One idempotent pass: observe the tree, insert whatever is missing.
    /// Safe to call arbitrarily often; after the first successful injection
    /// per toolbar/item it has no observable effect.
    pub fn reconcile(&mut self, doc: &Document) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        let url = doc.url();
        if url != self.last_url {
            tracing::debug!(from = %self.last_url, to = %url, "navigation observed");
            self.last_url = url;
        }

        // Chat toolbar: one export control.
        if let Some(toolbar) = resolve(&self.selectors.chat_toolbar, doc.root()) {
            if !has_id(&toolbar, EXPORT_BUTTON_ID) {
                let button = make_button(doc, EXPORT_BUTTON_ID, CHAT_IDLE_LABEL);
                button.set_attr("aria-label", "Export conversation to Markdown");
                toolbar.insert_first(&button);
                outcome.export_controls_added += 1;
                tracing::info!(id = EXPORT_BUTTON_ID, "export control injected");
            }
        }

        // Studio panel: one export control in the header, one selection
        // control adjacent to every eligible item.
        if let Some(panel) = resolve(&self.selectors.studio_panel, doc.root()) {
            let header = resolve(&self.selectors.panel_header, &panel)
                .unwrap_or_else(|| Rc::clone(&panel));
            if !has_id(&panel, STUDIO_BUTTON_ID) {
                let button = make_button(doc, STUDIO_BUTTON_ID, STUDIO_IDLE_LABEL);
                button.set_attr("aria-label", "Export selected item to Markdown");
                header.append_child(&button);
                outcome.export_controls_added += 1;
                tracing::info!(id = STUDIO_BUTTON_ID, "studio export control injected");
            }

            let list = resolve(&self.selectors.studio_item_list, &panel)
                .unwrap_or_else(|| Rc::clone(&panel));
            for item in resolve_all(&self.selectors.studio_item, &list) {
                if !has_marker(&item) {
                    let marker = doc.create_element("span");
                    marker.set_attr(SELECT_MARKER_ATTR, "");
                    marker.set_attr("class", "nlm-select");
                    marker.set_attr("role", "checkbox");
                    item.insert_first(&marker);
                    outcome.select_markers_added += 1;
                }
            }
            if outcome.select_markers_added > 0 {
                tracing::debug!(
                    added = outcome.select_markers_added,
                    "selection controls injected"
                );
            }
        }

        outcome
    }

    /// Run forever: reconcile on every change event, detect navigation by
    /// URL comparison, and tick on a fixed period in case notifications
    /// were missed. Ends only when the document's event stream closes.
    pub async fn run(mut self, doc: Document) {
        let mut events = doc.subscribe();
        let mut tick = tokio::time::interval(self.timing.reconcile_period());
        self.reconcile(&doc);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.reconcile(&doc);
                }
                event = events.recv() => match event {
                    Some(DomEvent::Mutated) => {
                        self.reconcile(&doc);
                    }
                    // Simulated clicks are not structural changes.
                    Some(DomEvent::Activated(_)) => {}
                    None => {
                        tracing::debug!("document event stream closed, loop ending");
                        break;
                    }
                },
            }
        }
    }
}

fn make_button(doc: &Document, id: &str, label: &str) -> NodeRef {
    let button = doc.create_element("button");
    button.set_attr("id", id);
    button.set_text(label);
    button
}

fn has_id(scope: &NodeRef, id: &str) -> bool {
    scope
        .descendants()
        .iter()
        .any(|n| n.attr("id").as_deref() == Some(id))
}

fn has_marker(item: &NodeRef) -> bool {
    item.descendants().iter().any(|n| n.has_attr(SELECT_MARKER_ATTR))
}
