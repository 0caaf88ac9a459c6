//! Message extraction.
//!
//! A deterministic, synchronous pipeline over the current document snapshot:
//! locate the message container, enumerate candidates, infer speaker roles,
//! correct role alternation, sanitize, and deduplicate. Not retryable; one
//! pass over whatever the tree looks like right now.

use std::collections::HashSet;
use std::rc::Rc;

use crate::domain::{
    ExtractedUnit, ExtractionStats, ExportError, NodeRef, Result, Role, SelectorConfig,
    Transcript,
};

use super::resolver::{matches_within, resolve, resolve_all};
use super::sanitizer::ChromeSanitizer;

/// Minimum sanitized text length for a unit to count as a message.
pub const MIN_UNIT_CHARS: usize = 10;

/// Minimum text length for a single Studio item's content.
pub const MIN_ITEM_CHARS: usize = 100;

/// Extracts conversation transcripts and single Studio items from a scope.
#[derive(Debug)]
pub struct MessageExtractor {
    selectors: SelectorConfig,
    sanitizer: ChromeSanitizer,
}

impl MessageExtractor {
    #[must_use]
    pub fn new(selectors: SelectorConfig) -> Self {
        Self {
            selectors,
            sanitizer: ChromeSanitizer::new(),
        }
    }

    /// Extract the conversation transcript from `panel_scope`. Result order
    /// is document order. An empty transcript is not an error here; the
    /// caller decides whether that aborts the export.
    #[must_use]
    pub fn extract(&self, panel_scope: &NodeRef) -> (Transcript, ExtractionStats) {
        let mut stats = ExtractionStats::default();

        // Message container, falling back to the panel itself.
        let scope = resolve(&self.selectors.message_container, panel_scope)
            .unwrap_or_else(|| Rc::clone(panel_scope));

        // Candidate messages, falling back to a generic heuristic.
        let mut candidates = resolve_all(&self.selectors.message_item, &scope);
        if candidates.is_empty() {
            candidates = generic_candidates(&scope);
            tracing::debug!(count = candidates.len(), "using generic div selection");
        }
        stats.candidates_seen = candidates.len();

        // Drop candidates that contain another candidate; nested matches
        // would double-count content.
        let keep: Vec<bool> = candidates
            .iter()
            .map(|c| {
                !candidates
                    .iter()
                    .any(|other| !Rc::ptr_eq(c, other) && c.is_ancestor_of(other))
            })
            .collect();
        let candidates: Vec<NodeRef> = candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(c, k)| k.then_some(c))
            .collect();

        // Role inference plus alternation correction. A user-chain match is
        // a positive signal and is trusted; the Assistant default is weak
        // and may be flipped. (An earlier variant alternated
        // unconditionally; this is the conservative policy.)
        let mut resolved: Vec<(NodeRef, Role)> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let positive = matches_within(&self.selectors.user_message, &candidate);
            let inferred = if positive { Role::User } else { Role::Assistant };
            let role = match resolved.last() {
                // Conversations open with a user turn.
                None => Role::User,
                Some((_, prev)) if inferred == *prev && !positive => prev.opposite(),
                Some(_) => inferred,
            };
            resolved.push((candidate, role));
        }

        // Sanitize, drop trivially short units, deduplicate by signature.
        let mut transcript = Transcript::new();
        let mut seen = HashSet::new();
        for (candidate, role) in resolved {
            let unit = ExtractedUnit::new(role, self.sanitizer.sanitize(&candidate));
            if unit.text().chars().count() < MIN_UNIT_CHARS {
                stats.short_dropped += 1;
                continue;
            }
            if !seen.insert(unit.signature()) {
                stats.duplicates_dropped += 1;
                continue;
            }
            transcript.push(unit);
        }

        stats.extracted = transcript.len();
        stats.user_messages = transcript.user_count();
        stats.assistant_messages = transcript.assistant_count();
        tracing::info!(
            extracted = stats.extracted,
            duplicates = stats.duplicates_dropped,
            "extraction pass complete"
        );
        (transcript, stats)
    }

    /// Extract a single opened item's content from its viewer: try the
    /// content-region chain, fall back to the whole viewer, sanitize, and
    /// reject content too short to be a real document.
    pub fn extract_single(&self, viewer_scope: &NodeRef) -> Result<NodeRef> {
        let region = resolve(&self.selectors.content_region, viewer_scope)
            .unwrap_or_else(|| Rc::clone(viewer_scope));
        let content = self.sanitizer.sanitize(&region);
        let len = content.normalized_text().chars().count();
        if len < MIN_ITEM_CHARS {
            return Err(ExportError::ContentTooShort { len });
        }
        Ok(content)
    }
}

/// Generic fallback when no item strategy matches: every `div` with
/// non-trivial text and at least one child element, in document order.
fn generic_candidates(scope: &NodeRef) -> Vec<NodeRef> {
    scope
        .descendants()
        .into_iter()
        .filter(|n| {
            n.is_element()
                && n.tag() == "div"
                && n.normalized_text().chars().count() > MIN_UNIT_CHARS
                && n.child_element_count() > 0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dom::Node;

    fn panel() -> NodeRef {
        let panel = Node::new_element("div");
        panel.set_attr("role", "main");
        panel
    }

    fn add_message(container: &NodeRef, text: &str, user: bool) -> NodeRef {
        let msg = Node::new_element("div");
        let class = if user { "message user-message" } else { "message" };
        msg.set_attr("class", class);
        let body = Node::new_element("p");
        body.append_child(&Node::new_text(text));
        msg.append_child(&body);
        container.append_child(&msg);
        msg
    }

    fn extractor() -> MessageExtractor {
        MessageExtractor::new(SelectorConfig::default())
    }

    #[test]
    fn roles_alternate_when_inference_has_no_positive_match() {
        let scope = panel();
        add_message(&scope, "first question about the sources", false);
        add_message(&scope, "an answer with enough text in it", false);
        add_message(&scope, "a follow-up question, also long", false);

        let (transcript, _) = extractor().extract(&scope);
        let roles: Vec<Role> = transcript.iter().map(|u| u.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    }

    #[test]
    fn positive_matches_are_trusted_over_alternation() {
        let scope = panel();
        add_message(&scope, "first question about the sources", true);
        add_message(&scope, "second question, still the user", true);

        let (transcript, _) = extractor().extract(&scope);
        let roles: Vec<Role> = transcript.iter().map(|u| u.role).collect();
        assert_eq!(roles, vec![Role::User, Role::User]);
    }

    #[test]
    fn nested_candidates_keep_only_the_inner_match() {
        let scope = panel();
        let outer = add_message(&scope, "outer text that is long enough", false);
        let inner = Node::new_element("div");
        inner.set_attr("class", "message");
        let body = Node::new_element("p");
        body.append_child(&Node::new_text("inner text that is long enough"));
        inner.append_child(&body);
        outer.append_child(&inner);

        let (transcript, _) = extractor().extract(&scope);
        assert_eq!(transcript.len(), 1);
        assert!(transcript.units()[0].text().contains("inner text"));
    }

    #[test]
    fn duplicate_signatures_collapse_to_one_unit() {
        let scope = panel();
        add_message(&scope, "the same rendered message body text", false);
        add_message(&scope, "the same rendered message body text", false);

        let (transcript, stats) = extractor().extract(&scope);
        assert_eq!(transcript.len(), 1);
        assert_eq!(stats.duplicates_dropped, 1);
    }

    #[test]
    fn short_units_are_discarded() {
        let scope = panel();
        add_message(&scope, "ok", false);
        add_message(&scope, "a real answer with plenty of text", false);

        let (transcript, stats) = extractor().extract(&scope);
        assert_eq!(transcript.len(), 1);
        assert_eq!(stats.short_dropped, 1);
    }

    #[test]
    fn generic_fallback_finds_unmarked_messages() {
        let scope = panel();
        for text in ["first unmarked message body", "second unmarked message body"] {
            let div = Node::new_element("div");
            let p = Node::new_element("p");
            p.append_child(&Node::new_text(text));
            div.append_child(&p);
            scope.append_child(&div);
        }

        let (transcript, _) = extractor().extract(&scope);
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn sanitized_units_lose_their_chrome() {
        let scope = panel();
        let msg = add_message(&scope, "answer text that is long enough", false);
        let button = Node::new_element("button");
        button.append_child(&Node::new_text("Copy"));
        msg.append_child(&button);

        let (transcript, _) = extractor().extract(&scope);
        assert_eq!(
            transcript.units()[0].text(),
            "answer text that is long enough"
        );
    }

    #[test]
    fn extract_single_rejects_short_content() {
        let viewer = Node::new_element("div");
        viewer.append_child(&Node::new_text("too short"));
        let err = extractor().extract_single(&viewer).unwrap_err();
        assert!(matches!(err, ExportError::ContentTooShort { .. }));
    }

    #[test]
    fn extract_single_prefers_the_content_region() {
        let viewer = Node::new_element("div");
        let chrome = Node::new_element("div");
        chrome.append_child(&Node::new_text("header junk"));
        viewer.append_child(&chrome);
        let region = Node::new_element("div");
        region.set_attr("class", "document-content");
        region.append_child(&Node::new_text(&"real document body. ".repeat(10)));
        viewer.append_child(&region);

        let content = extractor().extract_single(&viewer).unwrap();
        assert!(!content.normalized_text().contains("header junk"));
    }
}
