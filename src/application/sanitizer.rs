//! Chrome stripping for extracted content.
//!
//! The host interleaves real content with interactive controls, icon glyphs
//! and suggestion widgets. Sanitization removes those from an owned clone of
//! the subtree before conversion. Matching is exact-string or fixed-regex
//! against trimmed text, never substring, so legitimate content that
//! happens to contain a keyword survives. This is a best-effort
//! allow-through-by-default filter, not a security boundary: chrome
//! introduced by a future redesign passes through uncaught.

use regex::Regex;

use crate::domain::{LocatorStrategy, NodeRef};

/// Deny-list of element shapes that are always chrome: interactive
/// controls, icon glyph hosts, and structural UI regions.
fn strip_strategies() -> Vec<LocatorStrategy> {
    vec![
        // Interactive controls.
        LocatorStrategy::tag("button"),
        LocatorStrategy::tag("input"),
        LocatorStrategy::tag("textarea"),
        LocatorStrategy::tag("select"),
        LocatorStrategy::tag("form"),
        LocatorStrategy::role("button"),
        // Icon glyph hosts.
        LocatorStrategy::tag("mat-icon"),
        LocatorStrategy::class("material-icons"),
        LocatorStrategy::class("google-symbols"),
        // Structural UI regions.
        LocatorStrategy::role("toolbar"),
        LocatorStrategy::class("toolbar"),
        LocatorStrategy::class("action-bar"),
        LocatorStrategy::class("message-actions"),
        LocatorStrategy::class("feedback-buttons"),
        LocatorStrategy::class("query-box"),
        LocatorStrategy::class("follow-up"),
        LocatorStrategy::class("suggested-prompts"),
        LocatorStrategy::class("suggestion-chips"),
        LocatorStrategy::class("carousel"),
    ]
}

/// Anchored patterns for leaf text that is known UI boilerplate: icon-font
/// ligature names, transient status strings, chip labels.
const LABEL_PATTERNS: &[&str] = &[
    r"^(thumb_up|thumb_down|content_copy|more_vert|arrow_back|arrow_forward|close|edit|refresh|share)$",
    r"^Loading\.{0,3}$",
    r"^(Copy|Copied|Regenerate|Good response|Bad response)$",
    r"^Suggested follow-up$",
];

/// Removes interactive and decorative UI nodes from content clones.
#[derive(Debug)]
pub struct ChromeSanitizer {
    strip: Vec<LocatorStrategy>,
    labels: Vec<Regex>,
}

impl Default for ChromeSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeSanitizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            strip: strip_strategies(),
            labels: LABEL_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }

    /// Return a new owned clone of `node` with chrome removed. The live
    /// subtree is never touched.
    #[must_use]
    pub fn sanitize(&self, node: &NodeRef) -> NodeRef {
        let clone = node.deep_clone();
        for descendant in clone.descendants() {
            if self.is_chrome(&descendant) {
                descendant.detach();
            }
        }
        clone
    }

    fn is_chrome(&self, node: &NodeRef) -> bool {
        if node.is_element() {
            return self.strip.iter().any(|s| s.matches(node));
        }
        // Leaf text: exact match against the trimmed content only.
        let text = node.text_content();
        let trimmed = text.trim();
        !trimmed.is_empty() && self.labels.iter().any(|re| re.is_match(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dom::Node;

    fn message_with_chrome() -> NodeRef {
        let msg = Node::new_element("div");
        let body = Node::new_element("p");
        body.append_child(&Node::new_text("The actual answer text."));
        msg.append_child(&body);

        let button = Node::new_element("button");
        button.append_child(&Node::new_text("Copy"));
        msg.append_child(&button);

        let icon = Node::new_element("mat-icon");
        icon.append_child(&Node::new_text("thumb_up"));
        msg.append_child(&icon);

        let chips = Node::new_element("div");
        chips.set_attr("class", "suggestion-chips");
        chips.append_child(&Node::new_text("Tell me more"));
        msg.append_child(&chips);
        msg
    }

    #[test]
    fn all_label_patterns_compile() {
        assert_eq!(ChromeSanitizer::new().labels.len(), LABEL_PATTERNS.len());
    }

    #[test]
    fn strips_controls_icons_and_regions() {
        let sanitizer = ChromeSanitizer::new();
        let clean = sanitizer.sanitize(&message_with_chrome());
        assert_eq!(clean.normalized_text(), "The actual answer text.");
    }

    #[test]
    fn live_tree_is_untouched() {
        let sanitizer = ChromeSanitizer::new();
        let msg = message_with_chrome();
        let _ = sanitizer.sanitize(&msg);
        assert!(msg.normalized_text().contains("thumb_up"));
    }

    #[test]
    fn strips_exact_label_leaves() {
        let sanitizer = ChromeSanitizer::new();
        let msg = Node::new_element("div");
        msg.append_child(&Node::new_text("  Loading...  "));
        let clean = sanitizer.sanitize(&msg);
        assert_eq!(clean.normalized_text(), "");
    }

    #[test]
    fn substring_matches_are_left_alone() {
        let sanitizer = ChromeSanitizer::new();
        let msg = Node::new_element("div");
        msg.append_child(&Node::new_text("Copy the values into the table."));
        let clean = sanitizer.sanitize(&msg);
        assert_eq!(clean.normalized_text(), "Copy the values into the table.");
    }

    #[test]
    fn unknown_chrome_passes_through() {
        let sanitizer = ChromeSanitizer::new();
        let msg = Node::new_element("div");
        let widget = Node::new_element("future-widget");
        widget.append_child(&Node::new_text("redesigned chrome"));
        msg.append_child(&widget);
        let clean = sanitizer.sanitize(&msg);
        assert_eq!(clean.normalized_text(), "redesigned chrome");
    }
}
