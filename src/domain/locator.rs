//! Declarative locator strategies.
//!
//! The host application's markup has no published contract, so every lookup
//! is expressed as an ordered chain of independent structural strategies,
//! tried until one matches. All "which markup shape are we dealing with"
//! knowledge lives here as data; new shapes are added by extending a chain,
//! not by touching extraction logic.

use serde::{Deserialize, Serialize};

use super::dom::NodeRef;

/// A single structural-match predicate against an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocatorStrategy {
    /// Element with the given tag name.
    Tag { name: String },
    /// Element whose `class` attribute contains the given word.
    Class { name: String },
    /// Element with the given `id` attribute value.
    Id { value: String },
    /// Element carrying the attribute, any value.
    Attr { name: String },
    /// Element carrying the attribute with exactly the given value.
    AttrValue { name: String, value: String },
    /// Element with the given ARIA `role`.
    Role { value: String },
    /// Element whose trimmed text equals the given string exactly.
    TextEquals { value: String },
}

impl LocatorStrategy {
    #[must_use]
    pub fn tag(name: &str) -> Self {
        Self::Tag { name: name.to_string() }
    }

    #[must_use]
    pub fn class(name: &str) -> Self {
        Self::Class { name: name.to_string() }
    }

    #[must_use]
    pub fn id(value: &str) -> Self {
        Self::Id { value: value.to_string() }
    }

    #[must_use]
    pub fn attr(name: &str) -> Self {
        Self::Attr { name: name.to_string() }
    }

    #[must_use]
    pub fn attr_value(name: &str, value: &str) -> Self {
        Self::AttrValue {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn role(value: &str) -> Self {
        Self::Role { value: value.to_string() }
    }

    #[must_use]
    pub fn text_equals(value: &str) -> Self {
        Self::TextEquals { value: value.to_string() }
    }

    /// Whether the node satisfies this strategy. Text nodes never match.
    #[must_use]
    pub fn matches(&self, node: &NodeRef) -> bool {
        if !node.is_element() {
            return false;
        }
        match self {
            Self::Tag { name } => node.tag() == name.to_ascii_lowercase(),
            Self::Class { name } => node.has_class(name),
            Self::Id { value } => node.attr("id").as_deref() == Some(value.as_str()),
            Self::Attr { name } => node.has_attr(name),
            Self::AttrValue { name, value } => {
                node.attr(name).as_deref() == Some(value.as_str())
            }
            Self::Role { value } => node.attr("role").as_deref() == Some(value.as_str()),
            Self::TextEquals { value } => node.normalized_text() == value.trim(),
        }
    }
}

/// Ordered sequence of strategies; first match wins. An empty result is a
/// normal, expected outcome; no chain guarantees a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocatorChain(Vec<LocatorStrategy>);

impl LocatorChain {
    #[must_use]
    pub const fn new(strategies: Vec<LocatorStrategy>) -> Self {
        Self(strategies)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocatorStrategy> {
        self.0.iter()
    }
}

impl From<Vec<LocatorStrategy>> for LocatorChain {
    fn from(strategies: Vec<LocatorStrategy>) -> Self {
        Self(strategies)
    }
}

impl<'a> IntoIterator for &'a LocatorChain {
    type Item = &'a LocatorStrategy;
    type IntoIter = std::slice::Iter<'a, LocatorStrategy>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The full set of named chains the exporter consults. Defaults mirror the
/// markup shapes observed in the host app; every chain can be overridden
/// from the config file without code changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Scope containing the whole conversation UI.
    #[serde(default = "default_main_container")]
    pub main_container: LocatorChain,

    /// Scope holding the message list, inside the main container.
    #[serde(default = "default_message_container")]
    pub message_container: LocatorChain,

    /// Individual message candidates.
    #[serde(default = "default_message_item")]
    pub message_item: LocatorChain,

    /// Positive marker for user-authored messages.
    #[serde(default = "default_user_message")]
    pub user_message: LocatorChain,

    /// Toolbar that receives the injected chat-export control.
    #[serde(default = "default_chat_toolbar")]
    pub chat_toolbar: LocatorChain,

    /// The Studio side panel.
    #[serde(default = "default_studio_panel")]
    pub studio_panel: LocatorChain,

    /// List of selectable Studio items inside the panel.
    #[serde(default = "default_studio_item_list")]
    pub studio_item_list: LocatorChain,

    /// Individual Studio items.
    #[serde(default = "default_studio_item")]
    pub studio_item: LocatorChain,

    /// The opened item's content viewer.
    #[serde(default = "default_content_viewer")]
    pub content_viewer: LocatorChain,

    /// Content region inside the viewer, tried before falling back to the
    /// whole viewer.
    #[serde(default = "default_content_region")]
    pub content_region: LocatorChain,

    /// Back/close controls for restoring the panel's list view.
    #[serde(default = "default_back_control")]
    pub back_control: LocatorChain,

    /// Panel header, used for the positional back-control fallback and as
    /// the Studio export control's toolbar.
    #[serde(default = "default_panel_header")]
    pub panel_header: LocatorChain,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            main_container: default_main_container(),
            message_container: default_message_container(),
            message_item: default_message_item(),
            user_message: default_user_message(),
            chat_toolbar: default_chat_toolbar(),
            studio_panel: default_studio_panel(),
            studio_item_list: default_studio_item_list(),
            studio_item: default_studio_item(),
            content_viewer: default_content_viewer(),
            content_region: default_content_region(),
            back_control: default_back_control(),
            panel_header: default_panel_header(),
        }
    }
}

fn default_main_container() -> LocatorChain {
    vec![
        LocatorStrategy::role("main"),
        LocatorStrategy::class("chat-container"),
        LocatorStrategy::tag("main"),
    ]
    .into()
}

fn default_message_container() -> LocatorChain {
    vec![
        LocatorStrategy::class("messages"),
        LocatorStrategy::class("conversation"),
        LocatorStrategy::role("log"),
    ]
    .into()
}

fn default_message_item() -> LocatorChain {
    vec![
        LocatorStrategy::attr("data-message-id"),
        LocatorStrategy::class("message"),
        LocatorStrategy::class("chat-message"),
    ]
    .into()
}

fn default_user_message() -> LocatorChain {
    vec![
        LocatorStrategy::class("user-message"),
        LocatorStrategy::attr_value("data-role", "user"),
    ]
    .into()
}

fn default_chat_toolbar() -> LocatorChain {
    vec![
        LocatorStrategy::class("chat-actions"),
        LocatorStrategy::role("toolbar"),
        LocatorStrategy::class("chat-header"),
    ]
    .into()
}

fn default_studio_panel() -> LocatorChain {
    vec![
        LocatorStrategy::class("studio-panel"),
        LocatorStrategy::attr_value("aria-label", "Studio"),
        LocatorStrategy::tag("aside"),
    ]
    .into()
}

fn default_studio_item_list() -> LocatorChain {
    vec![
        LocatorStrategy::class("artifact-list"),
        LocatorStrategy::role("list"),
    ]
    .into()
}

fn default_studio_item() -> LocatorChain {
    vec![
        LocatorStrategy::attr("data-artifact-id"),
        LocatorStrategy::class("artifact-item"),
    ]
    .into()
}

fn default_content_viewer() -> LocatorChain {
    vec![
        LocatorStrategy::class("artifact-viewer"),
        LocatorStrategy::class("document-viewer"),
        LocatorStrategy::role("article"),
    ]
    .into()
}

fn default_content_region() -> LocatorChain {
    vec![
        LocatorStrategy::class("artifact-content"),
        LocatorStrategy::class("document-content"),
        LocatorStrategy::class("prose"),
    ]
    .into()
}

fn default_back_control() -> LocatorChain {
    vec![
        LocatorStrategy::attr_value("aria-label", "Back"),
        LocatorStrategy::class("back-button"),
        LocatorStrategy::attr_value("aria-label", "Close"),
        LocatorStrategy::class("close-button"),
        LocatorStrategy::text_equals("arrow_back"),
    ]
    .into()
}

fn default_panel_header() -> LocatorChain {
    vec![
        LocatorStrategy::class("panel-header"),
        LocatorStrategy::tag("header"),
    ]
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dom::Node;

    #[test]
    fn strategies_match_structurally() {
        let node = Node::new_element("div");
        node.set_attr("class", "message user-message");
        node.set_attr("data-role", "user");

        assert!(LocatorStrategy::tag("div").matches(&node));
        assert!(LocatorStrategy::class("message").matches(&node));
        assert!(LocatorStrategy::attr("data-role").matches(&node));
        assert!(LocatorStrategy::attr_value("data-role", "user").matches(&node));
        assert!(!LocatorStrategy::class("assistant").matches(&node));
        assert!(!LocatorStrategy::attr_value("data-role", "assistant").matches(&node));
    }

    #[test]
    fn class_matching_is_whole_word() {
        let node = Node::new_element("div");
        node.set_attr("class", "chat-messages");
        assert!(!LocatorStrategy::class("message").matches(&node));
    }

    #[test]
    fn text_nodes_never_match() {
        let text = Node::new_text("button");
        assert!(!LocatorStrategy::tag("button").matches(&text));
        assert!(!LocatorStrategy::text_equals("button").matches(&text));
    }

    #[test]
    fn text_equals_uses_trimmed_text() {
        let node = Node::new_element("span");
        node.append_child(&Node::new_text("  arrow_back\n"));
        assert!(LocatorStrategy::text_equals("arrow_back").matches(&node));
    }

    #[test]
    fn chains_round_trip_through_toml() {
        let config = SelectorConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: SelectorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn default_chains_are_populated() {
        let config = SelectorConfig::default();
        assert!(!config.main_container.is_empty());
        assert!(!config.message_item.is_empty());
        assert!(!config.back_control.is_empty());
    }
}
