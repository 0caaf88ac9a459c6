//! Domain models for extracted content.
//!
//! These models represent the units pulled out of the host app's live tree:
//! chat messages with inferred speaker roles, the transcript they form, and
//! the transient state of one Studio navigation episode.

use serde::Serialize;

use super::dom::{NodeRef, WeakNode};

/// Number of characters of normalized text used as a deduplication key.
pub const SIGNATURE_LEN: usize = 200;

/// Speaker role of an extracted message. Closed two-valued set; an unknown
/// role is never persisted: it is inferred, defaulted or alternated away
/// before a unit is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The other role.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::User => Self::Assistant,
            Self::Assistant => Self::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One extracted message: a resolved role plus an independently owned,
/// already sanitized clone of the source subtree. Later mutation of the live
/// document never affects the clone.
#[derive(Debug, Clone)]
pub struct ExtractedUnit {
    pub role: Role,
    pub content: NodeRef,
}

impl ExtractedUnit {
    #[must_use]
    pub const fn new(role: Role, content: NodeRef) -> Self {
        Self { role, content }
    }

    /// Whitespace-normalized text of the unit's content.
    #[must_use]
    pub fn text(&self) -> String {
        self.content.normalized_text()
    }

    /// Bounded-length prefix of normalized text, the deduplication key.
    #[must_use]
    pub fn signature(&self) -> String {
        self.text().chars().take(SIGNATURE_LEN).collect()
    }
}

/// An ordered conversation transcript. Insertion order is display order and
/// reconstructs dialogue turns.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    units: Vec<ExtractedUnit>,
}

impl Transcript {
    #[must_use]
    pub const fn new() -> Self {
        Self { units: Vec::new() }
    }

    pub fn push(&mut self, unit: ExtractedUnit) {
        self.units.push(unit);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[must_use]
    pub fn units(&self) -> &[ExtractedUnit] {
        &self.units
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtractedUnit> {
        self.units.iter()
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.units.iter().filter(|u| u.role == Role::User).count()
    }

    #[must_use]
    pub fn assistant_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.role == Role::Assistant)
            .count()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ExtractedUnit;
    type IntoIter = std::slice::Iter<'a, ExtractedUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

/// A selectable Studio item. The node handle is valid only within the
/// current navigation episode and is never persisted across a panel reload.
#[derive(Debug, Clone)]
pub struct StudioItem {
    pub title: String,
    pub node: WeakNode,
}

/// States of one Studio export run. `Done` and `Failed` are terminal; no
/// state is retried within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Idle,
    ItemSelected,
    Opening,
    AwaitingContent,
    Extracting,
    Converting,
    Saving,
    RestoringView,
    Done,
    Failed,
}

impl std::fmt::Display for NavState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ItemSelected => "item_selected",
            Self::Opening => "opening",
            Self::AwaitingContent => "awaiting_content",
            Self::Extracting => "extracting",
            Self::Converting => "converting",
            Self::Saving => "saving",
            Self::RestoringView => "restoring_view",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Explicit record of one Studio export attempt, carried across every
/// suspension point so an interleaved reconciliation pass cannot corrupt
/// navigation state hidden in closures.
#[derive(Debug, Clone)]
pub struct NavigationEpisode {
    /// Title of the selected item, kept even if its node dies mid-episode.
    pub item_title: String,
    /// Handle to the selected item's live node.
    pub item: WeakNode,
    /// Current machine state.
    pub state: NavState,
    /// Whether the viewer was already open when the episode began. If it
    /// was, no back navigation is owed at the end.
    pub panel_was_open: bool,
    /// Whether the episode activated a trigger, meaning view restoration
    /// should be attempted during cleanup.
    pub navigated: bool,
}

impl NavigationEpisode {
    #[must_use]
    pub fn new(item: &StudioItem) -> Self {
        Self {
            item_title: item.title.clone(),
            item: item.node.clone(),
            state: NavState::Idle,
            panel_was_open: false,
            navigated: false,
        }
    }
}

/// Summary statistics for one extraction pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ExtractionStats {
    /// Message candidates considered before filtering.
    pub candidates_seen: usize,
    /// Units in the final transcript.
    pub extracted: usize,
    /// User units in the final transcript.
    pub user_messages: usize,
    /// Assistant units in the final transcript.
    pub assistant_messages: usize,
    /// Candidates dropped as duplicates of an earlier signature.
    pub duplicates_dropped: usize,
    /// Candidates dropped for falling below the minimum text length.
    pub short_dropped: usize,
}

/// Outcome of a completed export handed back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SavedExport {
    pub filename: String,
    pub bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dom::Node;

    #[test]
    fn role_display_and_opposite() {
        assert_eq!(Role::User.to_string(), "User");
        assert_eq!(Role::Assistant.to_string(), "Assistant");
        assert_eq!(Role::User.opposite(), Role::Assistant);
        assert_eq!(Role::Assistant.opposite(), Role::User);
    }

    #[test]
    fn signature_is_bounded_prefix_of_normalized_text() {
        let node = Node::new_element("div");
        let long = "word ".repeat(100);
        node.append_child(&Node::new_text(&long));
        let unit = ExtractedUnit::new(Role::User, node);
        let sig = unit.signature();
        assert_eq!(sig.chars().count(), SIGNATURE_LEN);
        assert!(!sig.contains("  "));
    }

    #[test]
    fn transcript_counts_roles() {
        let mut t = Transcript::new();
        for role in [Role::User, Role::Assistant, Role::User] {
            let node = Node::new_element("div");
            node.append_child(&Node::new_text("content"));
            t.push(ExtractedUnit::new(role, node));
        }
        assert_eq!(t.len(), 3);
        assert_eq!(t.user_count(), 2);
        assert_eq!(t.assistant_count(), 1);
    }
}
