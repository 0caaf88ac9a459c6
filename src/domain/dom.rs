//! Live document tree.
//!
//! The host application owns a mutable tree of elements that changes under us
//! at any time. This module models that tree with `Rc`/`Weak` nodes plus a
//! `Document` handle that tracks the current navigation URL and publishes
//! change events to subscribers. Extraction never inspects live nodes
//! directly; it works on detached deep clones, so mutation of a clone can
//! never reach the live tree and vice versa.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tokio::sync::mpsc;

/// Shared reference to a node.
pub type NodeRef = Rc<Node>;

/// Weak reference to a node. Valid only while the host keeps the node alive.
pub type WeakNode = Weak<Node>;

/// Kind of node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// Change notification delivered to document subscribers.
#[derive(Debug, Clone)]
pub enum DomEvent {
    /// A structural mutation happened somewhere in the live tree.
    Mutated,
    /// A node received a simulated interaction (click).
    Activated(WeakNode),
}

/// A single node: an element with a tag and attributes, or a text leaf.
#[derive(Debug)]
pub struct Node {
    kind: NodeKind,
    tag: String,
    attrs: RefCell<BTreeMap<String, String>>,
    text: RefCell<String>,
    children: RefCell<Vec<NodeRef>>,
    parent: RefCell<WeakNode>,
    doc: RefCell<Weak<DocumentShared>>,
}

impl Node {
    /// Create a detached element node.
    #[must_use]
    pub fn new_element(tag: &str) -> NodeRef {
        Rc::new(Self {
            kind: NodeKind::Element,
            tag: tag.to_ascii_lowercase(),
            attrs: RefCell::new(BTreeMap::new()),
            text: RefCell::new(String::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            doc: RefCell::new(Weak::new()),
        })
    }

    /// Create a detached text node.
    #[must_use]
    pub fn new_text(content: &str) -> NodeRef {
        Rc::new(Self {
            kind: NodeKind::Text,
            tag: String::new(),
            attrs: RefCell::new(BTreeMap::new()),
            text: RefCell::new(content.to_string()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            doc: RefCell::new(Weak::new()),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Lowercased tag name; empty for text nodes.
    #[must_use]
    pub fn tag(&self) -> String {
        self.tag.clone()
    }

    /// Attribute value, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.attrs.borrow().get(name).cloned()
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.borrow().contains_key(name)
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        self.attrs
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self.notify();
    }

    pub fn remove_attr(&self, name: &str) {
        if self.attrs.borrow_mut().remove(name).is_some() {
            self.notify();
        }
    }

    /// Whether the `class` attribute contains `name` as a whole word.
    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|w| w == name))
    }

    /// Concatenated text of this node and all descendants, document order.
    #[must_use]
    pub fn text_content(&self) -> String {
        if self.kind == NodeKind::Text {
            return self.text.borrow().clone();
        }
        let mut out = String::new();
        for child in self.children.borrow().iter() {
            out.push_str(&child.text_content());
        }
        out
    }

    /// Text content with whitespace runs collapsed to single spaces.
    #[must_use]
    pub fn normalized_text(&self) -> String {
        self.text_content()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace the node's content with a single text leaf. On a text node,
    /// replaces the text directly.
    pub fn set_text(self: &Rc<Self>, content: &str) {
        if self.kind == NodeKind::Text {
            *self.text.borrow_mut() = content.to_string();
        } else {
            let leaf = Self::new_text(content);
            adopt(&leaf, &self.doc.borrow());
            *leaf.parent.borrow_mut() = Rc::downgrade(self);
            let mut children = self.children.borrow_mut();
            children.clear();
            children.push(leaf);
        }
        self.notify();
    }

    #[must_use]
    pub fn children(&self) -> Vec<NodeRef> {
        self.children.borrow().clone()
    }

    #[must_use]
    pub fn child_element_count(&self) -> usize {
        self.children
            .borrow()
            .iter()
            .filter(|c| c.is_element())
            .count()
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().upgrade()
    }

    /// Append `child` as the last child, detaching it from any prior parent.
    pub fn append_child(self: &Rc<Self>, child: &NodeRef) {
        child.detach_quiet();
        adopt(child, &self.doc.borrow());
        *child.parent.borrow_mut() = Rc::downgrade(self);
        self.children.borrow_mut().push(Rc::clone(child));
        self.notify();
    }

    /// Insert `child` as the first child, detaching it from any prior parent.
    pub fn insert_first(self: &Rc<Self>, child: &NodeRef) {
        child.detach_quiet();
        adopt(child, &self.doc.borrow());
        *child.parent.borrow_mut() = Rc::downgrade(self);
        self.children.borrow_mut().insert(0, Rc::clone(child));
        self.notify();
    }

    /// Remove this node from its parent, if any.
    pub fn detach(self: &Rc<Self>) {
        let had_parent = self.parent().is_some();
        self.detach_quiet();
        if had_parent {
            self.notify();
        }
    }

    fn detach_quiet(self: &Rc<Self>) {
        if let Some(parent) = self.parent() {
            parent
                .children
                .borrow_mut()
                .retain(|c| !Rc::ptr_eq(c, self));
        }
        *self.parent.borrow_mut() = Weak::new();
    }

    /// All descendants in document (pre)order, excluding `self`.
    #[must_use]
    pub fn descendants(self: &Rc<Self>) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeRef> = self.children.borrow().iter().rev().cloned().collect();
        while let Some(node) = stack.pop() {
            out.push(Rc::clone(&node));
            for child in node.children.borrow().iter().rev() {
                stack.push(Rc::clone(child));
            }
        }
        out
    }

    /// Whether this node is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(self: &Rc<Self>, other: &NodeRef) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if Rc::ptr_eq(&node, self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Fully independent copy of this subtree. The clone has no parent and no
    /// document link; mutating it never notifies and never touches the live
    /// tree.
    #[must_use]
    pub fn deep_clone(self: &Rc<Self>) -> NodeRef {
        let copy = Rc::new(Self {
            kind: self.kind,
            tag: self.tag.clone(),
            attrs: RefCell::new(self.attrs.borrow().clone()),
            text: RefCell::new(self.text.borrow().clone()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            doc: RefCell::new(Weak::new()),
        });
        for child in self.children.borrow().iter() {
            let child_copy = child.deep_clone();
            *child_copy.parent.borrow_mut() = Rc::downgrade(&copy);
            copy.children.borrow_mut().push(child_copy);
        }
        copy
    }

    /// Simulate a user interaction on this node. Detached nodes ignore it.
    pub fn activate(self: &Rc<Self>) {
        if let Some(doc) = self.doc.borrow().upgrade() {
            doc.emit(&DomEvent::Activated(Rc::downgrade(self)));
        }
    }

    fn notify(&self) {
        if let Some(doc) = self.doc.borrow().upgrade() {
            doc.emit(&DomEvent::Mutated);
        }
    }
}

/// Attach `node` and its subtree to a document's event stream.
fn adopt(node: &NodeRef, doc: &Weak<DocumentShared>) {
    *node.doc.borrow_mut() = doc.clone();
    for child in node.children.borrow().iter() {
        adopt(child, doc);
    }
}

#[derive(Debug)]
struct DocumentShared {
    url: RefCell<String>,
    subscribers: RefCell<Vec<mpsc::UnboundedSender<DomEvent>>>,
}

impl DocumentShared {
    fn emit(&self, event: &DomEvent) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Handle to the live tree: a root node, the current navigation URL and the
/// change-event fan-out. Cloning the handle shares the same tree.
#[derive(Debug, Clone)]
pub struct Document {
    shared: Rc<DocumentShared>,
    root: NodeRef,
}

impl Document {
    /// Create an empty document with an `html` root.
    #[must_use]
    pub fn new(url: &str) -> Self {
        let shared = Rc::new(DocumentShared {
            url: RefCell::new(url.to_string()),
            subscribers: RefCell::new(Vec::new()),
        });
        let root = Node::new_element("html");
        *root.doc.borrow_mut() = Rc::downgrade(&shared);
        Self { shared, root }
    }

    #[must_use]
    pub const fn root(&self) -> &NodeRef {
        &self.root
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.shared.url.borrow().clone()
    }

    /// Change the navigation URL. Client-side navigation surfaces as a
    /// document change, so subscribers get a `Mutated` event.
    pub fn set_url(&self, url: &str) {
        *self.shared.url.borrow_mut() = url.to_string();
        self.shared.emit(&DomEvent::Mutated);
    }

    /// Subscribe to change events. Every mutation anywhere in the live tree
    /// and every simulated activation is delivered in occurrence order.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DomEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.subscribers.borrow_mut().push(tx);
        rx
    }

    /// Create an element bound to this document's event stream.
    #[must_use]
    pub fn create_element(&self, tag: &str) -> NodeRef {
        let node = Node::new_element(tag);
        *node.doc.borrow_mut() = Rc::downgrade(&self.shared);
        node
    }

    /// Create a text node bound to this document's event stream.
    #[must_use]
    pub fn create_text(&self, content: &str) -> NodeRef {
        let node = Node::new_text(content);
        *node.doc.borrow_mut() = Rc::downgrade(&self.shared);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> (Document, NodeRef) {
        let doc = Document::new("https://example.test/app");
        let container = doc.create_element("div");
        container.set_attr("class", "messages");
        let msg = doc.create_element("div");
        msg.append_child(&doc.create_text("hello there"));
        container.append_child(&msg);
        doc.root().append_child(&container);
        (doc, container)
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let (_doc, container) = small_tree();
        assert_eq!(container.text_content(), "hello there");
    }

    #[test]
    fn normalized_text_collapses_whitespace() {
        let node = Node::new_element("p");
        node.append_child(&Node::new_text("  a\n\n  b\t c  "));
        assert_eq!(node.normalized_text(), "a b c");
    }

    #[test]
    fn deep_clone_is_independent_both_ways() {
        let (_doc, container) = small_tree();
        let clone = container.deep_clone();

        // Mutating the live tree does not affect the clone.
        container.append_child(&Node::new_text(" more"));
        assert_eq!(clone.text_content(), "hello there");

        // Mutating the clone does not affect the live tree.
        for child in clone.children() {
            child.detach();
        }
        assert_eq!(clone.text_content(), "");
        assert_eq!(container.text_content(), "hello there more");
    }

    #[test]
    fn mutations_emit_events() {
        let (doc, container) = small_tree();
        let mut rx = doc.subscribe();
        container.set_attr("data-x", "1");
        assert!(matches!(rx.try_recv(), Ok(DomEvent::Mutated)));
    }

    #[test]
    fn clone_mutations_emit_nothing() {
        let (doc, container) = small_tree();
        let clone = container.deep_clone();
        let mut rx = doc.subscribe();
        clone.set_attr("data-x", "1");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn activate_reaches_subscribers() {
        let (doc, container) = small_tree();
        let mut rx = doc.subscribe();
        container.activate();
        match rx.try_recv() {
            Ok(DomEvent::Activated(weak)) => {
                let node = weak.upgrade().unwrap();
                assert!(Rc::ptr_eq(&node, &container));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn descendants_are_document_order() {
        let doc = Document::new("x");
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        a.append_child(&b);
        doc.root().append_child(&a);
        doc.root().append_child(&c);
        let tags: Vec<String> = doc.root().descendants().iter().map(|n| n.tag()).collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn ancestor_check() {
        let (_doc, container) = small_tree();
        let msg = &container.children()[0];
        assert!(container.is_ancestor_of(msg));
        assert!(!msg.is_ancestor_of(&container));
    }

    #[test]
    fn url_change_is_a_document_change() {
        let (doc, _) = small_tree();
        let mut rx = doc.subscribe();
        doc.set_url("https://example.test/app/other");
        assert!(matches!(rx.try_recv(), Ok(DomEvent::Mutated)));
        assert_eq!(doc.url(), "https://example.test/app/other");
    }
}
