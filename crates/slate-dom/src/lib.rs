//! # Slate DOM
//!
//! Retained element tree for the editor chrome.
//! Panel markup is parsed with html5ever into a traversable tree; panels and
//! the overlay layer then create, move, and remove nodes programmatically.
//!
//! ## Design Goals
//!
//! 1. **Template parsing**: html5ever implements the HTML5 parsing algorithm
//! 2. **Mutation support**: element creation, detachment, attribute and class
//!    changes behind interior mutability (the tree is shared via `Rc`)
//! 3. **Query support**: selector matching (`matches`, `closest`, `select`)
//! 4. **Event dispatch**: DOM Events with capture/bubble phases

pub mod events;

pub use events::{
    AddEventListenerOptions, DomEvent, Event, EventDispatcher, EventListenerCallback, EventPhase,
    EventTarget, FocusEventData, InputEventData, KeyboardEventData, ListenerId, MouseEventData,
    WheelEventData,
};

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use slate_style::Selector;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in tree operations.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Node not found")]
    NodeNotFound,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Create a new NodeId.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Type of node.
#[derive(Debug)]
pub enum NodeType {
    Document,
    DocumentType {
        name: String,
    },
    Element {
        tag_name: String,
        attributes: RefCell<HashMap<String, String>>,
    },
    Text(String),
    Comment(String),
}

/// A node in the element tree.
#[derive(Debug)]
pub struct Node {
    /// Unique ID for this node.
    pub id: NodeId,
    /// Node type and associated data.
    pub node_type: NodeType,
    /// Parent node (weak reference to avoid cycles).
    parent: RefCell<Option<Weak<Node>>>,
    /// Child nodes.
    children: RefCell<Vec<Rc<Node>>>,
    /// Event target mixin for event handling.
    pub event_target: EventTarget,
}

impl Node {
    /// Create a new node.
    pub fn new(id: NodeId, node_type: NodeType) -> Rc<Self> {
        Rc::new(Self {
            id,
            node_type,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            event_target: EventTarget::new(),
        })
    }

    /// Get the tag name for element nodes.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.node_type {
            NodeType::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    /// Get an attribute value.
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        match &self.node_type {
            NodeType::Element { attributes, .. } => attributes.borrow().get(name).cloned(),
            _ => None,
        }
    }

    /// Set an attribute value. No-op on non-element nodes.
    pub fn set_attribute(&self, name: &str, value: &str) {
        if let NodeType::Element { attributes, .. } = &self.node_type {
            attributes
                .borrow_mut()
                .insert(name.to_string(), value.to_string());
        }
    }

    /// Remove an attribute.
    pub fn remove_attribute(&self, name: &str) {
        if let NodeType::Element { attributes, .. } = &self.node_type {
            attributes.borrow_mut().remove(name);
        }
    }

    /// The `id` attribute, if any.
    pub fn element_id(&self) -> Option<String> {
        self.get_attribute("id")
    }

    /// A `data-*` attribute, addressed without the prefix.
    pub fn dataset(&self, name: &str) -> Option<String> {
        self.get_attribute(&format!("data-{name}"))
    }

    /// Check whether the class attribute contains `class_name`.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.get_attribute("class")
            .map(|c| c.split_whitespace().any(|cls| cls == class_name))
            .unwrap_or(false)
    }

    /// Add a class to the class attribute.
    pub fn add_class(&self, class_name: &str) {
        if self.has_class(class_name) {
            return;
        }
        let current = self.get_attribute("class").unwrap_or_default();
        let updated = if current.is_empty() {
            class_name.to_string()
        } else {
            format!("{current} {class_name}")
        };
        self.set_attribute("class", &updated);
    }

    /// Remove a class from the class attribute.
    pub fn remove_class(&self, class_name: &str) {
        let Some(current) = self.get_attribute("class") else {
            return;
        };
        let updated: Vec<&str> = current
            .split_whitespace()
            .filter(|c| *c != class_name)
            .collect();
        self.set_attribute("class", &updated.join(" "));
    }

    /// Toggle a class, returning whether it is now present.
    pub fn toggle_class(&self, class_name: &str) -> bool {
        if self.has_class(class_name) {
            self.remove_class(class_name);
            false
        } else {
            self.add_class(class_name);
            true
        }
    }

    /// Get the text content of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, result: &mut String) {
        match &self.node_type {
            NodeType::Text(text) => result.push_str(text),
            _ => {
                for child in self.children.borrow().iter() {
                    child.collect_text(result);
                }
            }
        }
    }

    /// Get parent node.
    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Get child nodes.
    pub fn children(&self) -> Vec<Rc<Node>> {
        self.children.borrow().clone()
    }

    /// Get first child.
    pub fn first_child(&self) -> Option<Rc<Node>> {
        self.children.borrow().first().cloned()
    }

    /// Get last child.
    pub fn last_child(&self) -> Option<Rc<Node>> {
        self.children.borrow().last().cloned()
    }

    /// Check if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element { .. })
    }

    /// Check if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self.node_type, NodeType::Text(_))
    }

    /// Ancestors of this node, nearest first.
    pub fn ancestors(&self) -> Vec<Rc<Node>> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            out.push(node);
        }
        out
    }

    /// Test this element against a selector. Non-elements never match.
    pub fn matches(&self, selector: &Selector) -> bool {
        if !self.is_element() {
            return false;
        }
        let id = self.element_id();
        let classes = self.get_attribute("class");
        selector.matches_parts(
            self.tag_name(),
            id.as_deref(),
            classes.as_deref(),
            |name| self.get_attribute(name),
        )
    }

    /// Walk up from this node (inclusive) to the first element matching
    /// `selector`, stopping after `boundary` when given.
    pub fn closest(self: &Rc<Self>, selector: &Selector, boundary: Option<NodeId>) -> Option<Rc<Node>> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.matches(selector) {
                return Some(node);
            }
            if boundary == Some(node.id) {
                return None;
            }
            current = node.parent();
        }
        None
    }

    /// Append a child node, detaching it from any previous parent first.
    pub fn append_child(self: &Rc<Self>, child: Rc<Node>) {
        child.detach();
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));
        self.children.borrow_mut().push(child);
    }

    /// Remove this node from its parent. No-op when already detached.
    pub fn detach(self: &Rc<Self>) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent
            .children
            .borrow_mut()
            .retain(|c| c.id != self.id);
        *self.parent.borrow_mut() = None;
    }
}

/// A complete element-tree document.
///
/// Shared as `Rc<Document>` between panels, the delegation registry, and the
/// overlay controller; all mutation goes through interior mutability.
pub struct Document {
    /// Root node of the document.
    root: Rc<Node>,
    /// All nodes indexed by ID.
    nodes: RefCell<HashMap<NodeId, Rc<Node>>>,
    /// Elements indexed by ID attribute.
    elements_by_id: RefCell<HashMap<String, Rc<Node>>>,
    /// Next node ID.
    next_id: Cell<usize>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        let root = Node::new(NodeId::new(0), NodeType::Document);
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::new(0), root.clone());

        Self {
            root,
            nodes: RefCell::new(nodes),
            elements_by_id: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Parse an HTML template and create a document.
    pub fn parse_html(html: &str) -> Result<Self, DomError> {
        debug!(len = html.len(), "Parsing chrome template");

        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| DomError::ParseError(e.to_string()))?;

        let doc = Document::new();
        doc.convert_rcdom(&dom.document, &doc.root.clone());

        debug!(node_count = doc.nodes.borrow().len(), "Template parsed");
        Ok(doc)
    }

    fn convert_rcdom(&self, handle: &Handle, parent: &Rc<Node>) {
        for child_handle in handle.children.borrow().iter() {
            let node_type = match &child_handle.data {
                NodeData::Document => continue, // Skip document node itself
                NodeData::Doctype { name, .. } => NodeType::DocumentType {
                    name: name.to_string(),
                },
                NodeData::Element { name, attrs, .. } => {
                    let mut attributes = HashMap::new();
                    for attr in attrs.borrow().iter() {
                        attributes.insert(attr.name.local.to_string(), attr.value.to_string());
                    }
                    NodeType::Element {
                        tag_name: name.local.to_string(),
                        attributes: RefCell::new(attributes),
                    }
                }
                NodeData::Text { contents } => NodeType::Text(contents.borrow().to_string()),
                NodeData::Comment { contents } => NodeType::Comment(contents.to_string()),
                NodeData::ProcessingInstruction { .. } => continue,
            };

            let node = self.register_node(node_type);
            parent.append_child(node.clone());

            // Recurse for children
            self.convert_rcdom(child_handle, &node);
        }
    }

    fn register_node(&self, node_type: NodeType) -> Rc<Node> {
        let id = NodeId::new(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);

        let node = Node::new(id, node_type);
        self.nodes.borrow_mut().insert(id, node.clone());
        if let Some(elem_id) = node.element_id() {
            self.elements_by_id.borrow_mut().insert(elem_id, node.clone());
        }
        node
    }

    /// Create a detached element with the given attributes.
    pub fn create_element(&self, tag_name: &str, attrs: &[(&str, &str)]) -> Rc<Node> {
        let attributes: HashMap<String, String> = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.register_node(NodeType::Element {
            tag_name: tag_name.to_string(),
            attributes: RefCell::new(attributes),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: &str) -> Rc<Node> {
        self.register_node(NodeType::Text(text.to_string()))
    }

    /// Detach a node and drop it (with its subtree) from the document's
    /// indexes.
    pub fn remove_node(&self, node: &Rc<Node>) {
        node.detach();
        self.unindex_subtree(node);
    }

    fn unindex_subtree(&self, node: &Rc<Node>) {
        self.nodes.borrow_mut().remove(&node.id);
        if let Some(elem_id) = node.element_id() {
            self.elements_by_id.borrow_mut().remove(&elem_id);
        }
        for child in node.children() {
            self.unindex_subtree(&child);
        }
    }

    /// Get the document root.
    pub fn root(&self) -> &Rc<Node> {
        &self.root
    }

    /// Get the document element (<html>).
    pub fn document_element(&self) -> Option<Rc<Node>> {
        self.root
            .children()
            .into_iter()
            .find(|n| n.tag_name() == Some("html"))
    }

    /// Get the <body> element.
    pub fn body(&self) -> Option<Rc<Node>> {
        self.document_element()?
            .children()
            .into_iter()
            .find(|n| n.tag_name() == Some("body"))
    }

    /// Get element by ID attribute.
    pub fn get_element_by_id(&self, id: &str) -> Option<Rc<Node>> {
        self.elements_by_id.borrow().get(id).cloned()
    }

    /// Get node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<Rc<Node>> {
        self.nodes.borrow().get(&id).cloned()
    }

    /// Whether the node is still attached under the document root.
    pub fn contains(&self, node: &Rc<Node>) -> bool {
        if node.id == self.root.id {
            return true;
        }
        node.ancestors().iter().any(|a| a.id == self.root.id)
    }

    /// First element matching the selector, depth-first.
    pub fn select_first(&self, selector: &Selector) -> Option<Rc<Node>> {
        self.select_in(&self.root, selector).into_iter().next()
    }

    /// All elements matching the selector, depth-first.
    pub fn select_all(&self, selector: &Selector) -> Vec<Rc<Node>> {
        self.select_in(&self.root, selector)
    }

    /// All elements matching the selector inside `scope` (exclusive).
    pub fn select_in(&self, scope: &Rc<Node>, selector: &Selector) -> Vec<Rc<Node>> {
        let mut out = Vec::new();
        for child in scope.children() {
            self.collect_matches(&child, selector, &mut out);
        }
        out
    }

    fn collect_matches(&self, node: &Rc<Node>, selector: &Selector, out: &mut Vec<Rc<Node>>) {
        if node.matches(selector) {
            out.push(node.clone());
        }
        for child in node.children() {
            self.collect_matches(&child, selector, out);
        }
    }

    /// Traverse all nodes depth-first.
    pub fn traverse<F>(&self, mut callback: F)
    where
        F: FnMut(&Rc<Node>),
    {
        self.traverse_node(&self.root, &mut callback);
    }

    #[allow(clippy::only_used_in_recursion)]
    fn traverse_node<F>(&self, node: &Rc<Node>, callback: &mut F)
    where
        F: FnMut(&Rc<Node>),
    {
        callback(node);
        for child in node.children() {
            self.traverse_node(&child, callback);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn test_parse_panel_template() {
        let html = r#"<!DOCTYPE html>
<html>
<body>
<div id="asset-browser" class="panel">
    <ul class="asset-list">
        <li class="asset" data-asset-id="a1">Grass</li>
        <li class="asset" data-asset-id="a2">Water</li>
    </ul>
</div>
</body>
</html>"#;

        let doc = Document::parse_html(html).unwrap();

        let panel = doc.get_element_by_id("asset-browser").unwrap();
        assert_eq!(panel.tag_name(), Some("div"));
        assert!(panel.has_class("panel"));

        let assets = doc.select_all(&sel(".asset"));
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].dataset("asset-id").as_deref(), Some("a1"));
    }

    #[test]
    fn test_class_list_operations() {
        let doc = Document::new();
        let el = doc.create_element("div", &[("class", "menu")]);

        el.add_class("visible");
        assert!(el.has_class("menu"));
        assert!(el.has_class("visible"));

        // Adding again is a no-op
        el.add_class("visible");
        assert_eq!(el.get_attribute("class").unwrap(), "menu visible");

        el.remove_class("visible");
        assert!(!el.has_class("visible"));

        assert!(el.toggle_class("open"));
        assert!(!el.toggle_class("open"));
    }

    #[test]
    fn test_matches_and_closest() {
        let doc = Document::new();
        let container = doc.create_element("div", &[("id", "outliner")]);
        let row = doc.create_element("li", &[("class", "row"), ("data-object-id", "7")]);
        let label = doc.create_element("span", &[("class", "label")]);
        doc.root().append_child(container.clone());
        container.append_child(row.clone());
        row.append_child(label.clone());

        assert!(row.matches(&sel("li.row[data-object-id]")));
        assert!(!label.matches(&sel(".row")));

        let found = label.closest(&sel(".row"), Some(container.id)).unwrap();
        assert_eq!(found.id, row.id);

        // Boundary stops the walk
        assert!(label.closest(&sel("#missing"), Some(container.id)).is_none());
    }

    #[test]
    fn test_detach_and_reattach() {
        let doc = Document::new();
        let a = doc.create_element("div", &[("id", "a")]);
        let b = doc.create_element("div", &[("id", "b")]);
        doc.root().append_child(a.clone());
        doc.root().append_child(b.clone());

        assert!(doc.contains(&a));

        a.detach();
        assert!(!doc.contains(&a));
        assert!(a.parent().is_none());

        // Append moves the node under a new parent
        b.append_child(a.clone());
        assert!(doc.contains(&a));
        assert_eq!(a.parent().unwrap().id, b.id);
    }

    #[test]
    fn test_remove_node_unindexes() {
        let doc = Document::new();
        let panel = doc.create_element("div", &[("id", "layers")]);
        let child = doc.create_element("span", &[("id", "layers-title")]);
        doc.root().append_child(panel.clone());
        panel.append_child(child);

        assert!(doc.get_element_by_id("layers-title").is_some());

        doc.remove_node(&panel);
        assert!(doc.get_element_by_id("layers").is_none());
        assert!(doc.get_element_by_id("layers-title").is_none());
    }

    #[test]
    fn test_text_content() {
        let html = "<html><body><div><p>Hello, <b>editor</b>!</p></div></body></html>";
        let doc = Document::parse_html(html).unwrap();
        let body = doc.body().unwrap();
        assert_eq!(body.text_content().trim(), "Hello, editor!");
    }

    #[test]
    fn test_ancestors_order() {
        let doc = Document::new();
        let outer = doc.create_element("div", &[]);
        let inner = doc.create_element("span", &[]);
        doc.root().append_child(outer.clone());
        outer.append_child(inner.clone());

        let ancestors = inner.ancestors();
        assert_eq!(ancestors.len(), 2);
        assert_eq!(ancestors[0].id, outer.id);
        assert_eq!(ancestors[1].id, doc.root().id);
    }
}
