//! Document Tree
//!
//! Arena-backed element tree. Placeholders are read from it and converted
//! blocks are written back into it. Nodes are never freed during a pass:
//! removing a node only detaches it, so ids held by in-flight tasks stay valid
//! and "still has a parent" is a cheap check.

pub mod html;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::host::FileRef;

/// Document shared between the render pass and its per-node tasks
pub type SharedDocument = Arc<Mutex<Document>>;

/// Handle to a node inside one [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Node payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(Element),
    /// Text, escaped on serialisation
    Text(String),
    /// Pre-rendered HTML, emitted verbatim
    Markup(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Click behaviour attached to an element.
///
/// Behaviours are plain data so the tree can be cloned, inspected and
/// serialised; [`crate::embed::controls::InteractionControls`] interprets them.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Flip the visibility of `block` and swap the glyph on this element
    Toggle { block: NodeId },
    /// Copy `content` to the clipboard; `generation` counts successful copies
    Copy { content: Arc<str>, generation: u64 },
    /// Mod-click opens `file`, plain click delegates to `toggle`
    OpenOrToggle { file: FileRef, toggle: NodeId },
    /// Swallow clicks from inside the element
    StopPropagation,
}

/// An element with ordered attributes and inline style declarations
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    style: Vec<(String, String)>,
    behavior: Option<Behavior>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            style: Vec::new(),
            behavior: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Attributes in insertion order
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", joined);
    }

    /// Grammar named by a `language-*` class, if any
    pub fn language(&self) -> Option<&str> {
        self.classes().find_map(|c| c.strip_prefix("language-"))
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(key, _)| key == property)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_style(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self.style.iter_mut().find(|(key, _)| key == property) {
            Some(slot) => slot.1 = value,
            None => self.style.push((property.to_string(), value)),
        }
    }

    pub fn remove_style(&mut self, property: &str) {
        self.style.retain(|(key, _)| key != property);
    }

    /// Inline style as a `style` attribute value
    pub fn style_text(&self) -> Option<String> {
        if self.style.is_empty() {
            return None;
        }
        let declarations: Vec<String> = self
            .style
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
        Some(format!("{};", declarations.join("; ")))
    }

    pub fn behavior(&self) -> Option<&Behavior> {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> Option<&mut Behavior> {
        self.behavior.as_mut()
    }

    pub fn set_behavior(&mut self, behavior: Behavior) {
        self.behavior = Some(behavior);
    }

    /// Same tag, attributes and style, without any behaviour
    pub fn static_copy(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            style: self.style.clone(),
            behavior: None,
        }
    }
}

/// Anything that can select elements out of a [`Document`]
pub trait Matcher {
    fn matches(&self, element: &Element) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&Element) -> bool,
{
    fn matches(&self, element: &Element) -> bool {
        self(element)
    }
}

/// The rendered document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document rooted at a `div`
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.create_element("div");
        doc
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Create a detached raw-markup node
    pub fn create_markup(&mut self, markup: impl Into<String>) -> NodeId {
        self.push(NodeKind::Markup(markup.into()))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// True if walking up from `id` reaches the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Remove `id` from its parent; a detached node is left as is
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `node` right before `reference`. Returns false when
    /// `reference` has no parent.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        self.detach(node);
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings
            .iter()
            .position(|child| *child == reference)
            .unwrap_or(siblings.len());
        siblings.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
        true
    }

    /// Put `replacement` where `old` is. Returns false when `old` has no parent.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) -> bool {
        if !self.insert_before(old, replacement) {
            return false;
        }
        self.detach(old);
        true
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Replace the children of `id` with a single text node
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.clear_children(id);
        let text = self.create_text(text);
        self.append_child(id, text);
    }

    /// Replace the children of `id` with a single markup node
    pub fn set_markup(&mut self, id: NodeId, markup: impl Into<String>) {
        self.clear_children(id);
        let markup = self.create_markup(markup);
        self.append_child(id, markup);
    }

    /// All descendants of `root` in document order, `root` excluded
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Elements under `root` accepted by `matcher`, in document order
    pub fn query_all(&self, root: NodeId, matcher: &impl Matcher) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(|el| matcher.matches(el)))
            .collect()
    }

    /// Concatenated text of `id` and its descendants; markup is stripped of tags
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Markup(markup) => out.push_str(&html::markup_text(markup)),
            NodeKind::Element(_) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Text of `id` if every child is a text node, `None` otherwise
    pub fn plain_text(&self, id: NodeId) -> Option<String> {
        let mut out = String::new();
        for child in self.children(id) {
            match self.kind(*child) {
                NodeKind::Text(text) => out.push_str(text),
                _ => return None,
            }
        }
        Some(out)
    }

    /// Detached deep copy of `id` carrying no behaviours
    pub fn clone_static(&mut self, id: NodeId) -> NodeId {
        let kind = match self.kind(id) {
            NodeKind::Element(element) => NodeKind::Element(element.static_copy()),
            other => other.clone(),
        };
        let copy = self.push(kind);
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_static(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Serialise `id` and its subtree
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        html::write_node(self, id, &mut out);
        out
    }

    /// Serialise the children of `id`
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            html::write_node(self, *child, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_with_src(doc: &mut Document, src: &str) -> NodeId {
        let span = doc.create_element("span");
        doc.element_mut(span).unwrap().set_attr("src", src);
        span
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_text("a");
        let b = span_with_src(&mut doc, "b.py");
        let c = doc.create_text("c");
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.append_child(root, c);

        let replacement = doc.create_element("div");
        assert!(doc.replace(b, replacement));
        assert_eq!(doc.children(root), &[a, replacement, c]);
        assert_eq!(doc.parent(b), None);
        assert!(!doc.is_attached(b));
    }

    #[test]
    fn test_replace_detached_node_is_refused() {
        let mut doc = Document::new();
        let orphan = doc.create_element("span");
        let replacement = doc.create_element("div");
        assert!(!doc.replace(orphan, replacement));
        assert!(!doc.is_attached(replacement));
    }

    #[test]
    fn test_query_all_in_document_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.create_element("p");
        doc.append_child(root, p);
        let first = span_with_src(&mut doc, "one.py");
        let second = span_with_src(&mut doc, "two.py");
        doc.append_child(p, first);
        doc.append_child(root, second);

        let found = doc.query_all(root, &|el: &Element| el.tag == "span");
        assert_eq!(found, vec![first, second]);
    }

    #[test]
    fn test_clone_static_drops_behavior() {
        let mut doc = Document::new();
        let span = span_with_src(&mut doc, "a.py");
        doc.element_mut(span)
            .unwrap()
            .set_behavior(Behavior::StopPropagation);
        let text = doc.create_text("label");
        doc.append_child(span, text);

        let copy = doc.clone_static(span);
        let element = doc.element(copy).unwrap();
        assert_eq!(element.attr("src"), Some("a.py"));
        assert!(element.behavior().is_none());
        assert_eq!(doc.text_content(copy), "label");
        assert_ne!(doc.children(copy)[0], text);
    }

    #[test]
    fn test_classes_and_style() {
        let mut el = Element::new("code");
        el.add_class("language-python");
        el.add_class("is-loaded");
        el.add_class("is-loaded");
        assert_eq!(el.attr("class"), Some("language-python is-loaded"));
        assert_eq!(el.language(), Some("python"));

        el.set_style("display", "none");
        el.set_style("display", "block");
        el.set_style("color", "red");
        assert_eq!(el.style_text().as_deref(), Some("display: block; color: red;"));
        el.remove_style("color");
        assert_eq!(el.style("color"), None);
    }
}
