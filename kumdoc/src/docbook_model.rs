//! DocBook document model
//!
//! The document is an arena of [`Node`]s. Children are owned through the
//! ordered `children` lists; parent links are plain indices, so the tree can
//! be shared read-only by any number of renderers.
//!
//! A single [`Document`] may hold several top-level trees (one per loaded
//! book plus the synthesized index pages).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod error;
mod index_pages;
mod node;
pub mod xml_loader;

pub use error::XmlLoadError;
pub use index_pages::IndexKind;
pub use node::{Node, NodeId, NodeKind};

/// Arena-backed DocBook document collection
#[derive(Debug, Default)]
pub struct Document {
    /// All nodes ever created, indexed by [`NodeId`]
    nodes: Vec<Node>,
    /// Top-level nodes in load order
    roots: Vec<NodeId>,
    /// Directory each top-level tree was loaded from (for image files)
    source_dirs: HashMap<NodeId, PathBuf>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena (detached nodes included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node was ever created
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in load order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Access a node
    ///
    /// Panics if `id` was not produced by this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Mutable access to a node
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Structural parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Ordered children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Create a new top-level node
    pub fn add_root(&mut self, kind: NodeKind) -> NodeId {
        let id = self.push_node(Node::new(kind));
        self.roots.push(id);
        id
    }

    /// Append a new child node at the end of `parent`'s children
    ///
    /// Sections get their `section_level` from the nearest enclosing section.
    pub fn append_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let mut node = Node::new(kind);
        node.parent = Some(parent);
        if kind == NodeKind::Section {
            let enclosing = std::iter::once(parent)
                .chain(self.ancestors(parent))
                .find(|&a| self.kind(a) == NodeKind::Section)
                .map(|a| self.node(a).section_level)
                .unwrap_or(0);
            node.section_level = enclosing.saturating_add(1);
        }
        let id = self.push_node(node);
        self.node_mut(parent).children.push(id);
        id
    }

    /// Append a Text node holding `text`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.append_child(parent, NodeKind::Text);
        self.node_mut(id).text = text.to_string();
        id
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Remove a node from its parent's children (or from the roots)
    ///
    /// The node stays in the arena but is no longer reachable from any root.
    pub fn detach(&mut self, id: NodeId) {
        match self.parent(id) {
            Some(parent) => self.node_mut(parent).children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
        self.source_dirs.remove(&id);
    }

    /// Iterate over the ancestors of a node, nearest first (the node itself excluded)
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Top-level ancestor of a node (the node itself if it has no parent)
    pub fn top_level(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Pre-order list of all descendants of a node (the node itself excluded)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        result
    }

    /// Whether `node` is reachable from `ancestor` through children links
    pub fn has_descendant(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.children(ancestor)
            .iter()
            .any(|&child| child == node || self.has_descendant(child, node))
    }

    /// Concatenated text of all descendant Text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        if self.kind(id) == NodeKind::Text {
            text.push_str(&self.node(id).text);
        }
        for child in self.descendants(id) {
            if self.kind(child) == NodeKind::Text {
                text.push_str(&self.node(child).text);
            }
        }
        text
    }

    /// Find the first node (pre-order) under `top` whose id equals `model_id`
    pub fn find_by_id(&self, top: NodeId, model_id: &str) -> Option<NodeId> {
        if model_id.is_empty() {
            return None;
        }
        if self.node(top).id == model_id {
            return Some(top);
        }
        self.descendants(top)
            .into_iter()
            .find(|&n| self.node(n).id == model_id)
    }

    /// Find a node carrying `model_id` in any top-level tree
    pub fn find_by_id_anywhere(&self, model_id: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .find_map(|&root| self.find_by_id(root, model_id))
    }

    /// Find a live node by its key, searching every top-level tree
    pub fn find_by_key(&self, key: u64) -> Option<NodeId> {
        self.roots.iter().find_map(|&root| {
            std::iter::once(root)
                .chain(self.descendants(root))
                .find(|&n| self.node(n).key == key)
        })
    }

    /// Copy a subtree into the arena, giving every copy a fresh key
    ///
    /// The copy of `source` keeps `source`'s structural parent without being
    /// listed among its children; each copy records the node it came from.
    pub fn deep_copy(&mut self, source: NodeId) -> NodeId {
        self.copy_subtree(source, self.parent(source))
    }

    fn copy_subtree(&mut self, source: NodeId, parent: Option<NodeId>) -> NodeId {
        let mut node = self.node(source).clone();
        node.key = Node::new(node.kind).key;
        node.parent = parent;
        node.index_parent = None;
        node.origin = Some(source);
        node.children = Vec::new();
        let copy = self.push_node(node);
        let children = self.children(source).to_vec();
        for child in children {
            let child_copy = self.copy_subtree(child, Some(copy));
            self.node_mut(copy).children.push(child_copy);
        }
        copy
    }

    /// Remember the directory a top-level tree was loaded from
    pub fn set_source_dir(&mut self, root: NodeId, dir: PathBuf) {
        self.source_dirs.insert(root, dir);
    }

    /// Directory the tree containing `id` was loaded from
    pub fn source_dir(&self, id: NodeId) -> Option<&Path> {
        let top = self.top_level(id);
        self.source_dirs.get(&top).map(PathBuf::as_path)
    }
}

/// Iterator over the ancestors of a node
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let book = doc.add_root(NodeKind::Book);
        let chapter = doc.append_child(book, NodeKind::Chapter);
        let section = doc.append_child(chapter, NodeKind::Section);
        (doc, book, chapter, section)
    }

    #[test]
    fn test_section_levels() {
        let (mut doc, _, chapter, section) = sample();
        let nested = doc.append_child(section, NodeKind::Section);
        let para = doc.append_child(nested, NodeKind::Para);
        let deep = doc.append_child(para, NodeKind::Section);
        assert_eq!(doc.node(chapter).section_level, 0);
        assert_eq!(doc.node(section).section_level, 1);
        assert_eq!(doc.node(nested).section_level, 2);
        assert_eq!(doc.node(deep).section_level, 3);
    }

    #[test]
    fn test_ancestors_and_top_level() {
        let (mut doc, book, chapter, section) = sample();
        let para = doc.append_child(section, NodeKind::Para);
        let ancestors: Vec<_> = doc.ancestors(para).collect();
        assert_eq!(ancestors, vec![section, chapter, book]);
        assert_eq!(doc.top_level(para), book);
        assert_eq!(doc.top_level(book), book);
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let (mut doc, book, chapter, section) = sample();
        let second = doc.append_child(book, NodeKind::Chapter);
        assert_eq!(doc.descendants(book), vec![chapter, section, second]);
        assert!(doc.has_descendant(book, section));
        assert!(!doc.has_descendant(second, section));
    }

    #[test]
    fn test_text_content() {
        let (mut doc, _, _, section) = sample();
        let para = doc.append_child(section, NodeKind::Para);
        doc.append_text(para, "Hello, ");
        let emphasis = doc.append_child(para, NodeKind::Emphasis);
        doc.append_text(emphasis, "world");
        assert_eq!(doc.text_content(para), "Hello, world");
    }

    #[test]
    fn test_find_by_id() {
        let (mut doc, book, _, section) = sample();
        doc.node_mut(section).id = "intro".to_string();
        assert_eq!(doc.find_by_id(book, "intro"), Some(section));
        assert_eq!(doc.find_by_id(book, "missing"), None);
        assert_eq!(doc.find_by_id(book, ""), None);
        assert_eq!(doc.find_by_id_anywhere("intro"), Some(section));
    }

    #[test]
    fn test_find_by_key_skips_detached_nodes() {
        let (mut doc, _, chapter, section) = sample();
        let key = doc.node(section).key;
        assert_eq!(doc.find_by_key(key), Some(section));
        doc.detach(section);
        assert_eq!(doc.find_by_key(key), None);
        assert!(doc.children(chapter).is_empty());
    }

    #[test]
    fn test_deep_copy() {
        let (mut doc, _, chapter, section) = sample();
        let para = doc.append_child(section, NodeKind::Para);
        doc.append_text(para, "body");

        let copy = doc.deep_copy(section);
        assert_ne!(doc.node(copy).key, doc.node(section).key);
        assert_eq!(doc.parent(copy), Some(chapter));
        assert_eq!(doc.node(copy).origin, Some(section));
        assert_eq!(doc.children(chapter), &[section]);
        assert_eq!(doc.text_content(copy), "body");
        let para_copy = doc.children(copy)[0];
        assert_eq!(doc.parent(para_copy), Some(copy));
    }
}
