//! Page lookup

use crate::docbook_model::{Document, NodeId};

/// Root of the page that displays `node`
///
/// A node is its own page when it has no parent or is a Chapter, Article,
/// Book, ListOfExamples or ListOfTables. Otherwise its `index_parent` wins,
/// then a Chapter/Article/Book parent, and finally the page of its parent.
pub fn one_page_parent(doc: &Document, node: NodeId) -> NodeId {
    let mut current = node;
    loop {
        let data = doc.node(current);
        let Some(parent) = data.parent else {
            return current;
        };
        if data.kind.is_page_kind() {
            return current;
        }
        if let Some(index_parent) = data.index_parent {
            return index_parent;
        }
        if doc.kind(parent).is_chapter_like() {
            return parent;
        }
        current = parent;
    }
}
