//! Chapter and element numbering of examples and tables

use crate::docbook_model::{Document, NodeId, NodeKind};

/// Index-page copies carry the number of the node they were copied from
fn numbered_node(doc: &Document, node: NodeId) -> NodeId {
    doc.node(node).origin.unwrap_or(node)
}

/// 1-based position of the enclosing chapter among its sibling chapters
///
/// # Returns
/// * `0` - The node is not inside a chapter, or the chapter has no parent
pub fn chapter_number(doc: &Document, node: NodeId) -> u32 {
    let node = numbered_node(doc, node);
    let Some(chapter) = doc
        .ancestors(node)
        .find(|&a| doc.kind(a) == NodeKind::Chapter)
    else {
        return 0;
    };
    let Some(book) = doc.parent(chapter) else {
        return 0;
    };
    doc.children(book)
        .iter()
        .filter(|&&c| doc.kind(c) == NodeKind::Chapter)
        .position(|&c| c == chapter)
        .map_or(0, |p| p as u32 + 1)
}

/// 1-based number of a node among the same-kind nodes of its chapter, article or book
///
/// Sections only count sections of the same level.
pub fn element_number(doc: &Document, node: NodeId) -> u32 {
    let node = numbered_node(doc, node);
    let root = doc
        .ancestors(node)
        .find(|&a| doc.kind(a).is_chapter_like())
        .unwrap_or_else(|| doc.top_level(node));
    let mut stop = false;
    count_elements(doc, root, node, &mut stop) + 1
}

/// Pre-order count of nodes matching `until` that precede it under `root`
fn count_elements(doc: &Document, root: NodeId, until: NodeId, stop: &mut bool) -> u32 {
    if root == until {
        *stop = true;
        return 0;
    }
    let root_node = doc.node(root);
    let until_node = doc.node(until);
    let mut matches = root_node.kind == until_node.kind;
    if matches && root_node.kind == NodeKind::Section {
        matches = root_node.section_level == until_node.section_level;
    }
    if matches {
        return 1;
    }

    let mut result = 0;
    for &child in doc.children(root) {
        result += count_elements(doc, child, until, stop);
        if *stop {
            break;
        }
    }
    result
}

/// Display number: `chapter.element` inside a chapter, else `element`
pub fn display_number(doc: &Document, node: NodeId) -> String {
    let chapter = chapter_number(doc, node);
    let element = element_number(doc, node);
    if chapter > 0 {
        format!("{}.{}", chapter, element)
    } else {
        element.to_string()
    }
}
