//! Synthesized "List of Examples" and "List of Tables" pages

use super::{Document, NodeId, NodeKind};

/// Which index page to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Examples,
    Tables,
}

impl IndexKind {
    fn page_kind(self) -> NodeKind {
        match self {
            IndexKind::Examples => NodeKind::ListOfExamples,
            IndexKind::Tables => NodeKind::ListOfTables,
        }
    }

    fn entry_kind(self) -> NodeKind {
        match self {
            IndexKind::Examples => NodeKind::Example,
            IndexKind::Tables => NodeKind::Table,
        }
    }
}

impl Document {
    /// Build an index page listing every example or table of `book`
    ///
    /// The page is a new top-level node. Each entry is a copy of the listed
    /// node that keeps the original structural parent (so numbering and the
    /// context link still work) and paginates under the index page.
    ///
    /// # Returns
    /// * `Some(NodeId)` - The new index page
    /// * `None` - The book contains nothing to list
    pub fn build_index_page(&mut self, book: NodeId, kind: IndexKind) -> Option<NodeId> {
        let entries: Vec<NodeId> = self
            .descendants(book)
            .into_iter()
            .filter(|&n| self.kind(n) == kind.entry_kind())
            .collect();
        if entries.is_empty() {
            return None;
        }

        let page = self.add_root(kind.page_kind());
        let title = self.node(book).title.clone();
        self.node_mut(page).title = title;
        if let Some(dir) = self.source_dir(book).map(|d| d.to_path_buf()) {
            self.set_source_dir(page, dir);
        }

        for entry in entries {
            let copy = self.deep_copy(entry);
            self.node_mut(copy).index_parent = Some(page);
            self.node_mut(page).children.push(copy);
        }

        log::debug!(
            "Built {:?} index for '{}' with {} entries",
            kind,
            self.node(book).title,
            self.children(page).len()
        );
        Some(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_examples_index() {
        let mut doc = Document::new();
        let book = doc.add_root(NodeKind::Book);
        doc.node_mut(book).title = "Guide".to_string();
        let chapter = doc.append_child(book, NodeKind::Chapter);
        let example = doc.append_child(chapter, NodeKind::Example);
        doc.append_child(chapter, NodeKind::Table);

        let page = doc.build_index_page(book, IndexKind::Examples).unwrap();
        assert_eq!(doc.kind(page), NodeKind::ListOfExamples);
        assert_eq!(doc.node(page).title, "Guide");
        assert!(doc.roots().contains(&page));

        let entries = doc.children(page).to_vec();
        assert_eq!(entries.len(), 1);
        let entry = doc.node(entries[0]);
        assert_eq!(entry.kind, NodeKind::Example);
        assert_eq!(entry.origin, Some(example));
        assert_eq!(entry.parent, Some(chapter));
        assert_eq!(entry.index_parent, Some(page));
    }

    #[test]
    fn test_empty_index_is_not_built() {
        let mut doc = Document::new();
        let book = doc.add_root(NodeKind::Book);
        doc.append_child(book, NodeKind::Chapter);
        assert!(doc.build_index_page(book, IndexKind::Tables).is_none());
        assert_eq!(doc.roots().len(), 1);
    }
}
