//! DocBook to HTML renderer
//!
//! A [`ContentView`] renders one page at a time. Navigating to any node loads
//! the page that contains it (see [`pagination::one_page_parent`]) and then
//! jumps to the node's anchor, so intra-page jumps never rebuild the HTML.
//!
//! Rendering never fails: unknown content, unresolved cross-references and
//! missing images degrade to empty or broken output.

use crate::docbook_model::{Document, NodeId, NodeKind};
use crate::link_codec;
use crate::source_highlighter::SourceHighlighter;

mod figures;
pub mod normalize;
pub mod numbering;
pub mod pagination;
mod resources;

use normalize::{escape_html, normalize_text};
pub use resources::{load_resource, mime_type_for, ImageResource};

/// Result of a navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Full page HTML, present only when a different page had to be loaded
    pub html: Option<String>,
    /// Page root now loaded
    pub page: NodeId,
    /// Anchor name of the requested node
    pub anchor: String,
}

/// Stateful HTML view over a document
pub struct ContentView<'a> {
    doc: &'a Document,
    highlighter: &'a SourceHighlighter,
    /// Page root whose HTML is currently loaded
    loaded: Option<NodeId>,
}

impl<'a> ContentView<'a> {
    /// Create a view with nothing loaded
    pub fn new(doc: &'a Document, highlighter: &'a SourceHighlighter) -> Self {
        Self {
            doc,
            highlighter,
            loaded: None,
        }
    }

    /// Forget the loaded page
    pub fn reset(&mut self) {
        self.loaded = None;
    }

    /// Page root currently loaded
    pub fn loaded_page(&self) -> Option<NodeId> {
        self.loaded
    }

    /// Show `node`: load its page if needed and target its anchor
    pub fn render_data(&mut self, node: NodeId) -> Navigation {
        let page = self.one_page_parent_model(node);
        let html = if self.loaded != Some(page) {
            log::debug!("Loading page '{}'", self.doc.node(page).title);
            Some(self.render_page(page))
        } else {
            None
        };
        Navigation {
            html,
            page,
            anchor: link_codec::encode(self.doc, node),
        }
    }

    /// Load the page containing `node` and return it as a complete HTML document
    pub fn render_page(&mut self, node: NodeId) -> String {
        wrap_html(&self.render_page_body(node))
    }

    /// Load the page containing `node` and return its body markup
    pub fn render_page_body(&mut self, node: NodeId) -> String {
        let page = self.one_page_parent_model(node);
        self.loaded = Some(page);
        self.render(page)
    }

    /// Decode a clicked `model_ptr:` link
    ///
    /// # Returns
    /// * `Some(NodeId)` - Node to pass to [`ContentView::render_data`]
    /// * `None` - Not an internal link, or a stale token; the caller ignores it
    pub fn handle_internal_link(&self, url: &str) -> Option<NodeId> {
        link_codec::parse_href(self.doc, url)
    }

    /// Resolve an image source produced by this view
    pub fn load_resource(&self, url: &str) -> Option<ImageResource> {
        load_resource(self.doc, url)
    }

    /// Root of the page that displays `node`
    pub fn one_page_parent_model(&self, node: NodeId) -> NodeId {
        pagination::one_page_parent(self.doc, node)
    }

    /// Top-level ancestor of `node`
    pub fn top_level_model(&self, node: NodeId) -> NodeId {
        self.doc.top_level(node)
    }

    /// Node with `model_id` in the tree rooted at `top`
    pub fn find_model_by_id(&self, top: NodeId, model_id: &str) -> Option<NodeId> {
        self.doc.find_by_id(top, model_id)
    }

    pub fn chapter_number(&self, node: NodeId) -> u32 {
        numbering::chapter_number(self.doc, node)
    }

    pub fn element_number(&self, node: NodeId) -> u32 {
        numbering::element_number(self.doc, node)
    }

    /// Whether `node` is part of the loaded page
    pub fn has_model_on_this_page(&self, node: NodeId) -> bool {
        self.loaded
            .is_some_and(|page| self.doc.has_descendant(page, node))
    }

    /// A node whose subtree holds no sectioning node renders as a single leaf in a TOC
    pub fn is_plain_page(&self, node: NodeId) -> bool {
        !self
            .doc
            .descendants(node)
            .into_iter()
            .any(|d| self.doc.kind(d).is_sectioning())
    }

    /// Render a node as HTML (TOC for sets and books)
    pub fn render(&self, node: NodeId) -> String {
        self.render_element(node)
    }

    fn render_element(&self, node: NodeId) -> String {
        match self.doc.kind(node) {
            NodeKind::Set | NodeKind::Book => self.render_toc(node),
            NodeKind::Chapter | NodeKind::Article => self.render_chapter(node),
            NodeKind::Section => self.render_section(node),
            NodeKind::Para => self.render_paragraph(node),
            NodeKind::Text => self.render_text(node),
            NodeKind::Emphasis => self.render_emphasis(node),
            NodeKind::ListItem => format!("<li>\n{}</li>", self.render_childs(node)),
            NodeKind::OrderedList => format!("<ol>\n{}</ol>", self.render_childs(node)),
            NodeKind::ItemizedList => format!("<ul>\n{}</ul>", self.render_childs(node)),
            NodeKind::Example => self.render_example(node),
            NodeKind::ProgramListing => self.render_program_listing(node),
            NodeKind::Code => self.render_code(node),
            NodeKind::Xref => self.render_xref(node),
            NodeKind::KeyCombo => self.render_key_combo(node),
            NodeKind::KeySym => self.render_key_sym(node),
            NodeKind::Table => self.render_table(node),
            NodeKind::InformalTable => self.render_informal_table(node),
            NodeKind::THead => self.render_thead(node),
            NodeKind::TBody => self.render_tbody(node),
            NodeKind::Row => self.render_row(node),
            NodeKind::Entry => self.render_entry(node),
            NodeKind::InlineMediaObject => self.render_inline_media_object(node),
            NodeKind::ImageObject => self.render_image_object(node),
            NodeKind::ListOfExamples | NodeKind::ListOfTables => self.render_chapter(node),
            // Image data is only reachable through its image object
            NodeKind::ImageData => String::new(),
        }
    }

    fn render_childs(&self, node: NodeId) -> String {
        let mut result = String::new();
        for &child in self.doc.children(node) {
            result.push_str(&self.render_element(child));
            result.push('\n');
        }
        result
    }

    /// TOC header followed by the full content
    fn render_chapter(&self, node: NodeId) -> String {
        let mut result = self.render_toc(node);
        for &child in self.doc.children(node) {
            result.push_str(&self.render_element(child));
        }
        result
    }

    fn render_toc(&self, node: NodeId) -> String {
        let data = self.doc.node(node);
        let title = match data.kind {
            NodeKind::ListOfExamples => format!("List of examples in \"{}\"", data.title),
            NodeKind::ListOfTables => format!("List of tables in \"{}\"", data.title),
            _ => data.title.clone(),
        };
        let mut result = format!("<h1 class=\"title\">{}</h1>\n", normalize_text(&title));
        if !data.subtitle.is_empty() {
            result.push_str(&format!(
                "<h1 class=\"subtitle\">{}</h1>\n",
                normalize_text(&data.subtitle)
            ));
        }
        result.push_str("<hr/>\n<ol>\n");
        for child in self.toc_entries(node) {
            result.push_str(&self.render_toc_element(child));
        }
        result.push_str("</ol>\n<hr/>\n");
        result
    }

    /// Children listed in the TOC of `node`
    fn toc_entries(&self, node: NodeId) -> Vec<NodeId> {
        let index_page = matches!(
            self.doc.kind(node),
            NodeKind::ListOfExamples | NodeKind::ListOfTables
        );
        self.doc
            .children(node)
            .iter()
            .copied()
            .filter(|&c| index_page || self.doc.kind(c).is_sectioning())
            .collect()
    }

    fn render_toc_element(&self, node: NodeId) -> String {
        let mut result = format!(
            "\n<li><p><a href=\"{}\">{}</a></p>",
            link_codec::href(self.doc, node),
            normalize_text(&self.doc.node(node).title)
        );
        if !self.is_plain_page(node) {
            result.push_str("\n<ol>\n");
            for child in self.toc_entries(node) {
                result.push_str(&self.render_toc_element(child));
            }
            result.push_str("\n</ol>\n");
        }
        result.push_str("</li>\n");
        result
    }

    fn render_section(&self, node: NodeId) -> String {
        let data = self.doc.node(node);
        let page = self.doc.node(self.one_page_parent_model(node));
        let relative = i32::from(data.section_level) - i32::from(page.section_level);
        let level = (relative + 1).clamp(1, 6);
        let anchor = link_codec::encode(self.doc, node);

        let mut result = format!(
            "<a name='{}'><h{} class=\"title\">{}</h{}></a>\n",
            anchor,
            level,
            normalize_text(&data.title),
            level
        );
        if !data.subtitle.is_empty() {
            result.push_str(&format!(
                "<h{} class=\"subtitle\">{}</h{}>\n",
                level,
                normalize_text(&data.subtitle),
                level
            ));
        }
        result.push_str(&self.render_childs(node));
        result
    }

    fn render_paragraph(&self, node: NodeId) -> String {
        format!("<p>{}</p>", self.render_childs(node))
    }

    fn render_emphasis(&self, node: NodeId) -> String {
        let tag = if self.doc.node(node).role == "bold" {
            "b"
        } else {
            "i"
        };
        format!("<{}>{}</{}>", tag, self.render_childs(node), tag)
    }

    fn render_text(&self, node: NodeId) -> String {
        let preformatted = self.doc.ancestors(node).any(|a| {
            matches!(
                self.doc.kind(a),
                NodeKind::ProgramListing | NodeKind::Code
            )
        });
        let text = &self.doc.node(node).text;
        if preformatted {
            text.clone()
        } else {
            normalize_text(text)
        }
    }

    fn render_program_listing(&self, node: NodeId) -> String {
        let source = self.doc.text_content(node);
        format!(
            "<pre align='left'><font face='monospace'>{}</font></pre>\n",
            self.highlighter.highlight(&source, &self.doc.node(node).role)
        )
    }

    fn render_code(&self, node: NodeId) -> String {
        let source = self.doc.text_content(node);
        format!(
            "<font face='monospace'>{}</font>",
            self.highlighter.highlight(&source, &self.doc.node(node).role)
        )
    }

    fn render_xref(&self, node: NodeId) -> String {
        let data = self.doc.node(node);
        let top = self.top_level_model(node);
        let Some(target) = self.find_model_by_id(top, &data.xref_link_end) else {
            log::debug!("Unresolved cross-reference '{}'", data.xref_link_end);
            return String::new();
        };
        let term = self.find_model_by_id(top, &data.xref_end_term);

        let href = if self.has_model_on_this_page(target) {
            format!("#{}", link_codec::encode(self.doc, target))
        } else {
            link_codec::href(self.doc, target)
        };
        let title = normalize_text(&self.doc.node(term.unwrap_or(target)).title);
        format!("(see&nbsp;<a href=\"{}\">{}</a>)", href, title)
    }

    fn render_key_combo(&self, node: NodeId) -> String {
        self.doc
            .children(node)
            .iter()
            .map(|&child| self.render_element(child))
            .collect::<Vec<_>>()
            .join("&nbsp;")
    }

    fn render_key_sym(&self, node: NodeId) -> String {
        self.doc
            .text_content(node)
            .split('+')
            .filter(|key| !key.is_empty())
            .map(|key| format!("<kbd>{}</kbd>", escape_html(&key.to_uppercase())))
            .collect::<Vec<_>>()
            .join("+")
    }

    /// ImageObject child holding the preferred image (PNG over SVG)
    pub fn find_image_data(&self, node: NodeId) -> Option<NodeId> {
        let mut svg = None;
        let mut png = None;
        for &child in self.doc.children(node) {
            if self.doc.kind(child) != NodeKind::ImageObject {
                continue;
            }
            for &data in self.doc.children(child) {
                if self.doc.kind(data) != NodeKind::ImageData {
                    continue;
                }
                match self.doc.node(data).format.as_str() {
                    "svg" => svg = Some(child),
                    "png" => png = Some(child),
                    _ => {}
                }
            }
        }
        png.or(svg)
    }

    fn render_inline_media_object(&self, node: NodeId) -> String {
        match self.find_image_data(node) {
            Some(object) => self.render_element(object),
            None => String::new(),
        }
    }

    fn render_image_object(&self, node: NodeId) -> String {
        let image = self
            .doc
            .children(node)
            .iter()
            .copied()
            .find(|&c| self.doc.kind(c) == NodeKind::ImageData);
        let token = image
            .map(|i| link_codec::encode(self.doc, i))
            .unwrap_or_default();
        format!("<img src='{}{}'>", link_codec::MODEL_SCHEME, token)
    }
}

/// Wrap a page body into a complete HTML document
pub fn wrap_html(body: &str) -> String {
    format!(
        "<html><head><style type=\"text/css\">kbd {{ background-color: lightgray; }}</style></head><body>\n{}\n</body></html>",
        body
    )
}
