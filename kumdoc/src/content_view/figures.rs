//! Examples, tables and their internals

use super::normalize::normalize_text;
use super::numbering::display_number;
use super::ContentView;
use crate::docbook_model::{NodeId, NodeKind};
use crate::link_codec;

/// Where a table row or cell sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TablePart {
    Head,
    Body,
    Unknown,
}

impl<'a> ContentView<'a> {
    fn loaded_kind(&self) -> Option<NodeKind> {
        self.loaded.map(|page| self.doc.kind(page))
    }

    pub(super) fn render_example(&self, node: NodeId) -> String {
        let title = normalize_text(&self.doc.node(node).title);
        let index = display_number(self.doc, node);
        let anchor = link_codec::encode(self.doc, node);
        let mut result = String::new();

        if self.loaded_kind() == Some(NodeKind::ListOfExamples) {
            result.push_str(&format!("<a name='{}'>\n", anchor));
            result.push_str(&format!("<h2>Example&nbsp;{}. {}</h2>\n", index, title));
            result.push_str(&self.render_item_context_link(node));
            result.push_str(&self.render_childs(node));
            result.push_str("</a>");
        } else {
            result.push_str(&format!("<a name='{}'>\n", anchor));
            result.push_str("<table width='100%'>\n");
            result.push_str("<tr><td height='10'>&nbsp;</td></tr>\n");
            result.push_str("<tr><td align='center'>\n");
            result.push_str(
                "<table border='1' bordercolor='gray' cellspacing='0' cellpadding='10' width='100%'>",
            );
            result.push_str("<tr><td>\n");
            result.push_str(&self.render_childs(node));
            result.push_str("</td></tr></table>\n");
            result.push_str("</td></tr>\n");
            result.push_str("<tr><td align='center'>\n");
            result.push_str(&format!("<b>Example&nbsp;{}. </b>{}", index, title));
            result.push_str("</td></tr>\n");
            result.push_str("</table></a>\n");
        }
        result
    }

    pub(super) fn render_table(&self, node: NodeId) -> String {
        let title = normalize_text(&self.doc.node(node).title);
        let index = display_number(self.doc, node);
        let anchor = link_codec::encode(self.doc, node);
        let mut result = String::new();

        if self.loaded_kind() == Some(NodeKind::ListOfTables) {
            result.push_str(&format!("<a name='{}'>\n", anchor));
            result.push_str(&format!("<h2>Table&nbsp;{}. {}</h2>\n", index, title));
            result.push_str(&self.render_item_context_link(node));
            result.push_str("<br/>");
            result.push_str(&self.render_table_content(node));
            result.push_str("</a>");
        } else {
            result.push_str(&format!("<a name='{}'>\n", anchor));
            result.push_str("<table width='100%'>\n");
            result.push_str("<tr><td height='10'>&nbsp;</td></tr>\n");
            result.push_str(&format!(
                "<tr><td align='left'><b>Table&nbsp;{}. </b>{}</td></tr>\n",
                index, title
            ));
            result.push_str("<tr><td>\n");
            result.push_str(&self.render_table_content(node));
            result.push_str("</td></tr>\n");
            result.push_str("<tr><td height='10'>&nbsp;</td></tr>\n");
            result.push_str("</table>\n");
        }
        result
    }

    pub(super) fn render_informal_table(&self, node: NodeId) -> String {
        self.render_table_content(node)
    }

    fn render_table_content(&self, node: NodeId) -> String {
        let mut result = String::new();
        result.push_str(
            "<table border='1' bordercolor='black' cellspacing='0' cellpadding='0' width='100%'>\n",
        );
        result.push_str("<tr><td>\n");
        result.push_str("<table border='0' cellspacing='0' cellpadding='10' width='100%'>\n");
        result.push_str(&self.render_childs(node));
        result.push_str("</table>\n");
        result.push_str("</td></tr>\n");
        result.push_str("</table>\n");
        result
    }

    /// "Context:" link from an index entry back to its enclosing section
    fn render_item_context_link(&self, node: NodeId) -> String {
        let context = self.doc.ancestors(node).find(|&a| {
            matches!(
                self.doc.kind(a),
                NodeKind::Section | NodeKind::Chapter | NodeKind::Article | NodeKind::Book
            )
        });
        match context {
            Some(context) => format!(
                "<p><b>Context:</b> <a href='{}'>{}</a></p>",
                link_codec::href(self.doc, context),
                normalize_text(&self.doc.node(context).title)
            ),
            None => String::new(),
        }
    }

    pub(super) fn render_thead(&self, node: NodeId) -> String {
        format!("<thead>\n{}</thead>\n", self.render_childs(node))
    }

    pub(super) fn render_tbody(&self, node: NodeId) -> String {
        format!("<tbody>\n{}</tbody>\n", self.render_childs(node))
    }

    fn table_part(&self, node: NodeId) -> TablePart {
        self.doc
            .ancestors(node)
            .find_map(|a| match self.doc.kind(a) {
                NodeKind::THead => Some(TablePart::Head),
                NodeKind::TBody => Some(TablePart::Body),
                _ => None,
            })
            .unwrap_or(TablePart::Unknown)
    }

    pub(super) fn render_row(&self, node: NodeId) -> String {
        let open = if self.table_part(node) == TablePart::Head {
            "<tr valign='center' bgcolor='lightgray'>\n"
        } else {
            "<tr valign='center'>\n"
        };
        format!("{}{}</tr>\n", open, self.render_childs(node))
    }

    pub(super) fn render_entry(&self, node: NodeId) -> String {
        let content = self.render_childs(node);
        if self.table_part(node) == TablePart::Head {
            format!("<td align='center' valign='center'>\n<b>{}</b></td>\n", content)
        } else {
            format!("<td align='center' valign='center'>\n{}</td>\n", content)
        }
    }
}
