//! Link tokens for document nodes
//!
//! A token is the node key written as 16 lowercase hex digits, so it can be
//! embedded in an href or an anchor name without percent-encoding. Tokens
//! are only meaningful inside the process that minted them.

use crate::docbook_model::{Document, NodeId};

/// Pseudo-URL scheme for intra-document navigation and image sources
pub const MODEL_SCHEME: &str = "model_ptr:";

const TOKEN_LEN: usize = 16;

/// Encode a node as a link token
pub fn encode(doc: &Document, node: NodeId) -> String {
    format!("{:016x}", doc.node(node).key)
}

/// Resolve a link token back to a live node
///
/// # Returns
/// * `Some(NodeId)` - The node is still reachable from a top-level tree
/// * `None` - Malformed token, or the node was detached or belongs to another document
pub fn decode(doc: &Document, token: &str) -> Option<NodeId> {
    if token.len() != TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let key = u64::from_str_radix(token, 16).ok()?;
    doc.find_by_key(key)
}

/// `model_ptr:` URL pointing at a node
pub fn href(doc: &Document, node: NodeId) -> String {
    format!("{}{}", MODEL_SCHEME, encode(doc, node))
}

/// Resolve a `model_ptr:` URL, ignoring any other scheme
pub fn parse_href(doc: &Document, url: &str) -> Option<NodeId> {
    let token = url.strip_prefix(MODEL_SCHEME)?;
    let token = token.split('#').next().unwrap_or(token);
    decode(doc, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docbook_model::NodeKind;

    #[test]
    fn test_round_trip() {
        let mut doc = Document::new();
        let book = doc.add_root(NodeKind::Book);
        let chapter = doc.append_child(book, NodeKind::Chapter);

        let token = encode(&doc, chapter);
        assert_eq!(token.len(), 16);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(decode(&doc, &token), Some(chapter));
        assert_eq!(parse_href(&doc, &href(&doc, chapter)), Some(chapter));
    }

    #[test]
    fn test_detached_node_does_not_resolve() {
        let mut doc = Document::new();
        let book = doc.add_root(NodeKind::Book);
        let chapter = doc.append_child(book, NodeKind::Chapter);
        let token = encode(&doc, chapter);
        doc.detach(chapter);
        assert_eq!(decode(&doc, &token), None);
    }

    #[test]
    fn test_token_from_other_document() {
        let mut first = Document::new();
        let book = first.add_root(NodeKind::Book);
        let token = encode(&first, book);

        let mut second = Document::new();
        second.add_root(NodeKind::Book);
        assert_eq!(decode(&second, &token), None);
    }

    #[test]
    fn test_malformed_tokens() {
        let mut doc = Document::new();
        doc.add_root(NodeKind::Book);
        assert_eq!(decode(&doc, ""), None);
        assert_eq!(decode(&doc, "xyz"), None);
        assert_eq!(decode(&doc, "+000000000000001"), None);
        assert_eq!(parse_href(&doc, "http://example.com"), None);
        assert_eq!(parse_href(&doc, "model_ptr:"), None);
    }
}
