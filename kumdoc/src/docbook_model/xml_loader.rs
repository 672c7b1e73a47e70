//! DocBook XML loader
//!
//! Builds [`Document`] trees from DocBook XML using quick-xml's event reader.
//! Elements outside the supported vocabulary are transparent: their content is
//! attached to the nearest supported ancestor, so wrappers such as `tgroup` or
//! `info` do not hide their children.

use super::{Document, NodeId, NodeKind, XmlLoadError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// Element on the loader stack
enum OpenElement {
    /// A supported element that became a node
    Node(NodeId),
    /// A `<title>` or `<subtitle>` collecting text for its owner
    Title {
        owner: Option<NodeId>,
        subtitle: bool,
        text: String,
    },
    /// An unsupported element
    Transparent,
}

/// Load a DocBook XML file as a new top-level tree
///
/// # Parameters
/// * `doc` - Document receiving the tree
/// * `path` - Path of the XML file; its directory resolves image file references
///
/// # Returns
/// * `Ok(NodeId)` - Root node of the loaded tree
/// * `Err(XmlLoadError)` - The file could not be read or parsed
pub fn load_file(doc: &mut Document, path: &Path) -> Result<NodeId, XmlLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| XmlLoadError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    let root = load_str(doc, &content)?;
    if let Some(dir) = path.parent() {
        doc.set_source_dir(root, dir.to_path_buf());
    }
    log::info!(
        "Loaded {} ({} nodes in document)",
        path.display(),
        doc.len()
    );
    Ok(root)
}

/// Load DocBook XML text as a new top-level tree
pub fn load_str(doc: &mut Document, xml: &str) -> Result<NodeId, XmlLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<NodeId> = None;

    loop {
        let event = reader.read_event().map_err(|source| XmlLoadError::XmlError {
            position: reader.buffer_position(),
            source,
        })?;
        match event {
            Event::Start(e) => {
                let element = open_element(doc, &stack, &mut root, &e);
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = open_element(doc, &stack, &mut root, &e);
                close_element(doc, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    close_element(doc, element);
                }
            }
            Event::Text(e) => {
                push_text(doc, &mut stack, &String::from_utf8_lossy(e.as_ref()));
            }
            Event::CData(e) => {
                push_text(doc, &mut stack, &String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&entity) {
                    Some(resolved) => push_text(doc, &mut stack, &resolved),
                    None => log::debug!("Ignoring unknown entity &{};", entity),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or(XmlLoadError::NoRootElement)
}

/// Nearest element that is not transparent
fn innermost(stack: &[OpenElement]) -> Option<&OpenElement> {
    stack
        .iter()
        .rev()
        .find(|e| !matches!(e, OpenElement::Transparent))
}

fn innermost_node(stack: &[OpenElement]) -> Option<NodeId> {
    match innermost(stack) {
        Some(OpenElement::Node(id)) => Some(*id),
        _ => None,
    }
}

fn open_element(
    doc: &mut Document,
    stack: &[OpenElement],
    root: &mut Option<NodeId>,
    element: &BytesStart,
) -> OpenElement {
    let qname = element.name();
    let name = String::from_utf8_lossy(local_name(qname.as_ref())).to_string();

    // Markup inside a title only contributes its text
    if matches!(innermost(stack), Some(OpenElement::Title { .. })) {
        return OpenElement::Transparent;
    }

    let owner = innermost_node(stack);
    if name == "title" || name == "subtitle" {
        return OpenElement::Title {
            owner,
            subtitle: name == "subtitle",
            text: String::new(),
        };
    }

    let Some(kind) = NodeKind::from_element_name(&name) else {
        log::debug!("Treating <{}> as transparent", name);
        return OpenElement::Transparent;
    };

    let id = match owner {
        Some(parent) => doc.append_child(parent, kind),
        None if root.is_none() => {
            let id = doc.add_root(kind);
            *root = Some(id);
            id
        }
        None => {
            log::warn!("Ignoring second top-level element <{}>", name);
            return OpenElement::Transparent;
        }
    };
    apply_attributes(doc, id, element);
    OpenElement::Node(id)
}

fn close_element(doc: &mut Document, element: OpenElement) {
    if let OpenElement::Title {
        owner: Some(owner),
        subtitle,
        text,
    } = element
    {
        let text = collapse_whitespace(&text);
        let node = doc.node_mut(owner);
        if subtitle {
            node.subtitle = text;
        } else {
            node.title = text;
        }
    }
}

fn apply_attributes(doc: &mut Document, id: NodeId, element: &BytesStart) {
    for attr in element.attributes().flatten() {
        let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).to_string();
        let raw = String::from_utf8_lossy(&attr.value).to_string();
        let value = quick_xml::escape::unescape(&raw)
            .map(|v| v.to_string())
            .unwrap_or(raw);
        let node = doc.node_mut(id);
        match key.as_str() {
            "id" => node.id = value,
            "role" | "language" => node.role = value,
            "linkend" => node.xref_link_end = value,
            "endterm" => node.xref_end_term = value,
            "fileref" => node.fileref = value,
            "format" => node.format = value.to_lowercase(),
            _ => {}
        }
    }

    // Guess a missing image format from the file extension
    let node = doc.node_mut(id);
    if node.kind == NodeKind::ImageData && node.format.is_empty() {
        if let Some(ext) = Path::new(&node.fileref).extension().and_then(|e| e.to_str()) {
            node.format = ext.to_lowercase();
        }
    }
}

fn push_text(doc: &mut Document, stack: &mut [OpenElement], text: &str) {
    if text.is_empty() {
        return;
    }
    let target = stack
        .iter_mut()
        .rev()
        .find(|e| !matches!(e, OpenElement::Transparent));
    match target {
        Some(OpenElement::Title { text: buffer, .. }) => buffer.push_str(text),
        Some(OpenElement::Node(parent)) => {
            let parent = *parent;
            if text.trim().is_empty() && !keeps_whitespace(doc.kind(parent)) {
                return;
            }
            // Merge with a preceding text run (text split around entities)
            if let Some(&last) = doc.children(parent).last() {
                if doc.kind(last) == NodeKind::Text {
                    doc.node_mut(last).text.push_str(text);
                    return;
                }
            }
            doc.append_text(parent, text);
        }
        _ => {}
    }
}

/// Kinds whose whitespace-only text is significant
fn keeps_whitespace(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Para
            | NodeKind::Emphasis
            | NodeKind::ProgramListing
            | NodeKind::Code
            | NodeKind::KeySym
            | NodeKind::Entry
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some('\u{a0}'.to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()
    } else {
        None
    };
    code.and_then(char::from_u32).map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<book xmlns="http://docbook.org/ns/docbook" xml:id="guide">
  <info><title>Programming   Guide</title><subtitle>Second edition</subtitle></info>
  <chapter xml:id="ch1">
    <title>Basics</title>
    <section xml:id="s1">
      <title>Values <emphasis>and</emphasis> types</title>
      <para>Use <emphasis role="bold">cel</emphasis> &amp; <code role="kumir">вещ</code>.</para>
      <section><title>Nested</title></section>
    </section>
    <informaltable>
      <tgroup cols="2">
        <thead><row><entry>A</entry><entry>B</entry></row></thead>
      </tgroup>
    </informaltable>
    <programlisting role="pascal"><![CDATA[begin
  x := 1 < 2
end]]></programlisting>
    <para><xref linkend="s1"/><inlinemediaobject><imageobject><imagedata fileref="img/shot.PNG"/></imageobject></inlinemediaobject></para>
  </chapter>
</book>
"#;

    #[test]
    fn test_load_book_structure() {
        let mut doc = Document::new();
        let book = load_str(&mut doc, BOOK).unwrap();

        let node = doc.node(book);
        assert_eq!(node.kind, NodeKind::Book);
        assert_eq!(node.id, "guide");
        assert_eq!(node.title, "Programming Guide");
        assert_eq!(node.subtitle, "Second edition");

        let chapter = doc.find_by_id(book, "ch1").unwrap();
        assert_eq!(doc.kind(chapter), NodeKind::Chapter);
        assert_eq!(doc.node(chapter).title, "Basics");

        let section = doc.find_by_id(book, "s1").unwrap();
        assert_eq!(doc.node(section).title, "Values and types");
        assert_eq!(doc.node(section).section_level, 1);
        let nested = *doc
            .children(section)
            .iter()
            .find(|&&c| doc.kind(c) == NodeKind::Section)
            .unwrap();
        assert_eq!(doc.node(nested).section_level, 2);
    }

    #[test]
    fn test_inline_text_and_entities() {
        let mut doc = Document::new();
        let book = load_str(&mut doc, BOOK).unwrap();
        let section = doc.find_by_id(book, "s1").unwrap();
        let para = doc.children(section)[0];
        assert_eq!(doc.kind(para), NodeKind::Para);
        assert_eq!(doc.text_content(para), "Use cel & вещ.");

        let kinds: Vec<_> = doc.children(para).iter().map(|&c| doc.kind(c)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Text,
                NodeKind::Emphasis,
                NodeKind::Text,
                NodeKind::Code,
                NodeKind::Text
            ]
        );
        let emphasis = doc.children(para)[1];
        assert_eq!(doc.node(emphasis).role, "bold");
    }

    #[test]
    fn test_transparent_wrappers() {
        let mut doc = Document::new();
        let book = load_str(&mut doc, BOOK).unwrap();
        let table = doc
            .descendants(book)
            .into_iter()
            .find(|&n| doc.kind(n) == NodeKind::InformalTable)
            .unwrap();
        let head = doc.children(table)[0];
        assert_eq!(doc.kind(head), NodeKind::THead);
    }

    #[test]
    fn test_program_listing_keeps_cdata() {
        let mut doc = Document::new();
        let book = load_str(&mut doc, BOOK).unwrap();
        let listing = doc
            .descendants(book)
            .into_iter()
            .find(|&n| doc.kind(n) == NodeKind::ProgramListing)
            .unwrap();
        assert_eq!(doc.node(listing).role, "pascal");
        assert_eq!(doc.text_content(listing), "begin\n  x := 1 < 2\nend");
    }

    #[test]
    fn test_empty_elements_and_image_format() {
        let mut doc = Document::new();
        let book = load_str(&mut doc, BOOK).unwrap();
        let xref = doc
            .descendants(book)
            .into_iter()
            .find(|&n| doc.kind(n) == NodeKind::Xref)
            .unwrap();
        assert_eq!(doc.node(xref).xref_link_end, "s1");
        assert!(doc.children(xref).is_empty());

        let image = doc
            .descendants(book)
            .into_iter()
            .find(|&n| doc.kind(n) == NodeKind::ImageData)
            .unwrap();
        assert_eq!(doc.node(image).fileref, "img/shot.PNG");
        assert_eq!(doc.node(image).format, "png");
    }

    #[test]
    fn test_no_root_element() {
        let mut doc = Document::new();
        let err = load_str(&mut doc, "<unknown><other/></unknown>").unwrap_err();
        assert!(matches!(err, XmlLoadError::NoRootElement));
    }

    #[test]
    fn test_malformed_xml() {
        let mut doc = Document::new();
        let err = load_str(&mut doc, "<book><chapter></book>").unwrap_err();
        assert!(matches!(err, XmlLoadError::XmlError { .. }));
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp").as_deref(), Some("&"));
        assert_eq!(resolve_entity("#x41").as_deref(), Some("A"));
        assert_eq!(resolve_entity("#1046").as_deref(), Some("Ж"));
        assert_eq!(resolve_entity("bogus"), None);
    }
}
