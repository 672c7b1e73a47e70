//! Static HTML export of rendered pages
//!
//! Every page root of the document becomes one HTML file:
//! - `model_ptr:` links are rewritten to `page-N.html#anchor`
//! - Images are embedded as data URLs (base64 encoded) or linked by path
//! - Pages share a small built-in stylesheet

use crate::content_view::{self, ContentView};
use crate::docbook_model::{Document, NodeId};
use crate::link_codec::{self, MODEL_SCHEME};
use crate::source_highlighter::SourceHighlighter;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Errors that can occur during HTML export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}", path = .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document has no pages to export")]
    NothingToExport,
}

/// Export settings
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Embed images as data URLs instead of linking the source files
    pub embed_images: bool,
    /// Stylesheet replacing the built-in one
    pub stylesheet: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            embed_images: true,
            stylesheet: None,
        }
    }
}

/// A rendered page ready to be written
#[derive(Debug, Clone)]
pub struct ExportedPage {
    /// Page root
    pub root: NodeId,
    /// File name inside the output directory
    pub file_name: String,
    /// Complete HTML document
    pub html: String,
}

/// Every page root reachable from the document roots, in document order
pub fn collect_pages(doc: &Document) -> Vec<NodeId> {
    let mut pages = Vec::new();
    for &root in doc.roots() {
        for node in std::iter::once(root).chain(doc.descendants(root)) {
            if content_view::pagination::one_page_parent(doc, node) == node {
                pages.push(node);
            }
        }
    }
    pages
}

/// File name of the `position`-th page
fn page_file_name(position: usize) -> String {
    if position == 0 {
        "index.html".to_string()
    } else {
        format!("page-{}.html", position)
    }
}

/// Render every page of `doc` to a standalone HTML document
///
/// # Parameters
/// * `doc` - Loaded document, index pages included
/// * `highlighter` - Highlighter for program listings
/// * `options` - Image and stylesheet settings
///
/// # Returns
/// * `Ok(Vec<ExportedPage>)` - Pages in document order; the first is `index.html`
/// * `Err(ExportError)` - The document has no pages
pub fn render_site(
    doc: &Document,
    highlighter: &SourceHighlighter,
    options: &ExportOptions,
) -> Result<Vec<ExportedPage>, ExportError> {
    let pages = collect_pages(doc);
    if pages.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    let files: HashMap<NodeId, String> = pages
        .iter()
        .enumerate()
        .map(|(i, &page)| (page, page_file_name(i)))
        .collect();

    let render = |page: &NodeId| {
        let mut view = ContentView::new(doc, highlighter);
        let body = view.render_page_body(*page);
        let body = rewrite_links(doc, &body, &files, options);
        ExportedPage {
            root: *page,
            file_name: files[page].clone(),
            html: wrap_page(&doc.node(*page).title, &body, options),
        }
    };

    // Pages render independently (optionally in parallel)
    #[cfg(feature = "parallel")]
    let exported = pages.par_iter().map(render).collect();

    #[cfg(not(feature = "parallel"))]
    let exported = pages.iter().map(render).collect();

    Ok(exported)
}

/// Write rendered pages into `output_dir`, creating it if needed
pub fn write_site(pages: &[ExportedPage], output_dir: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(output_dir).map_err(|source| ExportError::IoError {
        path: output_dir.to_path_buf(),
        source,
    })?;
    for page in pages {
        let path = output_dir.join(&page.file_name);
        let mut file = fs::File::create(&path).map_err(|source| ExportError::IoError {
            path: path.clone(),
            source,
        })?;
        file.write_all(page.html.as_bytes())
            .map_err(|source| ExportError::IoError { path, source })?;
    }
    log::info!("Wrote {} pages to {}", pages.len(), output_dir.display());
    Ok(())
}

/// `href`/`src` attributes holding a `model_ptr:` URL
static MODEL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(href|src)=(['"])model_ptr:([0-9a-f]*)(['"])"#).expect("valid link pattern")
});

/// Replace `model_ptr:` links and image sources with file links and data URLs
fn rewrite_links(
    doc: &Document,
    html: &str,
    files: &HashMap<NodeId, String>,
    options: &ExportOptions,
) -> String {
    MODEL_LINK_RE
        .replace_all(html, |caps: &Captures| {
            let attr = &caps[1];
            let quote = &caps[2];
            let token = &caps[3];
            let value = if attr == "src" {
                image_source(doc, token, options)
            } else {
                page_link(doc, token, files)
            };
            format!("{}={}{}{}", attr, quote, value, quote)
        })
        .into_owned()
}

fn page_link(doc: &Document, token: &str, files: &HashMap<NodeId, String>) -> String {
    let Some(node) = link_codec::decode(doc, token) else {
        log::warn!("Dropping link to unknown node {}", token);
        return "#".to_string();
    };
    let page = content_view::pagination::one_page_parent(doc, node);
    match files.get(&page) {
        Some(file) if page == node => file.clone(),
        Some(file) => format!("{}#{}", file, token),
        None => "#".to_string(),
    }
}

fn image_source(doc: &Document, token: &str, options: &ExportOptions) -> String {
    let url = format!("{}{}", MODEL_SCHEME, token);
    match content_view::load_resource(doc, &url) {
        Some(image) if options.embed_images => {
            format!("data:{};base64,{}", image.mime_type, STANDARD.encode(&image.data))
        }
        Some(image) => image.path.display().to_string(),
        None => String::new(),
    }
}

/// Wrap a page body with the HTML header and stylesheet
fn wrap_page(title: &str, body: &str, options: &ExportOptions) -> String {
    let mut output = String::new();
    output.push_str("<!DOCTYPE html>\n");
    output.push_str("<html>\n");
    output.push_str("<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str(&format!(
        "<title>{}</title>\n",
        content_view::normalize::escape_html(title)
    ));
    output.push_str("<style>\n");
    output.push_str(options.stylesheet.as_deref().unwrap_or(CSS_STYLES));
    output.push_str("</style>\n");
    output.push_str("</head>\n");
    output.push_str("<body>\n");
    output.push_str("<div class=\"container\">\n");
    output.push_str(body);
    output.push_str("</div>\n");
    output.push_str("</body>\n");
    output.push_str("</html>\n");
    output
}

const CSS_STYLES: &str = r#"
body {
    font-family: 'PT Sans', 'Segoe UI', 'Roboto', 'Helvetica Neue', sans-serif;
    line-height: 1.5;
    color: #333;
    background-color: #f5f5f5;
    padding: 20px;
}

.container {
    max-width: 900px;
    margin: 0 auto;
    background: white;
    padding: 40px;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
    border-radius: 4px;
}

h1.title {
    font-size: 2em;
    color: #1a1a1a;
}

h1.subtitle {
    font-size: 1.3em;
    color: #555;
    font-weight: 500;
}

pre, font[face='monospace'] {
    font-family: 'Monaco', 'Menlo', 'Ubuntu Mono', 'Consolas', monospace;
}

kbd {
    background-color: lightgray;
    border-radius: 3px;
    padding: 1px 4px;
}

a {
    color: #0066cc;
    text-decoration: none;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docbook_model::{xml_loader, IndexKind, NodeKind};

    const BOOK: &str = r#"<book xml:id="b">
  <title>Guide</title>
  <chapter xml:id="c1"><title>One</title><para>See <xref linkend="s2"/>.</para></chapter>
  <chapter xml:id="c2">
    <title>Two</title>
    <section xml:id="s2"><title>Target</title></section>
    <example><title>Ex</title><programlisting role="kumir">алг</programlisting></example>
    <para><inlinemediaobject><imageobject><imagedata fileref="dot.png"/></imageobject></inlinemediaobject></para>
  </chapter>
</book>"#;

    fn load(dir: &Path) -> Document {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join("book.xml");
        fs::write(&path, BOOK).unwrap();
        fs::write(dir.join("dot.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let mut doc = Document::new();
        let book = xml_loader::load_file(&mut doc, &path).unwrap();
        doc.build_index_page(book, IndexKind::Examples);
        doc
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("kumdoc-export-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_collect_pages() {
        let dir = temp_dir("pages");
        let doc = load(&dir);
        let kinds: Vec<_> = collect_pages(&doc).iter().map(|&p| doc.kind(p)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Book,
                NodeKind::Chapter,
                NodeKind::Chapter,
                NodeKind::ListOfExamples
            ]
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_links_point_to_page_files() {
        let dir = temp_dir("links");
        let doc = load(&dir);
        let highlighter = SourceHighlighter::default();
        let pages = render_site(&doc, &highlighter, &ExportOptions::default()).unwrap();

        let names: Vec<_> = pages.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["index.html", "page-1.html", "page-2.html", "page-3.html"]);

        // Book TOC links chapters by file
        assert!(pages[0].html.contains("href=\"page-1.html\""));
        assert!(pages[0].html.contains("<title>Guide</title>"));
        // Cross-page xref goes to the chapter file and the section anchor
        let target = link_codec::encode(&doc, doc.find_by_id_anywhere("s2").unwrap());
        assert!(pages[1]
            .html
            .contains(&format!("href=\"page-2.html#{}\"", target)));
        for page in &pages {
            assert!(!page.html.contains(MODEL_SCHEME));
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_images_are_embedded() {
        let dir = temp_dir("images");
        let doc = load(&dir);
        let highlighter = SourceHighlighter::default();

        let pages = render_site(&doc, &highlighter, &ExportOptions::default()).unwrap();
        let encoded = STANDARD.encode([0x89, b'P', b'N', b'G']);
        assert!(pages[2]
            .html
            .contains(&format!("src='data:image/png;base64,{}'", encoded)));

        let linked = ExportOptions {
            embed_images: false,
            stylesheet: Some("body {}".to_string()),
        };
        let pages = render_site(&doc, &highlighter, &linked).unwrap();
        let path = dir.join("dot.png");
        assert!(pages[2]
            .html
            .contains(&format!("src='{}'", path.display())));
        assert!(pages[2].html.contains("<style>\nbody {}</style>"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_site() {
        let dir = temp_dir("write");
        let doc = load(&dir);
        let highlighter = SourceHighlighter::default();
        let pages = render_site(&doc, &highlighter, &ExportOptions::default()).unwrap();

        let out = dir.join("site");
        write_site(&pages, &out).unwrap();
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.starts_with("<!DOCTYPE html>"));
        assert!(out.join("page-3.html").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        let highlighter = SourceHighlighter::default();
        assert!(matches!(
            render_site(&doc, &highlighter, &ExportOptions::default()),
            Err(ExportError::NothingToExport)
        ));
    }
}
