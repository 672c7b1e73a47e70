//! Document build pipeline
//!
//! This module orchestrates the stages of a site build:
//! 1. **Discovery**: find DocBook XML sources under the input path
//! 2. **Loading**: parse every source into one document and add index pages
//! 3. **Export**: render every page and write the HTML files

use crate::docbook_model::{xml_loader, Document, IndexKind, NodeId, XmlLoadError};
use crate::html_exporter::{self, ExportError, ExportOptions};
use crate::source_highlighter::SourceHighlighter;
use crate::viewer_config::{RenderConfig, ViewerConfig, ViewerConfigError, CONFIG_FILE_NAME};
use itertools::Itertools;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Documents loaded from a source tree
#[derive(Debug)]
pub struct Library {
    /// All loaded trees and their index pages
    pub doc: Document,
    /// Root node of each loaded source file
    pub books: Vec<NodeId>,
    /// Synthesized index pages
    pub index_pages: Vec<NodeId>,
}

/// Outcome of a site build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub sources: usize,
    pub pages: usize,
    pub output_dir: PathBuf,
}

/// Stage 1: find DocBook sources
///
/// # Parameters
/// * `input` - A single XML file or a directory searched recursively
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - Sorted list of `.xml` files
/// * `Err(PipelineError)` - Nothing to load
pub fn discover_sources(input: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let sources: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .map(|e| e.path().to_path_buf())
        .sorted()
        .collect();

    if sources.is_empty() {
        return Err(PipelineError::NoSources(input.to_path_buf()));
    }
    Ok(sources)
}

/// Stage 2: load sources into one document
///
/// # Parameters
/// * `sources` - Files from [`discover_sources`]
/// * `config` - Decides whether index pages are added for each book
///
/// # Returns
/// * `Ok(Library)` - The loaded document
/// * `Err(PipelineError)` - A source could not be read or parsed
pub fn load_library(sources: &[PathBuf], config: &RenderConfig) -> Result<Library, PipelineError> {
    let mut doc = Document::new();
    let mut books = Vec::with_capacity(sources.len());
    for path in sources {
        let root = xml_loader::load_file(&mut doc, path)?;
        books.push(root);
    }

    let mut index_pages = Vec::new();
    if config.index_pages {
        for &book in &books {
            for kind in [IndexKind::Examples, IndexKind::Tables] {
                index_pages.extend(doc.build_index_page(book, kind));
            }
        }
    }

    Ok(Library {
        doc,
        books,
        index_pages,
    })
}

/// Directory holding the configuration for `input`
fn config_dir(input: &Path) -> &Path {
    if input.is_file() {
        input.parent().unwrap_or_else(|| Path::new("."))
    } else {
        input
    }
}

/// Load the configuration file given explicitly or found next to `input`
pub fn load_config(input: &Path, explicit: Option<&Path>) -> Result<ViewerConfig, PipelineError> {
    match explicit {
        Some(path) => ViewerConfig::load(path)
            .map_err(|e| PipelineError::ConfigError(path.to_path_buf(), Box::new(e))),
        None => {
            let dir = config_dir(input);
            ViewerConfig::load_or_default(dir)
                .map_err(|e| PipelineError::ConfigError(dir.join(CONFIG_FILE_NAME), Box::new(e)))
        }
    }
}

/// Export options derived from the `[render]` section
///
/// The stylesheet path is resolved against `base_dir`.
pub fn export_options(config: &RenderConfig, base_dir: &Path) -> Result<ExportOptions, PipelineError> {
    let stylesheet = match &config.stylesheet {
        Some(file) => {
            let path = base_dir.join(file);
            let css = std::fs::read_to_string(&path)
                .map_err(|e| PipelineError::StylesheetError(path.clone(), e))?;
            Some(css)
        }
        None => None,
    };
    Ok(ExportOptions {
        embed_images: config.embed_images,
        stylesheet,
    })
}

/// Run all stages: discover, load, render and write
pub fn build_site(
    input: &Path,
    output_dir: &Path,
    config: &ViewerConfig,
    highlighter: &SourceHighlighter,
) -> Result<BuildSummary, PipelineError> {
    let sources = discover_sources(input)?;
    log::info!("Discovered {} sources", sources.len());

    let library = load_library(&sources, &config.render)?;
    log::info!(
        "Loaded {} books with {} index pages",
        library.books.len(),
        library.index_pages.len()
    );

    let options = export_options(&config.render, config_dir(input))?;
    let pages = html_exporter::render_site(&library.doc, highlighter, &options)?;
    html_exporter::write_site(&pages, output_dir)?;

    Ok(BuildSummary {
        sources: sources.len(),
        pages: pages.len(),
        output_dir: output_dir.to_path_buf(),
    })
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No DocBook sources found in {path}", path = .0.display())]
    NoSources(PathBuf),

    #[error("Load error: {0}")]
    LoadError(#[from] XmlLoadError),

    #[error("Config error loading {path}: {source}", path = .0.display(), source = .1)]
    ConfigError(PathBuf, #[source] Box<ViewerConfigError>),

    #[error("Cannot read stylesheet {path}: {source}", path = .0.display(), source = .1)]
    StylesheetError(PathBuf, #[source] std::io::Error),

    #[error("Export error: {0}")]
    ExportError(#[from] ExportError),
}
