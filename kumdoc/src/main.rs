//! kumdoc - DocBook help viewer for the Kumir programming environment
//!
//! Renders DocBook books to paginated HTML with numbered examples and
//! tables, cross-references and highlighted program listings, and provides
//! the command channel between the IDE and the runtime process.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(missing_docs))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::enum_variant_names)]
#![allow(dead_code)]

mod cli;
mod viewer_config;

// Document model and rendering
mod content_view;
mod docbook_model;
mod link_codec;
mod source_highlighter;

// Site export
mod html_exporter;
mod pipeline;

// IDE/runtime channel
mod connector;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use content_view::ContentView;
use docbook_model::{Document, NodeId, NodeKind};
use source_highlighter::SourceHighlighter;
use std::path::{Path, PathBuf};

/// Main entry point for the kumdoc CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let highlighter = SourceHighlighter::default();

    match cli.command {
        Commands::Build {
            input,
            output,
            config,
            no_images,
            no_index,
        } => {
            handle_build_command(
                &input,
                &output,
                config.as_deref(),
                no_images,
                no_index,
                &highlighter,
            )?;
        }

        Commands::Show {
            input,
            target,
            output,
        } => {
            handle_show_command(&input, target.as_deref(), output, &highlighter)?;
        }

        Commands::Toc { input } => {
            handle_toc_command(&input)?;
        }

        Commands::Highlight { input, lang } => {
            handle_highlight_command(&input, &lang, &highlighter)?;
        }

        Commands::Languages => {
            for language in highlighter.languages() {
                println!("{}", language);
            }
        }
    }

    Ok(())
}

/// Handle the build command
fn handle_build_command(
    input: &Path,
    output: &Path,
    config_path: Option<&Path>,
    no_images: bool,
    no_index: bool,
    highlighter: &SourceHighlighter,
) -> Result<()> {
    let mut config = pipeline::load_config(input, config_path)
        .with_context(|| format!("Failed to load configuration for {}", input.display()))?;
    if no_images {
        config.render.embed_images = false;
    }
    if no_index {
        config.render.index_pages = false;
    }

    println!("Building help pages...");
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());

    let summary = pipeline::build_site(input, output, &config, highlighter)
        .with_context(|| format!("Failed to build site from {}", input.display()))?;

    println!(
        "✓ Rendered {} pages from {} sources into {}",
        summary.pages,
        summary.sources,
        summary.output_dir.display()
    );
    Ok(())
}

/// Load one file together with its index pages
fn load_single(input: &Path) -> Result<(Document, NodeId)> {
    let config = pipeline::load_config(input, None)
        .with_context(|| format!("Failed to load configuration for {}", input.display()))?;
    let sources = vec![input.to_path_buf()];
    let library = pipeline::load_library(&sources, &config.render)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let root = library
        .books
        .first()
        .copied()
        .with_context(|| format!("{} has no document root", input.display()))?;
    Ok((library.doc, root))
}

/// Handle the show command
fn handle_show_command(
    input: &Path,
    target: Option<&str>,
    output: Option<PathBuf>,
    highlighter: &SourceHighlighter,
) -> Result<()> {
    let (doc, root) = load_single(input)?;
    let node = match target {
        Some(id) => doc
            .find_by_id_anywhere(id)
            .with_context(|| format!("No element with id '{}' in {}", id, input.display()))?,
        None => root,
    };

    let mut view = ContentView::new(&doc, highlighter);
    let navigation = view.render_data(node);
    let html = navigation.html.unwrap_or_default();
    log::info!(
        "Showing page '{}' at anchor {}",
        doc.node(navigation.page).title,
        navigation.anchor
    );

    match output {
        Some(path) => {
            std::fs::write(&path, html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Wrote {} (anchor #{})", path.display(), navigation.anchor);
        }
        None => println!("{}", html),
    }
    Ok(())
}

/// Handle the toc command
fn handle_toc_command(input: &Path) -> Result<()> {
    let (doc, root) = load_single(input)?;
    print_toc_entry(&doc, root, 0);
    for &page in &doc.roots()[1..] {
        print_toc_entry(&doc, page, 0);
    }
    Ok(())
}

/// Print a sectioning node, its numbered examples and tables, and its subsections
fn print_toc_entry(doc: &Document, node: NodeId, depth: usize) {
    let data = doc.node(node);
    let indent = "  ".repeat(depth);
    match data.kind {
        NodeKind::Example => println!(
            "{}Example {}. {}",
            indent,
            content_view::numbering::display_number(doc, node),
            data.title
        ),
        NodeKind::Table => println!(
            "{}Table {}. {}",
            indent,
            content_view::numbering::display_number(doc, node),
            data.title
        ),
        NodeKind::ListOfExamples => println!("{}List of examples", indent),
        NodeKind::ListOfTables => println!("{}List of tables", indent),
        _ => println!("{}{}", indent, data.title),
    }
    if matches!(data.kind, NodeKind::ListOfExamples | NodeKind::ListOfTables) {
        return;
    }

    for &child in doc.children(node) {
        let kind = doc.kind(child);
        if kind.is_sectioning() {
            print_toc_entry(doc, child, depth + 1);
        } else {
            for numbered in std::iter::once(child).chain(doc.descendants(child)) {
                if matches!(doc.kind(numbered), NodeKind::Example | NodeKind::Table) {
                    print_toc_entry(doc, numbered, depth + 1);
                }
            }
        }
    }
}

/// Handle the highlight command
fn handle_highlight_command(
    input: &Path,
    lang: &str,
    highlighter: &SourceHighlighter,
) -> Result<()> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    if !highlighter.languages().any(|l| l.eq_ignore_ascii_case(lang)) {
        log::warn!("Unknown language '{}', printing the source unchanged", lang);
    }
    println!("{}", highlighter.highlight(&source, lang));
    Ok(())
}
