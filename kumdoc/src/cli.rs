//! Command-line interface definitions for kumdoc

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the kumdoc application
#[derive(Parser)]
#[command(name = "kumdoc")]
#[command(version)]
#[command(about = "DocBook help viewer and renderer for the Kumir environment", long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for kumdoc
#[derive(Subcommand)]
pub enum Commands {
    /// Render DocBook sources to a static HTML site
    Build {
        /// Input file or directory (defaults to current directory)
        #[arg(value_name = "PATH", default_value = ".")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "html")]
        output: PathBuf,

        /// Configuration file (defaults to kumdoc.toml next to the sources)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Link images instead of embedding them
        #[arg(long)]
        no_images: bool,

        /// Skip the list of examples and list of tables pages
        #[arg(long)]
        no_index: bool,
    },

    /// Render the page showing one element
    Show {
        /// DocBook XML file
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Element id (xml:id) to navigate to; defaults to the document root
        #[arg(short, long)]
        target: Option<String>,

        /// Write the page to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the table of contents with example and table numbers
    Toc {
        /// DocBook XML file
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },

    /// Highlight a program file as HTML
    Highlight {
        /// Source file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Language profile (see `kumdoc languages`)
        #[arg(short, long, default_value = "kumir")]
        lang: String,
    },

    /// List available highlighting languages
    Languages,
}
