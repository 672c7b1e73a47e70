//! Error types for DocBook loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a DocBook XML file
#[derive(Error, Debug)]
pub enum XmlLoadError {
    /// The source file could not be read
    #[error("Failed to read {path}: {source}", path = .path.display())]
    IoError {
        /// Path of the file
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The XML is not well formed
    #[error("XML error at byte {position}: {source}")]
    XmlError {
        /// Byte offset where the reader stopped
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// No supported DocBook element was found
    #[error("No DocBook root element (book, set, article or chapter) found")]
    NoRootElement,
}
