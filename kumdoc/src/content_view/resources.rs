//! Loading of `model_ptr:` image resources

use crate::docbook_model::{Document, NodeKind};
use crate::link_codec;
use std::fs;
use std::path::PathBuf;

/// Image referenced by an ImageData node
#[derive(Debug, Clone)]
pub struct ImageResource {
    /// Resolved file path
    pub path: PathBuf,
    /// MIME type derived from the declared format
    pub mime_type: &'static str,
    /// Raw file contents
    pub data: Vec<u8>,
}

/// MIME type for a DocBook image format
pub fn mime_type_for(format: &str) -> &'static str {
    match format {
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Resolve an image source URL to its file contents
///
/// # Returns
/// * `Some(ImageResource)` - The URL names a live ImageData node whose file is readable
/// * `None` - Any other URL, an unresolved token or an unreadable file
pub fn load_resource(doc: &Document, url: &str) -> Option<ImageResource> {
    let node = link_codec::parse_href(doc, url)?;
    let data = doc.node(node);
    if data.kind != NodeKind::ImageData || data.fileref.is_empty() {
        return None;
    }

    let path = match doc.source_dir(node) {
        Some(dir) => dir.join(&data.fileref),
        None => PathBuf::from(&data.fileref),
    };
    match fs::read(&path) {
        Ok(bytes) => Some(ImageResource {
            path,
            mime_type: mime_type_for(&data.format),
            data: bytes,
        }),
        Err(e) => {
            log::warn!("Failed to read image {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for("png"), "image/png");
        assert_eq!(mime_type_for("svg"), "image/svg+xml");
        assert_eq!(mime_type_for("bmp"), "application/octet-stream");
    }

    #[test]
    fn test_load_resource_reads_image_file() {
        let dir = std::env::temp_dir().join(format!("kumdoc-resources-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("pixel.png"), b"\x89PNG").unwrap();

        let mut doc = Document::new();
        let book = doc.add_root(NodeKind::Book);
        doc.set_source_dir(book, dir.clone());
        let image = doc.append_child(book, NodeKind::ImageData);
        doc.node_mut(image).fileref = "pixel.png".to_string();
        doc.node_mut(image).format = "png".to_string();

        let resource = load_resource(&doc, &link_codec::href(&doc, image)).unwrap();
        assert_eq!(resource.mime_type, "image/png");
        assert_eq!(resource.data, b"\x89PNG");
        assert_eq!(resource.path, dir.join("pixel.png"));

        let missing = doc.append_child(book, NodeKind::ImageData);
        doc.node_mut(missing).fileref = "absent.png".to_string();
        assert!(load_resource(&doc, &link_codec::href(&doc, missing)).is_none());
        assert!(load_resource(&doc, &link_codec::href(&doc, book)).is_none());
        assert!(load_resource(&doc, "file:///etc/passwd").is_none());

        fs::remove_dir_all(&dir).ok();
    }
}
