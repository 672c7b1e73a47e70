//! Node types of the DocBook document tree

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of node keys; never reused while the process lives
static NEXT_NODE_KEY: AtomicU64 = AtomicU64::new(1);

/// Index of a node inside its [`Document`](super::Document) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Arena slot of this node
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a DocBook node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Set,
    Book,
    Article,
    Chapter,
    Section,
    Para,
    Text,
    Emphasis,
    ListItem,
    OrderedList,
    ItemizedList,
    Example,
    ProgramListing,
    Code,
    Xref,
    KeyCombo,
    KeySym,
    Table,
    InformalTable,
    THead,
    TBody,
    Row,
    Entry,
    InlineMediaObject,
    ImageObject,
    ImageData,
    ListOfExamples,
    ListOfTables,
}

impl NodeKind {
    /// Map a DocBook element name to a node kind
    ///
    /// # Parameters
    /// * `name` - Local element name (e.g., "programlisting")
    ///
    /// # Returns
    /// * `Some(NodeKind)` - The element is part of the supported vocabulary
    /// * `None` - Unknown element (`title`, `subtitle` and text are handled by the loader)
    pub fn from_element_name(name: &str) -> Option<Self> {
        let kind = match name {
            "set" => NodeKind::Set,
            "book" => NodeKind::Book,
            "article" => NodeKind::Article,
            "chapter" => NodeKind::Chapter,
            "section" | "sect1" | "sect2" | "sect3" | "sect4" | "sect5" => NodeKind::Section,
            "para" | "simpara" => NodeKind::Para,
            "emphasis" => NodeKind::Emphasis,
            "listitem" => NodeKind::ListItem,
            "orderedlist" => NodeKind::OrderedList,
            "itemizedlist" => NodeKind::ItemizedList,
            "example" => NodeKind::Example,
            "programlisting" => NodeKind::ProgramListing,
            "code" => NodeKind::Code,
            "xref" => NodeKind::Xref,
            "keycombo" => NodeKind::KeyCombo,
            "keysym" => NodeKind::KeySym,
            "table" => NodeKind::Table,
            "informaltable" => NodeKind::InformalTable,
            "thead" => NodeKind::THead,
            "tbody" => NodeKind::TBody,
            "row" => NodeKind::Row,
            "entry" => NodeKind::Entry,
            "inlinemediaobject" | "mediaobject" => NodeKind::InlineMediaObject,
            "imageobject" => NodeKind::ImageObject,
            "imagedata" => NodeKind::ImageData,
            _ => return None,
        };
        Some(kind)
    }

    /// Nodes that structure a document into navigable parts
    pub fn is_sectioning(self) -> bool {
        matches!(
            self,
            NodeKind::Set
                | NodeKind::Book
                | NodeKind::Article
                | NodeKind::Chapter
                | NodeKind::Section
                | NodeKind::ListOfExamples
                | NodeKind::ListOfTables
        )
    }

    /// Nodes that always start their own page
    pub fn is_page_kind(self) -> bool {
        matches!(
            self,
            NodeKind::Chapter
                | NodeKind::Article
                | NodeKind::Book
                | NodeKind::ListOfExamples
                | NodeKind::ListOfTables
        )
    }

    /// Chapter, Article or Book: the roots used for numbering and for pagination of direct children
    pub fn is_chapter_like(self) -> bool {
        matches!(self, NodeKind::Chapter | NodeKind::Article | NodeKind::Book)
    }
}

/// A single node of the DocBook tree
///
/// Children are owned by the arena through `children`; `parent`,
/// `index_parent` and `origin` are plain back references.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node kind
    pub kind: NodeKind,
    /// Process-unique key, used for link tokens
    pub key: u64,
    /// Title (from a `<title>` child element)
    pub title: String,
    /// Subtitle (from a `<subtitle>` child element)
    pub subtitle: String,
    /// Character data (Text nodes only)
    pub text: String,
    /// Free-form role attribute (emphasis style, listing language)
    pub role: String,
    /// Cross-reference identifier (`xml:id` or `id`)
    pub id: String,
    /// Section nesting depth, 0 for non-section nodes
    pub section_level: u8,
    /// Target id of an Xref
    pub xref_link_end: String,
    /// Id of the node whose title an Xref displays
    pub xref_end_term: String,
    /// ImageData format ("png", "svg", ...)
    pub format: String,
    /// ImageData file reference, relative to the source file
    pub fileref: String,
    /// Structural parent
    pub parent: Option<NodeId>,
    /// Pagination parent overriding `parent` for page lookup
    pub index_parent: Option<NodeId>,
    /// Node this one was copied from, if it is an index page entry
    pub origin: Option<NodeId>,
    /// Ordered children
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create an empty node of the given kind with a fresh key
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            key: NEXT_NODE_KEY.fetch_add(1, Ordering::Relaxed),
            title: String::new(),
            subtitle: String::new(),
            text: String::new(),
            role: String::new(),
            id: String::new(),
            section_level: 0,
            xref_link_end: String::new(),
            xref_end_term: String::new(),
            format: String::new(),
            fileref: String::new(),
            parent: None,
            index_parent: None,
            origin: None,
            children: Vec::new(),
        }
    }
}
