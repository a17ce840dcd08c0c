//! Canonical display names under the structured, flat and legacy schemes
//!
//! All three schemes share one resolver. They differ only in a [`Layout`]:
//! the leaf labels, the rank table used for ordering and the rule that joins
//! a class folder with its members.

mod folders;
mod sort;

pub use folders::{segments_from_chain, ClassFolders, INNER_CLASSES, SUBCLASSES};
pub use sort::{file_group, SortKey, OTHER_RANK};

use crate::error::ExportError;
use archdsm_core::{Entity, EntityId, EntityKind, FactGraph, FileIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// `<file>/<Class>/methods/<m> (Method)`, classes nested by folder path
    #[default]
    #[serde(alias = "professor")]
    Structured,
    /// `<file>/+METHODS/<Outer.Inner>/<m> (Method)`
    Flat,
    /// `<file>/CLASSES/<Outer.Inner>/METHODS/<m> (Method)`
    #[serde(alias = "handcount")]
    Legacy,
}

impl NamingScheme {
    pub const ALL: [NamingScheme; 3] = [NamingScheme::Structured, NamingScheme::Flat, NamingScheme::Legacy];

    pub fn as_str(&self) -> &'static str {
        match self {
            NamingScheme::Structured => "structured",
            NamingScheme::Flat => "flat",
            NamingScheme::Legacy => "legacy",
        }
    }

    fn layout(&self) -> &'static Layout {
        match self {
            NamingScheme::Structured => &STRUCTURED,
            NamingScheme::Flat => &FLAT,
            NamingScheme::Legacy => &LEGACY,
        }
    }
}

impl FromStr for NamingScheme {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structured" | "professor" => Ok(NamingScheme::Structured),
            "flat" => Ok(NamingScheme::Flat),
            "legacy" | "handcount" => Ok(NamingScheme::Legacy),
            _ => Err(ExportError::UnknownScheme(s.to_string())),
        }
    }
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FolderJoin {
    /// `<file>/<folder path>/<label>/<member>`; the class is `<folder path>/self`.
    Nested,
    /// `<file>/<label>/<dotted class>/<member>`; the class is `-self <dotted class>`.
    Grouped,
    /// `<file>/CLASSES/<dotted class>/<label>/<member>`.
    Prefixed,
}

struct Ranks {
    file: u8,
    function: u8,
    class: u8,
    constructor: u8,
    method: u8,
    field: u8,
}

struct Layout {
    file_leaf: &'static str,
    functions: &'static str,
    constructors: &'static str,
    methods: &'static str,
    fields: &'static str,
    join: FolderJoin,
    ranks: Ranks,
}

static STRUCTURED: Layout = Layout {
    file_leaf: "self (File)",
    functions: "functions",
    constructors: "constructors",
    methods: "methods",
    fields: "fields",
    join: FolderJoin::Nested,
    ranks: Ranks { file: 0, function: 1, class: 2, constructor: 3, method: 4, field: 5 },
};

static FLAT: Layout = Layout {
    file_leaf: "self (File)",
    functions: "+FUNCTIONS",
    constructors: "+CONSTRUCTORS",
    methods: "+METHODS",
    fields: "+FIELDS",
    join: FolderJoin::Grouped,
    ranks: Ranks { file: 0, class: 1, constructor: 2, field: 3, method: 4, function: 5 },
};

static LEGACY: Layout = Layout {
    file_leaf: "module (Module)",
    functions: "FUNCTIONS",
    constructors: "CONSTRUCTORS",
    methods: "METHODS",
    fields: "FIELDS",
    join: FolderJoin::Prefixed,
    ranks: Ranks { file: 0, function: 1, class: 2, constructor: 3, method: 4, field: 5 },
};

const FLAT_SUBCLASSES: &str = "+SUBCLASSES";
const LEGACY_CLASSES: &str = "CLASSES";

/// A matrix variable: its name and the key it is ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub name: String,
    pub key: SortKey,
}

impl Node {
    /// A node outside the focus, e.g. `(External Class) Base`.
    pub fn external(kind: &EntityKind, display: &str) -> Self {
        let name = format!("(External {}) {}", kind, display);
        Node { key: SortKey::external(&name), name }
    }

    /// A node ordered only by its name, for slices that keep short names.
    pub fn plain(name: impl Into<String>) -> Self {
        let name = name.into();
        Node { key: SortKey::new("", OTHER_RANK, "", name.clone(), &name), name }
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// `Class.member` for members with a Class ancestor, the bare name otherwise.
pub fn display_name(graph: &FactGraph, id: &EntityId) -> Option<String> {
    let entity = graph.entity(id)?;
    if matches!(entity.kind, EntityKind::Method | EntityKind::Function | EntityKind::Field) {
        if let Some(owner) = graph.owner_class(id) {
            return Some(format!("{}.{}", owner.name, entity.name));
        }
    }
    Some(entity.name.clone())
}

/// Maps entity ids to canonical names under one scheme.
///
/// Resolution is a pure function of the graph, the file index and the class
/// folders; nothing depends on edge or iteration order.
pub struct NameResolver<'a> {
    graph: &'a FactGraph,
    files: &'a FileIndex,
    scheme: NamingScheme,
    folders: ClassFolders,
}

impl<'a> NameResolver<'a> {
    pub fn new(graph: &'a FactGraph, files: &'a FileIndex, scheme: NamingScheme, folders: ClassFolders) -> Self {
        Self { graph, files, scheme, folders }
    }

    pub fn scheme(&self) -> NamingScheme {
        self.scheme
    }

    pub fn folders(&self) -> &ClassFolders {
        &self.folders
    }

    /// The node standing for a whole file.
    pub fn file_node(&self, file: &str) -> Node {
        let layout = self.scheme.layout();
        let name = format!("{}/{}", file, layout.file_leaf);
        let leaf = layout.file_leaf.split(" (").next().unwrap_or(layout.file_leaf);
        Node { key: SortKey::new(file, layout.ranks.file, "", leaf, &name), name }
    }

    /// Folder path of a class: the memoized one when the class is in focus,
    /// its lexical chain otherwise.
    pub fn class_folder(&self, class: &EntityId) -> Vec<String> {
        match self.folders.path(class) {
            Some(path) => path.to_vec(),
            None => segments_from_chain(&self.graph.class_chain(class)),
        }
    }

    fn dotted(&self, class: &Entity) -> String {
        let chain = self.graph.class_chain(&class.id);
        if chain.is_empty() { class.name.clone() } else { chain.join(".") }
    }

    /// Canonical name of an entity, or `None` when the scheme cannot name it
    /// (no owning File, or a Field with no Class ancestor).
    pub fn resolve(&self, id: &EntityId) -> Option<Node> {
        let entity = self.graph.entity(id)?;
        let file = self.files.file_name(id)?;
        let layout = self.scheme.layout();
        let ranks = &layout.ranks;

        match &entity.kind {
            EntityKind::File => Some(self.file_node(file)),
            EntityKind::Class => Some(self.class_node(file, entity)),
            EntityKind::Field => {
                let owner = self.graph.owner_class(id)?;
                Some(self.member(file, owner, layout.fields, &entity.name, "Field", ranks.field))
            }
            EntityKind::Method => match self.graph.owner_class(id) {
                None => Some(self.function(file, &entity.name)),
                Some(owner) if entity.is_constructor() => Some(self.member(
                    file,
                    owner,
                    layout.constructors,
                    &entity.name,
                    "Constructor",
                    ranks.constructor,
                )),
                Some(owner) => Some(self.member(file, owner, layout.methods, &entity.name, "Method", ranks.method)),
            },
            EntityKind::Function => match self.graph.owner_class(id) {
                Some(owner) if layout.join == FolderJoin::Prefixed => Some(self.member(
                    file,
                    owner,
                    layout.functions,
                    &entity.name,
                    "Function",
                    ranks.function,
                )),
                _ => Some(self.function(file, &entity.name)),
            },
            EntityKind::Other(_) => {
                let display = display_name(self.graph, id)?;
                let name = format!("{}::{}", file, display);
                Some(Node { key: SortKey::new(file, OTHER_RANK, "", display, &name), name })
            }
        }
    }

    /// `(External <kind>) <display>` for an entity outside the focus.
    pub fn external(&self, id: &EntityId) -> Option<Node> {
        let entity = self.graph.entity(id)?;
        let display = display_name(self.graph, id)?;
        Some(Node::external(&entity.kind, &display))
    }

    fn function(&self, file: &str, name: &str) -> Node {
        let layout = self.scheme.layout();
        let full = format!("{}/{}/{} (Function)", file, layout.functions, name);
        Node { key: SortKey::new(file, layout.ranks.function, "", name, &full), name: full }
    }

    fn class_node(&self, file: &str, class: &Entity) -> Node {
        let layout = self.scheme.layout();
        let rank = layout.ranks.class;
        match layout.join {
            FolderJoin::Nested => {
                let path = self.class_folder(&class.id).join("/");
                let name = format!("{}/{}/self (Class)", file, path);
                Node { key: SortKey::new(file, rank, path, "self", &name), name }
            }
            FolderJoin::Grouped => {
                let dotted = self.dotted(class);
                let leaf = format!("-self {}", dotted);
                let base = self
                    .folders
                    .local_base(&class.id)
                    .and_then(|base| self.graph.entity(base))
                    .map(|base| self.dotted(base));
                let owner = match base {
                    Some(base) => format!("{}/{}", FLAT_SUBCLASSES, base),
                    None => String::new(),
                };
                let name = if owner.is_empty() {
                    format!("{}/{} (Class)", file, leaf)
                } else {
                    format!("{}/{}/{} (Class)", file, owner, leaf)
                };
                Node { key: SortKey::new(file, rank, owner, leaf, &name), name }
            }
            FolderJoin::Prefixed => {
                let dotted = self.dotted(class);
                let name = format!("{}/{}/{} (Class)", file, LEGACY_CLASSES, dotted);
                Node { key: SortKey::new(file, rank, dotted.clone(), dotted, &name), name }
            }
        }
    }

    /// The owner component of the key is everything between the file and the
    /// leaf, member label included, so nested folders order by full path.
    fn member(&self, file: &str, owner: &Entity, label: &str, leaf: &str, kind: &str, rank: u8) -> Node {
        let layout = self.scheme.layout();
        let (name, owner_key) = match layout.join {
            FolderJoin::Nested => {
                let path = format!("{}/{}", self.class_folder(&owner.id).join("/"), label);
                (format!("{}/{}/{} ({})", file, path, leaf, kind), path)
            }
            FolderJoin::Grouped => {
                let path = format!("{}/{}", label, self.dotted(owner));
                (format!("{}/{}/{} ({})", file, path, leaf, kind), path)
            }
            FolderJoin::Prefixed => {
                let dotted = self.dotted(owner);
                (format!("{}/{}/{}/{}/{} ({})", file, LEGACY_CLASSES, dotted, label, leaf, kind), dotted)
            }
        };
        Node { key: SortKey::new(file, rank, owner_key, leaf, &name), name }
    }
}
