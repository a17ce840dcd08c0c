//! Core data structures for the fact base

use std::fmt;

use serde::{Deserialize, Serialize};

/// Method names treated as constructor hooks (initializer and allocator).
pub const CONSTRUCTOR_NAMES: [&str; 2] = ["__init__", "__new__"];

/// Opaque, stable identifier for an entity (a BLOB in the fact store).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Vec<u8>);

impl EntityId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        EntityId(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        EntityId(value.to_be_bytes().to_vec())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Identifier of a content blob; entities sharing one belong to the same physical unit.
pub type ContentId = EntityId;

/// Discriminates what kind of code entity a row represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    File,
    Class,
    Method,
    Function,
    Field,
    /// Any kind the upstream engine emits that the core has no special rules for.
    Other(String),
}

impl EntityKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::File => "File",
            EntityKind::Class => "Class",
            EntityKind::Method => "Method",
            EntityKind::Function => "Function",
            EntityKind::Field => "Field",
            EntityKind::Other(s) => s,
        }
    }

    /// Method or Function: the kinds that can originate calls, creations and uses.
    pub fn is_callable(&self) -> bool {
        matches!(self, EntityKind::Method | EntityKind::Function)
    }
}

impl From<&str> for EntityKind {
    fn from(s: &str) -> Self {
        match s {
            "File" => EntityKind::File,
            "Class" => EntityKind::Class,
            "Method" => EntityKind::Method,
            "Function" => EntityKind::Function,
            "Field" => EntityKind::Field,
            other => EntityKind::Other(other.to_string()),
        }
    }
}

impl From<String> for EntityKind {
    fn from(s: String) -> Self {
        EntityKind::from(s.as_str())
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of relationship a dependency edge represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DepKind {
    Import,
    Extend,
    Create,
    Call,
    Use,
    /// Raw kinds outside the comparable core set (Implement, Parameter, Return, ...).
    Other(String),
}

impl DepKind {
    pub fn as_str(&self) -> &str {
        match self {
            DepKind::Import => "Import",
            DepKind::Extend => "Extend",
            DepKind::Create => "Create",
            DepKind::Call => "Call",
            DepKind::Use => "Use",
            DepKind::Other(s) => s,
        }
    }

    pub fn is_core(&self) -> bool {
        !matches!(self, DepKind::Other(_))
    }
}

impl From<&str> for DepKind {
    fn from(s: &str) -> Self {
        match s {
            "Import" => DepKind::Import,
            "Extend" => DepKind::Extend,
            "Create" => DepKind::Create,
            "Call" => DepKind::Call,
            "Use" => DepKind::Use,
            other => DepKind::Other(other.to_string()),
        }
    }
}

impl From<String> for DepKind {
    fn from(s: String) -> Self {
        DepKind::from(s.as_str())
    }
}

impl From<DepKind> for String {
    fn from(kind: DepKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub byte: u32,
    pub row: u32,
    pub column: u32,
}

/// Source range of a definition or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: Position,
    pub end: Position,
}

impl SourceSpan {
    /// Span covering whole rows, with zeroed byte and column offsets.
    pub fn rows_between(start_row: u32, end_row: u32) -> Self {
        SourceSpan {
            start: Position { row: start_row, ..Position::default() },
            end: Position { row: end_row, ..Position::default() },
        }
    }

    /// Number of rows the span touches, inclusive of both ends.
    pub fn rows(&self) -> u32 {
        self.end.row.saturating_sub(self.start.row) + 1
    }
}

/// A named code unit extracted by the upstream engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub parent_id: Option<EntityId>,
    pub kind: EntityKind,
    pub name: String,
    pub content_id: ContentId,
    pub span: SourceSpan,
    pub comment: Option<SourceSpan>,
}

impl Entity {
    /// A Method named after one of the construction hooks.
    pub fn is_constructor(&self) -> bool {
        self.kind == EntityKind::Method && CONSTRUCTOR_NAMES.contains(&self.name.as_str())
    }
}

/// One raw dependency edge. Identical edges may repeat, one per call/use site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dep {
    pub src: EntityId,
    pub tgt: EntityId,
    pub kind: DepKind,
    pub row: u32,
    pub commit_id: Option<Vec<u8>>,
}

impl Dep {
    pub fn new(src: EntityId, tgt: EntityId, kind: DepKind, row: u32) -> Self {
        Dep { src, tgt, kind, row, commit_id: None }
    }
}
