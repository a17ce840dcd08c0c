//! Deterministic ordering of matrix variables

use serde::Serialize;

/// Rank given to entity kinds a scheme has no leaf label for.
pub const OTHER_RANK: u8 = 8;

const EXTERNAL_GROUP: u8 = 9;
const EXTERNAL_RANK: u8 = 9;

/// Package files (paths with a directory) sort before top-level files.
pub fn file_group(path: &str) -> u8 {
    if path.contains('/') { 0 } else { 1 }
}

/// `(file-group, file-path, type-rank, owner-chain, leaf)` with the full
/// name as the final tie-break, so the order is total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SortKey {
    pub group: u8,
    pub file: String,
    pub rank: u8,
    pub owner: String,
    pub leaf: String,
    pub name: String,
}

impl SortKey {
    pub fn new(file: &str, rank: u8, owner: impl Into<String>, leaf: impl Into<String>, name: &str) -> Self {
        Self {
            group: file_group(file),
            file: file.to_string(),
            rank,
            owner: owner.into(),
            leaf: leaf.into(),
            name: name.to_string(),
        }
    }

    /// External nodes sort after everything in focus, by name.
    pub fn external(name: &str) -> Self {
        Self {
            group: EXTERNAL_GROUP,
            file: name.to_string(),
            rank: EXTERNAL_RANK,
            owner: String::new(),
            leaf: name.to_string(),
            name: name.to_string(),
        }
    }
}
