//! Test fixtures for archdsm-core

use crate::builder::FactGraphBuilder;
use crate::graph::FactGraph;
use crate::model::DepKind;
use std::path::PathBuf;
use tempfile::TempDir;

/// A two-file package with nesting, local inheritance and a duplicate tag.
///
/// ```text
/// pkg/shapes.py            (1)
///   class Shape            (2)  rows 1-20
///     __init__             (3)  rows 2-4
///     area                 (4)  rows 6-8
///     name                 (5)  field, row 3
///     class Meta           (6)  rows 10-12
///   class Square(Shape)    (7)  rows 22-30
///     area                 (8)  rows 23-25
///       helper             (9)  rows 24-24
///   make_square            (10) function, rows 32-34
/// pkg/main.py              (20)
///   run                    (21) function, rows 1-5
/// ```
pub fn sample_graph() -> FactGraph {
    FactGraphBuilder::new()
        .file(1, "pkg/shapes.py")
        .class(2, 1, "Shape", (1, 20))
        .method(3, 2, "__init__", (2, 4))
        .method(4, 2, "area", (6, 8))
        .field(5, 2, "name", (3, 3))
        .class(6, 2, "Meta", (10, 12))
        .class(7, 1, "Square", (22, 30))
        .method(8, 7, "area", (23, 25))
        .function(9, 8, "helper", (24, 24))
        .function(10, 1, "make_square", (32, 34))
        .file(20, "pkg/main.py")
        .function(21, 20, "run", (1, 5))
        .dep(7, 2, DepKind::Extend, 22)
        .dep(3, 5, DepKind::Use, 3)
        .dep(8, 4, DepKind::Call, 24)
        .dep(9, 4, DepKind::Call, 24)
        .dep(10, 7, DepKind::Create, 33)
        .dep(21, 10, DepKind::Call, 3)
        .dep(21, 10, DepKind::Call, 4)
        .dep(20, 1, DepKind::Import, 1)
        .build()
}

/// Write [`sample_graph`] to a fresh SQLite file inside a temp dir.
pub fn sample_db() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("facts.db");
    crate::store::write_fact_base(&path, &sample_graph()).unwrap();
    (dir, path)
}
