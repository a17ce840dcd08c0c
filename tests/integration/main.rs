//! Integration tests for archdsm
//!
//! Fact bases are written to temporary SQLite files and read back through
//! the store, the export pipelines and the CLI binary.

use archdsm_core::{
    load_fact_base, write_fact_base, write_filtered_copy, DepKind, EntityId, FactError, FactGraph, FactGraphBuilder,
};
use archdsm_export::{
    export_full, partition, ClusterNode, Clustering, DependencyMatrix, ExportConfig, FactSummary, NamingScheme,
};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// ```text
/// pkg/app.py (1)
///   class Widget (2)          __init__ (5), draw (3), resize (4), size (6 field)
///   class Button(Widget) (7)  click (8)
/// pkg/util.py (20)            clamp (21)
/// run.py (30)                 main (31)
/// ```
fn widget_graph() -> FactGraph {
    FactGraphBuilder::new()
        .file(1, "pkg/app.py")
        .class(2, 1, "Widget", (1, 30))
        .method(5, 2, "__init__", (2, 5))
        .field(6, 2, "size", (3, 3))
        .method(3, 2, "draw", (10, 10))
        .method(4, 2, "resize", (12, 20))
        .class(7, 1, "Button", (32, 40))
        .method(8, 7, "click", (33, 35))
        .file(20, "pkg/util.py")
        .function(21, 20, "clamp", (1, 4))
        .file(30, "run.py")
        .function(31, 30, "main", (1, 3))
        // Extraction artifacts
        .dep(3, 4, DepKind::Call, 10)
        .dep(4, 2, DepKind::Use, 20)
        .dep(6, 4, DepKind::Call, 3)
        // Real dependencies
        .dep(4, 21, DepKind::Call, 15)
        .dep(5, 6, DepKind::Use, 3)
        .dep(7, 2, DepKind::Extend, 32)
        .dep(8, 4, DepKind::Call, 34)
        .dep(1, 20, DepKind::Import, 1)
        .dep(31, 2, DepKind::Create, 2)
        .dep(30, 1, DepKind::Import, 1)
        .build()
}

fn widget_db() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("facts.db");
    write_fact_base(&path, &widget_graph()).unwrap();
    (dir, path)
}

fn archdsm(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_archdsm"))
        .args(args)
        .output()
        .expect("Failed to execute archdsm")
}

fn read_matrix(path: &Path) -> DependencyMatrix {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_fact_base_round_trip() {
    let (_dir, db) = widget_db();
    let (graph, report) = load_fact_base(&db).unwrap();
    assert_eq!(report.entities, 12);
    assert_eq!(report.deps, 10);
    assert_eq!(report.contents, 3);
    assert_eq!(report.dangling_deps, 0);
    assert_eq!(FactSummary::of(&graph), FactSummary::of(&widget_graph()));

    let config = ExportConfig {
        align: true,
        focus_prefix: Some("pkg/".to_string()),
        ..ExportConfig::default()
    };
    let (from_db, _) = export_full(&graph, &config).unwrap();
    let (in_memory, _) = export_full(&widget_graph(), &config).unwrap();
    assert_eq!(from_db.to_json().unwrap(), in_memory.to_json().unwrap());
}

#[test]
fn test_filtered_copy_leaves_input_untouched() {
    let (dir, db) = widget_db();
    let (graph, _) = load_fact_base(&db).unwrap();
    let classification = partition(&graph);
    assert_eq!(classification.removed.len(), 3);

    let output = dir.path().join("filtered").join("facts.db");
    let deleted = write_filtered_copy(&db, &output, &classification.removed_deps(), false).unwrap();
    assert_eq!(deleted, 3);

    let (filtered, _) = load_fact_base(&output).unwrap();
    assert_eq!(filtered.dep_count(), 7);
    assert!(partition(&filtered).removed.is_empty());
    let (raw, _) = load_fact_base(&db).unwrap();
    assert_eq!(raw.dep_count(), 10);
}

#[test]
fn test_filtered_copy_refuses_input_path() {
    let (_dir, db) = widget_db();
    let err = write_filtered_copy(&db, &db, &[], true).unwrap_err();
    assert!(matches!(err, FactError::SameDatabase(_)));
}

#[test]
fn test_dangling_rows_are_tolerated() {
    let (_dir, db) = widget_db();
    {
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute(
            "INSERT INTO deps (src, tgt, kind, row) VALUES (?1, ?2, 'Call', 5)",
            rusqlite::params![EntityId::from(3).as_bytes(), EntityId::from(999).as_bytes()],
        )
        .unwrap();
    }
    let (graph, report) = load_fact_base(&db).unwrap();
    assert_eq!(report.dangling_deps, 1);
    assert_eq!(graph.dep_count(), 10);
}

#[test]
fn test_cli_export_all_outputs() {
    let (dir, db) = widget_db();
    let out = dir.path().join("out");
    let output = archdsm(&[
        "export",
        "--db",
        db.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--scheme",
        "all",
        "--align",
        "--focus",
        "pkg/",
        "--file-level",
        "--per-file",
        "--filter-false-positives",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    for scheme in NamingScheme::ALL {
        let path = out.join(format!("analysis-result.{}.json", scheme));
        assert!(path.exists(), "{}", path.display());
    }
    let structured = read_matrix(&out.join("analysis-result.structured.json"));
    assert!(structured.index_of("pkg/app.py/Widget/subclasses/Button/self (Class)").is_some());
    assert!(structured
        .cell(
            "pkg/app.py/Widget/subclasses/Button/methods/click (Method)",
            "pkg/app.py/Widget/methods/resize (Method)"
        )
        .is_some());
    assert!(structured
        .cell("pkg/app.py/Widget/methods/draw (Method)", "pkg/app.py/Widget/methods/resize (Method)")
        .is_none());

    let file_level = read_matrix(&out.join("file-level.json"));
    assert_eq!(file_level.variables.len(), 3);
    for stem in ["app", "util", "run"] {
        assert!(out.join("per_file").join(format!("{}.json", stem)).exists(), "{stem}");
    }
    assert!(!out.join("per_file").join("app.clustering.json").exists());

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("run_summary.json")).unwrap()).unwrap();
    assert_eq!(summary["classifier"]["removed"], 3);
    assert_eq!(summary["load"]["deps"], 10);
    assert_eq!(summary["facts"]["deps_total"], 7);
    assert!(summary["per_file"]["pkg/app.py"]["cells"].as_u64().is_some());
}

#[test]
fn test_cli_per_file_writes_clustering() {
    let (dir, db) = widget_db();
    let out = dir.path().join("out");
    let output = archdsm(&["export", "--db", db.to_str().unwrap(), "--out", out.to_str().unwrap(), "--per-file"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let path = out.join("per_file").join("app.clustering.json");
    let clustering: Clustering = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(clustering.name, "app.py (structure)");
    let groups: Vec<&str> = clustering
        .structure
        .iter()
        .map(|node| match node {
            ClusterNode::Group { name, .. } => name.as_str(),
            ClusterNode::Item { name } => name.as_str(),
        })
        .collect();
    assert_eq!(&groups[..2], ["Button", "Widget"]);
    let Some(ClusterNode::Group { nested, .. }) = clustering
        .structure
        .iter()
        .find(|node| matches!(node, ClusterNode::Group { name, .. } if name == "External"))
    else {
        panic!("no External group in {}", path.display());
    };
    assert!(nested.contains(&ClusterNode::Item { name: "(External Function) clamp".to_string() }));
}

#[test]
fn test_cli_filter_and_summary() {
    let (dir, db) = widget_db();
    let filtered = dir.path().join("filtered.db");
    let output = archdsm(&["filter", db.to_str().unwrap(), filtered.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let again = archdsm(&["filter", db.to_str().unwrap(), filtered.to_str().unwrap()]);
    assert!(!again.status.success());
    let forced = archdsm(&["filter", db.to_str().unwrap(), filtered.to_str().unwrap(), "--force"]);
    assert!(forced.status.success());

    let output = archdsm(&["summary", filtered.to_str().unwrap()]);
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["entities_total"], 12);
    assert_eq!(summary["deps_total"], 7);
}

#[test]
fn test_cli_rejects_unknown_scheme() {
    let (dir, db) = widget_db();
    let out = dir.path().join("out");
    let output = archdsm(&[
        "export",
        "--db",
        db.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--scheme",
        "tree",
    ]);
    assert!(!output.status.success());
    assert!(!out.join("analysis-result.json").exists());
}
