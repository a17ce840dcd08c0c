//! Unit tests for archdsm-core

use crate::test_utils::{sample_db, sample_graph};
use crate::*;
use rusqlite::{params, Connection};
use tempfile::TempDir;

fn id(n: u64) -> EntityId {
    EntityId::from(n)
}

#[test]
fn test_kind_parsing() {
    assert_eq!(EntityKind::from("Method"), EntityKind::Method);
    assert_eq!(EntityKind::from("Variable"), EntityKind::Other("Variable".to_string()));
    assert_eq!(DepKind::from("Call"), DepKind::Call);
    assert_eq!(DepKind::from("Implement").as_str(), "Implement");
    assert!(DepKind::Use.is_core());
    assert!(!DepKind::from("Parameter").is_core());
}

#[test]
fn test_kind_serialization() {
    let json = serde_json::to_string(&EntityKind::Field).unwrap();
    assert_eq!(json, "\"Field\"");
    let kind: DepKind = serde_json::from_str("\"Return\"").unwrap();
    assert_eq!(kind, DepKind::Other("Return".to_string()));
}

#[test]
fn test_entity_id_display_is_hex() {
    assert_eq!(EntityId::new(vec![0x0a, 0xff]).to_string(), "0aff");
    assert_eq!(EntityId::from(1).to_string(), "0000000000000001");
}

#[test]
fn test_span_rows() {
    assert_eq!(SourceSpan::rows_between(10, 10).rows(), 1);
    assert_eq!(SourceSpan::rows_between(10, 12).rows(), 3);
}

#[test]
fn test_constructor_detection() {
    let graph = sample_graph();
    assert!(graph.entity(&id(3)).unwrap().is_constructor());
    assert!(!graph.entity(&id(4)).unwrap().is_constructor());
}

#[test]
fn test_dangling_dep_rejected() {
    let builder = FactGraphBuilder::new()
        .file(1, "a.py")
        .function(2, 1, "f", (1, 2))
        .dep(2, 99, DepKind::Call, 1)
        .dep(98, 2, DepKind::Call, 1)
        .dep(2, 1, DepKind::Use, 1);
    assert_eq!(builder.dangling(), 2);
    let graph = builder.build();
    assert_eq!(graph.dep_count(), 1);
}

#[test]
fn test_multi_edges_are_countable() {
    let graph = sample_graph();
    let calls: Vec<&Dep> = graph
        .deps_from(&id(21))
        .into_iter()
        .filter(|d| d.tgt == id(10))
        .collect();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].row, 3);
    assert_eq!(calls[1].row, 4);
    assert!(graph.has_dep_between(&id(21), &id(10), &DepKind::Call));
    assert!(!graph.has_dep_between(&id(21), &id(10), &DepKind::Use));
}

#[test]
fn test_children_in_insertion_order() {
    let graph = sample_graph();
    let names: Vec<&str> = graph.children(&id(2)).map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["__init__", "area", "name", "Meta"]);
}

#[test]
fn test_replacing_entity_moves_child_index() {
    let mut graph = sample_graph();
    let mut moved = graph.entity(&id(4)).unwrap().clone();
    moved.parent_id = Some(id(7));
    graph.add_entity(moved);
    assert_eq!(graph.entity_count(), 12);
    assert!(graph.children(&id(2)).all(|e| e.id != id(4)));
    assert!(graph.children(&id(7)).any(|e| e.id == id(4)));
}

#[test]
fn test_without_deps_leaves_original() {
    let graph = sample_graph();
    let trimmed = graph.without_deps(|d| d.kind == DepKind::Call);
    assert_eq!(graph.dep_count(), 8);
    assert_eq!(trimmed.dep_count(), 4);
    assert!(trimmed.all_deps().all(|d| d.kind != DepKind::Call));
}

#[test]
fn test_entities_of_kind() {
    let graph = sample_graph();
    let files: Vec<&str> = graph
        .entities_of_kind(EntityKind::File)
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(files, vec!["pkg/shapes.py", "pkg/main.py"]);
}

#[test]
fn test_file_and_owner_lookup() {
    let graph = sample_graph();
    assert_eq!(graph.file_of(&id(9)).unwrap().name, "pkg/shapes.py");
    assert_eq!(graph.file_of(&id(1)).unwrap().name, "pkg/shapes.py");
    assert_eq!(graph.owner_class(&id(9)).unwrap().name, "Square");
    assert_eq!(graph.owner_class(&id(6)).unwrap().name, "Shape");
    assert!(graph.owner_class(&id(10)).is_none());
    assert!(graph.owner_class(&id(2)).is_none());
}

#[test]
fn test_class_chain() {
    let graph = sample_graph();
    assert_eq!(graph.class_chain(&id(6)), vec!["Shape", "Meta"]);
    assert_eq!(graph.class_chain(&id(3)), vec!["Shape"]);
    assert!(graph.class_chain(&id(10)).is_empty());
}

#[test]
fn test_class_chain_collapses_duplicate_tag() {
    let graph = FactGraphBuilder::new()
        .file(1, "a.py")
        .class(2, 1, "Box", (1, 9))
        .class(3, 2, "Box", (1, 9))
        .method(4, 3, "open", (2, 3))
        .build();
    assert_eq!(graph.class_chain(&id(4)), vec!["Box"]);
    assert_eq!(graph.class_chain(&id(3)), vec!["Box"]);
}

#[test]
fn test_nested_helper_detection() {
    let graph = FactGraphBuilder::new()
        .file(1, "a.py")
        .class(2, 1, "C", (1, 20))
        .method(3, 2, "run", (2, 10))
        .function(4, 3, "inner", (3, 4))
        .method(5, 3, "run", (2, 10))
        .function(6, 1, "top", (12, 14))
        .function(7, 6, "deep", (13, 13))
        .build();
    assert!(graph.is_nested_helper(&id(4)));
    assert!(graph.is_nested_helper(&id(7)));
    assert!(!graph.is_nested_helper(&id(3)));
    assert!(!graph.is_nested_helper(&id(5)));
    assert!(!graph.is_nested_helper(&id(6)));
    assert!(!graph.is_nested_helper(&id(2)));
}

#[test]
fn test_parent_cycle_terminates() {
    let graph = FactGraphBuilder::new()
        .class(30, 31, "A", (1, 2))
        .class(31, 30, "B", (1, 2))
        .build();
    assert_eq!(graph.ancestors(&id(30)).len(), 1);
    assert!(graph.file_of(&id(30)).is_none());
    assert!(graph.owner_class(&id(31)).is_some());
    let index = FileIndex::build(&graph);
    assert!(index.file_id(&id(30)).is_none());
}

#[test]
fn test_descendants() {
    let graph = sample_graph();
    let mut below: Vec<EntityId> = graph.descendants(&id(7));
    below.sort();
    assert_eq!(below, vec![id(7), id(8), id(9)]);
    assert!(graph.descendants(&id(1000)).is_empty());
}

#[test]
fn test_file_index() {
    let graph = sample_graph();
    let index = FileIndex::build(&graph);
    assert_eq!(index.file_name(&id(9)), Some("pkg/shapes.py"));
    assert_eq!(index.file_name(&id(21)), Some("pkg/main.py"));
    assert!(index.same_file(&id(3), &id(10)));
    assert!(!index.same_file(&id(3), &id(21)));
    let names: Vec<&str> = index.files().into_iter().map(|(_, name)| name).collect();
    assert_eq!(names, vec!["pkg/main.py", "pkg/shapes.py"]);
}

#[test]
fn test_store_round_trip() {
    let (_dir, path) = sample_db();
    let (graph, report) = load_fact_base(&path).unwrap();
    assert_eq!(report.entities, 12);
    assert_eq!(report.deps, 8);
    assert_eq!(report.contents, 2);
    assert_eq!(report.dangling_deps, 0);
    assert_eq!(graph.entity(&id(8)).unwrap().span.end.row, 25);
    assert_eq!(graph.entity(&id(8)).unwrap().kind, EntityKind::Method);
    let deps: Vec<(u32, &str)> = graph.all_deps().map(|d| (d.row, d.kind.as_str())).collect();
    assert_eq!(deps[0], (22, "Extend"));
    assert_eq!(deps[7], (1, "Import"));
}

#[test]
fn test_store_comment_span_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("facts.db");
    let mut graph = FactGraphBuilder::new().file(1, "a.py").build();
    graph.add_entity(Entity {
        id: id(2),
        parent_id: Some(id(1)),
        kind: EntityKind::Function,
        name: "f".to_string(),
        content_id: id(1),
        span: SourceSpan::rows_between(3, 5),
        comment: Some(SourceSpan::rows_between(1, 2)),
    });
    write_fact_base(&path, &graph).unwrap();
    let (loaded, _) = load_fact_base(&path).unwrap();
    assert_eq!(loaded.entity(&id(2)).unwrap().comment, Some(SourceSpan::rows_between(1, 2)));
    assert_eq!(loaded.entity(&id(1)).unwrap().comment, None);
}

#[test]
fn test_store_counts_dangling_and_orphans() {
    let (_dir, path) = sample_db();
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO deps (src, tgt, kind, row) VALUES (?1, ?2, 'Call', 7)",
            params![id(21).as_bytes(), id(404).as_bytes()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO entities (id, parent_id, name, kind, start_byte, start_row, start_column, \
             end_byte, end_row, end_column, content_id, simple_id) \
             VALUES (?1, ?2, 'lost', 'Method', 0, 1, 0, 0, 2, 0, ?1, ?1)",
            params![id(500).as_bytes(), id(501).as_bytes()],
        )
        .unwrap();
    }
    let (graph, report) = load_fact_base(&path).unwrap();
    assert_eq!(report.dangling_deps, 1);
    assert_eq!(report.orphaned_entities, 1);
    assert_eq!(graph.dep_count(), 8);
    assert!(graph.contains(&id(500)));
}

#[test]
fn test_filtered_copy_deletes_only_removed_rows() {
    let (dir, input) = sample_db();
    let output = dir.path().join("out/filtered.db");
    let removed = vec![Dep::new(id(21), id(10), DepKind::Call, 4)];
    let deleted = write_filtered_copy(&input, &output, &removed, false).unwrap();
    assert_eq!(deleted, 1);

    let (original, _) = load_fact_base(&input).unwrap();
    let (filtered, _) = load_fact_base(&output).unwrap();
    assert_eq!(original.dep_count(), 8);
    assert_eq!(filtered.dep_count(), 7);
    assert_eq!(filtered.entity_count(), original.entity_count());
    assert!(filtered.has_dep_between(&id(21), &id(10), &DepKind::Call));
}

#[test]
fn test_filtered_copy_refuses_same_path() {
    let (_dir, input) = sample_db();
    let err = write_filtered_copy(&input, &input, &[], true).unwrap_err();
    assert!(matches!(err, FactError::SameDatabase(_)));
}

#[test]
fn test_filtered_copy_refuses_existing_output() {
    let (dir, input) = sample_db();
    let output = dir.path().join("filtered.db");
    write_filtered_copy(&input, &output, &[], false).unwrap();
    let err = write_filtered_copy(&input, &output, &[], false).unwrap_err();
    assert!(matches!(err, FactError::OutputExists(_)));
    assert_eq!(write_filtered_copy(&input, &output, &[], true).unwrap(), 0);
}
