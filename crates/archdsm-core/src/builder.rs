//! Fluent construction of in-memory fact bases

use crate::graph::FactGraph;
use crate::model::*;

/// Builds a [`FactGraph`] with numeric ids, mostly for tests and fixtures.
///
/// Every entity added under a file shares the file's content id, mirroring
/// what the upstream engine emits.
#[derive(Debug, Default)]
pub struct FactGraphBuilder {
    graph: FactGraph,
    dangling: usize,
}

impl FactGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, id: u64, path: &str) -> Self {
        let entity = Entity {
            id: EntityId::from(id),
            parent_id: None,
            kind: EntityKind::File,
            name: path.to_string(),
            content_id: EntityId::from(id),
            span: SourceSpan::default(),
            comment: None,
        };
        self.graph.add_entity(entity);
        self.graph.add_content(EntityId::from(id), String::new());
        self
    }

    /// Add a child entity spanning `rows` (inclusive start and end row).
    pub fn entity(
        mut self,
        id: u64,
        parent: u64,
        kind: EntityKind,
        name: &str,
        rows: (u32, u32),
    ) -> Self {
        let parent_id = EntityId::from(parent);
        let content_id = self
            .graph
            .entity(&parent_id)
            .map(|p| p.content_id.clone())
            .unwrap_or_else(|| parent_id.clone());
        self.graph.add_entity(Entity {
            id: EntityId::from(id),
            parent_id: Some(parent_id),
            kind,
            name: name.to_string(),
            content_id,
            span: SourceSpan::rows_between(rows.0, rows.1),
            comment: None,
        });
        self
    }

    pub fn class(self, id: u64, parent: u64, name: &str, rows: (u32, u32)) -> Self {
        self.entity(id, parent, EntityKind::Class, name, rows)
    }

    pub fn method(self, id: u64, parent: u64, name: &str, rows: (u32, u32)) -> Self {
        self.entity(id, parent, EntityKind::Method, name, rows)
    }

    pub fn function(self, id: u64, parent: u64, name: &str, rows: (u32, u32)) -> Self {
        self.entity(id, parent, EntityKind::Function, name, rows)
    }

    pub fn field(self, id: u64, parent: u64, name: &str, rows: (u32, u32)) -> Self {
        self.entity(id, parent, EntityKind::Field, name, rows)
    }

    pub fn content(mut self, id: u64, text: &str) -> Self {
        self.graph.add_content(EntityId::from(id), text);
        self
    }

    /// Add a raw dependency edge; edges to unknown entities are counted, not added.
    pub fn dep(mut self, src: u64, tgt: u64, kind: DepKind, row: u32) -> Self {
        let dep = Dep::new(EntityId::from(src), EntityId::from(tgt), kind, row);
        if self.graph.add_dep(dep).is_none() {
            self.dangling += 1;
        }
        self
    }

    /// Number of edges rejected so far because an endpoint was missing.
    pub fn dangling(&self) -> usize {
        self.dangling
    }

    pub fn build(self) -> FactGraph {
        self.graph
    }
}
