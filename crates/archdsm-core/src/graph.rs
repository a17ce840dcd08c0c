//! Fact graph wrapper using petgraph::StableDiGraph keyed by EntityId

use crate::model::*;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap};

/// The fact base: entities as nodes, raw dependency edges as a multigraph.
///
/// Parent links are kept on the entities themselves (with a reverse child
/// index); edges carry only dependencies so they can be counted per site.
#[derive(Clone)]
pub struct FactGraph {
    inner: StableDiGraph<Entity, Dep>,
    index: HashMap<EntityId, NodeIndex>,
    children: HashMap<EntityId, Vec<EntityId>>,
    contents: BTreeMap<ContentId, String>,
}

impl std::fmt::Debug for FactGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactGraph")
            .field("entity_count", &self.inner.node_count())
            .field("dep_count", &self.inner.edge_count())
            .field("content_count", &self.contents.len())
            .finish()
    }
}

impl FactGraph {
    pub fn new() -> Self {
        FactGraph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
            children: HashMap::new(),
            contents: BTreeMap::new(),
        }
    }

    /// Add an entity. A second entity with the same id replaces the first.
    pub fn add_entity(&mut self, entity: Entity) {
        if let Some(&idx) = self.index.get(&entity.id) {
            if let Some(old_parent) = self.inner[idx].parent_id.clone() {
                if let Some(siblings) = self.children.get_mut(&old_parent) {
                    siblings.retain(|c| c != &entity.id);
                }
            }
            if let Some(parent) = &entity.parent_id {
                self.children.entry(parent.clone()).or_default().push(entity.id.clone());
            }
            self.inner[idx] = entity;
            return;
        }
        if let Some(parent) = &entity.parent_id {
            self.children.entry(parent.clone()).or_default().push(entity.id.clone());
        }
        let id = entity.id.clone();
        let idx = self.inner.add_node(entity);
        self.index.insert(id, idx);
    }

    /// Add a dependency edge. Returns `None` when either endpoint is unknown.
    pub fn add_dep(&mut self, dep: Dep) -> Option<EdgeIndex> {
        let source = *self.index.get(&dep.src)?;
        let target = *self.index.get(&dep.tgt)?;
        Some(self.inner.add_edge(source, target, dep))
    }

    pub fn add_content(&mut self, id: ContentId, text: impl Into<String>) {
        self.contents.insert(id, text.into());
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.index.get(id).and_then(|&idx| self.inner.node_weight(idx))
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    pub fn content(&self, id: &ContentId) -> Option<&str> {
        self.contents.get(id).map(String::as_str)
    }

    pub fn contents(&self) -> impl Iterator<Item = (&ContentId, &str)> {
        self.contents.iter().map(|(id, text)| (id, text.as_str()))
    }

    /// Parent entity, if the parent id resolves.
    pub fn parent(&self, id: &EntityId) -> Option<&Entity> {
        self.entity(id)?.parent_id.as_ref().and_then(|p| self.entity(p))
    }

    /// Direct children in insertion order.
    pub fn children(&self, id: &EntityId) -> impl Iterator<Item = &Entity> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(move |child| self.entity(child))
    }

    pub fn entity_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn dep_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// All entities, ordered by id so callers never observe hash order.
    pub fn all_entities(&self) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self.inner.node_weights().collect();
        entities.sort_by(|a, b| a.id.cmp(&b.id));
        entities
    }

    /// All dependency edges in insertion order.
    pub fn all_deps(&self) -> impl Iterator<Item = &Dep> {
        self.inner
            .edge_indices()
            .filter_map(move |idx| self.inner.edge_weight(idx))
    }

    /// Entities of one kind, ordered by id.
    pub fn entities_of_kind(&self, kind: EntityKind) -> Vec<&Entity> {
        self.all_entities()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }

    /// Get all outgoing edges from an entity.
    pub fn deps_from(&self, src: &EntityId) -> Vec<&Dep> {
        self.deps_directed(src, Direction::Outgoing)
    }

    /// Get all incoming edges to an entity.
    pub fn deps_to(&self, tgt: &EntityId) -> Vec<&Dep> {
        self.deps_directed(tgt, Direction::Incoming)
    }

    // petgraph yields adjacent edges newest-first; reverse to insertion order.
    fn deps_directed(&self, id: &EntityId, dir: Direction) -> Vec<&Dep> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut deps: Vec<(EdgeIndex, &Dep)> = self
            .inner
            .edges_directed(idx, dir)
            .map(|edge_ref| (edge_ref.id(), edge_ref.weight()))
            .collect();
        deps.sort_by_key(|(edge, _)| *edge);
        deps.into_iter().map(|(_, dep)| dep).collect()
    }

    /// Check if an edge of a specific kind exists between two entities.
    pub fn has_dep_between(&self, src: &EntityId, tgt: &EntityId, kind: &DepKind) -> bool {
        self.deps_from(src)
            .iter()
            .any(|d| &d.tgt == tgt && &d.kind == kind)
    }

    /// A working copy with every dep matching `remove` dropped. `self` is untouched.
    pub fn without_deps(&self, mut remove: impl FnMut(&Dep) -> bool) -> FactGraph {
        let mut copy = self.clone();
        let doomed: Vec<EdgeIndex> = copy
            .inner
            .edge_indices()
            .filter(|&idx| copy.inner.edge_weight(idx).is_some_and(&mut remove))
            .collect();
        for idx in doomed {
            copy.inner.remove_edge(idx);
        }
        copy
    }
}

impl Default for FactGraph {
    fn default() -> Self {
        Self::new()
    }
}
