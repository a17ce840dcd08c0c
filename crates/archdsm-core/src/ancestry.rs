//! Parent-chain traversal over the entity forest
//!
//! Every walk here is an explicit loop with a visited guard. Upstream
//! duplicate tagging can produce self-parented or cyclic chains; those end the
//! walk instead of looping.

use crate::graph::FactGraph;
use crate::model::{Entity, EntityId, EntityKind};
use std::collections::{HashMap, HashSet};

impl FactGraph {
    /// Ancestors from nearest to farthest, excluding the entity itself.
    pub fn ancestors(&self, id: &EntityId) -> Vec<&Entity> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(id.clone());
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if !seen.insert(parent.id.clone()) {
                break;
            }
            out.push(parent);
            current = self.parent(&parent.id);
        }
        out
    }

    /// The File entity at the root of an entity's parent chain.
    pub fn file_of(&self, id: &EntityId) -> Option<&Entity> {
        let entity = self.entity(id)?;
        if entity.kind == EntityKind::File {
            return Some(entity);
        }
        self.ancestors(id).into_iter().find(|e| e.kind == EntityKind::File)
    }

    /// Nearest Class ancestor. A File boundary ends the search.
    pub fn owner_class(&self, id: &EntityId) -> Option<&Entity> {
        for ancestor in self.ancestors(id) {
            match ancestor.kind {
                EntityKind::Class => return Some(ancestor),
                EntityKind::File => return None,
                _ => {}
            }
        }
        None
    }

    /// Containing class names, outermost first. Includes the entity itself
    /// when it is a Class. Consecutive duplicates (a class tagged twice and
    /// parented by its own copy) collapse to one.
    pub fn class_chain(&self, id: &EntityId) -> Vec<String> {
        let Some(entity) = self.entity(id) else {
            return Vec::new();
        };
        let mut chain: Vec<String> = self
            .ancestors(id)
            .into_iter()
            .filter(|e| e.kind == EntityKind::Class)
            .map(|e| e.name.clone())
            .collect();
        chain.reverse();
        if entity.kind == EntityKind::Class {
            chain.push(entity.name.clone());
        }
        chain.dedup();
        chain
    }

    /// A Method/Function defined inside another Method/Function body.
    ///
    /// A parent callable with the same name is a duplicate tag, not an
    /// enclosing scope, and is skipped.
    pub fn is_nested_helper(&self, id: &EntityId) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        if !entity.kind.is_callable() {
            return false;
        }
        for ancestor in self.ancestors(id) {
            match ancestor.kind {
                EntityKind::Class | EntityKind::File => return false,
                EntityKind::Method | EntityKind::Function => {
                    if ancestor.name != entity.name {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// The entity and everything below it, breadth first.
    pub fn descendants(&self, root: &EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        if !self.contains(root) {
            return out;
        }
        let mut queue = std::collections::VecDeque::from([root.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for child in self.children(&current) {
                queue.push_back(child.id.clone());
            }
            out.push(current);
        }
        out
    }
}

/// Per-invocation memo of entity → owning File, built once per export run.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    file_of: HashMap<EntityId, EntityId>,
    names: HashMap<EntityId, String>,
}

impl FileIndex {
    pub fn build(graph: &FactGraph) -> Self {
        let mut index = FileIndex::default();
        let mut unresolved: HashSet<EntityId> = HashSet::new();

        for entity in graph.all_entities() {
            if entity.kind == EntityKind::File {
                index.names.insert(entity.id.clone(), entity.name.clone());
            }
        }

        for entity in graph.all_entities() {
            if index.file_of.contains_key(&entity.id) || unresolved.contains(&entity.id) {
                continue;
            }
            // Walk up until a memoized entity, a File, or a dead end; then
            // assign the result to the whole path.
            let mut path = vec![entity.id.clone()];
            let mut visiting: HashSet<EntityId> = HashSet::from([entity.id.clone()]);
            let mut current = entity;
            let answer = loop {
                if current.kind == EntityKind::File {
                    break Some(current.id.clone());
                }
                if let Some(file) = index.file_of.get(&current.id) {
                    break Some(file.clone());
                }
                if unresolved.contains(&current.id) {
                    break None;
                }
                match graph.parent(&current.id) {
                    Some(parent) if visiting.insert(parent.id.clone()) => {
                        path.push(parent.id.clone());
                        current = parent;
                    }
                    _ => break None,
                }
            };
            for id in path {
                match &answer {
                    Some(file) => {
                        index.file_of.insert(id, file.clone());
                    }
                    None => {
                        unresolved.insert(id);
                    }
                }
            }
        }
        index
    }

    /// Id of the owning File.
    pub fn file_id(&self, id: &EntityId) -> Option<&EntityId> {
        self.file_of.get(id)
    }

    /// Name (path) of the owning File.
    pub fn file_name(&self, id: &EntityId) -> Option<&str> {
        self.file_of
            .get(id)
            .and_then(|file| self.names.get(file))
            .map(String::as_str)
    }

    /// All File entities as (id, name), sorted by name.
    pub fn files(&self) -> Vec<(&EntityId, &str)> {
        let mut files: Vec<(&EntityId, &str)> = self
            .names
            .iter()
            .map(|(id, name)| (id, name.as_str()))
            .collect();
        files.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        files
    }

    pub fn same_file(&self, a: &EntityId, b: &EntityId) -> bool {
        match (self.file_id(a), self.file_id(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}
