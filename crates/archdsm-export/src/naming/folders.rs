//! Class folder paths: where a class sits inside its file's naming tree
//!
//! Precedence per class: lexical nesting (`<outer>/inner_classes/<name>`),
//! then a single local base (`<base>/subclasses/<name>`), then `[name]`.
//! A class with several local bases is a root.

use archdsm_core::{DepKind, EntityId, EntityKind, FactGraph, FileIndex};
use std::collections::{BTreeSet, HashMap, HashSet};

pub const INNER_CLASSES: &str = "inner_classes";
pub const SUBCLASSES: &str = "subclasses";

/// Memoized folder paths and local bases for the classes of in-focus files.
#[derive(Debug, Clone, Default)]
pub struct ClassFolders {
    paths: HashMap<EntityId, Vec<String>>,
    local_base: HashMap<EntityId, EntityId>,
}

enum Link {
    Inner,
    Subclass,
    /// Parent is a same-named Class: a duplicate tag, not a scope.
    Duplicate,
}

impl ClassFolders {
    pub fn build(graph: &FactGraph, files: &FileIndex, in_focus: impl Fn(&str) -> bool) -> Self {
        let classes: BTreeSet<EntityId> = graph
            .entities_of_kind(EntityKind::Class)
            .into_iter()
            .filter(|class| files.file_name(&class.id).is_some_and(&in_focus))
            .map(|class| class.id.clone())
            .collect();

        let mut bases: HashMap<EntityId, BTreeSet<EntityId>> = HashMap::new();
        for dep in graph.all_deps() {
            if dep.kind != DepKind::Extend || dep.src == dep.tgt {
                continue;
            }
            if !classes.contains(&dep.src) || !classes.contains(&dep.tgt) {
                continue;
            }
            if !files.same_file(&dep.src, &dep.tgt) {
                continue;
            }
            bases.entry(dep.src.clone()).or_default().insert(dep.tgt.clone());
        }
        let local_base = bases
            .into_iter()
            .filter(|(_, found)| found.len() == 1)
            .filter_map(|(class, found)| found.into_iter().next().map(|base| (class, base)))
            .collect();

        let mut folders = ClassFolders {
            paths: HashMap::new(),
            local_base,
        };
        for class in &classes {
            folders.resolve(graph, files, class);
        }
        tracing::debug!(
            "Built class folders for {} classes ({} with a local base)",
            folders.paths.len(),
            folders.local_base.len()
        );
        folders
    }

    pub fn path(&self, class: &EntityId) -> Option<&[String]> {
        self.paths.get(class).map(Vec::as_slice)
    }

    /// The unique same-file base class, if there is exactly one.
    pub fn local_base(&self, class: &EntityId) -> Option<&EntityId> {
        self.local_base.get(class)
    }

    // Walks up nesting/base links to a memoized or root class, then unwinds,
    // memoizing every class on the way. A class met twice on one walk
    // short-circuits to its bare name.
    fn resolve(&mut self, graph: &FactGraph, files: &FileIndex, start: &EntityId) {
        let mut stack: Vec<(EntityId, Link)> = Vec::new();
        let mut visiting: HashSet<EntityId> = HashSet::new();
        let mut current = start.clone();

        let mut path = loop {
            if let Some(done) = self.paths.get(&current) {
                break done.clone();
            }
            let Some(class) = graph.entity(&current) else {
                break Vec::new();
            };
            if !visiting.insert(current.clone()) {
                let path = vec![class.name.clone()];
                self.paths.insert(current.clone(), path.clone());
                break path;
            }

            let parent = graph
                .parent(&current)
                .filter(|p| p.kind == EntityKind::Class && files.same_file(&p.id, &current));
            if let Some(parent) = parent {
                let link = if parent.name == class.name { Link::Duplicate } else { Link::Inner };
                stack.push((current.clone(), link));
                current = parent.id.clone();
                continue;
            }

            if let Some(base) = self.local_base.get(&current) {
                let base = base.clone();
                stack.push((current.clone(), Link::Subclass));
                current = base;
                continue;
            }

            let path = vec![class.name.clone()];
            self.paths.insert(current.clone(), path.clone());
            break path;
        };

        while let Some((id, link)) = stack.pop() {
            let name = graph.entity(&id).map(|e| e.name.clone()).unwrap_or_default();
            match link {
                Link::Inner => path.extend([INNER_CLASSES.to_string(), name]),
                Link::Subclass => path.extend([SUBCLASSES.to_string(), name]),
                Link::Duplicate => {}
            }
            self.paths.insert(id, path.clone());
        }
    }
}

/// Lexical chain `[Outer, Inner]` as folder segments `[Outer, inner_classes, Inner]`.
pub fn segments_from_chain(chain: &[String]) -> Vec<String> {
    let mut segments = Vec::with_capacity(chain.len() * 2);
    for (i, name) in chain.iter().enumerate() {
        if i > 0 {
            segments.push(INNER_CLASSES.to_string());
        }
        segments.push(name.clone());
    }
    segments
}
