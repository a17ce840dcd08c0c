//! Dependency matrix assembly: variables, sparse cells, deterministic order

use crate::error::ExportResult;
use crate::naming::Node;
use archdsm_core::{DepKind, Entity, EntityKind, FactGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0";

/// One sparse matrix cell: dependency counts from `variables[src]` to `variables[dest]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub src: usize,
    pub dest: usize,
    pub values: BTreeMap<String, f64>,
}

/// The matrix artifact as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyMatrix {
    #[serde(rename = "@schemaVersion")]
    pub schema_version: String,
    pub name: String,
    pub variables: Vec<String>,
    pub cells: Vec<Cell>,
}

impl DependencyMatrix {
    pub fn index_of(&self, variable: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == variable)
    }

    /// The cell between two variables, by name.
    pub fn cell(&self, src: &str, dest: &str) -> Option<&Cell> {
        let (src, dest) = (self.index_of(src)?, self.index_of(dest)?);
        self.cells.iter().find(|c| c.src == src && c.dest == dest)
    }

    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> ExportResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!(
            "Wrote {} ({} variables, {} cells)",
            path.display(),
            self.variables.len(),
            self.cells.len()
        );
        Ok(())
    }
}

/// One node of a clustering tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "lowercase")]
pub enum ClusterNode {
    Group { name: String, nested: Vec<ClusterNode> },
    Item { name: String },
}

impl ClusterNode {
    fn group(name: &str, items: Vec<String>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(ClusterNode::Group {
            name: name.to_string(),
            nested: items.into_iter().map(|name| ClusterNode::Item { name }).collect(),
        })
    }
}

/// The class-folder grouping of one per-file slice, written beside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    #[serde(rename = "@schemaVersion")]
    pub schema_version: String,
    pub name: String,
    pub structure: Vec<ClusterNode>,
}

impl Clustering {
    /// Groups `variables` (short `Class.member` names) under the classes
    /// sharing `file`'s content id, in name order. Each class group holds
    /// `self`, `constructor`, `methods` and `fields` subgroups; empty groups
    /// are omitted. Leftovers go to `External` when parenthesized, to
    /// `Module-level` otherwise.
    pub fn for_file(graph: &FactGraph, file: &Entity, variables: &[String]) -> Self {
        let present: HashSet<&str> = variables.iter().map(String::as_str).collect();
        let mut assigned: HashSet<String> = HashSet::new();
        let mut claim = |name: &str| present.contains(name) && assigned.insert(name.to_string());

        let mut classes: Vec<&Entity> = graph
            .entities_of_kind(EntityKind::Class)
            .into_iter()
            .filter(|class| class.content_id == file.content_id)
            .collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));

        let mut structure = Vec::new();
        for class in classes {
            let mut this = Vec::new();
            if claim(&class.name) {
                this.push(class.name.clone());
            }
            let mut members: Vec<&Entity> = graph
                .children(&class.id)
                .filter(|child| matches!(child.kind, EntityKind::Method | EntityKind::Field))
                .collect();
            members.sort_by(|a, b| a.name.cmp(&b.name));

            let (mut constructors, mut methods, mut fields) = (Vec::new(), Vec::new(), Vec::new());
            for member in members {
                let name = format!("{}.{}", class.name, member.name);
                if !claim(&name) {
                    continue;
                }
                if member.kind == EntityKind::Field {
                    fields.push(name);
                } else if member.is_constructor() {
                    constructors.push(name);
                } else {
                    methods.push(name);
                }
            }

            let nested: Vec<ClusterNode> = [
                ("self", this),
                ("constructor", constructors),
                ("methods", methods),
                ("fields", fields),
            ]
            .into_iter()
            .filter_map(|(name, items)| ClusterNode::group(name, items))
            .collect();
            if !nested.is_empty() {
                structure.push(ClusterNode::Group { name: class.name.clone(), nested });
            }
        }

        let mut rest: Vec<String> = variables.iter().filter(|v| !assigned.contains(*v)).cloned().collect();
        rest.sort();
        rest.dedup();
        let (external, module): (Vec<String>, Vec<String>) = rest.into_iter().partition(|v| v.starts_with('('));
        structure.extend(ClusterNode::group("External", external));
        structure.extend(ClusterNode::group("Module-level", module));

        let base = file.name.rsplit('/').next().unwrap_or(&file.name);
        Clustering {
            schema_version: SCHEMA_VERSION.to_string(),
            name: format!("{} (structure)", base),
            structure,
        }
    }

    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> ExportResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!("Wrote {} ({} top-level groups)", path.display(), self.structure.len());
        Ok(())
    }
}

/// How [`MatrixBuilder::build`] orders variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrder {
    /// First-seen order.
    Observed,
    /// By each node's sort key.
    Sorted,
}

/// Accumulates edges between named nodes into a [`DependencyMatrix`].
///
/// In unique mode each `(src, tgt, kind)` counts once; otherwise every
/// observed edge adds one to its cell.
#[derive(Debug)]
pub struct MatrixBuilder {
    name: String,
    unique: bool,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    cells: BTreeMap<(usize, usize), BTreeMap<String, f64>>,
    seen: HashSet<(usize, usize, String)>,
}

impl MatrixBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: false,
            nodes: Vec::new(),
            index: HashMap::new(),
            cells: BTreeMap::new(),
            seen: HashSet::new(),
        }
    }

    pub fn unique_edges(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Register a node, returning its index. Registering a name twice is a no-op.
    pub fn node(&mut self, node: Node) -> usize {
        if let Some(&i) = self.index.get(&node.name) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(node.name.clone(), i);
        self.nodes.push(node);
        i
    }

    /// Record one edge. Returns `false` when unique mode already holds it.
    pub fn edge(&mut self, src: Node, tgt: Node, kind: &DepKind) -> bool {
        let s = self.node(src);
        let t = self.node(tgt);
        if self.unique && !self.seen.insert((s, t, kind.as_str().to_string())) {
            return false;
        }
        let values = self.cells.entry((s, t)).or_default();
        *values.entry(kind.as_str().to_string()).or_insert(0.0) += 1.0;
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn build(self, order: NodeOrder) -> DependencyMatrix {
        let mut order_idx: Vec<usize> = (0..self.nodes.len()).collect();
        if order == NodeOrder::Sorted {
            order_idx.sort_by(|&a, &b| self.nodes[a].cmp(&self.nodes[b]));
        }
        let mut old_to_new = vec![0; self.nodes.len()];
        for (new, &old) in order_idx.iter().enumerate() {
            old_to_new[old] = new;
        }

        let remapped: BTreeMap<(usize, usize), BTreeMap<String, f64>> = self
            .cells
            .into_iter()
            .map(|((s, t), values)| ((old_to_new[s], old_to_new[t]), values))
            .collect();
        let cells = remapped
            .into_iter()
            .map(|((src, dest), values)| Cell { src, dest, values })
            .collect();

        let mut nodes: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        let variables = order_idx
            .iter()
            .filter_map(|&old| nodes[old].take())
            .map(|node| node.name)
            .collect();

        DependencyMatrix {
            schema_version: SCHEMA_VERSION.to_string(),
            name: self.name,
            variables,
            cells,
        }
    }
}
