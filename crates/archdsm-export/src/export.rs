//! Export pipelines: full drill-down matrix, file-level matrix, per-file slices

use crate::align::{AlignmentFilter, AlignmentReport};
use crate::config::ExportConfig;
use crate::error::ExportResult;
use crate::matrix::{Clustering, DependencyMatrix, MatrixBuilder, NodeOrder};
use crate::naming::{display_name, ClassFolders, NameResolver, Node};
use crate::scope::FocusScope;
use archdsm_core::{Dep, DepKind, EntityId, EntityKind, FactGraph, FileIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const FULL_MATRIX_NAME: &str = "dependencies (full)";
pub const FILE_LEVEL_MATRIX_NAME: &str = "dependencies (file-level)";

/// What one export kept, dropped and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub deps_seen: usize,
    /// File-to-file edges recorded (overview or file-level).
    pub file_edges: usize,
    /// Entity-level edges recorded.
    pub entity_edges: usize,
    pub out_of_scope_sources: usize,
    pub unresolved_names: usize,
    pub external_targets: usize,
    pub external_dropped: usize,
    pub self_edges_dropped: usize,
    /// Edges already present in unique-edge mode.
    pub duplicates_collapsed: usize,
    /// File-level aligned export fell back to non-Import core edges.
    pub import_fallback: bool,
    pub alignment: AlignmentReport,
}

/// One per-file slice.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMatrix {
    pub file: String,
    /// Unique output stem, normally the file stem.
    pub stem: String,
    pub matrix: DependencyMatrix,
    /// Class grouping of the variables; non-aligned slices only.
    pub clustering: Option<Clustering>,
    pub stats: ExportStats,
}

fn is_core_entity(kind: &EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::File | EntityKind::Class | EntityKind::Method | EntityKind::Function | EntityKind::Field
    )
}

/// Shared per-run state: the file memo and the focus filter.
struct Run<'a> {
    graph: &'a FactGraph,
    config: &'a ExportConfig,
    files: FileIndex,
    scope: FocusScope,
}

impl<'a> Run<'a> {
    fn new(graph: &'a FactGraph, config: &'a ExportConfig) -> ExportResult<Self> {
        Ok(Self {
            graph,
            config,
            files: FileIndex::build(graph),
            scope: FocusScope::new(config)?,
        })
    }

    fn in_focus_file(&self, id: &EntityId) -> bool {
        self.files.file_name(id).is_some_and(|name| self.scope.contains(name))
    }

    /// A core-kind entity belonging to an in-focus file.
    fn in_focus(&self, id: &EntityId) -> bool {
        self.graph.entity(id).is_some_and(|e| is_core_entity(&e.kind)) && self.in_focus_file(id)
    }

    fn resolver(&self, folders: ClassFolders) -> NameResolver<'_> {
        NameResolver::new(self.graph, &self.files, self.config.scheme, folders)
    }

    /// The file-to-file projection of `dep`, or `None` when it has none in this run.
    fn file_edge(
        &self,
        resolver: &NameResolver<'_>,
        dep: &Dep,
        stats: &mut ExportStats,
    ) -> Option<(Node, Node)> {
        let src_file = self.files.file_id(&dep.src)?;
        let tgt_file = self.files.file_id(&dep.tgt)?;
        let src_name = self.files.file_name(&dep.src)?;
        let tgt_name = self.files.file_name(&dep.tgt)?;
        if !self.scope.contains(src_name) {
            return None;
        }
        if !self.config.include_self_edges && src_file == tgt_file {
            stats.self_edges_dropped += 1;
            return None;
        }
        let src = resolver.file_node(src_name);
        if self.scope.contains(tgt_name) {
            return Some((src, resolver.file_node(tgt_name)));
        }
        if self.config.align || !self.config.include_external_target_files {
            stats.external_dropped += 1;
            return None;
        }
        stats.external_targets += 1;
        Some((src, Node::external(&EntityKind::File, tgt_name)))
    }
}

/// The full drill-down matrix: file overview edges plus entity-level edges.
///
/// In aligned mode every in-focus node is listed even without edges, edges
/// are unique, and external targets are never included.
pub fn export_full(graph: &FactGraph, config: &ExportConfig) -> ExportResult<(DependencyMatrix, ExportStats)> {
    let run = Run::new(graph, config)?;
    let folders = ClassFolders::build(graph, &run.files, |name| run.scope.contains(name));
    let resolver = run.resolver(folders);
    let filter = AlignmentFilter::new(graph, &run.files, &run.scope);
    let mut stats = ExportStats::default();
    let mut builder = MatrixBuilder::new(FULL_MATRIX_NAME).unique_edges(config.align);

    if config.align {
        for entity in graph.all_entities() {
            if !run.in_focus(&entity.id) || graph.is_nested_helper(&entity.id) {
                continue;
            }
            if let Some(node) = resolver.resolve(&entity.id) {
                builder.node(node);
            }
        }
    }

    if config.file_overview {
        for dep in graph.all_deps() {
            if config.align && dep.kind != DepKind::Import {
                continue;
            }
            // File → File deps are emitted by the entity pass below.
            let both_files = graph.entity(&dep.src).is_some_and(|e| e.kind == EntityKind::File)
                && graph.entity(&dep.tgt).is_some_and(|e| e.kind == EntityKind::File);
            if both_files {
                continue;
            }
            if let Some((src, tgt)) = run.file_edge(&resolver, dep, &mut stats) {
                record(&mut builder, src, tgt, &dep.kind, &mut stats.file_edges, &mut stats.duplicates_collapsed);
            }
        }
    }

    let include_external = config.include_external_targets && !config.align;
    for dep in graph.all_deps() {
        stats.deps_seen += 1;
        if !run.in_focus(&dep.src) {
            stats.out_of_scope_sources += 1;
            continue;
        }
        if config.align {
            let outcome = filter.check(dep);
            stats.alignment.record(outcome);
            if let Err(reason) = outcome {
                tracing::debug!("Dropped {} {} -> {}: {}", dep.kind, dep.src, dep.tgt, reason);
                continue;
            }
        }
        let Some(src) = resolver.resolve(&dep.src) else {
            stats.unresolved_names += 1;
            continue;
        };
        let tgt = if run.in_focus(&dep.tgt) {
            resolver.resolve(&dep.tgt)
        } else if include_external {
            stats.external_targets += 1;
            resolver.external(&dep.tgt)
        } else {
            stats.external_dropped += 1;
            continue;
        };
        let Some(tgt) = tgt else {
            stats.unresolved_names += 1;
            continue;
        };
        record(&mut builder, src, tgt, &dep.kind, &mut stats.entity_edges, &mut stats.duplicates_collapsed);
    }

    let matrix = builder.build(NodeOrder::Sorted);
    tracing::info!(
        "Full export ({}{}): {} variables, {} cells",
        config.scheme,
        if config.align { ", aligned" } else { "" },
        matrix.variables.len(),
        matrix.cells.len()
    );
    Ok((matrix, stats))
}

fn record(
    builder: &mut MatrixBuilder,
    src: Node,
    tgt: Node,
    kind: &DepKind,
    recorded: &mut usize,
    duplicates: &mut usize,
) {
    if builder.edge(src, tgt, kind) {
        *recorded += 1;
    } else {
        *duplicates += 1;
    }
}

/// A matrix over File nodes only.
///
/// Aligned: every focus file is listed; edges are unique Import edges, or
/// cross-file core-kind edges when no Import edge survives. Non-aligned:
/// every cross-file edge, external target files included by config.
pub fn export_file_level(graph: &FactGraph, config: &ExportConfig) -> ExportResult<(DependencyMatrix, ExportStats)> {
    let run = Run::new(graph, config)?;
    let resolver = run.resolver(ClassFolders::default());
    let mut stats = ExportStats::default();
    let mut builder = MatrixBuilder::new(FILE_LEVEL_MATRIX_NAME).unique_edges(config.align);

    if config.align {
        for (_, name) in run.scope.focus_files(&run.files) {
            builder.node(resolver.file_node(name));
        }
    }

    for dep in graph.all_deps() {
        stats.deps_seen += 1;
        if config.align && dep.kind != DepKind::Import {
            continue;
        }
        if let Some((src, tgt)) = run.file_edge(&resolver, dep, &mut stats) {
            record(&mut builder, src, tgt, &dep.kind, &mut stats.file_edges, &mut stats.duplicates_collapsed);
        }
    }

    if config.align && stats.file_edges == 0 {
        tracing::info!("No Import edges between focus files; deriving file coupling from core edges");
        stats.import_fallback = true;
        for dep in graph.all_deps() {
            if !dep.kind.is_core() {
                continue;
            }
            if !run.in_focus_file(&dep.tgt) {
                continue;
            }
            if let Some((src, tgt)) = run.file_edge(&resolver, dep, &mut stats) {
                record(&mut builder, src, tgt, &dep.kind, &mut stats.file_edges, &mut stats.duplicates_collapsed);
            }
        }
    }

    let matrix = builder.build(NodeOrder::Sorted);
    tracing::info!(
        "File-level export: {} files, {} cells",
        matrix.variables.len(),
        matrix.cells.len()
    );
    Ok((matrix, stats))
}

fn file_stem(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    }
}

fn file_base(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// One scoped matrix per focus file.
///
/// A slice holds the deps whose source lies in the file, plus the deps
/// entering it when `include_incoming` is set. Endpoints outside the file
/// become `(External <kind>) <Class.member>` nodes. Non-aligned slices use
/// short `Class.member` names in first-seen order and carry a
/// [`Clustering`]; aligned slices use the scheme's names. Class folders only
/// follow same-file links, so one build serves every slice.
pub fn export_per_file(graph: &FactGraph, config: &ExportConfig) -> ExportResult<Vec<FileMatrix>> {
    let run = Run::new(graph, config)?;
    let filter = AlignmentFilter::new(graph, &run.files, &run.scope);
    let folders = if config.align {
        ClassFolders::build(graph, &run.files, |name| run.scope.contains(name))
    } else {
        ClassFolders::default()
    };
    let resolver = run.resolver(folders);

    // Each dep lands in its source file's bucket, and in its target file's
    // when incoming deps are wanted and the files differ.
    let mut by_file: HashMap<&EntityId, Vec<&Dep>> = HashMap::new();
    for dep in graph.all_deps() {
        let src_file = run.files.file_id(&dep.src);
        if let Some(file) = src_file {
            by_file.entry(file).or_default().push(dep);
        }
        if config.include_incoming {
            if let Some(file) = run.files.file_id(&dep.tgt).filter(|&f| Some(f) != src_file) {
                by_file.entry(file).or_default().push(dep);
            }
        }
    }

    let mut used_stems: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();

    for (file_id, file_name) in run.scope.focus_files(&run.files) {
        let inside: HashSet<EntityId> = graph.descendants(file_id).into_iter().collect();
        let mut stats = ExportStats::default();
        let mut builder = MatrixBuilder::new(file_base(file_name)).unique_edges(config.align);

        let name_of = |id: &EntityId| -> Option<Node> {
            if inside.contains(id) {
                if config.align {
                    resolver.resolve(id)
                } else {
                    display_name(graph, id).map(Node::plain)
                }
            } else {
                resolver.external(id)
            }
        };

        for &dep in by_file.get(file_id).into_iter().flatten() {
            let src_in = inside.contains(&dep.src);
            let tgt_in = inside.contains(&dep.tgt);
            if !src_in && !(config.include_incoming && tgt_in) {
                continue;
            }
            stats.deps_seen += 1;
            if config.align {
                let outcome = filter.check(dep);
                stats.alignment.record(outcome);
                if outcome.is_err() {
                    continue;
                }
            }
            if !(src_in && tgt_in) {
                if !config.include_external_targets {
                    stats.external_dropped += 1;
                    continue;
                }
                stats.external_targets += 1;
            }
            let (Some(src), Some(tgt)) = (name_of(&dep.src), name_of(&dep.tgt)) else {
                stats.unresolved_names += 1;
                continue;
            };
            record(&mut builder, src, tgt, &dep.kind, &mut stats.entity_edges, &mut stats.duplicates_collapsed);
        }

        let order = if config.align { NodeOrder::Sorted } else { NodeOrder::Observed };
        let matrix = builder.build(order);
        let clustering = match graph.entity(file_id) {
            Some(file) if !config.align => Some(Clustering::for_file(graph, file, &matrix.variables)),
            _ => None,
        };

        let stem = file_stem(file_name).to_string();
        let seen = used_stems.entry(stem.clone()).or_insert(0);
        *seen += 1;
        let stem = if *seen == 1 {
            stem
        } else {
            file_name.replace(&['/', '.'][..], "_")
        };
        tracing::debug!("Per-file export {}: {} cells", file_name, matrix.cells.len());
        out.push(FileMatrix {
            file: file_name.to_string(),
            stem,
            matrix,
            clustering,
            stats,
        });
    }

    tracing::info!("Per-file export: {} files", out.len());
    Ok(out)
}
