//! False-positive classifier for scope-bleed artifacts
//!
//! The upstream resolver sometimes attributes a reference on a definition's
//! own boundary row to an unrelated neighbour. Three detectors recognise the
//! shapes this takes; they run in order and the first match wins.

use archdsm_core::{Dep, Entity, EntityId, EntityKind, FactGraph, SourceSpan};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Definitions spanning at most this many rows have both boundaries checked
/// as equally suspect.
pub const SMALL_SPAN_ROWS: u32 = 3;

const MAX_EXAMPLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FalsePositiveReason {
    /// Method → sibling Method at the source's boundary row
    SiblingMethod,
    /// Method → its own parent Class at the source's boundary row
    ParentClass,
    /// Field → Method with the same parent at the field's row
    FieldToMethod,
}

impl FalsePositiveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FalsePositiveReason::SiblingMethod => "sibling_method",
            FalsePositiveReason::ParentClass => "parent_class",
            FalsePositiveReason::FieldToMethod => "field_to_method",
        }
    }
}

impl fmt::Display for FalsePositiveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `row` sits on a boundary of `span`.
///
/// Small spans check start and end alike. Larger spans check the end row
/// first and the start row as a secondary signal.
pub fn on_boundary(span: &SourceSpan, row: u32) -> bool {
    let (start, end) = (span.start.row, span.end.row);
    if span.rows() <= SMALL_SPAN_ROWS {
        return row == start || row == end;
    }
    if row == end {
        return true;
    }
    row == start
}

fn sibling_method(src: &Entity, tgt: &Entity, row: u32) -> bool {
    src.kind == EntityKind::Method
        && tgt.kind == EntityKind::Method
        && src.parent_id == tgt.parent_id
        && on_boundary(&src.span, row)
}

fn parent_class(src: &Entity, tgt: &Entity, row: u32) -> bool {
    src.kind == EntityKind::Method
        && tgt.kind == EntityKind::Class
        && src.parent_id.as_ref() == Some(&tgt.id)
        && on_boundary(&src.span, row)
}

fn field_to_method(src: &Entity, tgt: &Entity, row: u32) -> bool {
    src.kind == EntityKind::Field
        && tgt.kind == EntityKind::Method
        && src.parent_id == tgt.parent_id
        && (row == src.span.start.row || row == src.span.end.row)
}

/// Classify one raw dependency. Edges with an unknown endpoint are never flagged.
pub fn classify(graph: &FactGraph, dep: &Dep) -> Option<FalsePositiveReason> {
    let src = graph.entity(&dep.src)?;
    let tgt = graph.entity(&dep.tgt)?;
    if sibling_method(src, tgt, dep.row) {
        Some(FalsePositiveReason::SiblingMethod)
    } else if parent_class(src, tgt, dep.row) {
        Some(FalsePositiveReason::ParentClass)
    } else if field_to_method(src, tgt, dep.row) {
        Some(FalsePositiveReason::FieldToMethod)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedDep {
    pub dep: Dep,
    pub reason: FalsePositiveReason,
}

/// The raw edge set split into kept and removed edges.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub kept: Vec<Dep>,
    pub removed: Vec<FlaggedDep>,
}

impl Classification {
    pub fn removed_deps(&self) -> Vec<Dep> {
        self.removed.iter().map(|f| f.dep.clone()).collect()
    }

    pub fn report(&self, graph: &FactGraph) -> ClassifierReport {
        let total = self.kept.len() + self.removed.len();
        let mut by_reason = BTreeMap::new();
        for flagged in &self.removed {
            *by_reason.entry(flagged.reason).or_insert(0) += 1;
        }
        let examples = self
            .removed
            .iter()
            .take(MAX_EXAMPLES)
            .map(|flagged| describe(graph, flagged))
            .collect();
        let reduction_percent = if total > 0 {
            self.removed.len() as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        ClassifierReport {
            total,
            removed: self.removed.len(),
            kept: self.kept.len(),
            by_reason,
            examples,
            reduction_percent,
        }
    }
}

fn describe(graph: &FactGraph, flagged: &FlaggedDep) -> String {
    let label = |id: &EntityId| {
        graph
            .entity(id)
            .map(|e| format!("{} ({})", e.name, e.kind))
            .unwrap_or_else(|| format!("{} (missing)", id))
    };
    format!(
        "[{}] -> [{}] at row {} ({})",
        label(&flagged.dep.src),
        label(&flagged.dep.tgt),
        flagged.dep.row,
        flagged.reason
    )
}

/// Partition every raw dep of `graph`. Must run on the raw fact base, before
/// any derived edges are added.
pub fn partition(graph: &FactGraph) -> Classification {
    let mut out = Classification::default();
    for dep in graph.all_deps() {
        match classify(graph, dep) {
            Some(reason) => out.removed.push(FlaggedDep { dep: dep.clone(), reason }),
            None => out.kept.push(dep.clone()),
        }
    }
    out
}

/// A working copy of `graph` without the flagged deps, plus the partition.
pub fn filter_graph(graph: &FactGraph) -> (FactGraph, Classification) {
    let classification = partition(graph);
    let filtered = graph.without_deps(|dep| classify(graph, dep).is_some());
    (filtered, classification)
}

/// Counts by detector and audit examples. Observational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierReport {
    pub total: usize,
    pub removed: usize,
    pub kept: usize,
    pub by_reason: BTreeMap<FalsePositiveReason, usize>,
    pub examples: Vec<String>,
    pub reduction_percent: f64,
}

impl ClassifierReport {
    pub fn log(&self) {
        tracing::info!("Found {} false positive dependencies out of {}", self.removed, self.total);
        for (reason, count) in &self.by_reason {
            tracing::info!("  {}: {}", reason, count);
        }
        for (i, example) in self.examples.iter().enumerate() {
            tracing::info!("  {}. {}", i + 1, example);
        }
        if self.removed > self.examples.len() {
            tracing::info!("  ... and {} more", self.removed - self.examples.len());
        }
        tracing::info!("Reduction: {:.1}%", self.reduction_percent);
    }
}
