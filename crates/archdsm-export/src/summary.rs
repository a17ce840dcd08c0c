//! Fact base and matrix summaries, and the per-run summary file

use crate::classifier::ClassifierReport;
use crate::config::ExportConfig;
use crate::error::ExportResult;
use crate::export::ExportStats;
use crate::matrix::DependencyMatrix;
use archdsm_core::{EntityKind, FactGraph, LoadReport};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindBreakdown {
    pub src_kind: String,
    pub tgt_kind: String,
    pub dep_kind: String,
    pub count: usize,
}

/// Totals over a fact base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactSummary {
    pub entities_total: usize,
    pub deps_total: usize,
    pub files_total: usize,
    pub classes_total: usize,
    pub methods_total: usize,
    pub fields_total: usize,
    pub deps_by_kind: BTreeMap<String, usize>,
    /// Sorted by count, largest first.
    pub breakdown: Vec<KindBreakdown>,
}

impl FactSummary {
    pub fn of(graph: &FactGraph) -> Self {
        let count = |kind: EntityKind| graph.entities_of_kind(kind).len();
        let mut deps_by_kind = BTreeMap::new();
        let mut shapes: HashMap<(String, String, String), usize> = HashMap::new();
        for dep in graph.all_deps() {
            *deps_by_kind.entry(dep.kind.to_string()).or_insert(0) += 1;
            if let (Some(src), Some(tgt)) = (graph.entity(&dep.src), graph.entity(&dep.tgt)) {
                let key = (src.kind.to_string(), tgt.kind.to_string(), dep.kind.to_string());
                *shapes.entry(key).or_insert(0) += 1;
            }
        }
        let mut breakdown: Vec<KindBreakdown> = shapes
            .into_iter()
            .map(|((src_kind, tgt_kind, dep_kind), count)| KindBreakdown { src_kind, tgt_kind, dep_kind, count })
            .collect();
        breakdown.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| (&a.src_kind, &a.tgt_kind, &a.dep_kind).cmp(&(&b.src_kind, &b.tgt_kind, &b.dep_kind)))
        });

        Self {
            entities_total: graph.entity_count(),
            deps_total: graph.dep_count(),
            files_total: count(EntityKind::File),
            classes_total: count(EntityKind::Class),
            methods_total: count(EntityKind::Method),
            fields_total: count(EntityKind::Field),
            deps_by_kind,
            breakdown,
        }
    }
}

/// Per-kind totals over a matrix's cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatrixSummary {
    pub variables: usize,
    pub cells: usize,
    pub totals: BTreeMap<String, f64>,
}

impl MatrixSummary {
    pub fn of(matrix: &DependencyMatrix) -> Self {
        let mut totals = BTreeMap::new();
        for cell in &matrix.cells {
            for (kind, value) in &cell.values {
                *totals.entry(kind.clone()).or_insert(0.0) += value;
            }
        }
        Self {
            variables: matrix.variables.len(),
            cells: matrix.cells.len(),
            totals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub stats: ExportStats,
    pub matrix: MatrixSummary,
}

/// Everything one CLI run did, written next to the matrices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub config: ExportConfig,
    pub load: Option<LoadReport>,
    pub classifier: Option<ClassifierReport>,
    pub facts: FactSummary,
    /// Keyed by output file name.
    pub exports: BTreeMap<String, ExportSummary>,
    pub per_file: BTreeMap<String, MatrixSummary>,
}

impl RunSummary {
    pub fn new(config: &ExportConfig, facts: FactSummary) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            config: config.clone(),
            load: None,
            classifier: None,
            facts,
            exports: BTreeMap::new(),
            per_file: BTreeMap::new(),
        }
    }

    pub fn add_export(&mut self, output: impl Into<String>, matrix: &DependencyMatrix, stats: ExportStats) {
        self.exports.insert(
            output.into(),
            ExportSummary { stats, matrix: MatrixSummary::of(matrix) },
        );
    }

    pub fn write(&self, path: &Path) -> ExportResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
