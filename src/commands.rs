//! CLI command implementations

use anyhow::Context;
use archdsm_core::{load_fact_base, write_filtered_copy, FactGraph};
use archdsm_export::{
    export_file_level, export_full, export_per_file, filter_graph, partition, ExportConfig, FactSummary,
    NamingScheme, RunSummary,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

const FULL_OUTPUT: &str = "analysis-result";
const FILE_LEVEL_OUTPUT: &str = "file-level.json";
const PER_FILE_DIR: &str = "per_file";
const SUMMARY_OUTPUT: &str = "run_summary.json";

/// `--scheme` value: one naming scheme, or every scheme in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeChoice {
    One(NamingScheme),
    All,
}

fn parse_scheme(s: &str) -> Result<SchemeChoice, String> {
    if s.eq_ignore_ascii_case("all") {
        return Ok(SchemeChoice::All);
    }
    s.parse::<NamingScheme>().map(SchemeChoice::One).map_err(|e| format!("{}", e))
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Fact base to read
    #[arg(long)]
    db: PathBuf,

    /// Output directory
    #[arg(short, long)]
    out: PathBuf,

    /// TOML export config; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// structured, flat, legacy, or all
    #[arg(short, long, value_parser = parse_scheme)]
    scheme: Option<SchemeChoice>,

    /// Architecture-aligned view
    #[arg(long)]
    align: bool,

    /// Only export files under this path prefix
    #[arg(long)]
    focus: Option<String>,

    /// Drop edges to entities and files outside the focus
    #[arg(long)]
    no_external: bool,

    /// Keep file-level edges from a file to itself
    #[arg(long)]
    self_edges: bool,

    /// Per-file slices carry outgoing edges only
    #[arg(long)]
    no_incoming: bool,

    /// Also write the file-level matrix
    #[arg(long)]
    file_level: bool,

    /// Also write one matrix per focus file
    #[arg(long)]
    per_file: bool,

    /// Run the false-positive classifier in memory before exporting
    #[arg(long)]
    filter_false_positives: bool,
}

impl ExportArgs {
    fn to_config(&self) -> anyhow::Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::load(path)
                .with_context(|| format!("Failed to load export config {}", path.display()))?,
            None => ExportConfig::default(),
        };
        if let Some(SchemeChoice::One(scheme)) = self.scheme {
            config.scheme = scheme;
        }
        if self.align {
            config.align = true;
        }
        if let Some(focus) = &self.focus {
            config.focus_prefix = Some(focus.clone());
        }
        if self.no_external {
            config.include_external_targets = false;
            config.include_external_target_files = false;
        }
        if self.self_edges {
            config.include_self_edges = true;
        }
        if self.no_incoming {
            config.include_incoming = false;
        }
        config.validate().context("Invalid export config")?;
        Ok(config)
    }
}

fn load(db: &Path) -> anyhow::Result<(FactGraph, archdsm_core::LoadReport)> {
    load_fact_base(db).with_context(|| format!("Failed to load fact base {}", db.display()))
}

pub fn filter(input: &Path, output: &Path, force: bool) -> anyhow::Result<()> {
    tracing::info!("Filtering false positives: {} -> {}", input.display(), output.display());

    let (graph, _) = load(input)?;
    let classification = partition(&graph);
    let report = classification.report(&graph);
    report.log();

    let deleted = write_filtered_copy(input, output, &classification.removed_deps(), force)
        .with_context(|| format!("Failed to write filtered copy {}", output.display()))?;
    tracing::info!(
        "Filtered fact base written to {} ({} deps removed, {:.1}% reduction)",
        output.display(),
        deleted,
        report.reduction_percent
    );
    Ok(())
}

pub fn export(args: ExportArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let (raw, load_report) = load(&args.db)?;

    let (graph, classifier) = if args.filter_false_positives {
        let (filtered, classification) = filter_graph(&raw);
        let report = classification.report(&raw);
        report.log();
        (filtered, Some(report))
    } else {
        (raw, None)
    };

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create output directory {}", args.out.display()))?;

    let mut summary = RunSummary::new(&config, FactSummary::of(&graph));
    summary.load = Some(load_report);
    summary.classifier = classifier;

    let schemes: Vec<NamingScheme> = match args.scheme {
        Some(SchemeChoice::All) => NamingScheme::ALL.to_vec(),
        _ => vec![config.scheme],
    };
    let full = schemes
        .par_iter()
        .map(|&scheme| export_full(&graph, &config.with_scheme(scheme)).map(|result| (scheme, result)))
        .collect::<Result<Vec<_>, _>>()
        .context("Full export failed")?;
    for (scheme, (matrix, stats)) in full {
        let file_name = if schemes.len() > 1 {
            format!("{}.{}.json", FULL_OUTPUT, scheme)
        } else {
            format!("{}.json", FULL_OUTPUT)
        };
        let path = args.out.join(&file_name);
        matrix.write(&path).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Wrote {}", path.display());
        summary.add_export(file_name, &matrix, stats);
    }

    if args.file_level {
        let (matrix, stats) = export_file_level(&graph, &config).context("File-level export failed")?;
        let path = args.out.join(FILE_LEVEL_OUTPUT);
        matrix.write(&path).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Wrote {}", path.display());
        summary.add_export(FILE_LEVEL_OUTPUT, &matrix, stats);
    }

    if args.per_file {
        let dir = args.out.join(PER_FILE_DIR);
        let slices = export_per_file(&graph, &config).context("Per-file export failed")?;
        for slice in &slices {
            let path = dir.join(format!("{}.json", slice.stem));
            slice.matrix.write(&path).with_context(|| format!("Failed to write {}", path.display()))?;
            if let Some(clustering) = &slice.clustering {
                let path = dir.join(format!("{}.clustering.json", slice.stem));
                clustering.write(&path).with_context(|| format!("Failed to write {}", path.display()))?;
            }
            summary
                .per_file
                .insert(slice.file.clone(), archdsm_export::MatrixSummary::of(&slice.matrix));
        }
        tracing::info!("Wrote {} per-file matrices to {}", slices.len(), dir.display());
    }

    let path = args.out.join(SUMMARY_OUTPUT);
    summary.write(&path).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Run summary written to {}", path.display());
    Ok(())
}

pub fn summary(db: &Path) -> anyhow::Result<()> {
    let (graph, _) = load(db)?;
    let summary = FactSummary::of(&graph);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
