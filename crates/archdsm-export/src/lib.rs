//! archdsm export: canonical naming, edge filtering and DSM assembly

pub mod align;
pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod matrix;
pub mod naming;
pub mod scope;
pub mod summary;


pub use align::{AlignmentFilter, AlignmentReport, DropReason, shape_allowed};
pub use classifier::{Classification, ClassifierReport, FalsePositiveReason, classify, filter_graph, partition};
pub use config::ExportConfig;
pub use error::{ExportError, ExportResult};
pub use export::{ExportStats, FileMatrix, FILE_LEVEL_MATRIX_NAME, FULL_MATRIX_NAME, export_file_level, export_full, export_per_file};
pub use matrix::{Cell, ClusterNode, Clustering, DependencyMatrix, MatrixBuilder, NodeOrder};
pub use naming::{ClassFolders, NameResolver, NamingScheme, Node, SortKey, display_name};
pub use scope::FocusScope;
pub use summary::{FactSummary, MatrixSummary, RunSummary};
