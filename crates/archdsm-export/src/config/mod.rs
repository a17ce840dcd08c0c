//! Export configuration, loaded from TOML and overridden by CLI flags

use crate::error::ExportResult;
use crate::naming::NamingScheme;
use crate::scope::FocusScope;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options shared by every export pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Naming scheme for matrix variables
    pub scheme: NamingScheme,
    /// Architecture alignment: core kinds only, strict shapes, unique edges
    pub align: bool,
    /// Only files whose path starts with this prefix are in focus
    pub focus_prefix: Option<String>,
    /// With a focus prefix, also keep top-level files matching `root_file_patterns`
    pub include_root_files: bool,
    pub root_file_patterns: Vec<String>,
    /// Package initializer files, dropped from the aligned view
    pub package_initializers: Vec<String>,
    /// Keep edges whose target entity lies outside the focus
    pub include_external_targets: bool,
    /// Keep file-level edges whose target file lies outside the focus
    pub include_external_target_files: bool,
    /// Keep file-level edges from a file to itself
    pub include_self_edges: bool,
    /// Per-file slices also carry edges coming into the file
    pub include_incoming: bool,
    /// The full matrix also carries file-to-file overview edges
    pub file_overview: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scheme: NamingScheme::Structured,
            align: false,
            focus_prefix: None,
            include_root_files: true,
            root_file_patterns: vec!["*.py".to_string()],
            package_initializers: vec!["**/__init__.py".to_string()],
            include_external_targets: true,
            include_external_target_files: true,
            include_self_edges: false,
            include_incoming: true,
            file_overview: true,
        }
    }
}

impl ExportConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ExportResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded export config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> ExportResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Check that every glob pattern compiles.
    pub fn validate(&self) -> ExportResult<()> {
        FocusScope::new(self)?;
        Ok(())
    }

    /// Same options under another naming scheme.
    pub fn with_scheme(&self, scheme: NamingScheme) -> Self {
        Self { scheme, ..self.clone() }
    }
}
