//! Focus scope: which files an export covers

use crate::config::ExportConfig;
use crate::error::ExportResult;
use crate::naming::file_group;
use archdsm_core::{EntityId, FileIndex};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled file filter for one export run.
#[derive(Debug, Clone)]
pub struct FocusScope {
    prefix: Option<String>,
    include_root_files: bool,
    root_files: GlobSet,
    /// Present only in aligned mode.
    initializers: Option<GlobSet>,
}

fn compile(patterns: &[String]) -> ExportResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

impl FocusScope {
    pub fn new(config: &ExportConfig) -> ExportResult<Self> {
        let initializers = compile(&config.package_initializers)?;
        Ok(Self {
            prefix: config.focus_prefix.clone().filter(|p| !p.is_empty()),
            include_root_files: config.include_root_files,
            root_files: compile(&config.root_file_patterns)?,
            initializers: config.align.then_some(initializers),
        })
    }

    pub fn is_package_initializer(&self, file_name: &str) -> bool {
        self.initializers
            .as_ref()
            .is_some_and(|set| set.is_match(file_name))
    }

    pub fn contains(&self, file_name: &str) -> bool {
        if self.is_package_initializer(file_name) {
            return false;
        }
        let Some(prefix) = &self.prefix else {
            return true;
        };
        if file_name.starts_with(prefix.as_str()) {
            return true;
        }
        self.include_root_files && !file_name.contains('/') && self.root_files.is_match(file_name)
    }

    /// In-focus files, package files first, each group sorted by path.
    pub fn focus_files<'a>(&self, files: &'a FileIndex) -> Vec<(&'a EntityId, &'a str)> {
        let mut focus: Vec<(&EntityId, &str)> = files
            .files()
            .into_iter()
            .filter(|(_, name)| self.contains(name))
            .collect();
        focus.sort_by(|a, b| {
            (file_group(a.1), a.1, a.0).cmp(&(file_group(b.1), b.1, b.0))
        });
        focus
    }
}
