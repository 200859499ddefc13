use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::builder::ExtractOptions;
use crate::model::Variant;

/// Project configuration, read from `symex.toml` or `.symex/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SymexConfig {
    pub extract: ExtractConfig,
    pub discovery: DiscoveryPatterns,
}

/// The `[extract]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub report_unresolved: bool,
    /// Extra annotation names treated like `@Override`.
    pub override_annotations: Vec<String>,
    /// Variant for files whose extension does not tell.
    pub default_variant: Option<Variant>,
}

impl ExtractConfig {
    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            report_unresolved: self.report_unresolved,
            override_annotations: self.override_annotations.clone(),
        }
    }
}

/// The `[discovery]` section: glob patterns relative to the scanned root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscoveryPatterns {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Default config file names, searched in order.
const CONFIG_FILENAMES: &[&str] = &[".symex/config.toml", "symex.toml"];

/// Find the config file for a project.
///
/// An explicit `config_override` is used as is when it exists; otherwise the
/// default names are searched in `project_root`.
pub fn find_config_path(project_root: &Path, config_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(override_path) = config_override {
        if override_path.exists() {
            return Some(override_path.to_path_buf());
        }
        return None;
    }

    CONFIG_FILENAMES
        .iter()
        .map(|name| project_root.join(name))
        .find(|path| path.exists())
}

pub fn load_config(path: &Path) -> Result<SymexConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(toml_str: &str) -> Result<SymexConfig> {
    let config: SymexConfig = toml::from_str(toml_str)?;
    Ok(config)
}

/// Load the project's config, falling back to defaults when there is none.
/// A missing `--config` file is an error; a missing default file is not.
pub fn load_project_config(project_root: &Path, config_override: Option<&Path>) -> Result<SymexConfig> {
    match find_config_path(project_root, config_override) {
        Some(path) => load_config(&path),
        None => match config_override {
            Some(path) => anyhow::bail!("Config file not found: {}", path.display()),
            None => Ok(SymexConfig::default()),
        },
    }
}
