//! `gilt.json` configuration
//!
//! Every field is optional:
//!
//! ```json
//! { "searchDirs": ["/usr/share/gir-1.0"], "extension": "json", "ignore": ["Gtk-2.0"] }
//! ```

use anyhow::{Context, Result};
use gilt_resolve::{IgnoreStore, ResolveError, ResolveResult};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "gilt.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub search_dirs: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub ignore: Vec<String>,
}

/// A [`Config`] bound to the file it was read from
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    pub config: Config,
}

impl ConfigFile {
    /// Read `path`, or start from defaults when it does not exist
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config {}", path.display()))?
        } else {
            Config::default()
        };
        Ok(Self { path, config })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.config)?;
        fs::write(&self.path, json + "\n")
            .with_context(|| format!("Failed to write config {}", self.path.display()))
    }
}

impl IgnoreStore for ConfigFile {
    fn load_ignored(&self) -> ResolveResult<Vec<String>> {
        Ok(self.config.ignore.clone())
    }

    fn persist_ignored(&mut self, names: &[String]) -> ResolveResult<()> {
        let merged: IndexSet<String> = self
            .config
            .ignore
            .iter()
            .chain(names)
            .cloned()
            .collect();
        self.config.ignore = merged.into_iter().collect();
        self.save()
            .map_err(|e| ResolveError::Store(format!("{:#}", e)))?;
        tracing::info!("Saved ignore list to {}", self.path.display());
        Ok(())
    }
}
