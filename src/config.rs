//! Project Configuration
//!
//! Optional `nexus-guard.json` at the project root. Every path in it is
//! relative to the root, which is resolved once at startup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sections::Section;
use crate::tree::SourceTree;

pub const CONFIG_FILE: &str = "nexus-guard.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_artifact")]
    pub artifact: PathBuf,
    /// `None` uses the built-in rename map.
    #[serde(default)]
    pub rename_map: Option<PathBuf>,
    /// `None` uses [`Section::standard`].
    #[serde(default)]
    pub sections: Option<Vec<Section>>,
    #[serde(default = "default_migrate_tree")]
    pub migrate: TreeConfig,
    #[serde(default = "default_check_tree")]
    pub check: TreeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeConfig {
    pub roots: Vec<PathBuf>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_manifest() -> PathBuf { PathBuf::from("ui/canonical.json") }
fn default_artifact() -> PathBuf { PathBuf::from("ui/input.css") }

fn default_extensions() -> Vec<String> {
    ["tsx", "ts", "jsx", "js", "css"].iter().map(|s| s.to_string()).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_migrate_tree() -> TreeConfig {
    TreeConfig {
        roots: vec![PathBuf::from("apps/portal"), PathBuf::from("ui/dashboard")],
        extensions: default_extensions(),
        exclude: strings(&["node_modules", ".next", ".git", "dist", "build", "coverage", "*.d.ts"]),
    }
}

fn default_check_tree() -> TreeConfig {
    TreeConfig {
        roots: vec![PathBuf::from("apps/portal"), PathBuf::from("ui"), PathBuf::from("packages")],
        extensions: default_extensions(),
        exclude: strings(&[
            "node_modules", ".next", "dist", "coverage", ".turbo",
            "canonical.json", "rename_map.json", "style.css",
        ]),
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            artifact: default_artifact(),
            rename_map: None,
            sections: None,
            migrate: default_migrate_tree(),
            check: default_check_tree(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot find config file {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Unparsable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl GuardConfig {
    /// An explicit path must exist; otherwise `<root>/nexus-guard.json` is
    /// used when present and the defaults when not.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => {
                let p = root.join(p);
                if !p.exists() {
                    return Err(ConfigError::NotFound(p));
                }
                p
            }
            None => {
                let p = root.join(CONFIG_FILE);
                if !p.exists() {
                    tracing::debug!(root = %root.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                p
            }
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
            path: path.clone(),
            source,
        })?;
        let config = serde_json::from_str(&content)
            .map_err(|source| ConfigError::Unparsable { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn sections(&self) -> Vec<Section> {
        self.sections.clone().unwrap_or_else(Section::standard)
    }
}

impl TreeConfig {
    pub fn resolve(&self, root: &Path) -> SourceTree {
        SourceTree {
            roots: self.roots.iter().map(|r| root.join(r)).collect(),
            extensions: self.extensions.clone(),
            exclude: self.exclude.clone(),
        }
    }
}
