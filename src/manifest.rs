//! Token Manifest - the single source of truth
//!
//! Pure data: named token tables, forbidden patterns and the raw palette used
//! to recognise legacy color utilities. Loaded once per run and never mutated.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sections::{Layout, Section};

/// key -> value
pub type FlatTable = IndexMap<String, String>;

/// scale -> step -> value
pub type ScaledTable = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenTable {
    Flat(FlatTable),
    Scaled(ScaledTable),
}

impl TokenTable {
    pub fn is_empty(&self) -> bool {
        match self {
            TokenTable::Flat(t) => t.is_empty(),
            TokenTable::Scaled(t) => t.is_empty(),
        }
    }

    /// An empty table deserializes as `Flat` and fits either layout.
    pub fn fits(&self, layout: Layout) -> bool {
        match (self, layout) {
            (TokenTable::Flat(_), Layout::Flat) => true,
            (TokenTable::Scaled(_), Layout::Scaled) => true,
            _ => self.is_empty(),
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            TokenTable::Flat(_) => Layout::Flat,
            TokenTable::Scaled(_) => Layout::Scaled,
        }
    }
}

/// Utility prefixes and palette names that make up a raw (non-token) color
/// class such as `bg-gray-500`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPalette {
    #[serde(default)]
    pub utilities: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

impl RawPalette {
    pub fn is_empty(&self) -> bool {
        self.utilities.is_empty() || self.names.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: semver::Version,
    #[serde(default)]
    pub tables: IndexMap<String, TokenTable>,
    #[serde(default)]
    pub forbidden_patterns: Vec<String>,
    #[serde(default)]
    pub raw_palette: RawPalette,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Cannot find token manifest at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read token manifest {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse token manifest {path}: {source}")]
    Unparsable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing token table: {0}")]
    MissingTable(String),

    #[error("Token table {table} has {actual:?} layout, section {section} expects {expected:?}")]
    LayoutMismatch {
        section: String,
        table: String,
        expected: Layout,
        actual: Layout,
    },
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load and check that every table the given sections need is present.
    pub fn load(path: &Path, sections: &[Section]) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_json(&content).map_err(|source| ManifestError::Unparsable {
            path: path.to_path_buf(),
            source,
        })?;
        manifest.require(sections)?;

        tracing::debug!(
            path = %path.display(),
            version = %manifest.version,
            tables = manifest.tables.len(),
            "loaded token manifest"
        );
        Ok(manifest)
    }

    pub fn require(&self, sections: &[Section]) -> Result<(), ManifestError> {
        for section in sections {
            let table = self.table_for(section)?;
            if !table.fits(section.layout) {
                return Err(ManifestError::LayoutMismatch {
                    section: section.name.clone(),
                    table: section.table.clone(),
                    expected: section.layout,
                    actual: table.layout(),
                });
            }
        }
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&TokenTable> {
        self.tables.get(name)
    }

    pub fn table_for(&self, section: &Section) -> Result<&TokenTable, ManifestError> {
        self.table(&section.table)
            .ok_or_else(|| ManifestError::MissingTable(section.table.clone()))
    }
}
