//! Generator - rewrites every generated region of the token artifact.
//!
//! All sections are rendered in memory first. The artifact is written only
//! after every section succeeded, and only if the bytes changed.

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::format::format_table;
use crate::fsio::{self, FsError};
use crate::hashing::table_fingerprint;
use crate::manifest::{Manifest, ManifestError};
use crate::markers::{replace_region, MarkerError};
use crate::sections::Section;

pub const BANNER: &str = "/* AUTO-GENERATED FROM TOKEN MANIFEST - DO NOT EDIT */";

/// Indentation of generated lines and of the END marker that follows them.
const INDENT: &str = "  ";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Section {section}: {source}")]
    Marker {
        section: String,
        #[source]
        source: MarkerError,
    },

    #[error("Section {section}: failed to serialize token table: {source}")]
    Serialization {
        section: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] FsError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub name: String,
    pub tokens: usize,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Rendered {
    #[serde(skip)]
    pub text: String,
    pub sections: Vec<SectionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutcome {
    pub changed: bool,
    pub sections: Vec<SectionSummary>,
}

/// Banner, hash line, one line per token, then the indent for the END marker.
pub fn format_block(hash: &str, tokens: &[String]) -> String {
    let mut block = String::from("\n");
    block.push_str(&format!("{}{}\n", INDENT, BANNER));
    block.push_str(&format!("{}/* HASH: {} */\n", INDENT, hash));
    for token in tokens {
        block.push_str(INDENT);
        block.push_str(token);
        block.push('\n');
    }
    block.push_str(INDENT);
    block
}

pub struct Generator<'a> {
    sections: &'a [Section],
}

impl<'a> Generator<'a> {
    pub fn new(sections: &'a [Section]) -> Self {
        Self { sections }
    }

    /// Pure: compute the regenerated artifact text.
    pub fn render(&self, manifest: &Manifest, artifact: &str) -> Result<Rendered, GenerateError> {
        manifest.require(self.sections)?;

        let mut text = artifact.to_string();
        let mut sections = Vec::with_capacity(self.sections.len());

        for section in self.sections {
            let table = manifest.table_for(section)?;
            let tokens = format_table(table, &section.prefix);
            let hash = table_fingerprint(table).map_err(|source| GenerateError::Serialization {
                section: section.name.clone(),
                source,
            })?;

            let block = format_block(&hash, &tokens);
            text = replace_region(&text, &section.name, &block).map_err(|source| {
                GenerateError::Marker {
                    section: section.name.clone(),
                    source,
                }
            })?;

            tracing::debug!(section = %section.name, tokens = tokens.len(), %hash, "rendered section");
            sections.push(SectionSummary {
                name: section.name.clone(),
                tokens: tokens.len(),
                hash,
            });
        }

        Ok(Rendered { text, sections })
    }

    /// Regenerate the artifact on disk. Writes only when content changed.
    pub fn run(&self, manifest: &Manifest, artifact_path: &Path) -> Result<GenerateOutcome, GenerateError> {
        let current = fsio::read_text(artifact_path)?;
        let rendered = self.render(manifest, &current)?;

        let changed = rendered.text != current;
        if changed {
            fsio::write_atomic(artifact_path, &rendered.text)?;
            tracing::info!(path = %artifact_path.display(), "artifact regenerated");
        } else {
            tracing::info!(path = %artifact_path.display(), "artifact already up to date");
        }

        Ok(GenerateOutcome {
            changed,
            sections: rendered.sections,
        })
    }
}
