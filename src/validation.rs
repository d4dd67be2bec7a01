//! Validation System - Drift Detection (read-only)
//!
//! Recomputes each section's fingerprint exactly as the generator does and
//! compares it with the hash recorded in the artifact.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::fsio::{self, FsError};
use crate::hashing::table_fingerprint;
use crate::manifest::{Manifest, ManifestError};
use crate::markers::{extract_hash, locate, MarkerError};
use crate::sections::Section;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionStatus {
    Ok { hash: String },
    Drift { expected: String, actual: String },
    Missing { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionCheck {
    pub section: String,
    #[serde(flatten)]
    pub status: SectionStatus,
}

impl SectionCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, SectionStatus::Ok { .. })
    }

    pub fn remediation(&self) -> Option<&'static str> {
        match self.status {
            SectionStatus::Ok { .. } => None,
            SectionStatus::Drift { .. } => Some("Run `nexus-guard generate` to synchronize"),
            SectionStatus::Missing { .. } => {
                Some("Add the section markers to the artifact, then run `nexus-guard generate`")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub manifest_version: String,
    pub sections: Vec<SectionCheck>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.sections.iter().all(SectionCheck::is_ok)
    }

    pub fn drift_count(&self) -> usize {
        self.sections.iter().filter(|c| !c.is_ok()).count()
    }

    pub fn status_of(&self, section: &str) -> Option<&SectionStatus> {
        self.sections
            .iter()
            .find(|c| c.section == section)
            .map(|c| &c.status)
    }
}

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Section {section}: {source}")]
    Structure {
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

/// Validator checks every section and never writes.
pub struct Validator<'a> {
    sections: &'a [Section],
}

impl<'a> Validator<'a> {
    pub fn new(sections: &'a [Section]) -> Self {
        Self { sections }
    }

    pub fn validate(&self, manifest: &Manifest, artifact: &str) -> Result<DriftReport, ValidateError> {
        let mut checks = vec![];

        for section in self.sections {
            let table = manifest.table_for(section)?;
            let expected = table_fingerprint(table).map_err(|source| ValidateError::Serialization {
                section: section.name.clone(),
                source,
            })?;

            let status = match locate(artifact, &section.name) {
                Ok(region) => match extract_hash(region.body(artifact)) {
                    Some(actual) if actual == expected => SectionStatus::Ok { hash: actual },
                    Some(actual) => SectionStatus::Drift { expected, actual },
                    None => SectionStatus::Missing { reason: "no HASH line in region".to_string() },
                },
                Err(e) if e.is_missing() => SectionStatus::Missing { reason: e.to_string() },
                Err(source) => {
                    return Err(ValidateError::Structure {
                        section: section.name.clone(),
                        source,
                    })
                }
            };

            tracing::debug!(section = %section.name, ?status, "validated section");
            checks.push(SectionCheck {
                section: section.name.clone(),
                status,
            });
        }

        Ok(DriftReport {
            manifest_version: manifest.version.to_string(),
            sections: checks,
        })
    }

    pub fn validate_file(&self, manifest: &Manifest, artifact_path: &Path) -> Result<DriftReport, ValidateError> {
        let artifact = fsio::read_text(artifact_path)?;
        self.validate(manifest, &artifact)
    }
}
