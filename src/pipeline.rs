//! Guard Pipeline - Single Entry Point
//!
//! Resolves configuration against an explicit project root once, then drives
//! generate / validate / migrate / check. Shared state (manifest, rename map)
//! is loaded per command and never mutated.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::compliance::{ComplianceError, ComplianceReport, ComplianceScanner};
use crate::config::{ConfigError, GuardConfig};
use crate::generator::{GenerateError, GenerateOutcome, Generator};
use crate::manifest::{Manifest, ManifestError};
use crate::migrate::{MigrateError, MigrateOptions, MigrationEngine, MigrationReport};
use crate::rename_map::{RenameMap, RenameMapError};
use crate::sections::Section;
use crate::validation::{DriftReport, ValidateError, Validator};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    RenameMap(#[from] RenameMapError),

    #[error(transparent)]
    Migrate(#[from] MigrateError),

    #[error(transparent)]
    Compliance(#[from] ComplianceError),
}

pub struct GuardPipeline {
    root: PathBuf,
    config: GuardConfig,
    sections: Vec<Section>,
}

impl GuardPipeline {
    pub fn new(root: impl Into<PathBuf>, config: GuardConfig) -> Self {
        let sections = config.sections();
        Self {
            root: root.into(),
            config,
            sections,
        }
    }

    /// Load `nexus-guard.json` (or the explicit config) under `root`.
    pub fn open(root: &Path, config_path: Option<&Path>) -> Result<Self, PipelineError> {
        let config = GuardConfig::load(root, config_path)?;
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.config.manifest)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.root.join(&self.config.artifact)
    }

    /// Load the manifest, requiring every table the active sections use.
    pub fn load_manifest(&self) -> Result<Manifest, PipelineError> {
        Ok(Manifest::load(&self.manifest_path(), &self.sections)?)
    }

    pub fn load_rename_map(&self) -> Result<RenameMap, PipelineError> {
        let map = match &self.config.rename_map {
            Some(path) => RenameMap::load(&self.root.join(path))?,
            None => RenameMap::builtin()?,
        };
        Ok(map)
    }

    pub fn generate(&self) -> Result<(Manifest, GenerateOutcome), PipelineError> {
        let manifest = self.load_manifest()?;
        let outcome = Generator::new(&self.sections).run(&manifest, &self.artifact_path())?;
        Ok((manifest, outcome))
    }

    /// Read-only.
    pub fn validate(&self) -> Result<DriftReport, PipelineError> {
        let manifest = self.load_manifest()?;
        Ok(Validator::new(&self.sections).validate_file(&manifest, &self.artifact_path())?)
    }

    pub fn migrate(&self, options: MigrateOptions) -> Result<MigrationReport, PipelineError> {
        // Only the raw palette is needed here, not the section tables.
        let manifest = Manifest::load(&self.manifest_path(), &[])?;
        let map = self.load_rename_map()?;
        let engine = MigrationEngine::new(&map, &manifest.raw_palette)?;

        let files = self.config.migrate.resolve(&self.root).collect();
        tracing::info!(files = files.files.len(), dry_run = options.dry_run, strict = options.strict, "starting migration");
        Ok(engine.run(&files, &self.root, options))
    }

    /// Read-only.
    pub fn check(&self) -> Result<ComplianceReport, PipelineError> {
        let manifest = Manifest::load(&self.manifest_path(), &[])?;
        let scanner = ComplianceScanner::new(&manifest.forbidden_patterns)?;

        let files = self.config.check.resolve(&self.root).collect();
        tracing::info!(files = files.files.len(), patterns = scanner.pattern_count(), "starting compliance scan");
        Ok(scanner.scan(&files, &self.root))
    }
}
