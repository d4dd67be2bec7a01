//! Nexus Guard - Design Token Single Source of Truth
//!
//! # The Laws (Non-Negotiable)
//! 1. The Manifest Is Truth
//! 2. Generated Regions Belong To The Generator, Nothing Else Does
//! 3. Drift Is Detected By Hash, Never By Eye
//! 4. Every Legacy Name Has An Explicit Mapping
//! 5. Unmapped Means Reported, Never Guessed

pub mod hashing;
pub mod manifest;
pub mod sections;
pub mod markers;
pub mod format;
pub mod fsio;
pub mod generator;
pub mod validation;
pub mod rename_map;
pub mod tree;
pub mod migrate;
pub mod compliance;
pub mod config;
pub mod pipeline;

pub use hashing::{canonical_json, fingerprint, table_fingerprint};
pub use manifest::{Manifest, ManifestError, RawPalette, TokenTable};
pub use sections::{Layout, Section};
pub use markers::{extract_hash, locate, replace_region, MarkerError, Region};
pub use generator::{GenerateError, GenerateOutcome, Generator};
pub use validation::{DriftReport, SectionCheck, SectionStatus, Validator};
pub use rename_map::RenameMap;
pub use migrate::{MigrateOptions, MigrationEngine, MigrationOutcome, MigrationReport};
pub use compliance::{ComplianceReport, ComplianceScanner, Violation};
pub use config::GuardConfig;
pub use pipeline::{GuardPipeline, PipelineError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
