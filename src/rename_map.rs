//! Rename Map - the migration law book
//!
//! Explicit, exhaustive tables from legacy names to canonical ones. Pure data:
//! no rule is ever inferred at run time. The built-in map is embedded from
//! `data/rename_map.json`; a project may point at its own file instead.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use crate::migrate::ResidualDetector;

const BUILTIN: &str = include_str!("../data/rename_map.json");

/// Multi-token pattern, applied before the single-token phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextualRule {
    pub name: String,
    pub pattern: String,
    /// Inserted literally; `$` is not expanded.
    pub replacement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameMap {
    /// Prefix of the legacy class convention, e.g. `na-`.
    pub legacy_prefix: String,
    #[serde(default)]
    pub classes: IndexMap<String, String>,
    #[serde(default)]
    pub raw_values: IndexMap<String, String>,
    #[serde(default)]
    pub imports: IndexMap<String, String>,
    #[serde(default)]
    pub contextual: Vec<ContextualRule>,
    /// Whitelist of token utilities a rule may produce.
    #[serde(default)]
    pub canonical_classes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RenameMapError {
    #[error("Cannot find rename map at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read rename map {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse rename map: {0}")]
    Unparsable(#[from] serde_json::Error),

    #[error("Contextual rule {name}: invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rename map has {} invalid target(s): {}", .0.len(), summarize(.0))]
    InvalidTargets(Vec<InvalidTarget>),
}

/// A rule whose target is not a canonical class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidTarget {
    pub rule: String,
    pub class: String,
    pub reason: &'static str,
}

fn summarize(targets: &[InvalidTarget]) -> String {
    targets
        .iter()
        .map(|t| format!("{} -> {} ({})", t.rule, t.class, t.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

fn token_utility() -> &'static Regex {
    static TOKEN_UTILITY: OnceLock<Regex> = OnceLock::new();
    TOKEN_UTILITY.get_or_init(|| {
        Regex::new(r"^[a-z][a-z-]*-nx-[a-z0-9-]+$").expect("token utility pattern is valid")
    })
}

/// `hover:bg-nx-surface` -> `bg-nx-surface`
fn strip_variants(class: &str) -> &str {
    class.rsplit(':').next().unwrap_or(class)
}

impl RenameMap {
    pub fn builtin() -> Result<Self, RenameMapError> {
        Ok(serde_json::from_str(BUILTIN)?)
    }

    pub fn load(path: &Path) -> Result<Self, RenameMapError> {
        if !path.exists() {
            return Err(RenameMapError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| RenameMapError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every target class must be canonical: not legacy, not a raw palette
    /// color, and whitelisted if it is a token utility.
    pub fn verify(&self, detector: &ResidualDetector) -> Result<(), RenameMapError> {
        let whitelist: HashSet<&str> = self.canonical_classes.iter().map(String::as_str).collect();
        let mut invalid = vec![];

        let rules = self
            .classes
            .iter()
            .chain(&self.raw_values)
            .map(|(old, new)| (old.as_str(), new.as_str()))
            .chain(self.contextual.iter().map(|r| (r.name.as_str(), r.replacement.as_str())));

        for (rule, target) in rules {
            for class in target.split_whitespace() {
                let reason = if !detector.detect(class).is_empty() {
                    Some("legacy or raw palette class")
                } else if token_utility().is_match(strip_variants(class)) && !whitelist.contains(class) {
                    Some("token utility not in canonical_classes")
                } else {
                    None
                };

                if let Some(reason) = reason {
                    invalid.push(InvalidTarget {
                        rule: rule.to_string(),
                        class: class.to_string(),
                        reason,
                    });
                }
            }
        }

        for (old, new) in &self.imports {
            if !detector.detect(new).is_empty() {
                invalid.push(InvalidTarget {
                    rule: old.clone(),
                    class: new.clone(),
                    reason: "legacy import target",
                });
            }
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(RenameMapError::InvalidTargets(invalid))
        }
    }

    pub fn compile_contextual(&self) -> Result<Vec<(Regex, String)>, RenameMapError> {
        self.contextual
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.replacement.clone()))
                    .map_err(|source| RenameMapError::InvalidPattern {
                        name: rule.name.clone(),
                        source,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::RawPalette;

    fn detector() -> ResidualDetector {
        let palette = RawPalette {
            utilities: vec!["bg".into(), "text".into(), "border".into()],
            names: vec!["gray".into(), "red".into()],
        };
        ResidualDetector::new("na-", &palette).unwrap()
    }

    fn map(classes: &[(&str, &str)]) -> RenameMap {
        RenameMap {
            legacy_prefix: "na-".into(),
            classes: classes.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect(),
            raw_values: IndexMap::new(),
            imports: IndexMap::new(),
            contextual: vec![],
            canonical_classes: vec!["bg-nx-surface".into(), "hover:bg-nx-surface".into()],
        }
    }

    #[test]
    fn test_builtin_map_parses_and_verifies() {
        let map = RenameMap::builtin().unwrap();
        assert_eq!(map.legacy_prefix, "na-");
        assert!(!map.classes.is_empty());
        assert!(!map.raw_values.is_empty());
        map.verify(&ResidualDetector::new(&map.legacy_prefix, &RawPalette::default()).unwrap())
            .unwrap();
        assert_eq!(map.compile_contextual().unwrap().len(), map.contextual.len());
    }

    #[test]
    fn test_whitelisted_targets_pass() {
        let m = map(&[("na-bg-paper", "bg-nx-surface"), ("na-flex", "flex"), ("na-x", "hover:bg-nx-surface p-4")]);
        m.verify(&detector()).unwrap();
    }

    #[test]
    fn test_unlisted_token_utility_rejected() {
        let m = map(&[("na-bg-muted", "bg-nx-mystery")]);
        match m.verify(&detector()) {
            Err(RenameMapError::InvalidTargets(t)) => assert_eq!(t[0].class, "bg-nx-mystery"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_legacy_and_raw_targets_rejected() {
        let m = map(&[("na-a", "na-b"), ("na-c", "bg-gray-100")]);
        match m.verify(&detector()) {
            Err(RenameMapError::InvalidTargets(t)) => assert_eq!(t.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_contextual_pattern() {
        let mut m = map(&[]);
        m.contextual.push(ContextualRule {
            name: "broken".into(),
            pattern: "na-(".into(),
            replacement: "x".into(),
        });
        assert!(matches!(m.compile_contextual(), Err(RenameMapError::InvalidPattern { .. })));
    }
}
