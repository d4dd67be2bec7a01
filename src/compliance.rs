//! Compliance Scanner
//!
//! Read-only scan for forbidden patterns from the token manifest. Runs on
//! every change, whether or not a migration ever happened.

use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fsio;
use crate::tree::{relative_to, SourceFiles};

/// Excerpts are cut to this many characters.
pub const EXCERPT_LEN: usize = 80;

#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("Token manifest declares no forbidden_patterns")]
    NoPatterns,

    #[error("Empty forbidden pattern")]
    EmptyPattern,

    #[error("Forbidden pattern {pattern:?} does not compile: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A manifest pattern and its compiled word-bounded form.
#[derive(Debug, Clone)]
pub struct ForbiddenPattern {
    pub raw: String,
    regex: Regex,
}

impl ForbiddenPattern {
    /// `*` means any run of non-whitespace and keeps the match case-sensitive;
    /// plain patterns match case-insensitively. Word boundaries are ASCII-only.
    pub fn compile(raw: &str) -> Result<Self, ComplianceError> {
        if raw.is_empty() {
            return Err(ComplianceError::EmptyPattern);
        }

        let source = if raw.contains('*') {
            let body = raw
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\S*");
            format!(r"(?-u:\b){}(?-u:\b)", body)
        } else {
            format!(r"(?i)(?-u:\b){}(?-u:\b)", regex::escape(raw))
        };

        let regex = Regex::new(&source).map_err(|source| ComplianceError::InvalidPattern {
            pattern: raw.to_string(),
            source,
        })?;
        Ok(Self { raw: raw.to_string(), regex })
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub file: PathBuf,
    pub line: usize,
    pub pattern: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplianceReport {
    pub files_scanned: usize,
    pub patterns: usize,
    pub violations: Vec<Violation>,
    pub errors: Vec<String>,
}

impl ComplianceReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.errors.is_empty()
    }

    /// Violations grouped by file, in scan order.
    pub fn by_file(&self) -> Vec<(&Path, Vec<&Violation>)> {
        let mut groups: Vec<(&Path, Vec<&Violation>)> = vec![];
        for v in &self.violations {
            let same_file = groups.last().map_or(false, |(file, _)| *file == v.file.as_path());
            match groups.last_mut() {
                Some((_, items)) if same_file => items.push(v),
                _ => groups.push((v.file.as_path(), vec![v])),
            }
        }
        groups
    }
}

fn excerpt(line: &str) -> String {
    line.trim().chars().take(EXCERPT_LEN).collect()
}

pub struct ComplianceScanner {
    patterns: Vec<ForbiddenPattern>,
}

impl ComplianceScanner {
    pub fn new(patterns: &[String]) -> Result<Self, ComplianceError> {
        if patterns.is_empty() {
            return Err(ComplianceError::NoPatterns);
        }
        let patterns = patterns
            .iter()
            .map(|p| ForbiddenPattern::compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// One violation per (line, pattern) pair; lines are 1-based.
    pub fn scan_text(&self, file: &Path, text: &str) -> Vec<Violation> {
        let mut violations = vec![];
        for (idx, line) in text.split('\n').enumerate() {
            for pattern in &self.patterns {
                if pattern.is_match(line) {
                    violations.push(Violation {
                        file: file.to_path_buf(),
                        line: idx + 1,
                        pattern: pattern.raw.clone(),
                        excerpt: excerpt(line),
                    });
                }
            }
        }
        violations
    }

    pub fn scan(&self, files: &SourceFiles, root: &Path) -> ComplianceReport {
        let mut report = ComplianceReport {
            patterns: self.patterns.len(),
            errors: files.errors.clone(),
            ..Default::default()
        };

        for path in &files.files {
            report.files_scanned += 1;
            let rel = relative_to(root, path);
            match fsio::read_text(path) {
                Ok(text) => {
                    let found = self.scan_text(&rel, &text);
                    if !found.is_empty() {
                        tracing::debug!(file = %rel.display(), violations = found.len(), "violations found");
                    }
                    report.violations.extend(found);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to scan file");
                    report.errors.push(e.to_string());
                }
            }
        }

        report
    }
}
