//! Migration Engine - SCAN -> MATCH -> REPLACE -> VERIFY
//!
//! Each file goes through six phases in a fixed order; every phase sees the
//! text left by the previous one:
//!
//! 1. contextual multi-token patterns
//! 2. legacy class map (whole tokens, longest first)
//! 3. raw value map (whole tokens, longest first)
//! 4. legacy class map again, in selector position (`.na-card {`)
//! 5. import specifiers
//! 6. residual detection on the result
//!
//! Anything still matching a legacy convention after phase 5 is reported.
//! No silent skips, no best guess, no partial replacement.

use regex::{NoExpand, Regex};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fsio;
use crate::manifest::RawPalette;
use crate::rename_map::{RenameMap, RenameMapError};
use crate::tree::{relative_to, SourceFiles};

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    RenameMap(#[from] RenameMapError),

    #[error("Invalid residual detection pattern: {0}")]
    Detector(#[from] regex::Error),
}

/// Recognises tokens that still follow a legacy convention.
#[derive(Debug, Clone)]
pub struct ResidualDetector {
    legacy: Regex,
    raw: Option<Regex>,
}

impl ResidualDetector {
    /// Boundaries are ASCII-only: `ñna-card` still contains `na-card`.
    pub fn new(legacy_prefix: &str, palette: &RawPalette) -> Result<Self, regex::Error> {
        let legacy = Regex::new(&format!(r"(?-u:\b){}[a-z0-9-]+", regex::escape(legacy_prefix)))?;

        let raw = if palette.is_empty() {
            None
        } else {
            let alternation = |items: &[String]| {
                items.iter().map(|s| regex::escape(s)).collect::<Vec<_>>().join("|")
            };
            Some(Regex::new(&format!(
                r"(?-u:\b)(?:{})-(?:{})-\d+(?:/\d+)?",
                alternation(&palette.utilities),
                alternation(&palette.names)
            ))?)
        };

        Ok(Self { legacy, raw })
    }

    /// Unique matches in first-occurrence order; legacy tokens before raw values.
    pub fn detect(&self, text: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut found = vec![];
        let raw_matches = self.raw.iter().flat_map(|re| re.find_iter(text));
        for m in self.legacy.find_iter(text).chain(raw_matches) {
            if seen.insert(m.as_str()) {
                found.push(m.as_str().to_string());
            }
        }
        found
    }
}

/// Quote, backtick, whitespace, `{` or `$` before a class token.
fn class_open(c: Option<char>) -> bool {
    matches!(c, Some(c) if c == '"' || c == '\'' || c == '`' || c == '{' || c == '$' || c.is_whitespace())
}

/// Quote, backtick, whitespace, `}` or `$` after a class token.
fn class_close(c: Option<char>) -> bool {
    matches!(c, Some(c) if c == '"' || c == '\'' || c == '`' || c == '}' || c == '$' || c.is_whitespace())
}

fn selector_open(_: Option<char>) -> bool {
    true
}

/// Characters that may end a class selector.
fn selector_close(c: Option<char>) -> bool {
    matches!(c, Some(c) if c.is_whitespace() || ",{:#[]>+~)".contains(c))
}

/// Replace every occurrence of `needle` whose neighbours satisfy both checks.
/// A rejected candidate advances the search by one character, so an
/// occurrence overlapping a rejected one is still considered.
pub fn replace_bounded(
    text: &str,
    needle: &str,
    replacement: &str,
    before: fn(Option<char>) -> bool,
    after: fn(Option<char>) -> bool,
) -> (String, usize) {
    if needle.is_empty() {
        return (text.to_string(), 0);
    }

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search = 0;
    let mut count = 0;

    while let Some(offset) = text[search..].find(needle) {
        let start = search + offset;
        let end = start + needle.len();
        let prev = text[..start].chars().next_back();
        let next = text[end..].chars().next();

        if before(prev) && after(next) {
            out.push_str(&text[copied..start]);
            out.push_str(replacement);
            copied = end;
            search = end;
            count += 1;
        } else {
            search = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
    }

    if count == 0 {
        return (text.to_string(), 0);
    }
    out.push_str(&text[copied..]);
    (out, count)
}

fn longest_first(map: &indexmap::IndexMap<String, String>) -> Vec<(String, String)> {
    let mut rules: Vec<(String, String)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    // stable: equal lengths keep declaration order
    rules.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    rules
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MigrateOptions {
    /// Report only; never write.
    pub dry_run: bool,
    /// Unmapped patterns fail the run.
    pub strict: bool,
}

/// Result of rewriting one text in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMigration {
    pub content: String,
    pub replacements: usize,
    pub unmapped: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileMigration {
    pub file: PathBuf,
    pub replacements: usize,
    pub unmapped: Vec<String>,
    pub errors: Vec<String>,
    pub written: bool,
}

impl FileMigration {
    fn new(file: PathBuf) -> Self {
        Self {
            file,
            replacements: 0,
            unmapped: vec![],
            errors: vec![],
            written: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Every legacy pattern was migrated.
    Completed,
    /// Unmapped patterns remain; tolerated outside strict mode.
    CompletedWithWarnings,
    /// Unmapped patterns in strict mode.
    FailedUnmapped,
    /// A file could not be read or written.
    FailedErrors,
}

impl MigrationOutcome {
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Completed | Self::CompletedWithWarnings => 0,
            Self::FailedUnmapped | Self::FailedErrors => 1,
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Completed => "Migration complete: all patterns migrated",
            Self::CompletedWithWarnings => "Migration complete with warnings: some patterns unmapped",
            Self::FailedUnmapped => "Migration failed: unmapped patterns found (strict mode)",
            Self::FailedErrors => "Migration failed: errors occurred",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub strict: bool,
    pub files_scanned: usize,
    pub total_replacements: usize,
    pub files: Vec<FileMigration>,
    pub files_with_unmapped: Vec<PathBuf>,
    pub unmapped: BTreeSet<String>,
    pub errors: Vec<String>,
}

impl MigrationReport {
    fn new(options: MigrateOptions) -> Self {
        Self {
            dry_run: options.dry_run,
            strict: options.strict,
            files_scanned: 0,
            total_replacements: 0,
            files: vec![],
            files_with_unmapped: vec![],
            unmapped: BTreeSet::new(),
            errors: vec![],
        }
    }

    fn record(&mut self, file: FileMigration) {
        self.files_scanned += 1;
        self.total_replacements += file.replacements;
        if !file.unmapped.is_empty() {
            self.files_with_unmapped.push(file.file.clone());
            self.unmapped.extend(file.unmapped.iter().cloned());
        }
        self.errors.extend(
            file.errors
                .iter()
                .map(|e| format!("{}: {}", file.file.display(), e)),
        );
        self.files.push(file);
    }

    pub fn outcome(&self) -> MigrationOutcome {
        if self.strict && !self.unmapped.is_empty() {
            MigrationOutcome::FailedUnmapped
        } else if !self.errors.is_empty() {
            MigrationOutcome::FailedErrors
        } else if !self.unmapped.is_empty() {
            MigrationOutcome::CompletedWithWarnings
        } else {
            MigrationOutcome::Completed
        }
    }
}

pub struct MigrationEngine {
    contextual: Vec<(Regex, String)>,
    classes: Vec<(String, String)>,
    raw_values: Vec<(String, String)>,
    imports: Vec<(String, String)>,
    detector: ResidualDetector,
}

impl MigrationEngine {
    /// Verifies the map against the detector before accepting it.
    pub fn new(map: &RenameMap, palette: &RawPalette) -> Result<Self, MigrateError> {
        let detector = ResidualDetector::new(&map.legacy_prefix, palette)?;
        map.verify(&detector)?;

        Ok(Self {
            contextual: map.compile_contextual()?,
            classes: longest_first(&map.classes),
            raw_values: longest_first(&map.raw_values),
            imports: map.imports.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            detector,
        })
    }

    pub fn migrate_text(&self, content: &str) -> TextMigration {
        let mut text = content.to_string();
        let mut replacements = 0;

        for (pattern, replacement) in &self.contextual {
            let n = pattern.find_iter(&text).count();
            if n > 0 {
                text = pattern.replace_all(&text, NoExpand(replacement)).into_owned();
                replacements += n;
            }
        }

        for (old, new) in self.classes.iter().chain(&self.raw_values) {
            let (next, n) = replace_bounded(&text, old, new, class_open, class_close);
            text = next;
            replacements += n;
        }

        for (old, new) in &self.classes {
            let (next, n) = replace_bounded(
                &text,
                &format!(".{}", old),
                &format!(".{}", new),
                selector_open,
                selector_close,
            );
            text = next;
            replacements += n;
        }

        for (old, new) in &self.imports {
            let n = text.matches(old.as_str()).count();
            if n > 0 {
                text = text.replace(old.as_str(), new);
                replacements += n;
            }
        }

        let unmapped = self.detector.detect(&text);
        TextMigration {
            content: text,
            replacements,
            unmapped,
        }
    }

    /// Migrate one file; I/O failures are recorded, never raised.
    pub fn migrate_file(&self, path: &Path, rel: PathBuf, options: MigrateOptions) -> FileMigration {
        let mut result = FileMigration::new(rel);

        let content = match fsio::read_text(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable file");
                result.errors.push(e.to_string());
                return result;
            }
        };

        let migrated = self.migrate_text(&content);
        result.replacements = migrated.replacements;
        result.unmapped = migrated.unmapped;

        if migrated.content != content && !options.dry_run {
            match fsio::write_atomic(path, &migrated.content) {
                Ok(()) => {
                    result.written = true;
                    tracing::info!(file = %result.file.display(), replacements = result.replacements, "migrated file");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to write migrated file");
                    result.errors.push(e.to_string());
                }
            }
        }

        result
    }

    pub fn run(&self, files: &SourceFiles, root: &Path, options: MigrateOptions) -> MigrationReport {
        let mut report = MigrationReport::new(options);
        report.errors.extend(files.errors.iter().cloned());

        for path in &files.files {
            let file = self.migrate_file(path, relative_to(root, path), options);
            tracing::debug!(
                file = %file.file.display(),
                replacements = file.replacements,
                unmapped = file.unmapped.len(),
                "processed file"
            );
            report.record(file);
        }

        report
    }
}
