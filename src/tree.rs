//! Source tree discovery for the migration engine and the compliance scanner.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Roots, an extension allow-list and an exclusion list.
///
/// Exclusion entries match any path component exactly (`node_modules`,
/// `.git`); entries starting with `*` match a file-name suffix (`*.d.ts`).
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    pub roots: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
}

/// Files found plus every walk error, so nothing is dropped silently.
#[derive(Debug, Clone, Default)]
pub struct SourceFiles {
    pub files: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl SourceTree {
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|pattern| match pattern.strip_prefix('*') {
            Some(suffix) => name.ends_with(suffix),
            None => name == pattern,
        })
    }

    pub fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&e))
            })
            .unwrap_or(false)
    }

    pub fn collect(&self) -> SourceFiles {
        let mut found = SourceFiles::default();

        for root in &self.roots {
            if !root.exists() {
                tracing::warn!(root = %root.display(), "scan root does not exist, skipping");
                continue;
            }

            let walker = WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    e.depth() == 0 || !e.file_name().to_str().map_or(false, |n| self.is_excluded(n))
                });

            for entry in walker {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to walk source tree");
                        found.errors.push(format!("Failed to walk {}: {}", root.display(), e));
                        continue;
                    }
                };
                if entry.file_type().is_file() && self.has_allowed_extension(entry.path()) {
                    found.files.push(entry.into_path());
                }
            }
        }

        found.files.sort();
        found.files.dedup();
        tracing::debug!(files = found.files.len(), "collected source files");
        found
    }
}

/// Path for display, relative to the project root when possible.
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
