//! File I/O helpers shared by the generator and the migration engine.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn read_text(path: &Path) -> Result<String, FsError> {
    fs::read_to_string(path).map_err(|source| FsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write through a temp file in the target directory, then rename over the
/// target. Readers see either the old or the new content, never a prefix.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), FsError> {
    let wrap = |source: io::Error| FsError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(wrap)?;
    temp.write_all(content.as_bytes()).map_err(wrap)?;
    temp.as_file().sync_all().map_err(wrap)?;

    // Keep the permissions of the file being replaced.
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(temp.path(), meta.permissions()).map_err(wrap)?;
    }

    temp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(())
}
