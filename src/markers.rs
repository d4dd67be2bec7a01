//! Marker Locator
//!
//! Finds `/* NX:<SECTION>:START */ ... /* NX:<SECTION>:END */` regions in an
//! artifact. Only the literal marker strings are recognised; the surrounding
//! text is never parsed.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Start,
    End,
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerKind::Start => write!(f, "START"),
            MarkerKind::End => write!(f, "END"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    #[error("Missing marker: /* NX:{section}:{kind} */")]
    Missing { section: String, kind: MarkerKind },

    #[error("Duplicate marker: /* NX:{section}:{kind} */ occurs more than once")]
    Duplicate { section: String, kind: MarkerKind },

    #[error("Invalid marker order: /* NX:{section}:END */ precedes its START marker")]
    Inverted { section: String },
}

impl MarkerError {
    pub fn is_missing(&self) -> bool {
        matches!(self, MarkerError::Missing { .. })
    }
}

/// The START/END literals for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPair {
    pub start: String,
    pub end: String,
}

impl MarkerPair {
    pub fn for_section(name: &str) -> Self {
        Self {
            start: format!("/* NX:{}:START */", name),
            end: format!("/* NX:{}:END */", name),
        }
    }
}

/// Byte range of a region body, strictly between the two markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub fn body<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

pub fn locate(text: &str, section: &str) -> Result<Region, MarkerError> {
    let pair = MarkerPair::for_section(section);
    let start_idx = find_once(text, &pair.start, section, MarkerKind::Start)?;
    let end_idx = find_once(text, &pair.end, section, MarkerKind::End)?;

    let body_start = start_idx + pair.start.len();
    if end_idx < body_start {
        return Err(MarkerError::Inverted { section: section.to_string() });
    }

    Ok(Region { start: body_start, end: end_idx })
}

fn find_once(text: &str, marker: &str, section: &str, kind: MarkerKind) -> Result<usize, MarkerError> {
    let idx = text.find(marker).ok_or_else(|| MarkerError::Missing {
        section: section.to_string(),
        kind,
    })?;
    if text[idx + marker.len()..].contains(marker) {
        return Err(MarkerError::Duplicate { section: section.to_string(), kind });
    }
    Ok(idx)
}

/// Replace the body of a section's region, leaving both markers and
/// everything outside the region untouched.
pub fn replace_region(text: &str, section: &str, body: &str) -> Result<String, MarkerError> {
    let region = locate(text, section)?;
    let mut out = String::with_capacity(text.len() - (region.end - region.start) + body.len());
    out.push_str(&text[..region.start]);
    out.push_str(body);
    out.push_str(&text[region.end..]);
    Ok(out)
}

fn hash_line() -> &'static Regex {
    static HASH_LINE: OnceLock<Regex> = OnceLock::new();
    HASH_LINE.get_or_init(|| {
        Regex::new(r"/\* HASH: (sha256-[a-f0-9]+) \*/").expect("hash line pattern is valid")
    })
}

/// The `/* HASH: sha256-... */` value recorded in a region body.
pub fn extract_hash(body: &str) -> Option<String> {
    hash_line()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
