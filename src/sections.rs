//! Generated sections of the token artifact.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// key -> value
    Flat,
    /// scale -> step -> value (color primitives)
    Scaled,
}

/// A marker-delimited region bound to one manifest table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub table: String,
    pub prefix: String,
    #[serde(default = "default_layout")]
    pub layout: Layout,
}

fn default_layout() -> Layout { Layout::Flat }

impl Section {
    /// Flat section whose table shares the section name.
    pub fn flat(name: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            table: name.to_string(),
            prefix: prefix.to_string(),
            layout: Layout::Flat,
        }
    }

    pub fn scaled(name: &str, prefix: &str) -> Self {
        Self {
            layout: Layout::Scaled,
            ..Self::flat(name, prefix)
        }
    }

    /// The declared section order of `ui/input.css`.
    pub fn standard() -> Vec<Section> {
        vec![
            Section::scaled("COLOR_PRIMITIVES", "--nx-"),
            Section::flat("SEMANTICS", "--color-nx-"),
            Section::flat("TYPOGRAPHY", "--nx-"),
            Section::flat("SPACING", "--nx-space-"),
            Section::flat("SPACING_SEMANTIC", "--nx-space-"),
            Section::flat("SIZING", "--nx-"),
            Section::flat("RADIUS", "--nx-radius-"),
            Section::flat("BORDER", "--nx-border-"),
            Section::flat("SHADOW", "--nx-shadow-"),
            Section::flat("ZINDEX", "--nx-z-"),
            Section::flat("MOTION", "--nx-"),
            Section::flat("BREAKPOINTS", "--nx-bp-"),
        ]
    }
}
