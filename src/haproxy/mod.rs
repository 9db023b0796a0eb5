//! HAProxy configuration model
//!
//! This module defines the emitted configuration units (frontend and backend
//! sections) and their serialization, plus the synthesis and change-detection
//! submodules.

pub mod gate;
pub mod synth;

use std::fmt;

// Re-export commonly used types and functions
pub use gate::{FingerprintGate, GateDecision};
pub use synth::{build_sections, render, RenderedConfig};

/// Kind of an emitted configuration section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Frontend,
    Backend,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frontend => write!(f, "frontend"),
            Self::Backend => write!(f, "backend"),
        }
    }
}

/// One emitted configuration unit.
///
/// Section names are derived deterministically (`<base-domain>-<port>` for
/// backends, `dyna-frontend-<port>` for frontends) and unique within a
/// synthesis pass, so re-synthesis from identical inputs is byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub name: String,
    pub attributes: Vec<String>,
}

impl Section {
    pub fn new(kind: SectionKind, name: impl Into<String>, attributes: Vec<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            attributes,
        }
    }

    pub fn push_attribute(&mut self, attribute: impl Into<String>) {
        self.attributes.push(attribute.into());
    }

    /// Append the rendered section: a leading blank line, `<kind> <name>`,
    /// then each attribute indented by two spaces, newline-terminated.
    pub fn serialize_into(&self, out: &mut String) {
        out.push('\n');
        out.push_str(&format!("{} {}\n", self.kind, self.name));
        for attribute in &self.attributes {
            out.push_str(&format!("  {}\n", attribute));
        }
    }
}
