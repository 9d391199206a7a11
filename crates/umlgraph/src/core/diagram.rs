//! Dialect registry types
//!
//! [`DiagramKind`] names a dialect. [`Dialect`] bundles the detector, parser
//! and document constructors each dialect plugin provides.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::{DiagramError, Detector, Document, Parser};

/// The three supported dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    Class,
    Component,
    Sequence,
}

impl DiagramKind {
    pub fn all() -> &'static [DiagramKind] {
        &[
            DiagramKind::Class,
            DiagramKind::Component,
            DiagramKind::Sequence,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagramKind::Class => "class",
            DiagramKind::Component => "component",
            DiagramKind::Sequence => "sequence",
        }
    }

    /// Dialect implied by a `*class.puml`, `*component.puml` or `*seq.puml` name
    pub fn from_file_name(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        let stem = name.strip_suffix(".puml")?;
        if stem.ends_with("component") {
            Some(DiagramKind::Component)
        } else if stem.ends_with("class") {
            Some(DiagramKind::Class)
        } else if stem.ends_with("seq") || stem.ends_with("sequence") {
            Some(DiagramKind::Sequence)
        } else {
            None
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramKind {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "class" => Ok(DiagramKind::Class),
            "component" => Ok(DiagramKind::Component),
            "sequence" | "seq" => Ok(DiagramKind::Sequence),
            _ => Err(DiagramError::unknown_diagram_type(s)),
        }
    }
}

/// Core trait bundling one dialect's plugin pieces
pub trait Dialect: Send + Sync {
    /// The document type this dialect produces
    type Document: Document;

    /// The parser type for this dialect
    type Parser: Parser<Self::Document>;

    /// Get the detector for this dialect
    fn detector() -> Arc<dyn Detector>;

    /// Create a parser with default options
    fn create_parser() -> Self::Parser;

    /// Create an empty document
    fn create_document() -> Self::Document;

    fn kind() -> DiagramKind;

    /// Get the version of this dialect plugin
    fn version() -> &'static str;
}
