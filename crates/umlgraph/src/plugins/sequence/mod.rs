//! Sequence diagram plugin
//!
//! Parses lifelines, messages and control blocks. Message actions are
//! resolved against a [`TypeTable`] built from parsed class diagrams.

use crate::core::{Detector, DiagramKind, Dialect};
use std::sync::Arc;

mod detector;
mod document;
mod parser;
mod types;

pub use detector::*;
pub use document::*;
pub use parser::*;
pub use types::*;

/// Sequence diagram dialect
pub struct SequenceDialect;

impl Dialect for SequenceDialect {
    type Document = SequenceDiagram;
    type Parser = SequenceParser;

    fn detector() -> Arc<dyn Detector> {
        Arc::new(SequenceDetector::new())
    }

    fn create_parser() -> Self::Parser {
        SequenceParser::new()
    }

    fn create_document() -> Self::Document {
        SequenceDiagram::new()
    }

    fn kind() -> DiagramKind {
        DiagramKind::Sequence
    }

    fn version() -> &'static str {
        "0.1.0"
    }
}
