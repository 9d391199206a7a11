//! Class diagram plugin
//!
//! Parses class, interface, enum and struct declarations, their members and
//! the inheritance and composition arrows between them.

use crate::core::{Detector, DiagramKind, Dialect};
use std::sync::Arc;

mod chumsky_parser;
mod detector;
mod document;
mod parser;

pub use chumsky_parser::*;
pub use detector::*;
pub use document::*;
pub use parser::*;

/// Class diagram dialect
pub struct ClassDialect;

impl Dialect for ClassDialect {
    type Document = ClassDiagram;
    type Parser = ClassParser;

    fn detector() -> Arc<dyn Detector> {
        Arc::new(ClassDetector::new())
    }

    fn create_parser() -> Self::Parser {
        ClassParser::new()
    }

    fn create_document() -> Self::Document {
        ClassDiagram::new()
    }

    fn kind() -> DiagramKind {
        DiagramKind::Class
    }

    fn version() -> &'static str {
        "0.1.0"
    }
}
