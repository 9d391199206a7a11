//! Component diagram plugin
//!
//! Parses components, interfaces, ports and containers, and the exposes and
//! consumes relations drawn between them.

use crate::core::{Detector, DiagramKind, Dialect};
use std::sync::Arc;

mod detector;
mod document;
mod guard;
mod parser;

pub use detector::*;
pub use document::*;
pub use guard::*;
pub use parser::*;

/// Component diagram dialect
pub struct ComponentDialect;

impl Dialect for ComponentDialect {
    type Document = ComponentDiagram;
    type Parser = ComponentParser;

    fn detector() -> Arc<dyn Detector> {
        Arc::new(ComponentDetector::new())
    }

    fn create_parser() -> Self::Parser {
        ComponentParser::new()
    }

    fn create_document() -> Self::Document {
        ComponentDiagram::new()
    }

    fn kind() -> DiagramKind {
        DiagramKind::Component
    }

    fn version() -> &'static str {
        "0.1.0"
    }
}
