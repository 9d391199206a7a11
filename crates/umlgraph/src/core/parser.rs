//! Core parser trait for diagram text
//!
//! A parser turns the lines of one document into a [`Document`]. Parsers hold
//! only immutable compiled patterns and options, so a single value can serve
//! concurrent parses.

use anyhow::Result;

use super::Document;

/// Kind of an open `{ ... }` scope during a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Package,
    Class,
    Interface,
    Component,
}

/// Core trait for diagram parsers
///
/// # Example
/// ```
/// use umlgraph::core::{Document, Parser};
/// use umlgraph::plugins::class::{ClassDiagram, ClassParser};
///
/// let parser = ClassParser::new();
/// let mut diagram = ClassDiagram::new();
/// parser.parse("@startuml\nclass User\n@enduml", &mut diagram).unwrap();
/// assert_eq!(diagram.data_types().count(), 1);
/// ```
pub trait Parser<D: Document>: Send + Sync {
    /// Parse diagram text into the provided document
    fn parse(&self, input: &str, document: &mut D) -> Result<()>;

    /// Get the name of this parser
    fn name(&self) -> &'static str;

    /// Get the version of this parser
    fn version(&self) -> &'static str;

    /// Check if the input looks like text this parser understands
    fn can_parse(&self, input: &str) -> bool;
}
