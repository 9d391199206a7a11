//! Core document trait shared by all parsed diagrams
//!
//! Each dialect has its own document type holding its entity tree. This
//! trait is the common surface: title, source file name and line errors.

use super::{DiagramKind, LineError};

/// Common surface of a parsed diagram
pub trait Document: Send + Sync {
    /// Dialect that produced this document
    fn kind(&self) -> DiagramKind;

    fn title(&self) -> Option<&str>;

    fn set_title(&mut self, title: String);

    /// Source path for documents parsed from a file
    fn file_name(&self) -> Option<&str>;

    fn set_file_name(&mut self, file_name: String);

    /// Lines that matched no construct, in source order
    fn line_errors(&self) -> &[LineError];

    fn add_line_error(&mut self, error: LineError);

    /// Number of entities recorded, excluding the synthetic root
    fn entity_count(&self) -> usize;

    /// Reset to the freshly constructed state
    fn clear(&mut self);

    fn has_errors(&self) -> bool {
        !self.line_errors().is_empty()
    }
}
