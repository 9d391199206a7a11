//! Shared store of parsed documents
//!
//! Parsers never touch the collection; drivers add finished documents to it,
//! possibly from several threads.

use parking_lot::RwLock;
use std::sync::Arc;

use super::Document;
use crate::plugins::class::ClassDiagram;
use crate::plugins::component::ComponentDiagram;
use crate::plugins::sequence::{SequenceDiagram, TypeTable};

/// Parsed diagrams grouped by dialect
#[derive(Debug, Default)]
pub struct DocumentCollection {
    class_diagrams: RwLock<Vec<Arc<ClassDiagram>>>,
    component_diagrams: RwLock<Vec<Arc<ComponentDiagram>>>,
    sequence_diagrams: RwLock<Vec<Arc<SequenceDiagram>>>,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class diagram, replacing one parsed from the same file
    pub fn add_class(&self, diagram: ClassDiagram) {
        upsert(&self.class_diagrams, diagram);
    }

    pub fn add_component(&self, diagram: ComponentDiagram) {
        upsert(&self.component_diagrams, diagram);
    }

    pub fn add_sequence(&self, diagram: SequenceDiagram) {
        upsert(&self.sequence_diagrams, diagram);
    }

    /// Remove every document parsed from `file_name`; returns how many went
    pub fn remove(&self, file_name: &str) -> usize {
        remove_named(&self.class_diagrams, file_name)
            + remove_named(&self.component_diagrams, file_name)
            + remove_named(&self.sequence_diagrams, file_name)
    }

    pub fn class_diagrams(&self) -> Vec<Arc<ClassDiagram>> {
        self.class_diagrams.read().clone()
    }

    pub fn component_diagrams(&self) -> Vec<Arc<ComponentDiagram>> {
        self.component_diagrams.read().clone()
    }

    pub fn sequence_diagrams(&self) -> Vec<Arc<SequenceDiagram>> {
        self.sequence_diagrams.read().clone()
    }

    pub fn len(&self) -> usize {
        self.class_diagrams.read().len()
            + self.component_diagrams.read().len()
            + self.sequence_diagrams.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Type table over a snapshot of the class diagrams
    pub fn type_table(&self) -> TypeTable {
        let diagrams = self
            .class_diagrams
            .read()
            .iter()
            .map(|d| ClassDiagram::clone(d))
            .collect();
        TypeTable::from_diagrams(diagrams)
    }
}

fn upsert<D: Document>(list: &RwLock<Vec<Arc<D>>>, document: D) {
    let mut list = list.write();
    let existing = document
        .file_name()
        .and_then(|name| list.iter().position(|d| d.file_name() == Some(name)));
    match existing {
        Some(index) => list[index] = Arc::new(document),
        None => list.push(Arc::new(document)),
    }
}

fn remove_named<D: Document>(list: &RwLock<Vec<Arc<D>>>, file_name: &str) -> usize {
    let mut list = list.write();
    let before = list.len();
    list.retain(|d| d.file_name() != Some(file_name));
    before - list.len()
}
