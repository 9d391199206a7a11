//! Plugin orchestrator for auto-detecting and parsing diagrams
//!
//! The orchestrator picks a dialect for each input (file name hint first,
//! then detector confidence), runs that dialect's parser and records the
//! result in a shared [`DocumentCollection`].

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, span, trace, warn, Level};

use crate::core::{
    display_name, read_source, Detector, DiagramKind, Document, DocumentCollection, ParseOptions,
};
use crate::plugins::class::{ClassDetector, ClassDiagram, ClassParser};
use crate::plugins::component::{ComponentDetector, ComponentDiagram, ComponentParser};
use crate::plugins::sequence::{SequenceDetector, SequenceDiagram, SequenceParser};

/// A parsed document of any dialect
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument {
    Class(ClassDiagram),
    Component(ComponentDiagram),
    Sequence(SequenceDiagram),
}

impl ParsedDocument {
    pub fn kind(&self) -> DiagramKind {
        self.as_document().kind()
    }

    pub fn as_document(&self) -> &dyn Document {
        match self {
            ParsedDocument::Class(d) => d,
            ParsedDocument::Component(d) => d,
            ParsedDocument::Sequence(d) => d,
        }
    }

    pub fn as_document_mut(&mut self) -> &mut dyn Document {
        match self {
            ParsedDocument::Class(d) => d,
            ParsedDocument::Component(d) => d,
            ParsedDocument::Sequence(d) => d,
        }
    }
}

/// Detects dialects, parses, and collects the results
pub struct Orchestrator {
    detectors: HashMap<String, Box<dyn Detector>>,
    class_parser: ClassParser,
    component_parser: ComponentParser,
    sequence_parser: SequenceParser,
    collection: Arc<DocumentCollection>,
}

impl Orchestrator {
    /// Create an orchestrator with no detectors registered
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            detectors: HashMap::new(),
            class_parser: ClassParser::with_options(options.clone()),
            component_parser: ComponentParser::with_options(options.clone()),
            sequence_parser: SequenceParser::with_options(options),
            collection: Arc::new(DocumentCollection::new()),
        }
    }

    /// Create an orchestrator with the class, component and sequence detectors
    pub fn with_all_plugins() -> Self {
        let mut orchestrator = Self::new();
        orchestrator.register_default_detectors();
        orchestrator
    }

    pub fn register_default_detectors(&mut self) {
        self.register_detector("class".to_string(), Box::new(ClassDetector::new()));
        self.register_detector("component".to_string(), Box::new(ComponentDetector::new()));
        self.register_detector("sequence".to_string(), Box::new(SequenceDetector::new()));
    }

    /// Register a detector plugin
    pub fn register_detector(&mut self, name: String, detector: Box<dyn Detector>) {
        self.detectors.insert(name, detector);
    }

    /// Registered detector names, sorted
    pub fn get_detectors(&self) -> Vec<String> {
        let mut names: Vec<_> = self.detectors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Share the collection every parsed document is added to
    pub fn collection(&self) -> Arc<DocumentCollection> {
        Arc::clone(&self.collection)
    }

    /// Name of the most confident detector that accepts `input`
    ///
    /// Ties go to the detector whose name sorts first.
    pub fn detect_diagram_type(&self, input: &str) -> Result<String> {
        let detect_span = span!(Level::INFO, "detect_diagram_type", input_len = input.len());
        let _enter = detect_span.enter();

        let mut best: Option<(String, f64)> = None;
        for name in self.get_detectors() {
            let detector = &self.detectors[&name];
            let confidence = detector.confidence(input);
            trace!(detector = %name, confidence, "Checking detector");
            if detector.detect(input) && best.as_ref().map_or(true, |(_, c)| confidence > *c) {
                best = Some((name, confidence));
            }
        }

        match best {
            Some((name, confidence)) => {
                info!(detector = %name, confidence, "Detected diagram type");
                Ok(name)
            }
            None => {
                warn!("No suitable detector found for input");
                Err(anyhow::anyhow!("No suitable detector found for input"))
            }
        }
    }

    /// Dialect for `input`, preferring the file name hint
    pub fn select_dialect(&self, input: &str, file_name: Option<&Path>) -> Result<DiagramKind> {
        if let Some(kind) = file_name.and_then(DiagramKind::from_file_name) {
            debug!(%kind, "Dialect from file name");
            return Ok(kind);
        }
        Ok(self.detect_diagram_type(input)?.parse()?)
    }

    /// Parse `input` with an auto-selected dialect and collect the result
    ///
    /// A component parse that hits sequence syntax is retried as sequence.
    pub fn process(&self, input: &str) -> Result<ParsedDocument> {
        self.process_named(input, None)
    }

    /// Read and parse a file; its name is the first dialect hint
    pub fn process_file(&self, path: &Path) -> Result<ParsedDocument> {
        let input = read_source(path)?;
        self.process_named(&input, Some(path))
    }

    fn process_named(&self, input: &str, path: Option<&Path>) -> Result<ParsedDocument> {
        let kind = self.select_dialect(input, path)?;
        self.process_as(kind, input, path)
    }

    /// Parse with a known dialect and collect the result
    ///
    /// `path` only names the document; the text is not re-read.
    pub fn process_as(
        &self,
        kind: DiagramKind,
        input: &str,
        path: Option<&Path>,
    ) -> Result<ParsedDocument> {
        let process_span = span!(Level::INFO, "process_diagram", input_len = input.len(), %kind);
        let _enter = process_span.enter();

        let mut document = self.parse_as(kind, input)?;
        if let Some(path) = path {
            document.as_document_mut().set_file_name(display_name(path));
        }

        match &document {
            ParsedDocument::Class(d) => self.collection.add_class(d.clone()),
            ParsedDocument::Component(d) => self.collection.add_component(d.clone()),
            ParsedDocument::Sequence(d) => self.collection.add_sequence(d.clone()),
        }
        info!(kind = %document.kind(), "Pipeline completed successfully");
        Ok(document)
    }

    /// Parse with a known dialect, skipping detection
    pub fn parse_as(&self, kind: DiagramKind, input: &str) -> Result<ParsedDocument> {
        match kind {
            DiagramKind::Class => Ok(ParsedDocument::Class(self.class_parser.parse_document(input)?)),
            DiagramKind::Component => match self.component_parser.parse_document(input) {
                Ok(diagram) => Ok(ParsedDocument::Component(diagram)),
                Err(e) if e.is_dialect_mismatch() => {
                    info!(error = %e, "Retrying component input as sequence");
                    self.parse_as(DiagramKind::Sequence, input)
                }
                Err(e) => Err(e.into()),
            },
            DiagramKind::Sequence => {
                let types = self.collection.type_table();
                Ok(ParsedDocument::Sequence(
                    self.sequence_parser.parse_document(input, &types)?,
                ))
            }
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
