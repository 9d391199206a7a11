//! umlgraph - Parse PlantUML diagrams into typed object graphs
//!
//! Class, component and sequence diagrams are parsed into arena-backed
//! models. Unrecognized lines never abort a parse; they are recorded on the
//! document as line errors.
//!
//! # Quick Start
//!
//! ```rust
//! use umlgraph::parse_class_diagram;
//!
//! let diagram = parse_class_diagram("@startuml\nclass User {\n+Name: string\n}\n@enduml").unwrap();
//! let user = diagram.find_type("User").unwrap();
//! assert_eq!(diagram.get(user).properties[0].name, "Name");
//! ```
//!
//! # Sequence diagrams
//!
//! Sequence messages are resolved against the classes of previously parsed
//! class diagrams:
//!
//! ```rust
//! use umlgraph::prelude::*;
//!
//! let classes = parse_class_diagram("@startuml\nclass Cart {\n+Add(item: Item): void\n}\n@enduml").unwrap();
//! let types = TypeTable::from_diagrams(vec![classes]);
//!
//! let input = "@startuml\nactor User\nparticipant Cart\nUser -> Cart: Add(book)\n@enduml";
//! let diagram = parse_sequence_diagram(input, &types, false).unwrap();
//! assert!(matches!(diagram.connections()[0].action, Action::Method(_)));
//! ```

use std::path::Path;

pub mod core;
pub mod plugins;

pub use core::*;

use crate::plugins::class::{ClassDiagram, ClassParser};
use crate::plugins::component::{ComponentDiagram, ComponentParser};
use crate::plugins::sequence::{SequenceDiagram, SequenceParser, TypeTable};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        CancellationFlag, DataType, Detector, DiagramError, DiagramKind, Document,
        DocumentCollection, ExplainedError, LineError, ParseOptions, Parser, TypeArena, TypeId,
        TypeKind,
    };
    pub use crate::plugins::class::{ClassDetector, ClassDiagram, ClassParser};
    pub use crate::plugins::component::{ComponentDetector, ComponentDiagram, ComponentParser};
    pub use crate::plugins::orchestrator::{Orchestrator, ParsedDocument};
    pub use crate::plugins::sequence::{
        Action, BlockKind, OrderedEntity, SequenceDetector, SequenceDiagram, SequenceParser,
        TypeTable,
    };
    pub use crate::{parse_class_diagram, parse_component_diagram, parse_sequence_diagram};
}

/// Parse a class diagram
///
/// Only cancellation fails; unrecognized lines become line errors.
pub fn parse_class_diagram(input: &str) -> Result<ClassDiagram, DiagramError> {
    parse_class_diagram_with_options(input, ParseOptions::default())
}

pub fn parse_class_diagram_with_options(
    input: &str,
    options: ParseOptions,
) -> Result<ClassDiagram, DiagramError> {
    ClassParser::with_options(options).parse_document(input)
}

/// Parse a class diagram file, recording its name on the document
pub fn parse_class_diagram_file(path: impl AsRef<Path>) -> Result<ClassDiagram, DiagramError> {
    parse_class_diagram_file_with_options(path, ParseOptions::default())
}

pub fn parse_class_diagram_file_with_options(
    path: impl AsRef<Path>,
    options: ParseOptions,
) -> Result<ClassDiagram, DiagramError> {
    let path = path.as_ref();
    let mut diagram = parse_class_diagram_with_options(&read_source(path)?, options)?;
    diagram.set_file_name(display_name(path));
    Ok(diagram)
}

/// Parse a component diagram
///
/// Returns `Ok(None)` when the text turns out to be a sequence diagram.
/// With `components_must_be_defined`, arrows may only reference declared
/// entities; unresolved endpoints become explained errors.
pub fn parse_component_diagram(
    input: &str,
    components_must_be_defined: bool,
) -> Result<Option<ComponentDiagram>, DiagramError> {
    let options = ParseOptions::default().with_components_must_be_defined(components_must_be_defined);
    parse_component_diagram_with_options(input, options)
}

pub fn parse_component_diagram_with_options(
    input: &str,
    options: ParseOptions,
) -> Result<Option<ComponentDiagram>, DiagramError> {
    match ComponentParser::with_options(options).parse_document(input) {
        Ok(diagram) => Ok(Some(diagram)),
        Err(e) if e.is_dialect_mismatch() => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn parse_component_diagram_file(
    path: impl AsRef<Path>,
    components_must_be_defined: bool,
) -> Result<Option<ComponentDiagram>, DiagramError> {
    let options = ParseOptions::default().with_components_must_be_defined(components_must_be_defined);
    parse_component_diagram_file_with_options(path, options)
}

pub fn parse_component_diagram_file_with_options(
    path: impl AsRef<Path>,
    options: ParseOptions,
) -> Result<Option<ComponentDiagram>, DiagramError> {
    let path = path.as_ref();
    let diagram = parse_component_diagram_with_options(&read_source(path)?, options)?;
    Ok(diagram.map(|mut d| {
        d.set_file_name(display_name(path));
        d
    }))
}

/// Parse a sequence diagram, resolving messages against `types`
///
/// With `just_lifelines`, only lifeline declarations are read.
pub fn parse_sequence_diagram(
    input: &str,
    types: &TypeTable,
    just_lifelines: bool,
) -> Result<SequenceDiagram, DiagramError> {
    let options = ParseOptions::default().with_just_lifelines(just_lifelines);
    parse_sequence_diagram_with_options(input, types, options)
}

pub fn parse_sequence_diagram_with_options(
    input: &str,
    types: &TypeTable,
    options: ParseOptions,
) -> Result<SequenceDiagram, DiagramError> {
    SequenceParser::with_options(options).parse_document(input, types)
}

pub fn parse_sequence_diagram_file(
    path: impl AsRef<Path>,
    types: &TypeTable,
    just_lifelines: bool,
) -> Result<SequenceDiagram, DiagramError> {
    let options = ParseOptions::default().with_just_lifelines(just_lifelines);
    parse_sequence_diagram_file_with_options(path, types, options)
}

pub fn parse_sequence_diagram_file_with_options(
    path: impl AsRef<Path>,
    types: &TypeTable,
    options: ParseOptions,
) -> Result<SequenceDiagram, DiagramError> {
    let path = path.as_ref();
    let mut diagram = parse_sequence_diagram_with_options(&read_source(path)?, types, options)?;
    diagram.set_file_name(display_name(path));
    Ok(diagram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_class_diagram() {
        let diagram = parse_class_diagram("@startuml\nclass A\nclass B\n@enduml").unwrap();
        assert_eq!(diagram.data_types().count(), 2);
        assert!(diagram.line_errors.is_empty());
    }

    #[test]
    fn test_component_entry_returns_none_on_sequence_text() {
        let result = parse_component_diagram("@startuml\nparticipant A\n@enduml", false).unwrap();
        assert!(result.is_none());

        let result = parse_component_diagram("@startuml\n[A] --> [B]\n@enduml", false).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn test_cancelled_parse_is_an_error() {
        let flag = CancellationFlag::new();
        flag.cancel();
        let options = ParseOptions::default().with_cancel(flag);
        let err = parse_class_diagram_with_options("@startuml\nclass A\n@enduml", options).unwrap_err();
        assert!(matches!(err, DiagramError::Cancelled { line: 1 }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_class_diagram_file("/nonexistent/diagram.puml").unwrap_err();
        assert!(matches!(err, DiagramError::IoError { .. }));
    }

    #[test]
    fn test_sequence_without_types() {
        let diagram =
            parse_sequence_diagram("@startuml\nA -> B: hi\n@enduml", &TypeTable::new(), false).unwrap();
        assert_eq!(diagram.connections().len(), 1);
    }
}
