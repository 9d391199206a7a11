//! Shared line categories behave the same in every dialect

use umlgraph::prelude::*;
use umlgraph::TypeKind;

/// Lines every dialect must accept without producing line errors
const SHARED: &str = r#"
' single line comment
/' block
   comment '/
!include common.puml
skinparam monochrome true
skinparam component {
  BackgroundColor White
}
note "Floating" as N1
note left of Somewhere
  multi-line
  text with -> arrows
end note
"#;

fn wrap(body: &str) -> String {
    format!("@startuml\n{SHARED}\n{body}\n@enduml")
}

#[test]
fn test_shared_lines_produce_no_errors_in_any_dialect() {
    let class = parse_class_diagram(&wrap("class A")).unwrap();
    assert!(class.line_errors.is_empty(), "{:?}", class.line_errors);

    let component = parse_component_diagram(&wrap("[A] --> [B]"), false)
        .unwrap()
        .unwrap();
    assert!(component.line_errors.is_empty(), "{:?}", component.line_errors);

    let sequence = parse_sequence_diagram(&wrap("A -> B: x"), &TypeTable::new(), false).unwrap();
    assert!(sequence.line_errors.is_empty(), "{:?}", sequence.line_errors);
    assert_eq!(sequence.connections().len(), 1);
}

#[test]
fn test_notes_become_entities_in_class_diagrams() {
    let diagram = parse_class_diagram(&wrap("class A")).unwrap();
    let texts: Vec<_> = diagram
        .notes()
        .filter_map(|(_, t)| match &t.kind {
            TypeKind::Note { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["Floating", "multi-line\ntext with -> arrows"]);
    assert!(diagram.notes().any(|(_, t)| t.name == "N1"));
    assert!(diagram.find_type("N1").is_none());
}

#[test]
fn test_note_body_is_not_parsed_as_arrows() {
    let component = parse_component_diagram(&wrap("[A]"), false).unwrap().unwrap();
    assert!(component.find_entity("arrows").is_none());
    assert_eq!(component.components().count(), 1);
}

#[test]
fn test_detectors_agree_with_parsers() {
    let class = "@startuml\nclass Order {\n+Id: int\n}\n@enduml";
    let component = "@startuml\n[Web] --> [Api]\n@enduml";
    let sequence = "@startuml\nparticipant A\nA -> A: x\n@enduml";

    assert!(ClassDetector::new().detect(class));
    assert!(ComponentDetector::new().detect(component));
    assert!(SequenceDetector::new().detect(sequence));
    assert!(!SequenceDetector::new().detect(class));
    assert!(!ClassDetector::new().detect("random text"));

    assert!(ClassParser::new().can_parse(class));
    assert!(ComponentParser::new().can_parse(component));
    assert!(SequenceParser::new().can_parse(sequence));
}

#[test]
fn test_parser_trait_fills_supplied_document() {
    let mut diagram = ClassDiagram::new();
    ClassParser::new()
        .parse("@startuml\nclass A\n@enduml", &mut diagram)
        .unwrap();
    assert_eq!(diagram.entity_count(), 1);
    assert_eq!(ClassParser::new().name(), "class");
    assert_eq!(SequenceParser::new().version(), "0.1.0");
}
