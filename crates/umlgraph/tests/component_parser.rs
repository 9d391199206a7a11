//! Integration tests for the component diagram parser

use umlgraph::prelude::*;
use umlgraph::{parse_component_diagram_with_options, ComponentInfo};

const SHOP: &str = r#"
@startuml
title Shop
package "Frontend" {
  [Web] as W
  component Mobile
}
node Backend {
  component Api {
    portin http
  }
  database Orders
}
interface IPayments as PAY
W --> Api
Mobile --> Api.http
Api --o PAY
Api --> Orders
@enduml
"#;

fn parse(input: &str) -> ComponentDiagram {
    parse_component_diagram(input, false).unwrap().unwrap()
}

fn id(diagram: &ComponentDiagram, name: &str) -> TypeId {
    diagram.find_entity(name).unwrap()
}

fn info<'a>(diagram: &'a ComponentDiagram, name: &str) -> &'a ComponentInfo {
    diagram.get(id(diagram, name)).component().unwrap()
}

#[test]
fn test_realistic_system() {
    let diagram = parse(SHOP);
    assert!(!diagram.has_errors(), "{:?} {:?}", diagram.line_errors, diagram.explained_errors);
    assert_eq!(diagram.title.as_deref(), Some("Shop"));

    let (web, mobile, api, orders, payments) = (
        id(&diagram, "W"),
        id(&diagram, "Mobile"),
        id(&diagram, "Api"),
        id(&diagram, "Orders"),
        id(&diagram, "PAY"),
    );
    assert!(diagram.consumes(web, api));
    assert!(diagram.consumes(mobile, api));
    assert!(diagram.exposes(api, payments));
    assert!(diagram.consumes(api, orders));

    assert_eq!(diagram.get(web).namespace, "Frontend");
    assert_eq!(diagram.get(orders).namespace, "Backend");
    assert_eq!(info(&diagram, "Api").ports_in, vec!["http"]);
    assert!(diagram.get(payments).is_interface());
}

#[test]
fn test_alias_and_name_resolve_to_same_entity() {
    let diagram = parse("@startuml\n[Gateway] as GW\nGW --> Gateway\n[Client] --> GW\n@enduml");
    let gateway = id(&diagram, "Gateway");
    assert_eq!(diagram.find_entity("GW"), Some(gateway));
    assert!(diagram.consumes(id(&diagram, "Client"), gateway));
}

#[test]
fn test_arrow_direction_per_glyph_family() {
    let cases = [
        ("L --> R", true),
        ("L ..> R", true),
        ("L --( R", true),
        ("L --o R", false),
        ("L --* R", false),
        ("R <-- L", true),
        ("R o-- L", false),
        ("R (-- L", true),
    ];
    for (arrow, left_consumes) in cases {
        let diagram = parse(&format!("@startuml\ncomponent L\ncomponent R\n{arrow}\n@enduml"));
        let (l, r) = (id(&diagram, "L"), id(&diagram, "R"));
        assert_eq!(diagram.consumes(l, r), left_consumes, "{arrow}");
        if !left_consumes {
            assert!(diagram.exposes(l, r), "{arrow}");
        }
    }
}

#[test]
fn test_undeclared_endpoints_are_vivified_when_lax() {
    let diagram = parse("@startuml\npackage Infra {\nCache --> Store\n}\n@enduml");
    let cache = diagram.get(id(&diagram, "Cache"));
    assert_eq!(cache.namespace, "Infra");
    assert!(cache.component().unwrap().provisional);
    assert!(diagram.line_errors.is_empty());
}

#[test]
fn test_must_be_defined_reports_resolution_status() {
    let diagram = parse_component_diagram("@startuml\n[Known]\nKnown --> Ghost\n@enduml", true)
        .unwrap()
        .unwrap();
    assert_eq!(diagram.explained_errors.len(), 1);
    let error = &diagram.explained_errors[0];
    assert_eq!(error.line_number, 3);
    assert_eq!(error.explanation, "left: resolved Known right: unresolved Ghost");
}

#[test]
fn test_duplicate_identifier() {
    let diagram = parse("@startuml\ncomponent One as X\ncomponent Two as X\n@enduml");
    assert_eq!(diagram.line_errors.len(), 1);
    assert_eq!(diagram.line_errors[0].line_number, 3);
    assert!(diagram.line_errors[0]
        .to_string()
        .contains("Duplicate identifier : X"));
}

#[test]
fn test_sequence_text_is_not_a_component_diagram() {
    let result = parse_component_diagram("@startuml\nparticipant Alice\nAlice -> Bob: hi\n@enduml", false).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_guard_reports_regex_timeout() {
    let options = ParseOptions::default().with_max_line_length(20);
    let diagram = parse_component_diagram_with_options(
        "@startuml\n[ThisComponentNameIsFarTooLong]\n[Ok]\n@enduml",
        options,
    )
    .unwrap()
    .unwrap();
    assert_eq!(diagram.explained_errors.len(), 1);
    assert_eq!(diagram.explained_errors[0].explanation, "Regex timeout");
    assert!(diagram.find_entity("Ok").is_some());
}

#[test]
fn test_malformed_lines_are_collected() {
    let diagram = parse("@startuml\n[A]\n???\n[B]\n@enduml");
    assert_eq!(diagram.line_errors.len(), 1);
    assert_eq!(diagram.line_errors[0].text, "???");
    assert_eq!(diagram.components().count(), 2);
}
