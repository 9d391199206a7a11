//! Integration tests for the class diagram parser

use umlgraph::prelude::*;
use umlgraph::{ListType, Visibility};

const ORDERS: &str = r#"
@startuml Orders
package Domain {
  abstract class Entity {
    +Id: Guid
  }
  class Customer as C {
    +Name: string
    +Orders: List<Order>
    +PlaceOrder(items: List<Item>, express: bool): Order
  }
  class Order {
    -lines: OrderLine[]
    +Total(): decimal
  }
  class OrderLine
  interface IAuditable
}
Customer --|> Entity
Order --|> Entity
Order ..|> IAuditable
Order "1" *-- "many" OrderLine : lines
note "Aggregate roots" as N1
@enduml
"#;

fn parse(input: &str) -> ClassDiagram {
    parse_class_diagram(input).unwrap()
}

fn named<'a>(diagram: &'a ClassDiagram, name: &str) -> &'a DataType {
    diagram.get(diagram.find_type(name).unwrap())
}

#[test]
fn test_realistic_model() {
    let diagram = parse(ORDERS);
    assert!(diagram.line_errors.is_empty(), "{:?}", diagram.line_errors);
    assert_eq!(diagram.title.as_deref(), Some("Orders"));

    let entity = diagram.find_type("Entity").unwrap();
    let auditable = diagram.find_type("IAuditable").unwrap();
    let order = named(&diagram, "Order");
    assert_eq!(order.namespace, "Domain");
    assert_eq!(order.bases, vec![entity]);
    assert_eq!(order.interfaces, vec![auditable]);
    assert_eq!(named(&diagram, "Customer").bases, vec![entity]);

    let composed = order.properties.iter().find(|p| p.drawn_with_line).unwrap();
    assert_eq!(composed.name, "lines");
    assert_eq!(composed.list_type, ListType::List);
    assert_eq!(diagram.notes().count(), 1);
}

#[test]
fn test_members() {
    let diagram = parse(ORDERS);
    let customer = named(&diagram, "C");
    assert_eq!(customer.properties.len(), 2);
    assert_eq!(customer.properties[1].list_type, ListType::List);
    assert_eq!(customer.properties[0].visibility, Visibility::Public);

    let place = &customer.methods[0];
    assert_eq!(place.name, "PlaceOrder");
    assert_eq!(place.parameters.len(), 2);
    assert_eq!(place.parameters[0].list_type, ListType::List);
    assert_eq!(place.return_type, diagram.find_type("Order"));

    let order = named(&diagram, "Order");
    assert_eq!(order.properties[0].visibility, Visibility::Private);
    assert_eq!(order.properties[0].list_type, ListType::Array);
}

#[test]
fn test_title_and_single_typed_property() {
    let diagram = parse("@startuml\ntitle T\nclass A {\n+int X\n}");
    assert!(diagram.line_errors.is_empty(), "{:?}", diagram.line_errors);
    assert_eq!(diagram.title.as_deref(), Some("T"));

    let a = named(&diagram, "A");
    assert_eq!(a.properties.len(), 1);
    let x = &a.properties[0];
    assert_eq!(x.name, "X");
    assert_eq!(x.visibility, Visibility::Public);
    let int = diagram.get(x.object_type.unwrap());
    assert_eq!(int.name, "int");
    assert!(int.is_placeholder());
}

#[test]
fn test_generated_composition_form() {
    let diagram = parse(
        "@startuml\nclass Cart\nclass Item\nCart \"1\" --* \"*\" Item : items\nCart --* Item : featured\n@enduml",
    );
    assert!(diagram.line_errors.is_empty(), "{:?}", diagram.line_errors);
    let item = diagram.find_type("Item").unwrap();
    let cart = named(&diagram, "Cart");

    let items = &cart.properties[0];
    assert_eq!(items.name, "items");
    assert_eq!(items.object_type, Some(item));
    assert_eq!(items.list_type, ListType::List);
    assert!(items.drawn_with_line);
    assert_eq!(cart.properties[1].list_type, ListType::None);
    assert!(named(&diagram, "Item").properties.is_empty());
}

#[test]
fn test_inheritance_before_declaration() {
    let diagram = parse(
        "@startuml\nclass Bar\nBar --|> F\nBase <|-- Bar\ninterface Foo as F\nabstract class Base\n@enduml",
    );
    assert!(diagram.line_errors.is_empty(), "{:?}", diagram.line_errors);
    let bar = named(&diagram, "Bar");
    assert_eq!(bar.interfaces, vec![diagram.find_type("Foo").unwrap()]);
    assert_eq!(bar.bases, vec![diagram.find_type("Base").unwrap()]);
}

#[test]
fn test_declaration_count() {
    let body: String = (0..25).map(|i| format!("class Type{i}\n")).collect();
    let diagram = parse(&format!("@startuml\n{body}@enduml"));
    assert_eq!(diagram.data_types().count(), 25);
}

#[test]
fn test_alias_resolves_to_same_identity() {
    let diagram = parse("@startuml\nclass Vehicle as V\nclass Car\nCar --|> V\n@enduml");
    let vehicle = diagram.find_type("Vehicle").unwrap();
    assert_eq!(diagram.find_type("V"), Some(vehicle));
    assert_eq!(named(&diagram, "Car").bases, vec![vehicle]);
}

#[test]
fn test_forward_member_reference_is_upgraded_in_place() {
    let diagram = parse("@startuml\nclass Basket {\n+owner: Shopper\n}\nclass Shopper\n@enduml");
    let shopper = diagram.find_type("Shopper").unwrap();
    assert_eq!(named(&diagram, "Basket").properties[0].object_type, Some(shopper));
    assert!(named(&diagram, "Shopper").is_class());
}

#[test]
fn test_duplicate_alias_is_reported() {
    let diagram = parse("@startuml\nclass First as X\nclass Second as X\n@enduml");
    assert_eq!(diagram.line_errors.len(), 1);
    assert_eq!(diagram.line_errors[0].line_number, 3);
    assert!(diagram.line_errors[0]
        .to_string()
        .contains("Duplicate identifier : X"));
}

#[test]
fn test_malformed_lines_are_collected() {
    let diagram = parse("@startuml\nclass Good\nthis is nonsense\n%%%\nclass AlsoGood\n@enduml");
    let lines: Vec<_> = diagram.line_errors.iter().map(|e| e.line_number).collect();
    assert_eq!(lines, vec![3, 4]);
    assert_eq!(diagram.line_errors[0].text, "this is nonsense");
    assert_eq!(diagram.data_types().count(), 2);
}

#[test]
fn test_unbalanced_braces_are_tolerated() {
    let diagram = parse("@startuml\nclass Open {\n+x: int\n@enduml");
    assert_eq!(named(&diagram, "Open").properties.len(), 1);

    let diagram = parse("@startuml\n}\n}\nclass Later\n@enduml");
    assert_eq!(diagram.line_errors.len(), 2);
    assert!(diagram.find_type("Later").is_some());
}

#[test]
fn test_canonical_rendering_reparses_equal() {
    let diagram = parse(
        "@startuml\npackage Shop {\nclass Cart\ninterface IPriced\nenum Currency\n}\nclass Receipt\n@enduml",
    );

    let mut rendered = String::from("@startuml\n");
    let mut open_package: Option<String> = None;
    for (_, data_type) in diagram.data_types() {
        let package = (!data_type.namespace.is_empty()).then(|| data_type.namespace.clone());
        if package != open_package {
            if open_package.is_some() {
                rendered.push_str("}\n");
            }
            if let Some(name) = &package {
                rendered.push_str(&format!("package {name} {{\n"));
            }
            open_package = package;
        }
        rendered.push_str(&format!("{} {}\n", data_type.kind.name(), data_type.name));
    }
    if open_package.is_some() {
        rendered.push_str("}\n");
    }
    rendered.push_str("@enduml\n");

    let reparsed = parse(&rendered);
    let summary = |d: &ClassDiagram| -> Vec<(String, String, &'static str)> {
        d.data_types()
            .map(|(_, t)| (t.name.clone(), t.namespace.clone(), t.kind.name()))
            .collect()
    };
    assert_eq!(summary(&diagram), summary(&reparsed));
}

#[test]
fn test_parsing_twice_is_identical() {
    assert_eq!(parse(ORDERS), parse(ORDERS));
}
