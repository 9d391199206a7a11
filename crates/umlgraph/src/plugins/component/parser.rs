//! Component diagram parser
//!
//! Containers and component bodies form a scope stack. Endpoints named by an
//! arrow before their declaration become provisional components that a later
//! declaration adopts in place.

use std::collections::HashMap;

use anyhow::Result;
use regex::Captures;
use tracing::{debug, info, span, trace, warn, Level};

use super::guard::{GuardError, GuardedPattern};
use super::{ComponentDetector, ComponentDiagram};
use crate::core::{
    numbered_lines, parse_connection, starts_with_word, Arrow, ClassifierState, ComponentInfo,
    DataType, Detector, DiagramError, Document, ExplainedError, LineClassifier, LineError,
    LineKind, PackageInfo, ParseFlags, ParseOptions, ParsedConnection, Parser, ScopeKind, TypeId,
    TypeKind,
};

/// Compiled line patterns for the component dialect
#[derive(Debug, Clone)]
struct ComponentPatterns {
    container: GuardedPattern,
    keyword: GuardedPattern,
    bracket: GuardedPattern,
    interface: GuardedPattern,
    port: GuardedPattern,
}

impl ComponentPatterns {
    fn compile(options: &ParseOptions) -> Result<Self, DiagramError> {
        Ok(Self {
            container: GuardedPattern::compile(
                r#"^(?P<kw>package|frame|node|cloud|folder|together|rectangle)(?:\s+(?:"(?P<qname>[^"]+)"|(?P<name>[^\s{"]+)))?(?:\s+as\s+(?P<alias>[\w.]+))?(?:\s*<<[^>]*>>)?(?:\s*#[\w#]+)?\s*\{$"#,
                options,
            )?,
            keyword: GuardedPattern::compile(
                r#"^(?P<kw>component|entity|database|queue|actor|rectangle|cloud|node|folder|frame)\s+(?:"(?P<qname>[^"]+)"|\[(?P<bname>[^\]]+)\]|(?P<name>[\w.]+))(?:\s*\[(?P<desc>[^\]]*)\])?(?:\s+as\s+(?P<alias>[\w.]+))?(?:\s*<<(?P<st>[^>]+)>>)?(?:\s*(?P<color>#[\w#]+))?\s*(?P<open>\{)?$"#,
                options,
            )?,
            bracket: GuardedPattern::compile(
                r"^\[(?P<name>[^\]]+)\](?:\s+as\s+(?P<alias>[\w.]+))?(?:\s*<<(?P<st>[^>]+)>>)?(?:\s*(?P<color>#[\w#]+))?\s*(?P<open>\{)?$",
                options,
            )?,
            interface: GuardedPattern::compile(
                r#"^(?:interface|\(\))\s+(?:"(?P<qname>[^"]+)"|(?P<name>[\w.]+))(?:\s+as\s+(?P<alias>[\w.]+))?(?:\s*<<(?P<st>[^>]+)>>)?(?:\s*#[\w#]+)?$"#,
                options,
            )?,
            port: GuardedPattern::compile(r"^(?P<kw>port|portin|portout)\s+(?P<name>[\w.]+)$", options)?,
        })
    }
}

/// Parser for component diagrams
pub struct ComponentParser {
    patterns: ComponentPatterns,
    classifier: LineClassifier,
    options: ParseOptions,
}

impl ComponentParser {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self::compile(options).expect("built-in component patterns are valid")
    }

    /// Build a parser, surfacing pattern compilation failures
    pub fn compile(options: ParseOptions) -> Result<Self, DiagramError> {
        Ok(Self {
            patterns: ComponentPatterns::compile(&options)?,
            classifier: LineClassifier::compile(ParseFlags::ALL)?,
            options,
        })
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse into a fresh diagram
    ///
    /// Sequence syntax before any component construct fails with
    /// [`DiagramError::DialectMismatch`].
    pub fn parse_document(&self, input: &str) -> Result<ComponentDiagram, DiagramError> {
        let mut diagram = ComponentDiagram::new();
        self.parse_into(input, &mut diagram)?;
        Ok(diagram)
    }

    pub fn parse_into(&self, input: &str, diagram: &mut ComponentDiagram) -> Result<(), DiagramError> {
        let span = span!(Level::INFO, "parse_component_diagram", input_len = input.len());
        let _enter = span.enter();

        let mut builder = ComponentBuilder::new(self, diagram);
        builder.run(input)?;

        info!(
            entities = diagram.entities().count(),
            line_errors = diagram.line_errors.len(),
            explained_errors = diagram.explained_errors.len(),
            "Parsed component diagram"
        );
        Ok(())
    }
}

impl Default for ComponentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<ComponentDiagram> for ComponentParser {
    fn parse(&self, input: &str, document: &mut ComponentDiagram) -> Result<()> {
        self.parse_into(input, document)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "component"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        ComponentDetector::new().detect(input)
    }
}

/// Relation an arrow creates between its endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Exposes,
    Consumes,
}

/// Relation drawn by `arrow` and whether it runs from the right endpoint
///
/// Tail glyphs make the left endpoint the source, head glyphs the right one.
/// Inheritance-style `|>` and plain lines carry no relation.
pub fn arrow_relation(arrow: &Arrow) -> Option<(Relation, bool)> {
    if arrow.head.contains('|') || arrow.tail.contains('|') {
        return None;
    }
    match arrow.tail.chars().last() {
        Some('o' | '*') => return Some((Relation::Exposes, false)),
        Some('>' | '(' | ')') => return Some((Relation::Consumes, false)),
        _ => {}
    }
    match arrow.head.chars().next() {
        Some('o' | '*') => Some((Relation::Exposes, true)),
        Some('<' | '(' | ')') => Some((Relation::Consumes, true)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    kind: ScopeKind,
    node: TypeId,
    named: bool,
}

/// Fields shared by both component declaration styles
struct Declaration<'t> {
    name: &'t str,
    alias: Option<&'t str>,
    kind: TypeKind,
    opens_body: bool,
}

struct ComponentBuilder<'p, 'd> {
    parser: &'p ComponentParser,
    diagram: &'d mut ComponentDiagram,
    scopes: Vec<Scope>,
    package_names: Vec<String>,
    entities_by_name: HashMap<String, TypeId>,
    aliases: HashMap<String, TypeId>,
    packages_by_name: HashMap<String, TypeId>,
    package_aliases: HashMap<String, TypeId>,
    /// Container each provisional component was created in
    provisional_parent: HashMap<TypeId, TypeId>,
    classifier_state: ClassifierState,
    saw_component_construct: bool,
}

impl<'p, 'd> ComponentBuilder<'p, 'd> {
    fn new(parser: &'p ComponentParser, diagram: &'d mut ComponentDiagram) -> Self {
        Self {
            parser,
            diagram,
            scopes: Vec::new(),
            package_names: Vec::new(),
            entities_by_name: HashMap::new(),
            aliases: HashMap::new(),
            packages_by_name: HashMap::new(),
            package_aliases: HashMap::new(),
            provisional_parent: HashMap::new(),
            classifier_state: ClassifierState::new(),
            saw_component_construct: false,
        }
    }

    fn run(&mut self, input: &str) -> Result<(), DiagramError> {
        let mut started = false;

        for (line_number, line) in numbered_lines(input) {
            self.parser.options.check_cancelled(line_number)?;
            trace!(line_number, line, "Classifying line");

            if !started {
                if let Some(title) = self.parser.classifier.parse_start(line) {
                    started = true;
                    if let Some(title) = title {
                        self.diagram.set_title(title.to_string());
                    }
                }
                continue;
            }
            if line.starts_with("@enduml") {
                break;
            }

            if !self.saw_component_construct && starts_with_word(line, "participant") {
                warn!(line_number, line, "Sequence syntax in component diagram");
                return Err(DiagramError::dialect_mismatch("component", "sequence", line_number));
            }

            if let Err(e) = self.line(line, line_number) {
                warn!(line_number, error = %e, "Matcher guard tripped");
                self.diagram
                    .explained_errors
                    .push(ExplainedError::new(line, line_number, "Regex timeout"));
            }
        }
        Ok(())
    }

    fn line(&mut self, line: &str, line_number: usize) -> Result<(), GuardError> {
        let parser = self.parser;

        match parser.classifier.classify(line, &mut self.classifier_state) {
            LineKind::Unhandled => {}
            LineKind::Note(Some(note)) => {
                let name = note.alias.unwrap_or_else(|| "note".to_string());
                self.add_entity(name, TypeKind::Note { text: note.text }, line_number);
                return Ok(());
            }
            LineKind::Comment(Some(text)) => {
                self.add_entity(text.clone(), TypeKind::Comment { text }, line_number);
                return Ok(());
            }
            LineKind::SkinParam(Some(text)) | LineKind::Other(Some(text)) => {
                self.add_entity(text.clone(), TypeKind::Other { text }, line_number);
                return Ok(());
            }
            LineKind::Preprocessor => {
                self.add_entity(line.to_string(), TypeKind::Other { text: line.to_string() }, line_number);
                return Ok(());
            }
            _ => return Ok(()),
        }

        if let Some(title) = parser.classifier.parse_title(line) {
            self.diagram.set_title(title.to_string());
            return Ok(());
        }

        if line == "}" {
            self.close_scope(line, line_number);
            return Ok(());
        }

        let patterns = &parser.patterns;
        if let Some(caps) = patterns.container.captures(line)? {
            self.open_container(&caps, line, line_number);
        } else if let Some(caps) = patterns.keyword.captures(line)? {
            let declaration = keyword_declaration(&caps);
            self.declare(declaration, line, line_number);
        } else if let Some(caps) = patterns.bracket.captures(line)? {
            let declaration = bracket_declaration(&caps);
            self.declare(declaration, line, line_number);
        } else if let Some(caps) = patterns.interface.captures(line)? {
            let declaration = Declaration {
                name: caps
                    .name("qname")
                    .or_else(|| caps.name("name"))
                    .map_or("", |m| m.as_str()),
                alias: caps.name("alias").map(|m| m.as_str()),
                kind: TypeKind::Interface {
                    stereotype: caps.name("st").map(|m| m.as_str().trim().to_string()),
                },
                opens_body: false,
            };
            self.declare(declaration, line, line_number);
        } else if let Some(caps) = patterns.port.captures(line)? {
            self.add_port(&caps["kw"], &caps["name"], line, line_number);
        } else if let Ok(connection) = parse_connection(line, line_number) {
            self.arrow(&connection, line, line_number);
        } else {
            self.error(line, line_number, None);
        }
        Ok(())
    }

    fn error(&mut self, line: &str, line_number: usize, reason: Option<String>) {
        warn!(line_number, line, reason = ?reason, "Unrecognized component diagram line");
        let error = LineError::new(line, line_number);
        self.diagram.add_line_error(match reason {
            Some(reason) => error.with_reason(reason),
            None => error,
        });
    }

    fn namespace(&self) -> String {
        self.package_names.join(".")
    }

    /// Innermost package or component body
    fn current_container(&self) -> TypeId {
        self.scopes.last().map_or(self.diagram.root, |s| s.node)
    }

    fn current_package(&self) -> TypeId {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.kind == ScopeKind::Package)
            .map_or(self.diagram.root, |s| s.node)
    }

    fn current_component(&self) -> Option<TypeId> {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.kind == ScopeKind::Component)
            .map(|s| s.node)
    }

    fn add_entity(&mut self, name: String, kind: TypeKind, line_number: usize) -> TypeId {
        let namespace = self.namespace();
        let id = self
            .diagram
            .types
            .alloc(DataType::new(name, namespace, kind).at_line(line_number));
        let container = self.current_container();
        self.diagram.types.add_child(container, id);
        id
    }

    fn close_scope(&mut self, line: &str, line_number: usize) {
        match self.scopes.pop() {
            Some(scope) => {
                if scope.named {
                    self.package_names.pop();
                }
                trace!(kind = ?scope.kind, line_number, "Closed scope");
            }
            None => self.error(line, line_number, Some("unbalanced closing brace".to_string())),
        }
    }

    fn open_container(&mut self, caps: &Captures<'_>, line: &str, line_number: usize) {
        self.saw_component_construct = true;
        let keyword = &caps["kw"];

        let Some(name) = caps.name("qname").or_else(|| caps.name("name")) else {
            let node = self.current_container();
            self.scopes.push(Scope {
                kind: ScopeKind::Package,
                node,
                named: false,
            });
            return;
        };
        let name = name.as_str().to_string();

        let id = self.add_entity(
            name.clone(),
            TypeKind::Package(PackageInfo {
                keyword: keyword.to_string(),
                children: Vec::new(),
            }),
            line_number,
        );
        self.diagram.packages.push(id);
        self.packages_by_name.entry(name.clone()).or_insert(id);

        if let Some(alias) = caps.name("alias").map(|m| m.as_str()) {
            if self.package_aliases.contains_key(alias) {
                self.error(line, line_number, Some(format!("Duplicate identifier : {}", alias)));
            } else {
                self.package_aliases.insert(alias.to_string(), id);
                if let Some(package) = self.diagram.types.get_mut(id) {
                    package.alias = Some(alias.to_string());
                }
            }
        }

        debug!(package = %name, keyword, line_number, "Opened container");
        self.package_names.push(name);
        self.scopes.push(Scope {
            kind: ScopeKind::Package,
            node: id,
            named: true,
        });
    }

    fn is_provisional(&self, id: TypeId) -> bool {
        self.diagram.types[id]
            .component()
            .map_or(false, |c| c.provisional)
    }

    fn declare(&mut self, declaration: Declaration<'_>, line: &str, line_number: usize) {
        let Declaration {
            name,
            alias,
            kind,
            opens_body,
        } = declaration;
        if name.is_empty() {
            self.error(line, line_number, None);
            return;
        }
        self.saw_component_construct = true;

        let alias = alias.unwrap_or(name);
        let existing = self.entities_by_name.get(name).copied();

        if let Some(id) = existing {
            if !self.is_provisional(id) {
                self.error(line, line_number, Some(format!("Duplicate identifier : {}", name)));
                return;
            }
        }
        if let Some(&bound) = self.aliases.get(alias) {
            if Some(bound) != existing {
                self.error(line, line_number, Some(format!("Duplicate identifier : {}", alias)));
                return;
            }
        }

        let id = match existing {
            Some(id) => {
                self.adopt(id, kind, line_number);
                id
            }
            None => {
                let id = self.add_entity(name.to_string(), kind, line_number);
                self.entities_by_name.insert(name.to_string(), id);
                id
            }
        };

        self.aliases.insert(alias.to_string(), id);
        if let Some(entity) = self.diagram.types.get_mut(id) {
            entity.alias = Some(alias.to_string());
        }
        debug!(name, alias, line_number, "Declared entity");

        if opens_body {
            self.scopes.push(Scope {
                kind: ScopeKind::Component,
                node: id,
                named: false,
            });
        }
    }

    /// Turn a provisional component into the declared entity, keeping its id
    fn adopt(&mut self, id: TypeId, kind: TypeKind, line_number: usize) {
        let namespace = self.namespace();
        let container = self.current_container();

        if let Some(parent) = self.provisional_parent.remove(&id) {
            if parent != container {
                self.diagram.types.remove_child(parent, id);
                self.diagram.types.add_child(container, id);
            }
        }

        if let Some(entity) = self.diagram.types.get_mut(id) {
            entity.kind = match (std::mem::replace(&mut entity.kind, TypeKind::Placeholder), kind) {
                (TypeKind::Component(old), TypeKind::Component(new)) => TypeKind::Component(ComponentInfo {
                    stereotype: new.stereotype,
                    color: new.color,
                    description: new.description,
                    provisional: false,
                    ..old
                }),
                (_, kind) => kind,
            };
            entity.namespace = namespace;
            entity.line_number = line_number;
        }
        debug!(id = id.index(), line_number, "Adopted provisional component");
    }

    fn add_port(&mut self, keyword: &str, name: &str, line: &str, line_number: usize) {
        let Some(owner) = self.current_component() else {
            self.error(line, line_number, Some("port outside a component".to_string()));
            return;
        };
        if let Some(info) = self.diagram.types.get_mut(owner).and_then(|t| t.component_mut()) {
            let ports = match keyword {
                "portin" => &mut info.ports_in,
                "portout" => &mut info.ports_out,
                _ => &mut info.ports,
            };
            ports.push(name.to_string());
        }
        trace!(port = name, line_number, "Port");
    }

    /// Entity name, then container name, then alias, then port name
    fn resolve(&self, name: &str) -> Option<TypeId> {
        self.entities_by_name
            .get(name)
            .or_else(|| self.packages_by_name.get(name))
            .or_else(|| self.aliases.get(name))
            .or_else(|| self.package_aliases.get(name))
            .copied()
            .or_else(|| self.port_owner(name))
    }

    /// Component owning port `name`, also accepting `Component.port`
    fn port_owner(&self, name: &str) -> Option<TypeId> {
        if let Some((owner, port)) = name.rsplit_once('.') {
            let owner = self
                .entities_by_name
                .get(owner)
                .or_else(|| self.aliases.get(owner))
                .copied();
            if let Some(id) = owner {
                if self.diagram.types[id].component().map_or(false, |c| c.has_port(port)) {
                    return Some(id);
                }
            }
        }
        self.diagram
            .components()
            .find(|(_, t)| t.component().map_or(false, |c| c.has_port(name)))
            .map(|(id, _)| id)
    }

    /// Create a provisional component for a name first seen in an arrow
    fn vivify(&mut self, name: &str, line_number: usize) -> TypeId {
        let parent = self.current_package();
        let namespace = self.namespace();
        let id = self.diagram.types.alloc(
            DataType::new(
                name,
                namespace,
                TypeKind::Component(ComponentInfo {
                    provisional: true,
                    ..Default::default()
                }),
            )
            .with_alias(name)
            .at_line(line_number),
        );
        self.diagram.types.add_child(parent, id);
        self.entities_by_name.insert(name.to_string(), id);
        self.aliases.entry(name.to_string()).or_insert(id);
        self.provisional_parent.insert(id, parent);
        debug!(name, line_number, "Created provisional component");
        id
    }

    fn arrow(&mut self, connection: &ParsedConnection, line: &str, line_number: usize) {
        self.saw_component_construct = true;
        let left_name = connection.left.name.as_str();
        let right_name = connection.right.name.as_str();
        let left = self.resolve(left_name);
        let right = self.resolve(right_name);

        let (left, right) = match (left, right) {
            (Some(left), Some(right)) => (left, right),
            _ if self.parser.options.components_must_be_defined => {
                let explanation = format!(
                    "left: {} right: {}",
                    resolution(left_name, left),
                    resolution(right_name, right)
                );
                warn!(line_number, line, explanation = %explanation, "Undefined arrow endpoint");
                self.diagram
                    .explained_errors
                    .push(ExplainedError::new(line, line_number, explanation));
                return;
            }
            (left, right) => {
                let left = match left {
                    Some(id) => id,
                    None => self.vivify(left_name, line_number),
                };
                let right = match right {
                    Some(id) => id,
                    None => self.vivify(right_name, line_number),
                };
                (left, right)
            }
        };

        let Some((relation, reversed)) = arrow_relation(&connection.arrow) else {
            trace!(line_number, "Arrow without relation");
            return;
        };
        let (source, target) = if reversed { (right, left) } else { (left, right) };

        match self.diagram.types.get_mut(source).and_then(|t| t.component_mut()) {
            Some(info) => {
                let list = match relation {
                    Relation::Exposes => &mut info.exposes,
                    Relation::Consumes => &mut info.consumes,
                };
                if !list.contains(&target) {
                    list.push(target);
                }
                debug!(?relation, line_number, "Connected components");
            }
            None => debug!(?relation, line_number, "Relation source is not a component"),
        }
    }
}

fn resolution(name: &str, id: Option<TypeId>) -> String {
    match id {
        Some(_) => format!("resolved {}", name),
        None => format!("unresolved {}", name),
    }
}

fn component_info(caps: &Captures<'_>) -> ComponentInfo {
    ComponentInfo {
        stereotype: caps.name("st").map(|m| m.as_str().trim().to_string()),
        color: caps.name("color").map(|m| m.as_str().to_string()),
        description: caps.name("desc").map(|m| m.as_str().trim().to_string()),
        ..Default::default()
    }
}

fn keyword_declaration<'t>(caps: &Captures<'t>) -> Declaration<'t> {
    Declaration {
        name: caps
            .name("qname")
            .or_else(|| caps.name("bname"))
            .or_else(|| caps.name("name"))
            .map_or("", |m| m.as_str().trim()),
        alias: caps.name("alias").map(|m| m.as_str()),
        kind: TypeKind::Component(component_info(caps)),
        opens_body: caps.name("open").is_some(),
    }
}

fn bracket_declaration<'t>(caps: &Captures<'t>) -> Declaration<'t> {
    Declaration {
        name: caps.name("name").map_or("", |m| m.as_str().trim()),
        alias: caps.name("alias").map(|m| m.as_str()),
        kind: TypeKind::Component(component_info(caps)),
        opens_body: caps.name("open").is_some(),
    }
}
