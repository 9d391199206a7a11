//! Class diagram parser
//!
//! Walks the document once, keeping a scope stack for packages and type
//! bodies. Shared constructs go through the [`LineClassifier`], arrows through
//! the shared arrow grammar and body lines through [`ChumskyMemberParser`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::{debug, info, span, trace, warn, Level};

use super::chumsky_parser::{ChumskyMemberParser, ParsedMember, ParsedMethod, ParsedProperty};
use super::{ClassDetector, ClassDiagram};
use crate::core::{
    list_type_of, numbered_lines, parse_connection, split_top_level, starts_with_word,
    strip_generics, ClassifierState, DataType, Detector, DiagramError, Document, LineClassifier,
    LineError, LineKind, ListType, Method, PackageInfo, Parameter, ParseFlags, ParseOptions,
    ParsedConnection, Parser, Property, ScopeKind, TypeId, TypeKind, Visibility,
};

/// Why an arrow line could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrowError {
    #[error("{name} is not a declared type")]
    Unresolved { name: String },

    #[error("{name} and {name} cannot be the same")]
    SameEndpoint { name: String },
}

/// Compiled line patterns for the class dialect
#[derive(Debug, Clone)]
struct ClassPatterns {
    package: Regex,
    declaration: Regex,
    declared_name: Regex,
}

impl ClassPatterns {
    fn compile() -> Result<Self, DiagramError> {
        Ok(Self {
            package: Regex::new(
                r#"^(?P<kw>package|namespace|together)(?:\s+(?:"(?P<qname>[^"]+)"|(?P<name>[\w.\-]+)))?(?:\s+as\s+(?P<alias>[\w.]+))?(?:\s*<<[^>]*>>)?(?:\s*#[\w#]+)?\s*\{$"#,
            )?,
            declaration: Regex::new(
                r"^(?P<kw>abstract\s+class|abstract|class|interface|enum|struct)\s+(?P<decl>.+?)\s*(?:(?P<open>\{)|\{(?P<inline>[^{}]*)\})?$",
            )?,
            declared_name: Regex::new(
                r#"^(?:"(?P<qname>[^"]+)"|(?P<name>[\w.]+)(?P<generic><[^<].*?>)?)(?:\s+as\s+(?P<alias>[\w.]+))?(?:\s*<<(?P<st>.+?)>>)?(?:\s*#[\w#]+)?$"#,
            )?,
        })
    }
}

/// Parser for class diagrams
pub struct ClassParser {
    patterns: ClassPatterns,
    classifier: LineClassifier,
    members: ChumskyMemberParser,
    options: ParseOptions,
}

impl ClassParser {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self::compile(options).expect("built-in class patterns are valid")
    }

    /// Build a parser, surfacing pattern compilation failures
    pub fn compile(options: ParseOptions) -> Result<Self, DiagramError> {
        Ok(Self {
            patterns: ClassPatterns::compile()?,
            classifier: LineClassifier::compile(ParseFlags::ALL)?,
            members: ChumskyMemberParser::new(),
            options,
        })
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse into a fresh diagram
    pub fn parse_document(&self, input: &str) -> Result<ClassDiagram, DiagramError> {
        let mut diagram = ClassDiagram::new();
        self.parse_into(input, &mut diagram)?;
        Ok(diagram)
    }

    /// Parse into `diagram`; only cancellation is an `Err`
    pub fn parse_into(&self, input: &str, diagram: &mut ClassDiagram) -> Result<(), DiagramError> {
        let span = span!(Level::INFO, "parse_class_diagram", input_len = input.len());
        let _enter = span.enter();

        let mut builder = ClassBuilder::new(self, diagram);
        builder.run(input)?;

        info!(
            data_types = diagram.data_types().count(),
            line_errors = diagram.line_errors.len(),
            "Parsed class diagram"
        );
        Ok(())
    }
}

impl Default for ClassParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<ClassDiagram> for ClassParser {
    fn parse(&self, input: &str, document: &mut ClassDiagram) -> Result<()> {
        self.parse_into(input, document)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "class"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        ClassDetector::new().detect(input)
    }
}

/// Arrow line that named a type not declared yet
struct DeferredArrow {
    connection: ParsedConnection,
    line: String,
    line_number: usize,
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    kind: ScopeKind,
    node: TypeId,
    /// Pushed a name onto the namespace stack
    named: bool,
}

/// Mutable state for one parse
struct ClassBuilder<'p, 'd> {
    parser: &'p ClassParser,
    diagram: &'d mut ClassDiagram,
    scopes: Vec<Scope>,
    package_names: Vec<String>,
    types_by_name: HashMap<String, TypeId>,
    type_aliases: HashMap<String, TypeId>,
    packages_by_name: HashMap<String, TypeId>,
    package_aliases: HashMap<String, TypeId>,
    classifier_state: ClassifierState,
    saw_class_construct: bool,
    deferred: Vec<DeferredArrow>,
}

impl<'p, 'd> ClassBuilder<'p, 'd> {
    fn new(parser: &'p ClassParser, diagram: &'d mut ClassDiagram) -> Self {
        Self {
            parser,
            diagram,
            scopes: Vec::new(),
            package_names: Vec::new(),
            types_by_name: HashMap::new(),
            type_aliases: HashMap::new(),
            packages_by_name: HashMap::new(),
            package_aliases: HashMap::new(),
            classifier_state: ClassifierState::new(),
            saw_class_construct: false,
            deferred: Vec::new(),
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

            match self.current_body() {
                Some((owner, kind)) => self.body_line(owner, kind, line, line_number),
                None => self.line(line, line_number),
            }
        }

        if !self.scopes.is_empty() {
            debug!(open_scopes = self.scopes.len(), "Document ended with open scopes");
        }

        self.resolve_deferred();
        self.diagram.line_errors.sort_by_key(|e| e.line_number);
        Ok(())
    }

    /// Innermost scope when it is a type body
    fn current_body(&self) -> Option<(TypeId, ScopeKind)> {
        self.scopes
            .last()
            .filter(|s| matches!(s.kind, ScopeKind::Class | ScopeKind::Interface))
            .map(|s| (s.node, s.kind))
    }

    fn current_package(&self) -> TypeId {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.kind == ScopeKind::Package)
            .map(|s| s.node)
            .unwrap_or(self.diagram.root)
    }

    fn namespace(&self) -> String {
        self.package_names.join(".")
    }

    fn line(&mut self, line: &str, line_number: usize) {
        let parser = self.parser;

        match parser.classifier.classify(line, &mut self.classifier_state) {
            LineKind::Unhandled => {}
            LineKind::Note(Some(note)) => {
                let name = note.alias.unwrap_or_else(|| "note".to_string());
                self.add_entity(name, TypeKind::Note { text: note.text }, line_number);
                return;
            }
            LineKind::Comment(Some(text)) => {
                self.add_entity(text.clone(), TypeKind::Comment { text }, line_number);
                return;
            }
            _ => return,
        }

        if let Some(title) = parser.classifier.parse_title(line) {
            self.diagram.set_title(title.to_string());
            return;
        }

        if line == "}" {
            self.close_scope(line, line_number);
            return;
        }

        if let Some(caps) = parser.patterns.package.captures(line) {
            self.open_package(&caps, line, line_number);
            return;
        }

        if let Some(caps) = parser.patterns.declaration.captures(line) {
            self.declare(&caps, line, line_number);
            return;
        }

        if !self.saw_class_construct && is_sequence_line(line) {
            let reason = DiagramError::dialect_mismatch("class", "sequence", line_number);
            warn!(line_number, line, "Sequence syntax in class diagram");
            self.error(line, line_number, Some(reason.to_string()));
            return;
        }

        if let Ok(connection) = parse_connection(line, line_number) {
            self.saw_class_construct = true;
            self.arrow(connection, line, line_number);
            return;
        }

        self.error(line, line_number, None);
    }

    fn error(&mut self, line: &str, line_number: usize, reason: Option<String>) {
        warn!(line_number, line, reason = ?reason, "Unrecognized class diagram line");
        let error = LineError::new(line, line_number);
        self.diagram.add_line_error(match reason {
            Some(reason) => error.with_reason(reason),
            None => error,
        });
    }

    fn add_entity(&mut self, name: String, kind: TypeKind, line_number: usize) -> TypeId {
        let namespace = self.namespace();
        let id = self
            .diagram
            .types
            .alloc(DataType::new(name, namespace, kind).at_line(line_number));
        let package = self.current_package();
        self.diagram.types.add_child(package, id);
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

    fn open_package(&mut self, caps: &Captures<'_>, line: &str, line_number: usize) {
        let keyword = &caps["kw"];
        let Some(name) = caps.name("qname").or_else(|| caps.name("name")) else {
            // unnamed `together {` groups layout only
            let node = self.current_package();
            self.scopes.push(Scope {
                kind: ScopeKind::Package,
                node,
                named: false,
            });
            return;
        };
        let name = name.as_str().to_string();

        let mut path = self.package_names.clone();
        path.push(name.clone());
        let full_name = path.join(".");

        let node = match self.packages_by_name.get(&full_name) {
            Some(&existing) => {
                self.error(
                    line,
                    line_number,
                    Some(format!("Package {} is already defined", full_name)),
                );
                existing
            }
            None => {
                let id = self.add_entity(
                    name.clone(),
                    TypeKind::Package(PackageInfo {
                        keyword: keyword.to_string(),
                        children: Vec::new(),
                    }),
                    line_number,
                );
                if let Some(alias) = caps.name("alias") {
                    let alias = alias.as_str();
                    if self.package_aliases.contains_key(alias) {
                        self.error(line, line_number, Some(format!("Duplicate identifier : {}", alias)));
                    } else {
                        self.package_aliases.insert(alias.to_string(), id);
                        if let Some(package) = self.diagram.types.get_mut(id) {
                            package.alias = Some(alias.to_string());
                        }
                    }
                }
                self.packages_by_name.insert(full_name.clone(), id);
                debug!(package = %full_name, keyword, line_number, "Opened package");
                id
            }
        };

        self.package_names.push(name);
        self.scopes.push(Scope {
            kind: ScopeKind::Package,
            node,
            named: true,
        });
    }

    fn declare(&mut self, caps: &Captures<'_>, line: &str, line_number: usize) {
        let parser = self.parser;
        let Some(decl) = parser.patterns.declared_name.captures(&caps["decl"]) else {
            self.error(line, line_number, Some("malformed declaration".to_string()));
            return;
        };

        let Some(name) = decl.name("qname").or_else(|| decl.name("name")) else {
            self.error(line, line_number, None);
            return;
        };
        let name = name.as_str().to_string();
        let stereotype = decl.name("st").map(|m| m.as_str().trim().to_string());

        let keyword = caps["kw"].split_whitespace().collect::<Vec<_>>().join(" ");
        let (kind, scope_kind) = match keyword.as_str() {
            "abstract class" | "abstract" => (
                TypeKind::Class {
                    is_abstract: true,
                    stereotype,
                },
                ScopeKind::Class,
            ),
            "interface" => (TypeKind::Interface { stereotype }, ScopeKind::Interface),
            "enum" => (TypeKind::Enum, ScopeKind::Class),
            "struct" => (TypeKind::Struct, ScopeKind::Class),
            _ => (
                TypeKind::Class {
                    is_abstract: false,
                    stereotype,
                },
                ScopeKind::Class,
            ),
        };

        let namespace = self.namespace();
        let package = self.current_package();
        let id = match self.types_by_name.get(&name).copied() {
            Some(existing) if self.diagram.types[existing].is_placeholder() => {
                if let Some(data_type) = self.diagram.types.get_mut(existing) {
                    data_type.kind = kind;
                    data_type.namespace = namespace;
                    data_type.line_number = line_number;
                }
                self.diagram.types.add_child(package, existing);
                existing
            }
            Some(existing) => {
                self.error(line, line_number, Some(format!("{} is already declared", name)));
                existing
            }
            None => {
                let id = self.add_entity(name.clone(), kind, line_number);
                self.types_by_name.insert(name.clone(), id);
                id
            }
        };

        if let Some(alias) = decl.name("alias").map(|m| m.as_str()) {
            match self.type_aliases.get(alias) {
                Some(&bound) if bound != id => {
                    self.error(line, line_number, Some(format!("Duplicate identifier : {}", alias)));
                }
                _ => {
                    self.type_aliases.insert(alias.to_string(), id);
                    if let Some(data_type) = self.diagram.types.get_mut(id) {
                        data_type.alias = Some(alias.to_string());
                    }
                }
            }
        }

        self.saw_class_construct = true;
        debug!(name = %name, keyword = %keyword, line_number, "Declared type");

        if let Some(body) = caps.name("inline") {
            self.inline_body(id, scope_kind, body.as_str(), line_number);
        } else if caps.name("open").is_some() {
            self.scopes.push(Scope {
                kind: scope_kind,
                node: id,
                named: false,
            });
        }
    }

    /// Existing type id, or a placeholder created on first mention
    fn type_named(&mut self, name: &str) -> TypeId {
        if let Some(&id) = self.types_by_name.get(name) {
            return id;
        }
        let id = self
            .diagram
            .types
            .alloc(DataType::new(name, "", TypeKind::Placeholder));
        self.types_by_name.insert(name.to_string(), id);
        id
    }

    /// Declared type by name, then alias, then generic-stripped name
    fn resolve_endpoint(&self, name: &str) -> Result<TypeId, ArrowError> {
        let declared = |id: &&TypeId| !self.diagram.types[**id].is_placeholder();

        self.types_by_name
            .get(name)
            .filter(declared)
            .or_else(|| self.type_aliases.get(name))
            .or_else(|| self.types_by_name.get(strip_generics(name)).filter(declared))
            .copied()
            .ok_or_else(|| ArrowError::Unresolved {
                name: name.to_string(),
            })
    }

    fn resolve_arrow(&self, connection: &ParsedConnection) -> Result<(TypeId, TypeId), ArrowError> {
        let left = self.resolve_endpoint(&connection.left.name)?;
        let right = self.resolve_endpoint(&connection.right.name)?;
        if left == right {
            return Err(ArrowError::SameEndpoint {
                name: connection.left.name.clone(),
            });
        }
        Ok((left, right))
    }

    /// Apply an arrow, or hold it until the end of the document when an
    /// endpoint may still be declared further down
    fn arrow(&mut self, connection: ParsedConnection, line: &str, line_number: usize) {
        match self.resolve_arrow(&connection) {
            Ok((left, right)) => self.apply_arrow(&connection, left, right, line_number),
            Err(ArrowError::Unresolved { name }) => {
                trace!(line_number, name = %name, "Deferring arrow");
                self.deferred.push(DeferredArrow {
                    connection,
                    line: line.to_string(),
                    line_number,
                });
            }
            Err(e) => self.error(line, line_number, Some(e.to_string())),
        }
    }

    fn resolve_deferred(&mut self) {
        for pending in std::mem::take(&mut self.deferred) {
            match self.resolve_arrow(&pending.connection) {
                Ok((left, right)) => {
                    self.apply_arrow(&pending.connection, left, right, pending.line_number)
                }
                Err(e) => self.error(&pending.line, pending.line_number, Some(e.to_string())),
            }
        }
    }

    fn apply_arrow(
        &mut self,
        connection: &ParsedConnection,
        left: TypeId,
        right: TypeId,
        line_number: usize,
    ) {
        let arrow = &connection.arrow;
        if arrow.has_diamond() {
            self.composition(connection, left, right, line_number);
            return;
        }

        // `<|--` and `--|>` extend or realize; a bare `--` or `..` extends left to right
        let (child, parent) = if arrow.head.contains('|') {
            (right, left)
        } else if arrow.tail.contains('|') || (arrow.head.is_empty() && arrow.tail.is_empty()) {
            (left, right)
        } else {
            debug!(line_number, head = %arrow.head, tail = %arrow.tail, "Association");
            return;
        };

        let parent_is_interface = self.diagram.types[parent].is_interface();
        if let Some(data_type) = self.diagram.types.get_mut(child) {
            let list = if parent_is_interface {
                &mut data_type.interfaces
            } else {
                &mut data_type.bases
            };
            if !list.contains(&parent) {
                list.push(parent);
            }
        }
        debug!(line_number, interface = parent_is_interface, "Inheritance");
    }

    /// `Owner "1" --* "*" Part : name` gives `Owner` a property typed `Part`
    fn composition(
        &mut self,
        connection: &ParsedConnection,
        owner: TypeId,
        part: TypeId,
        line_number: usize,
    ) {
        let name = connection
            .label
            .clone()
            .unwrap_or_else(|| self.diagram.types[part].name.clone());
        let many = connection
            .right_label
            .as_deref()
            .map(|l| l.contains('*') || l.to_lowercase().contains("many"))
            .unwrap_or(false);

        let mut property = Property::new(name, Some(part)).with_visibility(Visibility::Public);
        if many {
            property = property.with_list_type(ListType::List);
        }
        property.drawn_with_line = true;

        debug!(property = %property.name, line_number, "Composition");
        if let Some(data_type) = self.diagram.types.get_mut(owner) {
            data_type.properties.push(property);
        }
    }

    fn body_line(&mut self, owner: TypeId, kind: ScopeKind, line: &str, line_number: usize) {
        if line == "}" {
            self.close_scope(line, line_number);
            return;
        }
        if line.is_empty() || line.starts_with('\'') || is_separator(line) {
            return;
        }

        if matches!(self.diagram.types[owner].kind, TypeKind::Enum) {
            self.enum_values(owner, line);
            return;
        }
        self.member(owner, kind, line, line_number);
    }

    /// Body written on the declaration line itself; no scope is opened
    fn inline_body(&mut self, owner: TypeId, kind: ScopeKind, body: &str, line_number: usize) {
        let body = body.trim();
        if body.is_empty() {
            return;
        }
        if matches!(self.diagram.types[owner].kind, TypeKind::Enum) {
            self.enum_values(owner, body);
            return;
        }
        for item in split_top_level(body, ',') {
            self.member(owner, kind, item, line_number);
        }
    }

    fn member(&mut self, owner: TypeId, kind: ScopeKind, line: &str, line_number: usize) {
        let parser = self.parser;
        match parser.members.parse_member(line) {
            Some(ParsedMember::Method(method)) => {
                let method = self.build_method(owner, method);
                trace!(method = %method.name, line_number, "Method");
                if let Some(data_type) = self.diagram.types.get_mut(owner) {
                    data_type.methods.push(Arc::new(method));
                }
            }
            Some(ParsedMember::Property(property)) => {
                let property = self.build_property(property);
                trace!(property = %property.name, line_number, "Property");
                if let Some(data_type) = self.diagram.types.get_mut(owner) {
                    data_type.properties.push(property);
                }
            }
            None => {
                trace!(line_number, scope = ?kind, "Raw member line");
                if let Some(data_type) = self.diagram.types.get_mut(owner) {
                    data_type.properties.push(Property::new(line, None));
                }
            }
        }
    }

    fn enum_values(&mut self, owner: TypeId, line: &str) {
        let int = self.type_named("int");
        let values = line.trim_end_matches([',', ';']);
        let properties: Vec<Property> = split_top_level(values, ',')
            .into_iter()
            .map(|value| {
                let name = value.split(['=', '(']).next().unwrap_or(value).trim();
                Property::new(name, Some(int)).with_visibility(Visibility::Public)
            })
            .filter(|p| !p.name.is_empty())
            .collect();
        if let Some(data_type) = self.diagram.types.get_mut(owner) {
            data_type.properties.extend(properties);
        }
    }

    fn typed(&mut self, type_text: &str) -> (ListType, TypeId) {
        let (list_type, element) = list_type_of(type_text);
        (list_type, self.type_named(element))
    }

    fn build_property(&mut self, parsed: ParsedProperty) -> Property {
        let (list_type, object_type) = match parsed.type_text.as_deref() {
            Some(text) => {
                let (list_type, id) = self.typed(text);
                (list_type, Some(id))
            }
            None => (ListType::None, None),
        };
        Property {
            name: parsed.name,
            object_type,
            visibility: parsed.visibility,
            list_type,
            default_value: parsed.default_value,
            is_static: parsed.is_static,
            is_abstract: parsed.is_abstract,
            drawn_with_line: false,
        }
    }

    fn build_method(&mut self, owner: TypeId, parsed: ParsedMethod) -> Method {
        let is_constructor =
            parsed.return_type.is_none() && parsed.name == self.diagram.types[owner].name;
        let return_type = parsed
            .return_type
            .as_deref()
            .map(|text| self.typed(text).1);
        let parameters = parsed
            .parameters
            .into_iter()
            .map(|p| match p.type_text.as_deref() {
                Some(text) => {
                    let (list_type, id) = self.typed(text);
                    Parameter {
                        name: p.name,
                        object_type: Some(id),
                        list_type,
                    }
                }
                None => Parameter {
                    name: p.name,
                    object_type: None,
                    list_type: ListType::None,
                },
            })
            .collect();

        Method {
            name: parsed.name,
            return_type,
            visibility: parsed.visibility,
            parameters,
            is_static: parsed.is_static,
            is_abstract: parsed.is_abstract,
            is_constructor,
        }
    }
}

/// `--`, `..`, `==` and `__` body separators, with or without a caption
fn is_separator(line: &str) -> bool {
    ["--", "..", "==", "__"].iter().any(|sep| line.starts_with(sep))
}

fn is_sequence_line(line: &str) -> bool {
    starts_with_word(line, "participant") || starts_with_word(line, "actor") || line.contains("->>")
}
