//! Shared entity model for every diagram dialect
//!
//! Every named thing a parser produces is a [`DataType`] stored in the
//! diagram's [`TypeArena`]. References between entities (bases, member types,
//! package children, component relations) are [`TypeId`]s into that arena,
//! so shared and cyclic reference graphs need no reference counting. Methods
//! are the exception: they are held as `Arc<Method>` so a resolved sequence
//! message can point at the very method it matched.

use std::ops::Index;
use std::sync::Arc;

/// Index of a [`DataType`] inside its diagram's [`TypeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Visibility modifier for members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,    // +
    Private,   // -
    Protected, // #
    Internal,  // ~
    #[default]
    None,
}

impl Visibility {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Visibility::Public),
            '-' => Some(Visibility::Private),
            '#' => Some(Visibility::Protected),
            '~' => Some(Visibility::Internal),
            _ => None,
        }
    }

    pub fn to_char(self) -> Option<char> {
        match self {
            Visibility::Public => Some('+'),
            Visibility::Private => Some('-'),
            Visibility::Protected => Some('#'),
            Visibility::Internal => Some('~'),
            Visibility::None => None,
        }
    }
}

/// Collection shape of a property or parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    #[default]
    None,
    Array,
    List,
    ReadOnlyCollection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    /// `None` for untyped member lines
    pub object_type: Option<TypeId>,
    pub visibility: Visibility,
    pub list_type: ListType,
    pub default_value: Option<String>,
    pub is_static: bool,
    pub is_abstract: bool,
    /// Synthesized from a composition arrow rather than a member line
    pub drawn_with_line: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, object_type: Option<TypeId>) -> Self {
        Self {
            name: name.into(),
            object_type,
            visibility: Visibility::None,
            list_type: ListType::None,
            default_value: None,
            is_static: false,
            is_abstract: false,
            drawn_with_line: false,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_list_type(mut self, list_type: ListType) -> Self {
        self.list_type = list_type;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub object_type: Option<TypeId>,
    pub list_type: ListType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    /// `None` for constructors and untyped methods
    pub return_type: Option<TypeId>,
    pub visibility: Visibility,
    pub parameters: Vec<Parameter>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_constructor: bool,
}

impl Method {
    /// `Name(p1, p2)` built from the declared parameter names
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// Extra data carried by component entities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentInfo {
    pub stereotype: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub ports: Vec<String>,
    pub ports_in: Vec<String>,
    pub ports_out: Vec<String>,
    pub exposes: Vec<TypeId>,
    pub consumes: Vec<TypeId>,
    /// Entities declared inside the component's body
    pub children: Vec<TypeId>,
    /// Created on first mention by an arrow, not yet declared
    pub provisional: bool,
}

impl ComponentInfo {
    pub fn has_port(&self, name: &str) -> bool {
        self.ports
            .iter()
            .chain(&self.ports_in)
            .chain(&self.ports_out)
            .any(|p| p == name)
    }
}

/// Container data carried by package entities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageInfo {
    /// Keyword that opened the scope (`package`, `frame`, `node`, ...)
    pub keyword: String,
    pub children: Vec<TypeId>,
}

/// Variant-specific part of a [`DataType`]
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Class {
        is_abstract: bool,
        stereotype: Option<String>,
    },
    Interface {
        stereotype: Option<String>,
    },
    Enum,
    Struct,
    Component(ComponentInfo),
    Package(PackageInfo),
    Comment {
        text: String,
    },
    Note {
        text: String,
    },
    Other {
        text: String,
    },
    /// Referenced by name before (or without) a declaration
    Placeholder,
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Class { .. } => "class",
            TypeKind::Interface { .. } => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Struct => "struct",
            TypeKind::Component(_) => "component",
            TypeKind::Package(_) => "package",
            TypeKind::Comment { .. } => "comment",
            TypeKind::Note { .. } => "note",
            TypeKind::Other { .. } => "other",
            TypeKind::Placeholder => "placeholder",
        }
    }
}

/// A named entity in a diagram
#[derive(Debug, Clone, PartialEq)]
pub struct DataType {
    pub name: String,
    /// Dotted package path, empty at the top level
    pub namespace: String,
    pub alias: Option<String>,
    pub properties: Vec<Property>,
    pub methods: Vec<Arc<Method>>,
    pub bases: Vec<TypeId>,
    pub interfaces: Vec<TypeId>,
    /// 1-based declaration line, 0 for synthetic entities
    pub line_number: usize,
    pub kind: TypeKind,
}

impl DataType {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            alias: None,
            properties: Vec::new(),
            methods: Vec::new(),
            bases: Vec::new(),
            interfaces: Vec::new(),
            line_number: 0,
            kind,
        }
    }

    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = line_number;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// `namespace.name`, or just the name at the top level
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class { .. })
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface { .. })
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, TypeKind::Placeholder)
    }

    pub fn package(&self) -> Option<&PackageInfo> {
        match &self.kind {
            TypeKind::Package(info) => Some(info),
            _ => None,
        }
    }

    pub fn component(&self) -> Option<&ComponentInfo> {
        match &self.kind {
            TypeKind::Component(info) => Some(info),
            _ => None,
        }
    }

    pub fn component_mut(&mut self) -> Option<&mut ComponentInfo> {
        match &mut self.kind {
            TypeKind::Component(info) => Some(info),
            _ => None,
        }
    }

    /// Child entities for packages and components with a body
    pub fn children(&self) -> &[TypeId] {
        match &self.kind {
            TypeKind::Package(info) => &info.children,
            TypeKind::Component(info) => &info.children,
            _ => &[],
        }
    }
}

/// Owner of every [`DataType`] in one diagram
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeArena {
    types: Vec<DataType>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, data_type: DataType) -> TypeId {
        self.types.push(data_type);
        TypeId(self.types.len() - 1)
    }

    pub fn get(&self, id: TypeId) -> Option<&DataType> {
        self.types.get(id.0)
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut DataType> {
        self.types.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &DataType)> {
        self.types.iter().enumerate().map(|(i, t)| (TypeId(i), t))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Append `child` to a package or component body
    ///
    /// Returns false when `parent` cannot hold children.
    pub fn add_child(&mut self, parent: TypeId, child: TypeId) -> bool {
        match self.get_mut(parent).map(|p| &mut p.kind) {
            Some(TypeKind::Package(info)) => {
                info.children.push(child);
                true
            }
            Some(TypeKind::Component(info)) => {
                info.children.push(child);
                true
            }
            _ => false,
        }
    }

    pub fn remove_child(&mut self, parent: TypeId, child: TypeId) {
        match self.get_mut(parent).map(|p| &mut p.kind) {
            Some(TypeKind::Package(info)) => info.children.retain(|&c| c != child),
            Some(TypeKind::Component(info)) => info.children.retain(|&c| c != child),
            _ => {}
        }
    }

    /// Depth-first walk of the tree below `root`, excluding `root` itself
    pub fn descendants(&self, root: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut stack: Vec<TypeId> = self[root].children().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self[id].children().iter().rev().copied());
        }
        out
    }
}

impl Index<TypeId> for TypeArena {
    type Output = DataType;

    fn index(&self, id: TypeId) -> &DataType {
        &self.types[id.0]
    }
}
