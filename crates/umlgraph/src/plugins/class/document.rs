//! Class diagram document
//!
//! Stores the package tree of classes, interfaces, enums and structs.

use crate::core::{
    DataType, DiagramKind, Document, LineError, PackageInfo, TypeArena, TypeId, TypeKind,
};

/// Parsed class diagram
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDiagram {
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub line_errors: Vec<LineError>,
    /// Every entity of this diagram, including undeclared placeholder types
    pub types: TypeArena,
    /// Synthetic unnamed root package
    pub root: TypeId,
}

impl ClassDiagram {
    pub fn new() -> Self {
        let mut types = TypeArena::new();
        let root = types.alloc(DataType::new(
            "",
            "",
            TypeKind::Package(PackageInfo::default()),
        ));
        Self {
            title: None,
            file_name: None,
            line_errors: Vec::new(),
            types,
            root,
        }
    }

    /// Declared entities in tree order, excluding packages and notes
    pub fn data_types(&self) -> impl Iterator<Item = (TypeId, &DataType)> {
        self.types
            .descendants(self.root)
            .into_iter()
            .map(|id| (id, &self.types[id]))
            .filter(|(_, t)| !matches!(t.kind, TypeKind::Package(_) | TypeKind::Note { .. }))
    }

    /// Notes in tree order
    pub fn notes(&self) -> impl Iterator<Item = (TypeId, &DataType)> {
        self.types
            .descendants(self.root)
            .into_iter()
            .map(|id| (id, &self.types[id]))
            .filter(|(_, t)| matches!(t.kind, TypeKind::Note { .. }))
    }

    /// Named packages in tree order
    pub fn packages(&self) -> impl Iterator<Item = (TypeId, &DataType)> {
        self.types
            .descendants(self.root)
            .into_iter()
            .map(|id| (id, &self.types[id]))
            .filter(|(_, t)| t.package().is_some())
    }

    /// Declared class, interface, enum or struct by name or alias
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.data_types()
            .find(|(_, t)| t.name == name || t.alias.as_deref() == Some(name))
            .map(|(id, _)| id)
    }

    pub fn get(&self, id: TypeId) -> &DataType {
        &self.types[id]
    }
}

impl Default for ClassDiagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for ClassDiagram {
    fn kind(&self) -> DiagramKind {
        DiagramKind::Class
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn set_title(&mut self, title: String) {
        self.title = Some(title);
    }

    fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    fn set_file_name(&mut self, file_name: String) {
        self.file_name = Some(file_name);
    }

    fn line_errors(&self) -> &[LineError] {
        &self.line_errors
    }

    fn add_line_error(&mut self, error: LineError) {
        self.line_errors.push(error);
    }

    fn entity_count(&self) -> usize {
        self.types.descendants(self.root).len()
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}
