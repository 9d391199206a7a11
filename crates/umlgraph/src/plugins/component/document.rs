//! Component diagram document

use crate::core::{
    DataType, DiagramKind, Document, ExplainedError, LineError, PackageInfo, TypeArena, TypeId,
    TypeKind,
};

/// Parsed component diagram
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDiagram {
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub line_errors: Vec<LineError>,
    /// Arrows whose endpoints could not all be resolved, and matcher timeouts
    pub explained_errors: Vec<ExplainedError>,
    pub types: TypeArena,
    pub root: TypeId,
    /// Every named container in declaration order
    pub packages: Vec<TypeId>,
}

impl ComponentDiagram {
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
            explained_errors: Vec::new(),
            types,
            root,
            packages: Vec::new(),
        }
    }

    /// Everything below the root except containers, including component bodies
    pub fn entities(&self) -> impl Iterator<Item = (TypeId, &DataType)> {
        self.types
            .descendants(self.root)
            .into_iter()
            .map(|id| (id, &self.types[id]))
            .filter(|(_, t)| t.package().is_none())
    }

    pub fn components(&self) -> impl Iterator<Item = (TypeId, &DataType)> {
        self.entities().filter(|(_, t)| t.component().is_some())
    }

    /// Entity with the given name, else the given alias
    pub fn find_entity(&self, name: &str) -> Option<TypeId> {
        self.entities()
            .find(|(_, t)| t.name == name)
            .or_else(|| self.entities().find(|(_, t)| t.alias.as_deref() == Some(name)))
            .map(|(id, _)| id)
    }

    pub fn get(&self, id: TypeId) -> &DataType {
        &self.types[id]
    }

    /// True when `from` lists `to` among the entities it exposes
    pub fn exposes(&self, from: TypeId, to: TypeId) -> bool {
        self.types[from]
            .component()
            .map_or(false, |c| c.exposes.contains(&to))
    }

    /// True when `from` lists `to` among the entities it consumes
    pub fn consumes(&self, from: TypeId, to: TypeId) -> bool {
        self.types[from]
            .component()
            .map_or(false, |c| c.consumes.contains(&to))
    }
}

impl Default for ComponentDiagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for ComponentDiagram {
    fn kind(&self) -> DiagramKind {
        DiagramKind::Component
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

    fn has_errors(&self) -> bool {
        !self.line_errors.is_empty() || !self.explained_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ComponentInfo;

    #[test]
    fn test_entities_include_component_bodies() {
        let mut diagram = ComponentDiagram::new();
        let frame = diagram.types.alloc(DataType::new(
            "UI",
            "",
            TypeKind::Package(PackageInfo {
                keyword: "frame".into(),
                children: vec![],
            }),
        ));
        let parent = diagram.types.alloc(
            DataType::new("Parent", "UI", TypeKind::Component(ComponentInfo::default()))
                .with_alias("P"),
        );
        let child = diagram.types.alloc(DataType::new(
            "Child",
            "UI",
            TypeKind::Component(ComponentInfo::default()),
        ));
        let root = diagram.root;
        diagram.types.add_child(root, frame);
        diagram.types.add_child(frame, parent);
        diagram.types.add_child(parent, child);
        diagram.packages.push(frame);

        let names: Vec<_> = diagram.entities().map(|(_, t)| t.name.as_str()).collect();
        assert_eq!(names, vec!["Parent", "Child"]);
        assert_eq!(diagram.find_entity("P"), Some(parent));
        assert_eq!(diagram.entity_count(), 3);
        assert!(!diagram.exposes(parent, child));
    }

    #[test]
    fn test_explained_errors_count_as_errors() {
        let mut diagram = ComponentDiagram::new();
        assert!(!diagram.has_errors());
        diagram
            .explained_errors
            .push(ExplainedError::new("A --> B", 2, "Regex timeout"));
        assert!(diagram.has_errors());
    }
}
