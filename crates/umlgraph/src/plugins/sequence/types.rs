//! Class-type table for sequence resolution
//!
//! A [`TypeTable`] indexes the classes and interfaces of one or more parsed
//! class diagrams by name. It shares the diagrams behind an `Arc`, so cloning
//! a table is cheap and resolved methods keep pointer identity with the
//! class model.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::{split_top_level, DataType, Method, Property, TypeId};
use crate::plugins::class::ClassDiagram;

/// A type in one of the table's class diagrams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Index of the owning diagram in the table
    pub diagram: usize,
    pub id: TypeId,
}

/// A member matched by a message text
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Method(Arc<Method>),
    Property(Property),
}

#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    diagrams: Arc<Vec<ClassDiagram>>,
    by_name: Arc<HashMap<String, Vec<TypeRef>>>,
}

impl TypeTable {
    /// An empty table; every lookup misses
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_diagrams(diagrams: Vec<ClassDiagram>) -> Self {
        let mut by_name: HashMap<String, Vec<TypeRef>> = HashMap::new();
        for (index, diagram) in diagrams.iter().enumerate() {
            for (id, data_type) in diagram.data_types() {
                if data_type.is_class() || data_type.is_interface() {
                    by_name
                        .entry(data_type.name.clone())
                        .or_default()
                        .push(TypeRef { diagram: index, id });
                }
            }
        }
        Self {
            diagrams: Arc::new(diagrams),
            by_name: Arc::new(by_name),
        }
    }

    pub fn diagrams(&self) -> &[ClassDiagram] {
        &self.diagrams
    }

    /// Number of distinct type names
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn lookup(&self, name: &str) -> &[TypeRef] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.lookup(name).is_empty()
    }

    pub fn get(&self, type_ref: TypeRef) -> Option<&DataType> {
        self.diagrams.get(type_ref.diagram)?.types.get(type_ref.id)
    }

    /// Find a member of `name`'s type matching `text`, searching bases too
    ///
    /// Methods match on the exact signature, or on the same name with the same
    /// argument count. Properties match on name.
    pub fn find_member(&self, name: &str, text: &str) -> Option<Member> {
        let call = Call::parse(text);
        self.lookup(name).iter().find_map(|&type_ref| {
            let mut visited = HashSet::new();
            self.member_in(type_ref, text, &call, &mut visited)
        })
    }

    fn member_in(
        &self,
        type_ref: TypeRef,
        text: &str,
        call: &Call<'_>,
        visited: &mut HashSet<TypeRef>,
    ) -> Option<Member> {
        if !visited.insert(type_ref) {
            return None;
        }
        let data_type = self.get(type_ref)?;

        let method = data_type.methods.iter().find(|m| m.signature() == text).or_else(|| {
            data_type
                .methods
                .iter()
                .find(|m| m.name == call.name && Some(m.parameters.len()) == call.arguments)
        });
        if let Some(method) = method {
            return Some(Member::Method(Arc::clone(method)));
        }

        if let Some(property) = data_type
            .properties
            .iter()
            .find(|p| p.name == text || (call.arguments.is_none() && p.name == call.name))
        {
            return Some(Member::Property(property.clone()));
        }

        data_type.bases.iter().find_map(|&base| {
            let base_ref = TypeRef {
                diagram: type_ref.diagram,
                id: base,
            };
            self.member_in(base_ref, text, call, visited)
        })
    }
}

/// `Name(a, b)` split into name and argument count; `None` count without parens
struct Call<'t> {
    name: &'t str,
    arguments: Option<usize>,
}

impl<'t> Call<'t> {
    fn parse(text: &'t str) -> Self {
        let text = text.trim();
        match text.find('(') {
            Some(open) => {
                let inner = text[open + 1..].trim_end().trim_end_matches(')').trim();
                let arguments = if inner.is_empty() {
                    0
                } else {
                    split_top_level(inner, ',').len()
                };
                Call {
                    name: text[..open].trim(),
                    arguments: Some(arguments),
                }
            }
            None => Call {
                name: text,
                arguments: None,
            },
        }
    }
}
