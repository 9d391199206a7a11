//! Sequence diagram document
//!
//! Lifelines are kept in declaration order. Messages, control blocks and
//! activation lines form an ordered tree whose block sections live in an
//! index-addressed arena.

use std::fmt;
use std::sync::Arc;

use super::types::TypeRef;
use crate::core::{DiagramKind, Document, ExplainedError, LineError, Method, Property};

/// Line style for message arrows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// `->`
    Solid,
    /// `-->`
    Dotted,
}

/// Arrow head style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowHead {
    /// `>`
    Filled,
    /// `>>`
    Open,
    /// `x`
    Lost,
}

/// Line and head style of a message arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowType {
    pub line: LineStyle,
    pub head: ArrowHead,
}

impl ArrowType {
    /// Style of an arrow glyph such as `-->>` or `<-x`
    pub fn from_glyph(glyph: &str) -> Self {
        let line = if glyph.contains("--") {
            LineStyle::Dotted
        } else {
            LineStyle::Solid
        };
        let head = if glyph.contains(">>") || glyph.contains("<<") {
            ArrowHead::Open
        } else if glyph.ends_with('x') || glyph.starts_with('x') {
            ArrowHead::Lost
        } else {
            ArrowHead::Filled
        };
        Self { line, head }
    }
}

impl Default for ArrowType {
    fn default() -> Self {
        Self {
            line: LineStyle::Solid,
            head: ArrowHead::Filled,
        }
    }
}

/// A participant column
#[derive(Debug, Clone, PartialEq)]
pub struct Lifeline {
    /// Declaring keyword, e.g. `participant` or `actor`
    pub keyword: String,
    pub name: String,
    /// Name messages refer to; equals `name` when no alias was given
    pub alias: String,
    /// Class type the lifeline's name resolved to
    pub data_type: Option<TypeRef>,
    pub line_number: usize,
}

impl Lifeline {
    /// Only `participant` and `component` lifelines are checked against the class model
    pub fn is_free_formed(&self) -> bool {
        !matches!(self.keyword.as_str(), "participant" | "component")
    }
}

/// What a message does
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A method declared on the destination's type or one of its bases
    Method(Arc<Method>),
    /// A property declared on the destination's type or one of its bases
    Property(Property),
    /// Quoted free text
    Custom(String),
    /// `<<create>>` message
    Create(String),
    /// Return from the method the previous message called
    ReturnFromMethod(Box<Action>),
    /// `return Name` where `Name` is a lifeline
    LifelineReturn(String),
    Unknown(String),
}

impl Action {
    /// Text form used in diagnostics
    pub fn signature(&self) -> String {
        match self {
            Action::Method(method) => method.signature(),
            Action::Property(property) => property.name.clone(),
            Action::Custom(text) | Action::Create(text) | Action::Unknown(text) => text.clone(),
            Action::ReturnFromMethod(action) => format!("return {}", action.signature()),
            Action::LifelineReturn(name) => format!("return {name}"),
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Action::ReturnFromMethod(_) | Action::LifelineReturn(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// A message between lifelines
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Index into [`SequenceDiagram::lifelines`]
    pub from: Option<usize>,
    pub to: Option<usize>,
    /// Names as written, before lifeline lookup
    pub from_name: Option<String>,
    pub to_name: Option<String>,
    pub action: Action,
    pub arrow: ArrowType,
    pub line_number: usize,
}

/// Index of a block section in [`SequenceDiagram::blocks`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    If,
    Else,
    IfNoElse,
    Loop,
    Parallel,
    Try,
    Catch,
    Finally,
    Break,
    Critical,
    Group,
}

impl BlockKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "alt" => BlockKind::If,
            "else" => BlockKind::Else,
            "opt" => BlockKind::IfNoElse,
            "loop" => BlockKind::Loop,
            "par" => BlockKind::Parallel,
            "try" => BlockKind::Try,
            "catch" => BlockKind::Catch,
            "finally" => BlockKind::Finally,
            "break" => BlockKind::Break,
            "critical" => BlockKind::Critical,
            "group" => BlockKind::Group,
            _ => return None,
        })
    }

    pub fn keywords() -> &'static [&'static str] {
        &[
            "alt", "else", "opt", "loop", "par", "try", "catch", "finally", "break", "critical",
            "group",
        ]
    }

    /// Sections that continue the block opened before them
    pub fn is_continuation(self) -> bool {
        matches!(self, BlockKind::Else | BlockKind::Catch | BlockKind::Finally)
    }
}

/// One section of a control block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSection {
    pub kind: BlockKind,
    /// Guard or label after the keyword
    pub text: String,
    pub entities: Vec<OrderedEntity>,
    /// Enclosing section, `None` at the top level
    pub parent: Option<BlockId>,
    pub line_number: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderedEntity {
    Connection(Connection),
    Block(BlockId),
    /// `activate`, `deactivate` and `destroy` lines
    Other { text: String, line_number: usize },
}

/// Parsed sequence diagram
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDiagram {
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub line_errors: Vec<LineError>,
    pub lifelines: Vec<Lifeline>,
    /// Top-level entities in source order
    pub entities: Vec<OrderedEntity>,
    pub blocks: Vec<BlockSection>,
    /// Cleared by the `'@@novalidate` directive
    pub validate_against_classes: bool,
    /// Set by the `'@@laxmode` directive
    pub lax_mode: bool,
    /// References the class model could not account for
    pub warnings: Vec<ExplainedError>,
}

impl SequenceDiagram {
    pub fn new() -> Self {
        Self {
            title: None,
            file_name: None,
            line_errors: Vec::new(),
            lifelines: Vec::new(),
            entities: Vec::new(),
            blocks: Vec::new(),
            validate_against_classes: true,
            lax_mode: false,
            warnings: Vec::new(),
        }
    }

    /// Lifeline referred to as `alias`, falling back to its name
    pub fn lifeline_index(&self, alias: &str) -> Option<usize> {
        self.lifelines
            .iter()
            .position(|l| l.alias == alias)
            .or_else(|| self.lifelines.iter().position(|l| l.name == alias))
    }

    pub fn lifeline(&self, alias: &str) -> Option<&Lifeline> {
        self.lifeline_index(alias).map(|i| &self.lifelines[i])
    }

    pub fn block(&self, id: BlockId) -> &BlockSection {
        &self.blocks[id.0]
    }

    /// Append a section under `parent`, or at the top level
    pub fn add_block(&mut self, section: BlockSection) -> BlockId {
        let id = BlockId(self.blocks.len());
        let parent = section.parent;
        self.blocks.push(section);
        self.push_entity(parent, OrderedEntity::Block(id));
        id
    }

    pub fn push_entity(&mut self, parent: Option<BlockId>, entity: OrderedEntity) {
        match parent {
            Some(id) => self.blocks[id.0].entities.push(entity),
            None => self.entities.push(entity),
        }
    }

    /// Every connection, depth-first in source order
    pub fn connections(&self) -> Vec<&Connection> {
        let mut found = Vec::new();
        self.collect_connections(&self.entities, &mut found);
        found
    }

    fn collect_connections<'a>(&'a self, entities: &'a [OrderedEntity], found: &mut Vec<&'a Connection>) {
        for entity in entities {
            match entity {
                OrderedEntity::Connection(connection) => found.push(connection),
                OrderedEntity::Block(id) => self.collect_connections(&self.block(*id).entities, found),
                OrderedEntity::Other { .. } => {}
            }
        }
    }

    pub fn lifeline_name(&self, index: Option<usize>) -> Option<&str> {
        index.map(|i| self.lifelines[i].alias.as_str())
    }
}

impl Default for SequenceDiagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for SequenceDiagram {
    fn kind(&self) -> DiagramKind {
        DiagramKind::Sequence
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
        let nested: usize = self.blocks.iter().map(|b| b.entities.len()).sum();
        self.lifelines.len() + self.entities.len() + nested
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(line_number: usize) -> Connection {
        Connection {
            from: None,
            to: None,
            from_name: None,
            to_name: None,
            action: Action::Unknown(format!("m{line_number}")),
            arrow: ArrowType::default(),
            line_number,
        }
    }

    #[test]
    fn test_connections_walk_blocks_in_order() {
        let mut diagram = SequenceDiagram::new();
        diagram.push_entity(None, OrderedEntity::Connection(connection(1)));
        let block = diagram.add_block(BlockSection {
            kind: BlockKind::Loop,
            text: "forever".into(),
            entities: vec![],
            parent: None,
            line_number: 2,
        });
        diagram.push_entity(Some(block), OrderedEntity::Connection(connection(3)));
        diagram.push_entity(None, OrderedEntity::Connection(connection(5)));

        let lines: Vec<_> = diagram.connections().iter().map(|c| c.line_number).collect();
        assert_eq!(lines, vec![1, 3, 5]);
        assert_eq!(diagram.entity_count(), 4);
    }

    #[test]
    fn test_arrow_styles() {
        assert_eq!(ArrowType::from_glyph("->"), ArrowType::default());
        assert_eq!(ArrowType::from_glyph("-->>").line, LineStyle::Dotted);
        assert_eq!(ArrowType::from_glyph("-->>").head, ArrowHead::Open);
        assert_eq!(ArrowType::from_glyph("->x").head, ArrowHead::Lost);
    }

    #[test]
    fn test_lifeline_lookup_prefers_alias() {
        let mut diagram = SequenceDiagram::new();
        diagram.lifelines.push(Lifeline {
            keyword: "actor".into(),
            name: "User".into(),
            alias: "U".into(),
            data_type: None,
            line_number: 2,
        });
        assert_eq!(diagram.lifeline_index("U"), Some(0));
        assert_eq!(diagram.lifeline_index("User"), Some(0));
        assert!(diagram.lifeline("X").is_none());
        assert!(diagram.lifelines[0].is_free_formed());
    }

    #[test]
    fn test_block_keywords_round_trip() {
        for keyword in BlockKind::keywords() {
            assert!(BlockKind::from_keyword(keyword).is_some());
        }
        assert!(BlockKind::Catch.is_continuation());
        assert!(!BlockKind::Try.is_continuation());
    }
}
