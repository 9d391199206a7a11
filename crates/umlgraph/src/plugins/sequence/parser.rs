//! Sequence diagram parser
//!
//! Lifeline declarations bind aliases to class types from a [`TypeTable`].
//! Messages resolve their action text against the destination's type, and
//! control blocks nest through a stack of open sections.

use anyhow::Result;
use regex::{Captures, Regex};
use tracing::{debug, info, span, trace, warn, Level};

use super::document::{
    Action, ArrowType, BlockId, BlockKind, BlockSection, Connection, Lifeline, OrderedEntity,
    SequenceDiagram,
};
use super::types::{Member, TypeTable};
use super::SequenceDetector;
use crate::core::{
    numbered_lines, starts_with_word, strip_generics, unquote, ClassifierState, Detector,
    DiagramError, Document, ExplainedError, LineClassifier, LineError, LineKind, ParseFlags,
    ParseOptions, Parser,
};

const NO_VALIDATE: &str = "'@@novalidate";
const LAX_MODE: &str = "'@@laxmode";

/// Line prefixes accepted without producing an entity
const TOLERATED: &[&str] = &[
    "hide", "show", "remove", "scale", "autonumber", "header", "footer", "newpage",
    "autoactivate", "return", "box", "delay", "space", "ref", "end box", "end ref",
];

/// Compiled line patterns for the sequence dialect
#[derive(Debug, Clone)]
struct SequencePatterns {
    lifeline: Regex,
    message: Regex,
    arrow_decoration: Regex,
}

impl SequencePatterns {
    fn compile() -> Result<Self, DiagramError> {
        Ok(Self {
            lifeline: Regex::new(
                r#"^(?P<kw>participant|actor|control|component|database|boundary|entity|collections|queue|create)\s+(?:"(?P<qname>[^"]+)"|(?P<name>[\w.]+(?:\s*<[^>]*>)?))(?:\s+as\s+(?:"(?P<qalias>[^"]+)"|(?P<alias>[\w.]+)))?(?:\s*<<[^>]*>>)?(?:\s*#[\w#]+)?(?:\s+order\s+\d+)?$"#,
            )?,
            message: Regex::new(
                r#"^(?:(?P<from>"[^"]+"|[\w.]+|\[)\s*)?(?P<arrow>[<>ox/\\*]*-+(?:\[[^\]]*\]|left|right|up|down)?-*[<>ox/\\*]*)\s*(?P<to>"[^"]+"|[\w.]+|\])?\s*(?:\+\+|--|\*\*|!!)?$"#,
            )?,
            arrow_decoration: Regex::new(r"\[[^\]]*\]|left|right|up|down")?,
        })
    }
}

/// Parser for sequence diagrams
pub struct SequenceParser {
    patterns: SequencePatterns,
    classifier: LineClassifier,
    options: ParseOptions,
}

impl SequenceParser {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self::compile(options).expect("built-in sequence patterns are valid")
    }

    /// Build a parser, surfacing pattern compilation failures
    pub fn compile(options: ParseOptions) -> Result<Self, DiagramError> {
        Ok(Self {
            patterns: SequencePatterns::compile()?,
            classifier: LineClassifier::compile(ParseFlags::ALL)?,
            options,
        })
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse into a fresh diagram, resolving messages against `types`
    pub fn parse_document(&self, input: &str, types: &TypeTable) -> Result<SequenceDiagram, DiagramError> {
        let mut diagram = SequenceDiagram::new();
        self.parse_into(input, types, &mut diagram)?;
        Ok(diagram)
    }

    pub fn parse_into(
        &self,
        input: &str,
        types: &TypeTable,
        diagram: &mut SequenceDiagram,
    ) -> Result<(), DiagramError> {
        let span = span!(Level::INFO, "parse_sequence_diagram", input_len = input.len());
        let _enter = span.enter();

        let mut builder = SequenceBuilder::new(self, types, diagram);
        builder.run(input)?;

        if !diagram.validate_against_classes {
            diagram.warnings.clear();
        }

        info!(
            lifelines = diagram.lifelines.len(),
            connections = diagram.connections().len(),
            line_errors = diagram.line_errors.len(),
            warnings = diagram.warnings.len(),
            "Parsed sequence diagram"
        );
        Ok(())
    }

    /// Tokenize one message line
    fn message<'l>(&self, line: &'l str) -> Option<Message<'l>> {
        let (head, text) = match line.find(':') {
            Some(pos) => (line[..pos].trim(), line[pos + 1..].trim()),
            None => (line, ""),
        };
        let caps = self.patterns.message.captures(head)?;
        let arrow = caps.name("arrow")?.as_str();

        let plain = self.patterns.arrow_decoration.replace_all(arrow, "");
        if !plain.contains("->") && !plain.contains("<-") {
            return None;
        }

        Some(Message {
            from: endpoint(&caps, "from"),
            arrow,
            to: endpoint(&caps, "to"),
            text,
        })
    }
}

impl Default for SequenceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<SequenceDiagram> for SequenceParser {
    /// Parse without a class model; every action stays unresolved
    fn parse(&self, input: &str, document: &mut SequenceDiagram) -> Result<()> {
        self.parse_into(input, &TypeTable::new(), document)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sequence"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        SequenceDetector::new().detect(input)
    }
}

/// Message tokens; endpoints are unquoted and `[`/`]` count as absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Message<'l> {
    from: Option<&'l str>,
    arrow: &'l str,
    to: Option<&'l str>,
    text: &'l str,
}

fn endpoint<'l>(caps: &Captures<'l>, group: &str) -> Option<&'l str> {
    caps.name(group)
        .map(|m| unquote(m.as_str()))
        .filter(|name| *name != "[" && *name != "]")
}

struct SequenceBuilder<'p, 'd> {
    parser: &'p SequenceParser,
    types: &'p TypeTable,
    diagram: &'d mut SequenceDiagram,
    blocks: Vec<BlockId>,
    classifier_state: ClassifierState,
    in_legend: bool,
    /// Action of the last message that was not itself a return
    pending_call: Option<Action>,
}

impl<'p, 'd> SequenceBuilder<'p, 'd> {
    fn new(parser: &'p SequenceParser, types: &'p TypeTable, diagram: &'d mut SequenceDiagram) -> Self {
        Self {
            parser,
            types,
            diagram,
            blocks: Vec::new(),
            classifier_state: ClassifierState::new(),
            in_legend: false,
            pending_call: None,
        }
    }

    fn run(&mut self, input: &str) -> Result<(), DiagramError> {
        let mut started = false;

        for (line_number, line) in numbered_lines(input) {
            self.parser.options.check_cancelled(line_number)?;
            trace!(line_number, line, "Classifying line");

            if line == NO_VALIDATE {
                self.diagram.validate_against_classes = false;
                continue;
            }
            if line == LAX_MODE {
                self.diagram.lax_mode = true;
                continue;
            }

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

            self.line(line, line_number);
        }

        if !self.blocks.is_empty() {
            debug!(open = self.blocks.len(), "Blocks left open at end of diagram");
        }
        Ok(())
    }

    fn line(&mut self, line: &str, line_number: usize) {
        if self.in_legend {
            if line.starts_with("endlegend") || line.starts_with("end legend") {
                self.in_legend = false;
            }
            return;
        }

        let parser = self.parser;
        if parser.classifier.classify(line, &mut self.classifier_state) != LineKind::Unhandled {
            return;
        }

        if let Some(title) = parser.classifier.parse_title(line) {
            self.diagram.set_title(title.to_string());
            return;
        }

        if ["class", "interface", "package"].iter().any(|kw| starts_with_word(line, kw)) {
            let reason = DiagramError::dialect_mismatch("sequence", "class", line_number);
            self.error(line, line_number, Some(reason.to_string()));
            return;
        }

        if let Some(caps) = parser.patterns.lifeline.captures(line) {
            self.lifeline(&caps, line, line_number);
            return;
        }

        if parser.options.just_lifelines {
            return;
        }

        if let Some(kind) = block_keyword(line) {
            self.open_block(kind, line, line_number);
        } else if line == "end" || (starts_with_word(line, "end") && self.is_block_end(line)) {
            self.close_block(line, line_number);
        } else if let Some(message) = parser.message(line) {
            self.connection(message, line, line_number);
        } else if ["activate", "deactivate", "destroy"]
            .iter()
            .any(|kw| starts_with_word(line, kw))
        {
            let parent = self.blocks.last().copied();
            self.diagram.push_entity(
                parent,
                OrderedEntity::Other {
                    text: line.to_string(),
                    line_number,
                },
            );
        } else if starts_with_word(line, "legend") {
            self.in_legend = !line.ends_with("endlegend");
        } else if !is_tolerated(line) {
            self.error(line, line_number, None);
        }
    }

    /// `end` followed by a block label rather than `end box` or `end note`
    fn is_block_end(&self, line: &str) -> bool {
        !["end box", "end note", "end ref", "end legend"]
            .iter()
            .any(|t| line.starts_with(t))
    }

    fn error(&mut self, line: &str, line_number: usize, reason: Option<String>) {
        warn!(line_number, line, reason = ?reason, "Unrecognized sequence diagram line");
        let error = LineError::new(line, line_number);
        self.diagram.add_line_error(match reason {
            Some(reason) => error.with_reason(reason),
            None => error,
        });
    }

    fn warning(&mut self, line: &str, line_number: usize, explanation: String) {
        debug!(line_number, explanation = %explanation, "Sequence warning");
        self.diagram
            .warnings
            .push(ExplainedError::new(line, line_number, explanation));
    }

    fn lifeline(&mut self, caps: &Captures<'_>, line: &str, line_number: usize) {
        let keyword = caps["kw"].to_string();
        let name = caps
            .name("qname")
            .or_else(|| caps.name("name"))
            .map_or("", |m| m.as_str())
            .to_string();
        let alias = caps
            .name("qalias")
            .or_else(|| caps.name("alias"))
            .map_or_else(|| name.clone(), |m| m.as_str().to_string());

        let data_type = self
            .types
            .lookup(&name)
            .first()
            .or_else(|| self.types.lookup(strip_generics(&name)).first())
            .copied();

        debug!(keyword = %keyword, name = %name, alias = %alias, resolved = data_type.is_some(), "Lifeline");
        let lifeline = Lifeline {
            keyword,
            name,
            alias,
            data_type,
            line_number,
        };
        if !lifeline.is_free_formed() && lifeline.data_type.is_none() {
            let explanation = format!("{} is not a known type for lifeline", lifeline.name);
            self.warning(line, line_number, explanation);
        }
        self.diagram.lifelines.push(lifeline);
    }

    fn open_block(&mut self, kind: BlockKind, line: &str, line_number: usize) {
        let keyword_len = line
            .find(|c: char| c.is_whitespace() || c == '"')
            .unwrap_or(line.len());
        let text = line[keyword_len..].trim().to_string();

        let parent = if kind.is_continuation() {
            self.blocks
                .last()
                .and_then(|&id| self.diagram.block(id).parent)
        } else {
            self.blocks.last().copied()
        };

        debug!(?kind, text = %text, line_number, "Block section");
        let id = self.diagram.add_block(BlockSection {
            kind,
            text,
            entities: Vec::new(),
            parent,
            line_number,
        });
        self.blocks.push(id);
    }

    /// Close the innermost block together with its continuation sections
    fn close_block(&mut self, line: &str, line_number: usize) {
        let Some(mut closed) = self.blocks.pop() else {
            self.error(line, line_number, Some("end without an open block".into()));
            return;
        };
        while self.diagram.block(closed).kind.is_continuation() {
            match self.blocks.pop() {
                Some(id) => closed = id,
                None => break,
            }
        }
    }

    fn connection(&mut self, message: Message<'_>, line: &str, line_number: usize) {
        let from = message.from.and_then(|name| self.diagram.lifeline_index(name));
        let to = message.to.and_then(|name| self.diagram.lifeline_index(name));

        let action = self.resolve_action(&message, to);
        if !action.is_return() {
            self.pending_call = Some(action.clone());
        }

        self.check_connection(&message, from, to, &action, line, line_number);

        debug!(from = ?message.from, to = ?message.to, action = %action, "Message");
        let connection = Connection {
            from,
            to,
            from_name: message.from.map(str::to_string),
            to_name: message.to.map(str::to_string),
            action,
            arrow: ArrowType::from_glyph(message.arrow),
            line_number,
        };
        let parent = self.blocks.last().copied();
        self.diagram
            .push_entity(parent, OrderedEntity::Connection(connection));
    }

    fn resolve_action(&mut self, message: &Message<'_>, to: Option<usize>) -> Action {
        let text = message.text;

        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            return Action::Custom(unquote(text).to_string());
        }

        let member = to
            .and_then(|i| self.diagram.lifelines[i].data_type)
            .and_then(|r| self.types.get(r))
            .and_then(|t| self.types.find_member(&t.name, text));
        match member {
            Some(Member::Method(method)) => return Action::Method(method),
            Some(Member::Property(property)) => return Action::Property(property),
            None => {}
        }

        if text.starts_with("<<create>>") {
            return Action::Create(text.to_string());
        }

        if starts_with_word(text, "return") {
            let rest = text["return".len()..].trim();
            if let Some(call) = self.pending_call.take() {
                return Action::ReturnFromMethod(Box::new(call));
            }
            if !rest.is_empty() && self.diagram.lifeline_index(rest).is_some() {
                return Action::LifelineReturn(rest.to_string());
            }
            if message.from.is_none() && message.arrow.starts_with('<') {
                return Action::ReturnFromMethod(Box::new(Action::Unknown(rest.to_string())));
            }
        }

        Action::Unknown(text.to_string())
    }

    fn check_connection(
        &mut self,
        message: &Message<'_>,
        from: Option<usize>,
        to: Option<usize>,
        action: &Action,
        line: &str,
        line_number: usize,
    ) {
        let from_name = message.from.unwrap_or_default();
        let to_name = message.to.unwrap_or_default();

        let to_free_formed = to.map_or(false, |i| self.diagram.lifelines[i].is_free_formed());
        if matches!(action, Action::Unknown(_)) && !to_free_formed {
            let explanation = format!(
                "Action {} is unknown for {} to {}",
                action.signature(),
                from_name,
                to_name
            );
            self.warning(line, line_number, explanation);
        }

        let from_missing = message.from.is_some() && from.is_none();
        let to_missing = message.to.is_some() && to.is_none();
        if from_missing || to_missing {
            let explanation = format!("From {from_name} To {to_name} is not defined in participants");
            self.warning(line, line_number, explanation);
        }
    }
}

fn block_keyword(line: &str) -> Option<BlockKind> {
    BlockKind::keywords()
        .iter()
        .find(|kw| starts_with_word(line, kw))
        .and_then(|kw| BlockKind::from_keyword(kw))
}

fn is_tolerated(line: &str) -> bool {
    line.starts_with("...")
        || line.starts_with("||")
        || line.starts_with("==")
        || line.contains("[hidden]")
        || line.starts_with("end note")
        || line.starts_with("endlegend")
        || TOLERATED.iter().any(|kw| starts_with_word(line, kw))
}
