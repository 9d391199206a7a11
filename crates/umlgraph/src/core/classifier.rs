//! Line classifier for constructs shared by every dialect
//!
//! Comments, notes, skin parameters, preprocessor directives and layout
//! directives look the same in class, component and sequence diagrams. The
//! classifier recognizes them one line at a time and tracks multi-line
//! constructs in a [`ClassifierState`] owned by the caller, so a classifier
//! value itself is immutable and shareable.

use std::ops::BitOr;

use regex::Regex;
use tracing::trace;

use super::DiagramError;

/// Bit-set selecting which shared categories are active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseFlags(u8);

impl ParseFlags {
    pub const TITLE: ParseFlags = ParseFlags(1);
    pub const NOTE: ParseFlags = ParseFlags(2);
    pub const DIRECTION: ParseFlags = ParseFlags(4);
    pub const SKIN_PARAM: ParseFlags = ParseFlags(8);
    pub const PREPROCESSOR: ParseFlags = ParseFlags(16);
    pub const COMMENT: ParseFlags = ParseFlags(32);
    pub const ALL: ParseFlags = ParseFlags(63);

    pub fn contains(self, other: ParseFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ParseFlags {
    type Output = ParseFlags;

    fn bitor(self, rhs: ParseFlags) -> ParseFlags {
        ParseFlags(self.0 | rhs.0)
    }
}

impl Default for ParseFlags {
    fn default() -> Self {
        ParseFlags::ALL
    }
}

/// Payload of a complete note
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteData {
    /// `left`, `right`, `top`, `bottom`, `over` or `on link`
    pub placement: Option<String>,
    pub target: Option<String>,
    pub alias: Option<String>,
    pub text: String,
}

/// Result of classifying one line
///
/// Payload-carrying variants hold `Some` on the line that completes the
/// construct and `None` on lines swallowed inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Blank line (`None`) or layout directive (`Some(text)`)
    Other(Option<String>),
    Note(Option<NoteData>),
    /// `Some(text)` on the opening `skinparam` line
    SkinParam(Option<String>),
    /// Full comment text once the comment is complete
    Comment(Option<String>),
    Preprocessor,
    /// Not a shared construct; the dialect parser handles it
    Unhandled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NoteBuffer {
    data: NoteData,
    lines: Vec<String>,
}

/// Per-parse swallowing state for multi-line constructs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierState {
    swallowing_note: Option<NoteBuffer>,
    swallowing_skinparam: bool,
    swallowing_comment: Option<Vec<String>>,
}

impl ClassifierState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while inside a multi-line note, skin-param block or comment
    pub fn is_swallowing(&self) -> bool {
        self.swallowing_note.is_some()
            || self.swallowing_skinparam
            || self.swallowing_comment.is_some()
    }
}

/// Recognizer for the shared line categories
#[derive(Debug, Clone)]
pub struct LineClassifier {
    flags: ParseFlags,
    note_placed: Regex,
    note_quoted: Regex,
    note_alias: Regex,
}

impl LineClassifier {
    /// Compile the note patterns for the given categories
    pub fn compile(flags: ParseFlags) -> Result<Self, DiagramError> {
        Ok(Self {
            flags,
            note_placed: Regex::new(
                r"^(?P<placement>left|right|top|bottom|over|on link|on)(?:\s+of)?(?:\s+(?P<target>[^:]+?))?\s*(?::\s*(?P<text>.*))?$",
            )?,
            note_quoted: Regex::new(r#"^"(?P<text>[^"]*)"\s+as\s+(?P<alias>[\w.]+)$"#)?,
            note_alias: Regex::new(r"^as\s+(?P<alias>[\w.]+)$")?,
        })
    }

    pub fn new(flags: ParseFlags) -> Self {
        Self::compile(flags).expect("built-in classifier patterns are valid")
    }

    pub fn flags(&self) -> ParseFlags {
        self.flags
    }

    /// Classify one trimmed line, updating `state`
    pub fn classify(&self, line: &str, state: &mut ClassifierState) -> LineKind {
        if let Some(kind) = self.continue_swallowing(line, state) {
            return kind;
        }

        if line.is_empty() {
            return LineKind::Other(None);
        }

        if self.flags.contains(ParseFlags::DIRECTION)
            && (line == "left to right direction" || line == "top to bottom direction")
        {
            return LineKind::Other(Some(line.to_string()));
        }

        if self.flags.contains(ParseFlags::COMMENT) {
            if let Some(kind) = classify_comment(line, state) {
                return kind;
            }
        }

        if self.flags.contains(ParseFlags::PREPROCESSOR) && line.starts_with('!') {
            return LineKind::Preprocessor;
        }

        if self.flags.contains(ParseFlags::SKIN_PARAM) && starts_with_word(line, "skinparam") {
            state.swallowing_skinparam = line.ends_with('{');
            return LineKind::SkinParam(Some(line.to_string()));
        }

        if self.flags.contains(ParseFlags::NOTE) {
            if let Some(rest) = note_body(line) {
                return self.classify_note(rest, state);
            }
        }

        LineKind::Unhandled
    }

    fn continue_swallowing(&self, line: &str, state: &mut ClassifierState) -> Option<LineKind> {
        if let Some(lines) = state.swallowing_comment.as_mut() {
            lines.push(line.to_string());
            if line.starts_with("'/") || line.ends_with("'/") {
                let text = lines.join("\n");
                state.swallowing_comment = None;
                return Some(LineKind::Comment(Some(text)));
            }
            return Some(LineKind::Comment(None));
        }

        if state.swallowing_skinparam {
            if line == "}" {
                state.swallowing_skinparam = false;
            }
            return Some(LineKind::SkinParam(None));
        }

        if let Some(buffer) = state.swallowing_note.as_mut() {
            if is_note_terminator(line) {
                let mut data = std::mem::take(&mut buffer.data);
                data.text = buffer.lines.join("\n");
                state.swallowing_note = None;
                trace!(alias = ?data.alias, "Closed multi-line note");
                return Some(LineKind::Note(Some(data)));
            }
            buffer.lines.push(line.to_string());
            return Some(LineKind::Note(None));
        }

        None
    }

    fn classify_note(&self, rest: &str, state: &mut ClassifierState) -> LineKind {
        if let Some(caps) = self.note_quoted.captures(rest) {
            return LineKind::Note(Some(NoteData {
                text: caps["text"].to_string(),
                alias: Some(caps["alias"].to_string()),
                ..Default::default()
            }));
        }

        let single_line = find_unescaped_colon(rest).is_some();
        let mut data = NoteData::default();

        if let Some(caps) = self.note_alias.captures(rest) {
            data.alias = Some(caps["alias"].to_string());
        } else if let Some(caps) = self.note_placed.captures(rest) {
            data.placement = Some(caps["placement"].to_string());
            data.target = caps.name("target").map(|m| m.as_str().trim().to_string());
            data.text = caps
                .name("text")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
        } else if let Some(pos) = find_unescaped_colon(rest) {
            data.text = rest[pos + 1..].trim().to_string();
        }

        if single_line {
            LineKind::Note(Some(data))
        } else {
            state.swallowing_note = Some(NoteBuffer {
                data,
                lines: Vec::new(),
            });
            LineKind::Note(None)
        }
    }

    /// Match `@startuml` with an optional trailing title
    ///
    /// Returns `Some(title)` on a start line, where the title is `None` when
    /// nothing follows the marker.
    pub fn parse_start<'a>(&self, line: &'a str) -> Option<Option<&'a str>> {
        let rest = line.strip_prefix("@startuml")?;
        let rest = rest.trim();
        Some(if rest.is_empty() { None } else { Some(rest) })
    }

    /// Match `title Text`
    pub fn parse_title<'a>(&self, line: &'a str) -> Option<&'a str> {
        if !self.flags.contains(ParseFlags::TITLE) || !starts_with_word(line, "title") {
            return None;
        }
        Some(line["title".len()..].trim())
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(ParseFlags::ALL)
    }
}

fn classify_comment(line: &str, state: &mut ClassifierState) -> Option<LineKind> {
    if line.starts_with("/'") {
        if line.len() >= 4 && line.ends_with("'/") {
            return Some(LineKind::Comment(Some(line.to_string())));
        }
        state.swallowing_comment = Some(vec![line.to_string()]);
        return Some(LineKind::Comment(None));
    }
    if line.starts_with('\'') && !line.starts_with("'/") {
        return Some(LineKind::Comment(Some(line.to_string())));
    }
    None
}

/// Text after the note keyword, for `note`, `hnote`, `rnote` and `/ note`
fn note_body(line: &str) -> Option<&str> {
    let line = match line.strip_prefix('/') {
        Some(rest) => rest.trim_start(),
        None => line,
    };
    ["note", "hnote", "rnote"]
        .iter()
        .find(|kw| starts_with_word(line, kw))
        .map(|kw| line[kw.len()..].trim())
}

fn is_note_terminator(line: &str) -> bool {
    ["end note", "endnote", "endhnote", "endrnote"]
        .iter()
        .any(|t| line.starts_with(t))
}

fn find_unescaped_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .find(|&(i, &b)| b == b':' && (i == 0 || bytes[i - 1] != b'\\'))
        .map(|(i, _)| i)
}

/// `line` starts with `word` followed by whitespace, a quote or the end
pub fn starts_with_word(line: &str, word: &str) -> bool {
    match line.strip_prefix(word) {
        Some(rest) => rest
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || c == '"'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_all(lines: &[&str]) -> Vec<LineKind> {
        let classifier = LineClassifier::default();
        let mut state = ClassifierState::new();
        lines
            .iter()
            .map(|l| classifier.classify(l, &mut state))
            .collect()
    }

    #[test]
    fn test_flags() {
        let flags = ParseFlags::NOTE | ParseFlags::COMMENT;
        assert!(flags.contains(ParseFlags::NOTE));
        assert!(!flags.contains(ParseFlags::SKIN_PARAM));
        assert!(ParseFlags::ALL.contains(flags));
    }

    #[test]
    fn test_blank_and_direction() {
        let kinds = classify_all(&["", "left to right direction", "top to bottom direction"]);
        assert_eq!(kinds[0], LineKind::Other(None));
        assert_eq!(
            kinds[1],
            LineKind::Other(Some("left to right direction".into()))
        );
        assert!(matches!(kinds[2], LineKind::Other(Some(_))));
    }

    #[test]
    fn test_single_line_comments() {
        let kinds = classify_all(&["' a comment", "/' inline '/", "'/ stray"]);
        assert_eq!(kinds[0], LineKind::Comment(Some("' a comment".into())));
        assert_eq!(kinds[1], LineKind::Comment(Some("/' inline '/".into())));
        assert_eq!(kinds[2], LineKind::Unhandled);
    }

    #[test]
    fn test_block_comment_swallows() {
        let kinds = classify_all(&["/' start", "class A", "end '/", "class B"]);
        assert_eq!(kinds[0], LineKind::Comment(None));
        assert_eq!(kinds[1], LineKind::Comment(None));
        assert_eq!(
            kinds[2],
            LineKind::Comment(Some("/' start\nclass A\nend '/".into()))
        );
        assert_eq!(kinds[3], LineKind::Unhandled);
    }

    #[test]
    fn test_swallowing_state() {
        let classifier = LineClassifier::default();
        let mut state = ClassifierState::new();
        classifier.classify("note left of A", &mut state);
        assert!(state.is_swallowing());
        classifier.classify("end note", &mut state);
        assert!(!state.is_swallowing());
    }

    #[test]
    fn test_skinparam_block() {
        let kinds = classify_all(&[
            "skinparam monochrome true",
            "skinparam class {",
            "BackgroundColor red",
            "}",
            "class A",
        ]);
        assert_eq!(
            kinds[0],
            LineKind::SkinParam(Some("skinparam monochrome true".into()))
        );
        assert!(matches!(kinds[1], LineKind::SkinParam(Some(_))));
        assert_eq!(kinds[2], LineKind::SkinParam(None));
        assert_eq!(kinds[3], LineKind::SkinParam(None));
        assert_eq!(kinds[4], LineKind::Unhandled);
    }

    #[test]
    fn test_preprocessor() {
        assert_eq!(classify_all(&["!include foo.puml"])[0], LineKind::Preprocessor);
    }

    #[test]
    fn test_single_line_notes() {
        let kinds = classify_all(&[
            "note left of User : the user",
            "note \"floating\" as N1",
            "hnote over A: busy",
        ]);
        match &kinds[0] {
            LineKind::Note(Some(data)) => {
                assert_eq!(data.placement.as_deref(), Some("left"));
                assert_eq!(data.target.as_deref(), Some("User"));
                assert_eq!(data.text, "the user");
            }
            other => panic!("expected note, got {:?}", other),
        }
        match &kinds[1] {
            LineKind::Note(Some(data)) => {
                assert_eq!(data.alias.as_deref(), Some("N1"));
                assert_eq!(data.text, "floating");
            }
            other => panic!("expected note, got {:?}", other),
        }
        assert!(matches!(&kinds[2], LineKind::Note(Some(d)) if d.text == "busy"));
    }

    #[test]
    fn test_multi_line_note() {
        let kinds = classify_all(&[
            "note right of Order",
            "first line",
            "second line",
            "end note",
            "class A",
        ]);
        assert_eq!(kinds[0], LineKind::Note(None));
        assert_eq!(kinds[1], LineKind::Note(None));
        assert_eq!(kinds[2], LineKind::Note(None));
        match &kinds[3] {
            LineKind::Note(Some(data)) => {
                assert_eq!(data.target.as_deref(), Some("Order"));
                assert_eq!(data.text, "first line\nsecond line");
            }
            other => panic!("expected closed note, got {:?}", other),
        }
        assert_eq!(kinds[4], LineKind::Unhandled);
    }

    #[test]
    fn test_note_terminator_spellings() {
        for terminator in ["endnote", "endhnote", "endrnote", "end note"] {
            let kinds = classify_all(&["note as N2", "body", terminator]);
            assert!(
                matches!(&kinds[2], LineKind::Note(Some(d)) if d.alias.as_deref() == Some("N2")),
                "terminator {} did not close the note",
                terminator
            );
        }
    }

    #[test]
    fn test_escaped_colon_does_not_close_note() {
        let kinds = classify_all(&["note over A \\: still open", "end note"]);
        assert_eq!(kinds[0], LineKind::Note(None));
        assert!(matches!(kinds[1], LineKind::Note(Some(_))));
    }

    #[test]
    fn test_slash_note() {
        let kinds = classify_all(&["/ note over B: parallel"]);
        assert!(matches!(&kinds[0], LineKind::Note(Some(d)) if d.text == "parallel"));
    }

    #[test]
    fn test_notebook_is_not_a_note() {
        assert_eq!(classify_all(&["notebook -> A"])[0], LineKind::Unhandled);
    }

    #[test]
    fn test_disabled_categories_fall_through() {
        let classifier = LineClassifier::new(ParseFlags::NOTE);
        let mut state = ClassifierState::new();
        assert_eq!(classifier.classify("' comment", &mut state), LineKind::Unhandled);
        assert_eq!(classifier.classify("!define X", &mut state), LineKind::Unhandled);
        assert_eq!(classifier.parse_title("title Hello"), None);
    }

    #[test]
    fn test_start_and_title() {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.parse_start("@startuml"), Some(None));
        assert_eq!(classifier.parse_start("@startuml Orders"), Some(Some("Orders")));
        assert_eq!(classifier.parse_start("class A"), None);
        assert_eq!(classifier.parse_title("title My Diagram"), Some("My Diagram"));
        assert_eq!(classifier.parse_title("titles"), None);
    }
}
