//! Arrow grammar shared by the class and component parsers
//!
//! An arrow line is `left ["label"] head body tail ["label"] right [: text]`.
//! The head and tail glyphs carry the semantics; each dialect interprets them
//! on its own.

use chumsky::prelude::*;

use super::chumsky_utils::{dotted_word, inline_whitespace, quoted, rest_of_line};
use super::DiagramError;

/// One side of an arrow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Name as written, without brackets; may be `Component.port`
    pub name: String,
    /// Written as `[Name]`
    pub bracketed: bool,
}

/// Arrow glyph parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrow {
    /// Glyphs before the body, e.g. `<|`, `*`, `o`
    pub head: String,
    /// Line body including embedded style or direction, e.g. `-[#red]-`
    pub body: String,
    /// Glyphs after the body, e.g. `|>`, `>`, `o`
    pub tail: String,
}

impl Arrow {
    pub fn is_dotted(&self) -> bool {
        self.body.starts_with('.')
    }

    /// Composition or aggregation diamond on either side
    pub fn has_diamond(&self) -> bool {
        self.head.contains(['*', 'o']) || self.tail.contains(['*', 'o'])
    }
}

/// A parsed arrow line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConnection {
    pub left: Endpoint,
    /// Quoted multiplicity or label beside the left endpoint
    pub left_label: Option<String>,
    pub arrow: Arrow,
    pub right_label: Option<String>,
    pub right: Endpoint,
    /// Text after `:`
    pub label: Option<String>,
}

fn endpoint<'src>() -> impl Parser<'src, &'src str, Endpoint> + Clone {
    let bracketed = none_of("[]")
        .repeated()
        .at_least(1)
        .to_slice()
        .delimited_by(just('['), just(']'))
        .map(|s: &str| Endpoint {
            name: s.trim().to_string(),
            bracketed: true,
        });

    let generic_suffix = just('<')
        .then(none_of("<>-.| ").repeated().at_least(1))
        .then(just('>'));

    let bare = dotted_word()
        .then(generic_suffix.or_not())
        .to_slice()
        .map(|s: &str| Endpoint {
            name: s.to_string(),
            bracketed: false,
        });

    bracketed.or(bare)
}

fn arrow<'src>() -> impl Parser<'src, &'src str, Arrow> + Clone {
    let head = one_of("<o*()")
        .or_not()
        .then(just('|').or_not())
        .to_slice();

    let style = none_of("[]")
        .repeated()
        .delimited_by(just('['), just(']'))
        .ignored();
    let direction = choice((just("left"), just("right"), just("up"), just("down"))).ignored();
    let run = one_of("-.").repeated().at_least(1);
    let body = run
        .then(style.or(direction).then(one_of("-.").repeated()).or_not())
        .to_slice();

    let tail = just('|')
        .or_not()
        .then(one_of(">o*()").or_not())
        .to_slice();

    head.then(body).then(tail).map(|((head, body), tail): ((&str, &str), &str)| Arrow {
        head: head.to_string(),
        body: body.to_string(),
        tail: tail.to_string(),
    })
}

fn connection<'src>() -> impl Parser<'src, &'src str, ParsedConnection> {
    let ws = inline_whitespace();
    let side_label = quoted().then_ignore(ws.clone()).or_not();
    let label = just(':')
        .ignore_then(rest_of_line())
        .or_not()
        .map(|l| l.filter(|s: &String| !s.is_empty()));

    endpoint()
        .then_ignore(ws.clone())
        .then(side_label.clone())
        .then(arrow())
        .then_ignore(ws.clone())
        .then(side_label)
        .then(endpoint())
        .then_ignore(ws)
        .then(label)
        .then_ignore(end())
        .map(
            |(((((left, left_label), arrow), right_label), right), label)| ParsedConnection {
                left,
                left_label,
                arrow,
                right_label,
                right,
                label,
            },
        )
}

/// Parse one trimmed line as an arrow
pub fn parse_connection(line: &str, line_number: usize) -> Result<ParsedConnection, DiagramError> {
    connection().parse(line).into_result().map_err(|errors| {
        DiagramError::parse_error(format!("not an arrow: {:?}", errors), line_number)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ParsedConnection {
        parse_connection(line, 1).unwrap()
    }

    #[test]
    fn test_inheritance_arrows() {
        let c = parse("Animal <|-- Dog");
        assert_eq!(c.left.name, "Animal");
        assert_eq!(c.right.name, "Dog");
        assert_eq!(c.arrow.head, "<|");
        assert_eq!(c.arrow.body, "--");
        assert_eq!(c.arrow.tail, "");

        let c = parse("Dog ..|> Pet");
        assert_eq!(c.arrow.tail, "|>");
        assert!(c.arrow.is_dotted());
    }

    #[test]
    fn test_composition_with_multiplicities() {
        let c = parse("Order \"1\" *-- \"many\" LineItem : items");
        assert_eq!(c.left_label.as_deref(), Some("1"));
        assert_eq!(c.arrow.head, "*");
        assert_eq!(c.right_label.as_deref(), Some("many"));
        assert_eq!(c.right.name, "LineItem");
        assert_eq!(c.label.as_deref(), Some("items"));
        assert!(c.arrow.has_diamond());
    }

    #[test]
    fn test_bracketed_and_port_endpoints() {
        let c = parse("[Web Server] ..> [Database] : queries");
        assert!(c.left.bracketed);
        assert_eq!(c.left.name, "Web Server");
        assert_eq!(c.arrow.tail, ">");

        let c = parse("Api.http --> Gateway");
        assert_eq!(c.left.name, "Api.http");
        assert!(!c.left.bracketed);
    }

    #[test]
    fn test_styled_and_directed_bodies() {
        assert_eq!(parse("A -[#red]-> B").arrow.body, "-[#red]-");
        assert_eq!(parse("A -left-> B").arrow.body, "-left-");
        assert_eq!(parse("A -down-o B").arrow.tail, "o");
    }

    #[test]
    fn test_interface_glyphs() {
        let c = parse("A -( B");
        assert_eq!(c.arrow.tail, "(");
        let c = parse("A )-- B");
        assert_eq!(c.arrow.head, ")");
    }

    #[test]
    fn test_generic_endpoints() {
        let c = parse("Repository<T> <|-- UserRepository");
        assert_eq!(c.left.name, "Repository<T>");
        assert_eq!(c.arrow.head, "<|");
    }

    #[test]
    fn test_rejects_non_arrows() {
        assert!(parse_connection("class A", 3).is_err());
        assert!(parse_connection("A B", 3).is_err());
        let err = parse_connection("-->", 9).unwrap_err();
        assert!(format!("{}", err).contains("line 9"));
    }
}
