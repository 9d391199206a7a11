//! Member-line parser using chumsky
//!
//! Parses one line of a class body into a method or property shape. Type
//! expressions are kept as text; the class parser resolves them to arena ids.

use chumsky::prelude::*;

use crate::core::chumsky_utils::{inline_whitespace, word};
use crate::core::{split_last_word, split_top_level, Visibility};

/// AST types for class body lines

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParameter {
    pub name: String,
    pub type_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMethod {
    pub visibility: Visibility,
    pub name: String,
    pub return_type: Option<String>,
    pub parameters: Vec<ParsedParameter>,
    pub is_static: bool,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProperty {
    pub visibility: Visibility,
    pub name: String,
    pub type_text: Option<String>,
    pub default_value: Option<String>,
    pub is_static: bool,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMember {
    Method(ParsedMethod),
    Property(ParsedProperty),
}

/// `{static}` / `{abstract}` flags gathered from prefix and suffix positions
#[derive(Debug, Clone, Copy, Default)]
struct Modifiers {
    is_static: bool,
    is_abstract: bool,
}

impl Modifiers {
    fn collect<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut modifiers = Modifiers::default();
        for name in names {
            match name {
                "static" | "classifier" => modifiers.is_static = true,
                "abstract" => modifiers.is_abstract = true,
                _ => {}
            }
        }
        modifiers
    }
}

type Prefix<'src> = (Option<Visibility>, Vec<&'src str>);

/// Chumsky-based member line parser
pub struct ChumskyMemberParser;

impl ChumskyMemberParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a body line; `None` when it fits neither shape
    pub fn parse_member(&self, line: &str) -> Option<ParsedMember> {
        if let Ok(method) = Self::method_parser().parse(line).into_result() {
            return Some(ParsedMember::Method(method));
        }
        Self::property_parser()
            .parse(line)
            .into_result()
            .ok()
            .flatten()
            .map(ParsedMember::Property)
    }

    fn modifier<'src>() -> impl Parser<'src, &'src str, &'src str> + Clone {
        word()
            .delimited_by(just('{'), just('}'))
            .then_ignore(inline_whitespace())
    }

    fn prefix<'src>() -> impl Parser<'src, &'src str, Prefix<'src>> + Clone {
        let visibility = one_of("+-#~")
            .map(Visibility::from_char)
            .then_ignore(inline_whitespace());

        Self::modifier()
            .or_not()
            .then(visibility.or_not())
            .then(Self::modifier().or_not())
            .map(|((before, visibility), after)| {
                (
                    visibility.flatten(),
                    before.into_iter().chain(after).collect(),
                )
            })
    }

    fn method_parser<'src>() -> impl Parser<'src, &'src str, ParsedMethod> {
        let ws = inline_whitespace();

        let head = none_of("(){}:")
            .repeated()
            .at_least(1)
            .to_slice()
            .filter(|s: &&str| !s.trim().is_empty());

        let params = none_of("()")
            .repeated()
            .to_slice()
            .delimited_by(just('('), just(')'));

        // UML-style return type: ): type
        let return_type = just(':')
            .ignore_then(ws.clone())
            .ignore_then(none_of("{").repeated().at_least(1).to_slice())
            .map(|s: &str| s.trim())
            .or_not();

        Self::prefix()
            .then(head)
            .then(params)
            .then_ignore(ws)
            .then(return_type)
            .then(Self::modifier().repeated().collect::<Vec<_>>())
            .then_ignore(end())
            .map(|((((prefix, head), params), return_type), suffix)| {
                let (visibility, prefix_mods) = prefix;
                let modifiers = Modifiers::collect(prefix_mods.into_iter().chain(suffix));

                // C#-style return type: type name(
                let head = head.trim();
                let (leading_type, name) = match split_last_word(head) {
                    Some((ty, name)) => (Some(ty), name),
                    None => (None, head),
                };

                ParsedMethod {
                    visibility: visibility.unwrap_or_default(),
                    name: name.to_string(),
                    return_type: return_type
                        .filter(|t| !t.is_empty())
                        .or(leading_type)
                        .map(str::to_string),
                    parameters: split_top_level(params, ',')
                        .into_iter()
                        .map(parse_parameter)
                        .collect(),
                    is_static: modifiers.is_static,
                    is_abstract: modifiers.is_abstract,
                }
            })
    }

    fn property_parser<'src>() -> impl Parser<'src, &'src str, Option<ParsedProperty>> {
        let body = none_of("(){}").repeated().at_least(1).to_slice();

        Self::prefix()
            .then(body)
            .then(Self::modifier().repeated().collect::<Vec<_>>())
            .then_ignore(end())
            .map(|((prefix, body), suffix)| {
                let (visibility, prefix_mods) = prefix;
                let modifiers = Modifiers::collect(prefix_mods.into_iter().chain(suffix));

                let (declaration, default_value) = match split_top_level(body, '=').as_slice() {
                    [decl, default] => (*decl, Some(default.to_string())),
                    [decl] => (*decl, None),
                    _ => return None,
                };

                let (name, type_text) = match declaration.split_once(':') {
                    Some((name, ty)) => (name.trim(), ty.trim()),
                    None => {
                        let (ty, name) = split_last_word(declaration)?;
                        (name, ty)
                    }
                };
                if !is_identifier(name) || type_text.is_empty() {
                    return None;
                }

                Some(ParsedProperty {
                    visibility: visibility.unwrap_or_default(),
                    name: name.to_string(),
                    type_text: Some(type_text.to_string()),
                    default_value,
                    is_static: modifiers.is_static,
                    is_abstract: modifiers.is_abstract,
                })
            })
    }
}

impl Default for ChumskyMemberParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `name: type`, `type name` or a bare name
fn parse_parameter(text: &str) -> ParsedParameter {
    if let Some((name, ty)) = text.split_once(':') {
        return ParsedParameter {
            name: name.trim().to_string(),
            type_text: Some(ty.trim().to_string()),
        };
    }
    match split_last_word(text) {
        Some((ty, name)) => ParsedParameter {
            name: name.to_string(),
            type_text: Some(ty.to_string()),
        },
        None => ParsedParameter {
            name: text.to_string(),
            type_text: None,
        },
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(line: &str) -> ParsedMethod {
        match ChumskyMemberParser::new().parse_member(line) {
            Some(ParsedMember::Method(m)) => m,
            other => panic!("expected method for {:?}, got {:?}", line, other),
        }
    }

    fn property(line: &str) -> ParsedProperty {
        match ChumskyMemberParser::new().parse_member(line) {
            Some(ParsedMember::Property(p)) => p,
            other => panic!("expected property for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn test_uml_style_method() {
        let m = method("setData(name: string, age: int): void");
        assert_eq!(m.name, "setData");
        assert_eq!(m.return_type.as_deref(), Some("void"));
        assert_eq!(m.visibility, Visibility::None);
        assert_eq!(m.parameters.len(), 2);
        assert_eq!(m.parameters[1].name, "age");
        assert_eq!(m.parameters[1].type_text.as_deref(), Some("int"));
    }

    #[test]
    fn test_csharp_style_method() {
        let m = method("+List<User> FindAll(string filter, int limit)");
        assert_eq!(m.visibility, Visibility::Public);
        assert_eq!(m.name, "FindAll");
        assert_eq!(m.return_type.as_deref(), Some("List<User>"));
        assert_eq!(m.parameters[0].name, "filter");
        assert_eq!(m.parameters[0].type_text.as_deref(), Some("string"));
    }

    #[test]
    fn test_method_modifiers() {
        assert!(method("{static} create(): User").is_static);
        assert!(method("{abstract} doWork(): void").is_abstract);
        let m = method("#getValue(): string {abstract}");
        assert!(m.is_abstract);
        assert_eq!(m.visibility, Visibility::Protected);
        assert_eq!(m.return_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_generic_parameters_split_at_top_level() {
        let m = method("+process(item: List<User>, handler: Action<User, Result>): void");
        assert_eq!(m.parameters.len(), 2);
        assert_eq!(
            m.parameters[1].type_text.as_deref(),
            Some("Action<User, Result>")
        );
    }

    #[test]
    fn test_spaced_return_type() {
        let m = method("getName() : string");
        assert_eq!(m.return_type.as_deref(), Some("string"));
        assert!(method("Save()").return_type.is_none());
    }

    #[test]
    fn test_properties() {
        let p = property("name: string");
        assert_eq!(p.name, "name");
        assert_eq!(p.type_text.as_deref(), Some("string"));

        let p = property("-int age");
        assert_eq!(p.visibility, Visibility::Private);
        assert_eq!(p.type_text.as_deref(), Some("int"));

        let p = property("+   name   :   string");
        assert_eq!(p.name, "name");

        let p = property("+count: int {static}");
        assert!(p.is_static);

        let p = property("+status: string = \"active\"");
        assert_eq!(p.default_value.as_deref(), Some("\"active\""));
    }

    #[test]
    fn test_untyped_line_has_no_shape() {
        assert_eq!(ChumskyMemberParser::new().parse_member("+someProperty"), None);
        assert_eq!(ChumskyMemberParser::new().parse_member("+"), None);
    }
}
