//! Shared chumsky parser utilities for line grammars
//!
//! Every grammar here works on a single trimmed line, so whitespace helpers
//! never consume newlines.

use chumsky::prelude::*;

/// Parse optional inline whitespace (spaces and tabs).
///
/// Uses explicit character matching to avoid the "repeated combinator making no progress"
/// issue that can occur with `chumsky::text::whitespace().repeated()`.
pub fn inline_whitespace<'src>() -> impl Parser<'src, &'src str, ()> + Clone {
    one_of(" \t").repeated().ignored()
}

/// Parse a double-quoted string, yielding the text between the quotes.
pub fn quoted<'src>() -> impl Parser<'src, &'src str, String> + Clone {
    none_of("\"")
        .repeated()
        .to_slice()
        .delimited_by(just('"'), just('"'))
        .map(|s: &str| s.to_string())
}

/// Parse a word of letters, digits and underscores.
pub fn word<'src>() -> impl Parser<'src, &'src str, &'src str> + Clone {
    any()
        .filter(|c: &char| c.is_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1)
        .to_slice()
}

/// Parse a dotted word such as `Billing.api`.
pub fn dotted_word<'src>() -> impl Parser<'src, &'src str, &'src str> + Clone {
    word()
        .then(just('.').then(word()).repeated())
        .to_slice()
}

/// Parse everything up to the end of the line, trimmed.
pub fn rest_of_line<'src>() -> impl Parser<'src, &'src str, String> + Clone {
    any()
        .repeated()
        .to_slice()
        .map(|s: &str| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_whitespace() {
        let parser = inline_whitespace().then(just("test")).then_ignore(end());
        assert!(parser.parse("test").into_result().is_ok());
        assert!(parser.parse(" test").into_result().is_ok());
        assert!(parser.parse("\ttest").into_result().is_ok());
        // Should NOT consume newlines
        assert!(parser.parse("\ntest").into_result().is_err());
    }

    #[test]
    fn test_quoted() {
        let parser = quoted().then_ignore(end());
        assert_eq!(parser.parse("\"0..*\"").into_result().unwrap(), "0..*");
        assert_eq!(parser.parse("\"\"").into_result().unwrap(), "");
        assert!(parser.parse("\"open").into_result().is_err());
    }

    #[test]
    fn test_dotted_word() {
        let parser = dotted_word().then_ignore(end());
        assert_eq!(parser.parse("Billing").into_result().unwrap(), "Billing");
        assert_eq!(parser.parse("Billing.api").into_result().unwrap(), "Billing.api");
        assert!(parser.parse("Billing.").into_result().is_err());
    }

    #[test]
    fn test_rest_of_line() {
        let parser = just(':').ignore_then(rest_of_line());
        assert_eq!(parser.parse(":  places order ").into_result().unwrap(), "places order");
    }
}
