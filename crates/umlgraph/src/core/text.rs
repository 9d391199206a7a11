//! Shared text utilities for diagram processing
//!
//! This module contains the name and list helpers used across plugins.

use super::ListType;

/// Split `text` on `sep`, ignoring separators nested in `<>`, `()` or `[]`.
///
/// Pieces are trimmed and empty pieces dropped.
///
/// # Example
/// ```
/// use umlgraph::core::split_top_level;
///
/// let parts = split_top_level("item: List<User>, handler: Action<User, Result>", ',');
/// assert_eq!(parts, vec!["item: List<User>", "handler: Action<User, Result>"]);
/// ```
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            c if c == sep && depth <= 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split at the last top-level whitespace run: `"List<int> items"` gives
/// `("List<int>", "items")`.
pub fn split_last_word(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    let mut split = None;

    for (i, c) in text.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            c if c.is_whitespace() && depth <= 0 => split = Some(i),
            _ => {}
        }
    }

    let i = split?;
    let (head, tail) = (text[..i].trim(), text[i..].trim());
    if head.is_empty() || tail.is_empty() {
        None
    } else {
        Some((head, tail))
    }
}

/// Name without generic parameters: `Repository<T>` gives `Repository`.
pub fn strip_generics(name: &str) -> &str {
    match name.find('<') {
        Some(i) => name[..i].trim_end(),
        None => name,
    }
}

/// Remove one pair of surrounding double quotes.
pub fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Collection shape and element type of a member type expression.
///
/// `List<T>`, `IReadOnlyCollection<T>`, `T[]` and `T[0..*]` are recognized;
/// anything else is returned unchanged with [`ListType::None`].
pub fn list_type_of(type_text: &str) -> (ListType, &str) {
    let t = type_text.trim();
    let lower = t.to_ascii_lowercase();

    if lower.starts_with("ireadonlycollection<") && t.ends_with('>') {
        return (
            ListType::ReadOnlyCollection,
            t["IReadOnlyCollection<".len()..t.len() - 1].trim(),
        );
    }
    if lower.starts_with("list<") && t.ends_with('>') {
        return (ListType::List, t["List<".len()..t.len() - 1].trim());
    }
    if let Some(element) = t.strip_suffix("[]") {
        return (ListType::Array, element.trim());
    }
    if let Some(open) = t.find('[') {
        if t.ends_with("..*]") || t.ends_with("[*]") {
            return (ListType::List, t[..open].trim());
        }
    }
    (ListType::None, t)
}
