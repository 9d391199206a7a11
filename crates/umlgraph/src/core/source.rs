//! Line retrieval for diagram sources
//!
//! Strings and files feed the same line loop: the file variant only reads the
//! text and remembers the file name.

use std::path::Path;

use super::DiagramError;

/// Iterate trimmed lines with their 1-based line numbers
///
/// CRLF and LF endings are both accepted, and a leading byte-order mark is
/// dropped.
pub fn numbered_lines(input: &str) -> impl Iterator<Item = (usize, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    input
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
}

/// Read a diagram source file
pub fn read_source(path: &Path) -> Result<String, DiagramError> {
    Ok(std::fs::read_to_string(path)?)
}

/// File name recorded on diagrams parsed from `path`
pub fn display_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
