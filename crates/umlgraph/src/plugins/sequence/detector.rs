//! Sequence diagram detector
//!
//! Identifies sequence diagram syntax from input text.

use crate::core::{starts_with_word, Detector};

/// Lifeline keywords no other dialect uses
const LIFELINE_KEYWORDS: [&str; 7] = [
    "participant",
    "actor",
    "control",
    "boundary",
    "collections",
    "queue",
    "create",
];
const FOREIGN_KEYWORDS: [&str; 6] = ["class", "abstract", "enum", "struct", "interface", "component"];
const BLOCK_KEYWORDS: [&str; 5] = ["alt", "loop", "opt", "par", "activate"];

/// Detector for sequence diagram syntax
pub struct SequenceDetector;

impl SequenceDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SequenceDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        let mut lifelines = 0;
        let mut messages = 0;
        let mut blocks = 0;
        let mut foreign = 0;

        for line in input.lines().map(str::trim) {
            if LIFELINE_KEYWORDS.iter().any(|kw| starts_with_word(line, kw)) {
                lifelines += 1;
            } else if FOREIGN_KEYWORDS.iter().any(|kw| starts_with_word(line, kw))
                || line.starts_with('[')
            {
                foreign += 1;
            } else if BLOCK_KEYWORDS.iter().any(|kw| starts_with_word(line, kw)) {
                blocks += 1;
            } else if line.contains("->>")
                || ((line.contains("->") || line.contains("<-")) && line.contains(':'))
            {
                messages += 1;
            }
        }

        if foreign > 0 {
            return if lifelines > 0 { 0.3 } else { 0.0 };
        }

        // Lifelines with messages = high confidence
        if lifelines > 0 && messages > 0 {
            return 0.9;
        }

        if lifelines > 0 {
            return 0.7;
        }

        if messages > 0 {
            return if blocks > 0 { 0.7 } else { 0.6 };
        }

        0.0
    }

    fn diagram_type(&self) -> &'static str {
        "sequence"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["participant", "actor", "->", "-->", "->>", "alt", "loop"]
    }
}
