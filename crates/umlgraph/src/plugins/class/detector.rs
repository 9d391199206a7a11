//! Class diagram detector
//!
//! Identifies class diagram syntax from input text.

use crate::core::{starts_with_word, Detector};

const DECLARATION_KEYWORDS: [&str; 4] = ["class", "abstract", "enum", "struct"];
const RELATIONSHIPS: [&str; 8] = ["<|--", "--|>", "<|..", "..|>", "*--", "--*", "o--", "--o"];

/// Detector for class diagram syntax
pub struct ClassDetector;

impl ClassDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClassDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ClassDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        let mut declarations = 0;
        let mut interfaces = 0;
        let mut relationships = 0;
        let mut foreign = 0;

        for line in input.lines().map(str::trim) {
            if DECLARATION_KEYWORDS.iter().any(|kw| starts_with_word(line, kw)) {
                declarations += 1;
            } else if starts_with_word(line, "interface") {
                interfaces += 1;
            } else if RELATIONSHIPS.iter().any(|r| line.contains(r)) {
                relationships += 1;
            } else if line.starts_with('[')
                || starts_with_word(line, "component")
                || starts_with_word(line, "participant")
                || line.contains("->>")
            {
                foreign += 1;
            }
        }

        // Declarations with braces = high confidence
        if declarations > 0 && foreign == 0 {
            return if input.contains('{') { 0.9 } else { 0.8 };
        }

        // Interfaces and relationships alone also fit component diagrams
        if (interfaces > 0 || relationships > 0) && foreign == 0 {
            return 0.7;
        }

        if declarations > 0 {
            return 0.4;
        }

        0.0
    }

    fn diagram_type(&self) -> &'static str {
        "class"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["class", "abstract class", "interface", "enum", "struct", "<|--", "*--"]
    }
}
