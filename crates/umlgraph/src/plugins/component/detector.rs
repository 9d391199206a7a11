//! Component diagram detector
//!
//! Identifies component diagram syntax from input text.

use crate::core::{starts_with_word, Detector};

const CONTAINER_KEYWORDS: [&str; 5] = ["node", "cloud", "frame", "folder", "rectangle"];

/// Detector for component diagram syntax
pub struct ComponentDetector;

impl ComponentDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ComponentDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ComponentDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        let mut components = 0;
        let mut interfaces = 0;
        let mut containers = 0;
        let mut foreign = 0;

        for line in input.lines().map(str::trim) {
            if line.starts_with('[') || starts_with_word(line, "component") {
                components += 1;
            } else if line.starts_with("()")
                || starts_with_word(line, "port")
                || starts_with_word(line, "portin")
                || starts_with_word(line, "portout")
            {
                interfaces += 1;
            } else if line.ends_with('{')
                && CONTAINER_KEYWORDS.iter().any(|kw| starts_with_word(line, kw))
            {
                containers += 1;
            } else if starts_with_word(line, "participant")
                || starts_with_word(line, "class")
                || starts_with_word(line, "abstract")
                || line.contains("->>")
            {
                foreign += 1;
            }
        }

        if foreign > 0 {
            return if components > 0 { 0.4 } else { 0.0 };
        }

        // Bracketed or keyword components = high confidence
        if components > 0 {
            return 0.9;
        }

        if interfaces > 0 {
            return 0.8;
        }

        // Deployment-style containers alone
        if containers > 0 {
            return 0.6;
        }

        0.0
    }

    fn diagram_type(&self) -> &'static str {
        "component"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["component", "[", "()", "port", "node", "cloud", "frame"]
    }
}
