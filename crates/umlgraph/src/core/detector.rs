//! Core detector trait for dialect identification
//!
//! Detectors score raw text so the orchestrator can pick a parser when the
//! caller does not name the dialect.

/// Core trait for dialect detectors
///
/// # Example
/// ```
/// use umlgraph::core::Detector;
/// use umlgraph::plugins::sequence::SequenceDetector;
///
/// let detector = SequenceDetector::new();
/// assert!(detector.detect("@startuml\nparticipant A\nA -> B : hello\n@enduml"));
/// ```
pub trait Detector: Send + Sync {
    /// Detect if the input matches this dialect
    fn detect(&self, input: &str) -> bool;

    /// Get the confidence level of the detection (0.0 to 1.0)
    fn confidence(&self, input: &str) -> f64;

    /// Get the dialect name
    fn diagram_type(&self) -> &'static str;

    /// Get key patterns that this detector looks for
    fn patterns(&self) -> Vec<&'static str>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::class::ClassDetector;
    use crate::plugins::component::ComponentDetector;
    use crate::plugins::sequence::SequenceDetector;

    #[test]
    fn test_detector_trait_objects() {
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(ClassDetector::new()),
            Box::new(ComponentDetector::new()),
            Box::new(SequenceDetector::new()),
        ];
        let names: Vec<_> = detectors.iter().map(|d| d.diagram_type()).collect();
        assert_eq!(names, vec!["class", "component", "sequence"]);
        assert!(detectors.iter().all(|d| !d.patterns().is_empty()));
    }

    #[test]
    fn test_plain_text_scores_zero() {
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(ClassDetector::new()),
            Box::new(ComponentDetector::new()),
            Box::new(SequenceDetector::new()),
        ];
        for detector in &detectors {
            assert_eq!(detector.confidence("random text"), 0.0);
        }
    }
}
