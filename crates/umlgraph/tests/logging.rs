//! Tests for logging functionality
//!
//! Only one global subscriber can be installed per process, so these tests
//! check that initialization never panics rather than inspecting output.

use std::str::FromStr;
use umlgraph::core::logging::{init_logging, LogFormat};

#[test]
fn test_log_format_parsing() {
    assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
    assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
    assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
    assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
    assert!(LogFormat::from_str("xml").is_err());
}

#[test]
fn test_log_format_variants() {
    let variants = LogFormat::variants();
    assert_eq!(variants, &["compact", "pretty", "json"]);
    for variant in variants {
        assert!(LogFormat::from_str(variant).is_ok());
    }
}

#[test]
fn test_init_logging_with_levels() {
    for level in ["trace", "debug", "info", "warn", "error", "off"] {
        let _ = init_logging(Some(level), Some("compact"));
    }
}

#[test]
fn test_init_logging_invalid_format() {
    let result = init_logging(Some("info"), Some("invalid_format"));
    assert!(result.is_err());
}

#[test]
fn test_parsing_with_subscriber_installed() {
    let _ = init_logging(Some("trace"), Some("json"));
    let diagram = umlgraph::parse_class_diagram("@startuml\nclass A\nnonsense\n@enduml").unwrap();
    assert_eq!(diagram.line_errors.len(), 1);
}

#[test]
fn test_init_default_logging() {
    let _ = umlgraph::core::logging::init_default_logging();
}
