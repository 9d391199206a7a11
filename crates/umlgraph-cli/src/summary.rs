//! Serializable summaries of parsed documents
//!
//! The `parse`, `validate` and `scan` commands print these either as plain
//! text or as JSON.

use serde::Serialize;
use std::fmt::Write as _;

use umlgraph::plugins::ParsedDocument;
use umlgraph::prelude::*;
use umlgraph::TypeKind;

/// Severity of a reported problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Line that matched no construct
    Error,
    /// Recognized line whose references did not resolve
    Explained,
    /// Sequence reference the class model does not account for
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line_number: usize,
    pub line: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Component names this entity consumes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exposes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    pub from: Option<String>,
    pub to: Option<String>,
    pub action: String,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub dialect: &'static str,
    pub file: Option<String>,
    pub title: Option<String>,
    pub entities: Vec<EntitySummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<MessageSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DocumentSummary {
    pub fn from_document(document: &ParsedDocument) -> Self {
        let doc = document.as_document();
        let mut summary = Self {
            dialect: document.kind().as_str(),
            file: doc.file_name().map(str::to_string),
            title: doc.title().map(str::to_string),
            entities: Vec::new(),
            messages: Vec::new(),
            diagnostics: doc
                .line_errors()
                .iter()
                .map(|e| Diagnostic {
                    severity: Severity::Error,
                    line_number: e.line_number,
                    line: e.text.clone(),
                    message: e.reason.clone(),
                })
                .collect(),
        };

        match document {
            ParsedDocument::Class(diagram) => {
                summary.entities = diagram
                    .data_types()
                    .filter(|(_, t)| !matches!(t.kind, TypeKind::Comment { .. }))
                    .map(|(_, t)| entity(t, Vec::new(), Vec::new()))
                    .collect();
            }
            ParsedDocument::Component(diagram) => {
                let names = |ids: &[TypeId]| -> Vec<String> {
                    ids.iter().map(|&id| diagram.get(id).name.clone()).collect()
                };
                summary.entities = diagram
                    .components()
                    .map(|(_, t)| {
                        let (consumes, exposes) = t
                            .component()
                            .map(|c| (names(&c.consumes), names(&c.exposes)))
                            .unwrap_or_default();
                        entity(t, consumes, exposes)
                    })
                    .collect();
                summary.diagnostics.extend(
                    diagram
                        .explained_errors
                        .iter()
                        .map(|e| explained(Severity::Explained, e)),
                );
            }
            ParsedDocument::Sequence(diagram) => {
                summary.entities = diagram
                    .lifelines
                    .iter()
                    .map(|l| EntitySummary {
                        kind: "lifeline",
                        name: l.alias.clone(),
                        namespace: String::new(),
                        consumes: Vec::new(),
                        exposes: Vec::new(),
                    })
                    .collect();
                summary.messages = diagram
                    .connections()
                    .into_iter()
                    .map(|c| MessageSummary {
                        from: c.from_name.clone(),
                        to: c.to_name.clone(),
                        action: c.action.signature(),
                        resolved: !matches!(c.action, Action::Unknown(_)),
                    })
                    .collect();
                summary.diagnostics.extend(
                    diagram
                        .warnings
                        .iter()
                        .map(|e| explained(Severity::Warning, e)),
                );
            }
        }

        summary.diagnostics.sort_by_key(|d| d.line_number);
        summary
    }

    /// Plain-text rendering used by `--format text`
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let file = self.file.as_deref().unwrap_or("<stdin>");
        let _ = write!(out, "{} diagram {}", self.dialect, file);
        if let Some(title) = &self.title {
            let _ = write!(out, " \"{}\"", title);
        }
        out.push('\n');

        for entity in &self.entities {
            let _ = write!(out, "  {} {}", entity.kind, entity.name);
            if !entity.namespace.is_empty() {
                let _ = write!(out, " in {}", entity.namespace);
            }
            if !entity.consumes.is_empty() {
                let _ = write!(out, " consumes {}", entity.consumes.join(", "));
            }
            if !entity.exposes.is_empty() {
                let _ = write!(out, " exposes {}", entity.exposes.join(", "));
            }
            out.push('\n');
        }
        for message in &self.messages {
            let _ = writeln!(
                out,
                "  {} -> {}: {}{}",
                message.from.as_deref().unwrap_or("["),
                message.to.as_deref().unwrap_or("]"),
                message.action,
                if message.resolved { "" } else { " (unresolved)" }
            );
        }
        let _ = writeln!(out, "  {} problem(s)", self.diagnostics.len());
        out
    }
}

impl Diagnostic {
    pub fn to_text(&self) -> String {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Explained => "unresolved",
            Severity::Warning => "warning",
        };
        match &self.message {
            Some(message) => format!("{}: line {}: {} ({})", label, self.line_number, self.line, message),
            None => format!("{}: line {}: {}", label, self.line_number, self.line),
        }
    }
}

fn entity(data_type: &DataType, consumes: Vec<String>, exposes: Vec<String>) -> EntitySummary {
    EntitySummary {
        kind: data_type.kind.name(),
        name: data_type.name.clone(),
        namespace: data_type.namespace.clone(),
        consumes,
        exposes,
    }
}

fn explained(severity: Severity, error: &ExplainedError) -> Diagnostic {
    Diagnostic {
        severity,
        line_number: error.line_number,
        line: error.line.clone(),
        message: Some(error.explanation.clone()),
    }
}
