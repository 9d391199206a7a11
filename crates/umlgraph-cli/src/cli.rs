//! Command-line interface for the umlgraph utility
//!
//! Parses PlantUML class, component and sequence diagrams and reports what
//! was recognized and what was not.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::colorizer::{colorize_diagnostic, colorize_ok, ColorChoice};
use crate::summary::DocumentSummary;
use umlgraph::core::logging::init_logging;
use umlgraph::plugins::{Orchestrator, ParsedDocument};
use umlgraph::{parse_class_diagram_file, DiagramKind, ParseOptions};

/// umlgraph - Parse PlantUML diagrams into typed object graphs
#[derive(Parser)]
#[command(name = "umlgraph")]
#[command(about = "Parse and validate PlantUML class, component and sequence diagrams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Dialect named on the command line
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum DialectChoice {
    Class,
    Component,
    Sequence,
}

impl From<DialectChoice> for DiagramKind {
    fn from(value: DialectChoice) -> Self {
        match value {
            DialectChoice::Class => DiagramKind::Class,
            DialectChoice::Component => DiagramKind::Component,
            DialectChoice::Sequence => DiagramKind::Sequence,
        }
    }
}

/// Report format
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Options shared by the commands that parse one document
#[derive(Args, Debug, Clone, Default)]
pub struct ParseArgs {
    /// Input file (use - for stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Parse as this dialect instead of detecting it
    #[arg(long, value_enum)]
    pub dialect: Option<DialectChoice>,

    /// Allow component arrows to reference undeclared components
    #[arg(long)]
    pub lax: bool,

    /// Read only the lifeline declarations of sequence diagrams
    #[arg(long)]
    pub lifelines_only: bool,

    /// Class diagrams that sequence messages are resolved against
    #[arg(long = "class-model", value_name = "FILE", num_args = 1..)]
    pub class_model: Vec<PathBuf>,
}

impl ParseArgs {
    fn options(&self) -> ParseOptions {
        ParseOptions::default()
            .with_components_must_be_defined(!self.lax)
            .with_just_lifelines(self.lifelines_only)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a diagram and summarize its entities
    Parse {
        #[command(flatten)]
        args: ParseArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List every problem in a diagram; exits non-zero when any exist
    Validate {
        #[command(flatten)]
        args: ParseArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// When to use colors in output
        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },

    /// Detect the dialect of a diagram
    Detect {
        /// Input file to analyze (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show supported dialects
    Types {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Parse every .puml file below a directory
    ///
    /// Class diagrams are parsed first so sequence diagrams can resolve
    /// their messages against them.
    Scan {
        /// Directory to walk
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Allow component arrows to reference undeclared components
        #[arg(long)]
        lax: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Main CLI application
pub struct UmlgraphApp {
    orchestrator: Orchestrator,
}

impl UmlgraphApp {
    /// Create a new application instance with default settings
    pub fn new() -> Self {
        Self {
            orchestrator: Orchestrator::with_all_plugins(),
        }
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level_str = std::env::var("UMLGRAPH_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.log_level.as_str().to_string()));

        let log_format_str = std::env::var("UMLGRAPH_LOG_FORMAT")
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("umlgraph v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Parse { args, format } => {
                let document = self.parse_input(&args, cli.verbose)?;
                println!("{}", render_document(&document, format)?.trim_end());
                Ok(())
            }
            Commands::Validate {
                args,
                format,
                color,
            } => self.validate_command(&args, format, color, cli.verbose),
            Commands::Detect { input } => self.detect_command(input, cli.verbose),
            Commands::Types { json } => self.types_command(json, cli.verbose),
            Commands::Scan { dir, lax, format } => {
                let report = self.scan_report(&dir, lax, format)?;
                println!("{}", report.trim_end());
                Ok(())
            }
        }
    }

    /// Orchestrator configured for `args`, with its class models loaded
    fn orchestrator_for(&self, args: &ParseArgs) -> Result<Orchestrator> {
        let mut orchestrator = Orchestrator::with_options(args.options());
        orchestrator.register_default_detectors();

        let collection = orchestrator.collection();
        for path in &args.class_model {
            let diagram = parse_class_diagram_file(path)
                .with_context(|| format!("Failed to read class model '{}'", path.display()))?;
            debug!(file = %path.display(), types = diagram.data_types().count(), "Loaded class model");
            collection.add_class(diagram);
        }
        Ok(orchestrator)
    }

    /// Parse the input named by `args`, detecting the dialect unless given
    pub fn parse_input(&self, args: &ParseArgs, verbose: bool) -> Result<ParsedDocument> {
        let orchestrator = self.orchestrator_for(args)?;
        let content = self.read_input(args.input.clone())?;
        let path = args.input.as_deref().filter(|p| p.to_string_lossy() != "-");

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let kind = match args.dialect {
            Some(dialect) => dialect.into(),
            None => orchestrator.select_dialect(&content, path)?,
        };
        if verbose {
            eprintln!("Parsing as {} diagram", kind);
        }
        orchestrator.process_as(kind, &content, path)
    }

    /// Handle the validate command
    fn validate_command(
        &self,
        args: &ParseArgs,
        format: OutputFormat,
        color: ColorChoice,
        verbose: bool,
    ) -> Result<()> {
        let document = self.parse_input(args, verbose)?;
        let summary = DocumentSummary::from_document(&document);

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary.diagnostics)?),
            OutputFormat::Text => {
                let colored = color.enabled();
                for diagnostic in &summary.diagnostics {
                    println!("{}", colorize_diagnostic(diagnostic, colored));
                }
                if summary.diagnostics.is_empty() {
                    println!("{}", colorize_ok(&format!("✓ Valid {} diagram", summary.dialect), colored));
                }
            }
        }

        match summary.diagnostics.len() {
            0 => Ok(()),
            n => Err(anyhow!("{} problem(s) found in {} diagram", n, summary.dialect)),
        }
    }

    /// Handle the detect command
    fn detect_command(&self, input: Option<PathBuf>, verbose: bool) -> Result<()> {
        let content = self.read_input(input.clone())?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let path = input.as_deref().filter(|p| p.to_string_lossy() != "-");
        match self.orchestrator.select_dialect(&content, path) {
            Ok(kind) => {
                println!("{}", kind);
                Ok(())
            }
            Err(e) => {
                eprintln!("Could not detect diagram type: {}", e);
                Err(e)
            }
        }
    }

    /// Handle the types command
    fn types_command(&self, json: bool, verbose: bool) -> Result<()> {
        if verbose {
            eprintln!("Listing supported diagram types");
        }
        println!("{}", types_listing(json)?.trim_end());
        Ok(())
    }

    /// Parse every `.puml` file below `dir`, class diagrams first
    pub fn scan_report(&self, dir: &Path, lax: bool, format: OutputFormat) -> Result<String> {
        if !dir.is_dir() {
            return Err(anyhow!("'{}' is not a directory", dir.display()));
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .map(|s| s.starts_with('.'))
                        .unwrap_or(false)
            })
            .flatten()
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("puml"))
            .map(|e| e.into_path())
            .collect();
        paths.sort();
        info!(files = paths.len(), dir = %dir.display(), "Scanning");

        let options = ParseOptions::default().with_components_must_be_defined(!lax);
        let mut orchestrator = Orchestrator::with_options(options);
        orchestrator.register_default_detectors();

        let sources: Vec<(PathBuf, String, DiagramKind)> = paths
            .par_iter()
            .filter_map(|path| {
                let content = match fs::read_to_string(path) {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "Skipping unreadable file");
                        return None;
                    }
                };
                match orchestrator.select_dialect(&content, Some(path.as_path())) {
                    Ok(kind) => Some((path.clone(), content, kind)),
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "Skipping file of unknown dialect");
                        None
                    }
                }
            })
            .collect();

        let (classes, others): (Vec<_>, Vec<_>) = sources
            .into_iter()
            .partition(|(_, _, kind)| *kind == DiagramKind::Class);

        let process = |(path, content, kind): &(PathBuf, String, DiagramKind)| {
            orchestrator.process_as(*kind, content, Some(path.as_path()))
        };
        let mut documents = classes.par_iter().map(process).collect::<Result<Vec<_>>>()?;
        documents.extend(others.par_iter().map(process).collect::<Result<Vec<_>>>()?);
        documents.sort_by(|a, b| a.as_document().file_name().cmp(&b.as_document().file_name()));

        let summaries: Vec<DocumentSummary> = documents.iter().map(DocumentSummary::from_document).collect();
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&summaries)?),
            OutputFormat::Text => {
                let mut out = String::new();
                for summary in &summaries {
                    out.push_str(&format!(
                        "{} {}: {} entities, {} problem(s)\n",
                        summary.dialect,
                        summary.file.as_deref().unwrap_or_default(),
                        summary.entities.len(),
                        summary.diagnostics.len()
                    ));
                }
                out.push_str(&format!("{} diagram(s) parsed\n", summaries.len()));
                Ok(out)
            }
        }
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }
}

impl Default for UmlgraphApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one document in the requested format
pub fn render_document(document: &ParsedDocument, format: OutputFormat) -> Result<String> {
    let summary = DocumentSummary::from_document(document);
    Ok(match format {
        OutputFormat::Text => summary.to_text(),
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
    })
}

/// Supported dialects with the file suffix that selects each
pub fn types_listing(json: bool) -> Result<String> {
    let dialects = [
        ("class", "*class.puml", "Classes, interfaces, enums and structs with their members"),
        ("component", "*component.puml", "Components, interfaces and the links between them"),
        ("sequence", "*seq.puml", "Lifelines, messages and control blocks"),
    ];

    if json {
        let types: Vec<_> = dialects
            .iter()
            .map(|(name, suffix, description)| {
                serde_json::json!({
                    "name": name,
                    "file_suffix": suffix,
                    "description": description,
                })
            })
            .collect();
        let listing = serde_json::json!({
            "supported_types": types,
            "total": dialects.len(),
        });
        return Ok(serde_json::to_string_pretty(&listing)?);
    }

    let mut out = String::from("Supported diagram types:\n");
    for (name, suffix, description) in dialects {
        out.push_str(&format!("  {:<10} {:<16} - {}\n", name, suffix, description));
    }
    out.push_str(&format!("\nTotal: {} diagram types supported\n", dialects.len()));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CLASSES: &str = "@startuml\nclass Cart {\n+Add(item: Item): void\n}\n@enduml\n";
    const SEQUENCE: &str = "@startuml\nactor User\nparticipant Cart\nUser -> Cart: Add(book)\n@enduml\n";

    #[test]
    fn test_cli_parsing_parse_command() {
        let args = vec![
            "umlgraph",
            "parse",
            "--input",
            "checkout.seq.puml",
            "--dialect",
            "sequence",
            "--class-model",
            "a.class.puml",
            "b.class.puml",
            "--format",
            "json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Parse { args, format } => {
                assert_eq!(args.input.unwrap().to_string_lossy(), "checkout.seq.puml");
                assert_eq!(args.dialect, Some(DialectChoice::Sequence));
                assert_eq!(args.class_model.len(), 2);
                assert!(!args.lax);
                assert!(!args.lifelines_only);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_cli_parsing_validate_command() {
        let args = vec!["umlgraph", "validate", "--lax", "--lifelines-only", "--color", "never"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Validate {
                args,
                format,
                color,
            } => {
                assert!(args.input.is_none());
                assert!(args.lax);
                assert!(args.lifelines_only);
                assert_eq!(format, OutputFormat::Text);
                assert_eq!(color, ColorChoice::Never);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_parsing_scan_defaults() {
        let cli = Cli::try_parse_from(vec!["umlgraph", "scan"]).unwrap();
        match cli.command {
            Commands::Scan { dir, lax, format } => {
                assert_eq!(dir, PathBuf::from("."));
                assert!(!lax);
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = vec!["umlgraph", "detect", "--verbose", "--log-level", "debug", "--log-format", "json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        assert!(Cli::try_parse_from(vec!["umlgraph", "parse", "--dialect", "activity"]).is_err());
    }

    #[test]
    fn test_read_input_from_file() {
        let app = UmlgraphApp::new();
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("model.class.puml");
        fs::write(&file_path, CLASSES).unwrap();

        assert_eq!(app.read_input(Some(file_path)).unwrap(), CLASSES);
        assert!(app.read_input(Some(dir.path().join("missing.puml"))).is_err());
    }

    #[test]
    fn test_parse_input_with_class_model() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("cart.class.puml");
        let sequence = dir.path().join("checkout.seq.puml");
        fs::write(&model, CLASSES).unwrap();
        fs::write(&sequence, SEQUENCE).unwrap();

        let args = ParseArgs {
            input: Some(sequence),
            class_model: vec![model],
            ..ParseArgs::default()
        };
        let document = UmlgraphApp::new().parse_input(&args, false).unwrap();
        let ParsedDocument::Sequence(diagram) = &document else {
            panic!("expected a sequence diagram");
        };
        assert!(diagram.warnings.is_empty(), "{:?}", diagram.warnings);

        let json: serde_json::Value =
            serde_json::from_str(&render_document(&document, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["messages"][0]["resolved"], true);
    }

    #[test]
    fn test_dialect_flag_overrides_detection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diagram.puml");
        fs::write(&path, "@startuml\n[A] --> [B]\n@enduml\n").unwrap();

        let args = ParseArgs {
            input: Some(path),
            dialect: Some(DialectChoice::Class),
            ..ParseArgs::default()
        };
        let document = UmlgraphApp::new().parse_input(&args, false).unwrap();
        assert_eq!(document.kind(), DiagramKind::Class);
    }

    #[test]
    fn test_strict_components_by_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("system.component.puml");
        fs::write(&path, "@startuml\n[A]\nA --> B\n@enduml\n").unwrap();

        let strict = ParseArgs {
            input: Some(path.clone()),
            ..ParseArgs::default()
        };
        let app = UmlgraphApp::new();
        let ParsedDocument::Component(diagram) = app.parse_input(&strict, false).unwrap() else {
            panic!("expected a component diagram");
        };
        assert_eq!(diagram.explained_errors.len(), 1);

        let lax = ParseArgs {
            input: Some(path),
            lax: true,
            ..ParseArgs::default()
        };
        let ParsedDocument::Component(diagram) = app.parse_input(&lax, false).unwrap() else {
            panic!("expected a component diagram");
        };
        assert!(diagram.explained_errors.is_empty());
    }

    #[test]
    fn test_validate_fails_on_problems() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.class.puml");
        fs::write(&path, "@startuml\nclass A\n???\n@enduml\n").unwrap();

        let args = ParseArgs {
            input: Some(path),
            ..ParseArgs::default()
        };
        let result = UmlgraphApp::new().validate_command(&args, OutputFormat::Text, ColorChoice::Never, false);
        assert_eq!(result.unwrap_err().to_string(), "1 problem(s) found in class diagram");
    }

    #[test]
    fn test_scan_resolves_sequences_against_classes() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join("nested/checkout.seq.puml"), SEQUENCE).unwrap();
        fs::write(dir.path().join("cart.class.puml"), CLASSES).unwrap();
        fs::write(dir.path().join(".hidden/ignored.class.puml"), CLASSES).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a diagram").unwrap();

        let app = UmlgraphApp::new();
        let report = app.scan_report(dir.path(), false, OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report).unwrap();
        let documents = json.as_array().unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0]["dialect"], "class");
        assert_eq!(documents[1]["dialect"], "sequence");
        assert_eq!(documents[1]["messages"][0]["resolved"], true);
        assert!(documents[1]["diagnostics"].as_array().unwrap().is_empty());

        let text = app.scan_report(dir.path(), false, OutputFormat::Text).unwrap();
        assert!(text.ends_with("2 diagram(s) parsed\n"));
    }

    #[test]
    fn test_scan_requires_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.puml");
        fs::write(&file, "").unwrap();
        assert!(UmlgraphApp::new().scan_report(&file, false, OutputFormat::Text).is_err());
    }

    #[test]
    fn test_types_listing() {
        let text = types_listing(false).unwrap();
        assert!(text.contains("sequence"));
        assert!(text.contains("Total: 3 diagram types supported"));

        let json: serde_json::Value = serde_json::from_str(&types_listing(true).unwrap()).unwrap();
        assert_eq!(json["total"], 3);
        assert_eq!(json["supported_types"][1]["name"], "component");
    }

    #[test]
    fn test_detect_uses_file_hint_then_content() {
        let app = UmlgraphApp::new();
        let hinted = app
            .orchestrator
            .select_dialect("anything", Some(Path::new("x.seq.puml")))
            .unwrap();
        assert_eq!(hinted, DiagramKind::Sequence);
        assert!(app.orchestrator.select_dialect("This is not a diagram", None).is_err());
    }
}
