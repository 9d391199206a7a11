//! Core abstractions for diagram parsing
//!
//! This module defines the traits every dialect plugin implements, the shared
//! entity model, and the line-level machinery (classifier, arrow grammar,
//! source handling) the parsers are built from.

pub mod chumsky_utils;
mod classifier;
mod collection;
mod connection;
mod detector;
mod diagram;
mod document;
mod error;
pub mod logging;
mod model;
mod options;
mod parser;
mod source;
mod text;

pub use classifier::*;
pub use collection::*;
pub use connection::*;
pub use detector::*;
pub use diagram::*;
pub use document::*;
pub use error::*;
pub use logging::*;
pub use model::*;
pub use options::*;
pub use parser::*;
pub use source::*;
pub use text::*;
