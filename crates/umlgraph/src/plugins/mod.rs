//! Dialect plugins
//!
//! Each dialect provides a detector, a parser and a document type. The
//! orchestrator ties them together for callers that do not know the dialect.

pub mod class;
pub mod component;
pub mod orchestrator;
pub mod sequence;

pub use class::*;
pub use component::*;
pub use orchestrator::*;
pub use sequence::*;
