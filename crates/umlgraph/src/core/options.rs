//! Parse configuration shared by all dialect parsers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::DiagramError;

/// Longest line the guarded matchers will evaluate
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Wall-clock bound for a single guarded match
pub const DEFAULT_MATCH_TIME_LIMIT: Duration = Duration::from_millis(200);

/// Cooperative cancellation token checked at every line boundary
///
/// Clones share the same flag, so a caller keeps one clone and hands the
/// other to [`ParseOptions::with_cancel`].
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every parse holding this flag
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options accepted by the `*_with_options` entry points
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Component arrows may only reference declared entities
    pub components_must_be_defined: bool,
    /// Sequence parsing stops after lifeline declarations
    pub just_lifelines: bool,
    pub cancel: Option<CancellationFlag>,
    pub max_line_length: usize,
    pub match_time_limit: Duration,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            components_must_be_defined: true,
            just_lifelines: false,
            cancel: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            match_time_limit: DEFAULT_MATCH_TIME_LIMIT,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_components_must_be_defined(mut self, value: bool) -> Self {
        self.components_must_be_defined = value;
        self
    }

    pub fn with_just_lifelines(mut self, value: bool) -> Self {
        self.just_lifelines = value;
        self
    }

    pub fn with_cancel(mut self, flag: CancellationFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    pub fn with_match_time_limit(mut self, limit: Duration) -> Self {
        self.match_time_limit = limit;
        self
    }

    /// Fail with [`DiagramError::Cancelled`] if the flag has been raised
    pub fn check_cancelled(&self, line: usize) -> Result<(), DiagramError> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => Err(DiagramError::Cancelled { line }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert!(options.components_must_be_defined);
        assert!(!options.just_lifelines);
        assert_eq!(options.max_line_length, DEFAULT_MAX_LINE_LENGTH);
        assert_eq!(options.match_time_limit, Duration::from_millis(200));
        assert!(options.check_cancelled(1).is_ok());
    }

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let options = ParseOptions::new().with_cancel(flag.clone());
        assert!(options.check_cancelled(3).is_ok());

        flag.cancel();
        match options.check_cancelled(3) {
            Err(DiagramError::Cancelled { line }) => assert_eq!(line, 3),
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_chain() {
        let options = ParseOptions::new()
            .with_components_must_be_defined(false)
            .with_just_lifelines(true)
            .with_max_line_length(10)
            .with_match_time_limit(Duration::from_millis(5));
        assert!(!options.components_must_be_defined);
        assert!(options.just_lifelines);
        assert_eq!(options.max_line_length, 10);
        assert_eq!(options.match_time_limit, Duration::from_millis(5));
    }
}
