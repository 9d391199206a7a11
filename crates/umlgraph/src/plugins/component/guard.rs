//! Bounded regex evaluation
//!
//! The `regex` engine runs in linear time, so the guard bounds the input size
//! up front and reports evaluations that still overrun the wall-clock limit.

use std::time::{Duration, Instant};

use regex::{Captures, Regex};
use thiserror::Error;

use crate::core::{DiagramError, ParseOptions};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("line of {len} bytes exceeds the {max} byte matcher limit")]
    TooLong { len: usize, max: usize },

    #[error("match took {elapsed:?}, limit is {limit:?}")]
    TimedOut { elapsed: Duration, limit: Duration },
}

/// A compiled pattern with input-size and time bounds
#[derive(Debug, Clone)]
pub struct GuardedPattern {
    regex: Regex,
    max_line_length: usize,
    time_limit: Duration,
}

impl GuardedPattern {
    pub fn compile(pattern: &str, options: &ParseOptions) -> Result<Self, DiagramError> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            max_line_length: options.max_line_length,
            time_limit: options.match_time_limit,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn captures<'t>(&self, text: &'t str) -> Result<Option<Captures<'t>>, GuardError> {
        if text.len() > self.max_line_length {
            return Err(GuardError::TooLong {
                len: text.len(),
                max: self.max_line_length,
            });
        }

        let started = Instant::now();
        let captures = self.regex.captures(text);
        let elapsed = started.elapsed();
        if elapsed > self.time_limit {
            return Err(GuardError::TimedOut {
                elapsed,
                limit: self.time_limit,
            });
        }
        Ok(captures)
    }
}
