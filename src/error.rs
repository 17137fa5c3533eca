//! Construction-time error taxonomy
//!
//! Every failure mode surfaces while the router is being built; matching
//! at request time never fails, it dispatches the not-found handler
//! instead.

use thiserror::Error;

/// Errors raised while compiling patterns and building the router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Syntactic error in a registered pattern.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A regex constraint failed to compile.
    #[error("invalid regular expression in pattern {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A method outside the routable set.
    #[error("unknown http method: {0:?}")]
    UnknownMethod(String),

    /// A single method's tree interned more regexes than a one-byte index
    /// can address.
    #[error("too many regex constraints for one method (max {max})")]
    TooManyRegexes { max: usize },

    /// A pattern declares more parameters than a buffer can capture.
    #[error("pattern {pattern:?} has {count} parameters (max {max})")]
    PatternOverflow {
        pattern: String,
        count: usize,
        max: usize,
    },

    /// Two registrations collapse to the same matching key.
    #[error("duplicate pattern: {0:?}")]
    DuplicatePattern(String),
}

impl RouterError {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
