//! errors.rs - Custom error types for the fieldsan-core library.
//!
//! A single structured enum covers the three failure families: configuration
//! errors raised while building a `Sanitizer`, directive errors raised while a
//! field is being sanitized, and dispatch errors raised by explicit lookups.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// Shorthand result type used throughout the crate.
pub type Result<T> = std::result::Result<T, SanitizeError>;

/// This enum represents all possible error types in the `fieldsan-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SanitizeError {
    #[error("tag name {0:?} must be between 1 and 10 characters")]
    InvalidTagName(String),

    #[error("invalid sanitizer configuration: {0}")]
    InvalidConfig(String),

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value {value:?} for directive '{key}' on field '{record}.{field}': {reason}")]
    InvalidDirective {
        record: &'static str,
        field: &'static str,
        key: String,
        value: String,
        reason: String,
    },

    #[error("max ({max}) less than min ({min}) on field '{record}.{field}'")]
    MaxBelowMin {
        record: &'static str,
        field: &'static str,
        min: String,
        max: String,
    },

    #[error("min and max on field '{record}.{field}' can not be below 0")]
    NegativeBound {
        record: &'static str,
        field: &'static str,
    },

    #[error("incompatible def and max directives on field '{record}.{field}': def ({def}) is higher than max ({max})")]
    DefaultAboveMax {
        record: &'static str,
        field: &'static str,
        def: String,
        max: String,
    },

    #[error("incompatible def and min directives on field '{record}.{field}': def ({def}) is lower than min ({min})")]
    DefaultBelowMin {
        record: &'static str,
        field: &'static str,
        def: String,
        min: String,
    },

    #[error("def on field '{record}.{field}' is {len} characters long, longer than max ({max})")]
    DefaultTooLong {
        record: &'static str,
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("sanitize function not found for {0}")]
    SanitizerNotFound(&'static str),

    #[error("{context}: {source}")]
    Chained {
        context: String,
        #[source]
        source: Box<SanitizeError>,
    },

    #[error("{0}")]
    Custom(String),

    #[error("A critical sanitizer error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),
}

impl SanitizeError {
    /// Wraps `self` with the message of a later error, keeping `self` as the source.
    pub fn chain(self, later: SanitizeError) -> SanitizeError {
        SanitizeError::Chained {
            context: later.to_string(),
            source: Box::new(self),
        }
    }

    /// True for errors raised while building a `Sanitizer`.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SanitizeError::InvalidTagName(_) | SanitizeError::InvalidConfig(_) | SanitizeError::Io(_)
        )
    }

    /// True for errors caused by a field's directives. A `Chained` error is
    /// classified by its innermost source, which is the first failure seen.
    pub fn is_directive_error(&self) -> bool {
        match self {
            SanitizeError::InvalidDirective { .. }
            | SanitizeError::MaxBelowMin { .. }
            | SanitizeError::NegativeBound { .. }
            | SanitizeError::DefaultAboveMax { .. }
            | SanitizeError::DefaultBelowMin { .. }
            | SanitizeError::DefaultTooLong { .. } => true,
            SanitizeError::Chained { source, .. } => source.is_directive_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_keeps_first_error_as_source() {
        let first = SanitizeError::NegativeBound { record: "Order", field: "qty" };
        let later = SanitizeError::Custom("second".to_string());
        let chained = first.chain(later);

        assert_eq!(
            chained.to_string(),
            "second: min and max on field 'Order.qty' can not be below 0"
        );
        assert!(chained.is_directive_error());
        assert!(!chained.is_config_error());
    }

    #[test]
    fn test_config_classification() {
        assert!(SanitizeError::InvalidTagName(String::new()).is_config_error());
        assert!(!SanitizeError::SanitizerNotFound("u8").is_directive_error());
    }
}
