// File: fieldsan-core/src/headless.rs

//! `headless.rs`
//! Convenience wrapper for one-shot sanitization without building a
//! `Sanitizer` by hand. Uses a process-wide sanitizer with the default
//! configuration and only the built-in sanitizers.

use once_cell::sync::Lazy;

use crate::errors::Result;
use crate::node::Node;
use crate::sanitizer::Sanitizer;

static DEFAULT_SANITIZER: Lazy<Sanitizer> = Lazy::new(Sanitizer::new);

/// The shared default sanitizer.
pub fn default_sanitizer() -> &'static Sanitizer {
    &DEFAULT_SANITIZER
}

/// Sanitizes `target` in place with the default sanitizer (tag name `"san"`).
pub fn sanitize(target: &mut dyn Node) -> Result<()> {
    DEFAULT_SANITIZER.sanitize(target)
}
