// fieldsan-core/src/lib.rs
//! # fieldsan Core Library
//!
//! `fieldsan-core` normalizes records in place according to directives declared
//! on their fields: trimming and casing of text, maximum lengths, numeric
//! bounds, default values and date re-formatting. It is meant for data that
//! arrives loosely validated (deserialized requests, imported rows) and must be
//! brought into shape before use.
//!
//! ## Modules
//!
//! * `config`: `SanitizerConfig`, its options and file loading.
//! * `directives`: Lexical parsing of a field's directive string.
//! * `node`: The `Node` trait describing how a field value is shaped.
//! * `record`: The `Record` trait and per-field accessors.
//! * `registry`: The type-dispatch table mapping leaf types to sanitizers.
//! * `sanitizers`: Built-in sanitizers for text, numbers and booleans.
//! * `transforms`: String transforms used by the text sanitizer.
//! * `engine`: Recursive traversal of record graphs.
//! * `sanitizer`: The `Sanitizer` facade.
//! * `headless`: One-shot sanitization with a shared default `Sanitizer`.
//! * `errors`: The `SanitizeError` type.
//!
//! ## Usage Example
//!
//! ```rust
//! use fieldsan_core::{Record, Sanitizer};
//!
//! #[derive(Record)]
//! struct Signup {
//!     #[tag(san = "trim,lower,max=64")]
//!     email: String,
//!     #[tag(san = "min=13,max=130")]
//!     age: u8,
//!     #[tag(san = "def=true")]
//!     newsletter: Option<bool>,
//! }
//!
//! fn main() -> Result<(), fieldsan_core::SanitizeError> {
//!     let mut signup = Signup {
//!         email: "  Jane@Example.COM ".to_string(),
//!         age: 7,
//!         newsletter: None,
//!     };
//!
//!     Sanitizer::new().sanitize(&mut signup)?;
//!
//!     assert_eq!(signup.email, "jane@example.com");
//!     assert_eq!(signup.age, 13);
//!     assert_eq!(signup.newsletter, Some(true));
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`SanitizeError`]. Sanitization stops at the
//! first error; fields processed before it keep their new values.
//!
//! ---
//! License: MIT OR Apache-2.0

// Lets code generated by `#[derive(Record)]` name this crate from inside it.
extern crate self as fieldsan_core;

pub mod config;
pub mod directives;
pub mod engine;
pub mod errors;
pub mod headless;
pub mod node;
pub mod record;
pub mod registry;
pub mod sanitizer;
pub mod sanitizers;
pub mod transforms;

/// Re-exports the configuration types.
pub use config::{DateFormat, SanitizerConfig, SanitizerOption, DEFAULT_TAG_NAME};

/// Re-exports the error type and result alias.
pub use errors::{Result, SanitizeError};

/// Re-exports the field introspection model.
pub use node::{CellMut, Layout, LeafType, Node, Root, Shape};
pub use record::{FieldMut, Record, Tags};

/// Re-exports the dispatch table types used by custom sanitizers.
pub use directives::{Directive, DirectiveSet};
pub use registry::{Cell, FieldContext, Registry, SanitizeFn};
pub use sanitizers::text::Text;

/// Re-exports the facade and the one-shot helper.
pub use headless::{default_sanitizer, sanitize};
pub use sanitizer::Sanitizer;

/// Re-exports the derive macro for `Record`.
#[cfg(feature = "derive")]
pub use fieldsan_derive::Record;
