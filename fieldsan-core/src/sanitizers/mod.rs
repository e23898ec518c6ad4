//! Built-in per-type sanitizers.
//!
//! Each submodule implements the policy for one family of leaf types. All of
//! them share the same calling convention: they receive the field's parsed
//! directives through a [`FieldContext`](crate::FieldContext), validate those
//! directives before touching anything, then mutate every cell of the field in
//! order.

pub mod boolean;
pub mod numeric;
pub mod text;

use crate::registry::Registry;

/// Installs the sanitizers for every primitive family.
pub(crate) fn register_builtins(registry: &mut Registry) {
    numeric::register(registry);
    text::register(registry);
    boolean::register(registry);
}
