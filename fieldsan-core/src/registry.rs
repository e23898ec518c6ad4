//! The type-dispatch table.
//!
//! Sanitizers are keyed by the `TypeId` of the leaf type they handle. The
//! field's wrapping (`Option`, `Vec`, ...) is not part of the key: the engine
//! hands every sanitizer a flat list of [`Cell`]s, whatever the field's
//! [`Shape`](crate::Shape).
//!
//! License: MIT OR APACHE 2.0

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;

use crate::directives::DirectiveSet;
use crate::errors::{Result, SanitizeError};
use crate::node::{CellMut, Layout, LeafType};
use crate::sanitizer::Sanitizer;
use crate::sanitizers;

/// Typed mutable slot for one leaf value of type `T`.
pub enum Cell<'a, T> {
    Value(&'a mut T),
    Optional(&'a mut Option<T>),
}

/// Type-erased sanitizer as stored in the table.
pub type SanitizeFn =
    Arc<dyn Fn(&Sanitizer, &FieldContext<'_>, Vec<CellMut<'_>>) -> Result<()> + Send + Sync>;

/// Text sanitizer instantiated for a text-like leaf, used when the table has
/// no entry for that leaf.
pub type TextFallback = fn(&Sanitizer, &FieldContext<'_>, Vec<CellMut<'_>>) -> Result<()>;

/// Everything a sanitizer knows about the field it is working on.
#[derive(Debug)]
pub struct FieldContext<'a> {
    pub record: &'static str,
    pub field: &'static str,
    pub layout: Layout,
    pub directives: &'a DirectiveSet,
}

impl<'a> FieldContext<'a> {
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.directives.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.directives.has(key)
    }

    /// Parses directive `key` as `T`. Absent keys yield `Ok(None)`.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        raw.parse::<T>().map(Some).map_err(|e| SanitizeError::InvalidDirective {
            record: self.record,
            field: self.field,
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Converts erased cells into typed ones. Cells of another type are dropped,
/// which only happens when a layout names a leaf the cells do not hold.
pub fn downcast_cells<'a, T: Any>(cells: Vec<CellMut<'a>>) -> Vec<Cell<'a, T>> {
    cells
        .into_iter()
        .filter_map(|cell| match cell {
            CellMut::Value(any) => any.downcast_mut::<T>().map(Cell::Value),
            CellMut::Optional(any) => any.downcast_mut::<Option<T>>().map(Cell::Optional),
        })
        .collect()
}

/// Wraps a typed sanitizer into the erased form stored in the table.
pub fn erase<T, F>(f: F) -> SanitizeFn
where
    T: Any,
    F: Fn(&Sanitizer, &FieldContext<'_>, Vec<Cell<'_, T>>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |sanitizer: &Sanitizer, ctx: &FieldContext<'_>, cells: Vec<CellMut<'_>>| {
        f(sanitizer, ctx, downcast_cells::<T>(cells))
    })
}

struct Entry {
    type_name: &'static str,
    func: SanitizeFn,
}

/// A resolved sanitizer for one field.
pub enum Dispatch<'r> {
    Registered(&'r SanitizeFn),
    Text(TextFallback),
}

impl Dispatch<'_> {
    pub fn call(&self, sanitizer: &Sanitizer, ctx: &FieldContext<'_>, cells: Vec<CellMut<'_>>) -> Result<()> {
        match self {
            Dispatch::Registered(func) => func(sanitizer, ctx, cells),
            Dispatch::Text(func) => func(sanitizer, ctx, cells),
        }
    }
}

/// Mapping from leaf type to sanitizer.
pub struct Registry {
    entries: HashMap<TypeId, Entry>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("types", &names).finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Registry {
    /// A table with no entries at all.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// A table pre-populated with the built-in sanitizers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        sanitizers::register_builtins(&mut registry);
        debug!("Registered {} built-in sanitizers.", registry.len());
        registry
    }

    /// Inserts or replaces the sanitizer for leaf type `T`.
    pub fn register<T, F>(&mut self, f: F)
    where
        T: Any,
        F: Fn(&Sanitizer, &FieldContext<'_>, Vec<Cell<'_, T>>) -> Result<()> + Send + Sync + 'static,
    {
        self.register_erased(TypeId::of::<T>(), std::any::type_name::<T>(), erase::<T, F>(f));
    }

    pub fn register_erased(&mut self, id: TypeId, type_name: &'static str, func: SanitizeFn) {
        if self.entries.insert(id, Entry { type_name, func }).is_some() {
            debug!("Replaced sanitizer for type '{}'.", type_name);
        }
    }

    /// Exact lookup for `T`.
    pub fn get<T: Any>(&self) -> Result<SanitizeFn> {
        self.entries
            .get(&TypeId::of::<T>())
            .map(|entry| Arc::clone(&entry.func))
            .ok_or(SanitizeError::SanitizerNotFound(std::any::type_name::<T>()))
    }

    /// Lookup used during traversal: exact entry first, then the text fallback.
    pub fn resolve(&self, leaf: &LeafType) -> Option<Dispatch<'_>> {
        if let Some(entry) = self.entries.get(&leaf.id) {
            return Some(Dispatch::Registered(&entry.func));
        }
        leaf.text.map(Dispatch::Text)
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    struct Opaque;

    #[test]
    fn test_builtins_cover_primitive_families() {
        let registry = Registry::with_builtins();
        assert!(registry.contains::<String>());
        assert!(registry.contains::<bool>());
        assert!(registry.contains::<i8>());
        assert!(registry.contains::<u64>());
        assert!(registry.contains::<usize>());
        assert!(registry.contains::<f32>());
        assert!(!registry.contains::<char>());
    }

    #[test]
    fn test_get_unknown_type_fails() {
        let registry = Registry::with_builtins();
        let err = registry.get::<Opaque>().err().unwrap();
        assert!(matches!(err, SanitizeError::SanitizerNotFound(_)));
        assert!(err.to_string().contains("Opaque"));
    }

    #[test]
    fn test_resolve_prefers_exact_entry_over_text_fallback() {
        let mut registry = Registry::empty();
        let leaf = <String as Node>::layout().unwrap().leaf;
        assert!(matches!(registry.resolve(&leaf), Some(Dispatch::Text(_))));

        registry.register::<String, _>(|_, _, _| Ok(()));
        assert!(matches!(registry.resolve(&leaf), Some(Dispatch::Registered(_))));

        let char_leaf = <char as Node>::layout().unwrap().leaf;
        assert!(registry.resolve(&char_leaf).is_none());
    }

    #[test]
    fn test_context_parse_reports_bad_values() {
        let directives = DirectiveSet::parse("min=x,max=7");
        let ctx = FieldContext {
            record: "Order",
            field: "qty",
            layout: <u8 as Node>::layout().unwrap(),
            directives: &directives,
        };
        assert_eq!(ctx.parse::<u8>("max").unwrap(), Some(7));
        assert_eq!(ctx.parse::<u8>("def").unwrap(), None);
        let err = ctx.parse::<u8>("min").unwrap_err();
        assert!(err.is_directive_error());
        assert!(err.to_string().contains("Order.qty"));
    }
}
