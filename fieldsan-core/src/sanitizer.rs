//! The `Sanitizer` facade.
//!
//! A `Sanitizer` owns a validated [`SanitizerConfig`] and its own dispatch
//! [`Registry`]. Registering sanitizers needs `&mut self` and sanitizing only
//! needs `&self`, so the registry can only change while nobody is sanitizing
//! with it. Once set up, a `Sanitizer` can be shared freely across threads.
//!
//! License: MIT OR APACHE 2.0

use std::any::Any;

use log::debug;

use crate::config::{SanitizerConfig, SanitizerOption};
use crate::engine;
use crate::errors::Result;
use crate::node::Node;
use crate::registry::{Cell, FieldContext, Registry, SanitizeFn};

#[derive(Debug)]
pub struct Sanitizer {
    config: SanitizerConfig,
    registry: Registry,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            config: SanitizerConfig::default(),
            registry: Registry::with_builtins(),
        }
    }
}

impl Sanitizer {
    /// A sanitizer with the default configuration (tag name `"san"`, no date policy).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sanitizer from construction options.
    pub fn with_options<I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = SanitizerOption>,
    {
        Self::from_config(SanitizerConfig::from_options(options)?)
    }

    /// Builds a sanitizer from a configuration, validating it first.
    pub fn from_config(config: SanitizerConfig) -> Result<Self> {
        config.validate()?;
        debug!("Creating sanitizer with tag name '{}'.", config.tag_name);
        Ok(Self {
            config,
            registry: Registry::with_builtins(),
        })
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    pub fn tag_name(&self) -> &str {
        &self.config.tag_name
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Sanitizes `target` in place.
    ///
    /// `target` may be a record, an `Option` of one, or a `Vec`/map of them.
    /// Anything else (including `None`) is left alone and `Ok(())` is returned.
    /// On error, fields processed before the failing one stay mutated.
    pub fn sanitize(&self, target: &mut dyn Node) -> Result<()> {
        engine::sanitize_node(self, target)
    }

    /// Installs `f` as the sanitizer for leaf type `T`, replacing any previous one.
    ///
    /// `f` receives every cell of a matching field in one call. For `T` to be
    /// reached at all it must be declared as a leaf with [`leaf!`](crate::leaf).
    pub fn register_sanitizer<T, F>(&mut self, f: F)
    where
        T: Any,
        F: Fn(&Sanitizer, &FieldContext<'_>, Vec<Cell<'_, T>>) -> Result<()> + Send + Sync + 'static,
    {
        debug!("Registering sanitizer for type '{}'.", std::any::type_name::<T>());
        self.registry.register::<T, F>(f);
    }

    /// Returns the sanitizer registered for `T` exactly (no text fallback).
    pub fn get_sanitizer<T: Any>(&self) -> Result<SanitizeFn> {
        self.registry.get::<T>()
    }
}
