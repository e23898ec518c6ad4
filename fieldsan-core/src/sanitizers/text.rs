//! Transforms, length limits and defaults for text fields.
//!
//! Directives: `max=<n>` (length in characters), `def=<s>`, and the verbs of
//! the transform catalogue (`xss`, `trim`, `lower`, `upper`, `title`, `cap`)
//! plus `date`. Transforms run first, then truncation to `max` (trimming
//! again if `trim` is set), then the default replaces a value left empty.
//!
//! License: MIT OR APACHE 2.0

use log::{trace, warn};

use crate::errors::{Result, SanitizeError};
use crate::node::CellMut;
use crate::registry::{downcast_cells, Cell, FieldContext, Registry};
use crate::sanitizer::Sanitizer;
use crate::transforms;

/// A leaf type backed by a `String`.
///
/// Implement this for newtypes such as `struct Email(String)` and declare them
/// with `leaf!(Email as text)` to have the text sanitizer apply to them.
pub trait Text: 'static {
    fn text_mut(&mut self) -> &mut String;
    fn from_text(text: String) -> Self;
}

impl Text for String {
    fn text_mut(&mut self) -> &mut String {
        self
    }

    fn from_text(text: String) -> Self {
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextDirectives {
    max: Option<usize>,
    def: Option<String>,
}

impl TextDirectives {
    fn from_context(ctx: &FieldContext<'_>) -> Result<Self> {
        let max = ctx.parse::<usize>("max")?;
        let def = ctx.get("def").map(str::to_string);
        if let (Some(max), Some(def)) = (max, def.as_deref()) {
            let len = def.chars().count();
            if len > max {
                return Err(SanitizeError::DefaultTooLong {
                    record: ctx.record,
                    field: ctx.field,
                    len,
                    max,
                });
            }
        }
        Ok(Self { max, def })
    }
}

fn truncate_chars(text: &mut String, max: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
    }
}

/// Transforms, date policy and length limit for one value. A date no format
/// accepts is cleared when `strict`, kept otherwise.
fn normalize(sanitizer: &Sanitizer, ctx: &FieldContext<'_>, max: Option<usize>, text: &mut String, strict: bool) {
    transforms::apply_verbs(ctx.directives, text);
    if ctx.has("date") {
        match sanitizer.config().date_format.as_ref() {
            Some(policy) => match transforms::reformat_date(policy, text) {
                Some(date) => *text = date,
                None if strict => text.clear(),
                None => {}
            },
            None => warn!(
                "{}.{}: 'date' directive used but no date format is configured; value left unchanged.",
                ctx.record, ctx.field
            ),
        }
    }
    if let Some(max) = max {
        truncate_chars(text, max);
        // Truncation can expose trailing whitespace.
        if ctx.has("trim") {
            transforms::trim(text);
        }
    }
}

fn sanitize_value(
    sanitizer: &Sanitizer,
    ctx: &FieldContext<'_>,
    directives: &TextDirectives,
    def: Option<&String>,
    text: &mut String,
) {
    normalize(sanitizer, ctx, directives.max, text, true);
    if text.is_empty() {
        if let Some(def) = def {
            text.clone_from(def);
        }
    }
}

/// Sanitizer shared by every [`Text`] type.
///
/// The default goes through the same transforms as any other value, so a
/// second pass leaves it unchanged.
pub fn sanitize_text<T: Text>(sanitizer: &Sanitizer, ctx: &FieldContext<'_>, cells: Vec<Cell<'_, T>>) -> Result<()> {
    let directives = TextDirectives::from_context(ctx)?;
    trace!("{}.{}: {} text cell(s)", ctx.record, ctx.field, cells.len());

    let def = directives.def.as_ref().map(|def| {
        let mut value = def.clone();
        normalize(sanitizer, ctx, directives.max, &mut value, false);
        value
    });

    for cell in cells {
        match cell {
            Cell::Value(value) => sanitize_value(sanitizer, ctx, &directives, def.as_ref(), value.text_mut()),
            Cell::Optional(slot) => {
                if let Some(value) = slot.as_mut() {
                    sanitize_value(sanitizer, ctx, &directives, def.as_ref(), value.text_mut());
                } else if let Some(def) = &def {
                    *slot = Some(T::from_text(def.clone()));
                }
            }
        }
    }
    Ok(())
}

/// Erased entry point used for text-like leaves that have no registered sanitizer.
pub fn text_fallback<T: Text>(sanitizer: &Sanitizer, ctx: &FieldContext<'_>, cells: Vec<CellMut<'_>>) -> Result<()> {
    sanitize_text::<T>(sanitizer, ctx, downcast_cells::<T>(cells))
}

pub(crate) fn register(registry: &mut Registry) {
    registry.register::<String, _>(sanitize_text::<String>);
}
