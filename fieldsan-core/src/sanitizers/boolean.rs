//! Defaults for boolean fields.
//!
//! Only `def=<true|false>` is understood, and only unset (`None`) optional
//! cells take it: a plain `bool` always holds a value.

use crate::errors::Result;
use crate::registry::{Cell, FieldContext, Registry};
use crate::sanitizer::Sanitizer;

pub fn sanitize_bool(_sanitizer: &Sanitizer, ctx: &FieldContext<'_>, cells: Vec<Cell<'_, bool>>) -> Result<()> {
    let Some(def) = ctx.parse::<bool>("def")? else {
        return Ok(());
    };
    for cell in cells {
        if let Cell::Optional(slot) = cell {
            if slot.is_none() {
                *slot = Some(def);
            }
        }
    }
    Ok(())
}

pub(crate) fn register(registry: &mut Registry) {
    registry.register::<bool, _>(sanitize_bool);
}
