// fieldsan-core/src/engine.rs
//! The traversal engine.
//!
//! Walks a record graph from a root reference. For every field it first runs
//! the typed sanitizer the dispatch table resolves for the field's leaf type,
//! then recurses into every record nested in the field. A root that is a
//! sequence or mapping is unrolled and each element is treated as a root of
//! its own; the first error from those elements is kept and later ones are
//! chained onto it.
//!
//! Records are owned trees (`Option`, `Box`, `Vec` and maps all own their
//! contents), so a walk always terminates.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, trace};

use crate::directives::DirectiveSet;
use crate::errors::{Result, SanitizeError};
use crate::node::{Node, Root};
use crate::record::{FieldMut, Record};
use crate::registry::FieldContext;
use crate::sanitizer::Sanitizer;

/// Entry contract shared by the facade and by unrolled sequence/map roots.
pub(crate) fn sanitize_node(sanitizer: &Sanitizer, node: &mut dyn Node) -> Result<()> {
    match node.root() {
        Root::Record(record) => sanitize_record(sanitizer, record),
        Root::Each(items) => {
            debug!("Sanitizing {} root element(s).", items.len());
            let mut first: Option<SanitizeError> = None;
            for item in items {
                if let Err(err) = sanitize_node(sanitizer, item) {
                    first = Some(match first {
                        None => err,
                        Some(earlier) => earlier.chain(err),
                    });
                }
            }
            first.map_or(Ok(()), Err)
        }
        Root::Ineligible => {
            debug!("Root is not a record, a sequence or a mapping; nothing to sanitize.");
            Ok(())
        }
    }
}

/// Sanitizes every field of `record`, depth first.
pub(crate) fn sanitize_record(sanitizer: &Sanitizer, record: &mut dyn Record) -> Result<()> {
    let record_name = record.record_name();
    trace!("Sanitizing record '{}'.", record_name);
    for field in record.fields_mut() {
        sanitize_field(sanitizer, record_name, field)?;
    }
    Ok(())
}

fn sanitize_field(sanitizer: &Sanitizer, record_name: &'static str, mut field: FieldMut<'_>) -> Result<()> {
    let field_name = field.name();
    let directives = DirectiveSet::parse(field.tags().get(sanitizer.tag_name()).unwrap_or(""));
    let value = field.value_mut();

    if let Some(layout) = value.node_layout() {
        if let Some(dispatch) = sanitizer.registry().resolve(&layout.leaf) {
            trace!(
                "{}.{}: dispatching {:?} of '{}'.",
                record_name,
                field_name,
                layout.shape,
                layout.leaf.name
            );
            let ctx = FieldContext {
                record: record_name,
                field: field_name,
                layout,
                directives: &directives,
            };
            let mut cells = Vec::new();
            value.collect_cells(&mut cells);
            dispatch.call(sanitizer, &ctx, cells)?;
        }
    }

    let mut nested = Vec::new();
    value.collect_records(&mut nested);
    for child in nested {
        sanitize_record(sanitizer, child)?;
    }
    Ok(())
}
