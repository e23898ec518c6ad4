//! Records and field accessors.
//!
//! A [`Record`] splits a mutable borrow of itself into one [`FieldMut`] per
//! declared field. The impl is normally generated by `#[derive(Record)]` in the
//! module that defines the type, so private fields are reachable through the
//! same safe borrow as public ones.
//!
//! License: MIT OR APACHE 2.0

use crate::node::Node;

/// Field metadata: `(key, value)` pairs from `#[tag(key = "value")]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tags(&'static [(&'static str, &'static str)]);

impl Tags {
    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self(pairs)
    }

    /// Returns the value declared for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Mutable access to one field of a record.
pub struct FieldMut<'a> {
    name: &'static str,
    tags: Tags,
    value: &'a mut dyn Node,
}

impl<'a> FieldMut<'a> {
    pub fn new(name: &'static str, tags: Tags, value: &'a mut dyn Node) -> Self {
        Self { name, tags, value }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tags(&self) -> Tags {
        self.tags
    }

    /// The field's storage, settable regardless of the field's visibility.
    pub fn value_mut(&mut self) -> &mut dyn Node {
        &mut *self.value
    }

    pub fn into_value(self) -> &'a mut dyn Node {
        self.value
    }
}

/// A composite value whose fields can be sanitized.
pub trait Record: Node {
    /// Name used in error messages and logs.
    fn record_name(&self) -> &'static str;

    /// One accessor per sanitizable field, in declaration order.
    fn fields_mut(&mut self) -> Vec<FieldMut<'_>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{CellMut, Root};

    struct Point {
        x: i32,
        y: i32,
    }

    impl Node for Point {
        fn collect_records<'a>(&'a mut self, out: &mut Vec<&'a mut dyn Record>) {
            out.push(self);
        }

        fn root(&mut self) -> Root<'_> {
            Root::Record(self)
        }
    }

    impl Record for Point {
        fn record_name(&self) -> &'static str {
            "Point"
        }

        fn fields_mut(&mut self) -> Vec<FieldMut<'_>> {
            vec![
                FieldMut::new("x", Tags::new(&[("san", "min=0")]), &mut self.x),
                FieldMut::new("y", Tags::default(), &mut self.y),
            ]
        }
    }

    #[test]
    fn test_tags_lookup() {
        let tags = Tags::new(&[("san", "trim"), ("json", "name")]);
        assert_eq!(tags.get("san"), Some("trim"));
        assert_eq!(tags.get("json"), Some("name"));
        assert_eq!(tags.get("other"), None);
        assert!(Tags::default().is_empty());
    }

    #[test]
    fn test_private_fields_are_settable_through_accessor() {
        let mut point = Point { x: -4, y: 2 };
        for mut field in point.fields_mut() {
            let mut cells = Vec::new();
            field.value_mut().collect_cells(&mut cells);
            for cell in cells {
                if let CellMut::Value(any) = cell {
                    if let Some(v) = any.downcast_mut::<i32>() {
                        *v *= 10;
                    }
                }
            }
        }
        assert_eq!((point.x, point.y), (-40, 20));
    }
}
