//! Runtime introspection of field values.
//!
//! Every type that can appear as a field of a sanitizable record implements
//! [`Node`]. A node answers three questions for the traversal engine:
//!
//! * which leaf type it is built from and how that leaf is wrapped
//!   ([`Layout`]), so the dispatch table can pick a sanitizer;
//! * where its leaf values live ([`CellMut`]), so that sanitizer can mutate them;
//! * which nested records it owns, so the engine can recurse.
//!
//! Primitive leaves are declared with [`leaf!`](crate::leaf); containers
//! (`Option`, `Vec`, `Box`, `HashMap`, `BTreeMap`) are implemented here once and
//! compose with any leaf or record.
//!
//! License: MIT OR APACHE 2.0

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::record::Record;
use crate::registry::TextFallback;
use crate::sanitizers::text::{text_fallback, Text};

/// How a leaf value is wrapped inside a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `T`
    Value,
    /// `Option<T>`
    Optional,
    /// `Vec<T>`
    Sequence,
    /// `Option<Vec<T>>`
    OptionalSequence,
    /// `Vec<Option<T>>`
    SequenceOfOptional,
    /// `Option<Vec<Option<T>>>`
    OptionalSequenceOfOptional,
    /// `HashMap<K, T>` or `BTreeMap<K, T>`
    Mapping,
    /// `Option<HashMap<K, T>>` or `Option<BTreeMap<K, T>>`
    OptionalMapping,
}

/// Identity of a leaf type, plus the text sanitizer to fall back on when the
/// leaf is text-like but has no sanitizer of its own.
#[derive(Clone, Copy)]
pub struct LeafType {
    pub id: TypeId,
    pub name: &'static str,
    pub text: Option<TextFallback>,
}

impl LeafType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            text: None,
        }
    }

    pub fn text<T: Text>() -> Self {
        Self {
            text: Some(text_fallback::<T>),
            ..Self::of::<T>()
        }
    }
}

impl fmt::Debug for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafType")
            .field("name", &self.name)
            .field("text", &self.text.is_some())
            .finish()
    }
}

/// Leaf type and wrapping of a field, resolved once per field visit.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub shape: Shape,
    pub leaf: LeafType,
}

impl Layout {
    pub fn leaf(leaf: LeafType) -> Self {
        Self { shape: Shape::Value, leaf }
    }
}

/// Type-erased mutable slot holding one leaf value.
///
/// `Value` points at a `T`, `Optional` at an `Option<T>`, where `T` is the
/// leaf type named by the field's [`Layout`].
pub enum CellMut<'a> {
    Value(&'a mut dyn Any),
    Optional(&'a mut dyn Any),
}

/// What a root reference passed to `Sanitizer::sanitize` turns out to be.
pub enum Root<'a> {
    Record(&'a mut dyn Record),
    Each(Vec<&'a mut dyn Node>),
    Ineligible,
}

/// A value that may appear inside a sanitizable record.
pub trait Node: Any {
    /// Static layout of this type, `None` if it is not built from a single leaf.
    fn layout() -> Option<Layout>
    where
        Self: Sized,
    {
        None
    }

    /// Object-safe access to [`Node::layout`].
    fn node_layout(&self) -> Option<Layout> {
        None
    }

    /// Pushes every leaf slot reachable through this value.
    fn collect_cells<'a>(&'a mut self, _out: &mut Vec<CellMut<'a>>) {}

    /// Pushes every record directly reachable through this value.
    fn collect_records<'a>(&'a mut self, _out: &mut Vec<&'a mut dyn Record>) {}

    /// Classifies this value when it is the root of a sanitize call.
    fn root(&mut self) -> Root<'_> {
        Root::Ineligible
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __leaf_node {
    ($ty:ty, $leaf:expr) => {
        impl $crate::Node for $ty {
            fn layout() -> ::std::option::Option<$crate::Layout> {
                ::std::option::Option::Some($crate::Layout::leaf($leaf))
            }

            fn node_layout(&self) -> ::std::option::Option<$crate::Layout> {
                <Self as $crate::Node>::layout()
            }

            fn collect_cells<'a>(&'a mut self, out: &mut ::std::vec::Vec<$crate::CellMut<'a>>) {
                out.push($crate::CellMut::Value(self));
            }
        }
    };
}

/// Declares one or more leaf types.
///
/// ```rust,ignore
/// fieldsan_core::leaf!(Celsius, Fahrenheit);
/// // A `Text` type also gets the built-in text sanitizer when nothing more
/// // specific is registered for it.
/// fieldsan_core::leaf!(Email as text);
/// ```
#[macro_export]
macro_rules! leaf {
    ($ty:ty as text) => {
        $crate::__leaf_node!($ty, $crate::LeafType::text::<$ty>());
    };
    ($($ty:ty),+ $(,)?) => {
        $( $crate::__leaf_node!($ty, $crate::LeafType::of::<$ty>()); )+
    };
}

leaf!(String as text);
leaf!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// True when `T` is itself a leaf, i.e. `Option<T>` is an optional cell.
fn is_bare_leaf<T: Node>() -> bool {
    matches!(T::layout(), Some(layout) if layout.shape == Shape::Value)
}

impl<T: Node> Node for Option<T> {
    fn layout() -> Option<Layout> {
        let inner = T::layout()?;
        let shape = match inner.shape {
            Shape::Value => Shape::Optional,
            Shape::Sequence => Shape::OptionalSequence,
            Shape::SequenceOfOptional => Shape::OptionalSequenceOfOptional,
            Shape::Mapping => Shape::OptionalMapping,
            _ => return None,
        };
        Some(Layout { shape, ..inner })
    }

    fn node_layout(&self) -> Option<Layout> {
        Self::layout()
    }

    fn collect_cells<'a>(&'a mut self, out: &mut Vec<CellMut<'a>>) {
        if is_bare_leaf::<T>() {
            out.push(CellMut::Optional(self));
        } else if let Some(inner) = self {
            inner.collect_cells(out);
        }
    }

    fn collect_records<'a>(&'a mut self, out: &mut Vec<&'a mut dyn Record>) {
        if let Some(inner) = self {
            inner.collect_records(out);
        }
    }

    fn root(&mut self) -> Root<'_> {
        match self {
            Some(inner) => inner.root(),
            None => Root::Ineligible,
        }
    }
}

impl<T: Node> Node for Vec<T> {
    fn layout() -> Option<Layout> {
        let inner = T::layout()?;
        let shape = match inner.shape {
            Shape::Value => Shape::Sequence,
            Shape::Optional => Shape::SequenceOfOptional,
            _ => return None,
        };
        Some(Layout { shape, ..inner })
    }

    fn node_layout(&self) -> Option<Layout> {
        Self::layout()
    }

    fn collect_cells<'a>(&'a mut self, out: &mut Vec<CellMut<'a>>) {
        for item in self.iter_mut() {
            item.collect_cells(out);
        }
    }

    fn collect_records<'a>(&'a mut self, out: &mut Vec<&'a mut dyn Record>) {
        for item in self.iter_mut() {
            item.collect_records(out);
        }
    }

    fn root(&mut self) -> Root<'_> {
        Root::Each(self.iter_mut().map(|item| item as &mut dyn Node).collect())
    }
}

// Boxes only carry structure (recursive records); boxed leaves are not dispatched.
impl<T: Node> Node for Box<T> {
    fn collect_records<'a>(&'a mut self, out: &mut Vec<&'a mut dyn Record>) {
        (**self).collect_records(out);
    }

    fn root(&mut self) -> Root<'_> {
        (**self).root()
    }
}

fn mapping_layout<V: Node>() -> Option<Layout> {
    let inner = V::layout()?;
    match inner.shape {
        Shape::Value => Some(Layout {
            shape: Shape::Mapping,
            ..inner
        }),
        _ => None,
    }
}

impl<K: 'static, V: Node, S: 'static> Node for HashMap<K, V, S> {
    fn layout() -> Option<Layout> {
        mapping_layout::<V>()
    }

    fn node_layout(&self) -> Option<Layout> {
        Self::layout()
    }

    fn collect_cells<'a>(&'a mut self, out: &mut Vec<CellMut<'a>>) {
        for value in self.values_mut() {
            value.collect_cells(out);
        }
    }

    fn collect_records<'a>(&'a mut self, out: &mut Vec<&'a mut dyn Record>) {
        for value in self.values_mut() {
            value.collect_records(out);
        }
    }

    fn root(&mut self) -> Root<'_> {
        Root::Each(self.values_mut().map(|value| value as &mut dyn Node).collect())
    }
}

impl<K: 'static, V: Node> Node for BTreeMap<K, V> {
    fn layout() -> Option<Layout> {
        mapping_layout::<V>()
    }

    fn node_layout(&self) -> Option<Layout> {
        Self::layout()
    }

    fn collect_cells<'a>(&'a mut self, out: &mut Vec<CellMut<'a>>) {
        for value in self.values_mut() {
            value.collect_cells(out);
        }
    }

    fn collect_records<'a>(&'a mut self, out: &mut Vec<&'a mut dyn Record>) {
        for value in self.values_mut() {
            value.collect_records(out);
        }
    }

    fn root(&mut self) -> Root<'_> {
        Root::Each(self.values_mut().map(|value| value as &mut dyn Node).collect())
    }
}
