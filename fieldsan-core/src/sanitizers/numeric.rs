//! Bounds and defaults for integer and float fields.
//!
//! Directives: `min=<n>`, `max=<n>`, `def=<n>`, each parsed in the field's own
//! type. Bounds must be non-negative and ordered, and a default must lie
//! within them. Optional cells that are `None` take the default (without
//! clamping) or stay `None`; every other value is clamped into `[min, max]`.
//!
//! License: MIT OR APACHE 2.0

use std::any::Any;
use std::fmt::Display;
use std::str::FromStr;

use log::trace;

use crate::errors::{Result, SanitizeError};
use crate::registry::{Cell, FieldContext, Registry};
use crate::sanitizer::Sanitizer;

/// A numeric leaf type the bounds policy applies to.
pub trait Bounded: Copy + PartialOrd + Display + FromStr + Any + Send + Sync {
    fn is_negative(self) -> bool;

    fn is_finite(self) -> bool {
        true
    }
}

macro_rules! bounded_signed {
    ($($ty:ty),+) => {
        $( impl Bounded for $ty {
            fn is_negative(self) -> bool {
                self < 0
            }
        } )+
    };
}

macro_rules! bounded_unsigned {
    ($($ty:ty),+) => {
        $( impl Bounded for $ty {
            fn is_negative(self) -> bool {
                false
            }
        } )+
    };
}

bounded_signed!(i8, i16, i32, i64, i128, isize);
bounded_unsigned!(u8, u16, u32, u64, u128, usize);

impl Bounded for f32 {
    fn is_negative(self) -> bool {
        self < 0.0
    }

    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }
}

impl Bounded for f64 {
    fn is_negative(self) -> bool {
        self < 0.0
    }

    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

/// Parses directive `key` in the field's type, rejecting NaN and infinities.
fn parse_bound<T>(ctx: &FieldContext<'_>, key: &str) -> Result<Option<T>>
where
    T: Bounded,
    <T as FromStr>::Err: Display,
{
    match ctx.parse::<T>(key)? {
        Some(value) if !value.is_finite() => Err(SanitizeError::InvalidDirective {
            record: ctx.record,
            field: ctx.field,
            key: key.to_string(),
            value: value.to_string(),
            reason: "value must be a finite number".to_string(),
        }),
        parsed => Ok(parsed),
    }
}

/// Validated `min`/`max`/`def` directives for one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericBounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub def: Option<T>,
}

impl<T> NumericBounds<T>
where
    T: Bounded,
    <T as FromStr>::Err: Display,
{
    /// Parses and cross-checks the directives. Nothing is mutated here, so a
    /// failing field is left exactly as it was.
    pub fn from_context(ctx: &FieldContext<'_>) -> Result<Self> {
        let min = parse_bound::<T>(ctx, "min")?;
        let max = parse_bound::<T>(ctx, "max")?;

        if let (Some(min), Some(max)) = (min, max) {
            if max < min {
                return Err(SanitizeError::MaxBelowMin {
                    record: ctx.record,
                    field: ctx.field,
                    min: min.to_string(),
                    max: max.to_string(),
                });
            }
        }
        if min.is_some_and(T::is_negative) || max.is_some_and(T::is_negative) {
            return Err(SanitizeError::NegativeBound {
                record: ctx.record,
                field: ctx.field,
            });
        }

        let def = parse_bound::<T>(ctx, "def")?;
        if let Some(def) = def {
            if let Some(max) = max.filter(|max| def > *max) {
                return Err(SanitizeError::DefaultAboveMax {
                    record: ctx.record,
                    field: ctx.field,
                    def: def.to_string(),
                    max: max.to_string(),
                });
            }
            if let Some(min) = min.filter(|min| def < *min) {
                return Err(SanitizeError::DefaultBelowMin {
                    record: ctx.record,
                    field: ctx.field,
                    def: def.to_string(),
                    min: min.to_string(),
                });
            }
        }

        Ok(Self { min, max, def })
    }

    pub fn clamp(&self, value: &mut T) {
        if let Some(min) = self.min {
            if *value < min {
                *value = min;
            }
        }
        if let Some(max) = self.max {
            if *value > max {
                *value = max;
            }
        }
    }
}

/// Sanitizer shared by every [`Bounded`] type.
pub fn sanitize_numeric<T>(_sanitizer: &Sanitizer, ctx: &FieldContext<'_>, cells: Vec<Cell<'_, T>>) -> Result<()>
where
    T: Bounded,
    <T as FromStr>::Err: Display,
{
    let bounds = NumericBounds::<T>::from_context(ctx)?;
    trace!(
        "{}.{}: {} cell(s), min={:?} max={:?} def={}",
        ctx.record,
        ctx.field,
        cells.len(),
        bounds.min.map(|v| v.to_string()),
        bounds.max.map(|v| v.to_string()),
        bounds.def.is_some()
    );

    for cell in cells {
        match cell {
            Cell::Value(value) => bounds.clamp(value),
            Cell::Optional(slot) => {
                if slot.is_none() {
                    // A freshly defaulted value is not clamped.
                    if let Some(def) = bounds.def {
                        *slot = Some(def);
                    }
                    continue;
                }
                if let Some(value) = slot.as_mut() {
                    bounds.clamp(value);
                }
            }
        }
    }
    Ok(())
}

macro_rules! register_numeric {
    ($registry:expr, $($ty:ty),+) => {
        $( $registry.register::<$ty, _>(sanitize_numeric::<$ty>); )+
    };
}

pub(crate) fn register(registry: &mut Registry) {
    register_numeric!(registry, i8, i16, i32, i64, i128, isize);
    register_numeric!(registry, u8, u16, u32, u64, u128, usize);
    register_numeric!(registry, f32, f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::DirectiveSet;
    use crate::node::Node;

    fn bounds<T>(raw: &str) -> Result<NumericBounds<T>>
    where
        T: Bounded + Node,
        <T as FromStr>::Err: Display,
    {
        let directives = DirectiveSet::parse(raw);
        let ctx = FieldContext {
            record: "Test",
            field: "n",
            layout: T::layout().unwrap(),
            directives: &directives,
        };
        NumericBounds::<T>::from_context(&ctx)
    }

    #[test]
    fn test_clamp_into_range() {
        let b = bounds::<i32>("min=1,max=10").unwrap();
        for (input, expected) in [(0, 1), (15, 10), (5, 5), (1, 1), (10, 10)] {
            let mut v = input;
            b.clamp(&mut v);
            assert_eq!(v, expected, "clamp({})", input);
        }
    }

    #[test]
    fn test_one_sided_bounds() {
        let mut v = 100u8;
        bounds::<u8>("max=50").unwrap().clamp(&mut v);
        assert_eq!(v, 50);
        let mut f = 0.25f64;
        bounds::<f64>("min=0.5").unwrap().clamp(&mut f);
        assert_eq!(f, 0.5);
    }

    #[test]
    fn test_directive_validation() {
        assert!(matches!(bounds::<i64>("min=5,max=2"), Err(SanitizeError::MaxBelowMin { .. })));
        assert!(matches!(bounds::<i16>("min=-1"), Err(SanitizeError::NegativeBound { .. })));
        assert!(matches!(bounds::<f32>("max=-0.5"), Err(SanitizeError::NegativeBound { .. })));
        assert!(matches!(bounds::<u32>("max=5,def=6"), Err(SanitizeError::DefaultAboveMax { .. })));
        assert!(matches!(bounds::<u32>("min=5,def=4"), Err(SanitizeError::DefaultBelowMin { .. })));
        assert!(matches!(bounds::<u8>("max=300"), Err(SanitizeError::InvalidDirective { .. })));
        assert!(matches!(bounds::<u8>("min=-3"), Err(SanitizeError::InvalidDirective { .. })));
        assert!(matches!(bounds::<i8>("def=x"), Err(SanitizeError::InvalidDirective { .. })));
    }

    #[test]
    fn test_non_finite_float_bounds_rejected() {
        for raw in ["min=1,max=NaN", "max=inf", "min=-inf", "max=10,def=NaN"] {
            let err = bounds::<f64>(raw).unwrap_err();
            assert!(
                matches!(err, SanitizeError::InvalidDirective { .. }),
                "{} should be rejected, got {:?}",
                raw,
                err
            );
        }
        assert!(matches!(bounds::<f32>("max=infinity"), Err(SanitizeError::InvalidDirective { .. })));
        assert!(bounds::<f64>("min=0,max=1e300").is_ok());
    }

    #[test]
    fn test_max_below_min_reported_before_negative() {
        let err = bounds::<i32>("min=-1,max=-5").unwrap_err();
        assert!(matches!(err, SanitizeError::MaxBelowMin { .. }));
    }

    #[test]
    fn test_unknown_directives_are_ignored() {
        let b = bounds::<i32>("trim,foo=bar").unwrap();
        assert_eq!(b, NumericBounds { min: None, max: None, def: None });
    }
}
