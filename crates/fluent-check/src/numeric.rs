//! Numeric Comparison
//!
//! Cross-type numeric equality and ordering. Two numbers of different
//! built-in types are widened to a common representation before they are
//! compared, so `20_i32` and `Decimal::from(20)` are equal even though a
//! strict `PartialEq` would never be asked the question.
//!
//! Promotion rules:
//! - any `Decimal` operand promotes both sides to `Decimal`
//!   (non-finite or out-of-range floats fall back to `f64`)
//! - otherwise any floating operand promotes both sides to `f64`
//! - otherwise both sides are integers and compare as 128-bit values
//!   with sign handling, so `u128::MAX` and `-1_i8` never alias

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::inspect::{DateTimeValue, Graph, Kind, NodeId};
use crate::result::{CheckError, CheckResult};

/// A number captured from one of the built-in numeric types
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `i128`
    I128(i128),
    /// `isize`
    Isize(isize),
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `u128`
    U128(u128),
    /// `usize`
    Usize(usize),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// `rust_decimal::Decimal`
    Decimal(Decimal),
}

/// Common representation both operands are widened to
#[derive(Debug, Clone, Copy)]
enum Wide {
    Signed(i128),
    Unsigned(u128),
    Float(f64),
    Decimal(Decimal),
}

impl Number {
    /// Whether this is one of the floating types
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F32(_) | Self::F64(_))
    }

    /// Whether this is a `Decimal`
    #[must_use]
    pub const fn is_decimal(&self) -> bool {
        matches!(self, Self::Decimal(_))
    }

    fn widen(self) -> Wide {
        match self {
            Self::I8(v) => Wide::Signed(v.into()),
            Self::I16(v) => Wide::Signed(v.into()),
            Self::I32(v) => Wide::Signed(v.into()),
            Self::I64(v) => Wide::Signed(v.into()),
            Self::I128(v) => Wide::Signed(v),
            Self::Isize(v) => Wide::Signed(v as i128),
            Self::U8(v) => Wide::Unsigned(v.into()),
            Self::U16(v) => Wide::Unsigned(v.into()),
            Self::U32(v) => Wide::Unsigned(v.into()),
            Self::U64(v) => Wide::Unsigned(v.into()),
            Self::U128(v) => Wide::Unsigned(v),
            Self::Usize(v) => Wide::Unsigned(v as u128),
            Self::F32(v) => Wide::Float(v.into()),
            Self::F64(v) => Wide::Float(v),
            Self::Decimal(v) => Wide::Decimal(v),
        }
    }

    /// Value as `f64`, possibly losing precision
    #[must_use]
    pub fn to_f64(self) -> f64 {
        match self.widen() {
            Wide::Signed(v) => v as f64,
            Wide::Unsigned(v) => v as f64,
            Wide::Float(v) => v,
            Wide::Decimal(v) => v.to_f64().unwrap_or(f64::NAN),
        }
    }

    fn to_decimal(self) -> Option<Decimal> {
        match self.widen() {
            Wide::Signed(v) => Decimal::try_from_i128_with_scale(v, 0).ok(),
            Wide::Unsigned(v) => i128::try_from(v)
                .ok()
                .and_then(|v| Decimal::try_from_i128_with_scale(v, 0).ok()),
            // Shortest round-trip text keeps 0.1_f64 equal to Decimal 0.1
            Wide::Float(v) if v.is_finite() => Decimal::from_str(&format!("{v}")).ok(),
            Wide::Float(_) => None,
            Wide::Decimal(v) => Some(v),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::I128(v) => write!(f, "{v}"),
            Self::Isize(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::U128(v) => write!(f, "{v}"),
            Self::Usize(v) => write!(f, "{v}"),
            Self::F32(v) => write_float(f, f64::from(*v)),
            Self::F64(v) => write_float(f, *v),
            Self::Decimal(v) => write!(f, "{v}"),
        }
    }
}

/// Locale-independent float text with spelled-out infinities
fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        f.write_str("NaN")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{value}")
    }
}

fn compare_integers(a: Wide, b: Wide) -> Ordering {
    match (a, b) {
        (Wide::Signed(x), Wide::Signed(y)) => x.cmp(&y),
        (Wide::Unsigned(x), Wide::Unsigned(y)) => x.cmp(&y),
        (Wide::Signed(x), Wide::Unsigned(y)) => {
            u128::try_from(x).map_or(Ordering::Less, |x| x.cmp(&y))
        }
        (Wide::Unsigned(x), Wide::Signed(y)) => {
            u128::try_from(y).map_or(Ordering::Greater, |y| x.cmp(&y))
        }
        _ => Ordering::Equal,
    }
}

/// Order two numbers after widening; `None` when a NaN is involved
#[must_use]
pub fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    if a.is_decimal() || b.is_decimal() {
        if let (Some(x), Some(y)) = (a.to_decimal(), b.to_decimal()) {
            return Some(x.cmp(&y));
        }
        return a.to_f64().partial_cmp(&b.to_f64());
    }
    if a.is_float() || b.is_float() {
        return a.to_f64().partial_cmp(&b.to_f64());
    }
    Some(compare_integers(a.widen(), b.widen()))
}

/// Equality after widening both numbers to a common type
#[must_use]
pub fn numbers_equal(a: Number, b: Number) -> bool {
    compare_numbers(a, b) == Some(Ordering::Equal)
}

/// Order two captured values.
///
/// Numbers, strings, chars, booleans, date times and durations carry a total
/// order. Anything else is a caller contract violation reported as
/// [`CheckError::NotComparable`].
pub fn compare(left: &Graph, l: NodeId, right: &Graph, r: NodeId) -> CheckResult<Ordering> {
    let (ln, rn) = (left.node(l), right.node(r));
    let ordering = match (&ln.kind, &rn.kind) {
        (Kind::Number(a), Kind::Number(b)) => compare_numbers(*a, *b),
        (Kind::Str(a), Kind::Str(b)) => Some(a.cmp(b)),
        (Kind::Char(a), Kind::Char(b)) => Some(a.cmp(b)),
        (Kind::Bool(a), Kind::Bool(b)) => Some(a.cmp(b)),
        (Kind::Duration(a), Kind::Duration(b)) => Some(a.cmp(b)),
        (Kind::DateTime(a), Kind::DateTime(b)) => compare_date_times(a, b),
        _ => None,
    };
    ordering.ok_or_else(|| CheckError::NotComparable {
        left: ln.info.name().to_string(),
        right: rn.info.name().to_string(),
    })
}

fn compare_date_times(a: &DateTimeValue, b: &DateTimeValue) -> Option<Ordering> {
    match (a.instant(), b.instant()) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        (None, None) => Some(a.naive().cmp(&b.naive())),
        _ => None,
    }
}
