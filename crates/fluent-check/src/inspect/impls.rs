//! `Inspect` for standard library, chrono and rust_decimal types.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::any::Any;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::io::Cursor;
use std::rc::Rc;
use std::sync::{Arc, Barrier, Condvar, Mutex, RwLock, TryLockError};
use std::time::Duration;

use super::{Capture, Category, DateTimeValue, Inspect, Kind, NodeId, TypeInfo};
use crate::numeric::Number;

macro_rules! inspect_number {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl Inspect for $ty {
            fn category() -> Category {
                Category::Numeric
            }

            fn inspect(&self, capture: &mut Capture) -> NodeId {
                capture.leaf(
                    TypeInfo::of::<Self>(Self::category()),
                    Kind::Number(Number::$variant(*self)),
                )
            }

            fn as_any(&self) -> Option<&dyn Any> {
                Some(self)
            }
        }
    )*};
}

inspect_number! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64, i128 => I128, isize => Isize,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64, u128 => U128, usize => Usize,
    f32 => F32, f64 => F64, Decimal => Decimal,
}

macro_rules! inspect_scalar {
    ($($ty:ty => $category:ident, |$v:ident| $kind:expr;)*) => {$(
        impl Inspect for $ty {
            fn category() -> Category {
                Category::$category
            }

            fn inspect(&self, capture: &mut Capture) -> NodeId {
                let $v = self;
                capture.leaf(TypeInfo::of::<Self>(Self::category()), $kind)
            }

            fn as_any(&self) -> Option<&dyn Any> {
                Some(self)
            }
        }
    )*};
}

inspect_scalar! {
    bool => Boolean, |v| Kind::Bool(*v);
    char => Char, |v| Kind::Char(*v);
    String => String, |v| Kind::Str(v.clone());
    Duration => Duration, |v| Kind::Duration(*v);
    DateTime<Utc> => DateTime, |v| Kind::DateTime(DateTimeValue::Utc(*v));
    DateTime<Local> => DateTime, |v| Kind::DateTime(DateTimeValue::Local(*v));
    DateTime<FixedOffset> => DateTime, |v| Kind::DateTime(DateTimeValue::Fixed(*v));
    NaiveDateTime => DateTime, |v| Kind::DateTime(DateTimeValue::Naive(*v));
    NaiveDate => DateTime, |v| Kind::DateTime(DateTimeValue::Date(*v));
}

impl Inspect for str {
    fn category() -> Category {
        Category::String
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        capture.leaf(
            TypeInfo::of::<Self>(Self::category()),
            Kind::Str(self.to_string()),
        )
    }
}

impl Inspect for Cow<'_, str> {
    fn category() -> Category {
        Category::String
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        capture.leaf(
            TypeInfo::of::<Self>(Self::category()),
            Kind::Str(self.to_string()),
        )
    }
}

impl<T: Inspect + ?Sized> Inspect for &T {
    fn category() -> Category {
        T::category()
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        (**self).inspect(capture)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        (**self).as_any()
    }
}

impl<T: Inspect + ?Sized> Inspect for &mut T {
    fn category() -> Category {
        T::category()
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        (**self).inspect(capture)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        (**self).as_any()
    }
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
    fn category() -> Category {
        T::category()
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        (**self).inspect(capture)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        (**self).as_any()
    }
}

impl<T: Inspect + ?Sized> Inspect for Rc<T> {
    fn category() -> Category {
        T::category()
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        let address = Rc::as_ptr(self).cast::<()>() as usize;
        capture.shared(address, |c| (**self).inspect(c))
    }

    fn as_any(&self) -> Option<&dyn Any> {
        (**self).as_any()
    }
}

impl<T: Inspect + ?Sized> Inspect for Arc<T> {
    fn category() -> Category {
        T::category()
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        let address = Arc::as_ptr(self).cast::<()>() as usize;
        capture.shared(address, |c| (**self).inspect(c))
    }

    fn as_any(&self) -> Option<&dyn Any> {
        (**self).as_any()
    }
}

impl<T: Inspect + ?Sized> Inspect for RefCell<T> {
    fn category() -> Category {
        T::category()
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        match self.try_borrow() {
            Ok(inner) => inner.inspect(capture),
            Err(_) => capture.leaf(
                TypeInfo::of::<Self>(Category::Object),
                Kind::Opaque("<borrowed>".to_string()),
            ),
        }
    }
}

impl<T: Inspect + Copy> Inspect for Cell<T> {
    fn category() -> Category {
        T::category()
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        self.get().inspect(capture)
    }
}

impl<T: Inspect + ?Sized> Inspect for Mutex<T> {
    fn category() -> Category {
        T::category()
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        match self.try_lock() {
            Ok(inner) => inner.inspect(capture),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().inspect(capture),
            Err(TryLockError::WouldBlock) => capture.leaf(
                TypeInfo::of::<Self>(Category::Object),
                Kind::Opaque("<locked>".to_string()),
            ),
        }
    }
}

impl<T: Inspect + ?Sized> Inspect for RwLock<T> {
    fn category() -> Category {
        T::category()
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        match self.try_read() {
            Ok(inner) => inner.inspect(capture),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().inspect(capture),
            Err(TryLockError::WouldBlock) => capture.leaf(
                TypeInfo::of::<Self>(Category::Object),
                Kind::Opaque("<locked>".to_string()),
            ),
        }
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn category() -> Category {
        Category::Nullable
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        match self {
            Some(value) => value.inspect(capture),
            None => capture.null(TypeInfo::of::<Self>(Self::category())),
        }
    }

    fn as_any(&self) -> Option<&dyn Any> {
        self.as_ref().and_then(Inspect::as_any)
    }
}

fn inspect_items<'a, T, I>(capture: &mut Capture, info: TypeInfo, items: I) -> NodeId
where
    T: Inspect + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let ids = items.into_iter().map(|item| item.inspect(capture)).collect();
    capture.sequence(info, ids)
}

impl<T: Inspect> Inspect for [T] {
    fn category() -> Category {
        Category::Enumerable
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        inspect_items(capture, TypeInfo::of::<Self>(Self::category()), self)
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn category() -> Category {
        Category::Enumerable
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        inspect_items(capture, TypeInfo::of::<Self>(Self::category()), self)
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn category() -> Category {
        Category::Enumerable
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        inspect_items(capture, TypeInfo::of::<Self>(Self::category()), self)
    }
}

impl<T: Inspect> Inspect for VecDeque<T> {
    fn category() -> Category {
        Category::Enumerable
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        inspect_items(capture, TypeInfo::of::<Self>(Self::category()), self)
    }
}

impl<T: Inspect> Inspect for BTreeSet<T> {
    fn category() -> Category {
        Category::Enumerable
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        inspect_items(capture, TypeInfo::of::<Self>(Self::category()), self)
    }
}

impl<T: Inspect, S> Inspect for HashSet<T, S> {
    fn category() -> Category {
        Category::Enumerable
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        inspect_items(capture, TypeInfo::of::<Self>(Self::category()), self)
    }
}

fn inspect_entries<'a, K, V, I>(capture: &mut Capture, info: TypeInfo, entries: I) -> NodeId
where
    K: Inspect + 'a,
    V: Inspect + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    let pairs = entries
        .into_iter()
        .map(|(k, v)| (k.inspect(capture), v.inspect(capture)))
        .collect();
    capture.leaf(info, Kind::Map(pairs))
}

impl<K: Inspect, V: Inspect, S> Inspect for HashMap<K, V, S> {
    fn category() -> Category {
        Category::Dictionary
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        inspect_entries(capture, TypeInfo::of::<Self>(Self::category()), self)
    }
}

impl<K: Inspect, V: Inspect> Inspect for BTreeMap<K, V> {
    fn category() -> Category {
        Category::Dictionary
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        inspect_entries(capture, TypeInfo::of::<Self>(Self::category()), self)
    }
}

impl Inspect for () {
    fn category() -> Category {
        Category::Struct
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        capture
            .record(TypeInfo::of::<Self>(Self::category()))
            .tuple()
            .finish()
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

macro_rules! inspect_tuple {
    ($(($($name:ident $idx:tt),+))+) => {$(
        impl<$($name: Inspect),+> Inspect for ($($name,)+) {
            fn category() -> Category {
                Category::Struct
            }

            fn inspect(&self, capture: &mut Capture) -> NodeId {
                capture
                    .record(TypeInfo::of::<Self>(Self::category()))
                    $(.field(stringify!($idx), &self.$idx))+
                    .tuple()
                    .finish()
            }
        }
    )+};
}

inspect_tuple! {
    (A 0)
    (A 0, B 1)
    (A 0, B 1, C 2)
    (A 0, B 1, C 2, D 3)
    (A 0, B 1, C 2, D 3, E 4)
    (A 0, B 1, C 2, D 3, E 4, F 5)
}

macro_rules! inspect_error {
    ($($ty:ty),* $(,)?) => {$(
        impl Inspect for $ty {
            fn inspect(&self, capture: &mut Capture) -> NodeId {
                capture.leaf(
                    TypeInfo::of::<Self>(Category::Object),
                    Kind::Error { message: self.to_string() },
                )
            }
        }
    )*};
}

inspect_error! {
    std::io::Error,
    std::fmt::Error,
    std::num::ParseIntError,
    std::num::ParseFloatError,
    std::str::Utf8Error,
    dyn std::error::Error,
    dyn std::error::Error + Send + Sync,
}

impl Inspect for Cursor<Vec<u8>> {
    fn inspect(&self, capture: &mut Capture) -> NodeId {
        capture.leaf(
            TypeInfo::of::<Self>(Category::Object),
            Kind::Stream {
                length: self.get_ref().len() as u64,
            },
        )
    }
}

impl Inspect for Cursor<&[u8]> {
    fn inspect(&self, capture: &mut Capture) -> NodeId {
        capture.leaf(
            TypeInfo::of::<Self>(Category::Object),
            Kind::Stream {
                length: self.get_ref().len() as u64,
            },
        )
    }
}

impl Inspect for Condvar {
    fn category() -> Category {
        Category::Event
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        capture.leaf(
            TypeInfo::of::<Self>(Self::category()),
            Kind::Opaque("Condvar".to_string()),
        )
    }
}

impl Inspect for Barrier {
    fn category() -> Category {
        Category::Event
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        capture.leaf(
            TypeInfo::of::<Self>(Self::category()),
            Kind::Opaque("Barrier".to_string()),
        )
    }
}

/// A type used as a value, rendered by its language-level name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeOf(TypeInfo);

impl TypeOf {
    /// Name the type `T`
    #[must_use]
    pub fn of<T: Inspect + ?Sized>() -> Self {
        Self(TypeInfo::of::<T>(T::category()))
    }

    /// Described type
    #[must_use]
    pub const fn info(&self) -> &TypeInfo {
        &self.0
    }
}

impl Inspect for TypeOf {
    fn inspect(&self, capture: &mut Capture) -> NodeId {
        capture.leaf(
            TypeInfo::of::<Self>(Category::Object),
            Kind::Type(self.0.clone()),
        )
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}
