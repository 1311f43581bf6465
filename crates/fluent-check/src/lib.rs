//! fluent-check: fluent checks with rich failure messages
//!
//! A test writes `Check::that(&actual).is_equal_to(&expected)`. When the
//! values disagree the failure names the first difference and shows both
//! values in a deterministic layout:
//!
//! ```text
//! The first difference is at 'x'.
//! The checked value is different from the expected one.
//! The checked value:
//!     [Point { x: 1, y: 2 }]
//! The expected value:
//!     [Point { x: 3, y: 2 }]
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────────┐
//! │ Inspect  │──►│ Capture      │──►│ Differ     │──►│ FluentMessage│
//! │ (derive) │   │ Graph        │   │ Formatter  │   │ Reporter     │
//! └──────────┘   └──────────────┘   └────────────┘   └──────────────┘
//! ```
//!
//! Values are recorded into a capture graph through the [`Inspect`] trait.
//! Formatting, rendering, naming, comparison and message assembly all work
//! on that graph, so none of them needs to know the concrete Rust type.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

extern crate self as fluent_check;

mod check;
pub mod diff;
pub mod format;
pub mod inspect;
pub mod message;
pub mod naming;
pub mod numeric;
pub mod render;
pub mod report;
mod result;
pub mod settings;

pub use check::Check;
pub use diff::{
    are_equal, differences, register_comparer, register_operator, Comparer,
    ComparerRegistration, ComparerRegistry, Differ, Difference, DifferenceKind, EqualityMode,
};
pub use format::{format_value, Formatter};
pub use inspect::{Capture, Category, Grid, Inspect, NodeId, NodeRef, Snapshot, TypeInfo, TypeOf};
pub use message::FluentMessage;
pub use naming::{name_for, name_for_type, EntityNaming};
pub use numeric::{compare, compare_numbers, numbers_equal, Number};
pub use render::EnumerableRenderer;
pub use report::{CollectingReporter, PanicReporter, Reporter, ReporterScope, SoftCheckError};
pub use result::{CheckError, CheckResult};
pub use settings::{set_string_truncation_length, string_truncation_length, Settings};

/// Common imports for writing checks
pub mod prelude {
    pub use super::check::Check;
    pub use super::diff::{register_comparer, register_operator, EqualityMode};
    pub use super::inspect::{Grid, Inspect, TypeOf};
    pub use super::report::ReporterScope;
    pub use super::result::{CheckError, CheckResult};
    #[cfg(feature = "derive")]
    pub use fluent_check_derive::Inspect;
}

#[cfg(feature = "derive")]
pub use fluent_check_derive::Inspect;

#[cfg(all(test, feature = "derive"))]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[derive(Inspect)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Inspect)]
    enum Shape {
        Circle { radius: u32 },
        Square(u32),
        Empty,
    }

    #[derive(Inspect)]
    #[inspect(by_value)]
    struct Pair(u8, u8);

    #[derive(Inspect)]
    struct Account {
        #[inspect(rename = "owner")]
        name: String,
        #[inspect(skip)]
        #[allow(dead_code)]
        cache: Vec<u8>,
    }

    #[derive(Inspect)]
    struct Wrapper<T> {
        inner: T,
    }

    mod derive {
        use super::*;

        #[test]
        fn test_struct_layout() {
            assert_eq!(format_value(&Point { x: 1, y: 2 }), "Point { x: 1, y: 2 }");
        }

        #[test]
        fn test_enum_variants() {
            assert_eq!(format_value(&Shape::Circle { radius: 3 }), "Circle { radius: 3 }");
            assert_eq!(format_value(&Shape::Square(2)), "Square(2)");
            assert_eq!(format_value(&Shape::Empty), "Empty");
            assert_eq!(name_for(&Snapshot::of(&Shape::Empty).node().info), "enum");
            assert_eq!(name_for_type::<Shape>(), "enum");
            assert_eq!(name_for_type::<Pair>(), "struct");
        }

        #[test]
        fn test_by_value_is_struct() {
            assert_eq!(name_for(&Snapshot::of(&Pair(1, 2)).node().info), "struct");
            assert_eq!(format_value(&Pair(1, 2)), "Pair(1, 2)");
        }

        #[test]
        fn test_rename_and_skip() {
            let account = Account {
                name: "ann".to_string(),
                cache: vec![1],
            };
            assert_eq!(format_value(&account), "Account { owner: \"ann\" }");
        }

        #[test]
        fn test_generic_struct() {
            let snap = Snapshot::of(&Wrapper { inner: vec![1] });
            assert_eq!(snap.node().info.name(), "Wrapper<Vec<i32>>");
            assert!(snap.node_ref().member("inner").is_some());
        }

        #[test]
        fn test_non_generic_exposes_any() {
            assert!(Point { x: 0, y: 0 }.as_any().is_some());
            assert!(Wrapper { inner: 1 }.as_any().is_none());
        }
    }

    mod end_to_end {
        use super::*;

        #[test]
        fn test_first_difference_at_member() {
            let scope = ReporterScope::collect();
            Check::that(&Point { x: 1, y: 2 }).is_equal_to(&Point { x: 3, y: 2 });
            let err = scope.verify().unwrap_err();
            assert_eq!(
                err.failures[0],
                "The first difference is at 'x'.\n\
                 The checked value is different from the expected one.\n\
                 The checked value:\n\t[Point { x: 1, y: 2 }]\n\
                 The expected value:\n\t[Point { x: 3, y: 2 }]"
            );
        }

        #[test]
        fn test_variant_difference() {
            let found = differences(&Shape::Square(1), &Shape::Empty);
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].kind, DifferenceKind::Value);
        }
    }
}
