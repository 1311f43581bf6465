//! Check surface
//!
//! `Check::that(&actual)` followed by one of the checks below. A failing
//! check renders a [`FluentMessage`] and sends it to the current reporter
//! (see [`crate::report`]).

use std::cmp::Ordering;
use std::panic::Location;

use crate::diff::{registry, ComparerRegistry, Differ, Difference, EqualityMode};
use crate::format::Formatter;
use crate::inspect::{Inspect, Kind, Snapshot};
use crate::message::FluentMessage;
use crate::numeric::compare;
use crate::report::{report_failure, report_success, CheckFailure};
use crate::settings::Settings;

/// Checks on one value
#[derive(Debug)]
pub struct Check<'a, T: Inspect + ?Sized> {
    value: &'a T,
    settings: Settings,
    registry: ComparerRegistry,
}

/// Index the path starts with (`[3].name` gives 3)
fn leading_index(path: &str) -> Option<usize> {
    path.strip_prefix('[')?.split(']').next()?.parse().ok()
}

/// Position of the root item or entry a difference path runs through
fn highlight_index(value: &Snapshot, path: &str, settings: &Settings) -> Option<usize> {
    match &value.node().kind {
        Kind::Sequence(items) => leading_index(path).filter(|&i| i < items.len()),
        Kind::Map(pairs) => {
            let formatter = Formatter::new(settings);
            pairs.iter().position(|&(key, _)| {
                let prefix = format!("[{}]", formatter.format(&value.graph, key));
                path.strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '[']))
            })
        }
        _ => None,
    }
}

fn first_difference_prefix(difference: &Difference) -> Option<String> {
    (!difference.path.is_empty())
        .then(|| format!("The first difference is at '{}'.", difference.path))
}

impl<'a, T: Inspect + ?Sized> Check<'a, T> {
    /// Start checking `value` with the process-wide settings and comparers
    #[must_use]
    pub fn that(value: &'a T) -> Self {
        Self {
            value,
            settings: Settings::current(),
            registry: registry::snapshot(),
        }
    }

    /// Use explicit settings for failure messages
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Use an explicit comparer registry
    #[must_use]
    pub fn with_registry(mut self, registry: ComparerRegistry) -> Self {
        self.registry = registry;
        self
    }

    fn differ(&self) -> Differ<'_> {
        Differ::new(&self.registry).with_settings(self.settings)
    }

    fn message(&self, template: &str) -> FluentMessage {
        FluentMessage::build(template)
            .with_settings(self.settings)
            .on(self.value)
    }

    #[track_caller]
    fn conclude(&self, failure: Option<FluentMessage>) -> &Self {
        match failure {
            Some(message) => {
                let location = Location::caller();
                report_failure(
                    CheckFailure::new(message.to_string())
                        .with_location(format!("{}:{}", location.file(), location.line())),
                );
            }
            None => report_success(),
        }
        self
    }

    /// The value equals `expected` structurally
    #[track_caller]
    pub fn is_equal_to<E: Inspect + ?Sized>(&self, expected: &E) -> &Self {
        let (l, r) = (Snapshot::of(self.value), Snapshot::of(expected));
        let found = self.differ().differences(&l.graph, l.root, &r.graph, r.root);
        let failure = found.first().map(|first| {
            let mut message = self.message("The {0} is different from the {1}.");
            if let Some(index) = highlight_index(&l, &first.path, &self.settings) {
                message = message.reference_index(index);
            }
            message = message.and().expected(expected);
            if let Some(index) = highlight_index(&r, &first.path, &self.settings) {
                message = message.reference_index(index);
            }
            match first_difference_prefix(first) {
                Some(prefix) => message.with_prefix(prefix),
                None => message,
            }
        });
        self.conclude(failure)
    }

    /// The value differs from `other` structurally
    #[track_caller]
    pub fn is_not_equal_to<E: Inspect + ?Sized>(&self, other: &E) -> &Self {
        let equal = self.differ().are_equal(self.value, other, EqualityMode::Structural);
        let failure = equal.then(|| {
            self.message("The {0} is equal to the {1} whereas it must not.")
                .and()
                .expected(other)
                .comparison("different from")
        });
        self.conclude(failure)
    }

    /// The value equals `expected` according to its `==` operator
    #[track_caller]
    pub fn has_same_value_as<E: Inspect + ?Sized>(&self, expected: &E) -> &Self {
        let equal = self.differ().are_equal(self.value, expected, EqualityMode::Operator);
        let failure = (!equal).then(|| {
            self.message("The {0} does not have the same value as the {1}.")
                .and()
                .expected(expected)
        });
        self.conclude(failure)
    }

    /// The value differs from `other` according to its `!=` operator
    #[track_caller]
    pub fn has_different_value_from<E: Inspect + ?Sized>(&self, other: &E) -> &Self {
        let equal = self
            .differ()
            .are_equal(self.value, other, EqualityMode::OperatorInequality);
        let failure = equal.then(|| {
            self.message("The {0} has the same value as the {1} whereas it must not.")
                .and()
                .expected(other)
                .comparison("different from")
        });
        self.conclude(failure)
    }

    fn ordering_check<E: Inspect + ?Sized>(
        &self,
        other: &E,
        wanted: Ordering,
        verb: &str,
    ) -> Option<FluentMessage> {
        let (l, r) = (Snapshot::of(self.value), Snapshot::of(other));
        let template = format!("The {{0}} is not {verb} the {{1}}.");
        match compare(&l.graph, l.root, &r.graph, r.root) {
            Ok(ordering) if ordering == wanted => None,
            Ok(_) => Some(self.message(&template).and().expected(other).comparison(verb)),
            Err(err) => Some(
                self.message(&template)
                    .and()
                    .expected(other)
                    .with_prefix(err.to_string()),
            ),
        }
    }

    /// The value orders strictly before `other`
    #[track_caller]
    pub fn is_before<E: Inspect + ?Sized>(&self, other: &E) -> &Self {
        let failure = self.ordering_check(other, Ordering::Less, "before");
        self.conclude(failure)
    }

    /// The value orders strictly after `other`
    #[track_caller]
    pub fn is_after<E: Inspect + ?Sized>(&self, other: &E) -> &Self {
        let failure = self.ordering_check(other, Ordering::Greater, "after");
        self.conclude(failure)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::report::ReporterScope;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn failures_of(run: impl FnOnce()) -> Vec<String> {
        let scope = ReporterScope::collect();
        run();
        scope.verify().err().map(|e| e.failures).unwrap_or_default()
    }

    mod equality {
        use super::*;

        #[test]
        fn test_passing_checks_report_nothing() {
            let failures = failures_of(|| {
                Check::that(&20).is_equal_to(&Decimal::new(20, 0));
                Check::that("a").is_not_equal_to("b");
                Check::that(&vec![1, 2]).is_equal_to(&[1, 2]);
            });
            assert!(failures.is_empty());
        }

        #[test]
        fn test_failure_message() {
            let failures = failures_of(|| {
                Check::that("a").is_equal_to("b");
            });
            assert_eq!(
                failures,
                ["The checked string is different from the expected one.\n\
                  The checked string:\n\t[\"a\"]\n\
                  The expected string:\n\t[\"b\"]"]
            );
        }

        #[test]
        fn test_first_difference_prefix_and_highlight() {
            let failures = failures_of(|| {
                Check::that(&vec![1, 2, 3]).is_equal_to(&vec![1, 5, 3]);
            });
            let lines: Vec<_> = failures[0].lines().collect();
            assert_eq!(lines[0], "The first difference is at '[1]'.");
            assert_eq!(lines[3], "\t[{1,*2*,3}]");
            assert_eq!(lines[5], "\t[{1,*5*,3}]");
        }

        #[test]
        fn test_map_highlights_entry_by_key() {
            let checked: BTreeMap<i32, &str> = [(10, "a"), (20, "b"), (30, "c")].into();
            let expected: BTreeMap<i32, &str> = [(10, "z"), (20, "b"), (30, "c")].into();
            let failures = failures_of(|| {
                Check::that(&checked).is_equal_to(&expected);
            });
            let lines: Vec<_> = failures[0].lines().collect();
            assert_eq!(lines[0], "The first difference is at '[10]'.");
            assert_eq!(lines[3], "\t[{*[10, \"a\"]*,[20, \"b\"],[30, \"c\"]}]");
            assert_eq!(lines[5], "\t[{*[10, \"z\"]*,[20, \"b\"],[30, \"c\"]}]");
        }

        #[test]
        fn test_extra_item_only_highlighted_where_present() {
            let failures = failures_of(|| {
                Check::that(&vec![1, 2]).is_equal_to(&vec![1, 2, 3]);
            });
            let lines: Vec<_> = failures[0].lines().collect();
            assert_eq!(lines[0], "The first difference is at '[2]'.");
            assert_eq!(lines[3], "\t[{1,2}]");
            assert_eq!(lines[5], "\t[{1,2,*3*}]");
        }

        #[test]
        fn test_not_equal_failure() {
            let failures = failures_of(|| {
                Check::that(&3).is_not_equal_to(&3.0);
            });
            assert!(failures[0].contains("The expected value: different from"));
        }

        #[test]
        fn test_chaining() {
            let failures = failures_of(|| {
                Check::that(&5).is_equal_to(&5).is_not_equal_to(&6).is_after(&4).is_before(&9);
            });
            assert!(failures.is_empty());
        }

        #[test]
        #[should_panic(expected = "The checked value is different from the expected one.")]
        fn test_panics_without_scope() {
            Check::that(&1).is_equal_to(&2);
        }
    }

    mod operators {
        use super::*;
        use crate::inspect::{Capture, Category, NodeId, TypeInfo};

        #[derive(Debug, PartialEq)]
        struct Money(i64);

        impl Inspect for Money {
            fn inspect(&self, capture: &mut Capture) -> NodeId {
                capture
                    .record(TypeInfo::of::<Self>(Category::Struct))
                    .field("0", &self.0)
                    .positional()
                    .finish()
            }

            fn as_any(&self) -> Option<&dyn std::any::Any> {
                Some(self)
            }
        }

        impl PartialEq<i64> for Money {
            fn eq(&self, other: &i64) -> bool {
                self.0 == *other
            }
        }

        fn registry() -> ComparerRegistry {
            let mut registry = ComparerRegistry::new();
            registry.register_operator::<Money, i64>();
            registry
        }

        #[test]
        fn test_same_value_through_operator() {
            let failures = failures_of(|| {
                Check::that(&Money(4)).with_registry(registry()).has_same_value_as(&4_i64);
                Check::that(&Money(4)).with_registry(registry()).has_different_value_from(&5_i64);
            });
            assert!(failures.is_empty());
        }

        #[test]
        fn test_operator_failure() {
            let failures = failures_of(|| {
                Check::that(&Money(4)).with_registry(registry()).has_same_value_as(&5_i64);
            });
            let header = "The checked struct does not have the same value as the expected value.";
            assert!(failures[0].starts_with(header));
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn test_dates() {
            let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
            let late = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
            let failures = failures_of(|| {
                Check::that(&early).is_before(&late);
                Check::that(&early).is_after(&late);
            });
            assert_eq!(failures.len(), 1);
            assert!(failures[0].contains("The expected date time: after"));
        }

        #[test]
        fn test_not_comparable_is_reported() {
            let failures = failures_of(|| {
                Check::that(&vec![1]).is_before(&2);
            });
            assert!(failures[0].starts_with("Values of type Vec<i32> and i32 cannot be ordered"));
        }
    }
}
