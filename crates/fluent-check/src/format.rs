//! Value Formatter
//!
//! Turns any captured value into its canonical display text. The function is
//! total: unknown shapes fall back to their display string, cycles render as
//! `{...}`, and nothing here depends on the machine locale.

use chrono::{NaiveDateTime, Timelike};

use crate::inspect::{DateTimeValue, Graph, Inspect, Kind, Member, MemberStyle, NodeId, Snapshot};
use crate::render::EnumerableRenderer;
use crate::settings::Settings;

/// Marker inserted where a long string was cut
pub const TRUNCATION_MARKER: &str = "...<<truncated>>...";

/// Placeholder for a value already being rendered higher up
pub const CYCLE_PLACEHOLDER: &str = "{...}";

/// Formats captured values
#[derive(Debug, Clone, Copy)]
pub struct Formatter<'s> {
    settings: &'s Settings,
}

impl<'s> Formatter<'s> {
    /// Create a formatter for the given settings
    #[must_use]
    pub const fn new(settings: &'s Settings) -> Self {
        Self { settings }
    }

    /// Settings in use
    #[must_use]
    pub const fn settings(&self) -> &'s Settings {
        self.settings
    }

    /// Display text of a node
    #[must_use]
    pub fn format(&self, graph: &Graph, id: NodeId) -> String {
        self.format_at(graph, id, &mut Vec::new())
    }

    pub(crate) fn format_at(
        &self,
        graph: &Graph,
        id: NodeId,
        ancestors: &mut Vec<NodeId>,
    ) -> String {
        let node = graph.node(id);
        match &node.kind {
            Kind::Null => "null".to_string(),
            Kind::Bool(b) => b.to_string(),
            Kind::Char(c) => format!("'{c}'"),
            Kind::Str(s) => format!("\"{}\"", self.truncate(s)),
            Kind::Number(n) => n.to_string(),
            Kind::DateTime(dt) => format_date_time(dt),
            Kind::Duration(d) => format!("{d:?}"),
            Kind::Sequence(_) | Kind::Grid { .. } | Kind::Map(_) => {
                EnumerableRenderer::new(self.settings).render_at(graph, id, None, None, ancestors)
            }
            Kind::Record {
                display: Some(text),
                ..
            }
            | Kind::Variant {
                display: Some(text),
                ..
            } => self.truncate(text),
            Kind::Record { members, style, .. } => {
                let text =
                    self.format_members(graph, id, node.info.name(), members, *style, ancestors);
                self.truncate(&text)
            }
            Kind::Variant {
                name,
                members,
                style,
                ..
            } => {
                let text = self.format_members(graph, id, name, members, *style, ancestors);
                self.truncate(&text)
            }
            Kind::Error { message } => format!("{}: '{}'", node.info.token(), message),
            Kind::Stream { length } => format!("{} (Length: {length})", node.info.name()),
            Kind::Type(info) => info.name().to_string(),
            Kind::Opaque(text) => self.truncate(text),
            Kind::Pending => CYCLE_PLACEHOLDER.to_string(),
        }
    }

    fn format_members(
        &self,
        graph: &Graph,
        id: NodeId,
        name: &str,
        members: &[Member],
        style: MemberStyle,
        ancestors: &mut Vec<NodeId>,
    ) -> String {
        if ancestors.contains(&id) {
            tracing::trace!(node = id.index(), "cycle while formatting record");
            return CYCLE_PLACEHOLDER.to_string();
        }
        ancestors.push(id);
        let text = match style {
            MemberStyle::Named if members.is_empty() => name.to_string(),
            MemberStyle::Named => {
                let fields: Vec<String> = members
                    .iter()
                    .map(|m| format!("{}: {}", m.name, self.format_at(graph, m.value, ancestors)))
                    .collect();
                format!("{name} {{ {} }}", fields.join(", "))
            }
            MemberStyle::Positional | MemberStyle::Tuple => {
                let fields: Vec<String> = members
                    .iter()
                    .map(|m| self.format_at(graph, m.value, ancestors))
                    .collect();
                match style {
                    MemberStyle::Tuple if fields.len() == 1 => format!("({},)", fields[0]),
                    MemberStyle::Tuple => format!("({})", fields.join(", ")),
                    _ if fields.is_empty() => name.to_string(),
                    _ => format!("{name}({})", fields.join(", ")),
                }
            }
        };
        ancestors.pop();
        text
    }

    /// Cut `text` when it is longer than the truncation length.
    ///
    /// The kept text is the first 15/19 and the last 4/19 of the budget,
    /// joined by [`TRUNCATION_MARKER`].
    #[must_use]
    pub fn truncate(&self, text: &str) -> String {
        let limit = self.settings.truncation_length;
        let count = text.chars().count();
        if count <= limit {
            return text.to_string();
        }
        let head = limit * 15 / 19;
        let tail = limit * 4 / 19;
        let mut out: String = text.chars().take(head).collect();
        out.push_str(TRUNCATION_MARKER);
        out.extend(text.chars().skip(count - tail));
        out
    }
}

fn round_trip(naive: &NaiveDateTime, suffix: &str) -> String {
    let ticks = (naive.nanosecond() % 1_000_000_000) / 100;
    format!("{}.{ticks:07}{suffix}", naive.format("%Y-%m-%dT%H:%M:%S"))
}

fn format_date_time(value: &DateTimeValue) -> String {
    match value {
        DateTimeValue::Utc(v) => format!("{}, Kind = Utc", round_trip(&v.naive_utc(), "Z")),
        DateTimeValue::Local(v) => format!(
            "{}, Kind = Local",
            round_trip(&v.naive_local(), &v.offset().to_string())
        ),
        DateTimeValue::Fixed(v) => round_trip(&v.naive_local(), &v.offset().to_string()),
        DateTimeValue::Naive(v) => format!("{}, Kind = Unspecified", round_trip(v, "")),
        DateTimeValue::Date(v) => v.format("%Y-%m-%d").to_string(),
    }
}

/// Display text of any inspectable value, using the process-wide settings
#[must_use]
pub fn format_value<V: Inspect + ?Sized>(value: &V) -> String {
    let settings = Settings::current();
    let snap = Snapshot::of(value);
    Formatter::new(&settings).format(&snap.graph, snap.root)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::inspect::{Capture, Category, Grid, TypeInfo, TypeOf};
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::rc::Rc;
    use std::time::Duration;

    fn fmt<V: Inspect + ?Sized>(value: &V) -> String {
        let settings = Settings::default();
        let snap = Snapshot::of(value);
        Formatter::new(&settings).format(&snap.graph, snap.root)
    }

    fn fmt_with<V: Inspect + ?Sized>(settings: &Settings, value: &V) -> String {
        let snap = Snapshot::of(value);
        Formatter::new(settings).format(&snap.graph, snap.root)
    }

    mod scalars {
        use super::*;

        #[test]
        fn test_null() {
            assert_eq!(fmt(&None::<String>), "null");
        }

        #[test]
        fn test_string_is_quoted() {
            assert_eq!(fmt("hello"), "\"hello\"");
        }

        #[test]
        fn test_char_is_single_quoted() {
            assert_eq!(fmt(&'x'), "'x'");
        }

        #[test]
        fn test_bool_and_numbers() {
            assert_eq!(fmt(&true), "true");
            assert_eq!(fmt(&20.0_f64), "20");
            assert_eq!(fmt(&-3_i64), "-3");
            assert_eq!(fmt(&Decimal::new(205, 1)), "20.5");
        }

        #[test]
        fn test_duration() {
            assert_eq!(fmt(&Duration::from_millis(1500)), "1.5s");
        }
    }

    mod date_times {
        use super::*;

        #[test]
        fn test_utc_round_trip() {
            let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
            assert_eq!(fmt(&dt), "2024-03-01T12:30:05.0000000Z, Kind = Utc");
        }

        #[test]
        fn test_fixed_offset_carries_offset() {
            let offset = FixedOffset::east_opt(2 * 3600).unwrap();
            let dt = offset.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
            assert_eq!(fmt(&dt), "2024-03-01T12:00:00.0000000+02:00");
        }

        #[test]
        fn test_naive_is_unspecified() {
            let dt = NaiveDate::from_ymd_opt(2020, 1, 2)
                .unwrap()
                .and_hms_nano_opt(3, 4, 5, 123_456_700)
                .unwrap();
            assert_eq!(fmt(&dt), "2020-01-02T03:04:05.1234567, Kind = Unspecified");
        }
    }

    mod truncation {
        use super::*;

        #[test]
        fn test_exact_threshold_unmodified() {
            let settings = Settings::builder().truncation_length(40).build().unwrap();
            let text = "a".repeat(40);
            assert_eq!(fmt_with(&settings, text.as_str()), format!("\"{text}\""));
        }

        #[test]
        fn test_threshold_plus_one_has_single_marker() {
            let settings = Settings::builder().truncation_length(40).build().unwrap();
            let text = "b".repeat(41);
            let out = fmt_with(&settings, text.as_str());
            assert_eq!(out.matches(TRUNCATION_MARKER).count(), 1);
        }

        #[test]
        fn test_head_and_tail_split() {
            let settings = Settings::builder().truncation_length(38).build().unwrap();
            let text: String = "h".repeat(100) + &"t".repeat(100);
            let out = Formatter::new(&settings).truncate(&text);
            // 38 * 15 / 19 = 30 head chars, 38 * 4 / 19 = 8 tail chars
            assert_eq!(out, format!("{}{TRUNCATION_MARKER}{}", "h".repeat(30), "t".repeat(8)));
        }

        #[test]
        fn test_counts_chars_not_bytes() {
            let settings = Settings::builder().truncation_length(20).build().unwrap();
            let text = "é".repeat(20);
            assert_eq!(Formatter::new(&settings).truncate(&text), text);
        }
    }

    mod composite {
        use super::*;

        #[test]
        fn test_sequence_delegates_to_renderer() {
            assert_eq!(fmt(&vec![1, 2, 3]), "{1,2,3}");
            assert_eq!(fmt(&Vec::<u8>::new()), "{}");
        }

        #[test]
        fn test_map_entries() {
            let mut map = HashMap::new();
            map.insert("a", 1);
            assert_eq!(fmt(&map), "{[\"a\", 1]}");
        }

        #[test]
        fn test_tuple() {
            assert_eq!(fmt(&(1, "x")), "(1, \"x\")");
            assert_eq!(fmt(&(7,)), "(7,)");
        }

        #[test]
        fn test_grid() {
            let grid = Grid::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
            assert_eq!(fmt(&grid), "{{1,2},{3,4}}");
        }

        #[test]
        fn test_error() {
            let err = "x".parse::<u8>().unwrap_err();
            assert_eq!(
                fmt(&err),
                "core::num::error::ParseIntError: 'invalid digit found in string'"
            );
        }

        #[test]
        fn test_stream() {
            let cursor = Cursor::new(vec![1_u8, 2, 3]);
            assert_eq!(fmt(&cursor), "Cursor<Vec<u8>> (Length: 3)");
        }

        #[test]
        fn test_type_values() {
            assert_eq!(fmt(&TypeOf::of::<HashMap<String, String>>()), "HashMap<String, String>");
            assert_eq!(fmt(&TypeOf::of::<Option<u8>>()), "u8?");
        }

        struct SelfList(RefCell<Vec<Rc<SelfList>>>);

        impl Inspect for SelfList {
            fn inspect(&self, capture: &mut Capture) -> NodeId {
                capture
                    .record(TypeInfo::of::<Self>(Category::Object))
                    .field("0", &self.0)
                    .positional()
                    .finish()
            }
        }

        #[test]
        fn test_record_reached_again_is_placeholder() {
            let list = Rc::new(SelfList(RefCell::new(Vec::new())));
            list.0.borrow_mut().push(Rc::clone(&list));
            assert_eq!(fmt(&list), "SelfList({{...}})");
            list.0.borrow_mut().clear();
        }

        #[test]
        fn test_record_display_override() {
            struct Celsius(f64);
            impl Inspect for Celsius {
                fn inspect(&self, capture: &mut Capture) -> NodeId {
                    capture
                        .record(TypeInfo::of::<Self>(Category::Struct))
                        .field("0", &self.0)
                        .positional()
                        .display(format!("{}°C", self.0))
                        .finish()
                }
            }
            assert_eq!(fmt(&Celsius(21.5)), "21.5°C");
        }
    }

    mod determinism {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_format_is_pure(
                values in proptest::collection::vec(any::<i64>(), 0..40),
                text in ".{0,64}",
            ) {
                let pair = (values, text);
                prop_assert_eq!(fmt(&pair), fmt(&pair));
            }

            #[test]
            fn prop_truncated_length_is_bounded(len in 20_usize..200, extra in 1_usize..100) {
                let settings = Settings::builder().truncation_length(len).build().unwrap();
                let text = "z".repeat(len + extra);
                let out = Formatter::new(&settings).truncate(&text);
                prop_assert_eq!(out.matches(TRUNCATION_MARKER).count(), 1);
                prop_assert!(out.chars().count() <= len + TRUNCATION_MARKER.len());
            }
        }
    }
}
