//! Structural Equality / Difference Engine
//!
//! Walks two capture graphs side by side and records every place where they
//! disagree. An empty list means equal. Records come out in pre-order, left
//! graph first, so the first record is the one a failure message surfaces.
//!
//! Comparison never fails: values with nothing in common produce a
//! [`DifferenceKind::Type`] record, and cyclic graphs terminate because a
//! pair of nodes already on the current path is treated as equal.

pub mod registry;

pub use registry::{
    register_comparer, register_operator, Comparer, ComparerRegistration, ComparerRegistry,
    Operator,
};

use serde::Serialize;
use std::fmt;

use crate::format::Formatter;
use crate::inspect::{DateTimeValue, Graph, Inspect, Kind, Member, NodeId, Snapshot};
use crate::numeric::numbers_equal;
use crate::result::CheckResult;
use crate::settings::Settings;

const FIRST_ROOT: &str = "checked";
const SECOND_ROOT: &str = "expected";

/// How equality is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EqualityMode {
    /// Structural comparison with numeric widening
    #[default]
    Structural,
    /// Registered `==` operator, structural when none is registered
    Operator,
    /// Registered `!=` operator, structural when none is registered
    OperatorInequality,
}

/// What kind of disagreement a [`Difference`] records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Both sides present, values differ
    Value,
    /// Values have no common representation
    Type,
    /// Exactly one side is null
    Null,
    /// Item present only in the second sequence
    ExtraItem,
    /// Item present only in the first sequence
    MissingItem,
    /// Key present only in the second map
    ExtraKey,
    /// Key present only in the first map
    MissingKey,
    /// A registered comparer rejected the pair
    Custom,
}

/// One place where two values disagree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    /// Member/index path from the root (`a[1].field`), empty at the root
    pub path: String,
    /// Kind of disagreement
    pub kind: DifferenceKind,
    /// Label of the first side (`checked.a[1].field`)
    pub first_label: String,
    /// Label of the second side
    pub second_label: String,
    /// Formatted first value, absent when the first side has no item there
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_value: Option<String>,
    /// Formatted second value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_value: Option<String>,
    /// Type name of the first value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_type: Option<String>,
    /// Type name of the second value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_type: Option<String>,
}

impl Difference {
    /// `path` rendered for a message; `root` at the top level
    #[must_use]
    pub fn location(&self) -> &str {
        if self.path.is_empty() {
            "root"
        } else {
            &self.path
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.first_value.as_deref().unwrap_or("");
        let second = self.second_value.as_deref().unwrap_or("");
        match self.kind {
            DifferenceKind::Type => write!(
                f,
                "{} is of type [{}] instead of [{}]",
                self.first_label,
                self.first_type.as_deref().unwrap_or(""),
                self.second_type.as_deref().unwrap_or("")
            ),
            DifferenceKind::ExtraItem | DifferenceKind::ExtraKey => {
                write!(f, "{} = {second} has no counterpart", self.second_label)
            }
            DifferenceKind::MissingItem | DifferenceKind::MissingKey => {
                write!(f, "{} = {first} is not expected", self.first_label)
            }
            DifferenceKind::Value | DifferenceKind::Null | DifferenceKind::Custom => write!(
                f,
                "{} = {first} instead of {} = {second}",
                self.first_label, self.second_label
            ),
        }
    }
}

/// Serialize a difference list as pretty JSON
pub fn to_json(differences: &[Difference]) -> CheckResult<String> {
    Ok(serde_json::to_string_pretty(differences)?)
}

fn join_member(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn label(root: &str, path: &str) -> String {
    if path.is_empty() || path.starts_with('[') {
        format!("{root}{path}")
    } else {
        format!("{root}.{path}")
    }
}

/// Row-major flat index to `[i, j, ...]`
fn grid_index(dims: &[usize], mut flat: usize) -> String {
    let mut coords = vec![0; dims.len()];
    for (slot, &size) in coords.iter_mut().zip(dims).rev() {
        if size > 0 {
            *slot = flat % size;
            flat /= size;
        }
    }
    let coords: Vec<String> = coords.iter().map(ToString::to_string).collect();
    format!("[{}]", coords.join(", "))
}

/// One side of the walk
#[derive(Clone, Copy)]
struct Side<'g> {
    graph: &'g Graph,
    id: NodeId,
}

/// Structural comparer over two capture graphs
#[derive(Debug, Clone, Copy)]
pub struct Differ<'r> {
    registry: &'r ComparerRegistry,
    settings: Settings,
}

impl<'r> Differ<'r> {
    /// Create a differ consulting `registry` for custom comparers
    #[must_use]
    pub fn new(registry: &'r ComparerRegistry) -> Self {
        Self {
            registry,
            settings: Settings::default(),
        }
    }

    /// Format recorded values with `settings`
    #[must_use]
    pub const fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Every difference between `l` in `lg` and `r` in `rg`
    #[must_use]
    pub fn differences(&self, lg: &Graph, l: NodeId, rg: &Graph, r: NodeId) -> Vec<Difference> {
        let mut out = Vec::new();
        let mut path_pairs = Vec::new();
        self.walk(
            Side { graph: lg, id: l },
            Side { graph: rg, id: r },
            "",
            &mut path_pairs,
            &mut out,
        );
        out
    }

    /// Whether the two nodes are structurally equal
    #[must_use]
    pub fn equal(&self, lg: &Graph, l: NodeId, rg: &Graph, r: NodeId) -> bool {
        self.differences(lg, l, rg, r).is_empty()
    }

    /// Equality of two typed values under `mode`
    pub fn are_equal<L, R>(&self, left: &L, right: &R, mode: EqualityMode) -> bool
    where
        L: Inspect + ?Sized,
        R: Inspect + ?Sized,
    {
        if let Some(verdict) = self.operator_verdict(left, right, mode) {
            return verdict;
        }
        let (l, r) = (Snapshot::of(left), Snapshot::of(right));
        self.equal(&l.graph, l.root, &r.graph, r.root)
    }

    /// Equality decided by a registered operator, `None` without one
    pub fn operator_verdict<L, R>(&self, left: &L, right: &R, mode: EqualityMode) -> Option<bool>
    where
        L: Inspect + ?Sized,
        R: Inspect + ?Sized,
    {
        let operator = match mode {
            EqualityMode::Structural => return None,
            EqualityMode::Operator => Operator::Eq,
            EqualityMode::OperatorInequality => Operator::Ne,
        };
        let verdict = self
            .registry
            .evaluate(operator, left.as_any()?, right.as_any()?)?;
        Some(match operator {
            Operator::Eq => verdict,
            Operator::Ne => !verdict,
        })
    }

    fn record(
        &self,
        kind: DifferenceKind,
        path: &str,
        left: Option<Side<'_>>,
        right: Option<Side<'_>>,
    ) -> Difference {
        let formatter = Formatter::new(&self.settings);
        let value = |side: Option<Side<'_>>| side.map(|s| formatter.format(s.graph, s.id));
        let type_name = |side: Option<Side<'_>>| {
            (kind == DifferenceKind::Type)
                .then_some(side)
                .flatten()
                .map(|s| s.graph.node(s.id).info.name().to_string())
        };
        Difference {
            path: path.to_string(),
            kind,
            first_label: label(FIRST_ROOT, path),
            second_label: label(SECOND_ROOT, path),
            first_value: value(left),
            second_value: value(right),
            first_type: type_name(left),
            second_type: type_name(right),
        }
    }

    fn walk(
        &self,
        left: Side<'_>,
        right: Side<'_>,
        path: &str,
        path_pairs: &mut Vec<(NodeId, NodeId)>,
        out: &mut Vec<Difference>,
    ) {
        let (ln, rn) = (left.graph.node(left.id), right.graph.node(right.id));

        if let Some(comparer) = self.registry.comparer_for(ln.info.token()) {
            if !comparer.equals(left.graph.node_ref(left.id), right.graph.node_ref(right.id)) {
                out.push(self.record(DifferenceKind::Custom, path, Some(left), Some(right)));
            }
            return;
        }

        match (&ln.kind, &rn.kind) {
            (Kind::Null, Kind::Null) => {}
            (Kind::Null, _) | (_, Kind::Null) => {
                out.push(self.record(DifferenceKind::Null, path, Some(left), Some(right)));
            }
            (Kind::Number(a), Kind::Number(b)) => {
                if !numbers_equal(*a, *b) {
                    out.push(self.record(DifferenceKind::Value, path, Some(left), Some(right)));
                }
            }
            (a, b) if a.is_leaf() && b.is_leaf() => match leaf_equal(a, b) {
                Some(true) => {}
                Some(false) => {
                    out.push(self.record(DifferenceKind::Value, path, Some(left), Some(right)));
                }
                None => out.push(self.record(DifferenceKind::Type, path, Some(left), Some(right))),
            },
            _ => {
                let pair = (left.id, right.id);
                if path_pairs.contains(&pair) {
                    tracing::trace!(
                        left = left.id.index(),
                        right = right.id.index(),
                        path,
                        "cycle during structural comparison"
                    );
                    return;
                }
                path_pairs.push(pair);
                self.walk_composite(left, right, path, path_pairs, out);
                path_pairs.pop();
            }
        }
    }

    fn walk_composite(
        &self,
        left: Side<'_>,
        right: Side<'_>,
        path: &str,
        path_pairs: &mut Vec<(NodeId, NodeId)>,
        out: &mut Vec<Difference>,
    ) {
        let (ln, rn) = (left.graph.node(left.id), right.graph.node(right.id));
        match (&ln.kind, &rn.kind) {
            (Kind::Sequence(a), Kind::Sequence(b)) => {
                self.walk_items(left, a, right, b, |i| format!("{path}[{i}]"), path_pairs, out);
            }
            (Kind::Grid { dims: da, items: a }, Kind::Grid { dims: db, items: b }) => {
                if da == db {
                    let item_path = |i| format!("{path}{}", grid_index(da, i));
                    self.walk_items(left, a, right, b, item_path, path_pairs, out);
                } else {
                    out.push(self.record(DifferenceKind::Value, path, Some(left), Some(right)));
                }
            }
            (Kind::Map(a), Kind::Map(b)) => {
                self.walk_maps(left, a, right, b, path, path_pairs, out);
            }
            (Kind::Record { members: ma, .. }, Kind::Record { members: mb, .. })
                if ln.info.token() == rn.info.token() =>
            {
                self.walk_members(left, ma, right, mb, path, path_pairs, out);
            }
            (
                Kind::Variant {
                    name: va,
                    members: ma,
                    ..
                },
                Kind::Variant {
                    name: vb,
                    members: mb,
                    ..
                },
            ) if ln.info.token() == rn.info.token() => {
                if va == vb {
                    self.walk_members(left, ma, right, mb, path, path_pairs, out);
                } else {
                    out.push(self.record(DifferenceKind::Value, path, Some(left), Some(right)));
                }
            }
            _ => out.push(self.record(DifferenceKind::Type, path, Some(left), Some(right))),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_items(
        &self,
        left: Side<'_>,
        a: &[NodeId],
        right: Side<'_>,
        b: &[NodeId],
        item_path: impl Fn(usize) -> String,
        path_pairs: &mut Vec<(NodeId, NodeId)>,
        out: &mut Vec<Difference>,
    ) {
        for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
            self.walk(
                Side { id: x, ..left },
                Side { id: y, ..right },
                &item_path(i),
                path_pairs,
                out,
            );
        }
        for (i, &x) in a.iter().enumerate().skip(b.len()) {
            let missing = Side { id: x, ..left };
            out.push(self.record(DifferenceKind::MissingItem, &item_path(i), Some(missing), None));
        }
        for (i, &y) in b.iter().enumerate().skip(a.len()) {
            let extra = Side { id: y, ..right };
            out.push(self.record(DifferenceKind::ExtraItem, &item_path(i), None, Some(extra)));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_maps(
        &self,
        left: Side<'_>,
        a: &[(NodeId, NodeId)],
        right: Side<'_>,
        b: &[(NodeId, NodeId)],
        path: &str,
        path_pairs: &mut Vec<(NodeId, NodeId)>,
        out: &mut Vec<Difference>,
    ) {
        let formatter = Formatter::new(&self.settings);
        let mut matched = vec![false; b.len()];
        for &(lk, lv) in a {
            let key_path = format!("{path}[{}]", formatter.format(left.graph, lk));
            let found = b.iter().enumerate().find(|(j, (rk, _))| {
                !matched[*j] && self.equal(left.graph, lk, right.graph, *rk)
            });
            match found {
                Some((j, &(_, rv))) => {
                    matched[j] = true;
                    self.walk(
                        Side { id: lv, ..left },
                        Side { id: rv, ..right },
                        &key_path,
                        path_pairs,
                        out,
                    );
                }
                None => {
                    let missing = Side { id: lv, ..left };
                    let kind = DifferenceKind::MissingKey;
                    out.push(self.record(kind, &key_path, Some(missing), None));
                }
            }
        }
        for (j, &(rk, rv)) in b.iter().enumerate() {
            if !matched[j] {
                let key_path = format!("{path}[{}]", formatter.format(right.graph, rk));
                let extra = Side { id: rv, ..right };
                out.push(self.record(DifferenceKind::ExtraKey, &key_path, None, Some(extra)));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_members(
        &self,
        left: Side<'_>,
        a: &[Member],
        right: Side<'_>,
        b: &[Member],
        path: &str,
        path_pairs: &mut Vec<(NodeId, NodeId)>,
        out: &mut Vec<Difference>,
    ) {
        for member in a {
            let member_path = join_member(path, member.name);
            match b.iter().find(|m| m.name == member.name) {
                Some(other) => self.walk(
                    Side { id: member.value, ..left },
                    Side { id: other.value, ..right },
                    &member_path,
                    path_pairs,
                    out,
                ),
                None => out.push(self.record(
                    DifferenceKind::Type,
                    &member_path,
                    Some(Side { id: member.value, ..left }),
                    None,
                )),
            }
        }
    }
}

/// Equality of two leaf kinds; `None` when they have no common representation
fn leaf_equal(a: &Kind, b: &Kind) -> Option<bool> {
    Some(match (a, b) {
        (Kind::Bool(x), Kind::Bool(y)) => x == y,
        (Kind::Char(x), Kind::Char(y)) => x == y,
        (Kind::Str(x), Kind::Str(y)) => x == y,
        (Kind::Duration(x), Kind::Duration(y)) => x == y,
        (Kind::DateTime(x), Kind::DateTime(y)) => date_times_equal(x, y)?,
        (Kind::Error { message: x }, Kind::Error { message: y }) => x == y,
        (Kind::Stream { length: x }, Kind::Stream { length: y }) => x == y,
        (Kind::Type(x), Kind::Type(y)) => x.token() == y.token(),
        (Kind::Opaque(x), Kind::Opaque(y)) => x == y,
        (Kind::Pending, Kind::Pending) => true,
        _ => return None,
    })
}

/// Instants compare across zones; naive values only against naive values
fn date_times_equal(a: &DateTimeValue, b: &DateTimeValue) -> Option<bool> {
    match (a.instant(), b.instant()) {
        (Some(x), Some(y)) => Some(x == y),
        (None, None) => Some(a.naive() == b.naive()),
        _ => None,
    }
}

/// Every difference between two values, using the process-wide registry
#[must_use]
pub fn differences<L, R>(left: &L, right: &R) -> Vec<Difference>
where
    L: Inspect + ?Sized,
    R: Inspect + ?Sized,
{
    let registry = registry::snapshot();
    let (l, r) = (Snapshot::of(left), Snapshot::of(right));
    Differ::new(&registry)
        .with_settings(Settings::current())
        .differences(&l.graph, l.root, &r.graph, r.root)
}

/// Equality of two values under `mode`, using the process-wide registry
#[must_use]
pub fn are_equal<L, R>(left: &L, right: &R, mode: EqualityMode) -> bool
where
    L: Inspect + ?Sized,
    R: Inspect + ?Sized,
{
    let registry = registry::snapshot();
    Differ::new(&registry).are_equal(left, right, mode)
}
