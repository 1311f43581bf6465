//! Value Capture
//!
//! Every comparison and every message works on a [`Graph`]: an arena of
//! [`Node`]s recorded by [`Inspect`] implementations. Capturing replaces
//! runtime reflection with an explicit capability: a type says what it is
//! (a number, a sequence, a record with named members, ...) and the engine
//! never needs to know the concrete Rust type again.
//!
//! Shared allocations (`Rc`, `Arc`) are recorded once per capture. When the
//! same allocation is reached again the existing [`NodeId`] is reused, so a
//! cyclic `Rc<RefCell<_>>` structure becomes a finite graph with back-edges.
//!
//! ```ignore
//! use fluent_check::{Inspect, Snapshot};
//!
//! #[derive(Inspect)]
//! struct Point { x: i32, y: i32 }
//!
//! let snap = Snapshot::of(&Point { x: 1, y: 2 });
//! let x = snap.node_ref().member("x").and_then(|x| x.as_number());
//! assert_eq!(x.map(|n| n.to_f64()), Some(1.0));
//! ```

mod grid;
mod impls;
mod type_name;

pub use grid::Grid;
pub use impls::TypeOf;
pub use type_name::display_name;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::time::Duration;

use crate::numeric::Number;

/// Records a value into a capture graph.
///
/// Implemented for the standard scalar, string, collection, smart-pointer,
/// error, stream and date/time types. User types derive it with
/// `#[derive(Inspect)]`.
pub trait Inspect {
    /// Record this value and return its node
    fn inspect(&self, capture: &mut Capture) -> NodeId;

    /// Category of the type, known without a value
    fn category() -> Category {
        Category::Object
    }

    /// Expose the concrete value for operator dispatch.
    ///
    /// Only `'static` types can answer; everything else returns `None` and
    /// falls back to structural equality.
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

/// Index of a node inside a [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the arena
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Type classification driving entity naming and record rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `bool`
    Boolean,
    /// `str`, `String`, `Cow<str>`
    String,
    /// chrono date/time types
    DateTime,
    /// `std::time::Duration`
    Duration,
    /// `char`
    Char,
    /// built-in integers, floats, `Decimal`
    Numeric,
    /// derived enums
    Enum,
    /// `Option<T>`
    Nullable,
    /// synchronization primitives (`Condvar`, `Barrier`)
    Event,
    /// maps
    Dictionary,
    /// sequences, sets, grids
    Enumerable,
    /// value-like aggregates (tuples, `#[inspect(by_value)]` records)
    Struct,
    /// everything else
    Object,
}

/// Static description of an inspected type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    token: &'static str,
    name: String,
    category: Category,
}

impl TypeInfo {
    /// Describe `T` with the given category
    #[must_use]
    pub fn of<T: ?Sized>(category: Category) -> Self {
        let token = std::any::type_name::<T>();
        Self {
            token,
            name: display_name(token),
            category,
        }
    }

    /// Describe a type whose display name is not derivable from its token
    #[must_use]
    pub fn named(token: &'static str, name: impl Into<String>, category: Category) -> Self {
        Self {
            token,
            name: name.into(),
            category,
        }
    }

    /// Fully qualified type name, as reported by `std::any::type_name`
    #[must_use]
    pub const fn token(&self) -> &'static str {
        self.token
    }

    /// Language-level display name (`HashMap<String, i32>`, `i32?`)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classification of the type
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }
}

/// How the members of a record are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStyle {
    /// `Name { a: 1 }`
    Named,
    /// `Name(1, 2)`
    Positional,
    /// `(1, 2)`
    Tuple,
}

/// One named member of a record or variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Field name (`"0"`, `"1"` for positional members)
    pub name: &'static str,
    /// Captured value
    pub value: NodeId,
}

/// A captured date/time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeValue {
    /// `DateTime<Utc>`
    Utc(DateTime<Utc>),
    /// `DateTime<Local>`
    Local(DateTime<Local>),
    /// `DateTime<FixedOffset>`
    Fixed(DateTime<FixedOffset>),
    /// `NaiveDateTime`, no zone information
    Naive(NaiveDateTime),
    /// `NaiveDate`
    Date(NaiveDate),
}

impl DateTimeValue {
    /// Absolute instant, when the value carries zone information
    #[must_use]
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Utc(v) => Some(*v),
            Self::Local(v) => Some(v.with_timezone(&Utc)),
            Self::Fixed(v) => Some(v.with_timezone(&Utc)),
            Self::Naive(_) | Self::Date(_) => None,
        }
    }

    /// Wall-clock value without zone
    #[must_use]
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            Self::Utc(v) => v.naive_utc(),
            Self::Local(v) => v.naive_local(),
            Self::Fixed(v) => v.naive_local(),
            Self::Naive(v) => *v,
            Self::Date(v) => v.and_time(chrono::NaiveTime::MIN),
        }
    }
}

/// Shape of a captured value
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// `None`, null pointers
    Null,
    /// `bool`
    Bool(bool),
    /// `char`
    Char(char),
    /// string data
    Str(String),
    /// any built-in number
    Number(Number),
    /// date/time
    DateTime(DateTimeValue),
    /// `std::time::Duration`
    Duration(Duration),
    /// ordered items
    Sequence(Vec<NodeId>),
    /// multi-dimensional array, items in row-major order
    Grid {
        /// length of each dimension
        dims: Vec<usize>,
        /// flattened items
        items: Vec<NodeId>,
    },
    /// key/value pairs
    Map(Vec<(NodeId, NodeId)>),
    /// aggregate with named members
    Record {
        /// members in declaration order
        members: Vec<Member>,
        /// member layout used for display
        style: MemberStyle,
        /// custom display text supplied by the type
        display: Option<String>,
    },
    /// enum variant
    Variant {
        /// variant name
        name: &'static str,
        /// members in declaration order
        members: Vec<Member>,
        /// member layout used for display
        style: MemberStyle,
        /// custom display text supplied by the type
        display: Option<String>,
    },
    /// error value
    Error {
        /// `Display` of the error
        message: String,
    },
    /// in-memory stream
    Stream {
        /// byte length
        length: u64,
    },
    /// a type used as a value
    Type(TypeInfo),
    /// display text only
    Opaque(String),
    /// placeholder while a shared allocation is being recorded
    Pending,
}

impl Kind {
    /// Whether the value is iterated by the enumerable renderer
    #[must_use]
    pub const fn is_enumerable(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Grid { .. } | Self::Map(_))
    }

    /// Whether the value has no children
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        !matches!(
            self,
            Self::Sequence(_)
                | Self::Grid { .. }
                | Self::Map(_)
                | Self::Record { .. }
                | Self::Variant { .. }
        )
    }
}

/// One captured value
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Type description
    pub info: TypeInfo,
    /// Shape and payload
    pub kind: Kind,
    /// Address of the shared allocation this node was reached through
    pub identity: Option<usize>,
}

/// Arena of captured nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// Node by id.
    ///
    /// Ids are only ever produced by the capture that built this graph.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node by id, `None` for foreign ids
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrowed view of a node
    #[must_use]
    pub const fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { graph: self, id }
    }
}

/// Recorder handed to [`Inspect::inspect`]
#[derive(Debug, Default)]
pub struct Capture {
    nodes: Vec<Node>,
    shared: HashMap<usize, NodeId>,
}

impl Capture {
    /// Create an empty capture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Record a node with no members
    pub fn leaf(&mut self, info: TypeInfo, kind: Kind) -> NodeId {
        self.push(Node {
            info,
            kind,
            identity: None,
        })
    }

    /// Record a null value of the given type
    pub fn null(&mut self, info: TypeInfo) -> NodeId {
        self.leaf(info, Kind::Null)
    }

    /// Record a sequence of already captured items
    pub fn sequence(&mut self, info: TypeInfo, items: Vec<NodeId>) -> NodeId {
        self.leaf(info, Kind::Sequence(items))
    }

    /// Start recording a record (struct or tuple)
    pub fn record(&mut self, info: TypeInfo) -> RecordBuilder<'_> {
        RecordBuilder {
            capture: self,
            info,
            variant: None,
            members: Vec::new(),
            style: MemberStyle::Named,
            display: None,
        }
    }

    /// Start recording an enum variant
    pub fn variant(&mut self, info: TypeInfo, name: &'static str) -> RecordBuilder<'_> {
        RecordBuilder {
            capture: self,
            info,
            variant: Some(name),
            members: Vec::new(),
            style: MemberStyle::Named,
            display: None,
        }
    }

    /// Record a value reached through a shared allocation.
    ///
    /// The first visit of `address` records the value; later visits (including
    /// re-entrant ones from a cycle) return the same node.
    pub fn shared(
        &mut self,
        address: usize,
        inspect: impl FnOnce(&mut Self) -> NodeId,
    ) -> NodeId {
        if let Some(&id) = self.shared.get(&address) {
            return id;
        }
        let reserved = self.push(Node {
            info: TypeInfo::of::<()>(Category::Object),
            kind: Kind::Pending,
            identity: Some(address),
        });
        self.shared.insert(address, reserved);
        let inner = inspect(self);
        let mut node = self.nodes[inner.0].clone();
        node.identity = Some(address);
        self.nodes[reserved.0] = node;
        reserved
    }

    /// Freeze the capture into a graph
    #[must_use]
    pub fn finish(self) -> Graph {
        Graph { nodes: self.nodes }
    }
}

/// Builder returned by [`Capture::record`] and [`Capture::variant`]
#[derive(Debug)]
pub struct RecordBuilder<'c> {
    capture: &'c mut Capture,
    info: TypeInfo,
    variant: Option<&'static str>,
    members: Vec<Member>,
    style: MemberStyle,
    display: Option<String>,
}

impl RecordBuilder<'_> {
    /// Record a member
    pub fn field<V: Inspect + ?Sized>(mut self, name: &'static str, value: &V) -> Self {
        let id = value.inspect(self.capture);
        self.members.push(Member { name, value: id });
        self
    }

    /// Use `Name(a, b)` layout
    pub fn positional(mut self) -> Self {
        self.style = MemberStyle::Positional;
        self
    }

    /// Use `(a, b)` layout
    pub fn tuple(mut self) -> Self {
        self.style = MemberStyle::Tuple;
        self
    }

    /// Render with this text instead of the member listing
    pub fn display(mut self, text: impl Into<String>) -> Self {
        self.display = Some(text.into());
        self
    }

    /// Record the node
    pub fn finish(self) -> NodeId {
        let kind = match self.variant {
            Some(name) => Kind::Variant {
                name,
                members: self.members,
                style: self.style,
                display: self.display,
            },
            None => Kind::Record {
                members: self.members,
                style: self.style,
                display: self.display,
            },
        };
        self.capture.leaf(self.info, kind)
    }
}

/// A value captured into its own graph
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Captured nodes
    pub graph: Graph,
    /// Node of the captured value
    pub root: NodeId,
}

impl Snapshot {
    /// Capture a value
    #[must_use]
    pub fn of<V: Inspect + ?Sized>(value: &V) -> Self {
        let mut capture = Capture::new();
        let root = value.inspect(&mut capture);
        Self {
            graph: capture.finish(),
            root,
        }
    }

    /// Root node
    #[must_use]
    pub fn node(&self) -> &Node {
        self.graph.node(self.root)
    }

    /// Borrowed view of the root
    #[must_use]
    pub const fn node_ref(&self) -> NodeRef<'_> {
        self.graph.node_ref(self.root)
    }
}

/// Borrowed view of a node, used by custom comparers
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'g> {
    graph: &'g Graph,
    id: NodeId,
}

impl<'g> NodeRef<'g> {
    /// Underlying graph
    #[must_use]
    pub const fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Node id
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Node
    #[must_use]
    pub fn node(&self) -> &'g Node {
        self.graph.node(self.id)
    }

    /// Shape
    #[must_use]
    pub fn kind(&self) -> &'g Kind {
        &self.node().kind
    }

    /// Type description
    #[must_use]
    pub fn info(&self) -> &'g TypeInfo {
        &self.node().info
    }

    /// Whether the value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.kind(), Kind::Null)
    }

    /// Number payload
    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self.kind() {
            Kind::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload
    #[must_use]
    pub fn as_str(&self) -> Option<&'g str> {
        match self.kind() {
            Kind::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Member by name, for records and variants
    #[must_use]
    pub fn member(&self, name: &str) -> Option<Self> {
        let members = match self.kind() {
            Kind::Record { members, .. } | Kind::Variant { members, .. } => members,
            _ => return None,
        };
        members
            .iter()
            .find(|m| m.name == name)
            .map(|m| self.graph.node_ref(m.value))
    }

    /// Items of a sequence or grid
    #[must_use]
    pub fn items(&self) -> Vec<Self> {
        match self.kind() {
            Kind::Sequence(items) | Kind::Grid { items, .. } => {
                items.iter().map(|id| self.graph.node_ref(*id)).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    mod capture {
        use super::*;

        #[test]
        fn test_leaf_capture() {
            let snap = Snapshot::of(&42_i32);
            assert_eq!(snap.graph.len(), 1);
            assert_eq!(snap.node().kind, Kind::Number(Number::I32(42)));
            assert_eq!(snap.node().info.category(), Category::Numeric);
        }

        #[test]
        fn test_sequence_capture() {
            let snap = Snapshot::of(&vec!["a", "b"]);
            let items = snap.node_ref().items();
            assert_eq!(items.len(), 2);
            assert_eq!(items[1].as_str(), Some("b"));
        }

        #[test]
        fn test_shared_allocation_recorded_once() {
            let shared = Rc::new(5_u8);
            let pair = vec![Rc::clone(&shared), Rc::clone(&shared)];
            let snap = Snapshot::of(&pair);
            let items = snap.node_ref().items();
            assert_eq!(items[0].id(), items[1].id());
            assert!(items[0].node().identity.is_some());
        }

        struct Link {
            value: u8,
            next: RefCell<Option<Rc<Link>>>,
        }

        impl Inspect for Link {
            fn inspect(&self, capture: &mut Capture) -> NodeId {
                capture
                    .record(TypeInfo::of::<Self>(Category::Object))
                    .field("value", &self.value)
                    .field("next", &self.next)
                    .finish()
            }
        }

        #[test]
        fn test_self_reference_becomes_back_edge() {
            let link = Rc::new(Link {
                value: 7,
                next: RefCell::new(None),
            });
            *link.next.borrow_mut() = Some(Rc::clone(&link));

            let snap = Snapshot::of(&link);
            let next = snap.node_ref().member("next").unwrap();
            assert_eq!(next.id(), snap.root);
            assert!(snap.graph.len() < 5);

            link.next.borrow_mut().take();
        }
    }

    mod node_ref {
        use super::*;

        #[test]
        fn test_member_lookup() {
            let snap = Snapshot::of(&(1_u8, "x"));
            let view = snap.node_ref();
            assert_eq!(view.member("1").and_then(|m| m.as_str()), Some("x"));
            assert!(view.member("2").is_none());
        }

        #[test]
        fn test_null_option() {
            let snap = Snapshot::of(&None::<i32>);
            assert!(snap.node_ref().is_null());
            assert_eq!(snap.node().info.name(), "i32?");
            assert_eq!(snap.node().info.category(), Category::Nullable);
        }
    }
}
