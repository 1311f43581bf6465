//! Comparer registry
//!
//! Custom comparers are keyed by type token (`std::any::type_name`) and
//! replace structural comparison for that type. Equality operators are
//! registered once from `PartialEq` impls and looked up by the pair of
//! concrete `TypeId`s at the typed entry points.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::inspect::NodeRef;

/// Decides equality of two captured values of one type
pub trait Comparer: Send + Sync {
    /// Whether `left` and `right` are equal
    fn equals(&self, left: NodeRef<'_>, right: NodeRef<'_>) -> bool;
}

impl<F> Comparer for F
where
    F: Fn(NodeRef<'_>, NodeRef<'_>) -> bool + Send + Sync,
{
    fn equals(&self, left: NodeRef<'_>, right: NodeRef<'_>) -> bool {
        self(left, right)
    }
}

type OperatorFn = fn(&dyn Any, &dyn Any) -> Option<bool>;

#[derive(Clone, Copy)]
struct Operators {
    eq: OperatorFn,
    ne: OperatorFn,
}

fn operator_eq<L: PartialEq<R> + 'static, R: 'static>(
    left: &dyn Any,
    right: &dyn Any,
) -> Option<bool> {
    Some(left.downcast_ref::<L>()?.eq(right.downcast_ref::<R>()?))
}

fn operator_ne<L: PartialEq<R> + 'static, R: 'static>(
    left: &dyn Any,
    right: &dyn Any,
) -> Option<bool> {
    Some(left.downcast_ref::<L>()?.ne(right.downcast_ref::<R>()?))
}

/// Which operator to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

/// Custom comparers and equality operators
#[derive(Clone, Default)]
pub struct ComparerRegistry {
    comparers: HashMap<&'static str, Arc<dyn Comparer>>,
    operators: HashMap<(TypeId, TypeId), Operators>,
}

impl fmt::Debug for ComparerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<_> = self.comparers.keys().collect();
        tokens.sort();
        f.debug_struct("ComparerRegistry")
            .field("comparers", &tokens)
            .field("operators", &self.operators.len())
            .finish()
    }
}

impl ComparerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `comparer` for every value of type `T`; returns the comparer it replaces
    pub fn register<T: ?Sized>(
        &mut self,
        comparer: impl Comparer + 'static,
    ) -> Option<Arc<dyn Comparer>> {
        let comparer: Arc<dyn Comparer> = Arc::new(comparer);
        self.insert(std::any::type_name::<T>(), Some(comparer))
    }

    /// Set or clear the comparer of a type token; returns the previous one
    pub fn insert(
        &mut self,
        token: &'static str,
        comparer: Option<Arc<dyn Comparer>>,
    ) -> Option<Arc<dyn Comparer>> {
        match comparer {
            Some(comparer) => self.comparers.insert(token, comparer),
            None => self.comparers.remove(token),
        }
    }

    /// Comparer registered for a type token
    #[must_use]
    pub fn comparer_for(&self, token: &str) -> Option<&dyn Comparer> {
        self.comparers.get(token).map(|comparer| &**comparer)
    }

    /// Register `==` and `!=` between `L` and `R`
    pub fn register_operator<L: PartialEq<R> + 'static, R: 'static>(&mut self) {
        self.operators.insert(
            (TypeId::of::<L>(), TypeId::of::<R>()),
            Operators {
                eq: operator_eq::<L, R>,
                ne: operator_ne::<L, R>,
            },
        );
    }

    /// Evaluate an operator on two concrete values.
    ///
    /// An operator declared on either operand's side applies: `L == R` is
    /// also used for `R == L`. `None` when neither is registered.
    #[must_use]
    pub fn evaluate(&self, operator: Operator, left: &dyn Any, right: &dyn Any) -> Option<bool> {
        let (l, r) = (Any::type_id(left), Any::type_id(right));
        let select = |ops: &Operators| match operator {
            Operator::Eq => ops.eq,
            Operator::Ne => ops.ne,
        };
        if let Some(ops) = self.operators.get(&(l, r)) {
            return select(ops)(left, right);
        }
        self.operators
            .get(&(r, l))
            .and_then(|ops| select(ops)(right, left))
    }

    /// Number of registered comparers
    #[must_use]
    pub fn len(&self) -> usize {
        self.comparers.len()
    }

    /// Whether no comparer is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comparers.is_empty()
    }
}

fn global() -> &'static RwLock<ComparerRegistry> {
    static GLOBAL: OnceLock<RwLock<ComparerRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(ComparerRegistry::new()))
}

/// Copy of the process-wide registry.
///
/// Comparisons run against the copy so that no lock is held while user
/// comparers execute.
#[must_use]
pub fn snapshot() -> ComparerRegistry {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Handle of a process-wide comparer registration.
///
/// Dropping it restores whatever was registered for the type before.
/// Call [`keep`](Self::keep) to make the registration permanent.
#[must_use = "dropping the registration unregisters the comparer"]
pub struct ComparerRegistration {
    token: &'static str,
    previous: Option<Arc<dyn Comparer>>,
    active: bool,
}

impl fmt::Debug for ComparerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparerRegistration")
            .field("token", &self.token)
            .field("restores_previous", &self.previous.is_some())
            .field("active", &self.active)
            .finish()
    }
}

impl ComparerRegistration {
    /// Type token the comparer is registered for
    #[must_use]
    pub const fn token(&self) -> &'static str {
        self.token
    }

    /// Leave the comparer registered for the rest of the process
    pub fn keep(mut self) {
        self.active = false;
    }
}

impl Drop for ComparerRegistration {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        global()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.token, self.previous.take());
        tracing::debug!(token = self.token, "comparer registration dropped");
    }
}

/// Register a process-wide comparer for `T`; last registration wins
pub fn register_comparer<T: ?Sized>(comparer: impl Comparer + 'static) -> ComparerRegistration {
    let token = std::any::type_name::<T>();
    let previous = global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register::<T>(comparer);
    tracing::debug!(token, replaced = previous.is_some(), "registered comparer");
    ComparerRegistration {
        token,
        previous,
        active: true,
    }
}

/// Register `==`/`!=` between `L` and `R` process-wide
pub fn register_operator<L: PartialEq<R> + 'static, R: 'static>() {
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register_operator::<L, R>();
    tracing::debug!(
        left = std::any::type_name::<L>(),
        right = std::any::type_name::<R>(),
        "registered equality operator"
    );
}
