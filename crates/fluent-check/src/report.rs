//! Failure reporting
//!
//! Checks hand their failure message to the reporter on top of a per-thread
//! stack. With an empty stack the [`PanicReporter`] applies and the test
//! fails immediately. [`ReporterScope::collect`] installs a collecting
//! reporter for soft checks:
//!
//! ```ignore
//! let scope = ReporterScope::collect();
//! Check::that(&1).is_equal_to(&2);
//! Check::that(&"a").is_equal_to(&"b");
//! let err = scope.verify().unwrap_err();
//! assert_eq!(err.count, 2);
//! ```
//!
//! Each thread has its own stack, so scopes never leak across tests running
//! in parallel.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::result::CheckError;

/// A single failed check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// Rendered failure message
    pub message: String,
    /// Where the check was written (`file:line`)
    pub location: Option<String>,
}

impl CheckFailure {
    /// Create a failure
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the location of the failure
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Receives the outcome of checks
pub trait Reporter {
    /// A check failed
    fn report_failure(&self, failure: CheckFailure);

    /// A check passed
    fn report_success(&self) {}
}

/// Fails the current test with the message
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn report_failure(&self, failure: CheckFailure) {
        match failure.location {
            Some(location) => panic!("{}\n(at {location})", failure.message),
            None => panic!("{}", failure.message),
        }
    }
}

#[derive(Debug, Default)]
struct Collected {
    failures: Vec<CheckFailure>,
    checks: usize,
}

/// Keeps every failure for later verification
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    state: Rc<RefCell<Collected>>,
}

impl CollectingReporter {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures so far
    #[must_use]
    pub fn failures(&self) -> Vec<CheckFailure> {
        self.state.borrow().failures.clone()
    }

    /// Counts of checks so far
    #[must_use]
    pub fn summary(&self) -> CheckSummary {
        let state = self.state.borrow();
        CheckSummary {
            total: state.checks,
            passed: state.checks - state.failures.len(),
            failed: state.failures.len(),
        }
    }

    /// `Err` listing every failure, if any
    pub fn verify(&self) -> Result<(), SoftCheckError> {
        let state = self.state.borrow();
        if state.failures.is_empty() {
            Ok(())
        } else {
            Err(SoftCheckError::new(&state.failures))
        }
    }

    /// Forget everything collected
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.failures.clear();
        state.checks = 0;
    }
}

impl Reporter for CollectingReporter {
    fn report_failure(&self, failure: CheckFailure) {
        let mut state = self.state.borrow_mut();
        state.checks += 1;
        state.failures.push(failure);
    }

    fn report_success(&self) {
        self.state.borrow_mut().checks += 1;
    }
}

/// Counts of checks seen by a collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Checks performed
    pub total: usize,
    /// Checks that passed
    pub passed: usize,
    /// Checks that failed
    pub failed: usize,
}

thread_local! {
    static STACK: RefCell<Vec<Rc<dyn Reporter>>> = RefCell::new(Vec::new());
}

fn current() -> Option<Rc<dyn Reporter>> {
    STACK.with(|stack| stack.borrow().last().cloned())
}

/// Send a failure to the current reporter
pub fn report_failure(failure: CheckFailure) {
    tracing::debug!(location = failure.location.as_deref(), "check failed");
    match current() {
        Some(reporter) => reporter.report_failure(failure),
        None => PanicReporter.report_failure(failure),
    }
}

/// Tell the current reporter a check passed
pub fn report_success() {
    if let Some(reporter) = current() {
        reporter.report_success();
    }
}

/// Reporter installed on this thread until dropped
#[must_use = "the reporter is removed when the scope is dropped"]
pub struct ReporterScope {
    reporter: Rc<dyn Reporter>,
    collector: Option<CollectingReporter>,
}

impl fmt::Debug for ReporterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterScope")
            .field("collecting", &self.collector.is_some())
            .finish_non_exhaustive()
    }
}

impl ReporterScope {
    /// Install `reporter` on this thread
    pub fn push(reporter: impl Reporter + 'static) -> Self {
        Self::install(Rc::new(reporter), None)
    }

    /// Install a collecting reporter for soft checks
    pub fn collect() -> Self {
        let collector = CollectingReporter::new();
        Self::install(Rc::new(collector.clone()), Some(collector))
    }

    fn install(reporter: Rc<dyn Reporter>, collector: Option<CollectingReporter>) -> Self {
        STACK.with(|stack| stack.borrow_mut().push(Rc::clone(&reporter)));
        Self { reporter, collector }
    }

    /// Collector of this scope, when it was created by [`collect`](Self::collect)
    #[must_use]
    pub const fn collector(&self) -> Option<&CollectingReporter> {
        self.collector.as_ref()
    }

    /// `Err` listing every failure collected by this scope
    pub fn verify(&self) -> Result<(), SoftCheckError> {
        self.collector.as_ref().map_or(Ok(()), CollectingReporter::verify)
    }
}

impl Drop for ReporterScope {
    fn drop(&mut self) {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|r| Rc::ptr_eq(r, &self.reporter)) {
                stack.remove(pos);
            }
        });
    }
}

/// Every failure collected by a soft-check scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftCheckError {
    /// Failure messages in report order
    pub failures: Vec<String>,
    /// Number of failed checks
    pub count: usize,
}

impl SoftCheckError {
    /// Create an error from failures
    #[must_use]
    pub fn new(failures: &[CheckFailure]) -> Self {
        Self {
            failures: failures.iter().map(|f| f.message.clone()).collect(),
            count: failures.len(),
        }
    }
}

impl fmt::Display for SoftCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} check(s) failed:", self.count)?;
        for (i, failure) in self.failures.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, failure.replace('\n', "\n     "))?;
        }
        Ok(())
    }
}

impl std::error::Error for SoftCheckError {}

impl From<SoftCheckError> for CheckError {
    fn from(err: SoftCheckError) -> Self {
        Self::CheckFailed {
            message: err.to_string(),
        }
    }
}
