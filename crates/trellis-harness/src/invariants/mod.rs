//! Invariant checking for join-rule screens.
//!
//! Invariants are properties that must hold after every transition, whatever
//! sequence of actions and completions led there. They complement example
//! tests by being checked after each step of arbitrary action sequences.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.assert_all(&JoinRulesSnapshot::from_screen(&screen), "after toggle");
//! ```

mod checks;
mod snapshot;

pub use checks::{
    CandidatesUnique, UniqueAllowList, UnknownRestrictedClassified, UnsavedChangesConsistent,
};
pub use snapshot::JoinRulesSnapshot;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against a screen snapshot.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, snapshot: &JoinRulesSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with every join-rule screen invariant.
    ///
    /// Includes:
    /// - [`UniqueAllowList`]: allow list is unique by id
    /// - [`CandidatesUnique`]: candidates are unique by id
    /// - [`UnknownRestrictedClassified`]: unknown entries match classification
    /// - [`UnsavedChangesConsistent`]: unsaved flag matches the selection
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(UniqueAllowList);
        registry.add(CandidatesUnique);
        registry.add(UnknownRestrictedClassified);
        registry.add(UnsavedChangesConsistent);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against a snapshot.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, snapshot: &JoinRulesSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(snapshot).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    ///
    /// # Panics
    ///
    /// Panics if any invariant is violated.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, snapshot: &JoinRulesSnapshot, context: &str) {
        if let Err(violations) = self.check_all(snapshot) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
