//! Standard invariant checks.

use std::collections::HashSet;

use trellis_core::{JoinRule, MatrixItem};

use super::{Invariant, InvariantResult, JoinRulesSnapshot, Violation};

/// The edited allow list never holds two entries with the same id.
pub struct UniqueAllowList;

impl Invariant for UniqueAllowList {
    fn name(&self) -> &'static str {
        "unique_allow_list"
    }

    fn check(&self, snapshot: &JoinRulesSnapshot) -> InvariantResult {
        match first_duplicate(&snapshot.state.updated_allow_list) {
            Some(id) => Err(Violation {
                invariant: self.name(),
                message: format!("{id} appears more than once in the allow list"),
            }),
            None => Ok(()),
        }
    }
}

/// Ancestor candidates are listed once each.
pub struct CandidatesUnique;

impl Invariant for CandidatesUnique {
    fn name(&self) -> &'static str {
        "candidates_unique"
    }

    fn check(&self, snapshot: &JoinRulesSnapshot) -> InvariantResult {
        match first_duplicate(&snapshot.state.possible_space_candidates) {
            Some(id) => Err(Violation {
                invariant: self.name(),
                message: format!("candidate {id} listed more than once"),
            }),
            None => Ok(()),
        }
    }
}

/// The unknown entries are exactly the initial and edited allow-list members
/// that are not known ancestor spaces, sorted by id.
pub struct UnknownRestrictedClassified;

impl Invariant for UnknownRestrictedClassified {
    fn name(&self) -> &'static str {
        "unknown_restricted_classified"
    }

    fn check(&self, snapshot: &JoinRulesSnapshot) -> InvariantResult {
        let state = &snapshot.state;
        if !state.initialized {
            return Ok(());
        }

        let classifier = &snapshot.classifier;
        let initial: Vec<MatrixItem> =
            state.initial_allow_list.iter().map(|item| classifier.resolve(&item.id)).collect();
        let unknown = classifier.unknown_entries(initial.iter().chain(&state.updated_allow_list));
        let expected: Vec<&str> = unknown.iter().map(|item| item.id.as_str()).collect();
        let actual: Vec<&str> = state.unknown_restricted.iter().map(|i| i.id.as_str()).collect();

        if expected == actual {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!("expected {expected:?}, published {actual:?}"),
            })
        }
    }
}

/// The unsaved-changes flag matches the difference between the initial and
/// current selection.
pub struct UnsavedChangesConsistent;

impl Invariant for UnsavedChangesConsistent {
    fn name(&self) -> &'static str {
        "unsaved_changes_consistent"
    }

    fn check(&self, snapshot: &JoinRulesSnapshot) -> InvariantResult {
        let state = &snapshot.state;
        let ids = |items: &[MatrixItem]| -> HashSet<String> {
            items.iter().map(|item| item.id.clone()).collect()
        };

        let expected = state.current_join_rule != state.initial_join_rule
            || (state.current_join_rule == JoinRule::Restricted
                && ids(&state.initial_allow_list) != ids(&state.updated_allow_list));

        if state.has_unsaved_changes == expected {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!(
                    "flag is {} but rule {} -> {} with {} -> {} allowed entries",
                    state.has_unsaved_changes,
                    state.initial_join_rule,
                    state.current_join_rule,
                    state.initial_allow_list.len(),
                    state.updated_allow_list.len()
                ),
            })
        }
    }
}

fn first_duplicate(items: &[MatrixItem]) -> Option<&str> {
    let mut seen = HashSet::new();
    items.iter().map(|item| item.id.as_str()).find(|id| !seen.insert(*id))
}
