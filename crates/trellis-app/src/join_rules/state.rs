//! Observable join-rule screen state.

use trellis_core::{JoinRule, JoinRuleOption, MatrixItem, RoomId};

use crate::Loadable;

/// View state of the join-rule screen.
///
/// Replaced as a whole on every render; observers never see a partially
/// updated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRulesViewState {
    /// Room being edited.
    pub room_id: RoomId,
    /// Initial data has been applied.
    pub initialized: bool,
    /// Rule in effect when the screen opened (or at the last save).
    pub initial_join_rule: JoinRule,
    /// Rule currently selected.
    pub current_join_rule: JoinRule,
    /// Allow list when the screen opened (or at the last save).
    pub initial_allow_list: Vec<MatrixItem>,
    /// Allow list as edited, in display order. Unique by id.
    pub updated_allow_list: Vec<MatrixItem>,
    /// Selectable rules.
    pub choices: Vec<JoinRuleOption>,
    /// Ancestor spaces eligible for the allow list.
    pub possible_space_candidates: Vec<MatrixItem>,
    /// Allow-list entries that are not known ancestor spaces, sorted by id.
    pub unknown_restricted: Vec<MatrixItem>,
    /// Current filter text.
    pub filter: String,
    /// Filter results.
    pub filtered_results: Loadable<Vec<MatrixItem>>,
    /// Current selection differs from the persisted one.
    pub has_unsaved_changes: bool,
    /// A save is in flight.
    pub saving: bool,
}

impl JoinRulesViewState {
    /// Empty state shown before the initial load completes.
    pub fn new(room_id: impl Into<RoomId>) -> Self {
        Self {
            room_id: room_id.into(),
            initialized: false,
            initial_join_rule: JoinRule::Invite,
            current_join_rule: JoinRule::Invite,
            initial_allow_list: Vec::new(),
            updated_allow_list: Vec::new(),
            choices: Vec::new(),
            possible_space_candidates: Vec::new(),
            unknown_restricted: Vec::new(),
            filter: String::new(),
            filtered_results: Loadable::Uninitialized,
            has_unsaved_changes: false,
            saving: false,
        }
    }

    /// The option for the currently selected rule, if offered.
    pub fn current_option(&self) -> Option<&JoinRuleOption> {
        self.choices.iter().find(|option| option.rule == self.current_join_rule)
    }

    /// True if `id` is in the edited allow list.
    pub fn is_allowed(&self, id: &str) -> bool {
        self.updated_allow_list.iter().any(|item| item.id == id)
    }
}
