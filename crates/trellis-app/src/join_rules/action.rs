//! Join-rule screen inputs and outputs.
//!
//! User intents arrive as [`JoinRulesAction`]s; SDK completions arrive as the
//! remaining [`JoinRulesEvent`] variants. The screen answers with
//! [`JoinRulesRequest`]s for the bridge and [`JoinRulesViewEvent`]s for the UI.

use trellis_core::{
    JoinRule, JoinRulesContent, MatrixItem, RoomCapabilitySupport, RoomId, RoomSummary,
};

/// User intents accepted by the join-rule screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRulesAction {
    /// Narrow the candidate list by display name.
    FilterWith(String),

    /// Add the item to the allow list, or remove it if present.
    ToggleSelection(MatrixItem),

    /// Select a join rule.
    SelectJoinRules(JoinRule),

    /// Persist the selected rule and allow list.
    SaveChanges,
}

/// Data fetched when the screen opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRulesSeed {
    /// Summary of the room being edited.
    pub summary: RoomSummary,
    /// Persisted join rules. Invite with no allow list if no event exists.
    pub content: JoinRulesContent,
    /// Summaries of allow-listed rooms and ancestors that could be resolved.
    pub known_summaries: Vec<RoomSummary>,
    /// Homeserver support for the restricted rule.
    pub restricted_support: RoomCapabilitySupport,
    /// The room's current version supports the restricted rule.
    pub version_supports_restricted: bool,
}

/// Events processed by the join-rule screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRulesEvent {
    /// User intent.
    Action(JoinRulesAction),

    /// Initial data loaded.
    Loaded(Box<JoinRulesSeed>),

    /// Filter results resolved.
    FilterResolved {
        /// Filter request this answers.
        generation: u64,
        /// Matching items.
        results: Vec<MatrixItem>,
    },

    /// Join rules persisted.
    Saved,

    /// Persisting join rules failed.
    SaveFailed {
        /// Error description.
        message: String,
    },
}

impl From<JoinRulesAction> for JoinRulesEvent {
    fn from(action: JoinRulesAction) -> Self {
        Self::Action(action)
    }
}

/// SDK work requested by the join-rule screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRulesRequest {
    /// Fetch summary, join rules, room version and capabilities.
    Load {
        /// Room being edited.
        room_id: RoomId,
    },

    /// Search every joined room and space by display name.
    SearchRooms {
        /// Filter generation to echo back.
        generation: u64,
        /// Display name substring.
        filter: String,
    },

    /// Resolve the room's ancestors and keep those whose name matches.
    ListParentSpaces {
        /// Filter generation to echo back.
        generation: u64,
        /// Room whose ancestors are listed.
        room_id: RoomId,
        /// Display name substring.
        filter: String,
    },

    /// Send the `m.room.join_rules` state event.
    SendJoinRules {
        /// Room being edited.
        room_id: RoomId,
        /// New content.
        content: JoinRulesContent,
    },
}

/// One-shot notifications from the join-rule screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRulesViewEvent {
    /// Changes were saved.
    Saved,

    /// Saving failed; state is unchanged.
    SaveFailed {
        /// Error description.
        message: String,
    },

    /// The selected rule requires upgrading the room first.
    UpgradeRequired {
        /// Rule that triggered the upgrade.
        rule: JoinRule,
    },
}
