//! Join-rule screen state machine.
//!
//! This module defines [`JoinRulesScreen`], which manages the rule selection
//! and allow-list editing for one room, completely decoupled from the SDK.
//!
//! # Responsibilities
//!
//! - Applies the initial seed as a single state replacement.
//! - Tracks the edited allow list and which entries are not known ancestor
//!   spaces.
//! - Derives the unsaved-changes flag after every mutation.
//! - Requests filter results and ignores answers to superseded filters.

use std::collections::HashSet;

use trellis_core::{
    JoinRule, JoinRulesContent, MatrixItem, RoomId, SpaceClassifier, resolve_join_rules,
};

use super::{
    JoinRulesAction, JoinRulesEvent, JoinRulesRequest, JoinRulesSeed, JoinRulesViewEvent,
    JoinRulesViewState,
};
use crate::{Effect, Loadable, Preferences, Screen};

type JoinRulesEffect = Effect<JoinRulesRequest, JoinRulesViewEvent>;

/// Join-rule screen state machine.
///
/// Pure state machine that processes events and produces effects.
/// No SDK dependencies - fully testable without a runtime.
#[derive(Debug, Clone)]
pub struct JoinRulesScreen {
    /// Observable state.
    state: JoinRulesViewState,
    /// Preferences captured when the screen opened.
    preferences: Preferences,
    /// Summaries captured by the initial load.
    classifier: SpaceClassifier,
    /// Generation of the latest filter request.
    filter_generation: u64,
}

impl JoinRulesScreen {
    /// Create a screen for `room_id`.
    pub fn new(room_id: impl Into<RoomId>, preferences: Preferences) -> Self {
        Self {
            state: JoinRulesViewState::new(room_id),
            preferences,
            classifier: SpaceClassifier::default(),
            filter_generation: 0,
        }
    }

    /// Process a user intent.
    pub fn dispatch(&mut self, action: JoinRulesAction) -> Vec<JoinRulesEffect> {
        match action {
            JoinRulesAction::FilterWith(filter) => self.filter_with(filter),
            JoinRulesAction::ToggleSelection(item) => self.toggle_selection(item),
            JoinRulesAction::SelectJoinRules(rule) => self.select_join_rules(rule),
            JoinRulesAction::SaveChanges => self.save_changes(),
        }
    }

    /// Narrow the candidate list.
    ///
    /// In developer mode every joined room is searched with the new filter.
    /// Otherwise the room's ancestors are filtered locally using the filter
    /// text that was current *before* this call.
    pub fn filter_with(&mut self, filter: String) -> Vec<JoinRulesEffect> {
        let previous = std::mem::replace(&mut self.state.filter, filter.clone());
        self.state.filtered_results = Loadable::Loading;
        self.filter_generation += 1;

        let generation = self.filter_generation;
        let request = if self.preferences.developer_mode {
            JoinRulesRequest::SearchRooms { generation, filter }
        } else {
            JoinRulesRequest::ListParentSpaces {
                generation,
                room_id: self.state.room_id.clone(),
                filter: previous,
            }
        };

        vec![Effect::Render, Effect::Run(request)]
    }

    /// Add `item` to the allow list, or remove every entry with its id.
    pub fn toggle_selection(&mut self, item: MatrixItem) -> Vec<JoinRulesEffect> {
        let allow_list = &mut self.state.updated_allow_list;
        if allow_list.contains(&item) {
            allow_list.retain(|entry| entry.id != item.id);
        } else {
            allow_list.push(item);
        }

        self.refresh_unknown_restricted();
        self.recompute_unsaved_changes();
        vec![Effect::Render]
    }

    /// Select a join rule.
    pub fn select_join_rules(&mut self, rule: JoinRule) -> Vec<JoinRulesEffect> {
        self.state.current_join_rule = rule;
        self.recompute_unsaved_changes();
        vec![Effect::Render]
    }

    /// Persist the selection.
    ///
    /// Does nothing before the initial load, while a save is in flight, or
    /// when nothing changed. A restricted selection that needs a room upgrade
    /// is not sent; the UI is asked to start the upgrade instead.
    pub fn save_changes(&mut self) -> Vec<JoinRulesEffect> {
        if !self.state.initialized || self.state.saving || !self.state.has_unsaved_changes {
            return vec![];
        }

        let rule = self.state.current_join_rule;
        if self.state.current_option().is_some_and(|option| option.needs_upgrade) {
            return vec![Effect::Emit(JoinRulesViewEvent::UpgradeRequired { rule })];
        }

        let content = if rule == JoinRule::Restricted {
            JoinRulesContent::restricted(self.state.updated_allow_list.iter().map(|i| i.id.clone()))
        } else {
            JoinRulesContent::new(rule)
        };

        self.state.saving = true;
        vec![
            Effect::Render,
            Effect::Run(JoinRulesRequest::SendJoinRules {
                room_id: self.state.room_id.clone(),
                content,
            }),
        ]
    }

    fn apply_seed(&mut self, seed: JoinRulesSeed) -> Vec<JoinRulesEffect> {
        let JoinRulesSeed {
            summary,
            content,
            known_summaries,
            restricted_support,
            version_supports_restricted,
        } = seed;

        let classifier =
            SpaceClassifier::new(summary.flattened_parent_ids.iter().cloned(), known_summaries);
        let resolution = resolve_join_rules(
            content.join_rule,
            restricted_support,
            version_supports_restricted,
            self.preferences.labs_use_experimental_restricted,
        );

        let mut seen = HashSet::new();
        let allow_list: Vec<MatrixItem> = content
            .allowed_room_ids()
            .filter(|id| seen.insert(*id))
            .map(|id| classifier.resolve(id))
            .collect();

        let mut candidates: Vec<MatrixItem> = allow_list
            .iter()
            .filter(|item| classifier.is_known_parent_space(&item.id))
            .cloned()
            .collect();
        for parent_id in &summary.flattened_parent_ids {
            if let Some(parent) = classifier.summary(parent_id) {
                let item = parent.to_matrix_item();
                if !candidates.contains(&item) {
                    candidates.push(item);
                }
            }
        }

        let unknown_restricted = classifier.unknown_entries(&allow_list);

        tracing::debug!(
            room_id = %self.state.room_id,
            rule = %resolution.effective_rule,
            allowed = allow_list.len(),
            unknown = unknown_restricted.len(),
            "join rules loaded"
        );

        self.classifier = classifier;
        self.state = JoinRulesViewState {
            room_id: self.state.room_id.clone(),
            initialized: true,
            initial_join_rule: resolution.effective_rule,
            current_join_rule: resolution.effective_rule,
            initial_allow_list: allow_list.clone(),
            updated_allow_list: allow_list,
            choices: resolution.choices,
            possible_space_candidates: candidates,
            unknown_restricted,
            filter: std::mem::take(&mut self.state.filter),
            filtered_results: std::mem::take(&mut self.state.filtered_results),
            has_unsaved_changes: false,
            saving: false,
        };

        vec![Effect::Render]
    }

    fn apply_filter_results(
        &mut self,
        generation: u64,
        results: Vec<MatrixItem>,
    ) -> Vec<JoinRulesEffect> {
        if generation != self.filter_generation {
            tracing::debug!(generation, latest = self.filter_generation, "dropping stale filter");
            return vec![];
        }

        self.state.filtered_results = Loadable::Success(results);
        vec![Effect::Render]
    }

    fn apply_saved(&mut self) -> Vec<JoinRulesEffect> {
        self.state.saving = false;
        self.state.initial_join_rule = self.state.current_join_rule;
        self.state.initial_allow_list = self.state.updated_allow_list.clone();

        self.refresh_unknown_restricted();
        self.recompute_unsaved_changes();
        vec![Effect::Render, Effect::Emit(JoinRulesViewEvent::Saved)]
    }

    fn apply_save_failed(&mut self, message: String) -> Vec<JoinRulesEffect> {
        tracing::warn!(room_id = %self.state.room_id, %message, "saving join rules failed");
        self.state.saving = false;
        vec![Effect::Render, Effect::Emit(JoinRulesViewEvent::SaveFailed { message })]
    }

    /// Re-classify the union of the initial (re-resolved) and edited lists.
    fn refresh_unknown_restricted(&mut self) {
        let initial: Vec<MatrixItem> = self
            .state
            .initial_allow_list
            .iter()
            .map(|item| self.classifier.resolve(&item.id))
            .collect();

        self.state.unknown_restricted =
            self.classifier.unknown_entries(initial.iter().chain(&self.state.updated_allow_list));
    }

    fn recompute_unsaved_changes(&mut self) {
        let state = &mut self.state;
        state.has_unsaved_changes = if state.current_join_rule != state.initial_join_rule {
            true
        } else if state.current_join_rule == JoinRule::Restricted {
            id_set(&state.initial_allow_list) != id_set(&state.updated_allow_list)
        } else {
            false
        };
    }

    /// Classifier built from the initial load.
    pub fn classifier(&self) -> &SpaceClassifier {
        &self.classifier
    }

    /// Preferences in effect.
    pub fn preferences(&self) -> Preferences {
        self.preferences
    }
}

impl Screen for JoinRulesScreen {
    type Action = JoinRulesAction;
    type Event = JoinRulesEvent;
    type Request = JoinRulesRequest;
    type ViewEvent = JoinRulesViewEvent;
    type State = JoinRulesViewState;

    fn initialize(&mut self) -> Vec<JoinRulesEffect> {
        vec![Effect::Run(JoinRulesRequest::Load { room_id: self.state.room_id.clone() })]
    }

    fn handle(&mut self, event: JoinRulesEvent) -> Vec<JoinRulesEffect> {
        match event {
            JoinRulesEvent::Action(action) => self.dispatch(action),
            JoinRulesEvent::Loaded(seed) => self.apply_seed(*seed),
            JoinRulesEvent::FilterResolved { generation, results } => {
                self.apply_filter_results(generation, results)
            },
            JoinRulesEvent::Saved => self.apply_saved(),
            JoinRulesEvent::SaveFailed { message } => self.apply_save_failed(message),
        }
    }

    fn state(&self) -> &JoinRulesViewState {
        &self.state
    }
}

fn id_set(items: &[MatrixItem]) -> HashSet<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use trellis_core::{JoinRuleOption, MatrixItemKind, RoomCapabilitySupport, RoomSummary};

    use super::*;

    const ROOM: &str = "!room:x";

    fn seed(content: JoinRulesContent) -> JoinRulesSeed {
        JoinRulesSeed {
            summary: RoomSummary::room(ROOM, "Room").with_parents(["!parent:x", "!grand:x"]),
            content,
            known_summaries: vec![
                RoomSummary::space("!parent:x", "Parent"),
                RoomSummary::space("!grand:x", "Grandparent"),
                RoomSummary::space("!other:x", "Other space"),
            ],
            restricted_support: RoomCapabilitySupport::Supported,
            version_supports_restricted: true,
        }
    }

    fn loaded(content: JoinRulesContent) -> JoinRulesScreen {
        let mut screen = JoinRulesScreen::new(ROOM, Preferences::default());
        let _ = screen.handle(JoinRulesEvent::Loaded(Box::new(seed(content))));
        screen
    }

    fn ids(items: &[MatrixItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn initialize_requests_load() {
        let mut screen = JoinRulesScreen::new(ROOM, Preferences::default());
        assert_eq!(screen.initialize(), [Effect::Run(JoinRulesRequest::Load {
            room_id: ROOM.into()
        })]);
        assert!(!screen.state().initialized);
    }

    #[test]
    fn seed_partitions_allow_list() {
        let screen = loaded(JoinRulesContent::restricted(["!grand:x", "!other:x", "!ghost:x"]));
        let state = screen.state();

        assert!(state.initialized);
        assert_eq!(state.current_join_rule, JoinRule::Restricted);
        assert_eq!(ids(&state.updated_allow_list), ["!grand:x", "!other:x", "!ghost:x"]);
        assert_eq!(ids(&state.unknown_restricted), ["!ghost:x", "!other:x"]);
        assert_eq!(state.updated_allow_list[2].kind, MatrixItemKind::UnknownRoom);
        assert!(!state.has_unsaved_changes);
    }

    #[test]
    fn candidates_list_allowed_ancestors_first() {
        let screen = loaded(JoinRulesContent::restricted(["!grand:x"]));
        assert_eq!(ids(&screen.state().possible_space_candidates), ["!grand:x", "!parent:x"]);
    }

    #[test]
    fn duplicate_allow_entries_collapse_on_load() {
        let screen = loaded(JoinRulesContent::restricted(["!parent:x", "!parent:x"]));
        assert_eq!(ids(&screen.state().updated_allow_list), ["!parent:x"]);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut screen = loaded(JoinRulesContent::restricted(["!parent:x"]));

        let _ = screen.toggle_selection(MatrixItem::space("!grand:x", "Grandparent"));
        assert_eq!(ids(&screen.state().updated_allow_list), ["!parent:x", "!grand:x"]);
        assert!(screen.state().has_unsaved_changes);

        let _ = screen.toggle_selection(MatrixItem::space("!grand:x", "Grandparent"));
        assert_eq!(ids(&screen.state().updated_allow_list), ["!parent:x"]);
        assert!(!screen.state().has_unsaved_changes);
    }

    #[test]
    fn toggled_non_ancestor_is_unknown() {
        let mut screen = loaded(JoinRulesContent::restricted(["!parent:x"]));
        let _ = screen.toggle_selection(MatrixItem::space("!other:x", "Other space"));
        assert_eq!(ids(&screen.state().unknown_restricted), ["!other:x"]);
    }

    #[test]
    fn removed_initial_unknown_entry_stays_listed() {
        let mut screen = loaded(JoinRulesContent::restricted(["!ghost:x"]));
        let _ = screen.toggle_selection(MatrixItem::unknown_room("!ghost:x"));
        assert!(screen.state().updated_allow_list.is_empty());
        assert_eq!(ids(&screen.state().unknown_restricted), ["!ghost:x"]);
    }

    #[test]
    fn reordered_allow_list_is_not_a_change() {
        let mut screen = loaded(JoinRulesContent::restricted(["!parent:x", "!grand:x"]));
        let _ = screen.toggle_selection(MatrixItem::space("!parent:x", "Parent"));
        let _ = screen.toggle_selection(MatrixItem::space("!parent:x", "Parent"));

        assert_eq!(ids(&screen.state().updated_allow_list), ["!grand:x", "!parent:x"]);
        assert!(!screen.state().has_unsaved_changes);
    }

    #[test]
    fn allow_list_edits_ignored_unless_restricted() {
        let mut screen = loaded(JoinRulesContent::new(JoinRule::Public));
        let _ = screen.toggle_selection(MatrixItem::space("!parent:x", "Parent"));
        assert!(!screen.state().has_unsaved_changes);

        let _ = screen.select_join_rules(JoinRule::Invite);
        assert!(screen.state().has_unsaved_changes);

        let _ = screen.select_join_rules(JoinRule::Public);
        assert!(!screen.state().has_unsaved_changes);
    }

    #[test]
    fn unsupported_restricted_downgrades_to_invite() {
        let mut screen = JoinRulesScreen::new(ROOM, Preferences::default());
        let mut seed = seed(JoinRulesContent::restricted(["!parent:x"]));
        seed.restricted_support = RoomCapabilitySupport::SupportedUnstable;
        seed.version_supports_restricted = false;
        let _ = screen.handle(JoinRulesEvent::Loaded(Box::new(seed)));

        let state = screen.state();
        assert_eq!(state.initial_join_rule, JoinRule::Invite);
        assert_eq!(state.choices, [
            JoinRuleOption::direct(JoinRule::Invite),
            JoinRuleOption::direct(JoinRule::Public),
        ]);
    }

    #[test]
    fn developer_mode_searches_with_new_filter() {
        let prefs = Preferences { developer_mode: true, ..Preferences::default() };
        let mut screen = JoinRulesScreen::new(ROOM, prefs);

        let effects = screen.filter_with("eng".into());
        assert!(screen.state().filtered_results.is_loading());
        assert!(matches!(effects.as_slice(), [
            Effect::Render,
            Effect::Run(JoinRulesRequest::SearchRooms { generation: 1, filter })
        ] if filter == "eng"));
    }

    #[test]
    fn parent_filter_uses_previous_text() {
        let mut screen = loaded(JoinRulesContent::new(JoinRule::Invite));

        let effects = screen.filter_with("par".into());
        assert!(matches!(effects.as_slice(), [
            Effect::Render,
            Effect::Run(JoinRulesRequest::ListParentSpaces { filter, .. })
        ] if filter.is_empty()));

        let effects = screen.filter_with("grand".into());
        assert!(matches!(effects.as_slice(), [
            Effect::Render,
            Effect::Run(JoinRulesRequest::ListParentSpaces { generation: 2, filter, .. })
        ] if filter == "par"));
        assert_eq!(screen.state().filter, "grand");
    }

    #[test]
    fn stale_filter_results_are_dropped() {
        let mut screen = loaded(JoinRulesContent::new(JoinRule::Invite));
        let _ = screen.filter_with("a".into());
        let _ = screen.filter_with("b".into());

        let effects = screen.handle(JoinRulesEvent::FilterResolved {
            generation: 1,
            results: vec![MatrixItem::space("!parent:x", "Parent")],
        });
        assert!(effects.is_empty());
        assert!(screen.state().filtered_results.is_loading());

        let _ = screen.handle(JoinRulesEvent::FilterResolved { generation: 2, results: vec![] });
        assert_eq!(screen.state().filtered_results, Loadable::Success(vec![]));
    }

    #[test]
    fn save_sends_restricted_content() {
        let mut screen = loaded(JoinRulesContent::restricted(["!parent:x"]));
        let _ = screen.toggle_selection(MatrixItem::space("!grand:x", "Grandparent"));

        let effects = screen.save_changes();
        assert!(screen.state().saving);
        assert_eq!(effects, [
            Effect::Render,
            Effect::Run(JoinRulesRequest::SendJoinRules {
                room_id: ROOM.into(),
                content: JoinRulesContent::restricted(["!parent:x", "!grand:x"]),
            }),
        ]);

        // A second save while in flight is ignored
        assert!(screen.save_changes().is_empty());
    }

    #[test]
    fn save_without_changes_is_noop() {
        let mut screen = loaded(JoinRulesContent::new(JoinRule::Invite));
        assert!(screen.save_changes().is_empty());
    }

    #[test]
    fn saved_commits_selection() {
        let mut screen = loaded(JoinRulesContent::new(JoinRule::Invite));
        let _ = screen.select_join_rules(JoinRule::Restricted);
        let _ = screen.toggle_selection(MatrixItem::space("!parent:x", "Parent"));
        let _ = screen.save_changes();

        let effects = screen.handle(JoinRulesEvent::Saved);
        assert_eq!(effects, [Effect::Render, Effect::Emit(JoinRulesViewEvent::Saved)]);

        let state = screen.state();
        assert!(!state.saving);
        assert!(!state.has_unsaved_changes);
        assert_eq!(state.initial_join_rule, JoinRule::Restricted);
        assert_eq!(ids(&state.initial_allow_list), ["!parent:x"]);
    }

    #[test]
    fn save_failure_keeps_selection() {
        let mut screen = loaded(JoinRulesContent::new(JoinRule::Invite));
        let _ = screen.select_join_rules(JoinRule::Public);
        let _ = screen.save_changes();

        let effects = screen.handle(JoinRulesEvent::SaveFailed { message: "M_FORBIDDEN".into() });
        assert!(matches!(effects.as_slice(), [
            Effect::Render,
            Effect::Emit(JoinRulesViewEvent::SaveFailed { .. })
        ]));
        assert!(screen.state().has_unsaved_changes);
        assert_eq!(screen.state().current_join_rule, JoinRule::Public);
        assert_eq!(screen.state().initial_join_rule, JoinRule::Invite);
    }

    #[test]
    fn restricted_needing_upgrade_asks_for_upgrade() {
        let prefs = Preferences { labs_use_experimental_restricted: true, ..Preferences::default() };
        let mut screen = JoinRulesScreen::new(ROOM, prefs);
        let mut seed = seed(JoinRulesContent::new(JoinRule::Invite));
        seed.restricted_support = RoomCapabilitySupport::SupportedUnstable;
        seed.version_supports_restricted = false;
        let _ = screen.handle(JoinRulesEvent::Loaded(Box::new(seed)));

        let _ = screen.select_join_rules(JoinRule::Restricted);
        let effects = screen.save_changes();
        assert_eq!(effects, [Effect::Emit(JoinRulesViewEvent::UpgradeRequired {
            rule: JoinRule::Restricted
        })]);
        assert!(!screen.state().saving);
    }

    #[test]
    fn save_before_load_is_noop() {
        let mut screen = JoinRulesScreen::new(ROOM, Preferences::default());
        let _ = screen.select_join_rules(JoinRule::Public);
        assert!(screen.save_changes().is_empty());
    }
}
