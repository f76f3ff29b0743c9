//! Fuzz target for the join-rule screen reducer
//!
//! Drives a loaded screen with arbitrary user actions and completions,
//! including stale filter generations and completions nobody asked for.
//!
//! # Invariants
//!
//! - Every invariant in the standard registry holds after each step
//! - `has_unsaved_changes` never flips without a state-changing input

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use trellis_app::{
    JoinRulesAction, JoinRulesEvent, JoinRulesScreen, JoinRulesSeed, Preferences, Screen,
};
use trellis_core::{JoinRule, JoinRulesContent, MatrixItem, RoomCapabilitySupport};
use trellis_harness::{InvariantRegistry, JoinRulesSnapshot, SpaceTree, fixtures::ROOM_ID};

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    rule: u8,
    allow: Vec<u8>,
    support: u8,
    version_supports_restricted: bool,
    labs: bool,
    developer_mode: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Arbitrary)]
enum Step {
    Toggle(u8),
    Select(u8),
    Filter(String),
    Save,
    Saved,
    SaveFailed,
    FilterResolved { generation: u64, hits: Vec<u8> },
}

fn rule(choice: u8) -> JoinRule {
    match choice % 3 {
        0 => JoinRule::Invite,
        1 => JoinRule::Restricted,
        _ => JoinRule::Public,
    }
}

fn candidate(choice: u8) -> &'static str {
    let ids = SpaceTree::allow_candidates();
    ids[usize::from(choice) % ids.len()]
}

fuzz_target!(|scenario: Scenario| {
    let tree = SpaceTree::new();
    let content = match rule(scenario.rule) {
        JoinRule::Restricted => {
            JoinRulesContent::restricted(scenario.allow.iter().map(|c| candidate(*c).to_string()))
        },
        other => JoinRulesContent::new(other),
    };
    let support = match scenario.support % 3 {
        0 => RoomCapabilitySupport::Unsupported,
        1 => RoomCapabilitySupport::SupportedUnstable,
        _ => RoomCapabilitySupport::Supported,
    };
    let preferences = Preferences {
        labs_use_experimental_restricted: scenario.labs,
        developer_mode: scenario.developer_mode,
    };

    let mut screen = JoinRulesScreen::new(ROOM_ID, preferences);
    screen.initialize();
    screen.handle(JoinRulesEvent::Loaded(Box::new(JoinRulesSeed {
        summary: tree.room,
        content,
        known_summaries: tree.others,
        restricted_support: support,
        version_supports_restricted: scenario.version_supports_restricted,
    })));

    let registry = InvariantRegistry::standard();
    if let Err(violations) = registry.check_all(&JoinRulesSnapshot::from_screen(&screen)) {
        panic!("after load: {violations:?}");
    }

    for step in scenario.steps.into_iter().take(64) {
        let before = screen.state().has_unsaved_changes;
        let changes_state = matches!(step, Step::Toggle(_) | Step::Select(_) | Step::Saved);

        match step {
            Step::Toggle(c) => {
                let item = screen.classifier().resolve(candidate(c));
                screen.dispatch(JoinRulesAction::ToggleSelection(item));
            },
            Step::Select(r) => {
                screen.dispatch(JoinRulesAction::SelectJoinRules(rule(r)));
            },
            Step::Filter(text) => {
                screen.dispatch(JoinRulesAction::FilterWith(text));
            },
            Step::Save => {
                screen.dispatch(JoinRulesAction::SaveChanges);
            },
            Step::Saved => {
                screen.handle(JoinRulesEvent::Saved);
            },
            Step::SaveFailed => {
                screen.handle(JoinRulesEvent::SaveFailed { message: "fuzz".into() });
            },
            Step::FilterResolved { generation, hits } => {
                let results = hits.iter().map(|c| MatrixItem::space(candidate(*c), "hit")).collect();
                screen.handle(JoinRulesEvent::FilterResolved { generation, results });
            },
        }

        if !changes_state {
            assert_eq!(screen.state().has_unsaved_changes, before);
        }
        if let Err(violations) = registry.check_all(&JoinRulesSnapshot::from_screen(&screen)) {
            panic!("{violations:?}");
        }
    }
});
