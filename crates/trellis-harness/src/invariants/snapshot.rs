//! Observable state snapshots for invariant checking.
//!
//! Invariants operate on snapshots rather than live screens so that a check
//! sees one consistent state.

use trellis_app::{JoinRulesScreen, JoinRulesViewState};
use trellis_core::SpaceClassifier;

/// Snapshot of a join-rule screen.
#[derive(Debug, Clone)]
pub struct JoinRulesSnapshot {
    /// Published view state.
    pub state: JoinRulesViewState,
    /// Classifier the screen uses for allow-list entries.
    pub classifier: SpaceClassifier,
}

impl JoinRulesSnapshot {
    /// Capture the current state of `screen`.
    pub fn from_screen(screen: &JoinRulesScreen) -> Self {
        use trellis_app::Screen;

        Self { state: screen.state().clone(), classifier: screen.classifier().clone() }
    }
}
