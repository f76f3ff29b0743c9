//! Restricted join-rule screen.
//!
//! Lets the user pick a join rule and, for restricted rooms, edit the list of
//! spaces whose members may join.

mod action;
mod bridge;
mod screen;
mod state;

pub use action::{JoinRulesAction, JoinRulesEvent, JoinRulesRequest, JoinRulesSeed, JoinRulesViewEvent};
pub use bridge::JoinRulesBridge;
pub use screen::JoinRulesScreen;
pub use state::JoinRulesViewState;
