//! Application layer for Trellis
//!
//! Pure screen state machines plus a generic runtime that serializes every
//! state transition of a screen onto one task.
//!
//! # Components
//!
//! - [`JoinRulesScreen`]: Restricted join-rule selection and allow-list editing
//! - [`SessionOverviewScreen`]: Device details and sign-out with re-auth
//! - [`Bridge`]: Executes screen requests against a [`trellis_core::Session`]
//! - [`Runtime`]: Serialized event loop publishing view state
//! - [`pause_voice_broadcast`]: Voice broadcast pause use case
//! - [`PushReceiver`]: Push delivery callbacks

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bridge;
mod config;
mod effect;
mod join_rules;
mod loadable;
mod push;
mod runtime;
mod screen;
mod session_overview;
mod voice_broadcast;

pub use bridge::Bridge;
pub use config::{Preferences, PushConfig};
pub use effect::Effect;
pub use join_rules::{
    JoinRulesAction, JoinRulesBridge, JoinRulesEvent, JoinRulesRequest, JoinRulesScreen,
    JoinRulesSeed, JoinRulesViewEvent, JoinRulesViewState,
};
pub use loadable::Loadable;
pub use push::{
    BackgroundSyncMode, PushData, PushError, PushHandler, PushReceiver, parse_push_data,
};
pub use runtime::{Runtime, ScreenHandle};
pub use screen::Screen;
pub use session_overview::{
    SessionOverviewAction, SessionOverviewBridge, SessionOverviewEvent, SessionOverviewRequest,
    SessionOverviewScreen, SessionOverviewViewEvent, SessionOverviewViewState,
};
pub use voice_broadcast::{
    PauseOutcome, VOICE_BROADCAST_INFO_EVENT_TYPE, VoiceBroadcastRecorder, VoiceBroadcastState,
    pause_voice_broadcast,
};
