//! Session overview screen.
//!
//! Shows one of the user's devices and signs it out, pausing for
//! user-interactive auth when the homeserver demands it.

mod action;
mod bridge;
mod screen;

pub use action::{
    SessionOverviewAction, SessionOverviewEvent, SessionOverviewRequest, SessionOverviewViewEvent,
};
pub use bridge::SessionOverviewBridge;
pub use screen::{SessionOverviewScreen, SessionOverviewViewState};
