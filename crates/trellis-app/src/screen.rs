//! Screen state machine abstraction.
//!
//! The [`Screen`] trait lets one generic [`crate::Runtime`] drive every screen.
//! Implementations are pure: they consume events and produce
//! [`crate::Effect`]s, never touching the SDK directly.

use crate::Effect;

/// A pure per-screen state machine.
///
/// # Associated Types
///
/// - [`Action`](Screen::Action): Closed set of UI intents
/// - [`Event`](Screen::Event): Every input, i.e. actions plus SDK completions
/// - [`Request`](Screen::Request): SDK work the runtime should perform
/// - [`ViewEvent`](Screen::ViewEvent): One-shot notifications for the UI
/// - [`State`](Screen::State): Observable view state, replaced atomically
pub trait Screen: Send + 'static {
    /// UI intents.
    type Action: Send + 'static;
    /// All inputs.
    type Event: From<Self::Action> + Send + 'static;
    /// SDK work.
    type Request: Send + 'static;
    /// One-shot UI notifications.
    type ViewEvent: Send + 'static;
    /// Observable state.
    type State: Clone + Send + Sync + 'static;

    /// Effects to run when the screen opens.
    fn initialize(&mut self) -> Vec<Effect<Self::Request, Self::ViewEvent>>;

    /// Process an event and return effects.
    fn handle(&mut self, event: Self::Event) -> Vec<Effect<Self::Request, Self::ViewEvent>>;

    /// Current view state.
    fn state(&self) -> &Self::State;
}
