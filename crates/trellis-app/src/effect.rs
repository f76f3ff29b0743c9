//! Screen side-effects.
//!
//! This module defines [`Effect`], the instructions a [`crate::Screen`]
//! produces for the [`crate::Runtime`] to execute.

/// Effects produced by screen state machines.
///
/// Generic over the screen's request type `R` and one-shot view event type `V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<R, V> {
    /// Publish the current view state.
    Render,

    /// Deliver a one-shot event to the UI (navigation, toasts, dialogs).
    Emit(V),

    /// Execute a request against the SDK and feed the result back.
    Run(R),
}

impl<R, V> Effect<R, V> {
    /// The request, if this is [`Effect::Run`].
    pub fn as_request(&self) -> Option<&R> {
        match self {
            Self::Run(request) => Some(request),
            Self::Render | Self::Emit(_) => None,
        }
    }

    /// The view event, if this is [`Effect::Emit`].
    pub fn as_view_event(&self) -> Option<&V> {
        match self {
            Self::Emit(event) => Some(event),
            Self::Render | Self::Run(_) => None,
        }
    }
}
