//! Session overview inputs and outputs.

use trellis_core::{AuthFlow, DeviceId, DeviceInfo, UserInteractiveAuth};

/// User intents accepted by the session overview screen.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionOverviewAction {
    /// Sign out the displayed session.
    SignoutSession,
    /// Single sign-on completed out-of-band.
    SsoAuthDone,
    /// User entered their password.
    PasswordAuthDone(String),
    /// User dismissed the re-auth prompt.
    ReAuthCancelled,
}

impl std::fmt::Debug for SessionOverviewAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignoutSession => f.write_str("SignoutSession"),
            Self::SsoAuthDone => f.write_str("SsoAuthDone"),
            Self::PasswordAuthDone(_) => f.write_str("PasswordAuthDone(<redacted>)"),
            Self::ReAuthCancelled => f.write_str("ReAuthCancelled"),
        }
    }
}

/// Events processed by the session overview screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOverviewEvent {
    /// User intent.
    Action(SessionOverviewAction),

    /// Device details fetched. `None` if the device is unknown.
    DeviceLoaded(Option<DeviceInfo>),

    /// Device signed out.
    SignoutCompleted,

    /// Homeserver requires interactive auth to continue.
    ReAuthRequired {
        /// UIA session id.
        session: String,
        /// Accepted flows.
        flows: Vec<AuthFlow>,
        /// Error code from a failed previous attempt.
        error_code: Option<String>,
    },

    /// Sign-out failed.
    SignoutFailed {
        /// Error description.
        message: String,
    },
}

impl From<SessionOverviewAction> for SessionOverviewEvent {
    fn from(action: SessionOverviewAction) -> Self {
        Self::Action(action)
    }
}

/// SDK work requested by the session overview screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOverviewRequest {
    /// Fetch device details.
    LoadDevice {
        /// Device to fetch.
        device_id: DeviceId,
    },

    /// Sign out a device.
    SignOut {
        /// Device to sign out.
        device_id: DeviceId,
        /// Credentials resuming a pending auth session.
        auth: Option<UserInteractiveAuth>,
    },
}

/// One-shot notifications from the session overview screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOverviewViewEvent {
    /// The displayed session is the current one; the host must run the global
    /// sign-out flow.
    SignoutCurrentSession,

    /// Prompt the user to re-authenticate.
    RequestReAuth {
        /// Accepted flows.
        flows: Vec<AuthFlow>,
        /// Error code from a failed previous attempt.
        error_code: Option<String>,
    },

    /// Device signed out.
    SignoutSuccess,

    /// Sign-out failed.
    SignoutError {
        /// Error description.
        message: String,
    },
}
