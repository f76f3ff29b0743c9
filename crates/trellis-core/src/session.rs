//! Boundary to the chat-protocol SDK.
//!
//! The [`Session`] trait is the only way Trellis reads or writes remote state.
//! Implementations wrap a real SDK client in production and an in-memory model
//! in tests. The trait is explicitly passed to every component that needs it;
//! there is no global session.

use std::future::Future;

use serde_json::Value;

use crate::{
    DeviceId, EventId, HomeServerCapabilities, Membership, RoomId, RoomSummary, RoomType,
    SdkError, UserId,
};

/// `m.room.join_rules` event type.
pub const EVENT_TYPE_JOIN_RULES: &str = "m.room.join_rules";

/// `m.room.create` event type.
pub const EVENT_TYPE_ROOM_CREATE: &str = "m.room.create";

/// A room state event.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEvent {
    /// Event id.
    pub event_id: EventId,
    /// Room the event belongs to.
    pub room_id: RoomId,
    /// Event type.
    pub event_type: String,
    /// State key.
    pub state_key: String,
    /// Sender user id.
    pub sender: UserId,
    /// Raw content.
    pub content: Value,
}

/// Selects a state key when reading state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateKeyQuery {
    /// The empty state key.
    Empty,
    /// Exactly this state key.
    Equals(String),
}

impl StateKeyQuery {
    /// True if `state_key` satisfies the query.
    pub fn matches(&self, state_key: &str) -> bool {
        match self {
            Self::Empty => state_key.is_empty(),
            Self::Equals(key) => key == state_key,
        }
    }
}

/// Parameters for searching cached room summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSummaryQuery {
    /// Case-insensitive substring of the display name. `None` matches all.
    pub display_name_contains: Option<String>,
    /// Accepted memberships. Empty accepts any.
    pub memberships: Vec<Membership>,
    /// Required room type. `None` means no type restriction.
    pub room_type: Option<RoomType>,
}

impl RoomSummaryQuery {
    /// Joined rooms of any type whose name contains `text`.
    pub fn joined_with_name(text: impl Into<String>) -> Self {
        Self {
            display_name_contains: Some(text.into()),
            memberships: vec![Membership::Join],
            room_type: None,
        }
    }

    /// True if `summary` satisfies every criterion.
    pub fn matches(&self, summary: &RoomSummary) -> bool {
        let name_ok = self.display_name_contains.as_ref().is_none_or(|needle| {
            summary
                .display_name
                .as_ref()
                .is_some_and(|name| name.to_lowercase().contains(&needle.to_lowercase()))
        });
        let membership_ok =
            self.memberships.is_empty() || self.memberships.contains(&summary.membership);
        let type_ok = self.room_type.is_none_or(|room_type| room_type == summary.room_type);

        name_ok && membership_ok && type_ok
    }
}

/// A device of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device id.
    pub device_id: DeviceId,
    /// User-assigned display name.
    pub display_name: Option<String>,
    /// Last IP address the device was seen from.
    pub last_seen_ip: Option<String>,
    /// Last activity, milliseconds since the Unix epoch.
    pub last_seen_ts: Option<u64>,
}

/// A sequence of stages completing user-interactive auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFlow {
    /// Stage types, e.g. `m.login.password`.
    pub stages: Vec<String>,
}

/// Credentials resuming an interrupted user-interactive auth session.
#[derive(Clone, PartialEq, Eq)]
pub enum UserInteractiveAuth {
    /// Authenticated out-of-band through single sign-on.
    Sso {
        /// UIA session id.
        session: String,
    },
    /// Password authentication.
    Password {
        /// UIA session id.
        session: String,
        /// User authenticating.
        user_id: UserId,
        /// Password. Never printed.
        password: String,
    },
}

impl std::fmt::Debug for UserInteractiveAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sso { session } => f.debug_struct("Sso").field("session", session).finish(),
            Self::Password { session, user_id, .. } => f
                .debug_struct("Password")
                .field("session", session)
                .field("user_id", user_id)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Result of a device sign-out request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignoutOutcome {
    /// Device signed out.
    Done,
    /// Server requires user-interactive auth before signing out.
    ReAuthRequired {
        /// UIA session id to resume.
        session: String,
        /// Flows the server accepts.
        flows: Vec<AuthFlow>,
        /// Error code from a failed previous attempt, if any.
        error_code: Option<String>,
    },
}

/// The external chat-protocol SDK as seen by Trellis.
///
/// Must be Clone (bridges move clones into spawned tasks), Send + Sync, and
/// `'static`. Implementations typically share state via Arc so that clones
/// observe the same session.
///
/// Reads return snapshots taken at call time; nothing here is a live
/// subscription.
pub trait Session: Clone + Send + Sync + 'static {
    /// Signed-in user id.
    fn user_id(&self) -> &str;

    /// Signed-in device id.
    fn device_id(&self) -> &str;

    /// Cached summary of a room. `None` if unknown.
    fn room_summary(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<Option<RoomSummary>, SdkError>> + Send;

    /// Cached summaries matching `query`.
    fn room_summaries(
        &self,
        query: &RoomSummaryQuery,
    ) -> impl Future<Output = Result<Vec<RoomSummary>, SdkError>> + Send;

    /// Current state event of a room. `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::UnknownRoom`] if the room is not known.
    fn state_event(
        &self,
        room_id: &str,
        event_type: &str,
        state_key: &StateKeyQuery,
    ) -> impl Future<Output = Result<Option<StateEvent>, SdkError>> + Send;

    /// Send a state event, returning its id.
    fn send_state_event(
        &self,
        room_id: &str,
        event_type: &str,
        state_key: &str,
        body: Value,
    ) -> impl Future<Output = Result<EventId, SdkError>> + Send;

    /// Homeserver capabilities.
    fn homeserver_capabilities(
        &self,
    ) -> impl Future<Output = Result<HomeServerCapabilities, SdkError>> + Send;

    /// Information about one of the user's devices. `None` if unknown.
    fn device_info(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<DeviceInfo>, SdkError>> + Send;

    /// Sign out a device, optionally resuming an auth session.
    fn sign_out_device(
        &self,
        device_id: &str,
        auth: Option<UserInteractiveAuth>,
    ) -> impl Future<Output = Result<SignoutOutcome, SdkError>> + Send;

    /// Register an HTTP pusher delivering to `endpoint` through `gateway_url`.
    fn register_pusher(
        &self,
        endpoint: &str,
        gateway_url: &str,
    ) -> impl Future<Output = Result<(), SdkError>> + Send;

    /// Remove the pusher for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::NotFound`] if no such pusher exists.
    fn unregister_pusher(&self, endpoint: &str) -> impl Future<Output = Result<(), SdkError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_redacted() {
        let auth = UserInteractiveAuth::Password {
            session: "uia".into(),
            user_id: "@alice:x".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn query_matches_name_case_insensitively() {
        let query = RoomSummaryQuery::joined_with_name("ENG");
        assert!(query.matches(&RoomSummary::room("!a:x", "Engineering")));
        assert!(!query.matches(&RoomSummary::room("!b:x", "Design")));
        assert!(
            !query.matches(
                &RoomSummary::space("!c:x", "engineering").with_membership(Membership::Leave)
            )
        );
    }

    #[test]
    fn joined_query_skips_invites() {
        let query = RoomSummaryQuery::joined_with_name("eng");
        let invited = RoomSummary::room("!i:x", "engineering").with_membership(Membership::Invite);
        assert!(!query.matches(&invited));
    }

    #[test]
    fn query_without_constraints_matches_everything() {
        let query = RoomSummaryQuery::default();
        let mut unnamed = RoomSummary::room("!a:x", "");
        unnamed.display_name = None;
        assert!(query.matches(&unnamed));
    }

    #[test]
    fn state_key_query() {
        assert!(StateKeyQuery::Empty.matches(""));
        assert!(!StateKeyQuery::Empty.matches("@a:x"));
        assert!(StateKeyQuery::Equals("@a:x".into()).matches("@a:x"));
    }
}
