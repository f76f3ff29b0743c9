#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

//! In-memory [`Session`] for tests and the CLI.
//!
//! Every method completes immediately. Behaviour that depends on the
//! homeserver (user-interactive auth, failures) is scripted through builder
//! and setter methods.

use std::{
    collections::{BTreeMap, HashMap},
    future::{Future, ready},
    sync::{Arc, Mutex},
};

use serde_json::Value;
use trellis_core::{
    AuthFlow, DeviceInfo, EventId, HomeServerCapabilities, RoomId, RoomSummary, RoomSummaryQuery,
    SdkError, Session, SignoutOutcome, StateEvent, StateKeyQuery, UserInteractiveAuth,
};

/// Session operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOp {
    /// [`Session::room_summary`]
    RoomSummary,
    /// [`Session::room_summaries`]
    RoomSummaries,
    /// [`Session::state_event`]
    StateEvent,
    /// [`Session::send_state_event`]
    SendStateEvent,
    /// [`Session::homeserver_capabilities`]
    Capabilities,
    /// [`Session::device_info`]
    DeviceInfo,
    /// [`Session::sign_out_device`]
    SignOut,
    /// [`Session::register_pusher`]
    RegisterPusher,
    /// [`Session::unregister_pusher`]
    UnregisterPusher,
}

/// Credentials the scripted server demands before signing out a device.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReAuthPolicy {
    None,
    Password(String),
    Sso,
}

/// In-memory session.
///
/// All state is wrapped in `Arc<Mutex<>>` so clones observe the same session.
/// Uses `lock().expect()`, which panics if the mutex is poisoned; acceptable
/// for test and demo code.
#[derive(Clone)]
pub struct MemorySession {
    user_id: Arc<str>,
    device_id: Arc<str>,
    inner: Arc<Mutex<MemorySessionInner>>,
}

struct MemorySessionInner {
    summaries: BTreeMap<RoomId, RoomSummary>,
    /// Current state, keyed by room and event type, then by state key.
    state: HashMap<(RoomId, String), BTreeMap<String, StateEvent>>,
    /// Every event sent through this session, in order.
    sent: Vec<StateEvent>,
    capabilities: HomeServerCapabilities,
    devices: BTreeMap<String, DeviceInfo>,
    reauth: ReAuthPolicy,
    /// UIA session issued by the last sign-out attempt.
    uia_session: Option<String>,
    /// Registered pushers, endpoint to gateway.
    pushers: BTreeMap<String, String>,
    failures: HashMap<SessionOp, SdkError>,
    next_id: u64,
}

impl MemorySession {
    /// Create an empty session for `user_id` on `device_id`.
    pub fn new(user_id: &str, device_id: &str) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
            inner: Arc::new(Mutex::new(MemorySessionInner {
                summaries: BTreeMap::new(),
                state: HashMap::new(),
                sent: Vec::new(),
                capabilities: HomeServerCapabilities::default(),
                devices: BTreeMap::new(),
                reauth: ReAuthPolicy::None,
                uia_session: None,
                pushers: BTreeMap::new(),
                failures: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    fn with<T>(&self, f: impl FnOnce(&mut MemorySessionInner) -> T) -> T {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        f(&mut inner)
    }

    /// Add or replace a room summary.
    #[must_use]
    pub fn with_summary(self, summary: RoomSummary) -> Self {
        self.insert_summary(summary);
        self
    }

    /// Add or replace a room summary in place.
    pub fn insert_summary(&self, summary: RoomSummary) {
        self.with(|inner| inner.summaries.insert(summary.room_id.clone(), summary));
    }

    /// Set current state without recording it as sent.
    #[must_use]
    pub fn with_state(
        self,
        room_id: &str,
        event_type: &str,
        state_key: &str,
        content: Value,
    ) -> Self {
        self.with(|inner| {
            let event_id = inner.next_event_id();
            inner.put_state(StateEvent {
                event_id,
                room_id: room_id.to_string(),
                event_type: event_type.to_string(),
                state_key: state_key.to_string(),
                sender: self.user_id.to_string(),
                content,
            });
        });
        self
    }

    /// Set current state from a complete event, keeping its id.
    #[must_use]
    pub fn with_state_event(self, event: StateEvent) -> Self {
        self.with(|inner| inner.put_state(event));
        self
    }

    /// Set homeserver capabilities.
    #[must_use]
    pub fn with_capabilities(self, capabilities: HomeServerCapabilities) -> Self {
        self.with(|inner| inner.capabilities = capabilities);
        self
    }

    /// Add a device of the signed-in user.
    #[must_use]
    pub fn with_device(self, device: DeviceInfo) -> Self {
        self.with(|inner| inner.devices.insert(device.device_id.clone(), device));
        self
    }

    /// Demand password auth before any sign-out.
    #[must_use]
    pub fn requiring_password(self, password: &str) -> Self {
        self.with(|inner| inner.reauth = ReAuthPolicy::Password(password.to_string()));
        self
    }

    /// Demand single sign-on before any sign-out.
    #[must_use]
    pub fn requiring_sso(self) -> Self {
        self.with(|inner| inner.reauth = ReAuthPolicy::Sso);
        self
    }

    /// Make `op` fail with `error` until [`MemorySession::heal`] is called.
    pub fn fail(&self, op: SessionOp, error: SdkError) {
        self.with(|inner| inner.failures.insert(op, error));
    }

    /// Stop failing `op`.
    pub fn heal(&self, op: SessionOp) {
        self.with(|inner| inner.failures.remove(&op));
    }

    /// Events sent through [`Session::send_state_event`], oldest first.
    pub fn sent_events(&self) -> Vec<StateEvent> {
        self.with(|inner| inner.sent.clone())
    }

    /// Current state event, bypassing failure injection.
    pub fn current_state(
        &self,
        room_id: &str,
        event_type: &str,
        state_key: &str,
    ) -> Option<StateEvent> {
        self.with(|inner| {
            inner
                .state
                .get(&(room_id.to_string(), event_type.to_string()))
                .and_then(|events| events.get(state_key).cloned())
        })
    }

    /// True if `device_id` is still signed in.
    pub fn has_device(&self, device_id: &str) -> bool {
        self.with(|inner| inner.devices.contains_key(device_id))
    }

    /// Registered pushers as (endpoint, gateway) pairs.
    pub fn pushers(&self) -> Vec<(String, String)> {
        self.with(|inner| {
            inner.pushers.iter().map(|(endpoint, gateway)| (endpoint.clone(), gateway.clone())).collect()
        })
    }

    fn check(&self, op: SessionOp) -> Result<(), SdkError> {
        self.with(|inner| inner.failures.get(&op).cloned().map_or(Ok(()), Err))
    }

    fn sign_out(
        &self,
        device_id: &str,
        auth: Option<UserInteractiveAuth>,
    ) -> Result<SignoutOutcome, SdkError> {
        self.check(SessionOp::SignOut)?;
        self.with(|inner| {
            if !inner.devices.contains_key(device_id) {
                return Err(SdkError::NotFound(format!("device {device_id}")));
            }

            let accepted = match (&inner.reauth, &auth) {
                (ReAuthPolicy::None, _) => true,
                (_, None) => false,
                (ReAuthPolicy::Password(expected), Some(UserInteractiveAuth::Password {
                    session,
                    password,
                    ..
                })) => inner.uia_session.as_ref() == Some(session) && password == expected,
                (ReAuthPolicy::Sso, Some(UserInteractiveAuth::Sso { session })) => {
                    inner.uia_session.as_ref() == Some(session)
                },
                _ => false,
            };

            if accepted {
                inner.devices.remove(device_id);
                inner.uia_session = None;
                return Ok(SignoutOutcome::Done);
            }

            let stage = match inner.reauth {
                ReAuthPolicy::Sso => "m.login.sso",
                ReAuthPolicy::Password(_) | ReAuthPolicy::None => "m.login.password",
            };
            let session = format!("uia{}", inner.next_id);
            inner.next_id += 1;
            inner.uia_session = Some(session.clone());

            Ok(SignoutOutcome::ReAuthRequired {
                session,
                flows: vec![AuthFlow { stages: vec![stage.to_string()] }],
                error_code: auth.map(|_| "M_FORBIDDEN".to_string()),
            })
        })
    }
}

impl MemorySessionInner {
    fn next_event_id(&mut self) -> EventId {
        self.next_id += 1;
        format!("$mem{}", self.next_id)
    }

    fn put_state(&mut self, event: StateEvent) {
        self.state
            .entry((event.room_id.clone(), event.event_type.clone()))
            .or_default()
            .insert(event.state_key.clone(), event);
    }

    fn require_room(&self, room_id: &str) -> Result<(), SdkError> {
        if self.summaries.contains_key(room_id) {
            Ok(())
        } else {
            Err(SdkError::UnknownRoom(room_id.to_string()))
        }
    }
}

impl std::fmt::Debug for MemorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySession")
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

impl Session for MemorySession {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn room_summary(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<Option<RoomSummary>, SdkError>> + Send {
        let result = self
            .check(SessionOp::RoomSummary)
            .map(|()| self.with(|inner| inner.summaries.get(room_id).cloned()));
        ready(result)
    }

    fn room_summaries(
        &self,
        query: &RoomSummaryQuery,
    ) -> impl Future<Output = Result<Vec<RoomSummary>, SdkError>> + Send {
        let result = self.check(SessionOp::RoomSummaries).map(|()| {
            self.with(|inner| {
                inner.summaries.values().filter(|summary| query.matches(summary)).cloned().collect()
            })
        });
        ready(result)
    }

    fn state_event(
        &self,
        room_id: &str,
        event_type: &str,
        state_key: &StateKeyQuery,
    ) -> impl Future<Output = Result<Option<StateEvent>, SdkError>> + Send {
        let result = self.check(SessionOp::StateEvent).and_then(|()| {
            self.with(|inner| {
                inner.require_room(room_id)?;
                Ok(inner
                    .state
                    .get(&(room_id.to_string(), event_type.to_string()))
                    .and_then(|events| events.values().find(|e| state_key.matches(&e.state_key)))
                    .cloned())
            })
        });
        ready(result)
    }

    fn send_state_event(
        &self,
        room_id: &str,
        event_type: &str,
        state_key: &str,
        body: Value,
    ) -> impl Future<Output = Result<EventId, SdkError>> + Send {
        let result = self.check(SessionOp::SendStateEvent).and_then(|()| {
            self.with(|inner| {
                inner.require_room(room_id)?;
                let event = StateEvent {
                    event_id: inner.next_event_id(),
                    room_id: room_id.to_string(),
                    event_type: event_type.to_string(),
                    state_key: state_key.to_string(),
                    sender: self.user_id.to_string(),
                    content: body,
                };
                let event_id = event.event_id.clone();
                tracing::trace!(%room_id, %event_type, %event_id, "state event stored");
                inner.sent.push(event.clone());
                inner.put_state(event);
                Ok(event_id)
            })
        });
        ready(result)
    }

    fn homeserver_capabilities(
        &self,
    ) -> impl Future<Output = Result<HomeServerCapabilities, SdkError>> + Send {
        let result = self
            .check(SessionOp::Capabilities)
            .map(|()| self.with(|inner| inner.capabilities.clone()));
        ready(result)
    }

    fn device_info(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<DeviceInfo>, SdkError>> + Send {
        let result = self
            .check(SessionOp::DeviceInfo)
            .map(|()| self.with(|inner| inner.devices.get(device_id).cloned()));
        ready(result)
    }

    fn sign_out_device(
        &self,
        device_id: &str,
        auth: Option<UserInteractiveAuth>,
    ) -> impl Future<Output = Result<SignoutOutcome, SdkError>> + Send {
        ready(self.sign_out(device_id, auth))
    }

    fn register_pusher(
        &self,
        endpoint: &str,
        gateway_url: &str,
    ) -> impl Future<Output = Result<(), SdkError>> + Send {
        let result = self.check(SessionOp::RegisterPusher).map(|()| {
            self.with(|inner| inner.pushers.insert(endpoint.to_string(), gateway_url.to_string()));
        });
        ready(result)
    }

    fn unregister_pusher(&self, endpoint: &str) -> impl Future<Output = Result<(), SdkError>> + Send {
        let result = self.check(SessionOp::UnregisterPusher).and_then(|()| {
            self.with(|inner| {
                inner
                    .pushers
                    .remove(endpoint)
                    .map(|_| ())
                    .ok_or_else(|| SdkError::NotFound(format!("pusher {endpoint}")))
            })
        });
        ready(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use serde_json::json;
    use trellis_core::EVENT_TYPE_JOIN_RULES;

    use super::*;

    fn session() -> MemorySession {
        MemorySession::new("@alice:x", "ALICE").with_summary(RoomSummary::room("!r:x", "Room"))
    }

    #[tokio::test]
    async fn sent_state_becomes_current() {
        let session = session();
        let id = session
            .send_state_event("!r:x", EVENT_TYPE_JOIN_RULES, "", json!({ "join_rule": "public" }))
            .await
            .unwrap();

        let current = session
            .state_event("!r:x", EVENT_TYPE_JOIN_RULES, &StateKeyQuery::Empty)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.event_id, id);
        assert_eq!(session.sent_events().len(), 1);
    }

    #[tokio::test]
    async fn state_of_unknown_room_fails() {
        let result = session().state_event("!nope:x", "t", &StateKeyQuery::Empty).await;
        assert_eq!(result, Err(SdkError::UnknownRoom("!nope:x".into())));
    }

    #[tokio::test]
    async fn injected_failure_until_healed() {
        let session = session();
        session.fail(SessionOp::RoomSummary, SdkError::Network("down".into()));
        assert!(session.room_summary("!r:x").await.is_err());

        session.heal(SessionOp::RoomSummary);
        assert!(session.room_summary("!r:x").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn password_sign_out_needs_matching_session_and_password() {
        let session = session()
            .with_device(DeviceInfo {
                device_id: "BOB".into(),
                display_name: None,
                last_seen_ip: None,
                last_seen_ts: None,
            })
            .requiring_password("hunter2");

        let SignoutOutcome::ReAuthRequired { session: uia, error_code, .. } =
            session.sign_out_device("BOB", None).await.unwrap()
        else {
            panic!("expected re-auth");
        };
        assert_eq!(error_code, None);

        let wrong = UserInteractiveAuth::Password {
            session: uia,
            user_id: "@alice:x".into(),
            password: "nope".into(),
        };
        let SignoutOutcome::ReAuthRequired { session: uia, error_code, .. } =
            session.sign_out_device("BOB", Some(wrong)).await.unwrap()
        else {
            panic!("expected re-auth");
        };
        assert_eq!(error_code.as_deref(), Some("M_FORBIDDEN"));

        let right = UserInteractiveAuth::Password {
            session: uia,
            user_id: "@alice:x".into(),
            password: "hunter2".into(),
        };
        assert_eq!(session.sign_out_device("BOB", Some(right)).await, Ok(SignoutOutcome::Done));
        assert!(!session.has_device("BOB"));
    }

    #[tokio::test]
    async fn unregistering_unknown_pusher_is_not_found() {
        let session = session();
        assert!(matches!(session.unregister_pusher("e").await, Err(SdkError::NotFound(_))));

        session.register_pusher("e", "https://gw").await.unwrap();
        assert_eq!(session.pushers(), vec![("e".to_string(), "https://gw".to_string())]);
        session.unregister_pusher("e").await.unwrap();
        assert!(session.pushers().is_empty());
    }
}
