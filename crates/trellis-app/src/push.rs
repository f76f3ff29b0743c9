//! Push delivery callbacks.
//!
//! [`PushReceiver`] is the entry point for a UnifiedPush distributor: raw
//! messages are validated before reaching the [`PushHandler`], endpoint
//! changes are mirrored into homeserver pusher registrations, and losing the
//! distributor falls back to polling.

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use trellis_core::{EventId, RoomId, Session, ids};

use crate::PushConfig;

/// Malformed push payload.
#[derive(Debug, Error)]
pub enum PushError {
    /// Payload is not the expected JSON shape.
    #[error("invalid push payload: {0}")]
    Json(#[from] serde_json::Error),

    /// `event_id` is not an event id.
    #[error("invalid event id: {0:?}")]
    InvalidEventId(String),

    /// `room_id` is not a room id.
    #[error("invalid room id: {0:?}")]
    InvalidRoomId(String),
}

/// Validated notification extracted from a push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushData {
    /// Event that triggered the notification.
    pub event_id: EventId,
    /// Room of the event.
    pub room_id: RoomId,
    /// Unread count reported by the gateway.
    pub unread: Option<u32>,
}

#[derive(Deserialize)]
struct Envelope {
    notification: Notification,
}

#[derive(Deserialize)]
struct Notification {
    event_id: String,
    room_id: String,
    #[serde(default)]
    counts: Counts,
}

#[derive(Default, Deserialize)]
struct Counts {
    unread: Option<u32>,
}

/// Parse a raw push message.
///
/// # Errors
///
/// Returns [`PushError`] if the payload is not JSON of the form
/// `{"notification": {"event_id", "room_id", "counts": {"unread"}}}` or if
/// either id is invalid.
pub fn parse_push_data(bytes: &[u8]) -> Result<PushData, PushError> {
    let Envelope { notification } = serde_json::from_slice(bytes)?;

    if !ids::is_event_id(&notification.event_id) {
        return Err(PushError::InvalidEventId(notification.event_id));
    }
    if !ids::is_room_id(&notification.room_id) {
        return Err(PushError::InvalidRoomId(notification.room_id));
    }

    Ok(PushData {
        event_id: notification.event_id,
        room_id: notification.room_id,
        unread: notification.counts.unread,
    })
}

/// Consumer of validated push notifications.
pub trait PushHandler: Send + Sync {
    /// Handle one notification.
    fn handle(&self, data: PushData);
}

/// How the client learns about new events while in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundSyncMode {
    /// Push delivery through a distributor.
    Push,
    /// Periodic polling.
    #[default]
    Polling,
}

#[derive(Debug, Default)]
struct Registration {
    endpoint: Option<String>,
    mode: BackgroundSyncMode,
}

/// Push distributor callbacks bound to a session.
pub struct PushReceiver<S: Session, H: PushHandler> {
    session: S,
    handler: H,
    config: PushConfig,
    registration: Mutex<Registration>,
}

impl<S: Session, H: PushHandler> PushReceiver<S, H> {
    /// Create a receiver with no endpoint, polling in the background.
    pub fn new(session: S, handler: H, config: PushConfig) -> Self {
        Self { session, handler, config, registration: Mutex::new(Registration::default()) }
    }

    /// Raw message from the distributor. Malformed payloads are dropped.
    pub fn on_message(&self, bytes: &[u8]) {
        match parse_push_data(bytes) {
            Ok(data) => {
                tracing::debug!(event_id = %data.event_id, room_id = %data.room_id, "push received");
                self.handler.handle(data);
            },
            Err(e) => tracing::warn!(error = %e, len = bytes.len(), "dropping malformed push"),
        }
    }

    /// The distributor assigned a (possibly unchanged) endpoint.
    pub async fn on_new_endpoint(&self, endpoint: &str) {
        if !self.config.notifications_enabled {
            tracing::info!("notifications disabled, not registering pusher");
            return;
        }

        // Held across the call: the endpoint is only stored once registered.
        let mut registration = self.registration.lock().await;
        registration.mode = BackgroundSyncMode::Push;
        if registration.endpoint.as_deref() == Some(endpoint) {
            tracing::debug!("push endpoint unchanged");
            return;
        }

        match self.session.register_pusher(endpoint, &self.config.gateway_url).await {
            Ok(()) => {
                registration.endpoint = Some(endpoint.to_string());
                tracing::info!(gateway = %self.config.gateway_url, "pusher registered");
            },
            Err(e) => tracing::error!(error = %e, "failed to register pusher"),
        }
    }

    /// The distributor could not register this client.
    pub async fn on_registration_failed(&self) {
        tracing::warn!("push registration failed, falling back to polling");
        self.registration.lock().await.mode = BackgroundSyncMode::Polling;
    }

    /// The distributor unregistered this client.
    pub async fn on_unregistered(&self) {
        let endpoint = {
            let mut registration = self.registration.lock().await;
            registration.mode = BackgroundSyncMode::Polling;
            registration.endpoint.take()
        };
        tracing::info!("push unregistered, falling back to polling");

        let Some(endpoint) = endpoint else {
            return;
        };
        if let Err(e) = self.session.unregister_pusher(&endpoint).await {
            tracing::debug!(error = %e, "ignoring pusher removal failure");
        }
    }

    /// Current background sync mode.
    pub async fn sync_mode(&self) -> BackgroundSyncMode {
        self.registration.lock().await.mode
    }

    /// Endpoint last registered with the homeserver.
    pub async fn endpoint(&self) -> Option<String> {
        self.registration.lock().await.endpoint.clone()
    }

    /// Configuration in use.
    pub fn config(&self) -> &PushConfig {
        &self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_notification() {
        let raw = br#"{"notification":{"event_id":"$e","room_id":"!r:x","counts":{"unread":3}}}"#;
        let data = parse_push_data(raw).unwrap();

        assert_eq!(data.event_id, "$e");
        assert_eq!(data.room_id, "!r:x");
        assert_eq!(data.unread, Some(3));
    }

    #[test]
    fn counts_are_optional() {
        let raw = br#"{"notification":{"event_id":"$e","room_id":"!r:x"}}"#;
        assert_eq!(parse_push_data(raw).unwrap().unread, None);
    }

    #[test]
    fn rejects_bad_ids() {
        let bad_event = br#"{"notification":{"event_id":"e","room_id":"!r:x"}}"#;
        assert!(matches!(parse_push_data(bad_event), Err(PushError::InvalidEventId(_))));

        let bad_room = br##"{"notification":{"event_id":"$e","room_id":"#alias:x"}}"##;
        assert!(matches!(parse_push_data(bad_room), Err(PushError::InvalidRoomId(_))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_push_data(b"not json"), Err(PushError::Json(_))));
        assert!(matches!(parse_push_data(b"{}"), Err(PushError::Json(_))));
    }
}
