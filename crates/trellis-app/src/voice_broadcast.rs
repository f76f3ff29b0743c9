//! Voice broadcast pause use case.
//!
//! A voice broadcast is tracked by a state event keyed by the broadcaster's
//! user id. Pausing sends a new state event in the `paused` state that
//! references the event which started the broadcast.

use serde_json::{Value, json};
use trellis_core::{SdkError, Session, StateEvent, StateKeyQuery};

/// Voice broadcast info state event type.
pub const VOICE_BROADCAST_INFO_EVENT_TYPE: &str = "io.element.voice_broadcast_info";

/// Lifecycle state of a voice broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceBroadcastState {
    /// Recording started.
    Started,
    /// Recording paused.
    Paused,
    /// Recording resumed after a pause.
    Resumed,
    /// Broadcast ended.
    Stopped,
}

impl VoiceBroadcastState {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
            Self::Stopped => "stopped",
        }
    }

    /// Parse a wire value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "started" => Some(Self::Started),
            "paused" => Some(Self::Paused),
            "resumed" => Some(Self::Resumed),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    /// True if a broadcast in this state can be paused.
    pub fn is_pausable(self) -> bool {
        matches!(self, Self::Started | Self::Resumed)
    }
}

/// Local recorder of the running broadcast.
pub trait VoiceBroadcastRecorder: Send + Sync {
    /// Pause recording.
    fn pause_record(&self);
}

/// Result of [`pause_voice_broadcast`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PauseOutcome {
    /// Broadcast paused.
    Paused,
    /// Nothing to pause. `current` is `None` if there is no broadcast.
    NotPausable {
        /// Last known state.
        current: Option<VoiceBroadcastState>,
    },
}

/// Pause the signed-in user's voice broadcast in `room_id`.
///
/// # Errors
///
/// Returns [`SdkError::UnknownRoom`] if the room has no summary, or any error
/// from reading or sending state.
pub async fn pause_voice_broadcast<S: Session>(
    session: &S,
    room_id: &str,
    recorder: Option<&dyn VoiceBroadcastRecorder>,
) -> Result<PauseOutcome, SdkError> {
    if session.room_summary(room_id).await?.is_none() {
        return Err(SdkError::UnknownRoom(room_id.to_string()));
    }

    tracing::debug!(%room_id, "pause voice broadcast requested");
    let own_key = StateKeyQuery::Equals(session.user_id().to_string());
    let last = session.state_event(room_id, VOICE_BROADCAST_INFO_EVENT_TYPE, &own_key).await?;

    let current = last.as_ref().and_then(broadcast_state);
    let Some(event) = last.filter(|_| current.is_some_and(VoiceBroadcastState::is_pausable)) else {
        tracing::debug!(%room_id, ?current, "cannot pause voice broadcast");
        return Ok(PauseOutcome::NotPausable { current });
    };

    let body = json!({
        "state": VoiceBroadcastState::Paused.as_str(),
        "m.relates_to": {
            "rel_type": "m.reference",
            "event_id": start_event_id(&event),
        },
    });
    session
        .send_state_event(room_id, VOICE_BROADCAST_INFO_EVENT_TYPE, session.user_id(), body)
        .await?;

    if let Some(recorder) = recorder {
        recorder.pause_record();
    }
    tracing::info!(%room_id, "voice broadcast paused");
    Ok(PauseOutcome::Paused)
}

fn broadcast_state(event: &StateEvent) -> Option<VoiceBroadcastState> {
    event.content.get("state").and_then(Value::as_str).and_then(VoiceBroadcastState::parse)
}

/// Id of the event that started the broadcast: the referenced event, or this
/// event itself when it carries no reference.
fn start_event_id(event: &StateEvent) -> &str {
    event
        .content
        .get("m.relates_to")
        .and_then(|relation| relation.get("event_id"))
        .and_then(Value::as_str)
        .unwrap_or(&event.event_id)
}
