//! TOML configuration describing the simulated session.
//!
//! ```toml
//! [session]
//! user_id = "@alice:example.org"
//! device_id = "PHONE"
//!
//! [preferences]
//! developer_mode = true
//!
//! [capabilities.room_versions]
//! default_version = "9"
//! available = [{ version = "9", status = "stable" }]
//! capabilities.restricted = { preferred = "9", support = ["8", "9"] }
//!
//! [[rooms]]
//! id = "!room:example.org"
//! name = "Room"
//! parents = ["!space:example.org"]
//! room_version = "9"
//! join_rule = "restricted"
//! allow = ["!space:example.org"]
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::json;
use trellis_app::{Preferences, PushConfig, VOICE_BROADCAST_INFO_EVENT_TYPE};
use trellis_core::{
    DeviceId, DeviceInfo, EVENT_TYPE_JOIN_RULES, EVENT_TYPE_ROOM_CREATE, EventId,
    HomeServerCapabilities, JoinRule, JoinRulesContent, Membership, RoomId, RoomSummary, RoomType,
    StateEvent, UserId, ids,
};
use trellis_harness::MemorySession;

use crate::CliError;

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Signed-in account.
    pub session: SessionConfig,
    /// User preferences.
    pub preferences: Preferences,
    /// Push registration settings.
    pub push: PushConfig,
    /// Homeserver capabilities, in `/capabilities` response shape.
    pub capabilities: HomeServerCapabilities,
    /// Known rooms and spaces.
    pub rooms: Vec<RoomConfig>,
    /// Devices of the signed-in user.
    pub devices: Vec<DeviceConfig>,
}

/// Signed-in account.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// User id.
    pub user_id: UserId,
    /// This device.
    pub device_id: DeviceId,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { user_id: "@trellis:localhost".to_string(), device_id: "TRELLIS".to_string() }
    }
}

/// A room or space.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomConfig {
    /// Room id.
    pub id: RoomId,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// `room` or `space`.
    #[serde(default = "default_room_type")]
    pub kind: RoomType,
    /// Ancestor spaces, nearest first.
    #[serde(default)]
    pub parents: Vec<RoomId>,
    /// Own membership.
    #[serde(default = "default_membership")]
    pub membership: Membership,
    /// Version from `m.room.create`.
    #[serde(default)]
    pub room_version: Option<String>,
    /// Persisted join rule. No join-rules event when absent.
    #[serde(default)]
    pub join_rule: Option<JoinRule>,
    /// Allow list for a restricted rule.
    #[serde(default)]
    pub allow: Vec<RoomId>,
    /// Own voice broadcast state.
    #[serde(default)]
    pub voice_broadcast: Option<BroadcastConfig>,
}

/// Own voice broadcast in a room.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    /// Id of the latest broadcast info event.
    pub event_id: EventId,
    /// `started`, `paused`, `resumed` or `stopped`.
    pub state: String,
    /// Event that started the broadcast, when the latest event is not it.
    #[serde(default)]
    pub started_by: Option<EventId>,
}

/// A device of the signed-in user.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Device id.
    pub id: DeviceId,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Last seen IP address.
    #[serde(default)]
    pub last_seen_ip: Option<String>,
    /// Last seen, milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_seen_ts: Option<u64>,
}

fn default_room_type() -> RoomType {
    RoomType::Room
}

fn default_membership() -> Membership {
    Membership::Join
}

impl AppConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&raw)
    }

    /// Parse and validate config text.
    pub fn parse(raw: &str) -> Result<Self, CliError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CliError> {
        if !ids::is_user_id(&self.session.user_id) {
            return Err(CliError::Invalid(format!("bad user id {}", self.session.user_id)));
        }
        for room in &self.rooms {
            let bad = std::iter::once(&room.id)
                .chain(&room.parents)
                .chain(&room.allow)
                .find(|id| !ids::is_room_id(id));
            if let Some(id) = bad {
                return Err(CliError::Invalid(format!("bad room id {id}")));
            }
        }
        Ok(())
    }

    /// Room configured under `room_id`.
    pub fn room(&self, room_id: &str) -> Result<&RoomConfig, CliError> {
        self.rooms
            .iter()
            .find(|room| room.id == room_id)
            .ok_or_else(|| CliError::UnknownRoom(room_id.to_string()))
    }

    /// In-memory session holding everything configured.
    pub fn session(&self) -> MemorySession {
        let mut session = MemorySession::new(&self.session.user_id, &self.session.device_id)
            .with_capabilities(self.capabilities.clone());

        for room in &self.rooms {
            session = session.with_summary(RoomSummary {
                room_id: room.id.clone(),
                display_name: room.name.clone(),
                avatar_url: None,
                room_type: room.kind,
                flattened_parent_ids: room.parents.clone(),
                membership: room.membership,
            });

            if let Some(version) = &room.room_version {
                session = session.with_state(
                    &room.id,
                    EVENT_TYPE_ROOM_CREATE,
                    "",
                    json!({ "creator": self.session.user_id, "room_version": version }),
                );
            }

            if let Some(rule) = room.join_rule {
                let content = if rule == JoinRule::Restricted {
                    JoinRulesContent::restricted(room.allow.iter().cloned())
                } else {
                    JoinRulesContent::new(rule)
                };
                session =
                    session.with_state(&room.id, EVENT_TYPE_JOIN_RULES, "", content.to_event_content());
            }

            if let Some(broadcast) = &room.voice_broadcast {
                let mut content = json!({ "state": broadcast.state });
                if let Some(start) = &broadcast.started_by {
                    content["m.relates_to"] = json!({ "rel_type": "m.reference", "event_id": start });
                }
                session = session.with_state_event(StateEvent {
                    event_id: broadcast.event_id.clone(),
                    room_id: room.id.clone(),
                    event_type: VOICE_BROADCAST_INFO_EVENT_TYPE.to_string(),
                    state_key: self.session.user_id.clone(),
                    sender: self.session.user_id.clone(),
                    content,
                });
            }
        }

        for device in &self.devices {
            session = session.with_device(DeviceInfo {
                device_id: device.id.clone(),
                display_name: device.name.clone(),
                last_seen_ip: device.last_seen_ip.clone(),
                last_seen_ts: device.last_seen_ts,
            });
        }

        session
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use trellis_core::{RoomCapabilitySupport, Session, StateKeyQuery};

    use super::*;

    const CONFIG: &str = r#"
        [session]
        user_id = "@alice:example.org"
        device_id = "PHONE"

        [preferences]
        labs_use_experimental_restricted = true

        [capabilities.room_versions]
        default_version = "9"
        available = [{ version = "9", status = "stable" }]
        capabilities.restricted = { preferred = "9", support = ["9"] }

        [[rooms]]
        id = "!space:example.org"
        name = "Space"
        kind = "space"

        [[rooms]]
        id = "!room:example.org"
        name = "Room"
        parents = ["!space:example.org"]
        room_version = "9"
        join_rule = "restricted"
        allow = ["!space:example.org"]
    "#;

    #[test]
    fn parses_sections() {
        let config = AppConfig::parse(CONFIG).unwrap();

        assert!(config.preferences.labs_use_experimental_restricted);
        assert!(!config.preferences.developer_mode);
        assert!(config.push.notifications_enabled);
        assert_eq!(config.capabilities.restricted_support(), RoomCapabilitySupport::Supported);
        assert_eq!(config.room("!space:example.org").unwrap().kind, RoomType::Space);
        assert!(matches!(config.room("!nope:example.org"), Err(CliError::UnknownRoom(_))));
    }

    #[tokio::test]
    async fn session_holds_configured_state() {
        let session = AppConfig::parse(CONFIG).unwrap().session();

        let summary = session.room_summary("!room:example.org").await.unwrap().unwrap();
        assert_eq!(summary.flattened_parent_ids, vec!["!space:example.org".to_string()]);

        let rules = session
            .state_event("!room:example.org", EVENT_TYPE_JOIN_RULES, &StateKeyQuery::Empty)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rules.content["join_rule"], "restricted");
    }

    #[test]
    fn rejects_bad_ids() {
        let raw = "[[rooms]]\nid = \"room\"\n";
        assert!(matches!(AppConfig::parse(raw), Err(CliError::Invalid(_))));
    }

    #[test]
    fn empty_config_is_valid() {
        let config = AppConfig::parse("").unwrap();
        assert!(config.rooms.is_empty());
        assert_eq!(config.session.device_id, "TRELLIS");
    }
}
