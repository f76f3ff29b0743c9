//! Canned sessions shared by tests and the CLI demo.

use std::collections::BTreeMap;

use serde_json::json;
use trellis_core::{
    EVENT_TYPE_JOIN_RULES, EVENT_TYPE_ROOM_CREATE, HomeServerCapabilities, JoinRulesContent,
    RESTRICTED_FEATURE, RoomCapability, RoomCapabilitySupport, RoomSummary, RoomVersionInfo,
    RoomVersionStatus, RoomVersions,
};

use crate::MemorySession;

/// Signed-in user.
pub const USER_ID: &str = "@alice:example.org";
/// Signed-in device.
pub const DEVICE_ID: &str = "ALICEPHONE";
/// Room being configured.
pub const ROOM_ID: &str = "!room:example.org";
/// Direct parent space.
pub const PARENT_ID: &str = "!parent:example.org";
/// Grandparent space.
pub const GRAND_ID: &str = "!grand:example.org";
/// Ancestor id whose summary is an ordinary room.
pub const LOBBY_ID: &str = "!lobby:example.org";
/// Space that is not an ancestor.
pub const ELSEWHERE_ID: &str = "!elsewhere:example.org";
/// Ancestor id without a summary.
pub const MISSING_ID: &str = "!missing:example.org";
/// Room version supporting the restricted rule.
pub const RESTRICTED_VERSION: &str = "9";
/// Room version without restricted support.
pub const LEGACY_VERSION: &str = "6";

/// A room nested two levels deep in spaces, plus unrelated rooms.
///
/// ```text
/// Grand (space)
/// └── Parent (space)
///     └── Room        Lobby (room, also an ancestor id of Room)
/// Elsewhere (space, not an ancestor)
/// ```
///
/// `!missing` is listed as an ancestor of Room but has no summary.
#[derive(Debug, Clone)]
pub struct SpaceTree {
    /// Room being configured.
    pub room: RoomSummary,
    /// Every other summary known to the session.
    pub others: Vec<RoomSummary>,
}

impl SpaceTree {
    /// The standard tree.
    pub fn new() -> Self {
        let room = RoomSummary::room(ROOM_ID, "Room")
            .with_parents([PARENT_ID, GRAND_ID, LOBBY_ID, MISSING_ID]);
        let others = vec![
            RoomSummary::space(PARENT_ID, "Parent").with_parents([GRAND_ID]),
            RoomSummary::space(GRAND_ID, "Grand"),
            RoomSummary::room(LOBBY_ID, "Lobby"),
            RoomSummary::space(ELSEWHERE_ID, "Elsewhere"),
        ];
        Self { room, others }
    }

    /// Ids that can appear in an allow list, known or not.
    pub fn allow_candidates() -> [&'static str; 5] {
        [PARENT_ID, GRAND_ID, LOBBY_ID, ELSEWHERE_ID, MISSING_ID]
    }

    /// Session holding every summary, on a room of `room_version`, with the
    /// given join rules and restricted support.
    pub fn session(
        &self,
        room_version: &str,
        join_rules: &JoinRulesContent,
        support: RoomCapabilitySupport,
    ) -> MemorySession {
        let mut session = MemorySession::new(USER_ID, DEVICE_ID)
            .with_summary(self.room.clone())
            .with_state(
                ROOM_ID,
                EVENT_TYPE_ROOM_CREATE,
                "",
                json!({ "creator": USER_ID, "room_version": room_version }),
            )
            .with_state(ROOM_ID, EVENT_TYPE_JOIN_RULES, "", join_rules.to_event_content())
            .with_capabilities(restricted_capabilities(support));
        for summary in &self.others {
            session = session.with_summary(summary.clone());
        }
        session
    }
}

impl Default for SpaceTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Capabilities advertising restricted support at `support`.
///
/// Room version `9` supports the rule whenever the server supports it at all;
/// version `6` never does.
pub fn restricted_capabilities(support: RoomCapabilitySupport) -> HomeServerCapabilities {
    let stable = |version: &str| RoomVersionInfo {
        version: version.to_string(),
        status: RoomVersionStatus::Stable,
    };
    let mut available = vec![stable(LEGACY_VERSION)];
    let mut capabilities = BTreeMap::new();

    match support {
        RoomCapabilitySupport::Unsupported => {},
        RoomCapabilitySupport::SupportedUnstable => {
            available.push(RoomVersionInfo {
                version: RESTRICTED_VERSION.to_string(),
                status: RoomVersionStatus::Unstable,
            });
            capabilities.insert(RESTRICTED_FEATURE.to_string(), RoomCapability {
                preferred: Some(RESTRICTED_VERSION.to_string()),
                support: vec![RESTRICTED_VERSION.to_string()],
            });
        },
        RoomCapabilitySupport::Supported => {
            available.push(stable(RESTRICTED_VERSION));
            capabilities.insert(RESTRICTED_FEATURE.to_string(), RoomCapability {
                preferred: Some(RESTRICTED_VERSION.to_string()),
                support: vec![RESTRICTED_VERSION.to_string()],
            });
        },
    }

    HomeServerCapabilities {
        room_versions: Some(RoomVersions {
            default_version: LEGACY_VERSION.to_string(),
            available,
            capabilities,
        }),
    }
}
