//! Join rules and the join-rule capability resolver.
//!
//! [`JoinRulesContent`] mirrors the `m.room.join_rules` state event. Parsing is
//! tolerant: the screens only offer invite/restricted/public, so any other
//! persisted rule is read as [`JoinRule::Invite`], and allow entries other than
//! room membership are skipped.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{RoomCapabilitySupport, RoomId};

/// Allow entry type granting access through room membership.
const ALLOW_TYPE_ROOM_MEMBERSHIP: &str = "m.room_membership";

/// Room version assumed when `m.room.create` carries none.
const DEFAULT_ROOM_VERSION: &str = "1";

/// Who may join a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinRule {
    /// Only invited users.
    Invite,
    /// Members of an allow-listed space, or invited users.
    Restricted,
    /// Anyone.
    Public,
}

impl JoinRule {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invite => "invite",
            Self::Restricted => "restricted",
            Self::Public => "public",
        }
    }

    /// Parse a wire value. `None` for rules the screens do not offer.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "invite" => Some(Self::Invite),
            "restricted" => Some(Self::Restricted),
            "public" => Some(Self::Public),
            _ => None,
        }
    }
}

impl std::fmt::Display for JoinRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a restricted room's allow list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowRule {
    /// Allow entry type. Always `m.room_membership` for parsed entries.
    #[serde(rename = "type")]
    pub kind: String,
    /// Space whose members may join.
    pub room_id: RoomId,
}

impl AllowRule {
    /// Allow members of `room_id`.
    pub fn room_membership(room_id: impl Into<RoomId>) -> Self {
        Self { kind: ALLOW_TYPE_ROOM_MEMBERSHIP.to_string(), room_id: room_id.into() }
    }
}

/// Content of the `m.room.join_rules` state event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRulesContent {
    /// Join rule.
    pub join_rule: JoinRule,
    /// Allow list. Only meaningful for [`JoinRule::Restricted`].
    pub allow: Vec<AllowRule>,
}

impl JoinRulesContent {
    /// Content with the given rule and no allow list.
    pub fn new(join_rule: JoinRule) -> Self {
        Self { join_rule, allow: Vec::new() }
    }

    /// Restricted content allowing members of the given spaces.
    pub fn restricted<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RoomId>,
    {
        Self {
            join_rule: JoinRule::Restricted,
            allow: allowed.into_iter().map(AllowRule::room_membership).collect(),
        }
    }

    /// Interpret raw event content.
    pub fn from_event_content(content: &Value) -> Self {
        let raw_rule = content.get("join_rule").and_then(Value::as_str);
        let join_rule = raw_rule.and_then(JoinRule::parse).unwrap_or_else(|| {
            tracing::debug!(rule = ?raw_rule, "unsupported join rule, treating as invite");
            JoinRule::Invite
        });

        let allow = content
            .get("allow")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value::<AllowRule>(entry.clone()).ok())
                    .filter(|rule| rule.kind == ALLOW_TYPE_ROOM_MEMBERSHIP)
                    .collect()
            })
            .unwrap_or_default();

        Self { join_rule, allow }
    }

    /// Raw event content. `allow` is only written for restricted rooms.
    pub fn to_event_content(&self) -> Value {
        if self.join_rule == JoinRule::Restricted {
            json!({ "join_rule": self.join_rule, "allow": self.allow })
        } else {
            json!({ "join_rule": self.join_rule })
        }
    }

    /// Allow-listed room ids, in event order.
    pub fn allowed_room_ids(&self) -> impl Iterator<Item = &str> {
        self.allow.iter().map(|rule| rule.room_id.as_str())
    }
}

/// Room version from `m.room.create` content.
pub fn room_version_from_create(content: &Value) -> String {
    content
        .get("room_version")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ROOM_VERSION)
        .to_string()
}

/// A join rule offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinRuleOption {
    /// The rule.
    pub rule: JoinRule,
    /// Applying the rule requires a room upgrade first.
    pub needs_upgrade: bool,
}

impl JoinRuleOption {
    /// Option usable on the current room version.
    pub fn direct(rule: JoinRule) -> Self {
        Self { rule, needs_upgrade: false }
    }
}

/// Output of [`resolve_join_rules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRuleResolution {
    /// Persisted rule, downgraded if the room version cannot express it.
    pub effective_rule: JoinRule,
    /// Rules the user may pick, in display order.
    pub choices: Vec<JoinRuleOption>,
}

/// Resolve the effective rule and selectable choices from capability data.
///
/// A persisted restricted rule on a room version that does not support it is
/// silently reported as [`JoinRule::Invite`]. Restricted is offered when the
/// room version supports it, or when the server only supports it on an
/// unstable version and the user opted into experimental features; in the
/// latter case the option needs an upgrade.
pub fn resolve_join_rules(
    persisted: JoinRule,
    support: RoomCapabilitySupport,
    version_supports_restricted: bool,
    allow_experimental_restricted: bool,
) -> JoinRuleResolution {
    let effective_rule = if persisted == JoinRule::Restricted && !version_supports_restricted {
        JoinRule::Invite
    } else {
        persisted
    };

    let offer_restricted = version_supports_restricted
        || (support == RoomCapabilitySupport::SupportedUnstable && allow_experimental_restricted);

    let choices = if offer_restricted {
        vec![
            JoinRuleOption::direct(JoinRule::Invite),
            JoinRuleOption { rule: JoinRule::Restricted, needs_upgrade: !version_supports_restricted },
            JoinRuleOption::direct(JoinRule::Public),
        ]
    } else {
        vec![JoinRuleOption::direct(JoinRule::Invite), JoinRuleOption::direct(JoinRule::Public)]
    };

    JoinRuleResolution { effective_rule, choices }
}
