//! Homeserver room-version capabilities.
//!
//! Servers advertise which room versions they can create and, per feature,
//! which versions support it. A feature is usable on an existing room only if
//! that room's version is listed; a feature is usable *after an upgrade* if the
//! server's preferred version for it is available.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Capability key for the restricted join rule.
pub const RESTRICTED_FEATURE: &str = "restricted";

/// Capabilities advertised by the homeserver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HomeServerCapabilities {
    /// Room version information. `None` if the server does not advertise it.
    #[serde(default)]
    pub room_versions: Option<RoomVersions>,
}

/// Room versions known to the homeserver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomVersions {
    /// Version used for new rooms.
    pub default_version: String,
    /// Versions the server can create.
    #[serde(default)]
    pub available: Vec<RoomVersionInfo>,
    /// Per-feature support, keyed by feature name.
    #[serde(default)]
    pub capabilities: BTreeMap<String, RoomCapability>,
}

/// A room version and its stability.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomVersionInfo {
    /// Version string.
    pub version: String,
    /// Stability.
    pub status: RoomVersionStatus,
}

/// Stability of a room version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomVersionStatus {
    /// Stable.
    Stable,
    /// Unstable.
    Unstable,
}

/// Room versions supporting one feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomCapability {
    /// Version the server recommends for this feature.
    #[serde(default)]
    pub preferred: Option<String>,
    /// All versions supporting this feature.
    #[serde(default)]
    pub support: Vec<String>,
}

/// How well the homeserver supports a feature for new or upgraded rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomCapabilitySupport {
    /// No available room version supports the feature.
    Unsupported,
    /// Only an unstable room version supports the feature.
    SupportedUnstable,
    /// A stable room version supports the feature.
    Supported,
}

impl HomeServerCapabilities {
    /// Support level of `feature` for new or upgraded rooms.
    pub fn feature_support(&self, feature: &str) -> RoomCapabilitySupport {
        let Some(versions) = &self.room_versions else {
            return RoomCapabilitySupport::Unsupported;
        };
        let Some(capability) = versions.capabilities.get(feature) else {
            return RoomCapabilitySupport::Unsupported;
        };
        let Some(preferred) = capability.preferred.as_ref().or(capability.support.last()) else {
            return RoomCapabilitySupport::Unsupported;
        };

        match versions.available.iter().find(|info| &info.version == preferred) {
            Some(RoomVersionInfo { status: RoomVersionStatus::Stable, .. }) => {
                RoomCapabilitySupport::Supported
            },
            Some(RoomVersionInfo { status: RoomVersionStatus::Unstable, .. }) => {
                RoomCapabilitySupport::SupportedUnstable
            },
            None => RoomCapabilitySupport::Unsupported,
        }
    }

    /// True if rooms of `room_version` support `feature` without upgrading.
    pub fn is_feature_supported_for_version(&self, feature: &str, room_version: &str) -> bool {
        self.room_versions
            .as_ref()
            .and_then(|versions| versions.capabilities.get(feature))
            .is_some_and(|capability| capability.support.iter().any(|v| v == room_version))
    }

    /// Support level of the restricted join rule.
    pub fn restricted_support(&self) -> RoomCapabilitySupport {
        self.feature_support(RESTRICTED_FEATURE)
    }

    /// True if rooms of `room_version` support the restricted join rule.
    pub fn is_restricted_supported_for_version(&self, room_version: &str) -> bool {
        self.is_feature_supported_for_version(RESTRICTED_FEATURE, room_version)
    }
}
