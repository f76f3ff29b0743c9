//! User preferences and push configuration.
//!
//! Both structures deserialize from configuration files with every field
//! optional; missing fields take the [`Default`] values.

use serde::Deserialize;

/// Default UnifiedPush gateway.
const DEFAULT_PUSH_GATEWAY: &str = "https://matrix.gateway.unifiedpush.org/_matrix/push/v1/notify";

/// User preferences affecting screen behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Offer the restricted join rule when the server only supports it on an
    /// unstable room version.
    pub labs_use_experimental_restricted: bool,
    /// Search all joined rooms instead of only parent spaces when filtering.
    pub developer_mode: bool,
}

/// Push registration settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Push gateway the homeserver forwards notifications to.
    pub gateway_url: String,
    /// Notifications enabled for this device.
    pub notifications_enabled: bool,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self { gateway_url: DEFAULT_PUSH_GATEWAY.to_string(), notifications_enabled: true }
    }
}
