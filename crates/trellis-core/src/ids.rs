//! Identifier aliases and sigil checks.
//!
//! Identifiers are opaque strings owned by the SDK. Only the leading sigil is
//! validated here, which is enough to reject obviously malformed input coming
//! from untrusted sources such as push payloads.

/// Room or space identifier (`!opaque:server`).
pub type RoomId = String;

/// Event identifier (`$opaque`).
pub type EventId = String;

/// User identifier (`@local:server`).
pub type UserId = String;

/// Device identifier.
pub type DeviceId = String;

/// True if `id` looks like a room id.
pub fn is_room_id(id: &str) -> bool {
    has_sigil(id, '!') && id.contains(':')
}

/// True if `id` looks like an event id.
///
/// Room versions 3+ use server-less event ids, so no `:` is required.
pub fn is_event_id(id: &str) -> bool {
    has_sigil(id, '$')
}

/// True if `id` looks like a user id.
pub fn is_user_id(id: &str) -> bool {
    has_sigil(id, '@') && id.contains(':')
}

fn has_sigil(id: &str, sigil: char) -> bool {
    id.len() > 1 && id.starts_with(sigil) && !id.chars().any(char::is_whitespace)
}
