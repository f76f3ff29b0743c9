//! Displayable references to users, rooms and spaces.

use std::hash::{Hash, Hasher};

/// What a [`MatrixItem`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixItemKind {
    /// A user.
    User,
    /// An ordinary room.
    Room,
    /// A space.
    Space,
    /// A room id with no local summary (placeholder).
    UnknownRoom,
}

/// A user, room or space as shown in lists.
///
/// Equality and hashing consider only [`MatrixItem::id`]: two items with the
/// same id and different display names are the same item.
#[derive(Debug, Clone)]
pub struct MatrixItem {
    /// Matrix identifier.
    pub id: String,
    /// Display name, if known.
    pub display_name: Option<String>,
    /// Avatar `mxc://` URL, if any.
    pub avatar_url: Option<String>,
    /// Item kind.
    pub kind: MatrixItemKind,
}

impl MatrixItem {
    /// Create an item of the given kind.
    pub fn new(id: impl Into<String>, display_name: Option<String>, kind: MatrixItemKind) -> Self {
        Self { id: id.into(), display_name, avatar_url: None, kind }
    }

    /// Create a space item.
    pub fn space(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(id, Some(display_name.into()), MatrixItemKind::Space)
    }

    /// Create a room item.
    pub fn room(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(id, Some(display_name.into()), MatrixItemKind::Room)
    }

    /// Create a user item.
    pub fn user(id: impl Into<String>, display_name: Option<String>) -> Self {
        Self::new(id, display_name, MatrixItemKind::User)
    }

    /// Placeholder for a room id that has no local summary.
    pub fn unknown_room(id: impl Into<String>) -> Self {
        Self::new(id, None, MatrixItemKind::UnknownRoom)
    }

    /// Set the avatar URL.
    #[must_use]
    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Display name, falling back to the id.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

impl PartialEq for MatrixItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MatrixItem {}

impl Hash for MatrixItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
