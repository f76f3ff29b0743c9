//! Room summaries and parent-space classification.
//!
//! A [`RoomSummary`] is a read-only projection of the SDK's local cache. The
//! [`SpaceClassifier`] snapshots the summaries relevant to one room so that
//! allow-list entries can be classified without further SDK calls.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;

use crate::{MatrixItem, MatrixItemKind, RoomId};

/// Room type classification from `m.room.create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    /// `m.space`
    Space,
    /// No room type.
    Room,
    /// Any other room type.
    Unknown,
}

/// Own membership in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    /// Joined.
    Join,
    /// Invited.
    Invite,
    /// Left or never joined.
    Leave,
    /// Banned.
    Ban,
    /// Knocked.
    Knock,
}

/// Cached summary of a room or space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    /// Room identifier.
    pub room_id: RoomId,
    /// Computed display name.
    pub display_name: Option<String>,
    /// Avatar `mxc://` URL.
    pub avatar_url: Option<String>,
    /// Room type.
    pub room_type: RoomType,
    /// All ancestor space ids, nearest first.
    pub flattened_parent_ids: Vec<RoomId>,
    /// Own membership.
    pub membership: Membership,
}

impl RoomSummary {
    /// Summary of a joined ordinary room with no parents.
    pub fn room(room_id: impl Into<RoomId>, display_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            display_name: Some(display_name.into()),
            avatar_url: None,
            room_type: RoomType::Room,
            flattened_parent_ids: Vec::new(),
            membership: Membership::Join,
        }
    }

    /// Summary of a joined space with no parents.
    pub fn space(room_id: impl Into<RoomId>, display_name: impl Into<String>) -> Self {
        Self { room_type: RoomType::Space, ..Self::room(room_id, display_name) }
    }

    /// Set the flattened parent ids.
    #[must_use]
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RoomId>,
    {
        self.flattened_parent_ids = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Set the membership.
    #[must_use]
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }

    /// True if the room type is `m.space`.
    pub fn is_space(&self) -> bool {
        self.room_type == RoomType::Space
    }

    /// Convert to a list item.
    pub fn to_matrix_item(&self) -> MatrixItem {
        let kind = if self.is_space() { MatrixItemKind::Space } else { MatrixItemKind::Room };
        MatrixItem {
            id: self.room_id.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            kind,
        }
    }
}

/// Classifies room ids against one room's ancestor spaces.
///
/// Built once from summaries fetched when a screen opens; classification never
/// consults the SDK again.
#[derive(Debug, Clone, Default)]
pub struct SpaceClassifier {
    parent_ids: HashSet<RoomId>,
    summaries: HashMap<RoomId, RoomSummary>,
}

impl SpaceClassifier {
    /// Create a classifier for a room with the given ancestors.
    pub fn new<P, S>(parent_ids: P, summaries: S) -> Self
    where
        P: IntoIterator<Item = RoomId>,
        S: IntoIterator<Item = RoomSummary>,
    {
        Self {
            parent_ids: parent_ids.into_iter().collect(),
            summaries: summaries.into_iter().map(|s| (s.room_id.clone(), s)).collect(),
        }
    }

    /// True iff `id` has a summary, that summary is a space, and `id` is one of
    /// the room's ancestors.
    pub fn is_known_parent_space(&self, id: &str) -> bool {
        self.parent_ids.contains(id) && self.summaries.get(id).is_some_and(RoomSummary::is_space)
    }

    /// Summary for `id`, if one was captured.
    pub fn summary(&self, id: &str) -> Option<&RoomSummary> {
        self.summaries.get(id)
    }

    /// Resolve `id` to an item, or a placeholder when no summary exists.
    pub fn resolve(&self, id: &str) -> MatrixItem {
        self.summaries
            .get(id)
            .map_or_else(|| MatrixItem::unknown_room(id), RoomSummary::to_matrix_item)
    }

    /// Entries that are not known parent spaces, deduplicated by id and sorted
    /// by id. Earlier entries win on duplicate ids.
    pub fn unknown_entries<'a, I>(&self, items: I) -> Vec<MatrixItem>
    where
        I: IntoIterator<Item = &'a MatrixItem>,
    {
        let mut unknown: BTreeMap<&str, &MatrixItem> = BTreeMap::new();
        for item in items {
            if !self.is_known_parent_space(&item.id) {
                unknown.entry(item.id.as_str()).or_insert(item);
            }
        }
        unknown.into_values().cloned().collect()
    }
}
