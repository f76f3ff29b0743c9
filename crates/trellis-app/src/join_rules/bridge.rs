//! Join-rule screen bridge.
//!
//! Executes [`JoinRulesRequest`]s against a [`Session`]. A room without a
//! summary, or any SDK failure during the initial load, is logged and produces
//! no event: the screen then stays uninitialized.

use trellis_core::{
    EVENT_TYPE_JOIN_RULES, EVENT_TYPE_ROOM_CREATE, JoinRule, JoinRulesContent, MatrixItem,
    RoomSummaryQuery, SdkError, Session, StateKeyQuery, room_version_from_create,
};

use super::{JoinRulesEvent, JoinRulesRequest, JoinRulesScreen, JoinRulesSeed};
use crate::Bridge;

/// Bridge between [`JoinRulesScreen`] and the SDK.
#[derive(Debug, Clone)]
pub struct JoinRulesBridge<S: Session> {
    session: S,
}

impl<S: Session> JoinRulesBridge<S> {
    /// Create a bridge over `session`.
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Fetch everything the screen needs to open. `None` if the room has no
    /// summary.
    pub async fn load(&self, room_id: &str) -> Result<Option<JoinRulesSeed>, SdkError> {
        let Some(summary) = self.session.room_summary(room_id).await? else {
            return Ok(None);
        };

        let content = self
            .session
            .state_event(room_id, EVENT_TYPE_JOIN_RULES, &StateKeyQuery::Empty)
            .await?
            .map_or_else(
                || JoinRulesContent::new(JoinRule::Invite),
                |event| JoinRulesContent::from_event_content(&event.content),
            );

        let room_version = self
            .session
            .state_event(room_id, EVENT_TYPE_ROOM_CREATE, &StateKeyQuery::Empty)
            .await?
            .map_or_else(|| room_version_from_create(&serde_json::Value::Null), |event| {
                room_version_from_create(&event.content)
            });

        let capabilities = self.session.homeserver_capabilities().await?;

        let mut wanted: Vec<&str> = content.allowed_room_ids().collect();
        for parent_id in &summary.flattened_parent_ids {
            if !wanted.contains(&parent_id.as_str()) {
                wanted.push(parent_id);
            }
        }

        let mut known_summaries = Vec::with_capacity(wanted.len());
        for id in wanted {
            if let Some(known) = self.session.room_summary(id).await? {
                known_summaries.push(known);
            }
        }

        Ok(Some(JoinRulesSeed {
            restricted_support: capabilities.restricted_support(),
            version_supports_restricted: capabilities
                .is_restricted_supported_for_version(&room_version),
            summary,
            content,
            known_summaries,
        }))
    }

    /// Ancestors of `room_id` whose display name contains `filter`,
    /// case-insensitively. Unnamed ancestors never match. Empty if the room
    /// has no summary.
    pub async fn parent_spaces(
        &self,
        room_id: &str,
        filter: &str,
    ) -> Result<Vec<MatrixItem>, SdkError> {
        let Some(summary) = self.session.room_summary(room_id).await? else {
            tracing::debug!(%room_id, "no summary for room, no parent spaces");
            return Ok(Vec::new());
        };

        let query = RoomSummaryQuery {
            display_name_contains: Some(filter.to_string()),
            ..RoomSummaryQuery::default()
        };
        let mut items = Vec::new();
        for parent_id in &summary.flattened_parent_ids {
            if let Some(parent) = self.session.room_summary(parent_id).await?
                && query.matches(&parent)
            {
                items.push(parent.to_matrix_item());
            }
        }
        Ok(items)
    }

    /// Every joined room or space whose display name contains `filter`.
    pub async fn search(&self, filter: &str) -> Result<Vec<MatrixItem>, SdkError> {
        let summaries =
            self.session.room_summaries(&RoomSummaryQuery::joined_with_name(filter)).await?;
        Ok(summaries.iter().map(|summary| summary.to_matrix_item()).collect())
    }
}

impl<S: Session> Bridge<JoinRulesScreen> for JoinRulesBridge<S> {
    async fn execute(&self, request: JoinRulesRequest) -> Vec<JoinRulesEvent> {
        match request {
            JoinRulesRequest::Load { room_id } => match self.load(&room_id).await {
                Ok(Some(seed)) => vec![JoinRulesEvent::Loaded(Box::new(seed))],
                Ok(None) => {
                    tracing::warn!(%room_id, "no summary for room, join rules unavailable");
                    vec![]
                },
                Err(e) => {
                    tracing::warn!(%room_id, error = %e, "failed to load join rules");
                    vec![]
                },
            },
            JoinRulesRequest::SearchRooms { generation, filter } => {
                match self.search(&filter).await {
                    Ok(results) => vec![JoinRulesEvent::FilterResolved { generation, results }],
                    Err(e) => {
                        tracing::warn!(%filter, error = %e, "room search failed");
                        vec![]
                    },
                }
            },
            JoinRulesRequest::ListParentSpaces { generation, room_id, filter } => {
                match self.parent_spaces(&room_id, &filter).await {
                    Ok(results) => vec![JoinRulesEvent::FilterResolved { generation, results }],
                    Err(e) => {
                        tracing::warn!(%room_id, error = %e, "listing parent spaces failed");
                        vec![]
                    },
                }
            },
            JoinRulesRequest::SendJoinRules { room_id, content } => {
                let body = content.to_event_content();
                match self.session.send_state_event(&room_id, EVENT_TYPE_JOIN_RULES, "", body).await
                {
                    Ok(event_id) => {
                        tracing::info!(%room_id, %event_id, rule = %content.join_rule, "join rules updated");
                        vec![JoinRulesEvent::Saved]
                    },
                    Err(e) => vec![JoinRulesEvent::SaveFailed { message: e.to_string() }],
                }
            },
        }
    }
}
