//! Trellis core
//!
//! Value types and pure decision logic shared by the Trellis screen state
//! machines. Nothing in this crate performs I/O: the chat-protocol SDK is
//! reached only through the [`Session`] trait, which higher layers implement
//! or mock.
//!
//! # Components
//!
//! - [`MatrixItem`]: Displayable user/room/space reference, equal by id
//! - [`RoomSummary`] and [`SpaceClassifier`]: Cached room projections and the
//!   "known parent space" classification
//! - [`JoinRule`], [`JoinRulesContent`], [`resolve_join_rules`]: Join rule
//!   model and the capability resolver
//! - [`HomeServerCapabilities`]: Server-advertised room version features
//! - [`Session`]: Boundary to the external SDK

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod capabilities;
mod error;
pub mod ids;
mod item;
mod join_rules;
mod session;
mod summary;

pub use capabilities::{
    HomeServerCapabilities, RESTRICTED_FEATURE, RoomCapability, RoomCapabilitySupport,
    RoomVersionInfo, RoomVersionStatus, RoomVersions,
};
pub use error::SdkError;
pub use ids::{DeviceId, EventId, RoomId, UserId};
pub use item::{MatrixItem, MatrixItemKind};
pub use join_rules::{
    AllowRule, JoinRule, JoinRuleOption, JoinRuleResolution, JoinRulesContent,
    resolve_join_rules, room_version_from_create,
};
pub use session::{
    AuthFlow, DeviceInfo, EVENT_TYPE_JOIN_RULES, EVENT_TYPE_ROOM_CREATE, RoomSummaryQuery,
    Session, SignoutOutcome, StateEvent, StateKeyQuery, UserInteractiveAuth,
};
pub use summary::{Membership, RoomSummary, RoomType, SpaceClassifier};
