//! Test harness for Trellis.
//!
//! An in-memory [`trellis_core::Session`] with scripted behaviour, recording
//! collaborators, and invariant checks over join-rule screen state.
//!
//! # Invariant Testing
//!
//! The `invariants` module verifies properties that must hold after every
//! transition of a join-rule screen, regardless of the action sequence that
//! led there. Use [`InvariantRegistry::standard()`] for the full set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod invariants;
pub mod memory_session;
pub mod recorders;

pub use fixtures::{SpaceTree, restricted_capabilities};
pub use invariants::{
    CandidatesUnique, Invariant, InvariantRegistry, InvariantResult, JoinRulesSnapshot,
    UniqueAllowList, UnknownRestrictedClassified, UnsavedChangesConsistent, Violation,
};
pub use memory_session::{MemorySession, SessionOp};
pub use recorders::{RecordingPushHandler, RecordingRecorder};
