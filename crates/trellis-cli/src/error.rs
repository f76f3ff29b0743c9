//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;
use trellis_core::{RoomId, SdkError};

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::AppConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but describes an impossible session.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// Room missing from the config.
    #[error("room {0} is not configured")]
    UnknownRoom(RoomId),

    /// Screen never finished loading.
    #[error("room {0} could not be loaded")]
    NotInitialized(RoomId),

    /// Runtime did not settle in time.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// SDK call failed.
    #[error(transparent)]
    Sdk(#[from] SdkError),
}
