//! Trellis command-line driver.
//!
//! Runs the Trellis screens and use cases against an in-memory session built
//! from a TOML config file, the way a host application would drive them.
//!
//! # Components
//!
//! - [`AppConfig`]: Session, preferences, capabilities, rooms and devices
//! - [`commands`]: One scripted run per screen or use case
//! - [`CliError`]: Everything that ends a run

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
mod config;
mod error;

pub use config::{AppConfig, BroadcastConfig, DeviceConfig, RoomConfig, SessionConfig};
pub use error::CliError;
