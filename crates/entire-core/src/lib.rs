//! entire-core: Core library for the Entire checkpoint engine.
//!
//! Records every state an AI coding agent passes through on hidden
//! per-(HEAD, worktree) shadow branches, then condenses them into durable
//! checkpoint metadata attached to the user's commits.
//!
//! # Main Entry Points
//!
//! - [`hooks`] - Agent and git hook dispatch
//! - [`shadow`] - Session initialization and checkpoint capture
//! - [`condense`] - Shadow-to-metadata condensation on user commits
//! - [`rewind`] - Rewind points, restore and reset
//! - [`sessions`] - Session record store
//! - [`config`] - Configuration management

pub mod condense;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod identity;
pub mod logging;
pub mod rewind;
pub mod sessions;
pub mod shadow;
pub mod trailers;
pub mod transcripts;

pub use condense::metadata::CheckpointInfo;
pub use config::{ConfigError, EntireConfig, Strategy};
pub use errors::EntireError;
pub use hooks::types::{HookEvent, HookInput, HookOutput};
pub use logging::init_logging;
pub use sessions::types::{SessionPhase, SessionRecord};
pub use shadow::engine::{AppendOutcome, InitOutcome};
pub use transcripts::types::AgentType;
