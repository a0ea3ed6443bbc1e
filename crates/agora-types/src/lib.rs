//! Shared data model for the agora simulation console.
//!
//! This crate defines the types exchanged with a remote multi-agent
//! social-simulation backend, plus the in-progress wizard session that the
//! console persists between invocations. Field names follow the backend's
//! wire format: template metadata is snake_case JSON, while the start
//! payload uses the camelCase keys the backend expects.

pub mod frames;
pub mod types;

pub use frames::{LogLine, SocketFrame};
pub use types::{
    ChatMessage, ChatRole, ChatScope, LlmConfig, Persona, RunStatus, SimEvent, SimulationSession,
    Template, TemplateSummary,
};
