//! Client for the remote multi-agent social-simulation backend.
//!
//! This crate abstracts the backend behind a capability-shaped trait so the
//! session and CLI layers never touch endpoint paths or payload shapes
//! directly. The HTTP implementation talks to the backend's REST surface;
//! the socket module provides the long-lived chat/log subscription with
//! deterministic teardown.
//!
//! Per the console's design, this layer does not retry, does not queue, and
//! does not back off: failures surface as errors to the caller.

use anyhow::Result;
use async_trait::async_trait;

use agora_types::{Persona, RunStatus, Template, TemplateSummary};

pub mod http_backend;
pub mod socket;
pub mod types;

pub use http_backend::HttpBackend;
pub use socket::SocketSubscription;
pub use types::{ChatRequest, EventPublishRequest, StartRequest};

/// Asynchronous collaborator offering the backend's logical operations.
#[async_trait]
pub trait SimulationBackend: Send + Sync {
    /// List available template summaries.
    async fn fetch_templates(&self) -> Result<Vec<TemplateSummary>>;

    /// Fetch one template fully hydrated: events, roster, metadata.
    async fn fetch_template(&self, sim_code: &str) -> Result<Template>;

    /// Start a simulation run from a configured session.
    async fn start(&self, request: StartRequest) -> Result<()>;

    /// Advance the named run by `count` steps.
    async fn run(&self, sim_code: &str, count: u32) -> Result<()>;

    /// Query the lifecycle state of the named run.
    async fn query_status(&self, sim_code: &str) -> Result<RunStatus>;

    /// Fetch the live roster with runtime fields populated.
    async fn personas_info(&self, sim_code: &str) -> Result<Vec<Persona>>;

    /// Fetch full detail for one agent.
    async fn persona_detail(&self, sim_code: &str, agent_name: &str) -> Result<Persona>;

    /// Fire-and-forget operator command, passed as a query parameter.
    async fn send_command(&self, sim_code: &str, command: &str) -> Result<()>;

    /// Send a private chat/interview message to one agent.
    async fn chat(&self, sim_code: &str, request: ChatRequest) -> Result<()>;

    /// Publish a new event into the running simulation.
    async fn publish_event(&self, sim_code: &str, request: EventPublishRequest) -> Result<()>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<()>;
}

pub type BackendBox = Box<dyn SimulationBackend>;
