use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use agora_types::{ChatMessage, LlmConfig, Persona, RunStatus, Template, TemplateSummary};

/// Request to start a simulation run.
///
/// The backend expects camelCase envelope keys and the template's roster as
/// a list rather than the map the wizard edits, so construction goes
/// through [`StartRequest::to_payload`].
#[derive(Debug, Clone)]
pub struct StartRequest {
    /// Name of the new simulation instance.
    pub sim_code: String,
    /// The template with any operator overrides applied.
    pub template: Template,
    pub llm_config: LlmConfig,
    /// Steps to auto-run after start.
    pub initial_rounds: u32,
}

impl StartRequest {
    /// Wire payload for the start endpoint.
    pub fn to_payload(&self) -> Value {
        json!({
            "simCode": self.sim_code,
            "template": {
                "simCode": self.template.sim_code,
                "meta": self.template.meta,
                "events": self.template.events,
                "personas": self.template.persona_list(),
            },
            "llmConfig": self.llm_config,
            "initialRounds": self.initial_rounds,
        })
    }
}

/// Private chat/interview message addressed to one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub agent_name: String,
    /// Interview mode tag; "analysis" for the standard private interview.
    #[serde(rename = "type")]
    pub mode: String,
    /// Prior turns of this agent's transcript.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub content: String,
}

impl ChatRequest {
    pub fn interview(agent_name: &str, history: Vec<ChatMessage>, content: &str) -> ChatRequest {
        ChatRequest {
            agent_name: agent_name.to_string(),
            mode: "analysis".to_string(),
            history,
            content: content.to_string(),
        }
    }
}

/// Event published into a running simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPublishRequest {
    pub description: String,
    pub websearch: String,
    pub policy: String,
    /// Comma-separated agent names; empty means everyone.
    pub access_list: String,
}

impl EventPublishRequest {
    pub fn new(
        description: String,
        websearch: String,
        policy: String,
        access: Vec<String>,
    ) -> EventPublishRequest {
        EventPublishRequest {
            description,
            websearch,
            policy,
            access_list: access.join(","),
        }
    }
}

// Response envelopes, private to the client implementation.

#[derive(Debug, Deserialize)]
pub(crate) struct TemplatesEnvelope {
    #[serde(default)]
    pub envs: Vec<TemplateSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateEnvelope {
    pub meta: TemplateSummary,
    #[serde(default)]
    pub personas: std::collections::BTreeMap<String, Persona>,
    #[serde(default)]
    pub events: Vec<agora_types::SimEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    pub status: RunStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonasEnvelope {
    #[serde(default)]
    pub personas: Vec<Persona>,
}
