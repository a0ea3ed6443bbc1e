//! Core wire and session types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Summary of a simulation template, as stored in the backend's meta records.
///
/// This is the read-only shape returned by the template listing endpoint and
/// embedded as `meta` in a full [`Template`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TemplateSummary {
    /// Identifier of the template on the backend.
    #[serde(default)]
    pub template_sim_code: String,
    /// Human-readable template name.
    #[serde(default)]
    pub name: String,
    /// Short description shown in the template picker.
    #[serde(default)]
    pub description: String,
    /// Bullet highlights for the template card.
    #[serde(default)]
    pub bullets: Vec<String>,
    /// Simulated-world start date.
    #[serde(default)]
    pub start_date: String,
    /// Simulated-world current time.
    #[serde(default)]
    pub curr_time: String,
    /// Simulated seconds that elapse per step.
    #[serde(default)]
    pub sec_per_step: u64,
    /// Name of the maze/environment the template runs in.
    #[serde(default)]
    pub maze_name: String,
    /// Names of the agents the template ships with.
    #[serde(default)]
    pub persona_names: Vec<String>,
    /// Step counter the template was saved at.
    #[serde(default)]
    pub step: u64,
    /// Simulation mode tag (e.g. "online", "offline").
    #[serde(default)]
    pub sim_mode: String,
}

/// A discussion topic or social situation injected into a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SimEvent {
    /// Display name of the event.
    #[serde(default)]
    pub name: String,
    /// Policy text constraining how agents react.
    #[serde(default)]
    pub policy: String,
    /// Web-search keywords; empty disables search augmentation.
    #[serde(default)]
    pub websearch: String,
    /// Free-text description of the event.
    #[serde(default)]
    pub description: String,
}

/// A simulated character driven by the language model.
///
/// The biographical fields are always present on a template; the runtime
/// fields are only populated once a simulation is live and the backend
/// reports per-agent detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Persona {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: u32,
    /// Standing requirements for the agent's daily plan.
    #[serde(default)]
    pub daily_plan_req: String,
    /// Innate personality traits.
    #[serde(default)]
    pub innate: String,
    /// Learned background knowledge.
    #[serde(default)]
    pub learned: String,
    #[serde(default)]
    pub lifestyle: String,
    #[serde(default)]
    pub living_area: String,
    #[serde(default)]
    pub bibliography: String,

    // Runtime-only fields, absent until the simulation is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curr_tile: Option<(i32, i32)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planned_path: Vec<(i32, i32)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plan: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory: Vec<String>,
}

impl Persona {
    /// Full display name, falling back to the roster key when the
    /// biographical names are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            return self.name.clone();
        }
        full.to_string()
    }
}

/// A fully hydrated template under edit in the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Template {
    /// Backend identifier the template was fetched as.
    #[serde(default)]
    pub sim_code: String,
    pub meta: TemplateSummary,
    #[serde(default)]
    pub events: Vec<SimEvent>,
    /// Agent roster, keyed by agent name.
    #[serde(default)]
    pub personas: BTreeMap<String, Persona>,
}

impl Template {
    /// Roster as an ordered list, the shape the start payload expects.
    pub fn persona_list(&self) -> Vec<Persona> {
        self.personas.values().cloned().collect()
    }
}

/// Language-model connection parameters, serialized with the keys the
/// backend's config parser reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider tag ("openai", "azure", ...).
    #[serde(rename = "type", default)]
    pub provider: String,
    #[serde(rename = "api_base", default)]
    pub base_url: String,
    #[serde(rename = "api_key", default)]
    pub api_key: String,
    #[serde(default)]
    pub engine: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stream: bool,
}

impl Default for LlmConfig {
    fn default() -> LlmConfig {
        // Mirrors the backend's own fallbacks.
        LlmConfig {
            provider: String::new(),
            base_url: String::new(),
            api_key: String::new(),
            engine: String::new(),
            temperature: 1.0,
            max_tokens: 512,
            top_p: 0.7,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stream: false,
        }
    }
}

/// Lifecycle of a simulation run as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Steps are currently executing.
    Running,
    /// The instance exists but is idle.
    Started,
    /// The instance is gone.
    Terminated,
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[default]
    Agent,
}

/// Whether a message was broadcast to everyone or part of a one-on-one
/// interview transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatScope {
    #[default]
    Public,
    Private,
}

/// A single chat message, in the shape the broadcast stream delivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChatMessage {
    /// Agent name, or the operator's handle.
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub role: ChatRole,
    #[serde(rename = "type", default)]
    pub scope: ChatScope,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    /// Topic the message belongs to, if any.
    #[serde(default)]
    pub subject: String,
}

/// The single persisted entity: everything the configuration wizard has
/// accumulated for one not-yet-submitted simulation instance, plus the
/// transcripts and logs of a live run.
///
/// Serialized with the camelCase keys the console has always persisted, so
/// existing session files stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationSession {
    /// Steps are executing right now.
    pub is_running: bool,
    /// The run was submitted to the backend.
    pub is_started: bool,
    /// Template the wizard is configuring.
    pub template_code: Option<String>,
    /// Name of the new simulation instance being created.
    pub curr_sim_code: Option<String>,
    /// Read-only cache of the backend's template listing.
    pub all_templates: Vec<TemplateSummary>,
    /// The template under edit. At most one; selecting a new template
    /// replaces this wholesale and discards unsaved edits.
    pub current_template: Option<Template>,
    pub llm_config: Option<LlmConfig>,
    /// Steps to auto-run right after start.
    pub initial_rounds: u32,
    /// Broadcast transcript, in arrival order.
    pub public_messages: Vec<ChatMessage>,
    /// Per-agent interview transcripts, keyed by agent name.
    pub private_messages: BTreeMap<String, Vec<ChatMessage>>,
    /// Raw log lines streamed from the backend.
    pub logs: Vec<String>,
}

impl SimulationSession {
    /// Appends a message to the named agent's private transcript,
    /// preserving the order of prior entries.
    pub fn push_private_message(&mut self, agent: &str, message: ChatMessage) {
        self.private_messages
            .entry(agent.to_string())
            .or_default()
            .push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_is_the_documented_empty_object() {
        let session = SimulationSession::default();
        assert!(!session.is_running);
        assert!(!session.is_started);
        assert!(session.template_code.is_none());
        assert!(session.curr_sim_code.is_none());
        assert!(session.all_templates.is_empty());
        assert!(session.current_template.is_none());
        assert!(session.llm_config.is_none());
        assert_eq!(session.initial_rounds, 0);
        assert!(session.public_messages.is_empty());
        assert!(session.private_messages.is_empty());
        assert!(session.logs.is_empty());
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut session = SimulationSession {
            template_code: Some("base_village".to_string()),
            curr_sim_code: Some("my_experiment".to_string()),
            initial_rounds: 3,
            ..Default::default()
        };
        session.push_private_message(
            "Isabella Rodriguez",
            ChatMessage {
                sender: "operator".to_string(),
                role: ChatRole::User,
                scope: ChatScope::Private,
                content: "hello".to_string(),
                ..Default::default()
            },
        );

        let json = serde_json::to_string(&session).unwrap();
        let parsed: SimulationSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn session_persists_with_camel_case_keys() {
        let session = SimulationSession {
            curr_sim_code: Some("exp".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"currSimCode\""));
        assert!(json.contains("\"initialRounds\""));
        assert!(json.contains("\"publicMessages\""));
    }

    #[test]
    fn llm_config_serializes_backend_keys() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            base_url: "http://llm.local/v1".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "openai");
        assert_eq!(json["api_base"], "http://llm.local/v1");
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn llm_config_fills_missing_fields_from_backend_defaults() {
        // Connection-only configs leave the sampling knobs to the backend's
        // fallbacks.
        let config: LlmConfig = serde_json::from_value(serde_json::json!({
            "type": "openai",
            "api_base": "http://llm.local/v1",
            "api_key": "sk-test",
            "engine": "gpt-4o",
        }))
        .unwrap();

        assert_eq!(config.provider, "openai");
        assert_eq!(config.engine, "gpt-4o");
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.top_p, 0.7);
        assert!(!config.stream);
    }

    #[test]
    fn run_status_parses_backend_strings() {
        assert_eq!(
            serde_json::from_str::<RunStatus>("\"running\"").unwrap(),
            RunStatus::Running
        );
        assert_eq!(
            serde_json::from_str::<RunStatus>("\"terminated\"").unwrap(),
            RunStatus::Terminated
        );
    }

    #[test]
    fn persona_display_name_falls_back_to_roster_key() {
        let persona = Persona {
            name: "Klaus Mueller".to_string(),
            ..Default::default()
        };
        assert_eq!(persona.display_name(), "Klaus Mueller");

        let persona = Persona {
            name: "klaus".to_string(),
            first_name: "Klaus".to_string(),
            last_name: "Mueller".to_string(),
            ..Default::default()
        };
        assert_eq!(persona.display_name(), "Klaus Mueller");
    }
}
