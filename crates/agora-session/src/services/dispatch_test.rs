use std::sync::Arc;
use std::sync::Mutex;

use agora_client::ChatRequest;
use agora_client::SimulationBackend;
use agora_client::StartRequest;
use agora_types::ChatMessage;
use agora_types::ChatRole;
use agora_types::Persona;
use agora_types::RunStatus;
use agora_types::SimulationSession;
use agora_types::Template;
use agora_types::TemplateSummary;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::*;

#[derive(Clone, Default)]
struct RecordingBackend {
    calls: Arc<Mutex<Vec<String>>>,
    fail_commands: bool,
    status: Option<RunStatus>,
}

impl RecordingBackend {
    fn calls(&self) -> Vec<String> {
        return self.calls.lock().unwrap().clone();
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SimulationBackend for RecordingBackend {
    async fn fetch_templates(&self) -> Result<Vec<TemplateSummary>> {
        return Ok(vec![]);
    }

    async fn fetch_template(&self, _sim_code: &str) -> Result<Template> {
        return Ok(Template::default());
    }

    async fn start(&self, request: StartRequest) -> Result<()> {
        self.record(format!("start {}", request.sim_code));
        return Ok(());
    }

    async fn run(&self, sim_code: &str, count: u32) -> Result<()> {
        self.record(format!("run {sim_code} {count}"));
        return Ok(());
    }

    async fn query_status(&self, _sim_code: &str) -> Result<RunStatus> {
        return Ok(self.status.unwrap_or(RunStatus::Started));
    }

    async fn personas_info(&self, _sim_code: &str) -> Result<Vec<Persona>> {
        return Ok(vec![]);
    }

    async fn persona_detail(&self, _sim_code: &str, _agent_name: &str) -> Result<Persona> {
        return Ok(Persona::default());
    }

    async fn send_command(&self, sim_code: &str, command: &str) -> Result<()> {
        if self.fail_commands {
            bail!("backend rejected the command");
        }
        self.record(format!("command {sim_code} {command}"));
        return Ok(());
    }

    async fn chat(&self, sim_code: &str, request: ChatRequest) -> Result<()> {
        self.record(format!(
            "chat {sim_code} {} history={}",
            request.agent_name,
            request.history.len()
        ));
        return Ok(());
    }

    async fn publish_event(&self, sim_code: &str, request: EventPublishRequest) -> Result<()> {
        self.record(format!("publish {sim_code} {}", request.description));
        return Ok(());
    }

    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }
}

fn started_store() -> SessionStore {
    let store = SessionStore::in_memory();
    let mut session = SimulationSession::default();
    session.curr_sim_code = Some("my_experiment".to_string());
    session.is_started = true;
    store.write(session).unwrap();

    return store;
}

async fn drain(backend: RecordingBackend, store: SessionStore, actions: Vec<Action>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    for action in actions {
        tx.send(action).unwrap();
    }
    drop(tx);

    DispatchService::start(Box::new(backend), store, &mut rx)
        .await
        .unwrap();
}

#[tokio::test]
async fn it_appends_the_operator_message_before_sending_chat() {
    let backend = RecordingBackend::default();
    let store = started_store();

    let mut session = store.read();
    session.push_private_message(
        "Klaus Mueller",
        ChatMessage {
            sender: "Klaus Mueller".to_string(),
            content: "earlier reply".to_string(),
            ..Default::default()
        },
    );
    store.write(session).unwrap();

    drain(
        backend.clone(),
        store.clone(),
        vec![Action::SendChat {
            agent: "Klaus Mueller".to_string(),
            content: "how was the meeting?".to_string(),
        }],
    )
    .await;

    let transcript = &store.read().private_messages["Klaus Mueller"];
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].content, "earlier reply");
    assert_eq!(transcript[1].sender, OPERATOR_HANDLE);
    assert_eq!(transcript[1].role, ChatRole::User);
    assert_eq!(transcript[1].content, "how was the meeting?");

    // The request carried the full two-entry history.
    assert_eq!(
        backend.calls(),
        vec!["chat my_experiment Klaus Mueller history=2"]
    );
}

#[tokio::test]
async fn failures_are_swallowed_and_the_service_keeps_draining() {
    let backend = RecordingBackend {
        fail_commands: true,
        ..Default::default()
    };
    let store = started_store();

    drain(
        backend.clone(),
        store.clone(),
        vec![
            Action::SendCommand("pause".to_string()),
            Action::RunRounds(2),
        ],
    )
    .await;

    // The failed command left no trace; the next action still ran.
    assert_eq!(backend.calls(), vec!["run my_experiment 2"]);
    assert!(store.read().is_running);
}

#[tokio::test]
async fn query_status_refreshes_the_lifecycle_flags() {
    let backend = RecordingBackend {
        status: Some(RunStatus::Terminated),
        ..Default::default()
    };
    let store = started_store();

    drain(backend, store.clone(), vec![Action::QueryStatus]).await;

    let session = store.read();
    assert!(!session.is_running);
    assert!(!session.is_started);
}

#[tokio::test]
async fn actions_without_a_configured_simulation_reach_no_backend() {
    let backend = RecordingBackend::default();
    let store = SessionStore::in_memory();

    drain(
        backend.clone(),
        store,
        vec![Action::SendCommand("pause".to_string())],
    )
    .await;

    assert!(backend.calls().is_empty());
}
