//! Outbound action dispatch.
//!
//! Interactive surfaces push [`Action`]s onto an unbounded channel and move
//! on; this service drains the channel and performs one backend request per
//! action, sequentially. There is no retry, no queueing beyond the channel
//! itself, and no backoff. A failed request is logged and dropped, and the
//! service keeps consuming.

use agora_client::BackendBox;
use agora_client::ChatRequest;
use agora_client::EventPublishRequest;
use agora_types::ChatMessage;
use agora_types::ChatRole;
use agora_types::ChatScope;
use agora_types::RunStatus;
use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use crate::store::SessionStore;

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;

/// Name chat transcripts record for the human operator.
pub const OPERATOR_HANDLE: &str = "operator";

#[derive(Debug, Clone)]
pub enum Action {
    /// Fire-and-forget command line for the running simulation.
    SendCommand(String),
    /// Private interview message to one agent.
    SendChat { agent: String, content: String },
    /// Inject a new event into the running simulation.
    PublishEvent(EventPublishRequest),
    /// Advance the run by the given number of steps.
    RunRounds(u32),
    /// Refresh the session's lifecycle flags from the backend.
    QueryStatus,
}

pub struct DispatchService {}

impl DispatchService {
    /// Drains the action channel until every sender is gone.
    pub async fn start(
        backend: BackendBox,
        store: SessionStore,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        while let Some(action) = rx.recv().await {
            if let Err(err) = dispatch(backend.as_ref(), &store, action).await {
                log::error!("Backend request failed: {err:?}");
            }
        }

        return Ok(());
    }
}

async fn dispatch(
    backend: &dyn agora_client::SimulationBackend,
    store: &SessionStore,
    action: Action,
) -> Result<()> {
    let sim_code = current_sim_code(store)?;

    match action {
        Action::SendCommand(command) => {
            return backend.send_command(&sim_code, &command).await;
        }
        Action::SendChat { agent, content } => {
            return send_chat(backend, store, &sim_code, &agent, &content).await;
        }
        Action::PublishEvent(request) => {
            return backend.publish_event(&sim_code, request).await;
        }
        Action::RunRounds(count) => {
            backend.run(&sim_code, count).await?;
            let mut session = store.read();
            session.is_running = true;
            store.write(session)?;
            return Ok(());
        }
        Action::QueryStatus => {
            let status = backend.query_status(&sim_code).await?;
            let mut session = store.read();
            session.is_running = status == RunStatus::Running;
            session.is_started = status != RunStatus::Terminated;
            store.write(session)?;
            return Ok(());
        }
    }
}

/// Records the operator's own message in the agent's transcript, then sends
/// the full history to the backend. The local append happens first so the
/// transcript shows the question even when the request fails.
async fn send_chat(
    backend: &dyn agora_client::SimulationBackend,
    store: &SessionStore,
    sim_code: &str,
    agent: &str,
    content: &str,
) -> Result<()> {
    let mut session = store.read();
    session.push_private_message(
        agent,
        ChatMessage {
            sender: OPERATOR_HANDLE.to_string(),
            role: ChatRole::User,
            scope: ChatScope::Private,
            content: content.to_string(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            subject: agent.to_string(),
        },
    );
    let history = session
        .private_messages
        .get(agent)
        .cloned()
        .unwrap_or_default();
    store.write(session)?;

    let request = ChatRequest::interview(agent, history, content);
    return backend.chat(sim_code, request).await;
}

fn current_sim_code(store: &SessionStore) -> Result<String> {
    let session = store.read();
    let Some(sim_code) = session.curr_sim_code else {
        bail!("No simulation is configured; run the wizard first");
    };

    return Ok(sim_code);
}
