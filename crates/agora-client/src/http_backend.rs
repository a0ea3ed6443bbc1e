use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use agora_types::{Persona, RunStatus, Template, TemplateSummary};

use crate::types::{
    ChatRequest, EventPublishRequest, PersonasEnvelope, StartRequest, StatusEnvelope,
    TemplateEnvelope, TemplatesEnvelope,
};
use crate::SimulationBackend;

/// HTTP client for a remote simulation backend.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: String) -> HttpBackend {
        HttpBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> HttpBackend {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Opens the chat/log socket for the named run.
    pub async fn subscribe(&self, sim_code: &str) -> Result<crate::SocketSubscription> {
        crate::SocketSubscription::connect(&self.base_url, sim_code).await
    }
}

#[async_trait]
impl SimulationBackend for HttpBackend {
    async fn fetch_templates(&self) -> Result<Vec<TemplateSummary>> {
        let response = self
            .client
            .get(self.url("/fetch_templates"))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Fetching templates failed: {}", response.status());
        }

        let envelope: TemplatesEnvelope = response.json().await?;
        Ok(envelope.envs)
    }

    async fn fetch_template(&self, sim_code: &str) -> Result<Template> {
        let response = self
            .client
            .get(self.url("/fetch_template"))
            .query(&[("sim_code", sim_code)])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Fetching template '{sim_code}' failed: {}", response.status());
        }

        let envelope: TemplateEnvelope = response.json().await?;
        Ok(Template {
            sim_code: sim_code.to_string(),
            meta: envelope.meta,
            events: envelope.events,
            personas: envelope.personas,
        })
    }

    async fn start(&self, request: StartRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url("/start"))
            .timeout(self.timeout)
            .json(&request.to_payload())
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Starting simulation failed: {}", response.status());
        }

        Ok(())
    }

    async fn run(&self, sim_code: &str, count: u32) -> Result<()> {
        let response = self
            .client
            .get(self.url(&format!("/run/{sim_code}")))
            .query(&[("count", count)])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Advancing simulation failed: {}", response.status());
        }

        Ok(())
    }

    async fn query_status(&self, sim_code: &str) -> Result<RunStatus> {
        let response = self
            .client
            .get(self.url(&format!("/query_status/{sim_code}")))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Status query failed: {}", response.status());
        }

        let envelope: StatusEnvelope = response.json().await?;
        Ok(envelope.status)
    }

    async fn personas_info(&self, sim_code: &str) -> Result<Vec<Persona>> {
        let response = self
            .client
            .get(self.url(&format!("/personas_info/{sim_code}")))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Fetching agent roster failed: {}", response.status());
        }

        let envelope: PersonasEnvelope = response.json().await?;
        Ok(envelope.personas)
    }

    async fn persona_detail(&self, sim_code: &str, agent_name: &str) -> Result<Persona> {
        let response = self
            .client
            .get(self.url(&format!("/persona_detail/{sim_code}")))
            .query(&[("agent_name", agent_name)])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Fetching detail for '{agent_name}' failed: {}", response.status());
        }

        Ok(response.json().await?)
    }

    async fn send_command(&self, sim_code: &str, command: &str) -> Result<()> {
        let response = self
            .client
            .get(self.url(&format!("/add_command/{sim_code}")))
            .query(&[("command", command)])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Sending command failed: {}", response.status());
        }

        Ok(())
    }

    async fn chat(&self, sim_code: &str, request: ChatRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/chat/{sim_code}")))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Chat request failed: {}", response.status());
        }

        Ok(())
    }

    async fn publish_event(&self, sim_code: &str, request: EventPublishRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/publish_event/{sim_code}")))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Publishing event failed: {}", response.status());
        }

        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url("/fetch_templates"))
            .timeout(self.timeout)
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => Ok(()),
            Ok(res) => bail!("Backend health check failed: {}", res.status()),
            Err(err) => bail!("Backend is not reachable: {err}"),
        }
    }
}
