//! The configuration wizard's step machine.
//!
//! Steps form a fixed linear sequence. Navigation is pure: a step exposes
//! its neighbors and an index for progress display, and advancement is
//! gated by per-step validation over the current session value. While any
//! validation error exists the advance action is simply inert; there is no
//! cross-step ordering beyond "cannot move past an invalid step".

use std::collections::HashSet;
use std::fmt;

use agora_types::SimulationSession;

use crate::errors::ValidationError;

#[cfg(test)]
#[path = "wizard_test.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Welcome,
    Templates,
    Events,
    Agents,
    LlmConfig,
    Confirm,
    Interact,
}

impl WizardStep {
    pub fn all() -> [WizardStep; 7] {
        return [
            WizardStep::Welcome,
            WizardStep::Templates,
            WizardStep::Events,
            WizardStep::Agents,
            WizardStep::LlmConfig,
            WizardStep::Confirm,
            WizardStep::Interact,
        ];
    }

    /// Zero-based position in the sequence, for progress display.
    pub fn index(&self) -> usize {
        return WizardStep::all()
            .iter()
            .position(|step| step == self)
            .unwrap_or(0);
    }

    pub fn next(&self) -> Option<WizardStep> {
        return WizardStep::all().get(self.index() + 1).copied();
    }

    pub fn prev(&self) -> Option<WizardStep> {
        let index = self.index();
        if index == 0 {
            return None;
        }

        return WizardStep::all().get(index - 1).copied();
    }

    /// Validates the session against this step's requirements.
    ///
    /// `backend_envs` is the list of simulation names already known to the
    /// backend, used for the experiment-name collision check.
    pub fn validate(
        &self,
        session: &SimulationSession,
        backend_envs: &[String],
    ) -> Result<(), ValidationError> {
        match self {
            WizardStep::Welcome | WizardStep::Interact => {
                return Ok(());
            }
            WizardStep::Templates => {
                return validate_template_selected(session);
            }
            WizardStep::Events => {
                return validate_events(session, backend_envs);
            }
            WizardStep::Agents => {
                return validate_roster(session);
            }
            WizardStep::LlmConfig => {
                return validate_llm_config(session);
            }
            WizardStep::Confirm => {
                validate_template_selected(session)?;
                validate_events(session, backend_envs)?;
                validate_roster(session)?;
                return validate_llm_config(session);
            }
        }
    }

    /// Whether the step's advance control is live.
    pub fn is_advance_enabled(&self, session: &SimulationSession, backend_envs: &[String]) -> bool {
        return self.validate(session, backend_envs).is_ok();
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WizardStep::Welcome => "Welcome",
            WizardStep::Templates => "Templates",
            WizardStep::Events => "Events",
            WizardStep::Agents => "Agents",
            WizardStep::LlmConfig => "Language model",
            WizardStep::Confirm => "Confirm",
            WizardStep::Interact => "Interact",
        };

        return write!(f, "{label}");
    }
}

/// Parses operator round-count input. The session stores a `u32`; anything
/// that does not parse as a non-negative integer is rejected with the raw
/// input echoed back.
pub fn parse_rounds(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();

    return trimmed
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidRounds(trimmed.to_string()));
}

fn validate_template_selected(session: &SimulationSession) -> Result<(), ValidationError> {
    let selected = session
        .template_code
        .as_deref()
        .is_some_and(|code| !code.trim().is_empty());

    if !selected || session.current_template.is_none() {
        return Err(ValidationError::NoTemplateSelected);
    }

    return Ok(());
}

fn validate_events(
    session: &SimulationSession,
    backend_envs: &[String],
) -> Result<(), ValidationError> {
    if let Some(template) = &session.current_template {
        for event in &template.events {
            if event.description.trim().is_empty() {
                return Err(ValidationError::EmptyEventDescription(event.name.clone()));
            }
        }
    }

    let sim_code = session
        .curr_sim_code
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if sim_code.is_empty() {
        return Err(ValidationError::MissingSimCode);
    }

    let template_taken = session.all_templates.iter().any(|template| {
        template.template_sim_code == sim_code || template.name == sim_code
    });
    let env_taken = backend_envs.iter().any(|env| env == sim_code);
    if template_taken || env_taken {
        return Err(ValidationError::SimCodeTaken(sim_code.to_string()));
    }

    return Ok(());
}

fn validate_roster(session: &SimulationSession) -> Result<(), ValidationError> {
    let Some(template) = &session.current_template else {
        return Err(ValidationError::EmptyRoster);
    };
    if template.personas.is_empty() {
        return Err(ValidationError::EmptyRoster);
    }

    let mut seen = HashSet::new();
    for (key, persona) in &template.personas {
        let display = persona.display_name();
        if display.trim().is_empty() {
            return Err(ValidationError::UnnamedAgent(key.clone()));
        }
        if !seen.insert(display.clone()) {
            return Err(ValidationError::DuplicateAgentName(display));
        }
    }

    return Ok(());
}

fn validate_llm_config(session: &SimulationSession) -> Result<(), ValidationError> {
    let Some(config) = &session.llm_config else {
        return Err(ValidationError::MissingLlmConfig);
    };

    if config.base_url.trim().is_empty() {
        return Err(ValidationError::InvalidLlmField {
            field: "api_base",
            message: "must not be empty".to_string(),
        });
    }
    if config.engine.trim().is_empty() {
        return Err(ValidationError::InvalidLlmField {
            field: "engine",
            message: "must not be empty".to_string(),
        });
    }
    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ValidationError::InvalidLlmField {
            field: "temperature",
            message: format!("{} is outside [0, 2]", config.temperature),
        });
    }
    if !(0.0..=1.0).contains(&config.top_p) {
        return Err(ValidationError::InvalidLlmField {
            field: "top_p",
            message: format!("{} is outside [0, 1]", config.top_p),
        });
    }
    if config.max_tokens == 0 {
        return Err(ValidationError::InvalidLlmField {
            field: "max_tokens",
            message: "must be greater than zero".to_string(),
        });
    }

    return Ok(());
}
