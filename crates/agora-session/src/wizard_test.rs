use std::collections::BTreeMap;

use agora_types::LlmConfig;
use agora_types::Persona;
use agora_types::SimEvent;
use agora_types::SimulationSession;
use agora_types::Template;
use agora_types::TemplateSummary;

use super::*;
use crate::errors::ValidationError;

fn persona(name: &str) -> Persona {
    return Persona {
        name: name.to_string(),
        ..Default::default()
    };
}

fn configured_session() -> SimulationSession {
    let mut personas = BTreeMap::new();
    personas.insert("Isabella Rodriguez".to_string(), persona("Isabella Rodriguez"));
    personas.insert("Klaus Mueller".to_string(), persona("Klaus Mueller"));

    return SimulationSession {
        template_code: Some("base_village".to_string()),
        curr_sim_code: Some("my_experiment".to_string()),
        current_template: Some(Template {
            sim_code: "base_village".to_string(),
            meta: TemplateSummary::default(),
            events: vec![SimEvent {
                name: "town meeting".to_string(),
                description: "a meeting about the harvest".to_string(),
                ..Default::default()
            }],
            personas,
        }),
        llm_config: Some(LlmConfig {
            provider: "openai".to_string(),
            base_url: "http://llm.local/v1".to_string(),
            engine: "gpt-4o".to_string(),
            ..Default::default()
        }),
        ..Default::default()
    };
}

#[test]
fn steps_form_a_fixed_linear_sequence() {
    assert_eq!(WizardStep::Welcome.index(), 0);
    assert_eq!(WizardStep::Welcome.prev(), None);
    assert_eq!(WizardStep::Welcome.next(), Some(WizardStep::Templates));
    assert_eq!(WizardStep::Confirm.next(), Some(WizardStep::Interact));
    assert_eq!(WizardStep::Interact.next(), None);
    assert_eq!(WizardStep::Interact.prev(), Some(WizardStep::Confirm));
}

#[test]
fn welcome_always_allows_advancing() {
    let session = SimulationSession::default();
    assert!(WizardStep::Welcome.is_advance_enabled(&session, &[]));
}

#[test]
fn templates_step_requires_a_selection() {
    let mut session = SimulationSession::default();
    assert_eq!(
        WizardStep::Templates.validate(&session, &[]),
        Err(ValidationError::NoTemplateSelected)
    );

    session = configured_session();
    assert!(WizardStep::Templates.validate(&session, &[]).is_ok());
}

#[test]
fn an_empty_event_description_disables_advancing() {
    let mut session = configured_session();
    session
        .current_template
        .as_mut()
        .unwrap()
        .events
        .push(SimEvent {
            name: "festival".to_string(),
            description: "   ".to_string(),
            ..Default::default()
        });

    assert_eq!(
        WizardStep::Events.validate(&session, &[]),
        Err(ValidationError::EmptyEventDescription("festival".to_string()))
    );
    assert!(!WizardStep::Events.is_advance_enabled(&session, &[]));
}

#[test]
fn experiment_name_collisions_are_rejected() {
    let mut session = configured_session();
    session.all_templates.push(TemplateSummary {
        template_sim_code: "my_experiment".to_string(),
        ..Default::default()
    });

    assert_eq!(
        WizardStep::Events.validate(&session, &[]),
        Err(ValidationError::SimCodeTaken("my_experiment".to_string()))
    );

    session.all_templates.clear();
    let envs = vec!["my_experiment".to_string()];
    assert_eq!(
        WizardStep::Events.validate(&session, &envs),
        Err(ValidationError::SimCodeTaken("my_experiment".to_string()))
    );

    assert!(WizardStep::Events.validate(&session, &[]).is_ok());
}

#[test]
fn a_missing_experiment_name_is_rejected() {
    let mut session = configured_session();
    session.curr_sim_code = Some("  ".to_string());

    assert_eq!(
        WizardStep::Events.validate(&session, &[]),
        Err(ValidationError::MissingSimCode)
    );
}

#[test]
fn round_input_must_parse_as_a_non_negative_integer() {
    assert_eq!(parse_rounds("3").unwrap(), 3);
    assert_eq!(parse_rounds(" 0 ").unwrap(), 0);
    assert_eq!(
        parse_rounds("-1"),
        Err(ValidationError::InvalidRounds("-1".to_string()))
    );
    assert_eq!(
        parse_rounds("many"),
        Err(ValidationError::InvalidRounds("many".to_string()))
    );
}

#[test]
fn the_roster_must_be_non_empty_with_unique_names() {
    let mut session = configured_session();
    session.current_template.as_mut().unwrap().personas.clear();
    assert_eq!(
        WizardStep::Agents.validate(&session, &[]),
        Err(ValidationError::EmptyRoster)
    );

    let mut session = configured_session();
    let roster = &mut session.current_template.as_mut().unwrap().personas;
    roster.insert("isabella_clone".to_string(), persona("Isabella Rodriguez"));
    assert_eq!(
        WizardStep::Agents.validate(&session, &[]),
        Err(ValidationError::DuplicateAgentName(
            "Isabella Rodriguez".to_string()
        ))
    );
}

#[test]
fn llm_config_bounds_are_enforced() {
    let mut session = configured_session();
    assert!(WizardStep::LlmConfig.validate(&session, &[]).is_ok());

    session.llm_config = None;
    assert_eq!(
        WizardStep::LlmConfig.validate(&session, &[]),
        Err(ValidationError::MissingLlmConfig)
    );

    let mut session = configured_session();
    session.llm_config.as_mut().unwrap().temperature = 2.5;
    assert!(matches!(
        WizardStep::LlmConfig.validate(&session, &[]),
        Err(ValidationError::InvalidLlmField {
            field: "temperature",
            ..
        })
    ));

    let mut session = configured_session();
    session.llm_config.as_mut().unwrap().max_tokens = 0;
    assert!(matches!(
        WizardStep::LlmConfig.validate(&session, &[]),
        Err(ValidationError::InvalidLlmField {
            field: "max_tokens",
            ..
        })
    ));
}

#[test]
fn confirm_requires_every_prior_step_to_pass() {
    let session = configured_session();
    assert!(WizardStep::Confirm.validate(&session, &[]).is_ok());

    let mut broken = configured_session();
    broken.llm_config = None;
    assert_eq!(
        WizardStep::Confirm.validate(&broken, &[]),
        Err(ValidationError::MissingLlmConfig)
    );
}
