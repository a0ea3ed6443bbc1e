use std::fs::OpenOptions;
use std::path::PathBuf;

use agora_client::BackendBox;
use agora_client::EventPublishRequest;
use agora_client::HttpBackend;
use agora_client::SimulationBackend;
use agora_client::StartRequest;
use agora_session::wizard::parse_rounds;
use agora_session::Action;
use agora_session::DispatchService;
use agora_session::SessionScope;
use agora_session::SessionStore;
use agora_session::StreamService;
use agora_session::WizardStep;
use agora_types::ChatScope;
use agora_types::LlmConfig;
use agora_types::SimEvent;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use log::LevelFilter;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[clap(
    name = "agora",
    version = "0.1.0",
    about = "Operator console for a multi-agent social-simulation backend"
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, default_value = "http://127.0.0.1:8000")]
    server_url: String,

    #[clap(long, help = "Session file path (defaults to the platform cache dir)")]
    session_file: Option<PathBuf>,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the templates available on the backend
    Templates,
    /// Show one template in full
    Template { code: String },
    /// Configure the next simulation, step by step
    Wizard {
        #[clap(subcommand)]
        action: WizardCommands,
    },
    /// Submit the configured simulation to the backend
    Start,
    /// Advance the running simulation by N steps
    Run {
        #[clap(default_value = "1")]
        count: u32,
    },
    /// Query the lifecycle state of the running simulation
    Status,
    /// List the live agent roster
    Agents,
    /// Show full detail for one agent
    Agent { name: String },
    /// Send a private interview message to one agent
    Chat { agent: String, message: String },
    /// Send a fire-and-forget command to the running simulation
    Command { command: String },
    /// Publish a new event into the running simulation
    Publish {
        description: String,

        #[clap(long, default_value = "")]
        policy: String,

        #[clap(long, default_value = "", help = "Web-search keywords; empty disables search")]
        websearch: String,

        #[clap(long = "agent", help = "Restrict the event to the named agents")]
        access: Vec<String>,
    },
    /// Stream chat and log frames until Ctrl-C
    Watch,
    /// Wipe the session and return to a blank slate
    Reset,
}

#[derive(Subcommand, Debug)]
enum WizardCommands {
    /// Select a template; replaces the one under edit and discards its edits
    Select { code: String },
    /// Edit the selected template's events
    Events {
        #[clap(subcommand)]
        action: EventCommands,
    },
    /// Edit the selected template's agent roster
    Agents {
        #[clap(subcommand)]
        action: AgentCommands,
    },
    /// Configure the language model
    Llm {
        #[clap(long, help = "YAML file holding the connection parameters")]
        file: Option<PathBuf>,

        #[clap(long)]
        provider: Option<String>,

        #[clap(long)]
        api_base: Option<String>,

        #[clap(long)]
        api_key: Option<String>,

        #[clap(long)]
        engine: Option<String>,

        #[clap(long)]
        temperature: Option<f32>,

        #[clap(long)]
        max_tokens: Option<u32>,

        #[clap(long)]
        top_p: Option<f32>,
    },
    /// Set how many steps run right after start
    Rounds { count: String },
    /// Name the new simulation instance
    Name { sim_code: String },
    /// Show each step's validation state
    Status,
}

#[derive(Subcommand, Debug)]
enum EventCommands {
    Add {
        name: String,

        #[clap(long)]
        description: String,

        #[clap(long, default_value = "")]
        policy: String,

        #[clap(long, default_value = "")]
        websearch: String,
    },
    Edit {
        name: String,

        #[clap(long)]
        description: Option<String>,

        #[clap(long)]
        policy: Option<String>,

        #[clap(long)]
        websearch: Option<String>,
    },
    Remove {
        name: String,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum AgentCommands {
    List,
    /// Tweak one agent's biography
    Edit {
        name: String,

        #[clap(long)]
        first_name: Option<String>,

        #[clap(long)]
        last_name: Option<String>,

        #[clap(long)]
        age: Option<u32>,

        #[clap(long)]
        innate: Option<String>,

        #[clap(long)]
        learned: Option<String>,

        #[clap(long)]
        lifestyle: Option<String>,

        #[clap(long)]
        living_area: Option<String>,

        #[clap(long)]
        daily_plan: Option<String>,
    },
    Remove {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(&cli)?;

    let store = match &cli.session_file {
        Some(path) => SessionStore::open(path)?,
        None => SessionStore::open_default()?,
    };

    let mut scope = SessionScope::empty();
    scope.install(store);

    let backend = HttpBackend::new(cli.server_url.clone());

    match cli.command {
        Commands::Templates => list_templates(&backend, &scope).await,
        Commands::Template { code } => show_template(&backend, &code).await,
        Commands::Wizard { action } => run_wizard(&backend, &scope, action).await,
        Commands::Start => start_simulation(&backend, &scope).await,
        Commands::Run { count } => dispatch_one(backend, &scope, Action::RunRounds(count)).await,
        Commands::Status => show_status(&backend, &scope).await,
        Commands::Agents => list_agents(&backend, &scope).await,
        Commands::Agent { name } => show_agent(&backend, &scope, &name).await,
        Commands::Chat { agent, message } => {
            dispatch_one(
                backend,
                &scope,
                Action::SendChat {
                    agent,
                    content: message,
                },
            )
            .await
        }
        Commands::Command { command } => {
            dispatch_one(backend, &scope, Action::SendCommand(command)).await
        }
        Commands::Publish {
            description,
            policy,
            websearch,
            access,
        } => {
            let request = EventPublishRequest::new(description, websearch, policy, access);
            dispatch_one(backend, &scope, Action::PublishEvent(request)).await
        }
        Commands::Watch => watch(&backend, &scope).await,
        Commands::Reset => {
            scope.handle()?.clear()?;
            println!("Session cleared.");
            Ok(())
        }
    }
}

fn init_logger(cli: &Cli) -> Result<()> {
    let level = cli.log_level.parse().unwrap_or(LevelFilter::Info);

    // Watch mode keeps stdout for the stream itself; logs go to a file.
    if matches!(cli.command, Commands::Watch) {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open("agora.log")
            .context("Failed to open agora.log")?;

        env_logger::Builder::new()
            .filter_level(level)
            .target(env_logger::Target::Pipe(Box::new(log_file)))
            .init();

        return Ok(());
    }

    env_logger::Builder::new().filter_level(level).init();
    return Ok(());
}

async fn list_templates(backend: &HttpBackend, scope: &SessionScope) -> Result<()> {
    let templates = backend.fetch_templates().await?;

    // Refresh the read-only cache used for name-collision checks.
    let store = scope.handle()?;
    let mut session = store.read();
    session.all_templates = templates.clone();
    store.write(session)?;

    if templates.is_empty() {
        println!("No templates available.");
        return Ok(());
    }

    for template in templates {
        println!(
            "{}  ({} agents)  {}",
            template.template_sim_code,
            template.persona_names.len(),
            template.description
        );
    }

    return Ok(());
}

async fn show_template(backend: &HttpBackend, code: &str) -> Result<()> {
    let template = backend.fetch_template(code).await?;

    println!("{}: {}", template.sim_code, template.meta.description);
    println!("  world: {}  step: {}", template.meta.maze_name, template.meta.step);
    println!("  events:");
    for event in &template.events {
        println!("    {} - {}", event.name, event.description);
    }
    println!("  agents:");
    for persona in template.persona_list() {
        println!("    {} ({})", persona.display_name(), persona.age);
    }

    return Ok(());
}

async fn run_wizard(
    backend: &HttpBackend,
    scope: &SessionScope,
    action: WizardCommands,
) -> Result<()> {
    let store = scope.handle()?;

    match action {
        WizardCommands::Select { code } => {
            let template = backend.fetch_template(&code).await?;
            let templates = backend.fetch_templates().await?;

            let mut session = store.read();
            session.template_code = Some(code.clone());
            session.current_template = Some(template);
            session.all_templates = templates;
            store.write(session)?;

            println!("Selected template '{code}'. Prior edits were discarded.");
        }
        WizardCommands::Events { action } => {
            edit_events(&store, action)?;
        }
        WizardCommands::Agents { action } => {
            edit_agents(&store, action)?;
        }
        WizardCommands::Llm {
            file,
            provider,
            api_base,
            api_key,
            engine,
            temperature,
            max_tokens,
            top_p,
        } => {
            let mut session = store.read();
            let mut config = match file {
                Some(path) => load_llm_file(&path)?,
                None => session.llm_config.clone().unwrap_or_default(),
            };

            if let Some(value) = provider {
                config.provider = value;
            }
            if let Some(value) = api_base {
                config.base_url = value;
            }
            if let Some(value) = api_key {
                config.api_key = value;
            }
            if let Some(value) = engine {
                config.engine = value;
            }
            if let Some(value) = temperature {
                config.temperature = value;
            }
            if let Some(value) = max_tokens {
                config.max_tokens = value;
            }
            if let Some(value) = top_p {
                config.top_p = value;
            }

            session.llm_config = Some(config);
            store.write(session)?;
            println!("Language model configured.");
        }
        WizardCommands::Rounds { count } => {
            let rounds = parse_rounds(&count)?;
            let mut session = store.read();
            session.initial_rounds = rounds;
            store.write(session)?;
            println!("Initial rounds set to {rounds}.");
        }
        WizardCommands::Name { sim_code } => {
            let mut session = store.read();
            session.curr_sim_code = Some(sim_code.clone());
            store.write(session)?;
            println!("Simulation will be created as '{sim_code}'.");
        }
        WizardCommands::Status => {
            let session = store.read();
            let envs = backend_env_names(backend).await;

            for step in WizardStep::all() {
                match step.validate(&session, &envs) {
                    Ok(()) => println!("  [ok]   {step}"),
                    Err(err) => println!("  [!]    {step}: {err}"),
                }
            }
        }
    }

    return Ok(());
}

fn edit_events(store: &SessionStore, action: EventCommands) -> Result<()> {
    let mut session = store.read();
    let Some(template) = session.current_template.as_mut() else {
        bail!("No template selected; run 'agora wizard select' first");
    };

    match action {
        EventCommands::Add {
            name,
            description,
            policy,
            websearch,
        } => {
            template.events.push(SimEvent {
                name: name.clone(),
                description,
                policy,
                websearch,
            });
            store.write(session)?;
            println!("Added event '{name}'.");
        }
        EventCommands::Edit {
            name,
            description,
            policy,
            websearch,
        } => {
            let Some(event) = template.events.iter_mut().find(|event| event.name == name) else {
                bail!("No event named '{name}'");
            };
            if let Some(value) = description {
                event.description = value;
            }
            if let Some(value) = policy {
                event.policy = value;
            }
            if let Some(value) = websearch {
                event.websearch = value;
            }
            store.write(session)?;
            println!("Updated event '{name}'.");
        }
        EventCommands::Remove { name } => {
            let before = template.events.len();
            template.events.retain(|event| event.name != name);
            if template.events.len() == before {
                bail!("No event named '{name}'");
            }
            store.write(session)?;
            println!("Removed event '{name}'.");
        }
        EventCommands::List => {
            if template.events.is_empty() {
                println!("No events configured.");
                return Ok(());
            }
            for event in &template.events {
                println!("{}: {}", event.name, event.description);
            }
        }
    }

    return Ok(());
}

fn edit_agents(store: &SessionStore, action: AgentCommands) -> Result<()> {
    let mut session = store.read();
    let Some(template) = session.current_template.as_mut() else {
        bail!("No template selected; run 'agora wizard select' first");
    };

    match action {
        AgentCommands::List => {
            for persona in template.personas.values() {
                println!("{}: {}", persona.display_name(), persona.innate);
            }
        }
        AgentCommands::Edit {
            name,
            first_name,
            last_name,
            age,
            innate,
            learned,
            lifestyle,
            living_area,
            daily_plan,
        } => {
            let Some(persona) = template.personas.get_mut(&name) else {
                bail!("No agent named '{name}' in the roster");
            };
            if let Some(value) = first_name {
                persona.first_name = value;
            }
            if let Some(value) = last_name {
                persona.last_name = value;
            }
            if let Some(value) = age {
                persona.age = value;
            }
            if let Some(value) = innate {
                persona.innate = value;
            }
            if let Some(value) = learned {
                persona.learned = value;
            }
            if let Some(value) = lifestyle {
                persona.lifestyle = value;
            }
            if let Some(value) = living_area {
                persona.living_area = value;
            }
            if let Some(value) = daily_plan {
                persona.daily_plan_req = value;
            }
            store.write(session)?;
            println!("Updated agent '{name}'.");
        }
        AgentCommands::Remove { name } => {
            if template.personas.remove(&name).is_none() {
                bail!("No agent named '{name}' in the roster");
            }
            store.write(session)?;
            println!("Removed agent '{name}'.");
        }
    }

    return Ok(());
}

async fn start_simulation(backend: &HttpBackend, scope: &SessionScope) -> Result<()> {
    let store = scope.handle()?;
    let session = store.read();

    let envs = backend_env_names(backend).await;
    WizardStep::Confirm.validate(&session, &envs)?;

    // Confirm validation guarantees these are present.
    let Some(sim_code) = session.curr_sim_code.clone() else {
        bail!("Experiment name is empty");
    };
    let Some(template) = session.current_template.clone() else {
        bail!("No template selected");
    };
    let Some(llm_config) = session.llm_config.clone() else {
        bail!("No language model configured");
    };

    backend
        .start(StartRequest {
            sim_code: sim_code.clone(),
            template,
            llm_config,
            initial_rounds: session.initial_rounds,
        })
        .await?;

    let mut session = store.read();
    session.is_started = true;
    session.is_running = session.initial_rounds > 0;
    store.write(session)?;

    println!("Simulation '{sim_code}' started.");
    return Ok(());
}

async fn show_status(backend: &HttpBackend, scope: &SessionScope) -> Result<()> {
    let sim_code = configured_sim_code(scope)?;
    let status = backend.query_status(&sim_code).await?;

    println!("{sim_code}: {status:?}");
    return Ok(());
}

async fn list_agents(backend: &HttpBackend, scope: &SessionScope) -> Result<()> {
    let sim_code = configured_sim_code(scope)?;
    let personas = backend.personas_info(&sim_code).await?;

    for persona in personas {
        let currently = persona.currently.clone().unwrap_or_default();
        println!("{}: {}", persona.display_name(), currently);
    }

    return Ok(());
}

async fn show_agent(backend: &HttpBackend, scope: &SessionScope, name: &str) -> Result<()> {
    let sim_code = configured_sim_code(scope)?;
    let persona = backend.persona_detail(&sim_code, name).await?;

    println!("{} ({})", persona.display_name(), persona.age);
    println!("  innate:    {}", persona.innate);
    println!("  learned:   {}", persona.learned);
    println!("  lifestyle: {}", persona.lifestyle);
    if let Some(currently) = &persona.currently {
        println!("  currently: {currently}");
    }
    if let Some(act) = &persona.act_description {
        println!("  doing:     {act}");
    }
    for line in &persona.plan {
        println!("  plan:      {line}");
    }

    return Ok(());
}

/// Pushes a single action through the dispatch service and waits for the
/// channel to drain. Backend failures are logged, not returned, matching
/// the console's fire-and-forget posture.
async fn dispatch_one(backend: HttpBackend, scope: &SessionScope, action: Action) -> Result<()> {
    let store = scope.handle()?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(action)?;
    drop(tx);

    let backend: BackendBox = Box::new(backend);
    DispatchService::start(backend, store, &mut rx).await?;

    return Ok(());
}

async fn watch(backend: &HttpBackend, scope: &SessionScope) -> Result<()> {
    let store = scope.handle()?;
    let sim_code = configured_sim_code(scope)?;

    let mut subscription = backend.subscribe(&sim_code).await?;
    println!("Watching '{sim_code}'. Ctrl-C to stop.");

    loop {
        tokio::select! {
            frame = subscription.next() => {
                let Some(frame) = frame else {
                    println!("Stream closed by the backend.");
                    break;
                };
                print_frame(&frame);
                if let Err(err) = StreamService::apply(&store, frame) {
                    log::error!("Failed to record a streamed frame: {err:?}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    subscription.close();
    return Ok(());
}

fn print_frame(frame: &agora_types::SocketFrame) {
    match frame {
        agora_types::SocketFrame::Chat(message) => {
            let marker = match message.scope {
                ChatScope::Public => "",
                ChatScope::Private => " (private)",
            };
            println!("{}{}: {}", message.sender, marker, message.content);
        }
        agora_types::SocketFrame::Log(line) => {
            println!("{}", line.render());
        }
    }
}

fn configured_sim_code(scope: &SessionScope) -> Result<String> {
    let session = scope.handle()?.read();
    let Some(sim_code) = session.curr_sim_code else {
        bail!("No simulation is configured; run the wizard first");
    };

    return Ok(sim_code);
}

async fn backend_env_names(backend: &HttpBackend) -> Vec<String> {
    // Collision checks degrade gracefully when the backend is unreachable;
    // the local template cache still applies.
    match backend.fetch_templates().await {
        Ok(templates) => templates
            .into_iter()
            .map(|template| template.template_sim_code)
            .collect(),
        Err(err) => {
            log::warn!("Could not list backend environments: {err:?}");
            vec![]
        }
    }
}

fn load_llm_file(path: &PathBuf) -> Result<LlmConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let config: LlmConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("'{}' is not a valid model config", path.display()))?;

    return Ok(config);
}
