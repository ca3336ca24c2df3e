//! twin CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use twin::academics::SqliteAcademics;
use twin::agent::Agent;
use twin::cli::{ChatArgs, Cli, Commands, Interrupt, TurnInterrupts};
use twin::config::TwinConfig;
use twin::context::AgentContext;
use twin::error::TwinError;
use twin::notify::{LogNotifier, Notifier, PushoverNotifier};
use twin::provider::openai::OpenAiCompatibleProvider;
use twin::tools::builtin::default_registry;
use twin::tools::ToolRegistry;
use twin::types::Message;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the reply.
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(is_tty)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    let result = match TwinConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Chat(args) => handle_chat(config, args).await,
            Commands::Tools => handle_tools(&config),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn build_registry(config: &TwinConfig) -> Result<ToolRegistry, TwinError> {
    let notifier: Arc<dyn Notifier> = match config.pushover_credentials() {
        Some((token, user)) if config.notifications.enabled => Arc::new(PushoverNotifier::new(token, user)),
        _ => {
            warn!("Pushover disabled; notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };
    let academics = Arc::new(SqliteAcademics::new(&config.academics.database));
    default_registry(notifier, academics)
}

fn handle_tools(config: &TwinConfig) -> Result<(), TwinError> {
    let registry = build_registry(config)?;
    let declarations = serde_json::to_string_pretty(&registry.declarations())?;
    println!("{declarations}");
    Ok(())
}

async fn handle_chat(mut config: TwinConfig, args: ChatArgs) -> Result<(), TwinError> {
    if let Some(model) = args.model {
        config.model = model;
    }
    config.validate()?;

    let api_key = config.api_key.clone().unwrap_or_default();
    let provider = Arc::new(OpenAiCompatibleProvider::new(
        config.model.clone(),
        api_key,
        config.base_url.clone(),
    ));
    let registry = Arc::new(build_registry(&config)?);
    let context = AgentContext::load(
        config.persona.name.clone(),
        &config.persona.summary,
        config.persona.details.as_slice(),
    )?;
    let agent = Agent::new(provider, registry, context, config.agent_settings());
    info!(model = %config.model, persona = agent.context().persona_name(), "Agent ready");

    let interrupts = TurnInterrupts::new();
    let watcher = tokio::spawn(watch_interrupts(interrupts.clone()));

    let result = match args.prompt {
        Some(prompt) => render_turn(&agent, &interrupts, prompt, Vec::new(), !args.no_stream)
            .await
            .map(|_| ()),
        None => repl(&agent, &interrupts, !args.no_stream).await,
    };
    watcher.abort();
    result
}

/// Single Ctrl-C handler for the whole session.
async fn watch_interrupts(interrupts: TurnInterrupts) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if interrupts.interrupt() == Interrupt::Exit {
            println!();
            std::process::exit(130);
        }
    }
}

/// Interactive session. History lives here, not in the agent.
async fn repl(agent: &Agent, interrupts: &TurnInterrupts, stream: bool) -> Result<(), TwinError> {
    let greeting = agent.context().greeting();
    println!("{greeting}\n");
    let mut history = vec![Message::assistant(greeting)];

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "/exit" | "/quit") {
            break;
        }

        match render_turn(agent, interrupts, line.to_string(), history.clone(), stream).await {
            Ok(reply) => {
                history.push(Message::user(line));
                history.push(Message::assistant(reply));
            }
            Err(TwinError::Canceled) => eprintln!("(canceled)"),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    Ok(())
}

/// Print one reply as it streams. Ctrl-C cancels the turn.
async fn render_turn(
    agent: &Agent,
    interrupts: &TurnInterrupts,
    message: String,
    history: Vec<Message>,
    stream: bool,
) -> Result<String, TwinError> {
    let cancel = interrupts.begin_turn();

    let mut replies = agent.chat_with_cancel(message, history, cancel);
    let mut shown = 0;
    let mut reply = String::new();
    let result = loop {
        match replies.next().await {
            Some(Ok(prefix)) => {
                if stream {
                    let mut stdout = std::io::stdout();
                    if let Err(e) = write!(stdout, "{}", &prefix[shown..]).and_then(|()| stdout.flush()) {
                        break Err(e.into());
                    }
                    shown = prefix.len();
                }
                reply = prefix;
            }
            Some(Err(e)) => break Err(e),
            None => break Ok(()),
        }
    };
    interrupts.end_turn();

    if stream {
        if shown > 0 {
            println!();
        }
    } else if result.is_ok() {
        println!("{reply}");
    }
    result.map(|()| reply)
}
