//! Command-line interface for the twin binary.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

/// Personal career-site chat agent
#[derive(Parser, Debug)]
#[command(name = "twin", version, about = "Chat agent that answers on your behalf")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat as a visitor; without a prompt, start an interactive session
    Chat(ChatArgs),
    /// Print the tool declarations sent to the model
    Tools,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Override the configured model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Print the whole reply at once instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Visitor message (positional)
    pub prompt: Option<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// What a Ctrl-C did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// A turn was running and has been canceled.
    CanceledTurn,
    /// Nothing was running; the session should end.
    Exit,
}

/// Routes Ctrl-C to the running turn, or ends the session when idle.
///
/// One process-wide signal watcher calls [`TurnInterrupts::interrupt`];
/// each turn brackets itself with `begin_turn` and `end_turn`.
#[derive(Debug, Clone, Default)]
pub struct TurnInterrupts {
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl TurnInterrupts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a turn and return the token that cancels it.
    pub fn begin_turn(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.slot() = Some(token.clone());
        token
    }

    /// Mark the current turn finished.
    pub fn end_turn(&self) {
        self.slot().take();
    }

    /// Handle one Ctrl-C.
    pub fn interrupt(&self) -> Interrupt {
        match self.slot().take() {
            Some(token) => {
                token.cancel();
                Interrupt::CanceledTurn
            }
            None => Interrupt::Exit,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_one_shot_chat() {
        let cli = Cli::try_parse_from(["twin", "chat", "What's your email?"]).unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.prompt.as_deref(), Some("What's your email?"));
                assert!(!args.no_stream);
                assert!(args.model.is_none());
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_interactive_chat_with_model() {
        let cli = Cli::try_parse_from(["twin", "chat", "--model", "gemini-2.5-flash"]).unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert!(args.prompt.is_none());
                assert_eq!(args.model.as_deref(), Some("gemini-2.5-flash"));
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["twin", "tools", "--config", "/tmp/twin.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Tools));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/twin.toml")));
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["twin"]).is_err());
    }

    #[test]
    fn interrupt_cancels_the_running_turn() {
        let interrupts = TurnInterrupts::new();
        let token = interrupts.begin_turn();

        assert_eq!(interrupts.interrupt(), Interrupt::CanceledTurn);
        assert!(token.is_cancelled());
        // The turn is gone, so a second Ctrl-C ends the session.
        assert_eq!(interrupts.interrupt(), Interrupt::Exit);
    }

    #[test]
    fn interrupt_at_the_prompt_exits() {
        let interrupts = TurnInterrupts::new();
        assert_eq!(interrupts.interrupt(), Interrupt::Exit);

        let token = interrupts.begin_turn();
        interrupts.end_turn();
        assert_eq!(interrupts.interrupt(), Interrupt::Exit);
        assert!(!token.is_cancelled());
    }
}
