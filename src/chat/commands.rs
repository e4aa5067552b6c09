//! Session commands for the chat application.
//!
//! Input lines that start with `!` control the session instead of being sent
//! to the API.  [`parse_command`] turns such a line into a [`ChatCommand`] and
//! [`CommandDispatcher`] executes it against a [`ChatSession`].

use crate::chat::input::{InputEvent, LineInput};
use crate::chat::session::ChatSession;
use crate::client::CompletionService;
use crate::error::Result;
use crate::render::Renderer;

/// Prefix that marks an input line as a command.
pub const COMMAND_PREFIX: char = '!';

/// Prompt label for conversation input.
pub const USER_PREFIX: &str = "[ User ]: ";

/// Prompt label for system prompt input.
pub const SYSTEM_PREFIX: &str = "[ System ]: ";

/// Label printed in front of a raw response.
pub const BOT_PREFIX: &str = "[ Bot ]: ";

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Exit the chat application.
    Exit,

    /// Clear the conversation history.
    Clear,

    /// Read a new system prompt and reset the conversation.
    System,

    /// Print the most recent turn verbatim.
    Raw,

    /// Read a multi-line prompt and send it.
    Multi,

    /// Display help information.
    Help,

    /// Display session statistics.
    Stats,

    /// Any other `!` command; accepted and ignored.
    Unknown(String),
}

/// What the input loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading input.
    Continue,
    /// Leave the input loop.
    Exit,
}

/// Parses user input for commands.
///
/// Returns `Some(ChatCommand)` if the input starts with `!`, or `None` if it
/// should be treated as a prompt.
///
/// # Examples
///
/// ```
/// # use streamchat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("!exit"), Some(ChatCommand::Exit));
/// assert_eq!(parse_command("!frobnicate"), Some(ChatCommand::Unknown("frobnicate".to_string())));
/// assert!(parse_command("Hello!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let rest = input.trim().strip_prefix(COMMAND_PREFIX)?;
    let command = rest
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let result = match command.as_str() {
        "exit" | "quit" => ChatCommand::Exit,
        "clear" => ChatCommand::Clear,
        "system" => ChatCommand::System,
        "raw" => ChatCommand::Raw,
        "multi" => ChatCommand::Multi,
        "help" => ChatCommand::Help,
        "stats" => ChatCommand::Stats,
        _ => ChatCommand::Unknown(command),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  !clear     Clear conversation history
  !system    Enter a new system prompt (type !multi for a multi-line prompt)
  !raw       Print the last response without formatting
  !multi     Enter a multi-line prompt; finish with Ctrl+D or Ctrl+C
  !stats     Show session statistics
  !help      Show this help message
  !exit      Exit the chat"#
}

/// Executes commands against a chat session.
///
/// The dispatcher owns the input source because some commands read further
/// lines (`!system`, `!multi`).
pub struct CommandDispatcher<I: LineInput> {
    input: I,
}

impl<I: LineInput> CommandDispatcher<I> {
    /// Creates a dispatcher reading follow-up input from `input`.
    pub fn new(input: I) -> Self {
        Self { input }
    }

    /// The input source, for reading ordinary prompts.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Executes `command`.
    ///
    /// # Errors
    ///
    /// Returns input errors, and the error of a failed `!multi` exchange.
    pub async fn dispatch<S: CompletionService>(
        &mut self,
        command: ChatCommand,
        session: &mut ChatSession<S>,
        renderer: &mut dyn Renderer,
    ) -> Result<Flow> {
        match command {
            ChatCommand::Exit => return Ok(Flow::Exit),
            ChatCommand::Clear => {
                session.clear_history();
                renderer.print_info("Conversation cleared.");
            }
            ChatCommand::System => {
                let prompt = match self.input.read_line(SYSTEM_PREFIX)? {
                    InputEvent::Line(line) if line.trim() == "!multi" => self.input.read_block()?,
                    InputEvent::Line(line) => line,
                    InputEvent::Interrupted | InputEvent::Eof => String::new(),
                };
                if !prompt.trim().is_empty() {
                    session.set_system_prompt(prompt);
                    renderer.print_info("System prompt set; conversation cleared.");
                }
            }
            ChatCommand::Raw => {
                renderer.print_info(&format!("{BOT_PREFIX}{}", session.raw_last_response()));
            }
            ChatCommand::Multi => {
                let prompt = self.input.read_block()?;
                if !prompt.trim().is_empty() {
                    session.send(&prompt, renderer).await?;
                }
            }
            ChatCommand::Help => renderer.print_info(help_text()),
            ChatCommand::Stats => renderer.print_info(&stats_text(session)),
            ChatCommand::Unknown(_) => {}
        }
        Ok(Flow::Continue)
    }
}

fn stats_text<S: CompletionService>(session: &ChatSession<S>) -> String {
    let stats = session.stats();
    let describe = |value: Option<String>| value.unwrap_or_else(|| "default".to_string());
    format!(
        "Session Statistics:\n  Model: {}\n  Messages: {}\n  Max tokens: {}\n  Temperature: {}\n  System prompt: {}\n  Requests: {} ({} failed)",
        stats.model,
        stats.message_count,
        describe(stats.max_tokens.map(|v| v.to_string())),
        describe(stats.temperature.map(|v| format!("{v:.2}"))),
        stats.system_prompt,
        stats.total_requests,
        stats.failed_requests,
    )
}
