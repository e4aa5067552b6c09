//! Interactive chat client with streamed responses.
//!
//! This binary provides a REPL for chatting with a model behind an
//! OpenAI-compatible chat-completions API.  The API key is read from
//! `OPENAI_API_KEY`.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! streamchat
//!
//! # Specify a model and system prompt
//! streamchat --model gpt-4o --system "You are a terse assistant"
//!
//! # Talk to a local server and keep a log of the traffic
//! streamchat --base-url http://localhost:11434/v1/ --log-file chat.jsonl
//! ```
//!
//! # Commands
//!
//! - `!clear` - Clear conversation history
//! - `!system` - Enter a new system prompt (clears history)
//! - `!raw` - Print the last response verbatim
//! - `!multi` - Enter a multi-line prompt
//! - `!exit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;

use streamchat::chat::{
    ChatArgs, ChatConfig, ChatSession, CommandDispatcher, Flow, InputEvent, LineInput,
    PlainTextRenderer, Renderer, RustylineInput, USER_PREFIX, parse_command,
};
use streamchat::{Completions, Error, JsonLinesLogger};

/// Main entry point for the streamchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("streamchat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let mut client = Completions::with_options(None, config.base_url.clone(), None)?;
    if let Some(path) = &config.log_file {
        client = client.with_logger(Arc::new(JsonLinesLogger::open(path)?));
    }
    let mut session = ChatSession::new(client, config);
    let mut dispatcher = CommandDispatcher::new(RustylineInput::new()?);

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;
    let mut renderer = PlainTextRenderer::with_color(use_color).with_interrupt(interrupted.clone());

    println!("streamchat (model: {})", session.model());
    println!("Type !help for commands, !exit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let line = match dispatcher.input_mut().read_line(USER_PREFIX) {
            Ok(InputEvent::Line(line)) => line,
            Ok(InputEvent::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Ok(InputEvent::Eof) => break,
            Err(err) => {
                report(&mut renderer, &err);
                continue;
            }
        };

        let outcome = match parse_command(&line) {
            Some(command) => {
                dispatcher
                    .dispatch(command, &mut session, &mut renderer)
                    .await
            }
            None if line.trim().is_empty() => Ok(Flow::Continue),
            None => session
                .send(&line, &mut renderer)
                .await
                .map(|_| Flow::Continue),
        };

        match outcome {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(err) => report(&mut renderer, &err),
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Prints an error without leaving the loop.
fn report(renderer: &mut dyn Renderer, err: &Error) {
    if err.is_service_error() {
        renderer.print_error(&err.to_string());
    } else if err.is_abort() {
        // The renderer already marked the response as interrupted.
    } else {
        renderer.print_error(&format!("Unexpected error: {err}"));
    }
}
