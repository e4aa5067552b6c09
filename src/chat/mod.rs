//! Interactive chat sessions with streamed responses.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! completion client. It supports:
//!
//! - Streaming responses rendered as they arrive
//! - Append-only, role-tagged conversation history
//! - `!` commands for session control
//! - Configurable model, system prompt, and parameters
//!
//! # Architecture
//!
//! - [`transcript`]: the ordered conversation history
//! - [`stream`]: consumption of one streaming completion
//! - [`session`]: composes the two into request/response exchanges
//! - [`commands`]: command parsing and dispatch
//! - [`input`]: line-based terminal input
//! - [`config`]: CLI argument parsing and configuration

pub mod commands;
pub mod config;
pub mod input;
pub mod session;
pub mod stream;
pub mod transcript;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{
    BOT_PREFIX, COMMAND_PREFIX, ChatCommand, CommandDispatcher, Flow, SYSTEM_PREFIX, USER_PREFIX,
    help_text, parse_command,
};
pub use config::{ChatArgs, ChatConfig, DEFAULT_SYSTEM_PROMPT};
pub use input::{InputEvent, LineInput, RustylineInput};
pub use session::{ChatSession, SessionStats};
pub use stream::StreamConsumer;
pub use transcript::TranscriptStore;
