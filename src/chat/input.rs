//! Line-based terminal input.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::{Error, Result};

/// One outcome of reading a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A line of text, without its trailing newline.
    Line(String),
    /// The user pressed Ctrl+C.
    Interrupted,
    /// The input was closed (Ctrl+D or end of a pipe).
    Eof,
}

/// A source of terminal input lines.
pub trait LineInput {
    /// Reads one line, displaying `label` as the prompt.
    fn read_line(&mut self, label: &str) -> Result<InputEvent>;

    /// Reads lines until end-of-input or an interrupt and joins them with
    /// newlines.
    ///
    /// Returns an empty string if no lines were read.
    fn read_block(&mut self) -> Result<String> {
        let mut lines = Vec::new();
        while let InputEvent::Line(line) = self.read_line("")? {
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}

/// [`LineInput`] backed by a `rustyline` editor with history.
pub struct RustylineInput {
    editor: DefaultEditor,
}

impl RustylineInput {
    /// Creates a new editor.
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|err| Error::input(format!("failed to initialize line editor: {err}")))?;
        Ok(Self { editor })
    }
}

impl LineInput for RustylineInput {
    fn read_line(&mut self, label: &str) -> Result<InputEvent> {
        match self.editor.readline(label) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(InputEvent::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(ReadlineError::Io(err)) => Err(Error::io("failed to read terminal input", err)),
            Err(err) => Err(Error::input(err.to_string())),
        }
    }
}
