//! Output rendering for streamed chat responses.
//!
//! This module provides the [`Renderer`] trait the chat session streams into,
//! and [`PlainTextRenderer`], which draws each response as a titled frame on
//! stdout with optional ANSI styling.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// ANSI escape code for dim text (used for the response frame).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for the frame title).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for informational messages).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Title drawn on top of each response frame.
pub const RESPONSE_TITLE: &str = "GPT response";

/// Trait for rendering streamed chat output.
///
/// For every exchange the session calls `start_response`, then `print_text`
/// once per fragment, then `finish_response`, whether the exchange succeeded
/// or not.
pub trait Renderer: Send {
    /// Called before the first fragment of a response.
    fn start_response(&mut self) {}

    /// Print a chunk of response text.
    ///
    /// This is called incrementally as fragments are streamed from the API.
    /// The chunk may be empty.
    fn print_text(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a response is complete, successful or not.
    ///
    /// Used to close the frame and flush after streaming.
    fn finish_response(&mut self);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    in_response: bool,
    line_start: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            in_response: false,
            line_start: true,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn gutter(&self) -> String {
        if self.use_color {
            format!("{ANSI_DIM}\u{2502}{ANSI_RESET} ")
        } else {
            "| ".to_string()
        }
    }

    /// Writes response text, prefixing every line with the frame gutter.
    fn write_framed(&mut self, text: &str) {
        let gutter = self.gutter();
        for line in text.split_inclusive('\n') {
            if self.line_start {
                print!("{gutter}");
            }
            print!("{line}");
            self.line_start = line.ends_with('\n');
        }
        self.flush();
    }

    fn close_line(&mut self) {
        if !self.line_start {
            println!();
            self.line_start = true;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self) {
        self.close_line();
        if self.use_color {
            println!("{ANSI_DIM}\u{256d}\u{2500}{ANSI_RESET} {ANSI_BOLD}{RESPONSE_TITLE}{ANSI_RESET}");
        } else {
            println!("+- {RESPONSE_TITLE}");
        }
        self.in_response = true;
        self.line_start = true;
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.write_framed(text);
    }

    fn print_error(&mut self, error: &str) {
        self.close_line();
        if self.use_color {
            println!("{ANSI_RED}{error}{ANSI_RESET}");
        } else {
            println!("{error}");
        }
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.close_line();
        if self.use_color {
            println!("{ANSI_CYAN}{info}{ANSI_RESET}");
        } else {
            println!("{info}");
        }
        self.flush();
    }

    fn finish_response(&mut self) {
        if !self.in_response {
            return;
        }
        self.close_line();
        if self.use_color {
            println!("{ANSI_DIM}\u{2570}\u{2500}{ANSI_RESET}");
        } else {
            println!("+-");
        }
        self.in_response = false;
        self.flush();
    }

    fn print_interrupted(&mut self) {
        self.write_framed("\n[interrupted]\n");
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
