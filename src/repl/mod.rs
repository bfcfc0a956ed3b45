//! Interactive read-eval-print loop
//!
//! Lines are accumulated in a [`StatementBuffer`] until the engine's
//! completeness check accepts the joined text, which is then executed with
//! errors reported but not fatal. Dot-commands are handled only between
//! statements.

pub mod commands;
pub mod editor;
pub mod history;


use console::style;
use std::io::Write;
use tracing::debug;

use crate::Result;
use crate::console::{Console, ErrorMode};
use commands::{DotCommand, help_text};

pub use editor::EditorReader;

pub const PRIMARY_PROMPT: &str = "tsellm> ";
pub const CONTINUATION_PROMPT: &str = "    ... ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplState {
    AwaitingStatement,
    AwaitingContinuation,
}

impl ReplState {
    #[inline]
    pub fn prompt(self) -> &'static str {
        match self {
            Self::AwaitingStatement => PRIMARY_PROMPT,
            Self::AwaitingContinuation => CONTINUATION_PROMPT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-C
    Interrupted,
    /// Ctrl-D or end of input
    Eof,
}

/// Source of input lines for the REPL
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    fn add_history(&mut self, _entry: &str) {}
}

/// How the loop ended. Both are successful exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    Quit,
    Eof,
}

#[derive(Debug, Default)]
pub struct StatementBuffer {
    lines: Vec<String>,
}

impl StatementBuffer {
    #[inline]
    pub fn push(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[inline]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    #[inline]
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

pub struct Repl<'a, R> {
    console: &'a mut Console,
    reader: R,
    buffer: StatementBuffer,
}

impl<'a, R: LineReader> Repl<'a, R> {
    #[inline]
    pub fn new(console: &'a mut Console, reader: R) -> Self {
        Self {
            console,
            reader,
            buffer: StatementBuffer::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> ReplState {
        if self.buffer.is_empty() {
            ReplState::AwaitingStatement
        } else {
            ReplState::AwaitingContinuation
        }
    }

    #[inline]
    pub fn buffer(&self) -> &StatementBuffer {
        &self.buffer
    }

    #[inline]
    pub fn banner(&self) -> String {
        format!(
            "{} shell, running on {} {}\nConnected to {}\n\n\
             Type \"{}\" for more information; type \"{}\" or CTRL-D to quit.",
            style("tsellm").for_stderr().bold().cyan(),
            self.console.engine(),
            self.console.version(),
            style(self.console.target()).for_stderr().bold(),
            style(".help").for_stderr().green(),
            style(".quit").for_stderr().green(),
        )
    }

    /// Read and evaluate lines until `.quit` or end of input. Results go to
    /// `out`; the banner and engine errors go to `err`.
    #[inline]
    pub fn run(&mut self, out: &mut dyn Write, err: &mut dyn Write) -> Result<ReplExit> {
        writeln!(err, "{}", self.banner())?;

        loop {
            let prompt = self.state().prompt();
            match self.reader.read_line(prompt)? {
                ReadOutcome::Line(line) => {
                    if let Some(exit) = self.handle_line(&line, out, err)? {
                        return Ok(exit);
                    }
                }
                ReadOutcome::Interrupted => {
                    self.buffer.clear();
                    writeln!(out, "^C")?;
                }
                ReadOutcome::Eof => {
                    writeln!(out)?;
                    return Ok(ReplExit::Eof);
                }
            }
        }
    }

    /// Evaluate one input line. Returns `Some` when the loop should end.
    #[inline]
    pub fn handle_line(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Option<ReplExit>> {
        if self.buffer.is_empty() {
            if let Some(command) = DotCommand::parse(line) {
                self.reader.add_history(line.trim());
                return self.run_command(command, out);
            }
            if line.trim().is_empty() {
                return Ok(None);
            }
        }

        self.buffer.push(line);
        let source = self.buffer.text();
        if self.console.is_complete(&source) {
            self.buffer.clear();
            self.reader.add_history(&source);
            self.console.execute(&source, ErrorMode::Suppress, out, err)?;
        }

        Ok(None)
    }

    fn run_command(&mut self, command: DotCommand, out: &mut dyn Write) -> Result<Option<ReplExit>> {
        debug!("Running dot-command {:?}", command);
        match command {
            DotCommand::Version => writeln!(out, "{}", self.console.version())?,
            DotCommand::Help => writeln!(out, "{}", help_text(self.console))?,
            DotCommand::Quit => return Ok(Some(ReplExit::Quit)),
        }
        out.flush()?;
        Ok(None)
    }
}
