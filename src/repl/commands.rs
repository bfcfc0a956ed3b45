//! Dot-commands: REPL directives that are not SQL
//!
//! Only recognized when no statement is being accumulated. Any other line
//! starting with `.` is treated as SQL.

use std::fmt::Write;

use crate::console::Console;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotCommand {
    /// Print the engine version
    Version,
    Help,
    Quit,
}

impl DotCommand {
    #[inline]
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            ".version" => Some(Self::Version),
            ".help" => Some(Self::Help),
            ".quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[inline]
pub fn help_text(console: &Console) -> String {
    let mut text = String::from(
        "Enter SQL statements terminated with a semicolon (;).\n\
         Statements may span several lines.\n\
         \n\
         Commands:\n  \
         .help        Show this message\n  \
         .version     Show the database engine version\n  \
         .quit        Exit the shell (or press CTRL-D)\n\
         \n\
         SQL functions:\n",
    );

    for spec in console.functions() {
        let _ = writeln!(text, "  {}", spec.signature());
    }

    let models = console.models();
    let (generative, embedding) = models.model_names();
    let _ = write!(
        text,
        "\nDefault model: {}\nDefault embedding model: {}\nLocal models: {}",
        models.default_model(),
        models.default_embedding_model(),
        generative
            .iter()
            .chain(&embedding)
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    );
    if models.has_remote_provider() {
        text.push_str("\nOther model names are served by Ollama");
    }
    text
}
