use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::history::history_path;
use super::{LineReader, ReadOutcome};
use crate::Result;

/// Terminal line reader with editing and persistent history.
pub struct EditorReader {
    editor: DefaultEditor,
    history: Option<PathBuf>,
}

impl EditorReader {
    #[inline]
    pub fn new() -> Result<Self> {
        let mut editor = DefaultEditor::new().context("Failed to initialize line editor")?;

        let history = history_path();
        if let Some(path) = &history {
            if let Err(e) = editor.load_history(path) {
                debug!("No history loaded from {}: {}", path.display(), e);
            }
        }

        Ok(Self { editor, history })
    }

    fn save_history(&mut self) {
        let Some(path) = &self.history else {
            return;
        };
        if let Err(e) = self.editor.save_history(path) {
            warn!("Failed to save history to {}: {}", path.display(), e);
        }
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read input").into()),
        }
    }

    fn add_history(&mut self, entry: &str) {
        self.editor.add_history_entry(entry).ok();
    }
}

impl Drop for EditorReader {
    fn drop(&mut self) {
        self.save_history();
    }
}
