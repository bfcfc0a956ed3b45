use anyhow::{Context, Result};
use console::style;
use std::io::Write;

use super::Config;

/// Print the effective configuration in a human readable form
#[inline]
pub fn show_config(config: &Config, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", style("Current Configuration").for_stderr().bold().cyan())?;
    writeln!(out)?;

    writeln!(out, "{}", style("Models:").for_stderr().bold().yellow())?;
    writeln!(out, "  Default model: {}", style(&config.models.default_model).for_stderr().cyan())?;
    writeln!(
        out,
        "  Default embedding model: {}",
        style(&config.models.default_embedding_model).for_stderr().cyan()
    )?;
    writeln!(out, "  Markov length: {}", style(config.markov.length).for_stderr().cyan())?;
    writeln!(out, "  Hashing dimension: {}", style(config.hashing.dimension).for_stderr().cyan())?;

    writeln!(out)?;
    writeln!(out, "{}", style("Ollama Settings:").for_stderr().bold().yellow())?;
    writeln!(out, "  Enabled: {}", style(config.ollama.enabled).for_stderr().cyan())?;
    match config.ollama_url() {
        Ok(url) => writeln!(out, "  Ollama URL: {}", style(url).for_stderr().cyan())?,
        Err(e) => writeln!(out, "  Ollama URL: {} ({})", style("Invalid").for_stderr().red(), e)?,
    }
    writeln!(out, "  Timeout: {}s", style(config.ollama.timeout_seconds).for_stderr().cyan())?;
    writeln!(out, "  Retry attempts: {}", style(config.ollama.retry_attempts).for_stderr().cyan())?;
    if let Some(dimension) = config.ollama.embedding_dimension {
        writeln!(out, "  Embedding dimension: {}", style(dimension).for_stderr().cyan())?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Config file: {}",
        style(config.config_file_path().display()).for_stderr().dim()
    )?;

    Ok(())
}

/// Write the current configuration to disk unless a config file already
/// exists. Returns whether a file was written.
#[inline]
pub fn init_config(config: &Config) -> Result<bool> {
    let path = config.config_file_path();
    if path.exists() {
        return Ok(false);
    }

    config
        .save()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
