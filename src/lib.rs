use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineError;

pub type Result<T> = std::result::Result<T, TsellmError>;

#[derive(Error, Debug)]
pub enum TsellmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Could not inspect database file: {}", .0.display())]
    Sniff(PathBuf),

    #[error("{0}")]
    Engine(EngineError),

    /// An execution error that has already been reported on the error channel.
    #[error("{0}")]
    Execution(EngineError),

    #[error("Invalid settings: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod config;
pub mod console;
pub mod engine;
pub mod functions;
pub mod models;
pub mod repl;
pub mod sniff;

pub use console::{Console, EngineSelection, ErrorMode, create_console};
pub use engine::EngineKind;
pub use sniff::{SniffResult, Target};
