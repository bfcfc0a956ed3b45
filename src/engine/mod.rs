//! Database engines behind a console session
//!
//! An [`EngineAdapter`] owns one connection and knows how to run statements,
//! render their rows and bind the SQL functions for its engine.

pub mod duck;
pub mod render;
pub mod sqlite;
pub mod statement;


use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;

use crate::functions::{DUCKDB_FUNCTIONS, FunctionSpec, SQLITE_FUNCTIONS};
use crate::models::ModelRegistry;
use crate::sniff::Target;

pub use duck::DuckDbAdapter;
pub use sqlite::SqliteAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Row-store engine
    Sqlite,
    /// Columnar engine
    DuckDb,
}

impl EngineKind {
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite",
            Self::DuckDb => "DuckDB",
        }
    }

    /// The function table bound on every connection of this engine
    #[inline]
    pub fn functions(self) -> &'static [FunctionSpec] {
        match self {
            Self::Sqlite => SQLITE_FUNCTIONS,
            Self::DuckDb => DUCKDB_FUNCTIONS,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure reported by the engine, formatted the way users see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub kind: String,
    pub code: Option<String>,
    pub message: String,
}

impl EngineError {
    #[inline]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            code: None,
            message: message.into(),
        }
    }

    #[inline]
    pub fn with_code(
        kind: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to write result row: {0}")]
    Output(#[from] io::Error),
}

/// One open connection to a database engine.
pub trait EngineAdapter {
    fn kind(&self) -> EngineKind;

    fn version(&self) -> &str;

    /// Whether `sql` forms at least one complete statement
    fn is_complete(&self, sql: &str) -> bool;

    /// Run `sql` and stream each result row to `out` as it is fetched.
    /// Returns the number of rows written.
    fn execute(&mut self, sql: &str, out: &mut dyn Write) -> Result<usize, ExecuteError>;

    /// Run statements that produce no rows
    fn execute_batch(&mut self, sql: &str) -> Result<(), EngineError>;

    fn register_functions(
        &mut self,
        functions: &[FunctionSpec],
        models: &Arc<ModelRegistry>,
    ) -> Result<(), EngineError>;

    fn close(self: Box<Self>) -> Result<(), EngineError>;
}

/// Open a connection to `target` with the requested engine
#[inline]
pub fn connect(kind: EngineKind, target: &Target) -> Result<Box<dyn EngineAdapter>, EngineError> {
    match kind {
        EngineKind::Sqlite => Ok(Box::new(SqliteAdapter::open(target)?)),
        EngineKind::DuckDb => Ok(Box::new(DuckDbAdapter::open(target)?)),
    }
}
