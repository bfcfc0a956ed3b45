//! Console sessions: one engine connection with the SQL functions bound
//!
//! [`create_console`] picks the engine (explicitly or by sniffing the target)
//! and runs the initialization sequence; [`Console`] then executes statements
//! for the one-shot mode and the REPL.


use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::{self, EngineAdapter, EngineKind, ExecuteError};
use crate::functions::{self, FunctionSpec};
use crate::models::ModelRegistry;
use crate::sniff::{self, SniffResult, Target};
use crate::{Result, TsellmError};

/// Created on every connect so files touched by the shell are recognizable
pub const MARKER_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS __tsellm (x text)";

/// Engine flags from the command line. At most one may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSelection {
    pub sqlite: bool,
    pub duckdb: bool,
}

impl EngineSelection {
    #[inline]
    pub fn sqlite() -> Self {
        Self {
            sqlite: true,
            duckdb: false,
        }
    }

    #[inline]
    pub fn duckdb() -> Self {
        Self {
            sqlite: false,
            duckdb: true,
        }
    }

    /// The explicitly requested engine, if any
    #[inline]
    pub fn resolve(self) -> Result<Option<EngineKind>> {
        match (self.sqlite, self.duckdb) {
            (true, true) => Err(TsellmError::Configuration(
                "--sqlite and --duckdb are mutually exclusive".to_string(),
            )),
            (true, false) => Ok(Some(EngineKind::Sqlite)),
            (false, true) => Ok(Some(EngineKind::DuckDb)),
            (false, false) => Ok(None),
        }
    }
}

/// What to do after an engine error has been written to the error stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Keep going (interactive use)
    Suppress,
    /// Return [`TsellmError::Execution`] (one-shot use)
    Fatal,
}

pub struct Console {
    adapter: Box<dyn EngineAdapter>,
    target: Target,
    models: Arc<ModelRegistry>,
}

/// Engine for a sniffed target
#[inline]
pub fn engine_for(result: SniffResult, target: &Target) -> Result<EngineKind> {
    match result {
        SniffResult::Columnar => Ok(EngineKind::DuckDb),
        SniffResult::RowStore | SniffResult::Unknown | SniffResult::NotFound => {
            Ok(EngineKind::Sqlite)
        }
        SniffResult::Error => match target {
            Target::Path(path) => Err(TsellmError::Sniff(path.clone())),
            Target::Memory => Ok(EngineKind::Sqlite),
        },
    }
}

/// Open `target` and prepare it for use: connect, create the marker table,
/// install the model registry and bind the SQL functions, in that order.
#[inline]
pub fn create_console(
    target: Target,
    selection: EngineSelection,
    models: Arc<ModelRegistry>,
) -> Result<Console> {
    let kind = match selection.resolve()? {
        Some(kind) => {
            debug!("Engine {} selected explicitly", kind);
            kind
        }
        None => engine_for(sniff::classify(&target), &target)?,
    };

    let mut adapter = engine::connect(kind, &target).map_err(TsellmError::Engine)?;
    adapter
        .execute_batch(MARKER_TABLE_SQL)
        .map_err(TsellmError::Engine)?;
    functions::install(Arc::clone(&models));
    adapter
        .register_functions(kind.functions(), &models)
        .map_err(TsellmError::Engine)?;

    info!(
        "Console ready: {} {} on {}",
        kind,
        adapter.version(),
        target
    );
    Ok(Console {
        adapter,
        target,
        models,
    })
}

impl Console {
    #[inline]
    pub fn engine(&self) -> EngineKind {
        self.adapter.kind()
    }

    #[inline]
    pub fn version(&self) -> &str {
        self.adapter.version()
    }

    #[inline]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[inline]
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    #[inline]
    pub fn functions(&self) -> &'static [FunctionSpec] {
        self.engine().functions()
    }

    #[inline]
    pub fn is_complete(&self, sql: &str) -> bool {
        self.adapter.is_complete(sql)
    }

    /// Run `sql`, streaming rows to `out`. Engine errors are written to
    /// `err` as one line; `mode` decides whether they are also returned.
    #[inline]
    pub fn execute(
        &mut self,
        sql: &str,
        mode: ErrorMode,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<usize> {
        match self.adapter.execute(sql, out) {
            Ok(rows) => {
                out.flush()?;
                Ok(rows)
            }
            Err(ExecuteError::Engine(error)) => {
                out.flush()?;
                writeln!(err, "{error}")?;
                err.flush()?;
                match mode {
                    ErrorMode::Suppress => Ok(0),
                    ErrorMode::Fatal => Err(TsellmError::Execution(error)),
                }
            }
            Err(ExecuteError::Output(error)) => Err(error.into()),
        }
    }

    /// Close the connection, reporting any failure to release it
    #[inline]
    pub fn close(self) -> Result<()> {
        debug!("Closing console on {}", self.target);
        self.adapter.close().map_err(TsellmError::Engine)
    }
}
