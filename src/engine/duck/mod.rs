
use duckdb::core::{DataChunkHandle, Inserter, LogicalTypeId};
use duckdb::ffi::duckdb_string_t;
use duckdb::types::{DuckString, TimeUnit, Value};
use duckdb::vscalar::{ScalarFunctionSignature, VScalar};
use duckdb::vtab::arrow::WritableVector;
use duckdb::Connection;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

use super::{EngineAdapter, EngineError, EngineKind, ExecuteError, render, statement};
use crate::functions::{self, FunctionKind, FunctionSpec};
use crate::models::ModelRegistry;
use crate::sniff::Target;

const DUCKDB_ERROR_KIND: &str = "DuckDbError";

/// Columnar adapter over a single DuckDB connection.
#[derive(Debug)]
pub struct DuckDbAdapter {
    conn: Connection,
    version: String,
}

impl DuckDbAdapter {
    #[inline]
    pub fn open(target: &Target) -> Result<Self, EngineError> {
        let conn = match target {
            Target::Memory => Connection::open_in_memory(),
            Target::Path(path) => Connection::open(path),
        }
        .map_err(duckdb_error)?;

        let version = conn
            .query_row("SELECT version()", [], |row| row.get::<_, String>(0))
            .map_err(duckdb_error)?;

        info!("Opened DuckDB {} connection to {}", version, target);
        Ok(Self { conn, version })
    }

    fn execute_one(&self, sql: &str, out: &mut dyn Write) -> Result<usize, ExecuteError> {
        debug!("Executing on DuckDB: {}", sql);
        let mut stmt = self.conn.prepare(sql).map_err(duckdb_error)?;
        let mut rows = stmt.query([]).map_err(duckdb_error)?;
        let column_count = rows.as_ref().map_or(0, |s| s.column_count());

        let mut count = 0;
        while let Some(row) = rows.next().map_err(duckdb_error)? {
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                let value: Value = row.get(index).map_err(duckdb_error)?;
                values.push(render_value(&value));
            }
            writeln!(out, "{}", render::tuple(&values))?;
            count += 1;
        }

        Ok(count)
    }
}

impl EngineAdapter for DuckDbAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::DuckDb
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn is_complete(&self, sql: &str) -> bool {
        statement::is_complete(sql)
    }

    /// Statements run in order; the first failure stops the rest.
    fn execute(&mut self, sql: &str, out: &mut dyn Write) -> Result<usize, ExecuteError> {
        let mut count = 0;
        for statement in statement::split(sql) {
            count += self.execute_one(statement, out)?;
        }
        Ok(count)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), EngineError> {
        self.conn.execute_batch(sql).map_err(duckdb_error)
    }

    fn register_functions(
        &mut self,
        functions: &[FunctionSpec],
        models: &Arc<ModelRegistry>,
    ) -> Result<(), EngineError> {
        // Scalar functions resolve models through functions::active(), which
        // must already hold `models`
        debug!("Binding DuckDB functions for {:?}", models);
        for spec in functions {
            debug!("Registering DuckDB function {}", spec);
            if !spec.takes_model() {
                return Err(EngineError::new(
                    DUCKDB_ERROR_KIND,
                    format!("DuckDB functions must name their model, cannot register {spec}"),
                ));
            }
            match spec.kind {
                FunctionKind::Generate => self
                    .conn
                    .register_scalar_function::<GenerateFunction>(spec.name),
                FunctionKind::Embed => self.conn.register_scalar_function::<EmbedFunction>(spec.name),
            }
            .map_err(duckdb_error)?;
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), EngineError> {
        debug!("Closing DuckDB connection");
        self.conn.close().map_err(|(_, error)| duckdb_error(error))
    }
}

struct GenerateFunction;

impl VScalar for GenerateFunction {
    type State = ();

    fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_text_function(FunctionKind::Generate, input, output)
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![text_signature()]
    }
}

struct EmbedFunction;

impl VScalar for EmbedFunction {
    type State = ();

    fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_text_function(FunctionKind::Embed, input, output)
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![text_signature()]
    }
}

/// `(VARCHAR, VARCHAR) -> VARCHAR`
fn text_signature() -> ScalarFunctionSignature {
    ScalarFunctionSignature::exact(
        vec![LogicalTypeId::Varchar.into(), LogicalTypeId::Varchar.into()],
        LogicalTypeId::Varchar.into(),
    )
}

fn invoke_text_function(
    kind: FunctionKind,
    input: &DataChunkHandle,
    output: &mut dyn WritableVector,
) -> Result<(), Box<dyn Error>> {
    let rows = input.len();
    let texts = read_text_column(input, 0, rows);
    let model_names = read_text_column(input, 1, rows);
    let models = functions::active();

    let mut output = output.flat_vector();
    for (row, (text, model)) in texts.iter().zip(&model_names).enumerate() {
        match (text, model) {
            (Some(text), Some(model)) => {
                let value = functions::invoke(&models, kind, text, Some(model.as_str()))?;
                output.insert(row, value.as_str());
            }
            _ => output.set_null(row),
        }
    }
    Ok(())
}

fn read_text_column(input: &DataChunkHandle, column: usize, rows: usize) -> Vec<Option<String>> {
    let vector = input.flat_vector(column);
    // SAFETY: `rows` is the chunk's row count and the column is VARCHAR.
    unsafe { vector.as_slice_with_len::<duckdb_string_t>(rows) }
        .iter()
        .enumerate()
        .map(|(row, value)| {
            if vector.row_is_null(row as u64) {
                None
            } else {
                Some(DuckString::new(&mut { *value }).as_str().into_owned())
            }
        })
        .collect()
}

fn micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => render::NONE.to_string(),
        Value::Boolean(b) => render::boolean(*b),
        Value::TinyInt(i) => i.to_string(),
        Value::SmallInt(i) => i.to_string(),
        Value::Int(i) => i.to_string(),
        Value::BigInt(i) => i.to_string(),
        Value::HugeInt(i) => i.to_string(),
        Value::UTinyInt(i) => i.to_string(),
        Value::USmallInt(i) => i.to_string(),
        Value::UInt(i) => i.to_string(),
        Value::UBigInt(i) => i.to_string(),
        Value::Float(f) => render::float(f64::from(*f)),
        Value::Double(f) => render::float(*f),
        Value::Decimal(d) => render::decimal(d),
        Value::Timestamp(unit, v) => render::datetime(micros(*unit, *v)),
        Value::Text(s) | Value::Enum(s) => render::text(s),
        Value::Blob(b) => render::bytes(b),
        Value::Date32(days) => render::date(i64::from(*days)),
        Value::Time64(unit, v) => render::time(micros(*unit, *v)),
        Value::Interval {
            months,
            days,
            nanos,
        } => {
            let days = i64::from(*months) * 30 + i64::from(*days);
            render::timedelta(days, nanos / 1_000)
        }
        Value::List(items) | Value::Array(items) => render::list(items.iter().map(render_value)),
        Value::Struct(fields) => render::dict(
            fields
                .keys()
                .zip(fields.values())
                .map(|(key, value)| (render::text(key), render_value(value))),
        ),
        Value::Map(entries) => render::dict(
            entries
                .keys()
                .zip(entries.values())
                .map(|(key, value)| (render_value(key), render_value(value))),
        ),
        Value::Union(inner) => render_value(inner),
        #[allow(unreachable_patterns)]
        other => render::text(&format!("{other:?}")),
    }
}

#[inline]
pub fn duckdb_error(error: duckdb::Error) -> EngineError {
    match error {
        duckdb::Error::DuckDBFailure(_, Some(message)) => classify_message(&message),
        other => classify_message(&other.to_string()),
    }
}

/// Split DuckDB's `"<Kind> Error: <message>"` form into kind and message
#[inline]
pub fn classify_message(message: &str) -> EngineError {
    if let Some((prefix, rest)) = message.split_once(": ") {
        let is_kind = prefix.ends_with(" Error")
            && prefix.chars().all(|c| c.is_ascii_alphabetic() || c == ' ');
        if is_kind {
            let kind: String = prefix.split_whitespace().collect();
            return EngineError::new(kind, rest.trim());
        }
    }
    EngineError::new(DUCKDB_ERROR_KIND, message.trim())
}
