#[cfg(test)]
mod tests;

use rusqlite::functions::{Context as FunctionContext, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, ffi};
use std::ffi::CString;
use std::io::Write;
use std::os::raw::c_int;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info};

use super::{EngineAdapter, EngineError, EngineKind, ExecuteError, render, statement};
use crate::functions::{self, FunctionSpec};
use crate::models::ModelRegistry;
use crate::sniff::Target;

const DATABASE_ERROR_KIND: &str = "DatabaseError";
const PROGRAMMING_ERROR_KIND: &str = "ProgrammingError";

/// Row-store adapter over a single rusqlite connection in autocommit mode.
#[derive(Debug)]
pub struct SqliteAdapter {
    conn: Connection,
    version: String,
}

impl SqliteAdapter {
    #[inline]
    pub fn open(target: &Target) -> Result<Self, EngineError> {
        let conn = match target {
            Target::Memory => Connection::open_in_memory(),
            Target::Path(path) => Connection::open(path),
        }
        .map_err(sqlite_error)?;

        info!("Opened SQLite {} connection to {}", rusqlite::version(), target);
        Ok(Self {
            conn,
            version: rusqlite::version().to_string(),
        })
    }

    fn bind(&self, spec: &FunctionSpec, models: &Arc<ModelRegistry>) -> rusqlite::Result<()> {
        let mut flags = FunctionFlags::SQLITE_UTF8;
        if spec.deterministic {
            flags |= FunctionFlags::SQLITE_DETERMINISTIC;
        }

        let kind = spec.kind;
        let name = spec.name;
        let models = AssertUnwindSafe(Arc::clone(models));
        self.conn.create_scalar_function(
            name,
            c_int::from(spec.arity),
            flags,
            move |ctx: &FunctionContext<'_>| {
                let mut args = Vec::with_capacity(ctx.len());
                for index in 0..ctx.len() {
                    match function_argument(name, ctx.get_raw(index))? {
                        Some(arg) => args.push(arg),
                        None => return Ok(None),
                    }
                }

                let (input, model) = match args.as_slice() {
                    [input] => (input.as_str(), None),
                    [input, model] => (input.as_str(), Some(model.as_str())),
                    _ => {
                        return Err(rusqlite::Error::UserFunctionError(
                            format!("{name}() takes one or two arguments").into(),
                        ));
                    }
                };

                functions::invoke(&models, kind, input, model)
                    .map(Some)
                    .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))
            },
        )
    }
}

/// SQL text for a function argument; `None` for NULL
fn function_argument(function: &str, value: ValueRef<'_>) -> rusqlite::Result<Option<String>> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(i.to_string())),
        ValueRef::Real(f) => Ok(Some(render::float(f))),
        ValueRef::Text(t) => Ok(Some(String::from_utf8_lossy(t).into_owned())),
        ValueRef::Blob(_) => Err(rusqlite::Error::UserFunctionError(
            format!("{function}() does not accept blob arguments").into(),
        )),
    }
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => render::NONE.to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => render::float(f),
        ValueRef::Text(t) => render::text(&String::from_utf8_lossy(t)),
        ValueRef::Blob(b) => render::bytes(b),
    }
}

impl EngineAdapter for SqliteAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::Sqlite
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn is_complete(&self, sql: &str) -> bool {
        let Ok(sql) = CString::new(sql) else {
            return statement::is_complete(sql);
        };
        // SAFETY: `sql` is a valid NUL-terminated string that outlives the call,
        // and sqlite3_complete only reads it.
        unsafe { ffi::sqlite3_complete(sql.as_ptr()) != 0 }
    }

    fn execute(&mut self, sql: &str, out: &mut dyn Write) -> Result<usize, ExecuteError> {
        // SQLite's own tokenizer decides where the first statement ends
        let mut batch = Batch::new(&self.conn, sql);
        let Some(mut stmt) = batch.next().map_err(sqlite_error)? else {
            return Ok(0);
        };
        if !matches!(batch.next(), Ok(None)) {
            return Err(EngineError::new(
                PROGRAMMING_ERROR_KIND,
                "You can only execute one statement at a time.",
            )
            .into());
        }

        debug!("Executing on SQLite: {}", sql);
        let column_count = stmt.column_count();
        let mut rows = stmt.query([]).map_err(sqlite_error)?;

        let mut count = 0;
        while let Some(row) = rows.next().map_err(sqlite_error)? {
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                values.push(render_value(row.get_ref(index).map_err(sqlite_error)?));
            }
            writeln!(out, "{}", render::tuple(&values))?;
            count += 1;
        }

        Ok(count)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), EngineError> {
        self.conn.execute_batch(sql).map_err(sqlite_error)
    }

    fn register_functions(
        &mut self,
        functions: &[FunctionSpec],
        models: &Arc<ModelRegistry>,
    ) -> Result<(), EngineError> {
        for spec in functions {
            debug!("Registering SQLite function {}", spec);
            self.bind(spec, models).map_err(sqlite_error)?;
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), EngineError> {
        debug!("Closing SQLite connection");
        self.conn.close().map_err(|(_, error)| sqlite_error(error))
    }
}

#[inline]
pub fn sqlite_error(error: rusqlite::Error) -> EngineError {
    match error {
        rusqlite::Error::SqliteFailure(failure, message) => EngineError::with_code(
            error_class(failure.extended_code),
            result_code_name(failure.extended_code),
            message.unwrap_or_else(|| failure.to_string()),
        ),
        other => EngineError::new(DATABASE_ERROR_KIND, other.to_string()),
    }
}

/// DB-API exception class for a result code
#[inline]
pub fn error_class(code: c_int) -> &'static str {
    match code & 0xff {
        ffi::SQLITE_INTERNAL | ffi::SQLITE_NOTFOUND => "InternalError",
        ffi::SQLITE_NOMEM => "MemoryError",
        ffi::SQLITE_ERROR
        | ffi::SQLITE_PERM
        | ffi::SQLITE_ABORT
        | ffi::SQLITE_BUSY
        | ffi::SQLITE_LOCKED
        | ffi::SQLITE_READONLY
        | ffi::SQLITE_INTERRUPT
        | ffi::SQLITE_IOERR
        | ffi::SQLITE_FULL
        | ffi::SQLITE_CANTOPEN
        | ffi::SQLITE_PROTOCOL
        | ffi::SQLITE_EMPTY
        | ffi::SQLITE_SCHEMA => "OperationalError",
        ffi::SQLITE_TOOBIG => "DataError",
        ffi::SQLITE_CONSTRAINT | ffi::SQLITE_MISMATCH => "IntegrityError",
        ffi::SQLITE_MISUSE | ffi::SQLITE_RANGE => "InterfaceError",
        _ => DATABASE_ERROR_KIND,
    }
}

const fn extended(primary: c_int, index: c_int) -> c_int {
    primary | (index << 8)
}

const EXTENDED_CODE_NAMES: &[(c_int, &str)] = &[
    (extended(ffi::SQLITE_ERROR, 1), "SQLITE_ERROR_MISSING_COLLSEQ"),
    (extended(ffi::SQLITE_ERROR, 2), "SQLITE_ERROR_RETRY"),
    (extended(ffi::SQLITE_ERROR, 3), "SQLITE_ERROR_SNAPSHOT"),
    (extended(ffi::SQLITE_IOERR, 1), "SQLITE_IOERR_READ"),
    (extended(ffi::SQLITE_IOERR, 2), "SQLITE_IOERR_SHORT_READ"),
    (extended(ffi::SQLITE_IOERR, 3), "SQLITE_IOERR_WRITE"),
    (extended(ffi::SQLITE_IOERR, 4), "SQLITE_IOERR_FSYNC"),
    (extended(ffi::SQLITE_IOERR, 5), "SQLITE_IOERR_DIR_FSYNC"),
    (extended(ffi::SQLITE_IOERR, 6), "SQLITE_IOERR_TRUNCATE"),
    (extended(ffi::SQLITE_IOERR, 7), "SQLITE_IOERR_FSTAT"),
    (extended(ffi::SQLITE_IOERR, 8), "SQLITE_IOERR_UNLOCK"),
    (extended(ffi::SQLITE_IOERR, 9), "SQLITE_IOERR_RDLOCK"),
    (extended(ffi::SQLITE_IOERR, 10), "SQLITE_IOERR_DELETE"),
    (extended(ffi::SQLITE_IOERR, 12), "SQLITE_IOERR_NOMEM"),
    (extended(ffi::SQLITE_IOERR, 13), "SQLITE_IOERR_ACCESS"),
    (extended(ffi::SQLITE_IOERR, 14), "SQLITE_IOERR_CHECKRESERVEDLOCK"),
    (extended(ffi::SQLITE_IOERR, 15), "SQLITE_IOERR_LOCK"),
    (extended(ffi::SQLITE_IOERR, 16), "SQLITE_IOERR_CLOSE"),
    (extended(ffi::SQLITE_IOERR, 18), "SQLITE_IOERR_SHMOPEN"),
    (extended(ffi::SQLITE_IOERR, 19), "SQLITE_IOERR_SHMSIZE"),
    (extended(ffi::SQLITE_IOERR, 20), "SQLITE_IOERR_SHMLOCK"),
    (extended(ffi::SQLITE_IOERR, 21), "SQLITE_IOERR_SHMMAP"),
    (extended(ffi::SQLITE_IOERR, 22), "SQLITE_IOERR_SEEK"),
    (extended(ffi::SQLITE_IOERR, 23), "SQLITE_IOERR_DELETE_NOENT"),
    (extended(ffi::SQLITE_IOERR, 24), "SQLITE_IOERR_MMAP"),
    (extended(ffi::SQLITE_IOERR, 25), "SQLITE_IOERR_GETTEMPPATH"),
    (extended(ffi::SQLITE_IOERR, 26), "SQLITE_IOERR_CONVPATH"),
    (extended(ffi::SQLITE_IOERR, 32), "SQLITE_IOERR_DATA"),
    (extended(ffi::SQLITE_IOERR, 33), "SQLITE_IOERR_CORRUPTFS"),
    (extended(ffi::SQLITE_LOCKED, 1), "SQLITE_LOCKED_SHAREDCACHE"),
    (extended(ffi::SQLITE_LOCKED, 2), "SQLITE_LOCKED_VTAB"),
    (extended(ffi::SQLITE_BUSY, 1), "SQLITE_BUSY_RECOVERY"),
    (extended(ffi::SQLITE_BUSY, 2), "SQLITE_BUSY_SNAPSHOT"),
    (extended(ffi::SQLITE_BUSY, 3), "SQLITE_BUSY_TIMEOUT"),
    (extended(ffi::SQLITE_CANTOPEN, 1), "SQLITE_CANTOPEN_NOTEMPDIR"),
    (extended(ffi::SQLITE_CANTOPEN, 2), "SQLITE_CANTOPEN_ISDIR"),
    (extended(ffi::SQLITE_CANTOPEN, 3), "SQLITE_CANTOPEN_FULLPATH"),
    (extended(ffi::SQLITE_CANTOPEN, 4), "SQLITE_CANTOPEN_CONVPATH"),
    (extended(ffi::SQLITE_CANTOPEN, 6), "SQLITE_CANTOPEN_SYMLINK"),
    (extended(ffi::SQLITE_CORRUPT, 1), "SQLITE_CORRUPT_VTAB"),
    (extended(ffi::SQLITE_CORRUPT, 2), "SQLITE_CORRUPT_SEQUENCE"),
    (extended(ffi::SQLITE_CORRUPT, 3), "SQLITE_CORRUPT_INDEX"),
    (extended(ffi::SQLITE_READONLY, 1), "SQLITE_READONLY_RECOVERY"),
    (extended(ffi::SQLITE_READONLY, 2), "SQLITE_READONLY_CANTLOCK"),
    (extended(ffi::SQLITE_READONLY, 3), "SQLITE_READONLY_ROLLBACK"),
    (extended(ffi::SQLITE_READONLY, 4), "SQLITE_READONLY_DBMOVED"),
    (extended(ffi::SQLITE_READONLY, 5), "SQLITE_READONLY_CANTINIT"),
    (extended(ffi::SQLITE_READONLY, 6), "SQLITE_READONLY_DIRECTORY"),
    (extended(ffi::SQLITE_ABORT, 2), "SQLITE_ABORT_ROLLBACK"),
    (extended(ffi::SQLITE_CONSTRAINT, 1), "SQLITE_CONSTRAINT_CHECK"),
    (extended(ffi::SQLITE_CONSTRAINT, 2), "SQLITE_CONSTRAINT_COMMITHOOK"),
    (extended(ffi::SQLITE_CONSTRAINT, 3), "SQLITE_CONSTRAINT_FOREIGNKEY"),
    (extended(ffi::SQLITE_CONSTRAINT, 4), "SQLITE_CONSTRAINT_FUNCTION"),
    (extended(ffi::SQLITE_CONSTRAINT, 5), "SQLITE_CONSTRAINT_NOTNULL"),
    (extended(ffi::SQLITE_CONSTRAINT, 6), "SQLITE_CONSTRAINT_PRIMARYKEY"),
    (extended(ffi::SQLITE_CONSTRAINT, 7), "SQLITE_CONSTRAINT_TRIGGER"),
    (extended(ffi::SQLITE_CONSTRAINT, 8), "SQLITE_CONSTRAINT_UNIQUE"),
    (extended(ffi::SQLITE_CONSTRAINT, 9), "SQLITE_CONSTRAINT_VTAB"),
    (extended(ffi::SQLITE_CONSTRAINT, 10), "SQLITE_CONSTRAINT_ROWID"),
    (extended(ffi::SQLITE_CONSTRAINT, 11), "SQLITE_CONSTRAINT_PINNED"),
    (extended(ffi::SQLITE_CONSTRAINT, 12), "SQLITE_CONSTRAINT_DATATYPE"),
    (extended(ffi::SQLITE_NOTICE, 1), "SQLITE_NOTICE_RECOVER_WAL"),
    (extended(ffi::SQLITE_NOTICE, 2), "SQLITE_NOTICE_RECOVER_ROLLBACK"),
    (extended(ffi::SQLITE_WARNING, 1), "SQLITE_WARNING_AUTOINDEX"),
    (extended(ffi::SQLITE_AUTH, 1), "SQLITE_AUTH_USER"),
];

/// Symbolic name of `code`, extended when known, else its primary code
#[inline]
pub fn result_code_name(code: c_int) -> &'static str {
    if let Some(&(_, name)) = EXTENDED_CODE_NAMES.iter().find(|&&(known, _)| known == code) {
        return name;
    }

    match code & 0xff {
        ffi::SQLITE_ERROR => "SQLITE_ERROR",
        ffi::SQLITE_INTERNAL => "SQLITE_INTERNAL",
        ffi::SQLITE_PERM => "SQLITE_PERM",
        ffi::SQLITE_ABORT => "SQLITE_ABORT",
        ffi::SQLITE_BUSY => "SQLITE_BUSY",
        ffi::SQLITE_LOCKED => "SQLITE_LOCKED",
        ffi::SQLITE_NOMEM => "SQLITE_NOMEM",
        ffi::SQLITE_READONLY => "SQLITE_READONLY",
        ffi::SQLITE_INTERRUPT => "SQLITE_INTERRUPT",
        ffi::SQLITE_IOERR => "SQLITE_IOERR",
        ffi::SQLITE_CORRUPT => "SQLITE_CORRUPT",
        ffi::SQLITE_NOTFOUND => "SQLITE_NOTFOUND",
        ffi::SQLITE_FULL => "SQLITE_FULL",
        ffi::SQLITE_CANTOPEN => "SQLITE_CANTOPEN",
        ffi::SQLITE_PROTOCOL => "SQLITE_PROTOCOL",
        ffi::SQLITE_EMPTY => "SQLITE_EMPTY",
        ffi::SQLITE_SCHEMA => "SQLITE_SCHEMA",
        ffi::SQLITE_TOOBIG => "SQLITE_TOOBIG",
        ffi::SQLITE_CONSTRAINT => "SQLITE_CONSTRAINT",
        ffi::SQLITE_MISMATCH => "SQLITE_MISMATCH",
        ffi::SQLITE_MISUSE => "SQLITE_MISUSE",
        ffi::SQLITE_NOLFS => "SQLITE_NOLFS",
        ffi::SQLITE_AUTH => "SQLITE_AUTH",
        ffi::SQLITE_FORMAT => "SQLITE_FORMAT",
        ffi::SQLITE_RANGE => "SQLITE_RANGE",
        ffi::SQLITE_NOTADB => "SQLITE_NOTADB",
        ffi::SQLITE_NOTICE => "SQLITE_NOTICE",
        ffi::SQLITE_WARNING => "SQLITE_WARNING",
        _ => "SQLITE_UNKNOWN",
    }
}
