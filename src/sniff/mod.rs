//! Database file type detection
//!
//! Decides which engine should open a target by looking at the file itself.
//! SQLite files are recognized by their header; anything else is probed by
//! opening it read-only with DuckDB.

#[cfg(test)]
mod tests;

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MEMORY_TARGET: &str = ":memory:";

/// First 16 bytes of every SQLite 3 database file
pub const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    Memory,
    Path(PathBuf),
}

impl Target {
    #[inline]
    pub fn parse(name: &str) -> Self {
        if name == MEMORY_TARGET {
            Self::Memory
        } else {
            Self::Path(PathBuf::from(name))
        }
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY_TARGET),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffResult {
    RowStore,
    Columnar,
    Unknown,
    NotFound,
    Error,
}

/// Classify `target` by its contents. Never creates or modifies files.
#[inline]
pub fn classify(target: &Target) -> SniffResult {
    let result = match target {
        Target::Memory => SniffResult::RowStore,
        Target::Path(path) => classify_path(path),
    };
    debug!("Sniffed {} as {:?}", target, result);
    result
}

fn classify_path(path: &Path) -> SniffResult {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return SniffResult::NotFound,
        Err(e) => {
            warn!("Cannot inspect {}: {}", path.display(), e);
            return SniffResult::Error;
        }
    };

    if !metadata.is_file() {
        warn!("{} is not a regular file", path.display());
        return SniffResult::Error;
    }
    if metadata.len() == 0 {
        return SniffResult::Unknown;
    }

    match read_header(path) {
        Ok(header) if header == SQLITE_HEADER => SniffResult::RowStore,
        Ok(_) if is_duckdb_file(path) => SniffResult::Columnar,
        Ok(_) => SniffResult::Unknown,
        Err(e) => {
            warn!("Cannot read header of {}: {}", path.display(), e);
            SniffResult::Error
        }
    }
}

/// Up to the first 16 bytes of `path`
fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(SQLITE_HEADER.len());
    File::open(path)?
        .take(SQLITE_HEADER.len() as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}

fn is_duckdb_file(path: &Path) -> bool {
    let config = match duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly) {
        Ok(config) => config,
        Err(e) => {
            debug!("Cannot build read-only DuckDB config: {}", e);
            return false;
        }
    };

    match duckdb::Connection::open_with_flags(path, config) {
        Ok(conn) => {
            let probe = conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0));
            if let Err(e) = &probe {
                debug!("DuckDB probe query failed on {}: {}", path.display(), e);
            }
            probe.is_ok()
        }
        Err(e) => {
            debug!("{} is not a DuckDB database: {}", path.display(), e);
            false
        }
    }
}
