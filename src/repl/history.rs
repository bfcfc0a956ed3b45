//! Location of the REPL history file
//!
//! Defaults to `~/.tsellm_history`. `TSELLM_HISTORY` overrides the path and
//! an empty value disables history persistence.

use std::env;
use std::path::PathBuf;

const DEFAULT_HISTORY_FILE: &str = ".tsellm_history";
pub const HISTORY_ENV_VAR: &str = "TSELLM_HISTORY";

#[inline]
pub fn history_path() -> Option<PathBuf> {
    if let Ok(custom_path) = env::var(HISTORY_ENV_VAR) {
        if custom_path.is_empty() {
            return None;
        }
        return Some(PathBuf::from(custom_path));
    }

    dirs::home_dir().map(|home| home.join(DEFAULT_HISTORY_FILE))
}
