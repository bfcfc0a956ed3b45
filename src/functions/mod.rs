//! SQL functions exposed to both engines
//!
//! Each engine gets an immutable table of [`FunctionSpec`]s. The adapters
//! bind those specs to [`invoke`], which resolves model names through the
//! session's [`ModelRegistry`].

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::models::ModelRegistry;

static ACTIVE_MODELS: RwLock<Option<Arc<ModelRegistry>>> = RwLock::new(None);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Text in, generated text out
    Generate,
    /// Text in, JSON array of floats out
    Embed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub arity: u8,
    pub kind: FunctionKind,
    pub deterministic: bool,
}

impl FunctionSpec {
    const fn generate(arity: u8) -> Self {
        Self {
            name: "generate",
            arity,
            kind: FunctionKind::Generate,
            deterministic: false,
        }
    }

    const fn embed(arity: u8) -> Self {
        Self {
            name: "embed",
            arity,
            kind: FunctionKind::Embed,
            deterministic: true,
        }
    }

    /// Whether the last argument names the model explicitly
    #[inline]
    pub fn takes_model(&self) -> bool {
        self.arity == 2
    }

    #[inline]
    pub fn signature(&self) -> &'static str {
        match (self.kind, self.arity) {
            (FunctionKind::Generate, 1) => "generate(prompt)",
            (FunctionKind::Generate, _) => "generate(prompt, model)",
            (FunctionKind::Embed, 1) => "embed(text)",
            (FunctionKind::Embed, _) => "embed(text, model)",
        }
    }
}

impl fmt::Display for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

pub const SQLITE_FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec::generate(2),
    FunctionSpec::generate(1),
    FunctionSpec::embed(2),
    FunctionSpec::embed(1),
];

pub const DUCKDB_FUNCTIONS: &[FunctionSpec] =
    &[FunctionSpec::generate(2), FunctionSpec::embed(2)];

/// Evaluate one function call. `model` is `None` for the single-argument
/// forms, which fall back to the registry defaults.
#[inline]
pub fn invoke(
    models: &ModelRegistry,
    kind: FunctionKind,
    input: &str,
    model: Option<&str>,
) -> Result<String> {
    match kind {
        FunctionKind::Generate => {
            let model = model.unwrap_or_else(|| models.default_model());
            models.generate(input, model)
        }
        FunctionKind::Embed => {
            let model = model.unwrap_or_else(|| models.default_embedding_model());
            let embedding = models.embed(input, model)?;
            serde_json::to_string(&embedding).context("Failed to serialize embedding")
        }
    }
}

/// Make `models` the registry seen by engines that cannot capture state in
/// their function bindings.
#[inline]
pub fn install(models: Arc<ModelRegistry>) {
    debug!("Installing model registry: {:?}", models);
    let mut active = ACTIVE_MODELS
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *active = Some(models);
}

/// The installed registry, or the offline defaults when none was installed
#[inline]
pub fn active() -> Arc<ModelRegistry> {
    let active = ACTIVE_MODELS
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    match active.as_ref() {
        Some(models) => Arc::clone(models),
        None => Arc::new(ModelRegistry::default()),
    }
}
