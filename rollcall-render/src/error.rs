//! Error types for rollcall-render.

use thiserror::Error;

/// All errors that can arise from payload rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (syntax at load time, missing variable at render time).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller asked for a template that was never registered.
    #[error("unknown payload template '{0}'")]
    UnknownTemplate(String),
}
