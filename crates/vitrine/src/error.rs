use std::path::PathBuf;

use vitrine_gemini::GeminiError;
use vitrine_geometry::GeometryError;
use vitrine_workflow::WorkflowError;

/// Everything that can end a command early.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error("step {index} ({action}): {source}")]
    Step {
        index: usize,
        action: &'static str,
        #[source]
        source: WorkflowError,
    },

    #[error("async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
