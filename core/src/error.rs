use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed frame at timestep {timestep}: '{field}' has {actual} entries, expected {expected}")]
    MalformedFrame {
        timestep: u64,
        field:    &'static str,
        expected: usize,
        actual:   usize,
    },

    #[error("Run '{run_id}' has no value for sweep parameter '{param}'")]
    MissingParameter { run_id: String, param: &'static str },

    #[error("Run '{run_id}' not found")]
    RunNotFound { run_id: String },

    #[error("Could not calculate limits: data is empty or singular")]
    NoLimits,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
