use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepperError {
    #[error("not initialized: run 'stepper init'")]
    NotInitialized,

    #[error("unknown step: {0}")]
    UnknownStep(String),

    #[error("unknown section '{section}' on step '{step}'")]
    UnknownSection { step: String, section: String },

    #[error("unknown wizard: {0}")]
    UnknownWizard(String),

    #[error("wizard defines no steps")]
    EmptyWizard,

    #[error("duplicate step id: {0}")]
    DuplicateStep(String),

    #[error("steps '{first}' and '{second}' share ordinal {ordinal}")]
    DuplicateOrdinal {
        ordinal: u32,
        first: String,
        second: String,
    },

    #[error("duplicate section '{section}' on step '{step}'")]
    DuplicateSection { step: String, section: String },

    #[error("invalid step id '{0}': must be lowercase alphanumeric with '_' or '-'")]
    InvalidStepId(String),

    #[error("invalid session key '{0}': must be alphanumeric with '_', '-' or '.'")]
    InvalidSessionKey(String),

    #[error("expected {expected} weights, got {got}")]
    WeightMismatch { expected: usize, got: usize },

    #[error("no form bound to step: {0}")]
    NoFormBound(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StepperError>;
