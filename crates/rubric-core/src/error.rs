use thiserror::Error;

#[derive(Debug, Error)]
pub enum RubricError {
    #[error("not initialized: run 'rubric init'")]
    NotInitialized,

    #[error("invalid catalog: {0}")]
    Catalog(String),

    #[error("catalog version mismatch: run was opened against '{expected}', loaded catalog is '{found}'")]
    CatalogMismatch { expected: String, found: String },

    #[error("unknown rule: {0}")]
    UnknownRule(String),

    #[error("duplicate verdict for rule: {0}")]
    DuplicateVerdict(String),

    #[error("incomplete audit: {} rule(s) without a verdict: {}", missing.len(), missing.join(", "))]
    IncompleteAudit { missing: Vec<String> },

    #[error("category '{0}' has zero total weight")]
    EmptyCategory(String),

    #[error("cannot render report: {0}")]
    Render(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("run already exists: {0}")]
    RunExists(String),

    #[error("invalid run id '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidRunId(String),

    #[error("invalid {kind}: '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RubricError>;
