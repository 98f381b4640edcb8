use thiserror::Error;

/// The error taxonomy the dispatcher and transports understand.
///
/// Every variant maps to an HTTP status and a JSON-RPC error code; see
/// [`AidisError::http_status`] and [`AidisError::json_rpc_code`].
#[derive(Error, Debug)]
pub enum AidisError {
    #[error("validation failed for field '{field}': {reason}")]
    Validation {
        field: String,
        reason: String,
        expected: Option<String>,
        got: Option<String>,
    },

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("session has no resolved project")]
    MissingProject,

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("embedding function unavailable")]
    EmbeddingUnavailable,

    #[error("embedding dimensionality mismatch: expected {expected}, got {got}")]
    EmbeddingDimensionMismatch { expected: usize, got: usize },

    #[error("handler exceeded its deadline")]
    Timeout,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[source] anyhow::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AidisError>;

impl AidisError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AidisError::Validation {
            field: field.into(),
            reason: reason.into(),
            expected: None,
            got: None,
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        AidisError::Validation {
            field: field.into(),
            reason: "type_mismatch".to_string(),
            expected: Some(expected.into()),
            got: Some(got.into()),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AidisError::NotFound {
            resource: resource.into(),
        }
    }

    /// A short identifier for the error kind, used in logs (never in the
    /// user-facing message).
    pub fn kind(&self) -> &'static str {
        match self {
            AidisError::Validation { .. } => "ValidationError",
            AidisError::UnknownTool(_) => "UnknownTool",
            AidisError::MissingProject => "MissingProject",
            AidisError::NotFound { .. } => "NotFound",
            AidisError::Conflict(_) => "Conflict",
            AidisError::EmbeddingUnavailable => "EmbeddingUnavailable",
            AidisError::EmbeddingDimensionMismatch { .. } => "EmbeddingDimensionMismatch",
            AidisError::Timeout => "Timeout",
            AidisError::Database(_) => "DatabaseError",
            AidisError::Internal(_) | AidisError::Io(_) | AidisError::Json(_) | AidisError::Http(_) => {
                "InternalError"
            }
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AidisError::Validation { .. } => 400,
            AidisError::UnknownTool(_) => 404,
            AidisError::MissingProject => 400,
            AidisError::NotFound { .. } => 404,
            AidisError::Conflict(_) => 409,
            AidisError::EmbeddingUnavailable => 503,
            AidisError::EmbeddingDimensionMismatch { .. } => 500,
            AidisError::Timeout => 504,
            AidisError::Database(_) => 500,
            AidisError::Internal(_) | AidisError::Io(_) | AidisError::Json(_) | AidisError::Http(_) => {
                500
            }
        }
    }

    pub fn json_rpc_code(&self) -> i64 {
        match self {
            AidisError::Validation { .. } => -32602,
            AidisError::UnknownTool(_) => -32601,
            AidisError::Database(_) | AidisError::Internal(_) | AidisError::Io(_)
            | AidisError::Json(_) | AidisError::Http(_) => -32603,
            AidisError::MissingProject
            | AidisError::NotFound { .. }
            | AidisError::Conflict(_)
            | AidisError::EmbeddingUnavailable
            | AidisError::EmbeddingDimensionMismatch { .. }
            | AidisError::Timeout => -32000,
        }
    }

    /// A concise, user-safe message: never a stack trace, SQL fragment, or
    /// database identifier, per the propagation policy.
    pub fn to_user_string(&self) -> String {
        match self {
            AidisError::Database(_) | AidisError::Internal(_) => {
                "internal error; see server logs".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<String> for AidisError {
    fn from(s: String) -> Self {
        AidisError::Internal(anyhow::anyhow!(s))
    }
}

impl From<anyhow::Error> for AidisError {
    fn from(e: anyhow::Error) -> Self {
        AidisError::Internal(e)
    }
}
