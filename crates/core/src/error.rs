//! Failure taxonomy.
//!
//! Every failure the forum raises on purpose is an [`ApplicationFailure`]. Each
//! variant has a fixed HTTP-style status code and a stable [`FailureKind`]
//! discriminator; the API edge matches on the variants exhaustively and falls
//! back to a generic 500 for anything else.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Structured diagnostic data attached to a failure.
///
/// Keys end up as top-level fields of the JSON error envelope.
pub type Context = Map<String, Value>;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, ApplicationFailure>;

/// One validation violation: a dotted path into the input and a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    field: String,
    message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Client input was malformed.
///
/// Carries every violation found, in the order the constraints were declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed")]
pub struct ValidationFailure {
    errors: Vec<FieldError>,
}

impl ValidationFailure {
    /// Top-level message of every validation failure.
    pub const MESSAGE: &'static str = "Validation failed";

    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Failure with exactly one field error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// `{ "details": [ { "field", "message" }, ... ] }`
    pub fn context(&self) -> Context {
        let mut ctx = Context::new();
        ctx.insert("details".to_string(), json!(self.errors));
        ctx
    }
}

/// Stable discriminator of a failure variant.
///
/// Used in logs and for exhaustive handling; names never collide.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Validation,
    Conflict,
    NotFound,
}

impl FailureKind {
    /// Every known kind, in declaration order.
    pub const ALL: [FailureKind; 3] = [
        FailureKind::Validation,
        FailureKind::Conflict,
        FailureKind::NotFound,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Validation => "validation_error",
            FailureKind::Conflict => "conflict",
            FailureKind::NotFound => "not_found",
        }
    }

    /// HTTP-style status code fixed for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            FailureKind::Validation => 422,
            FailureKind::Conflict => 409,
            FailureKind::NotFound => 404,
        }
    }
}

impl core::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deliberate, recoverable failure.
///
/// Immutable once built; create a fresh value per violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplicationFailure {
    /// Client input failed schema validation (422).
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// A state precondition was violated (409).
    #[error("{message}")]
    Conflict {
        message: String,
        context: Option<Context>,
    },

    /// The addressed record does not exist (404).
    #[error("{resource} not found")]
    NotFound { resource: &'static str, id: String },
}

impl ApplicationFailure {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            context: None,
        }
    }

    pub fn conflict_with(message: impl Into<String>, context: Context) -> Self {
        Self::Conflict {
            message: message.into(),
            context: Some(context),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ApplicationFailure::Validation(_) => FailureKind::Validation,
            ApplicationFailure::Conflict { .. } => FailureKind::Conflict,
            ApplicationFailure::NotFound { .. } => FailureKind::NotFound,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Human-readable message; same text as `Display`.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Diagnostic context merged into the response envelope.
    pub fn context(&self) -> Option<Context> {
        match self {
            ApplicationFailure::Validation(v) => Some(v.context()),
            ApplicationFailure::Conflict { context, .. } => context.clone(),
            ApplicationFailure::NotFound { resource, id } => {
                let mut ctx = Context::new();
                ctx.insert("resource".to_string(), json!(resource));
                ctx.insert("id".to_string(), json!(id));
                Some(ctx)
            }
        }
    }
}
