//! Consistent error responses.
//!
//! The [`ErrorTranslator`] is the single place where raised errors become HTTP
//! responses. Known [`ApplicationFailure`]s map to their status code and a
//! `{ "message", ...context }` envelope; anything else is a defect: the client
//! gets a generic 500 and the original error goes to a [`FailureSink`].

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Map, Value, json};

use forum_core::{ApplicationFailure, ValidationFailure};

use crate::chain::{Next, Step};
use crate::context::HandlerContext;

/// Body message for every unrecognized error.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

const NEVER_COMMITTED: &str = "handler chain completed without committing a response";

/// Receives errors the translator does not recognize.
pub trait FailureSink: Send + Sync {
    fn report(&self, error: &anyhow::Error);
}

/// Default sink: an `error` event on the current request span.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, error: &anyhow::Error) {
        tracing::error!(error = ?error, "unhandled error in handler chain");
    }
}

/// Terminal chain step turning errors into committed responses.
#[derive(Clone)]
pub struct ErrorTranslator {
    sink: Arc<dyn FailureSink>,
}

impl ErrorTranslator {
    pub fn new(sink: Arc<dyn FailureSink>) -> Self {
        Self { sink }
    }

    /// Translator reporting to [`TracingSink`].
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    /// Run `next` and translate whatever it raises.
    ///
    /// A chain that finishes without committing a response is treated as an
    /// unrecognized error.
    pub async fn guard(&self, ctx: &mut HandlerContext, next: Next<'_>) {
        let mut outcome = next.run(ctx).await;
        if outcome.is_ok() && !ctx.response().is_committed() {
            outcome = Err(anyhow::Error::msg(NEVER_COMMITTED));
        }

        if let Err(err) = outcome {
            self.translate(ctx, err);
        }
    }

    /// Commit the response for `err`.
    ///
    /// If a response is already committed it stays as is; the error is still
    /// reported so it is not lost.
    pub fn translate(&self, ctx: &mut HandlerContext, err: anyhow::Error) {
        if ctx.response().is_committed() {
            let err = err.context("error after response was committed");
            self.sink.report(&err);
            return;
        }

        let (status, body) = match recognize(err) {
            Ok(failure) => {
                tracing::info!(
                    kind = %failure.kind(),
                    status = failure.status_code(),
                    "request failed"
                );
                (status_of(&failure), envelope(&failure))
            }
            Err(err) => {
                self.sink.report(&err);
                (StatusCode::INTERNAL_SERVER_ERROR, internal_envelope())
            }
        };

        if let Err(e) = ctx.response_mut().commit(status, body) {
            self.sink.report(&anyhow::Error::new(e));
        }
    }
}

#[async_trait]
impl Step for ErrorTranslator {
    async fn handle(&self, ctx: &mut HandlerContext, next: Next<'_>) -> anyhow::Result<()> {
        self.guard(ctx, next).await;
        Ok(())
    }
}

/// Recover an [`ApplicationFailure`] from an opaque error, if it is one.
pub fn recognize(err: anyhow::Error) -> Result<ApplicationFailure, anyhow::Error> {
    let err = match err.downcast::<ApplicationFailure>() {
        Ok(failure) => return Ok(failure),
        Err(err) => err,
    };
    err.downcast::<ValidationFailure>()
        .map(ApplicationFailure::from)
}

/// HTTP status for each known failure.
pub fn status_of(failure: &ApplicationFailure) -> StatusCode {
    match failure {
        ApplicationFailure::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApplicationFailure::Conflict { .. } => StatusCode::CONFLICT,
        ApplicationFailure::NotFound { .. } => StatusCode::NOT_FOUND,
    }
}

/// `{ "message": ..., ...context }`; `message` cannot be overridden by context.
pub fn envelope(failure: &ApplicationFailure) -> Value {
    let mut body = Map::new();
    if let Some(context) = failure.context() {
        body.extend(context);
    }
    body.insert("message".to_string(), json!(failure.message()));
    Value::Object(body)
}

pub fn internal_envelope() -> Value {
    json!({ "message": INTERNAL_ERROR_MESSAGE })
}

/// Transport-level error answered outside any chain.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    let body = json!({ "message": message.into() });
    (status, axum::Json(body)).into_response()
}
