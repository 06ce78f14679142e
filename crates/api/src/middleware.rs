//! Reusable chain steps that run before endpoints.

use core::marker::PhantomData;

use async_trait::async_trait;
use axum::http::{StatusCode, header::CONTENT_TYPE};
use serde_json::json;

use forum_core::{ApplicationFailure, Validate};

use crate::chain::{Next, Step};
use crate::context::HandlerContext;

/// Rejects non-empty bodies that are not declared as JSON.
///
/// Commits a 415 itself instead of raising; nothing after it runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireJson;

#[async_trait]
impl Step for RequireJson {
    async fn handle(&self, ctx: &mut HandlerContext, next: Next<'_>) -> anyhow::Result<()> {
        let request = ctx.request();
        let has_body = !request.body().iter().all(u8::is_ascii_whitespace);
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));

        if has_body && !is_json {
            ctx.response_mut().commit(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                json!({ "message": "Content-Type must be application/json" }),
            )?;
            return Ok(());
        }

        next.run(ctx).await
    }
}

/// Validates the JSON body as `T` and stores the resulting
/// `ValidatedPayload<T>` in the context for later steps.
pub struct ValidateBody<T>(PhantomData<fn() -> T>);

impl<T> ValidateBody<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ValidateBody<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Step for ValidateBody<T>
where
    T: Validate + Clone + Send + Sync + 'static,
{
    async fn handle(&self, ctx: &mut HandlerContext, next: Next<'_>) -> anyhow::Result<()> {
        let input = ctx.request().json_body().map_err(ApplicationFailure::from)?;
        let payload = T::validate(&input).map_err(ApplicationFailure::from)?;
        tracing::debug!(schema = T::SCHEMA.name, "request body validated");

        ctx.insert(payload);
        next.run(ctx).await
    }
}
