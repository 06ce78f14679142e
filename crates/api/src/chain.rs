//! Handler chains: ordered, per-request processing steps.
//!
//! If you're new to this pattern: every step receives the request's
//! [`HandlerContext`] plus a [`Next`] handle for "the rest of the chain". A step
//! can
//! - do some work and call `next.run(ctx)` (pass-through),
//! - commit a response and return without calling `next` (short-circuit),
//! - return an error, which skips every remaining step and lands in the
//!   nearest enclosing [`ErrorTranslator`].
//!
//! Steps run strictly one after another. A [`Chain`] holds no per-request
//! state; each request gets a fresh context.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::{
    extract::Request,
    handler::Handler,
    http::{HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use tracing::Instrument;

use crate::app::errors::{self, ErrorTranslator};
use crate::context::{HandlerContext, RequestParts};

/// Response header echoing the request id.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// One processing step.
#[async_trait]
pub trait Step: Send + Sync {
    async fn handle(&self, ctx: &mut HandlerContext, next: Next<'_>) -> anyhow::Result<()>;
}

/// The steps after the current one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Arc<dyn Step>],
}

impl<'a> Next<'a> {
    pub fn new(rest: &'a [Arc<dyn Step>]) -> Self {
        Self { rest }
    }

    /// Run the remaining steps. The end of the chain is a no-op.
    pub async fn run(self, ctx: &mut HandlerContext) -> anyhow::Result<()> {
        match self.rest.split_first() {
            Some((step, rest)) => step.handle(ctx, Next { rest }).await,
            None => Ok(()),
        }
    }
}

/// Ordered steps wrapped by an error translator.
///
/// Cheap to clone; doubles as an axum handler.
#[derive(Clone)]
pub struct Chain {
    translator: ErrorTranslator,
    steps: Arc<[Arc<dyn Step>]>,
}

impl Chain {
    pub fn builder(translator: ErrorTranslator) -> ChainBuilder {
        ChainBuilder {
            translator,
            steps: Vec::new(),
        }
    }

    /// Run the chain for one request and hand back its finished context.
    pub async fn execute(&self, request: RequestParts) -> HandlerContext {
        let mut ctx = HandlerContext::new(request);
        let span = tracing::info_span!(
            "request",
            request_id = %ctx.request_id(),
            method = %ctx.request().method(),
            path = %ctx.request().path(),
        );

        async {
            let started = Instant::now();
            self.translator
                .guard(&mut ctx, Next::new(&self.steps))
                .await;
            tracing::info!(
                status = ?ctx.response().status(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request completed"
            );
        }
        .instrument(span)
        .await;

        ctx
    }

    /// Run the chain and produce the HTTP response.
    pub async fn serve(&self, request: RequestParts) -> Response {
        let ctx = self.execute(request).await;
        let request_id = ctx.request_id();

        let mut response = ctx.into_response().unwrap_or_else(|| {
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                errors::INTERNAL_ERROR_MESSAGE,
            )
        });
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
}

impl<S> Handler<(), S> for Chain
where
    S: Send + Sync + 'static,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send>>;

    fn call(self, req: Request, _state: S) -> Self::Future {
        Box::pin(async move {
            match RequestParts::from_http(req).await {
                Ok(parts) => self.serve(parts).await,
                Err(rejection) => rejection,
            }
        })
    }
}

/// Collects steps in execution order.
pub struct ChainBuilder {
    translator: ErrorTranslator,
    steps: Vec<Arc<dyn Step>>,
}

impl ChainBuilder {
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn build(self) -> Chain {
        Chain {
            translator: self.translator,
            steps: self.steps.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::anyhow;
    use axum::http::Method;
    use serde_json::json;

    use forum_core::ApplicationFailure;

    use crate::app::errors::FailureSink;

    /// Records every step that ran, in order.
    #[derive(Clone, Default)]
    struct Trail(Arc<Mutex<Vec<&'static str>>>);

    impl Trail {
        fn push(&self, name: &'static str) {
            self.0.lock().unwrap().push(name);
        }

        fn seen(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    enum Action {
        PassThrough,
        Commit(StatusCode),
        Fail(fn() -> anyhow::Error),
    }

    struct Scripted {
        name: &'static str,
        trail: Trail,
        action: Action,
    }

    #[async_trait]
    impl Step for Scripted {
        async fn handle(&self, ctx: &mut HandlerContext, next: Next<'_>) -> anyhow::Result<()> {
            self.trail.push(self.name);
            match &self.action {
                Action::PassThrough => next.run(ctx).await,
                Action::Commit(status) => {
                    ctx.response_mut()
                        .commit(*status, json!({ "by": self.name }))?;
                    Ok(())
                }
                Action::Fail(make) => Err(make()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<String>>);

    impl FailureSink for RecordingSink {
        fn report(&self, error: &anyhow::Error) {
            self.0.lock().unwrap().push(error.to_string());
        }
    }

    fn scripted(name: &'static str, trail: &Trail, action: Action) -> Scripted {
        Scripted {
            name,
            trail: trail.clone(),
            action,
        }
    }

    fn request() -> RequestParts {
        RequestParts::new(Method::GET, "/steps")
    }

    #[tokio::test]
    async fn steps_run_in_order_until_one_commits() {
        let trail = Trail::default();
        let chain = Chain::builder(ErrorTranslator::tracing())
            .step(scripted("first", &trail, Action::PassThrough))
            .step(scripted("second", &trail, Action::PassThrough))
            .step(scripted("third", &trail, Action::Commit(StatusCode::OK)))
            .step(scripted("never", &trail, Action::PassThrough))
            .build();

        let ctx = chain.execute(request()).await;

        assert_eq!(trail.seen(), vec!["first", "second", "third"]);
        let committed = ctx.response().committed().unwrap();
        assert_eq!(committed.status, StatusCode::OK);
        assert_eq!(committed.body, json!({ "by": "third" }));
    }

    #[tokio::test]
    async fn short_circuit_skips_the_rest() {
        let trail = Trail::default();
        let chain = Chain::builder(ErrorTranslator::tracing())
            .step(scripted(
                "guard",
                &trail,
                Action::Commit(StatusCode::UNSUPPORTED_MEDIA_TYPE),
            ))
            .step(scripted("endpoint", &trail, Action::Commit(StatusCode::OK)))
            .build();

        let ctx = chain.execute(request()).await;

        assert_eq!(trail.seen(), vec!["guard"]);
        assert_eq!(
            ctx.response().status(),
            Some(StatusCode::UNSUPPORTED_MEDIA_TYPE)
        );
    }

    #[tokio::test]
    async fn known_failure_aborts_and_is_translated() {
        let trail = Trail::default();
        let sink = Arc::new(RecordingSink::default());
        let chain = Chain::builder(ErrorTranslator::new(sink.clone()))
            .step(scripted(
                "check",
                &trail,
                Action::Fail(|| ApplicationFailure::conflict("Taken").into()),
            ))
            .step(scripted("endpoint", &trail, Action::Commit(StatusCode::OK)))
            .build();

        let ctx = chain.execute(request()).await;

        assert_eq!(trail.seen(), vec!["check"]);
        let committed = ctx.response().committed().unwrap();
        assert_eq!(committed.status, StatusCode::CONFLICT);
        assert_eq!(committed.body, json!({ "message": "Taken" }));
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_error_mid_chain_is_a_generic_500_reported_once() {
        let trail = Trail::default();
        let sink = Arc::new(RecordingSink::default());
        let chain = Chain::builder(ErrorTranslator::new(sink.clone()))
            .step(scripted("first", &trail, Action::PassThrough))
            .step(scripted(
                "boom",
                &trail,
                Action::Fail(|| anyhow!("connection reset by database")),
            ))
            .step(scripted("never", &trail, Action::Commit(StatusCode::OK)))
            .build();

        let response = chain.serve(request()).await;

        assert_eq!(trail.seen(), vec!["first", "boom"]);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "message": errors::INTERNAL_ERROR_MESSAGE }));
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec!["connection reset by database".to_string()]
        );
    }

    #[tokio::test]
    async fn nearest_translator_handles_the_failure() {
        let trail = Trail::default();
        let outer_sink = Arc::new(RecordingSink::default());
        let inner_sink = Arc::new(RecordingSink::default());

        let chain = Chain::builder(ErrorTranslator::new(outer_sink.clone()))
            .step(scripted("outer", &trail, Action::PassThrough))
            .step(ErrorTranslator::new(inner_sink.clone()))
            .step(scripted(
                "boom",
                &trail,
                Action::Fail(|| anyhow!("inner failure")),
            ))
            .build();

        let ctx = chain.execute(request()).await;

        assert_eq!(
            ctx.response().status(),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(inner_sink.0.lock().unwrap().len(), 1);
        assert!(outer_sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chain_that_never_commits_is_a_defect() {
        let trail = Trail::default();
        let sink = Arc::new(RecordingSink::default());
        let chain = Chain::builder(ErrorTranslator::new(sink.clone()))
            .step(scripted("lazy", &trail, Action::PassThrough))
            .build();

        let ctx = chain.execute(request()).await;

        assert_eq!(
            ctx.response().status(),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn contexts_are_not_shared_between_requests() {
        struct Counter;

        #[async_trait]
        impl Step for Counter {
            async fn handle(
                &self,
                ctx: &mut HandlerContext,
                _next: Next<'_>,
            ) -> anyhow::Result<()> {
                let seen = ctx.get::<u32>().copied().unwrap_or(0);
                ctx.insert(seen + 1);
                ctx.response_mut()
                    .commit(StatusCode::OK, json!({ "seen": seen }))?;
                Ok(())
            }
        }

        let chain = Chain::builder(ErrorTranslator::tracing())
            .step(Counter)
            .build();
        for _ in 0..3 {
            let ctx = chain.execute(request()).await;
            assert_eq!(
                ctx.response().committed().unwrap().body,
                json!({ "seen": 0 })
            );
        }
    }
}
