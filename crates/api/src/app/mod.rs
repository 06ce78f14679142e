//! HTTP API application wiring (Axum router + handler chains).
//!
//! If you're new to Rust, this folder is structured like:
//! - `routes/`: endpoints, one handler chain per route (one file per area)
//! - `dto.rs`: request DTOs and their validation schemas
//! - `errors.rs`: the error translator and consistent error responses

use std::sync::Arc;

use axum::Router;

use forum_board::ForumStore;

use errors::{ErrorTranslator, FailureSink, TracingSink};

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(store: Arc<dyn ForumStore>) -> Router {
    build_app_with_sink(store, Arc::new(TracingSink))
}

/// Like [`build_app`], with unrecognized errors reported to `sink`.
pub fn build_app_with_sink(store: Arc<dyn ForumStore>, sink: Arc<dyn FailureSink>) -> Router {
    let translator = ErrorTranslator::new(sink);
    routes::router(store, &translator)
}
