use std::sync::Arc;

use axum::Router;

use forum_board::ForumStore;

use crate::app::errors::ErrorTranslator;

pub mod posts;
pub mod threads;
pub mod users;

/// Router for every forum endpoint. Each endpoint is its own handler chain.
pub fn router(store: Arc<dyn ForumStore>, translator: &ErrorTranslator) -> Router {
    Router::new()
        .nest("/posts", posts::router(store.clone(), translator))
        .nest("/threads", threads::router(store.clone(), translator))
        .nest("/users", users::router(store, translator))
}
