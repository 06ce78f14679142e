use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, http::StatusCode, routing::get};

use forum_board::{ForumStore, UserRecord};
use forum_core::{ApplicationFailure, Resource, ResourceView, UserId};

use crate::app::errors::ErrorTranslator;
use crate::chain::{Chain, Next, Step};
use crate::context::HandlerContext;

pub fn router(store: Arc<dyn ForumStore>, translator: &ErrorTranslator) -> Router {
    let show = Chain::builder(translator.clone())
        .step(ShowUser { store })
        .build();

    Router::new().route("/:id", get(show))
}

/// `GET /users/:id`: public profile without credential material.
pub struct ShowUser {
    pub store: Arc<dyn ForumStore>,
}

#[async_trait]
impl Step for ShowUser {
    async fn handle(&self, ctx: &mut HandlerContext, _next: Next<'_>) -> anyhow::Result<()> {
        let id: UserId = ctx.param("id")?;
        let user = self
            .store
            .user(id)
            .await?
            .ok_or_else(|| ApplicationFailure::not_found(UserRecord::NAME, id))?;

        ctx.response_mut()
            .commit(StatusCode::OK, ResourceView::of(&user).into_value())?;
        Ok(())
    }
}
