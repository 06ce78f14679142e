use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, http::StatusCode, routing::patch};
use chrono::Utc;

use forum_board::{ForumStore, ThreadRecord};
use forum_core::{ApplicationFailure, Resource, ResourceView, ThreadId, ValidatedPayload};

use crate::app::dto::UpdateThreadRequest;
use crate::app::errors::ErrorTranslator;
use crate::chain::{Chain, Next, Step};
use crate::context::HandlerContext;
use crate::middleware::{RequireJson, ValidateBody};

pub fn router(store: Arc<dyn ForumStore>, translator: &ErrorTranslator) -> Router {
    let update = Chain::builder(translator.clone())
        .step(RequireJson)
        .step(ValidateBody::<UpdateThreadRequest>::new())
        .step(UpdateThread { store })
        .build();

    Router::new().route("/:id", patch(update))
}

/// `PATCH /threads/:id`
pub struct UpdateThread {
    pub store: Arc<dyn ForumStore>,
}

#[async_trait]
impl Step for UpdateThread {
    async fn handle(&self, ctx: &mut HandlerContext, _next: Next<'_>) -> anyhow::Result<()> {
        let id: ThreadId = ctx.param("id")?;
        let request = ctx
            .take::<ValidatedPayload<UpdateThreadRequest>>()
            .ok_or_else(|| anyhow::anyhow!("update thread payload missing"))?
            .into_inner();

        let mut thread = self
            .store
            .thread(id)
            .await?
            .ok_or_else(|| ApplicationFailure::not_found(ThreadRecord::NAME, id))?;

        if let Some(title) = request.title {
            thread.title = title;
        }
        if let Some(is_pinned) = request.is_pinned {
            thread.is_pinned = is_pinned;
        }
        if let Some(is_locked) = request.is_locked {
            thread.is_locked = is_locked;
        }
        thread.updated_at = Utc::now();

        self.store.save_thread(thread.clone()).await?;
        tracing::info!(thread_id = %id, "thread updated");

        ctx.response_mut()
            .commit(StatusCode::OK, ResourceView::of(&thread).into_value())?;
        Ok(())
    }
}
