use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, http::StatusCode, routing::patch};
use chrono::Utc;
use serde_json::json;

use forum_board::{ForumStore, PostRecord, PostUpdate};
use forum_core::{ApplicationFailure, Context, PostId, Resource, ResourceView, ValidatedPayload};

use crate::app::dto::{DeleteMode, DeletePostRequest, EditPostRequest};
use crate::app::errors::ErrorTranslator;
use crate::chain::{Chain, Next, Step};
use crate::context::HandlerContext;
use crate::middleware::{RequireJson, ValidateBody};

pub fn router(store: Arc<dyn ForumStore>, translator: &ErrorTranslator) -> Router {
    let edit = Chain::builder(translator.clone())
        .step(RequireJson)
        .step(ValidateBody::<EditPostRequest>::new())
        .step(EditPost {
            store: store.clone(),
        })
        .build();

    let delete = Chain::builder(translator.clone())
        .step(RequireJson)
        .step(ValidateBody::<DeletePostRequest>::new())
        .step(DeletePost { store })
        .build();

    Router::new().route("/:id", patch(edit).delete(delete))
}

fn post_not_found(id: PostId) -> ApplicationFailure {
    ApplicationFailure::not_found(PostRecord::NAME, id)
}

fn deleted_conflict(message: &str, id: PostId) -> ApplicationFailure {
    let mut context = Context::new();
    context.insert("postId".to_string(), json!(id));
    ApplicationFailure::conflict_with(message, context)
}

/// `PATCH /posts/:id`
pub struct EditPost {
    pub store: Arc<dyn ForumStore>,
}

#[async_trait]
impl Step for EditPost {
    async fn handle(&self, ctx: &mut HandlerContext, _next: Next<'_>) -> anyhow::Result<()> {
        let id: PostId = ctx.param("id")?;
        let request = ctx
            .take::<ValidatedPayload<EditPostRequest>>()
            .ok_or_else(|| anyhow::anyhow!("edit post payload missing"))?
            .into_inner();

        let change: PostUpdate = Box::new(move |post: &mut PostRecord| {
            if post.is_deleted() {
                return Err(deleted_conflict("Cannot edit a deleted post", post.id));
            }
            post.content = request.content;
            post.edit_reason = request.reason;
            post.updated_at = Utc::now();
            Ok(())
        });
        let post = self
            .store
            .update_post(id, change)
            .await?
            .ok_or_else(|| post_not_found(id))?;
        tracing::info!(post_id = %id, "post edited");

        ctx.response_mut()
            .commit(StatusCode::OK, ResourceView::of(&post).into_value())?;
        Ok(())
    }
}

/// `DELETE /posts/:id`
pub struct DeletePost {
    pub store: Arc<dyn ForumStore>,
}

impl DeletePost {
    /// Marks the post deleted unless it already is.
    async fn soft_delete(&self, id: PostId, reason: Option<String>) -> anyhow::Result<PostRecord> {
        let change: PostUpdate = Box::new(move |post: &mut PostRecord| {
            if post.is_deleted() {
                return Err(deleted_conflict("Post has already been deleted", post.id));
            }
            let now = Utc::now();
            post.deleted_at = Some(now);
            post.delete_reason = reason;
            post.updated_at = now;
            Ok(())
        });
        let post = self
            .store
            .update_post(id, change)
            .await?
            .ok_or_else(|| post_not_found(id))?;
        Ok(post)
    }

    /// Removes the post; the response shows it as it was, marked deleted.
    async fn hard_delete(&self, id: PostId, reason: Option<String>) -> anyhow::Result<PostRecord> {
        let mut post = self
            .store
            .remove_post(id)
            .await?
            .ok_or_else(|| post_not_found(id))?;
        let now = Utc::now();
        post.deleted_at = Some(now);
        post.delete_reason = reason;
        post.updated_at = now;
        Ok(post)
    }
}

#[async_trait]
impl Step for DeletePost {
    async fn handle(&self, ctx: &mut HandlerContext, _next: Next<'_>) -> anyhow::Result<()> {
        let id: PostId = ctx.param("id")?;
        let request = ctx
            .take::<ValidatedPayload<DeletePostRequest>>()
            .ok_or_else(|| anyhow::anyhow!("delete post payload missing"))?
            .into_inner();
        let mode = request.mode.unwrap_or_default();

        let post = match mode {
            DeleteMode::Soft => self.soft_delete(id, request.reason).await?,
            DeleteMode::Hard => self.hard_delete(id, request.reason).await?,
        };
        tracing::info!(post_id = %id, ?mode, "post deleted");

        ctx.response_mut()
            .commit(StatusCode::OK, ResourceView::of(&post).into_value())?;
        Ok(())
    }
}
