//! Persistence port.
//!
//! The HTTP layer only sees this trait; storage failures are opaque
//! (`anyhow::Error`) and end up as generic 500 responses.

use async_trait::async_trait;

use forum_core::{DomainResult, PostId, ThreadId, UserId};

use crate::{PostRecord, ThreadRecord, UserRecord};

/// Change applied to a stored post by [`ForumStore::update_post`].
///
/// Returning a failure leaves the stored post untouched.
pub type PostUpdate = Box<dyn FnOnce(&mut PostRecord) -> DomainResult<()> + Send>;

/// Record lookup and persistence.
#[async_trait]
pub trait ForumStore: Send + Sync {
    async fn user(&self, id: UserId) -> anyhow::Result<Option<UserRecord>>;
    async fn thread(&self, id: ThreadId) -> anyhow::Result<Option<ThreadRecord>>;
    async fn post(&self, id: PostId) -> anyhow::Result<Option<PostRecord>>;

    /// Insert or replace by id.
    async fn save_user(&self, user: UserRecord) -> anyhow::Result<()>;
    async fn save_thread(&self, thread: ThreadRecord) -> anyhow::Result<()>;
    async fn save_post(&self, post: PostRecord) -> anyhow::Result<()>;

    /// Check and change a post as one atomic step.
    ///
    /// `None` when the post does not exist. A failure raised by `change` is
    /// returned as the error (still downcastable to `ApplicationFailure`).
    async fn update_post(
        &self,
        id: PostId,
        change: PostUpdate,
    ) -> anyhow::Result<Option<PostRecord>>;

    /// Remove a post permanently, handing back what was stored.
    async fn remove_post(&self, id: PostId) -> anyhow::Result<Option<PostRecord>>;
}
