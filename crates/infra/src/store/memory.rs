use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::anyhow;
use async_trait::async_trait;

use forum_board::{ForumStore, PostRecord, PostUpdate, ThreadRecord, UserRecord};
use forum_core::{DomainResult, Entity, PostId, ThreadId, UserId};

/// One keyed collection of records.
#[derive(Debug)]
struct Table<V: Entity> {
    inner: RwLock<HashMap<V::Id, V>>,
}

impl<V> Table<V>
where
    V: Entity + Clone,
{
    fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> anyhow::Result<RwLockReadGuard<'_, HashMap<V::Id, V>>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("record table lock poisoned"))
    }

    fn write(&self) -> anyhow::Result<RwLockWriteGuard<'_, HashMap<V::Id, V>>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("record table lock poisoned"))
    }

    fn get(&self, id: V::Id) -> anyhow::Result<Option<V>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn upsert(&self, value: V) -> anyhow::Result<()> {
        self.write()?.insert(value.id(), value);
        Ok(())
    }

    /// Runs `change` on a copy while holding the write lock; the stored value
    /// is replaced only when `change` succeeds.
    fn update(
        &self,
        id: V::Id,
        change: impl FnOnce(&mut V) -> DomainResult<()>,
    ) -> anyhow::Result<Option<V>> {
        let mut map = self.write()?;
        let Some(current) = map.get_mut(&id) else {
            return Ok(None);
        };
        let mut draft = current.clone();
        change(&mut draft)?;
        *current = draft.clone();
        Ok(Some(draft))
    }

    fn remove(&self, id: V::Id) -> anyhow::Result<Option<V>> {
        Ok(self.write()?.remove(&id))
    }
}

/// In-memory forum store for tests/dev.
#[derive(Debug)]
pub struct InMemoryForumStore {
    users: Table<UserRecord>,
    threads: Table<ThreadRecord>,
    posts: Table<PostRecord>,
}

impl InMemoryForumStore {
    pub fn new() -> Self {
        Self {
            users: Table::new(),
            threads: Table::new(),
            posts: Table::new(),
        }
    }
}

impl Default for InMemoryForumStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForumStore for InMemoryForumStore {
    async fn user(&self, id: UserId) -> anyhow::Result<Option<UserRecord>> {
        self.users.get(id)
    }

    async fn thread(&self, id: ThreadId) -> anyhow::Result<Option<ThreadRecord>> {
        self.threads.get(id)
    }

    async fn post(&self, id: PostId) -> anyhow::Result<Option<PostRecord>> {
        self.posts.get(id)
    }

    async fn save_user(&self, user: UserRecord) -> anyhow::Result<()> {
        self.users.upsert(user)
    }

    async fn save_thread(&self, thread: ThreadRecord) -> anyhow::Result<()> {
        self.threads.upsert(thread)
    }

    async fn save_post(&self, post: PostRecord) -> anyhow::Result<()> {
        self.posts.upsert(post)
    }

    async fn update_post(
        &self,
        id: PostId,
        change: PostUpdate,
    ) -> anyhow::Result<Option<PostRecord>> {
        self.posts.update(id, change)
    }

    async fn remove_post(&self, id: PostId) -> anyhow::Result<Option<PostRecord>> {
        self.posts.remove(id)
    }
}
