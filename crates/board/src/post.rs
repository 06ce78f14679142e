use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forum_core::{Entity, PostId, Resource, ThreadId, UserId};

/// A post inside a thread, as stored.
///
/// Deletion is soft unless requested otherwise: `deleted_at` is set and the
/// record stays addressable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: PostId,
    pub thread_id: ThreadId,
    pub author_id: UserId,
    pub content: String,
    pub edit_reason: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub delete_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Entity for PostRecord {
    type Id = PostId;

    fn id(&self) -> PostId {
        self.id
    }
}

impl Resource for PostRecord {
    const NAME: &'static str = "Post";
    const OMITTED: &'static [&'static str] = &[];
}
