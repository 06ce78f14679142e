use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forum_core::{Entity, Resource, ThreadId, UserId};

/// Discussion thread as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRecord {
    pub id: ThreadId,
    pub author_id: UserId,
    pub title: String,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ThreadRecord {
    type Id = ThreadId;

    fn id(&self) -> ThreadId {
        self.id
    }
}

impl Resource for ThreadRecord {
    const NAME: &'static str = "Thread";
    const OMITTED: &'static [&'static str] = &[];
}
