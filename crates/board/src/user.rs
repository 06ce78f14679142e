use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forum_core::{Entity, Resource, UserId};

/// Registered account as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for UserRecord {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

impl Resource for UserRecord {
    const NAME: &'static str = "User";
    /// Credential material stays inside the service.
    const OMITTED: &'static [&'static str] = &["passwordHash"];
}
