//! Request DTOs and the schemas that validate them.
//!
//! Each request type declares its constraints as a `Schema` constant; handlers
//! only ever see the typed value after `ValidateBody` accepted the input.

use serde::Deserialize;

use forum_core::{Check, FieldRule, Schema, Validate};

/// Upper bound on post content, in characters.
pub const MAX_POST_CONTENT: usize = 10_000;
/// Upper bound on edit and delete reasons.
pub const MAX_REASON: usize = 500;
pub const MIN_THREAD_TITLE: usize = 3;
pub const MAX_THREAD_TITLE: usize = 200;

// -------------------------
// Posts
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditPostRequest {
    pub content: String,
    pub reason: Option<String>,
}

impl Validate for EditPostRequest {
    const SCHEMA: Schema = Schema::new(
        "edit post",
        &[
            FieldRule::required("content", "Content", Check::text(1, MAX_POST_CONTENT)),
            FieldRule::optional("reason", "Reason", Check::text_max(MAX_REASON)),
        ],
    );
}

/// How a post is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Keep the record and mark it deleted.
    #[default]
    Soft,
    /// Remove the record from storage.
    Hard,
}

impl DeleteMode {
    pub const NAMES: &'static [&'static str] = &["soft", "hard"];
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeletePostRequest {
    pub reason: Option<String>,
    pub mode: Option<DeleteMode>,
}

impl Validate for DeletePostRequest {
    const SCHEMA: Schema = Schema::new(
        "delete post",
        &[
            FieldRule::optional("reason", "Reason", Check::text_max(MAX_REASON)),
            FieldRule::optional("mode", "Mode", Check::OneOf(DeleteMode::NAMES)),
        ],
    );
}

// -------------------------
// Threads
// -------------------------

/// Partial thread update; absent fields stay unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateThreadRequest {
    pub title: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_locked: Option<bool>,
}

impl Validate for UpdateThreadRequest {
    // Strict: unknown keys are errors.
    const SCHEMA: Schema = Schema::new(
        "update thread",
        &[
            FieldRule::optional(
                "title",
                "Title",
                Check::text(MIN_THREAD_TITLE, MAX_THREAD_TITLE),
            ),
            FieldRule::optional("isPinned", "isPinned", Check::Boolean),
            FieldRule::optional("isLocked", "isLocked", Check::Boolean),
        ],
    )
    .strict();
}
