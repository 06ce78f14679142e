//! Forum records and the persistence port.
//!
//! Records are plain data handed out by storage. They carry no business rules;
//! their only contract here is which attributes may leave the service (see
//! `forum_core::Resource`).

pub mod post;
pub mod store;
pub mod thread;
pub mod user;

pub use post::PostRecord;
pub use store::{ForumStore, PostUpdate};
pub use thread::ThreadRecord;
pub use user::UserRecord;
