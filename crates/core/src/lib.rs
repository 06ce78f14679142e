//! `forum-core`: building blocks shared by every forum crate.
//!
//! This crate contains **pure** primitives (no I/O, no async):
//! - `error`: the failure taxonomy translated into HTTP responses at the edge
//! - `validation`: schema-driven request validation
//! - `resource`: projection of internal records into externally safe views

pub mod entity;
pub mod error;
pub mod id;
pub mod resource;
pub mod validation;

pub use entity::Entity;
pub use error::{
    ApplicationFailure, Context, DomainResult, FailureKind, FieldError, ValidationFailure,
};
pub use id::{PostId, ThreadId, UserId};
pub use resource::{Resource, ResourceView};
pub use validation::{
    Check, FieldRule, Presence, Schema, UnknownFields, Validate, ValidatedPayload,
};
