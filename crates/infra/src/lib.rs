//! Infrastructure layer: storage adapters behind the forum ports.

pub mod store;

pub use store::InMemoryForumStore;
