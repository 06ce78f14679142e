//! Storage adapters for the forum persistence port.

pub mod memory;

pub use memory::InMemoryForumStore;
