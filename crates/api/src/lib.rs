//! HTTP API: handler chains, request validation and response shaping.

pub mod app;
pub mod chain;
pub mod config;
pub mod context;
pub mod middleware;
