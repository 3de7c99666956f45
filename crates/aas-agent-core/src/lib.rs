//! aas-agent-core — Asset Administration Shell document model, no UI.
//!
//! This crate holds the in-memory AAS document, its edit and query
//! operations, the JSON codec, and the chat session that lets a language
//! model drive those operations. Frontends (the web server) own sessions
//! and call into them.

pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod model;
pub mod operations;
pub mod prompts;
pub mod providers;
pub mod render;
pub mod session;
pub mod storage;
pub mod types;
pub mod value;
