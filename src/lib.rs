//! ollama-cli-agent library crate.
//!
//! Exposes the modules used by the binary so integration tests can build an
//! [`Agent`](subsystems::agents::Agent) from a [`Config`](config::Config)
//! and drive it directly.

pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod subsystems;
