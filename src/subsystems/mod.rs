//! Subsystem modules for the terminal assistant.

pub mod agents;
pub mod comms;
pub mod memory;
pub mod tools;
