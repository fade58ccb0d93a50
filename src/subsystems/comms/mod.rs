//! Comms subsystem: the interactive console.
//!
//! [`command`] holds the command grammar and output rendering; [`pty`] is the
//! read-eval-print loop that drives an [`Agent`](crate::subsystems::agents::Agent).

pub mod command;
pub mod pty;

pub use command::Command;
