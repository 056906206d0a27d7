//! Phase workflow tracking with a sequenced audit log.
//!
//! One workflow at a time moves through six phases
//! (`issue_start` to `completion`, with a `fix` loop back into
//! `quality_check`). Every mutation and protocol exchange is recorded by the
//! [`logging::AuditLogger`].

pub mod config;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod orchestration;
pub mod paths;
pub mod phases;
pub mod state;
pub mod state_machine;
