//! vmbench - benchmark orchestration inside an emulated guest
//!
//! Resolves layered configuration into an immutable launch spec,
//! synthesizes the QEMU invocation with an instrumentation plugin
//! attached, launches the emulator detached, waits for the guest's
//! forwarded SSH port, then deploys and runs the benchmark over
//! scp/ssh.

pub mod command;
pub mod common;
pub mod config;
pub mod launch;
pub mod orchestrator;
pub mod probe;
pub mod remote;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use config::LaunchSpec;
pub use orchestrator::{Orchestrator, Phase, RunRequest};
