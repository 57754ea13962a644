//! Detached emulator launch
//!
//! The emulator runs as an independent background process. We keep no
//! handle to it after a successful spawn: the orchestrator never learns
//! about an emulator crash directly, only through the readiness probe
//! timing out. That decoupling is part of the design, not an oversight.

use std::process::Stdio;

use tokio::process::Command;

use crate::command::EmulatorCommand;
use crate::common::{Error, Result};

/// Spawn the emulator and immediately drop the child handle
pub fn spawn_detached(cmd: &EmulatorCommand) -> Result<()> {
    tracing::info!(command = %cmd.to_command_line(), "launching emulator");

    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    // New process group so the emulator survives our exit and ignores
    // our terminal signals
    #[cfg(unix)]
    command.process_group(0);

    command.spawn().map_err(|e| Error::LaunchFailed {
        program: cmd.program.clone(),
        error: e.to_string(),
    })?;

    Ok(())
}
