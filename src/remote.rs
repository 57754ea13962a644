//! Deployment and remote execution over the guest's forwarded SSH port
//!
//! Both operations shell out to sshpass-wrapped scp/ssh with structured
//! argument vectors and check the exit status, so a failed transfer or
//! a failing runner script surfaces as a typed error instead of being
//! mistaken for success.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::common::{Error, Result};
use crate::config::LaunchSpec;

/// Host address the guest's forwarded port is reachable on
const GUEST_HOST: &str = "127.0.0.1";

fn sshpass() -> Result<PathBuf> {
    which::which("sshpass").map_err(|_| Error::ToolNotFound("sshpass".to_string()))
}

/// Copy the benchmark directory into the guest, recursively
pub async fn deploy(spec: &LaunchSpec) -> Result<()> {
    let sshpass = sshpass()?;
    let target = format!(
        "{}@{}:{}",
        spec.image.username, GUEST_HOST, spec.run.remote_benchmark_dir
    );
    tracing::info!(
        benchmark = %spec.benchmark_path.display(),
        %target,
        port = spec.run.port,
        "deploying benchmark into guest"
    );

    let status = Command::new(sshpass)
        .arg("-p")
        .arg(&spec.image.password)
        .arg("scp")
        .arg("-P")
        .arg(spec.run.port.to_string())
        .arg("-r")
        .arg(&spec.benchmark_path)
        .arg(&target)
        .status()
        .await
        .map_err(|e| Error::Transfer(format!("failed to run scp: {e}")))?;

    if !status.success() {
        return Err(Error::Transfer(format!("scp exited with {status}")));
    }
    Ok(())
}

/// Run the configured script inside the deployed directory, blocking
/// until the remote session ends
pub async fn execute(spec: &LaunchSpec) -> Result<()> {
    let sshpass = sshpass()?;
    let base = deployed_base_name(&spec.benchmark_path);
    // The remote side gets a single command string; everything outward
    // of ssh stays a structured argv
    let remote_command = format!(
        "cd {}/{} ; ./{}",
        spec.run.remote_benchmark_dir, base, spec.run.remote_script
    );
    tracing::info!(command = %remote_command, port = spec.run.port, "running benchmark in guest");

    let status = Command::new(sshpass)
        .arg("-p")
        .arg(&spec.image.password)
        .arg("ssh")
        .arg(format!("{}@{}", spec.image.username, GUEST_HOST))
        .arg("-p")
        .arg(spec.run.port.to_string())
        .arg(&remote_command)
        .status()
        .await
        .map_err(|e| Error::RemoteExec(format!("failed to run ssh: {e}")))?;

    if !status.success() {
        return Err(Error::RemoteExec(format!("ssh exited with {status}")));
    }
    Ok(())
}

/// Directory name the payload lands under in the guest: the benchmark
/// path's base name, with one trailing separator stripped first
pub fn deployed_base_name(benchmark: &Path) -> String {
    let raw = benchmark.to_string_lossy();
    let trimmed = raw.strip_suffix('/').unwrap_or(&raw);
    Path::new(trimmed)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
