//! vmbench CLI - run a benchmark inside a QEMU guest
//!
//! Launches QEMU with an instrumentation plugin, waits for the guest's
//! forwarded SSH port, copies the benchmark in and runs its script.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;

use vmbench::common::logging;
use vmbench::orchestrator::{Orchestrator, RunRequest};
use vmbench::probe::ProbePolicy;

#[derive(Parser)]
#[command(name = "vmbench", about = "Run a benchmark inside an instrumented QEMU guest")]
#[command(version, long_about = None)]
struct Cli {
    /// Guest architecture
    #[arg(long, default_value = "arm64")]
    arch: String,

    /// Run config JSON (machine flags, forwarded port, remote paths)
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Image config JSON (kernel/initrd/drive paths and guest credentials)
    #[arg(long)]
    imgconfig: Option<PathBuf>,

    /// Directory containing the benchmark payload
    #[arg(long)]
    benchmark: Option<PathBuf>,

    /// Instrumentation plugin shared object passed to the emulator
    #[arg(long)]
    plugin: Option<PathBuf>,

    /// Seconds to wait for the guest to become reachable
    #[arg(long, default_value = "300")]
    boot_timeout: u64,

    /// Milliseconds between readiness probe attempts
    #[arg(long, default_value = "500")]
    probe_interval: u64,
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    // Ctrl-C aborts the readiness wait; the emulator itself is detached
    // and keeps running
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let request = RunRequest {
        arch: cli.arch,
        run_config: Some(cli.config),
        image_config: cli.imgconfig,
        benchmark: cli.benchmark,
        plugin: cli.plugin,
    };
    let policy = ProbePolicy {
        deadline: Duration::from_secs(cli.boot_timeout),
        interval: Duration::from_millis(cli.probe_interval),
    };

    let mut orchestrator = Orchestrator::new(policy);
    if let Err(e) = orchestrator.run(&request, &mut cancel_rx).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
