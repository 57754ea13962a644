//! Run sequencing
//!
//! One benchmark run walks a fixed phase sequence with no branching
//! back: resolve, launch, await readiness, deploy, execute. Validation
//! failures abort before anything external starts; once the emulator is
//! launched there is no rollback, a later failure leaves the emulator
//! and any partial deployment in place.

use std::fmt;
use std::path::PathBuf;

use tokio::sync::watch;

use crate::common::Result;
use crate::probe::ProbePolicy;
use crate::{command, config, launch, probe, remote};

/// Phase of a benchmark run. `Aborted` is absorbing and reachable only
/// from `Resolving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Resolving,
    Launching,
    AwaitingReady,
    Deploying,
    Executing,
    Completed,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Resolving => "resolving",
            Phase::Launching => "launching",
            Phase::AwaitingReady => "awaiting-ready",
            Phase::Deploying => "deploying",
            Phase::Executing => "executing",
            Phase::Completed => "completed",
            Phase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Raw inputs for one run, as they arrive from the CLI
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub arch: String,
    pub run_config: Option<PathBuf>,
    pub image_config: Option<PathBuf>,
    pub benchmark: Option<PathBuf>,
    pub plugin: Option<PathBuf>,
}

/// Drives a single benchmark run through its phases
pub struct Orchestrator {
    phase: Phase,
    probe_policy: ProbePolicy,
}

impl Orchestrator {
    pub fn new(probe_policy: ProbePolicy) -> Self {
        Self {
            phase: Phase::Idle,
            probe_policy,
        }
    }

    /// Current phase, observable after `run` returns
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn transition(&mut self, next: Phase) {
        tracing::debug!(from = %self.phase, to = %next, "phase transition");
        self.phase = next;
    }

    /// Execute one run to completion.
    ///
    /// Strictly sequential, fail-fast; the readiness probe's internal
    /// loop is the only repetition anywhere. The cancel channel aborts
    /// the readiness wait; it cannot interrupt an in-flight transfer or
    /// remote execution.
    pub async fn run(
        &mut self,
        request: &RunRequest,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        self.transition(Phase::Resolving);
        let spec = match config::resolve(
            &request.arch,
            request.run_config.as_deref(),
            request.image_config.as_deref(),
            request.benchmark.as_deref(),
            request.plugin.as_deref(),
        ) {
            Ok(spec) => spec,
            Err(e) => {
                self.transition(Phase::Aborted);
                return Err(e);
            }
        };

        self.transition(Phase::Launching);
        let emulator = command::synthesize(&spec);
        launch::spawn_detached(&emulator)?;

        self.transition(Phase::AwaitingReady);
        probe::wait_ready(spec.run.port, &self.probe_policy, cancel).await?;

        self.transition(Phase::Deploying);
        remote::deploy(&spec).await?;

        self.transition(Phase::Executing);
        remote::execute(&spec).await?;

        self.transition(Phase::Completed);
        tracing::info!("benchmark run completed");
        Ok(())
    }
}
