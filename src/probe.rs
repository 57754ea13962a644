//! Guest readiness probe
//!
//! Polls the forwarded SSH port on loopback until the guest accepts a
//! TCP connection. The wait is bounded by a deadline with a fixed sleep
//! between attempts and can be cancelled through a watch channel, so a
//! caller or test harness can always abort deterministically.

use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::common::{Error, Result};

/// Host address the guest's forwarded port is reachable on
pub const PROBE_HOST: &str = "127.0.0.1";

/// Bounds for the readiness wait
#[derive(Debug, Clone, Copy)]
pub struct ProbePolicy {
    /// Total time allowed for the guest to become reachable
    pub deadline: Duration,
    /// Sleep between connection attempts
    pub interval: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(300),
            interval: Duration::from_millis(500),
        }
    }
}

/// Block until one TCP connection to the forwarded port succeeds.
///
/// Returns the number of attempts made, so callers can observe that a
/// late-starting guest required retries. Fails with `BootTimeout` once
/// the deadline passes and with `Cancelled` when the watch channel
/// flips to true.
pub async fn wait_ready(
    port: u16,
    policy: &ProbePolicy,
    cancel: &mut watch::Receiver<bool>,
) -> Result<u32> {
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if *cancel.borrow() {
            return Err(Error::Cancelled);
        }

        attempts += 1;
        match TcpStream::connect((PROBE_HOST, port)).await {
            Ok(_) => {
                tracing::info!(port, attempts, "guest is reachable");
                return Ok(attempts);
            }
            Err(e) => {
                tracing::trace!(port, attempt = attempts, error = %e, "guest not reachable yet");
            }
        }

        if start.elapsed() >= policy.deadline {
            return Err(Error::BootTimeout {
                port,
                secs: policy.deadline.as_secs(),
                attempts,
            });
        }

        tokio::select! {
            _ = tokio::time::sleep(policy.interval) => {}
            changed = cancel.changed() => {
                match changed {
                    Ok(()) if *cancel.borrow() => return Err(Error::Cancelled),
                    Ok(()) => {}
                    // Sender gone, cancellation can no longer happen
                    Err(_) => tokio::time::sleep(policy.interval).await,
                }
            }
        }
    }
}
