//! Periodic check loop — background task that runs check-all on an interval.
//!
//! Started by the daemon when a check interval is configured. Individual
//! run failures are logged and never stop the loop; shutdown is signaled
//! through a `watch` channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use upwatch_state::ServiceStatus;

use crate::runner::{CheckError, CheckRunner};

/// Run check-all every `interval` until `shutdown` flips to true.
///
/// The first run fires immediately. Timeout remains per-probe inside the
/// runner; a slow batch delays the next tick rather than overlapping it.
pub async fn run_check_loop(
    runner: Arc<CheckRunner>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    info!(?interval, "periodic check loop starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match runner.check_all().await {
                    Ok(report) => {
                        let up = report
                            .results
                            .iter()
                            .filter(|r| r.status == ServiceStatus::Up)
                            .count();
                        info!(
                            checked = report.checked_count,
                            up,
                            down = report.checked_count - up,
                            "periodic check finished"
                        );
                    }
                    Err(CheckError::NoServices) => {
                        debug!("no services registered, skipping periodic check");
                    }
                    Err(e) => {
                        error!(error = %e, "periodic check failed");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("periodic check loop shutting down");
                    break;
                }
            }
        }
    }
}
