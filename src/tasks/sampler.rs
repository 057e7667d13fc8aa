//! Heap Sampler Task

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::monitor::MemoryMonitor;

/// Spawns a background task that drives [`MemoryMonitor::check_pressure`].
///
/// Holds only a weak reference; the task ends once the monitor is dropped.
pub fn spawn_sampler_task(monitor: Weak<MemoryMonitor>, interval_ms: u64) -> JoinHandle<()> {
    let interval = Duration::from_millis(interval_ms);

    tokio::spawn(async move {
        info!(interval_ms, "starting heap sampler task");

        loop {
            tokio::time::sleep(interval).await;

            let Some(monitor) = monitor.upgrade() else {
                debug!("memory monitor dropped, sampler exiting");
                break;
            };

            if let Some(report) = monitor.check_pressure().await {
                info!(
                    tasks_run = report.tasks_run,
                    failed = report.failed.len(),
                    "pressure-triggered cleanup finished"
                );
            }
        }
    })
}
