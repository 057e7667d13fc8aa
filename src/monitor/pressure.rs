//! Memory Pressure Monitor Module
//!
//! Samples host heap usage and, above the high-water mark, runs every
//! registered cleanup task in priority order. A cooldown keeps sustained
//! pressure from triggering back-to-back passes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::SharedClock;
use crate::config::MonitorConfig;
use crate::error::{CacheError, Result};
use crate::monitor::{CleanupTask, HeapGauge, MemoryStats, SharedHeapGauge, SharedHeapProbe};
use crate::tasks::spawn_sampler_task;

// == Cleanup Report ==
/// Outcome of one cleanup pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupReport {
    /// `true` when started by [`MemoryMonitor::force_cleanup`]
    pub forced: bool,
    pub tasks_run: usize,
    /// Names of tasks that returned an error or panicked
    pub failed: Vec<String>,
    /// One message per failed task, in run order
    pub errors: Vec<String>,
    /// Advisory sum over every task that ran
    pub estimated_bytes_saved: usize,
    pub finished_at: u64,
}

// == Memory Monitor ==
#[derive(Debug)]
pub struct MemoryMonitor {
    config: MonitorConfig,
    gauge: SharedHeapGauge,
    clock: SharedClock,
    tasks: RwLock<Vec<Arc<CleanupTask>>>,
    /// Held for the whole pass so passes never overlap
    last_cleanup: Mutex<Option<u64>>,
    passes: AtomicU64,
    timer: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl MemoryMonitor {
    pub fn new(
        config: MonitorConfig,
        probe: SharedHeapProbe,
        clock: SharedClock,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gauge: Arc::new(HeapGauge::new(probe, &config)),
            config,
            clock,
            tasks: RwLock::new(Vec::new()),
            last_cleanup: Mutex::new(None),
            passes: AtomicU64::new(0),
            timer: std::sync::Mutex::new(None),
        })
    }

    /// The pressure policy this monitor samples with, for cache timers to share.
    pub fn gauge(&self) -> SharedHeapGauge {
        self.gauge.clone()
    }

    // == Registration ==
    /// Registers a task, replacing any task with the same name. Tasks with
    /// equal priority keep registration order.
    pub async fn register_cleanup_task(&self, task: CleanupTask) {
        let mut tasks = self.tasks.write().await;
        tasks.retain(|existing| existing.name != task.name);
        debug!(task = %task.name, priority = task.priority, "cleanup task registered");
        tasks.push(Arc::new(task));
        tasks.sort_by_key(|task| task.priority);
    }

    pub async fn unregister_cleanup_task(&self, name: &str) -> bool {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| task.name != name);
        tasks.len() != before
    }

    /// Registered task names in run order.
    pub async fn task_names(&self) -> Vec<String> {
        self.tasks
            .read()
            .await
            .iter()
            .map(|task| task.name.clone())
            .collect()
    }

    // == Sampling ==
    /// Latest heap reading, `None` when the host exposes no introspection.
    pub fn memory_stats(&self) -> Option<MemoryStats> {
        self.gauge.memory_stats()
    }

    /// One sampling step: runs a pass when usage is above the high-water mark
    /// and the cooldown has elapsed.
    pub async fn check_pressure(&self) -> Option<CleanupReport> {
        let sample = self.gauge.sample()?;
        let ratio = sample.usage_ratio();
        if ratio <= self.gauge.high_water_ratio() {
            debug!(ratio, "heap usage below high-water mark");
            return None;
        }

        let mut last_cleanup = self.last_cleanup.lock().await;
        let now = self.clock.now_ms();
        if let Some(last) = *last_cleanup {
            if now.saturating_sub(last) < self.config.cooldown_ms {
                debug!(ratio, since_last_ms = now.saturating_sub(last), "cleanup cooling down");
                return None;
            }
        }

        warn!(ratio, used_bytes = sample.used_bytes, "memory pressure detected");
        let report = self.run_pass(false).await;
        *last_cleanup = Some(report.finished_at);
        Some(report)
    }

    /// Runs a pass immediately, ignoring and then restarting the cooldown.
    pub async fn force_cleanup(&self) -> CleanupReport {
        let mut last_cleanup = self.last_cleanup.lock().await;
        let report = self.run_pass(true).await;
        *last_cleanup = Some(report.finished_at);
        report
    }

    /// Number of passes run so far.
    pub fn cleanup_passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    // == Timer ==
    /// Starts the periodic sampler. The sampler holds only a weak reference and
    /// exits once the monitor is dropped.
    pub fn start(self: &Arc<Self>) {
        let handle = spawn_sampler_task(Arc::downgrade(self), self.config.sample_interval_ms);
        if let Some(old) = self.lock_timer().replace(handle) {
            old.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn destroy(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
        info!("memory monitor destroyed");
    }

    // == Internals ==
    async fn run_pass(&self, forced: bool) -> CleanupReport {
        let tasks: Vec<Arc<CleanupTask>> = self.tasks.read().await.clone();
        let mut failed = Vec::new();
        let mut errors = Vec::new();
        let mut estimated_bytes_saved = 0;

        for task in &tasks {
            estimated_bytes_saved += task.estimated_bytes_saved;

            match run_task(task.clone()).await {
                Ok(()) => debug!(task = %task.name, "cleanup task finished"),
                Err(err) => {
                    warn!(error = %err, "cleanup task failed");
                    failed.push(task.name.clone());
                    errors.push(err.to_string());
                }
            }
        }

        self.passes.fetch_add(1, Ordering::Relaxed);
        let report = CleanupReport {
            forced,
            tasks_run: tasks.len(),
            failed,
            errors,
            estimated_bytes_saved,
            finished_at: self.clock.now_ms(),
        };
        info!(
            forced,
            tasks_run = report.tasks_run,
            failed = report.failed.len(),
            estimated_bytes_saved,
            "cleanup pass complete"
        );
        report
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Runs one task on its own tokio task. Both building the future and polling it
/// happen there, so a panic at either point comes back as a `JoinError`.
async fn run_task(task: Arc<CleanupTask>) -> Result<()> {
    let name = task.name.clone();
    let reason = match tokio::spawn(async move { task.run().await }).await {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(err)) => err.to_string(),
        Err(join_err) if join_err.is_panic() => format!("panicked: {}", join_err),
        Err(join_err) => join_err.to_string(),
    };
    Err(CacheError::CleanupFailed { task: name, reason })
}

impl Drop for MemoryMonitor {
    fn drop(&mut self) {
        let timer = self
            .timer
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }
}
