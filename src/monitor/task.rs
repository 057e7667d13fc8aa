//! Cleanup Task Module
//!
//! A named, prioritized reclaim routine registered with the memory monitor.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Future returned by a cleanup routine.
pub type CleanupFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

type CleanupFn = dyn Fn() -> CleanupFuture + Send + Sync;

// == Cleanup Task ==
/// Lower `priority` numbers run first. `estimated_bytes_saved` is only reported,
/// never used to stop a pass early.
pub struct CleanupTask {
    pub name: String,
    pub priority: u32,
    pub estimated_bytes_saved: usize,
    cleanup: Box<CleanupFn>,
}

impl CleanupTask {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        priority: u32,
        estimated_bytes_saved: usize,
        cleanup: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            priority,
            estimated_bytes_saved,
            cleanup: Box::new(move || Box::pin(cleanup())),
        }
    }

    /// Starts one run of the routine.
    pub fn run(&self) -> CleanupFuture {
        (self.cleanup)()
    }
}

impl fmt::Debug for CleanupTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupTask")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("estimated_bytes_saved", &self.estimated_bytes_saved)
            .finish_non_exhaustive()
    }
}
