//! Resource Sweep Task

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::resources::ResourceStore;

/// Spawns a background task that removes resources idle past their
/// priority's max age. Runs until its handle is aborted.
pub fn spawn_resource_sweep_task(
    store: Arc<RwLock<ResourceStore>>,
    interval_ms: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_millis(interval_ms);

    tokio::spawn(async move {
        info!(interval_ms, "starting resource age sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.write().await.sweep_aged();
            if removed > 0 {
                info!(removed, "resource sweep removed aged resources");
            } else {
                debug!("resource sweep found nothing to remove");
            }
        }
    })
}
