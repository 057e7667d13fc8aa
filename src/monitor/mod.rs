//! Monitor Module
//!
//! Host heap sampling and the prioritized cleanup passes it triggers.

mod gauge;
mod pressure;
mod probe;
mod task;

pub use gauge::{HeapGauge, SharedHeapGauge};
pub use pressure::{CleanupReport, MemoryMonitor};
pub use probe::{
    HeapProbe, HeapSample, ManualHeapProbe, MemoryStats, SharedHeapProbe, SystemHeapProbe,
    UnavailableHeapProbe, HEAP_HIGH_WATER_RATIO,
};
pub use task::{CleanupFuture, CleanupTask};
