//! Heap Gauge Module
//!
//! The single "is the heap under pressure" policy shared by the monitor and
//! every cache pressure timer.

use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::monitor::{HeapSample, MemoryStats, SharedHeapProbe};

pub type SharedHeapGauge = Arc<HeapGauge>;

// == Heap Gauge ==
/// A heap probe read through the configured limit override and high-water mark.
#[derive(Debug)]
pub struct HeapGauge {
    probe: SharedHeapProbe,
    limit_override: Option<u64>,
    high_water_ratio: f64,
}

impl HeapGauge {
    pub fn new(probe: SharedHeapProbe, config: &MonitorConfig) -> Self {
        Self {
            probe,
            limit_override: config.heap_limit_bytes,
            high_water_ratio: config.high_water_ratio,
        }
    }

    /// Latest sample with the limit override applied.
    pub fn sample(&self) -> Option<HeapSample> {
        let mut sample = self.probe.sample()?;
        if let Some(limit) = self.limit_override {
            sample.limit_bytes = limit;
        }
        Some(sample)
    }

    pub fn memory_stats(&self) -> Option<MemoryStats> {
        self.sample().map(MemoryStats::from)
    }

    pub fn high_water_ratio(&self) -> f64 {
        self.high_water_ratio
    }

    /// `true` when usage is above the high-water mark. Hosts without a sample
    /// are never under pressure.
    pub fn is_under_pressure(&self) -> bool {
        self.sample()
            .is_some_and(|sample| sample.usage_ratio() > self.high_water_ratio)
    }
}
