//! Heap Probe Module
//!
//! Host-reported memory samples. Hosts without introspection return `None`.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use sysinfo::System;

/// Default used/limit ratio treated as memory pressure.
pub const HEAP_HIGH_WATER_RATIO: f64 = 0.8;

// == Heap Sample ==
/// One reading of host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapSample {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub limit_bytes: u64,
}

impl HeapSample {
    /// `used / limit`, `0.0` when the host reports no limit.
    pub fn usage_ratio(&self) -> f64 {
        if self.limit_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.limit_bytes as f64
        }
    }
}

// == Memory Stats ==
/// Read-only view of the latest sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub limit_bytes: u64,
    /// `used / limit` as a percentage
    pub usage_percentage: f64,
}

impl From<HeapSample> for MemoryStats {
    fn from(sample: HeapSample) -> Self {
        Self {
            used_bytes: sample.used_bytes,
            total_bytes: sample.total_bytes,
            limit_bytes: sample.limit_bytes,
            usage_percentage: sample.usage_ratio() * 100.0,
        }
    }
}

// == Heap Probe ==
pub trait HeapProbe: Send + Sync + fmt::Debug {
    fn sample(&self) -> Option<HeapSample>;
}

pub type SharedHeapProbe = Arc<dyn HeapProbe>;

// == System Probe ==
/// Samples system memory through `sysinfo`; the limit is total physical memory.
pub struct SystemHeapProbe {
    system: Mutex<System>,
}

impl SystemHeapProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemHeapProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapProbe for SystemHeapProbe {
    fn sample(&self) -> Option<HeapSample> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return None;
        }
        Some(HeapSample {
            used_bytes: system.used_memory(),
            total_bytes: total,
            limit_bytes: total,
        })
    }
}

impl fmt::Debug for SystemHeapProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemHeapProbe").finish_non_exhaustive()
    }
}

// == Manual Probe ==
/// Reports whatever sample the host last recorded.
#[derive(Debug, Default)]
pub struct ManualHeapProbe {
    sample: Mutex<Option<HeapSample>>,
}

impl ManualHeapProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, sample: Option<HeapSample>) {
        if let Ok(mut current) = self.sample.lock() {
            *current = sample;
        }
    }

    /// Records `used` out of `limit` bytes.
    pub fn record(&self, used_bytes: u64, limit_bytes: u64) {
        self.set(Some(HeapSample {
            used_bytes,
            total_bytes: limit_bytes,
            limit_bytes,
        }));
    }
}

impl HeapProbe for ManualHeapProbe {
    fn sample(&self) -> Option<HeapSample> {
        self.sample.lock().ok().and_then(|sample| *sample)
    }
}

// == Unavailable Probe ==
/// Host without heap introspection.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableHeapProbe;

impl HeapProbe for UnavailableHeapProbe {
    fn sample(&self) -> Option<HeapSample> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_ratio() {
        let sample = HeapSample {
            used_bytes: 80,
            total_bytes: 90,
            limit_bytes: 100,
        };
        assert!((sample.usage_ratio() - 0.8).abs() < f64::EPSILON);

        let no_limit = HeapSample {
            limit_bytes: 0,
            ..sample
        };
        assert_eq!(no_limit.usage_ratio(), 0.0);
    }

    #[test]
    fn test_memory_stats_percentage() {
        let stats = MemoryStats::from(HeapSample {
            used_bytes: 25,
            total_bytes: 50,
            limit_bytes: 100,
        });
        assert_eq!(stats.usage_percentage, 25.0);
        assert_eq!(stats.total_bytes, 50);
    }

    #[test]
    fn test_manual_probe() {
        let probe = ManualHeapProbe::new();
        assert_eq!(probe.sample(), None);

        probe.record(10, 100);
        assert_eq!(probe.sample().map(|s| s.used_bytes), Some(10));

        probe.set(None);
        assert_eq!(probe.sample(), None);
    }

    #[test]
    fn test_unavailable_probe() {
        assert_eq!(UnavailableHeapProbe.sample(), None);
    }

    #[test]
    fn test_system_probe_reports_consistent_sample() {
        if let Some(sample) = SystemHeapProbe::new().sample() {
            assert!(sample.total_bytes > 0);
            assert_eq!(sample.limit_bytes, sample.total_bytes);
        }
    }
}
