//! Configuration Module
//!
//! Handles loading cache, resource and monitor settings from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::{CacheError, Result};
use crate::monitor::HEAP_HIGH_WATER_RATIO;

const MIB: usize = 1024 * 1024;

// == Cache Config ==
/// Settings for one named cache instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Hard cap on entry count
    pub max_entries: usize,
    /// TTL in milliseconds used when `set` omits one
    pub default_ttl_ms: u64,
    /// Cadence of the expired-entry sweep
    pub sweep_interval_ms: u64,
    /// Cadence of the memory-pressure check
    pub pressure_interval_ms: u64,
    /// Byte budget; aggressive cleanup drains to 70% of it
    pub max_memory_bytes: usize,
    /// Store values through the JSON transform
    pub compress: bool,
}

impl CacheConfig {
    pub fn new(max_entries: usize, default_ttl_ms: u64) -> Self {
        Self {
            max_entries,
            default_ttl_ms,
            ..Self::default()
        }
    }

    pub fn with_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    pub fn with_sweep_interval_ms(mut self, ms: u64) -> Self {
        self.sweep_interval_ms = ms;
        self
    }

    pub fn with_pressure_interval_ms(mut self, ms: u64) -> Self {
        self.pressure_interval_ms = ms;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Reads `{prefix}_MAX_ENTRIES`, `{prefix}_DEFAULT_TTL_MS`, `{prefix}_SWEEP_INTERVAL_MS`,
    /// `{prefix}_PRESSURE_INTERVAL_MS`, `{prefix}_MAX_MEMORY_BYTES` and `{prefix}_COMPRESS`,
    /// falling back to `defaults` for anything missing or unparsable.
    pub fn from_env(prefix: &str, defaults: CacheConfig) -> Self {
        let var = |suffix: &str| format!("{}_{}", prefix, suffix);
        Self {
            max_entries: env_or(&var("MAX_ENTRIES"), defaults.max_entries),
            default_ttl_ms: env_or(&var("DEFAULT_TTL_MS"), defaults.default_ttl_ms),
            sweep_interval_ms: env_or(&var("SWEEP_INTERVAL_MS"), defaults.sweep_interval_ms),
            pressure_interval_ms: env_or(
                &var("PRESSURE_INTERVAL_MS"),
                defaults.pressure_interval_ms,
            ),
            max_memory_bytes: env_or(&var("MAX_MEMORY_BYTES"), defaults.max_memory_bytes),
            compress: env_or(&var("COMPRESS"), defaults.compress),
        }
    }

    /// Rejects settings the store cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.max_memory_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "max_memory_bytes must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 || self.pressure_interval_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "timer intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    // == Named Defaults ==
    pub fn general() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_ms: 5 * 60_000,
            sweep_interval_ms: 60_000,
            pressure_interval_ms: 30_000,
            max_memory_bytes: 50 * MIB,
            compress: false,
        }
    }

    pub fn api() -> Self {
        Self {
            max_entries: 500,
            default_ttl_ms: 2 * 60_000,
            sweep_interval_ms: 30_000,
            pressure_interval_ms: 30_000,
            max_memory_bytes: 20 * MIB,
            compress: true,
        }
    }

    pub fn images() -> Self {
        Self {
            max_entries: 200,
            default_ttl_ms: 30 * 60_000,
            sweep_interval_ms: 5 * 60_000,
            pressure_interval_ms: 30_000,
            max_memory_bytes: 100 * MIB,
            compress: false,
        }
    }

    pub fn user_data() -> Self {
        Self {
            max_entries: 100,
            default_ttl_ms: 10 * 60_000,
            sweep_interval_ms: 60_000,
            pressure_interval_ms: 30_000,
            max_memory_bytes: 10 * MIB,
            compress: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::general()
    }
}

// == Resource Config ==
/// Settings for the resource manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceConfig {
    /// Global byte budget across all resources
    pub max_memory_bytes: usize,
    /// Cadence of the age-based sweep
    pub sweep_interval_ms: u64,
}

impl ResourceConfig {
    pub fn new(max_memory_bytes: usize) -> Self {
        Self {
            max_memory_bytes,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_memory_bytes: env_or("RESOURCE_MAX_MEMORY_BYTES", defaults.max_memory_bytes),
            sweep_interval_ms: env_or("RESOURCE_SWEEP_INTERVAL_MS", defaults.sweep_interval_ms),
        }
    }

    /// Rejects settings the resource manager cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_memory_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "resource max_memory_bytes must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "resource sweep interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: 100 * MIB,
            sweep_interval_ms: 60_000,
        }
    }
}

// == Monitor Config ==
/// Settings for the memory pressure monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Heap sampling cadence
    pub sample_interval_ms: u64,
    /// Minimum gap between automatic cleanup passes
    pub cooldown_ms: u64,
    /// used/limit ratio above which a pass is triggered
    pub high_water_ratio: f64,
    /// Overrides the probe's reported limit (defaults to total system memory)
    pub heap_limit_bytes: Option<u64>,
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sample_interval_ms: env_or("MONITOR_SAMPLE_INTERVAL_MS", defaults.sample_interval_ms),
            cooldown_ms: env_or("MONITOR_COOLDOWN_MS", defaults.cooldown_ms),
            high_water_ratio: env_or("MONITOR_HIGH_WATER_RATIO", defaults.high_water_ratio),
            heap_limit_bytes: env::var("MONITOR_HEAP_LIMIT_BYTES")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "monitor sample interval must be non-zero".to_string(),
            ));
        }
        if !(self.high_water_ratio > 0.0 && self.high_water_ratio <= 1.0) {
            return Err(CacheError::InvalidConfig(format!(
                "high_water_ratio must be in (0, 1], got {}",
                self.high_water_ratio
            )));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 10_000,
            cooldown_ms: 30_000,
            high_water_ratio: HEAP_HIGH_WATER_RATIO,
            heap_limit_bytes: None,
        }
    }
}

// == Application Config ==
/// Everything the inspection binary needs at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub general: CacheConfig,
    pub api: CacheConfig,
    pub images: CacheConfig,
    pub user_data: CacheConfig,
    pub resources: ResourceConfig,
    pub monitor: MonitorConfig,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `GENERAL_CACHE_*`, `API_CACHE_*`, `IMAGE_CACHE_*`, `USER_DATA_CACHE_*` - see [`CacheConfig::from_env`]
    /// - `RESOURCE_MAX_MEMORY_BYTES`, `RESOURCE_SWEEP_INTERVAL_MS`
    /// - `MONITOR_SAMPLE_INTERVAL_MS`, `MONITOR_COOLDOWN_MS`, `MONITOR_HIGH_WATER_RATIO`,
    ///   `MONITOR_HEAP_LIMIT_BYTES`
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        Self {
            general: CacheConfig::from_env("GENERAL_CACHE", CacheConfig::general()),
            api: CacheConfig::from_env("API_CACHE", CacheConfig::api()),
            images: CacheConfig::from_env("IMAGE_CACHE", CacheConfig::images()),
            user_data: CacheConfig::from_env("USER_DATA_CACHE", CacheConfig::user_data()),
            resources: ResourceConfig::from_env(),
            monitor: MonitorConfig::from_env(),
            server_port: env_or("SERVER_PORT", 3000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: CacheConfig::general(),
            api: CacheConfig::api(),
            images: CacheConfig::images(),
            user_data: CacheConfig::user_data(),
            resources: ResourceConfig::default(),
            monitor: MonitorConfig::default(),
            server_port: 3000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
