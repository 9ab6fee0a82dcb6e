//! Engine-agnostic metrics for the sector cache.
//!
//! Feature-gated and runtime-toggled, so a build without `metrics` pays
//! nothing.
//!
//! # Usage
//!
//! ```ignore
//! use galaxy_plugin::metrics::{GalaxyMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let metrics = manager.metrics();
//! println!("{:.1} us / sector", metrics.avg_sector_timing_us());
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::sector_pos::LEVEL_COUNT;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Fixed-capacity window of the most recent samples.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, evicting the oldest when full.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl RollingWindow<u64> {
    pub fn sum(&self) -> u64 {
        self.buffer.iter().sum()
    }

    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = self.buffer.iter().min()?;
        let max = self.buffer.iter().max()?;
        Some((*min, *max))
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(128)
    }
}

/// Cache statistics, updated by the manager as tasks finish.
#[derive(Debug, Clone)]
pub struct GalaxyMetrics {
    // Residency
    /// Completed sectors currently held, per level.
    pub sectors_per_level: [u32; LEVEL_COUNT],
    /// Summaries held across all completed sectors.
    pub resident_elements: u64,
    /// Expanded systems currently held.
    pub resident_systems: u32,

    // Timing
    /// Sector generation times in microseconds.
    pub sector_timings: RollingWindow<u64>,
    /// System expansion times in microseconds.
    pub system_timings: RollingWindow<u64>,
    /// Manager tick times in microseconds.
    pub tick_timings: RollingWindow<u64>,

    // Totals (cumulative)
    pub total_sectors_generated: u64,
    pub total_systems_generated: u64,
    pub total_sector_failures: u64,
    pub total_system_failures: u64,
}

impl Default for GalaxyMetrics {
    fn default() -> Self {
        Self {
            sectors_per_level: [0; LEVEL_COUNT],
            resident_elements: 0,
            resident_systems: 0,
            sector_timings: RollingWindow::default(),
            system_timings: RollingWindow::default(),
            tick_timings: RollingWindow::default(),
            total_sectors_generated: 0,
            total_systems_generated: 0,
            total_sector_failures: 0,
            total_system_failures: 0,
        }
    }
}

impl GalaxyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset residency and timings. Totals are cumulative and kept.
    pub fn reset(&mut self) {
        self.sectors_per_level.fill(0);
        self.resident_elements = 0;
        self.resident_systems = 0;
        self.sector_timings.clear();
        self.system_timings.clear();
        self.tick_timings.clear();
    }

    pub fn record_sector(&mut self, level: u8, element_count: usize, timing_us: u64) {
        if !is_enabled() {
            return;
        }
        let idx = (level as usize).min(LEVEL_COUNT - 1);
        self.sectors_per_level[idx] += 1;
        self.resident_elements += element_count as u64;
        self.sector_timings.push(timing_us);
        self.total_sectors_generated += 1;
    }

    /// A completed sector was unloaded.
    pub fn remove_sector(&mut self, level: u8, element_count: usize) {
        if !is_enabled() {
            return;
        }
        let idx = (level as usize).min(LEVEL_COUNT - 1);
        self.sectors_per_level[idx] = self.sectors_per_level[idx].saturating_sub(1);
        self.resident_elements = self.resident_elements.saturating_sub(element_count as u64);
    }

    pub fn record_sector_failure(&mut self) {
        if is_enabled() {
            self.total_sector_failures += 1;
        }
    }

    pub fn record_system(&mut self, timing_us: u64) {
        if !is_enabled() {
            return;
        }
        self.resident_systems += 1;
        self.system_timings.push(timing_us);
        self.total_systems_generated += 1;
    }

    pub fn remove_system(&mut self) {
        if is_enabled() {
            self.resident_systems = self.resident_systems.saturating_sub(1);
        }
    }

    pub fn record_system_failure(&mut self) {
        if is_enabled() {
            self.total_system_failures += 1;
        }
    }

    pub fn record_tick_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.tick_timings.push(timing_us);
        }
    }

    pub fn total_sectors(&self) -> u32 {
        self.sectors_per_level.iter().sum()
    }

    pub fn avg_sector_timing_us(&self) -> f64 {
        self.sector_timings.average()
    }

    pub fn avg_system_timing_us(&self) -> f64 {
        self.system_timings.average()
    }
}
