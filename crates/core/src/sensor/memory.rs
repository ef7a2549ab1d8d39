use super::{SampleContext, Sensor};
use crate::{
    error::SensorError,
    model::{MetricKind, Reading},
};
use sysinfo::System;

pub struct MemorySensor {
    sys: System,
}

impl MemorySensor {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl Default for MemorySensor {
    fn default() -> Self {
        Self::new()
    }
}

/// Share of memory that is not available to new allocations
pub(crate) fn used_percent(total: u64, available: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(available);
    Some(used as f64 / total as f64 * 100.0)
}

impl Sensor for MemorySensor {
    fn kind(&self) -> MetricKind {
        MetricKind::Memory
    }

    fn sample(&mut self, _ctx: &SampleContext) -> Reading {
        self.sys.refresh_memory();

        let percent = used_percent(self.sys.total_memory(), self.sys.available_memory())
            .ok_or(SensorError::NotInstalled);
        Reading::from_result(MetricKind::Memory, percent)
    }
}
