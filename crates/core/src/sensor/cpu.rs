use super::{SampleContext, Sensor};
use crate::model::{MetricKind, Reading};
use sysinfo::System;

/// Overall CPU load across all cores
pub struct CpuSensor {
    sys: System,
}

impl CpuSensor {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();

        Self { sys }
    }
}

impl Default for CpuSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl Sensor for CpuSensor {
    fn kind(&self) -> MetricKind {
        MetricKind::Cpu
    }

    fn prepare(&mut self) {
        // usage is a delta between two refreshes; take the first one now
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        self.sys.refresh_cpu();
    }

    fn sample(&mut self, _ctx: &SampleContext) -> Reading {
        self.sys.refresh_cpu();

        let cpus = self.sys.cpus();
        if cpus.is_empty() {
            return Reading::unavailable(MetricKind::Cpu, crate::SensorError::NotInstalled);
        }

        let total: f32 = cpus.iter().map(|cpu| cpu.cpu_usage()).sum();
        let usage = f64::from(total / cpus.len() as f32);
        Reading::ok(MetricKind::Cpu, usage.clamp(0.0, 100.0))
    }
}
