pub mod cpu;
pub mod disk;
pub mod gpu;
pub mod memory;
pub mod network;

pub use cpu::CpuSensor;
pub use disk::DiskSensor;
pub use gpu::{parse_gpu_busy, GpuSensor, ProcessRunner, UtilityCommand, UtilityRunner};
pub use memory::MemorySensor;
pub use network::{Direction, NetworkSensor};

use crate::{
    config::Config,
    model::{MetricKind, Reading},
    privilege::{Elevator, NoElevation, SudoElevator},
};
use std::time::Duration;

/// Per-tick limits handed to every sensor
#[derive(Debug, Clone, Copy)]
pub struct SampleContext {
    pub timeout: Duration,
}

impl SampleContext {
    pub fn for_config(config: &Config) -> Self {
        Self {
            timeout: config.sensor_timeout(),
        }
    }
}

/// A single-metric sampling capability.
///
/// `sample` never fails: a missing dependency or a bad read comes back as a
/// reading with an error kind.
pub trait Sensor: Send {
    fn kind(&self) -> MetricKind;

    /// One-time setup before the first tick (baselines, privilege)
    fn prepare(&mut self) {}

    fn sample(&mut self, ctx: &SampleContext) -> Reading;
}

/// Sensors for every metric kind, built from `config`
pub fn default_sensors(config: &Config) -> Vec<Box<dyn Sensor>> {
    let elevator: Box<dyn Elevator> = if config.gpu.elevate {
        Box::new(SudoElevator::new())
    } else {
        Box::new(NoElevation)
    };

    vec![
        Box::new(CpuSensor::new()),
        Box::new(GpuSensor::new(
            UtilityCommand::from_config(&config.gpu),
            elevator,
            Box::new(ProcessRunner),
        )),
        Box::new(MemorySensor::new()),
        Box::new(DiskSensor::new(config.disk_mount.clone())),
        Box::new(NetworkSensor::new(Direction::Down)),
        Box::new(NetworkSensor::new(Direction::Up)),
    ]
}
