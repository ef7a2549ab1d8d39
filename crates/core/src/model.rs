use crate::error::SensorError;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, time::SystemTime};

/// The metrics the sampler knows how to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Cpu,
    Gpu,
    Memory,
    Disk,
    NetDown,
    NetUp,
}

impl MetricKind {
    /// Every kind, in display order
    pub const ALL: [MetricKind; 6] = [
        Self::Cpu,
        Self::Gpu,
        Self::Memory,
        Self::Disk,
        Self::NetDown,
        Self::NetUp,
    ];

    /// Kinds whose sensors report cumulative byte counters
    pub fn is_rate(self) -> bool {
        matches!(self, Self::NetDown | Self::NetUp)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Memory => "Memory",
            Self::Disk => "Disk",
            Self::NetDown => "Download",
            Self::NetUp => "Upload",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Memory => "memory",
            Self::Disk => "disk",
            Self::NetDown => "net_down",
            Self::NetUp => "net_up",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            "memory" | "mem" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            "net_down" | "down" | "rx" => Ok(Self::NetDown),
            "net_up" | "up" | "tx" => Ok(Self::NetUp),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

/// One sensor's result at one tick.
///
/// `value` is a percentage for percentage kinds. Network sensors emit the
/// cumulative byte count; by the time a reading sits in a [`Snapshot`] it
/// holds bytes per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub kind: MetricKind,
    pub value: f64,
    pub timestamp: SystemTime,
    pub error: Option<SensorError>,
}

impl Reading {
    pub fn ok(kind: MetricKind, value: f64) -> Self {
        Self {
            kind,
            value,
            timestamp: SystemTime::now(),
            error: None,
        }
    }

    pub fn unavailable(kind: MetricKind, error: SensorError) -> Self {
        Self {
            kind,
            value: 0.0,
            timestamp: SystemTime::now(),
            error: Some(error),
        }
    }

    /// Build a reading from a sensor outcome
    pub fn from_result(kind: MetricKind, result: Result<f64, SensorError>) -> Self {
        match result {
            Ok(value) => Self::ok(kind, value),
            Err(err) => Self::unavailable(kind, err),
        }
    }

    pub fn available(&self) -> bool {
        self.error.is_none()
    }

    /// The value, if the sensor produced one
    pub fn value(&self) -> Option<f64> {
        self.available().then_some(self.value)
    }

    pub(crate) fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }
}

/// Every reading taken during one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: SystemTime,
    pub interval_secs: u32,
    readings: BTreeMap<MetricKind, Reading>,
}

impl Snapshot {
    pub(crate) fn new(interval_secs: u32, readings: BTreeMap<MetricKind, Reading>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            interval_secs,
            readings,
        }
    }

    pub fn get(&self, kind: MetricKind) -> Option<&Reading> {
        self.readings.get(&kind)
    }

    /// Value of `kind`, `None` when disabled or unavailable
    pub fn value(&self, kind: MetricKind) -> Option<f64> {
        self.get(kind).and_then(Reading::value)
    }

    pub fn contains(&self, kind: MetricKind) -> bool {
        self.readings.contains_key(&kind)
    }

    /// True unless `kind` was switched off for this tick
    pub fn is_enabled(&self, kind: MetricKind) -> bool {
        self.get(kind)
            .is_some_and(|reading| reading.error != Some(SensorError::Disabled))
    }

    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.readings.values()
    }

    pub fn kinds(&self) -> impl Iterator<Item = MetricKind> + '_ {
        self.readings.keys().copied()
    }

    pub fn enabled_kinds(&self) -> impl Iterator<Item = MetricKind> + '_ {
        self.kinds().filter(|kind| self.is_enabled(*kind))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Theme configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}
