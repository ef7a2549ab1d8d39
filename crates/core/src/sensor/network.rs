use super::{SampleContext, Sensor};
use crate::{
    error::SensorError,
    model::{MetricKind, Reading},
};
use sysinfo::Networks;

/// Which byte counter a [`NetworkSensor`] follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    pub fn kind(self) -> MetricKind {
        match self {
            Self::Down => MetricKind::NetDown,
            Self::Up => MetricKind::NetUp,
        }
    }
}

/// Cumulative bytes received or sent across all non-loopback interfaces.
///
/// The raw counter is reported; the sampler's rate counter turns it into
/// bytes per second.
pub struct NetworkSensor {
    direction: Direction,
    networks: Networks,
}

impl NetworkSensor {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            networks: Networks::new_with_refreshed_list(),
        }
    }

    #[cfg(not(feature = "linux_procfs"))]
    fn cumulative_bytes(&mut self) -> Result<u64, SensorError> {
        self.networks.refresh();

        let counters = self.networks.iter().map(|(name, data)| {
            (name.as_str(), data.total_received(), data.total_transmitted())
        });
        total_bytes(self.direction, counters)
    }

    #[cfg(feature = "linux_procfs")]
    fn cumulative_bytes(&mut self) -> Result<u64, SensorError> {
        let devices = match procfs::net::dev_status() {
            Ok(devices) => devices,
            Err(e) => {
                tracing::debug!(error = %e, "/proc/net/dev unreadable, using sysinfo");
                self.networks.refresh();
                let counters = self.networks.iter().map(|(name, data)| {
                    (name.as_str(), data.total_received(), data.total_transmitted())
                });
                return total_bytes(self.direction, counters);
            }
        };

        let counters = devices
            .iter()
            .map(|(name, dev)| (name.as_str(), dev.recv_bytes, dev.sent_bytes));
        total_bytes(self.direction, counters)
    }
}

/// `lo` on Linux, `lo0` and friends on the BSDs
fn is_loopback(interface: &str) -> bool {
    interface
        .strip_prefix("lo")
        .is_some_and(|suffix| suffix.bytes().all(|b| b.is_ascii_digit()))
}

/// Sum one direction's counter over `(interface, rx, tx)` triples
fn total_bytes<'a, I>(direction: Direction, counters: I) -> Result<u64, SensorError>
where
    I: IntoIterator<Item = (&'a str, u64, u64)>,
{
    let mut seen = false;
    let mut total = 0u64;

    for (name, rx, tx) in counters {
        if is_loopback(name) {
            continue;
        }
        seen = true;
        total = total.saturating_add(match direction {
            Direction::Down => rx,
            Direction::Up => tx,
        });
    }

    if seen {
        Ok(total)
    } else {
        Err(SensorError::NotInstalled)
    }
}

impl Sensor for NetworkSensor {
    fn kind(&self) -> MetricKind {
        self.direction.kind()
    }

    fn sample(&mut self, _ctx: &SampleContext) -> Reading {
        let bytes = self.cumulative_bytes().map(|b| b as f64);
        Reading::from_result(self.kind(), bytes)
    }
}
