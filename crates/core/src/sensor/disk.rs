use super::{memory::used_percent, SampleContext, Sensor};
use crate::{
    error::SensorError,
    model::{MetricKind, Reading},
};
use std::path::PathBuf;
use sysinfo::Disks;

/// Space used on the filesystem mounted at `mount_point`
pub struct DiskSensor {
    disks: Disks,
    mount_point: PathBuf,
}

impl DiskSensor {
    pub fn new(mount_point: PathBuf) -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
            mount_point,
        }
    }

    pub fn mount_point(&self) -> &std::path::Path {
        &self.mount_point
    }
}

impl Sensor for DiskSensor {
    fn kind(&self) -> MetricKind {
        MetricKind::Disk
    }

    fn sample(&mut self, _ctx: &SampleContext) -> Reading {
        self.disks.refresh();

        let percent = self
            .disks
            .iter()
            .find(|disk| disk.mount_point() == self.mount_point.as_path())
            .ok_or(SensorError::NotInstalled)
            .and_then(|disk| {
                used_percent(disk.total_space(), disk.available_space())
                    .ok_or(SensorError::ParseError)
            });

        Reading::from_result(MetricKind::Disk, percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_missing_mount_point_is_not_installed() {
        let mut sensor = DiskSensor::new(PathBuf::from("/definitely/not/a/mount/point"));
        let reading = sensor.sample(&SampleContext { timeout: Duration::from_secs(1) });
        assert_eq!(reading.error, Some(SensorError::NotInstalled));
    }
}
