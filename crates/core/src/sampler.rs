//! Fixed-cadence sampling loop.
//!
//! One thread owns the rate counters and the adapter while the sampler runs.
//! The thread sleeps on a condition variable until the next deadline, so a
//! reconfiguration or a stop wakes it immediately. The deadline is always
//! `start of previous tick + current interval`: a tick in flight finishes
//! under the config it started with, and the wait after it uses whatever
//! config is in force by then.
//!
//! Sensors are prepared on the thread calling `start`, `reconfigure` or
//! `sample_now`, never inside a tick, so a privilege prompt cannot stall
//! sampling.

use crate::{
    adapter::PresentationAdapter,
    config::Config,
    error::{CoreError, Result, SensorError},
    model::{MetricKind, Reading, Snapshot},
    rate::RateCounter,
    sensor::{SampleContext, Sensor},
};
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Instant,
};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Running,
}

struct Control {
    config: Arc<Config>,
    stop: bool,
}

struct Slot {
    sensor: Box<dyn Sensor>,
    prepared: bool,
}

/// The sensors, each prepared at most once
struct SensorSet {
    slots: Vec<Slot>,
}

impl SensorSet {
    fn new(sensors: Vec<Box<dyn Sensor>>) -> Self {
        Self {
            slots: sensors
                .into_iter()
                .map(|sensor| Slot {
                    sensor,
                    prepared: false,
                })
                .collect(),
        }
    }

    /// Prepare every sensor `config` enables that has not been prepared yet
    fn prepare(&mut self, config: &Config) {
        for slot in self.slots.iter_mut() {
            let kind = slot.sensor.kind();
            if slot.prepared || !config.is_enabled(kind) {
                continue;
            }
            debug!(%kind, "preparing sensor");
            slot.sensor.prepare();
            slot.prepared = true;
        }
    }

    /// First sensor of `kind`; later duplicates are never sampled
    fn sample(&mut self, kind: MetricKind, ctx: &SampleContext) -> Reading {
        match self.slots.iter_mut().find(|slot| slot.sensor.kind() == kind) {
            Some(slot) => slot.sensor.sample(ctx),
            None => Reading::unavailable(kind, SensorError::NotInstalled),
        }
    }
}

struct Shared {
    control: Mutex<Control>,
    sensors: Mutex<SensorSet>,
    wake: Condvar,
    ticks: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sensors(&self) -> MutexGuard<'_, SensorSet> {
        self.sensors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything the sampling thread owns; handed back on stop
struct Worker {
    rates: BTreeMap<MetricKind, RateCounter>,
    adapter: Box<dyn PresentationAdapter>,
}

impl Worker {
    /// Sample every enabled kind once and assemble the snapshot.
    ///
    /// Disabled kinds get a `Disabled` reading without asking their sensor.
    fn tick(&mut self, sensors: &mut SensorSet, config: &Config) -> Snapshot {
        let ctx = SampleContext::for_config(config);
        let mut readings = BTreeMap::new();

        for kind in MetricKind::ALL {
            if !config.is_enabled(kind) {
                readings.insert(kind, Reading::unavailable(kind, SensorError::Disabled));
                continue;
            }

            let reading = sensors.sample(kind, &ctx);
            let reading = if kind.is_rate() && reading.available() {
                let rate = self
                    .rates
                    .entry(kind)
                    .or_default()
                    .update(reading.value as u64, reading.timestamp);
                reading.with_value(rate)
            } else {
                reading
            };

            readings.insert(kind, reading);
        }

        Snapshot::new(config.interval_secs, readings)
    }

    fn run(mut self, shared: Arc<Shared>) -> Self {
        let mut last_start: Option<Instant> = None;

        loop {
            let config = {
                let mut control = shared.lock();
                loop {
                    if control.stop {
                        return self;
                    }
                    let now = Instant::now();
                    let deadline = match last_start {
                        Some(start) => start + control.config.interval(),
                        None => now,
                    };
                    if now >= deadline {
                        break Arc::clone(&control.config);
                    }
                    control = shared
                        .wake
                        .wait_timeout(control, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            };

            last_start = Some(Instant::now());
            let snapshot = self.tick(&mut shared.sensors(), &config);
            let tick = shared.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(tick, interval = config.interval_secs, "tick complete");
            self.adapter.on_snapshot(Arc::new(snapshot));
        }
    }
}

/// Drives a set of sensors on a fixed interval and pushes every
/// [`Snapshot`] to a [`PresentationAdapter`].
pub struct Sampler {
    shared: Arc<Shared>,
    worker: Option<Worker>,
    handle: Option<JoinHandle<Worker>>,
}

impl Sampler {
    pub fn new(sensors: Vec<Box<dyn Sensor>>, adapter: Box<dyn PresentationAdapter>) -> Self {
        Self {
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    config: Arc::new(Config::default()),
                    stop: false,
                }),
                sensors: Mutex::new(SensorSet::new(sensors)),
                wake: Condvar::new(),
                ticks: AtomicU64::new(0),
            }),
            worker: Some(Worker {
                rates: BTreeMap::new(),
                adapter,
            }),
            handle: None,
        }
    }

    /// Validate `config` and begin ticking; the first tick fires immediately
    pub fn start(&mut self, config: Config) -> Result<()> {
        if self.handle.is_some() {
            return Err(CoreError::AlreadyRunning);
        }
        config.validate()?;

        let worker = self.worker.take().ok_or(CoreError::WorkerLost)?;
        self.shared.sensors().prepare(&config);

        let interval = config.interval_secs;
        {
            let mut control = self.shared.lock();
            control.config = Arc::new(config);
            control.stop = false;
        }

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("panelmon-sampler".to_string())
            .spawn(move || worker.run(shared))?;
        self.handle = Some(handle);

        info!(interval, "sampler started");
        Ok(())
    }

    /// Replace the config; takes effect from the next wait on.
    ///
    /// Newly enabled sensors are prepared here, before the swap, so the
    /// first tick that samples them finds them ready. An invalid config is
    /// rejected and the current one stays in force.
    pub fn reconfigure(&self, config: Config) -> Result<()> {
        config.validate()?;

        self.shared.sensors().prepare(&config);

        let interval = config.interval_secs;
        {
            let mut control = self.shared.lock();
            control.config = Arc::new(config);
        }
        self.shared.wake.notify_all();

        info!(interval, "sampler reconfigured");
        Ok(())
    }

    /// Cancel the pending tick and wait for the sampling thread to exit.
    ///
    /// No snapshot is delivered after this returns. Stopping an idle
    /// sampler does nothing.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.shared.lock().stop = true;
        self.shared.wake.notify_all();

        match handle.join() {
            Ok(worker) => self.worker = Some(worker),
            Err(_) => error!("sampling thread panicked"),
        }
        info!(ticks = self.ticks(), "sampler stopped");
    }

    /// Take one snapshot on the calling thread without delivering it.
    ///
    /// Only valid while idle.
    pub fn sample_now(&mut self) -> Result<Arc<Snapshot>> {
        if self.handle.is_some() {
            return Err(CoreError::AlreadyRunning);
        }
        let config = self.config();
        let worker = self.worker.as_mut().ok_or(CoreError::WorkerLost)?;
        let mut sensors = self.shared.sensors();
        sensors.prepare(&config);
        Ok(Arc::new(worker.tick(&mut sensors, &config)))
    }

    pub fn state(&self) -> SamplerState {
        if self.handle.is_some() {
            SamplerState::Running
        } else {
            SamplerState::Idle
        }
    }

    /// The config currently in force
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.shared.lock().config)
    }

    /// Ticks completed by the sampling thread
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::SeqCst)
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Replays a fixed list of values with controlled timestamps
    struct ScriptedSensor {
        kind: MetricKind,
        values: Vec<(u64, u64)>,
        next: usize,
    }

    impl Sensor for ScriptedSensor {
        fn kind(&self) -> MetricKind {
            self.kind
        }

        fn sample(&mut self, _ctx: &SampleContext) -> Reading {
            let (value, secs) = self.values[self.next.min(self.values.len() - 1)];
            self.next += 1;
            let mut reading = Reading::ok(self.kind, value as f64);
            reading.timestamp = UNIX_EPOCH + Duration::from_secs(secs);
            reading
        }
    }

    struct Constant(MetricKind, f64);

    impl Sensor for Constant {
        fn kind(&self) -> MetricKind {
            self.0
        }

        fn sample(&mut self, _ctx: &SampleContext) -> Reading {
            Reading::ok(self.0, self.1)
        }
    }

    /// Panics if sampled; stands in for a sensor that must stay untouched
    struct Untouchable(MetricKind);

    impl Sensor for Untouchable {
        fn kind(&self) -> MetricKind {
            self.0
        }

        fn prepare(&mut self) {
            panic!("{} sensor prepared while disabled", self.0);
        }

        fn sample(&mut self, _ctx: &SampleContext) -> Reading {
            panic!("{} sensor sampled while disabled", self.0);
        }
    }

    struct Rig {
        worker: Worker,
        sensors: SensorSet,
    }

    impl Rig {
        fn tick(&mut self, config: &Config) -> Snapshot {
            self.sensors.prepare(config);
            self.worker.tick(&mut self.sensors, config)
        }
    }

    fn rig(sensors: Vec<Box<dyn Sensor>>) -> Rig {
        Rig {
            worker: Worker {
                rates: BTreeMap::new(),
                adapter: Box::new(|_: Arc<Snapshot>| {}),
            },
            sensors: SensorSet::new(sensors),
        }
    }

    #[test]
    fn test_tick_converts_counters_to_rates() {
        let down = ScriptedSensor {
            kind: MetricKind::NetDown,
            values: vec![(1000, 0), (3000, 2), (100, 4), (500, 6)],
            next: 0,
        };
        let mut rig = rig(vec![Box::new(down)]);
        let config = Config::default();

        let rates: Vec<f64> = (0..4)
            .map(|_| rig.tick(&config).value(MetricKind::NetDown).unwrap())
            .collect();
        assert_eq!(rates, vec![0.0, 1000.0, 0.0, 200.0]);
    }

    #[test]
    fn test_tick_reports_missing_sensors() {
        let mut rig = rig(vec![Box::new(Constant(MetricKind::Cpu, 40.0))]);
        let snapshot = rig.tick(&Config::default());

        assert_eq!(snapshot.len(), MetricKind::ALL.len());
        assert_eq!(snapshot.value(MetricKind::Cpu), Some(40.0));
        for kind in MetricKind::ALL.into_iter().filter(|k| *k != MetricKind::Cpu) {
            assert_eq!(snapshot.get(kind).unwrap().error, Some(SensorError::NotInstalled));
        }
    }

    #[test]
    fn test_tick_flags_disabled_kinds() {
        let mut rig = rig(vec![
            Box::new(Untouchable(MetricKind::Cpu)),
            Box::new(Constant(MetricKind::Memory, 2.0)),
            Box::new(Untouchable(MetricKind::Disk)),
        ]);
        let mut config = Config::default();
        config.enabled = [MetricKind::Memory].into_iter().collect();

        let snapshot = rig.tick(&config);
        assert_eq!(snapshot.len(), MetricKind::ALL.len());
        assert_eq!(snapshot.enabled_kinds().collect::<Vec<_>>(), vec![MetricKind::Memory]);
        assert_eq!(snapshot.value(MetricKind::Memory), Some(2.0));
        for kind in [MetricKind::Cpu, MetricKind::Disk, MetricKind::Gpu] {
            let reading = snapshot.get(kind).unwrap();
            assert!(!reading.available());
            assert_eq!(reading.error, Some(SensorError::Disabled));
        }
    }

    #[test]
    fn test_sensors_prepared_once_when_first_enabled() {
        struct Counting(MetricKind, Arc<AtomicU64>);
        impl Sensor for Counting {
            fn kind(&self) -> MetricKind {
                self.0
            }
            fn prepare(&mut self) {
                self.1.fetch_add(1, Ordering::SeqCst);
            }
            fn sample(&mut self, _ctx: &SampleContext) -> Reading {
                Reading::ok(self.0, 1.0)
            }
        }

        let prepared = Arc::new(AtomicU64::new(0));
        let mut sensors = SensorSet::new(vec![Box::new(Counting(
            MetricKind::Gpu,
            Arc::clone(&prepared),
        ))]);

        let mut config = Config::default();
        config.enabled = [MetricKind::Cpu].into_iter().collect();
        sensors.prepare(&config);
        assert_eq!(prepared.load(Ordering::SeqCst), 0);

        config.enabled.insert(MetricKind::Gpu);
        sensors.prepare(&config);
        sensors.prepare(&config);
        assert_eq!(prepared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unavailable_counter_does_not_touch_rate_state() {
        struct Flaky(usize);
        impl Sensor for Flaky {
            fn kind(&self) -> MetricKind {
                MetricKind::NetUp
            }
            fn sample(&mut self, _ctx: &SampleContext) -> Reading {
                self.0 += 1;
                if self.0 == 2 {
                    return Reading::unavailable(MetricKind::NetUp, SensorError::ParseError);
                }
                let mut reading = Reading::ok(MetricKind::NetUp, (self.0 * 1000) as f64);
                reading.timestamp = SystemTime::UNIX_EPOCH + Duration::from_secs(self.0 as u64);
                reading
            }
        }

        let mut rig = rig(vec![Box::new(Flaky(0))]);
        let config = Config::default();
        assert_eq!(rig.tick(&config).value(MetricKind::NetUp), Some(0.0));
        assert_eq!(rig.tick(&config).value(MetricKind::NetUp), None);
        // 1000 @ 1s -> 3000 @ 3s
        assert_eq!(rig.tick(&config).value(MetricKind::NetUp), Some(1000.0));
    }

    #[test]
    fn test_sample_now_requires_idle() {
        let mut sampler = Sampler::new(
            vec![Box::new(Constant(MetricKind::Cpu, 5.0))],
            Box::new(|_: Arc<Snapshot>| {}),
        );
        let snapshot = sampler.sample_now().unwrap();
        assert_eq!(snapshot.value(MetricKind::Cpu), Some(5.0));

        sampler.start(Config::default()).unwrap();
        assert!(matches!(sampler.sample_now(), Err(CoreError::AlreadyRunning)));
        sampler.stop();
        assert!(sampler.sample_now().is_ok());
    }
}
