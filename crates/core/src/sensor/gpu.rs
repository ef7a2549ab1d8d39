use super::{SampleContext, Sensor};
use crate::{
    config::GpuConfig,
    error::SensorError,
    model::{MetricKind, Reading},
    privilege::{find_on_path, Elevator, PrivilegeGate},
};
use std::{
    io::Read,
    path::Path,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

/// How often a running utility is checked for exit
const POLL_STEP: Duration = Duration::from_millis(20);

/// A program plus fixed arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilityCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl UtilityCommand {
    pub fn new<S: Into<String>>(program: S, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn from_config(config: &GpuConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    /// This command run through `prefix` (e.g. `sudo -n`)
    pub fn prefixed(&self, prefix: &[String]) -> Self {
        match prefix.split_first() {
            None => self.clone(),
            Some((launcher, rest)) => {
                let mut args = rest.to_vec();
                args.push(self.program.clone());
                args.extend(self.args.iter().cloned());
                Self {
                    program: launcher.clone(),
                    args,
                }
            }
        }
    }
}

/// Runs an external program and returns its standard output
pub trait UtilityRunner: Send {
    fn run(&self, cmd: &UtilityCommand, timeout: Duration) -> Result<String, SensorError>;

    /// Whether `program` can be launched at all
    fn is_installed(&self, program: &str) -> bool {
        if program.contains('/') {
            return Path::new(program).is_file();
        }
        find_on_path(program).is_some()
    }
}

/// Runs utilities as child processes, killing them at the deadline
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl UtilityRunner for ProcessRunner {
    fn run(&self, cmd: &UtilityCommand, timeout: Duration) -> Result<String, SensorError> {
        let mut child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                debug!(program = %cmd.program, error = %e, "failed to spawn utility");
                SensorError::from_io(&e)
            })?;

        let mut stdout = child.stdout.take().ok_or(SensorError::ParseError)?;

        // Drain stdout while waiting so a chatty utility never blocks on a
        // full pipe. A grandchild may keep the pipe open past a kill, so the
        // reader is only joined after a clean exit.
        let reader = thread::Builder::new()
            .name("panelmon-utility".to_string())
            .spawn(move || {
                let mut output = Vec::new();
                stdout.read_to_end(&mut output).map(|_| output)
            })
            .map_err(|e| SensorError::from_io(&e))?;

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SensorError::Timeout);
                }
                Ok(None) => thread::sleep(POLL_STEP),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SensorError::from_io(&e));
                }
            }
        };

        if !status.success() {
            debug!(program = %cmd.program, %status, "utility exited unsuccessfully");
            return Err(SensorError::ParseError);
        }

        match reader.join() {
            Ok(Ok(bytes)) => String::from_utf8(bytes).map_err(|_| SensorError::ParseError),
            _ => Err(SensorError::ParseError),
        }
    }
}

/// Extract the GPU busy percentage from radeontop dump output.
///
/// Dump lines look like `1712.34: bus 03, gpu 12.50%, ee 0.00%, ...`; the
/// first `gpu <number>%` field wins.
pub fn parse_gpu_busy(output: &str) -> Result<f64, SensorError> {
    output
        .lines()
        .flat_map(|line| line.split(','))
        .find_map(|field| {
            let mut parts = field.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("gpu"), Some(value)) => Some(value.trim_end_matches('%').parse::<f64>()),
                _ => None,
            }
        })
        .and_then(|parsed| parsed.ok())
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 100.0))
        .ok_or(SensorError::ParseError)
}

/// GPU utilisation read from an external monitoring utility
pub struct GpuSensor {
    command: UtilityCommand,
    gate: PrivilegeGate,
    runner: Box<dyn UtilityRunner>,
    /// Looked up once; the utility is not expected to appear mid-session
    installed: Option<bool>,
    last_error: Option<SensorError>,
}

impl GpuSensor {
    pub fn new(
        command: UtilityCommand,
        elevator: Box<dyn Elevator>,
        runner: Box<dyn UtilityRunner>,
    ) -> Self {
        Self {
            command,
            gate: PrivilegeGate::new(elevator),
            runner,
            installed: None,
            last_error: None,
        }
    }

    pub fn gate(&self) -> &PrivilegeGate {
        &self.gate
    }

    fn check_installed(&mut self) -> Result<(), SensorError> {
        let installed = match self.installed {
            Some(installed) => installed,
            None => {
                let installed = self.runner.is_installed(&self.command.program);
                if !installed {
                    warn!(program = %self.command.program, "GPU utility not found");
                }
                self.installed = Some(installed);
                installed
            }
        };
        if installed {
            Ok(())
        } else {
            Err(SensorError::NotInstalled)
        }
    }

    fn read(&mut self, timeout: Duration) -> Result<f64, SensorError> {
        self.check_installed()?;
        let prefix = self.gate.acquire()?;
        let command = self.command.prefixed(prefix);
        let output = self.runner.run(&command, timeout)?;
        parse_gpu_busy(&output)
    }
}

impl Sensor for GpuSensor {
    fn kind(&self) -> MetricKind {
        MetricKind::Gpu
    }

    fn prepare(&mut self) {
        // no prompt for a utility that is not there
        if self.check_installed().is_err() {
            return;
        }
        if let Err(e) = self.gate.acquire() {
            debug!(error = %e, "GPU sensor unavailable after elevation");
        }
    }

    fn sample(&mut self, ctx: &SampleContext) -> Reading {
        let result = self.read(ctx.timeout);

        // log transitions only, not every failing tick
        match result {
            Err(err) if self.last_error != Some(err) => {
                warn!(program = %self.command.program, error = %err, "GPU reading unavailable");
                self.last_error = Some(err);
            }
            Ok(_) => self.last_error = None,
            Err(_) => {}
        }

        Reading::from_result(MetricKind::Gpu, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::{Elevation, NoElevation};
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    };

    const DUMP: &str = "Dumping to -, line limit 1.\n\
        1712345678.123456: bus 03, gpu 12.50%, ee 0.00%, vgt 3.33%, ta 8.33%, \
        vram 10.01% 409.86mb, gtt 1.10% 45.27mb, mclk 100.00% 1.000ghz, sclk 54.04% 0.700ghz\n";

    struct ScriptedRunner {
        response: Result<String, SensorError>,
        seen: Arc<Mutex<Vec<UtilityCommand>>>,
    }

    impl UtilityRunner for ScriptedRunner {
        fn run(&self, cmd: &UtilityCommand, _timeout: Duration) -> Result<String, SensorError> {
            self.seen.lock().unwrap().push(cmd.clone());
            self.response.clone()
        }

        fn is_installed(&self, _program: &str) -> bool {
            true
        }
    }

    /// Real PATH lookup, but never expected to run anything
    struct LookupOnlyRunner {
        lookups: Arc<AtomicU32>,
    }

    impl UtilityRunner for LookupOnlyRunner {
        fn run(&self, cmd: &UtilityCommand, _timeout: Duration) -> Result<String, SensorError> {
            panic!("{} run although it is not installed", cmd.program);
        }

        fn is_installed(&self, program: &str) -> bool {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            find_on_path(program).is_some()
        }
    }

    struct CountingElevator(Arc<AtomicU32>);

    impl Elevator for CountingElevator {
        fn request(&mut self) -> Elevation {
            self.0.fetch_add(1, Ordering::SeqCst);
            Elevation::Denied
        }
    }

    struct FixedElevator(Elevation);

    impl Elevator for FixedElevator {
        fn request(&mut self) -> Elevation {
            self.0.clone()
        }
    }

    fn ctx() -> SampleContext {
        SampleContext {
            timeout: Duration::from_secs(1),
        }
    }

    fn sensor(
        elevator: Box<dyn Elevator>,
        response: Result<String, SensorError>,
    ) -> (GpuSensor, Arc<Mutex<Vec<UtilityCommand>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let runner = ScriptedRunner {
            response,
            seen: Arc::clone(&seen),
        };
        let command = UtilityCommand::new("radeontop", &["-d", "-", "-l", "1"]);
        (GpuSensor::new(command, elevator, Box::new(runner)), seen)
    }

    #[test]
    fn test_parse_radeontop_dump() {
        assert_eq!(parse_gpu_busy(DUMP), Ok(12.5));
        assert_eq!(parse_gpu_busy("1.0: bus 01, gpu 100.00%, ee 0.00%"), Ok(100.0));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        assert_eq!(parse_gpu_busy(""), Err(SensorError::ParseError));
        assert_eq!(parse_gpu_busy("Dumping to -, line limit 1."), Err(SensorError::ParseError));
        assert_eq!(parse_gpu_busy("1.0: bus 01, gpu abc%"), Err(SensorError::ParseError));
    }

    #[test]
    fn test_prefixed_command() {
        let cmd = UtilityCommand::new("radeontop", &["-d", "-"]);
        let prefix = vec!["sudo".to_string(), "-n".to_string()];
        assert_eq!(
            cmd.prefixed(&prefix),
            UtilityCommand::new("sudo", &["-n", "radeontop", "-d", "-"])
        );
        assert_eq!(cmd.prefixed(&[]), cmd);
    }

    #[test]
    fn test_sample_success() {
        let (mut sensor, seen) = sensor(Box::new(NoElevation), Ok(DUMP.to_string()));
        let reading = sensor.sample(&ctx());
        assert_eq!(reading.value(), Some(12.5));
        assert_eq!(seen.lock().unwrap()[0].program, "radeontop");
    }

    #[test]
    fn test_elevated_run_uses_prefix() {
        let elevation = Elevation::Granted {
            prefix: vec!["sudo".to_string(), "-n".to_string()],
        };
        let (mut sensor, seen) = sensor(Box::new(FixedElevator(elevation)), Ok(DUMP.to_string()));
        sensor.sample(&ctx());
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].program, "sudo");
        assert_eq!(seen[0].args[..2], ["-n".to_string(), "radeontop".to_string()]);
    }

    #[test]
    fn test_runner_failures_become_readings() {
        for err in [SensorError::NotInstalled, SensorError::Timeout, SensorError::ParseError] {
            let (mut sensor, _) = sensor(Box::new(NoElevation), Err(err));
            let reading = sensor.sample(&ctx());
            assert!(!reading.available());
            assert_eq!(reading.error, Some(err));
        }
    }

    #[test]
    fn test_denied_elevation_skips_utility() {
        let (mut sensor, seen) = sensor(Box::new(FixedElevator(Elevation::Denied)), Ok(DUMP.to_string()));
        sensor.prepare();
        for _ in 0..5 {
            let reading = sensor.sample(&ctx());
            assert_eq!(reading.error, Some(SensorError::PermissionDenied));
        }
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(sensor.gate().requests(), 1);
    }

    #[test]
    fn test_missing_utility_never_asks_for_elevation() {
        let elevations = Arc::new(AtomicU32::new(0));
        let lookups = Arc::new(AtomicU32::new(0));
        let mut sensor = GpuSensor::new(
            UtilityCommand::new("panelmon-no-such-utility", &[]),
            Box::new(CountingElevator(Arc::clone(&elevations))),
            Box::new(LookupOnlyRunner {
                lookups: Arc::clone(&lookups),
            }),
        );

        sensor.prepare();
        for _ in 0..3 {
            assert_eq!(sensor.sample(&ctx()).error, Some(SensorError::NotInstalled));
        }
        assert_eq!(elevations.load(Ordering::SeqCst), 0);
        assert!(!sensor.gate().is_resolved());
        assert_eq!(lookups.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_default_install_check() {
        assert!(ProcessRunner.is_installed("sh"));
        assert!(ProcessRunner.is_installed("/bin/sh"));
        assert!(!ProcessRunner.is_installed("panelmon-no-such-utility"));
        assert!(!ProcessRunner.is_installed("/nonexistent/radeontop"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_missing_binary() {
        let cmd = UtilityCommand::new("panelmon-no-such-utility", &[]);
        assert_eq!(
            ProcessRunner.run(&cmd, Duration::from_secs(1)),
            Err(SensorError::NotInstalled)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_reads_stdout() {
        let cmd = UtilityCommand::new("sh", &["-c", "echo '1.0: bus 01, gpu 42.00%'"]);
        let output = ProcessRunner.run(&cmd, Duration::from_secs(2)).unwrap();
        assert_eq!(parse_gpu_busy(&output), Ok(42.0));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_drains_large_output() {
        // well past a pipe buffer before the line that matters
        let script = "head -c 200000 /dev/zero | tr '\\0' a; echo; echo '1.0: bus 01, gpu 42.00%'";
        let cmd = UtilityCommand::new("sh", &["-c", script]);
        let output = ProcessRunner.run(&cmd, Duration::from_secs(2)).unwrap();
        assert!(output.len() > 200_000);
        assert_eq!(parse_gpu_busy(&output), Ok(42.0));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_nonzero_exit() {
        let cmd = UtilityCommand::new("sh", &["-c", "exit 3"]);
        assert_eq!(
            ProcessRunner.run(&cmd, Duration::from_secs(2)),
            Err(SensorError::ParseError)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_times_out() {
        let cmd = UtilityCommand::new("sleep", &["5"]);
        let started = Instant::now();
        assert_eq!(
            ProcessRunner.run(&cmd, Duration::from_millis(200)),
            Err(SensorError::Timeout)
        );
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
