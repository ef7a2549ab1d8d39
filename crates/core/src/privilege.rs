//! One-time privilege elevation for sensors whose utility needs root.
//!
//! The gate asks its [`Elevator`] at most once and remembers the answer, so
//! a denied prompt is never repeated within a session.

use crate::error::SensorError;
use std::{
    env,
    path::PathBuf,
    process::{Command, Stdio},
};
use tracing::{info, warn};

/// Result of one elevation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elevation {
    /// Privileged runs are prefixed with `prefix` (empty when already root)
    Granted { prefix: Vec<String> },
    Denied,
    /// No elevation mechanism on this system
    Unavailable,
}

/// Something able to ask the user for elevated privilege
pub trait Elevator: Send {
    fn request(&mut self) -> Elevation;
}

/// Grants without asking; for utilities that do not need root
#[derive(Debug, Default, Clone, Copy)]
pub struct NoElevation;

impl Elevator for NoElevation {
    fn request(&mut self) -> Elevation {
        Elevation::Granted { prefix: Vec::new() }
    }
}

/// Elevation through `sudo`.
///
/// A single `sudo --validate` caches the credentials; later runs use
/// `sudo -n`, which fails instead of prompting.
#[derive(Debug, Default)]
pub struct SudoElevator;

impl SudoElevator {
    pub fn new() -> Self {
        Self
    }

    fn is_root() -> bool {
        #[cfg(unix)]
        {
            nix::unistd::Uid::effective().is_root()
        }

        #[cfg(not(unix))]
        {
            false
        }
    }
}

impl Elevator for SudoElevator {
    fn request(&mut self) -> Elevation {
        if Self::is_root() {
            return Elevation::Granted { prefix: Vec::new() };
        }

        if find_on_path("sudo").is_none() {
            return Elevation::Unavailable;
        }

        let mut cmd = Command::new("sudo");
        if env::var_os("SUDO_ASKPASS").is_some() {
            cmd.arg("-A");
        }
        cmd.arg("--validate").stdout(Stdio::null());

        match cmd.status() {
            Ok(status) if status.success() => Elevation::Granted {
                prefix: vec!["sudo".to_string(), "-n".to_string()],
            },
            Ok(status) => {
                warn!(%status, "sudo refused elevation");
                Elevation::Denied
            }
            Err(e) => {
                warn!(error = %e, "could not run sudo");
                Elevation::Unavailable
            }
        }
    }
}

/// Locate an executable on `PATH`
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Caches the outcome of the first elevation request
pub struct PrivilegeGate {
    elevator: Box<dyn Elevator>,
    outcome: Option<Result<Vec<String>, SensorError>>,
    requests: u32,
}

impl PrivilegeGate {
    pub fn new(elevator: Box<dyn Elevator>) -> Self {
        Self {
            elevator,
            outcome: None,
            requests: 0,
        }
    }

    /// Command prefix for privileged runs, asking the elevator on first use.
    ///
    /// An unavailable mechanism is reported as [`SensorError::NotInstalled`],
    /// a refusal as [`SensorError::PermissionDenied`].
    pub fn acquire(&mut self) -> Result<&[String], SensorError> {
        if self.outcome.is_none() {
            self.requests += 1;
            let outcome = match self.elevator.request() {
                Elevation::Granted { prefix } => {
                    info!("privilege elevation granted");
                    Ok(prefix)
                }
                Elevation::Denied => {
                    warn!("privilege elevation denied; GPU stays unavailable this session");
                    Err(SensorError::PermissionDenied)
                }
                Elevation::Unavailable => {
                    warn!("no privilege elevation mechanism available");
                    Err(SensorError::NotInstalled)
                }
            };
            self.outcome = Some(outcome);
        }

        match &self.outcome {
            Some(Ok(prefix)) => Ok(prefix.as_slice()),
            Some(Err(err)) => Err(*err),
            None => Err(SensorError::PermissionDenied),
        }
    }

    /// Times the elevator has been asked
    pub fn requests(&self) -> u32 {
        self.requests
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }
}
