//! Simulator gateways.
//!
//! [`CommandGateway`] drives an external simulator process through a small
//! JSON protocol; [`SyntheticGateway`] replaces the simulator with random
//! distances for dry runs.
//!
//! # Protocol
//!
//! The command receives `{"obstacles": [<spec>, <spec>]}` on stdin, where each
//! spec carries `x`, `y`, `z`, `rotation`, `length`, `width` and `height`. It
//! answers on stdout with
//! `{"distances": [<meters>, ...], "artifacts": ["<path>", ...]}` and exits
//! with status 0. Anything else counts as a failed evaluation.
//!
//! On Unix the command runs in its own process group. Whatever it leaves
//! running in that group is killed once it exits or the evaluation is
//! cancelled.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;

use obstacle_search::core::{
    CancelToken, EvaluationError, FitnessGateway, ObstacleDistances, ObstacleSpec,
};

use crate::error::{Result, RunnerError};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Serialize)]
struct SimulationRequest<'a> {
    obstacles: &'a [ObstacleSpec; 2],
}

/// Runs each evaluation as a child process.
#[derive(Debug, Clone)]
pub struct CommandGateway {
    program: String,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandGateway {
    /// Builds a gateway from a command line (`program arg1 arg2 ...`).
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| RunnerError::InvalidCommand("empty simulator command".into()))?;
        if program.trim().is_empty() {
            return Err(RunnerError::InvalidCommand("empty program name".into()));
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Sets how often the child is polled for exit and cancellation.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn spawn(&self) -> std::io::Result<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // The child leads a fresh process group holding everything it starts.
            command.process_group(0);
        }
        command.spawn()
    }

    /// Kills every process left in the child's group.
    #[cfg(unix)]
    fn kill_group(child: &Child) {
        let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
            return;
        };
        // SAFETY: kill(2) only takes integers and reports failure through errno.
        let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                log::warn!("Failed to kill simulator process group {pgid}: {err}");
            }
        }
    }

    #[cfg(not(unix))]
    fn kill_group(_child: &Child) {}

    fn kill(child: &mut Child) {
        Self::kill_group(child);
        if let Err(e) = child.kill() {
            log::debug!("Simulator process {} already gone: {}", child.id(), e);
        }
        let _ = child.wait();
    }

    /// Waits for the reader thread to hand over stdout.
    fn collect_output(
        &self,
        output: &Receiver<std::io::Result<String>>,
        cancel: &CancelToken,
    ) -> std::result::Result<String, EvaluationError> {
        loop {
            if cancel.is_cancelled() {
                return Err(EvaluationError::Cancelled);
            }
            match output.recv_timeout(self.poll_interval) {
                Ok(Ok(out)) => return Ok(out),
                Ok(Err(e)) => {
                    return Err(EvaluationError::Simulator(format!(
                        "failed to read simulator output: {e}"
                    )))
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(EvaluationError::Disconnected),
            }
        }
    }
}

impl FitnessGateway for CommandGateway {
    fn evaluate(
        &mut self,
        obstacles: &[ObstacleSpec; 2],
        cancel: &CancelToken,
    ) -> std::result::Result<ObstacleDistances, EvaluationError> {
        let request = serde_json::to_vec(&SimulationRequest { obstacles })
            .map_err(|e| EvaluationError::Simulator(format!("failed to encode request: {e}")))?;

        let mut child = self.spawn().map_err(|e| {
            EvaluationError::Simulator(format!("failed to start {}: {e}", self.program))
        })?;
        log::debug!("Started simulator process {}", child.id());

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&request) {
                Self::kill(&mut child);
                return Err(EvaluationError::Simulator(format!(
                    "failed to send obstacles: {e}"
                )));
            }
            // Dropping stdin closes the pipe.
        }

        // Drain stdout concurrently so a chatty child never blocks on a full pipe.
        let Some(mut stdout) = child.stdout.take() else {
            Self::kill(&mut child);
            return Err(EvaluationError::Simulator("simulator stdout not captured".into()));
        };
        let (tx, output) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = tx.send(stdout.read_to_string(&mut buf).map(|_| buf));
        });

        let status = loop {
            if cancel.is_cancelled() {
                log::warn!("Cancelling simulator process {}", child.id());
                Self::kill(&mut child);
                return Err(EvaluationError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    Self::kill(&mut child);
                    return Err(EvaluationError::Simulator(format!(
                        "failed to poll simulator: {e}"
                    )));
                }
            }
        };

        // Background processes of the simulator may still hold stdout open.
        Self::kill_group(&child);
        let stdout = self.collect_output(&output, cancel)?;

        if !status.success() {
            return Err(EvaluationError::Simulator(format!(
                "simulator exited with {status}"
            )));
        }

        serde_json::from_str(stdout.trim()).map_err(|e| {
            EvaluationError::Simulator(format!("invalid simulator output: {e} (output: {stdout})"))
        })
    }
}

/// Mixed into a search seed so synthetic distances do not replay the search's draws.
const SYNTHETIC_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Random distances in place of a simulator, one per obstacle.
#[derive(Debug, Clone)]
pub struct SyntheticGateway {
    rng: StdRng,
    min: f64,
    max: f64,
}

impl SyntheticGateway {
    /// Draws distances uniformly from `[0.1, 40)`.
    ///
    /// `seed` is used as is; see [`SyntheticGateway::for_search`] to pair the
    /// gateway with a seeded search.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            min: 0.1,
            max: 40.0,
        }
    }

    /// Gateway for a search seeded with `search_seed`, drawing from a separate stream.
    pub fn for_search(search_seed: Option<u64>) -> Self {
        Self::new(search_seed.map(|s| s ^ SYNTHETIC_SEED_SALT))
    }

    /// Sets the distance range.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

impl FitnessGateway for SyntheticGateway {
    fn evaluate(
        &mut self,
        obstacles: &[ObstacleSpec; 2],
        cancel: &CancelToken,
    ) -> std::result::Result<ObstacleDistances, EvaluationError> {
        if cancel.is_cancelled() {
            return Err(EvaluationError::Cancelled);
        }
        let distances = obstacles
            .iter()
            .map(|_| self.rng.gen_range(self.min..self.max))
            .collect();
        Ok(ObstacleDistances::new(distances))
    }
}
