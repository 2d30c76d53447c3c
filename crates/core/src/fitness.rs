//! Fitness evaluation boundary.
//!
//! The simulator is an external, expensive and fallible collaborator. It is
//! reached through the [`FitnessGateway`] trait; [`DeadlineGateway`] bounds
//! every call by a wall-clock deadline and serializes access to the simulator.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::obstacle::ObstacleSpec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cooperative cancellation flag shared between the search and a running evaluation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Successful simulator output: minimum clearance per obstacle.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObstacleDistances {
    /// Minimum distance between the trajectory and each obstacle, in meters.
    pub distances: Vec<f64>,
    /// Files produced by the simulation (flight log, plot, test description).
    #[cfg_attr(feature = "serde", serde(default))]
    pub artifacts: Vec<PathBuf>,
}

impl ObstacleDistances {
    /// Creates a result without artifacts.
    pub fn new(distances: Vec<f64>) -> Self {
        Self {
            distances,
            artifacts: Vec::new(),
        }
    }

    /// Attaches artifact paths.
    pub fn with_artifacts(mut self, artifacts: Vec<PathBuf>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Closest approach over all obstacles, or None if no usable distance was reported.
    pub fn minimum(&self) -> Option<f64> {
        if self.distances.is_empty() || self.distances.iter().any(|d| d.is_nan()) {
            return None;
        }
        self.distances.iter().copied().reduce(f64::min)
    }
}

/// Why an evaluation produced no distance.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    /// The simulator reported an error.
    #[error("Simulator error: {0}")]
    Simulator(String),

    /// The deadline expired before the simulator answered.
    #[error("Evaluation timed out after {0:?}")]
    Timeout(Duration),

    /// The evaluation observed a cancellation request.
    #[error("Evaluation cancelled")]
    Cancelled,

    /// The evaluation worker went away without answering.
    #[error("Evaluation worker disconnected")]
    Disconnected,
}

/// Executes one obstacle configuration in the simulator.
///
/// Implementations should poll `cancel` while waiting on the simulator and
/// abort promptly once it is raised.
pub trait FitnessGateway: Send {
    /// Runs the simulation and returns per-obstacle minimum distances.
    fn evaluate(
        &mut self,
        obstacles: &[ObstacleSpec; 2],
        cancel: &CancelToken,
    ) -> Result<ObstacleDistances, EvaluationError>;
}

impl<G: FitnessGateway + ?Sized> FitnessGateway for Box<G> {
    fn evaluate(
        &mut self,
        obstacles: &[ObstacleSpec; 2],
        cancel: &CancelToken,
    ) -> Result<ObstacleDistances, EvaluationError> {
        (**self).evaluate(obstacles, cancel)
    }
}

/// Outcome of one evaluation as seen by the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fitness {
    /// Closest approach in meters; lower is more interesting.
    Measured(f64),
    /// The evaluation failed or timed out.
    Failed,
}

impl Fitness {
    /// Converts a gateway result into a fitness value.
    pub fn from_outcome(outcome: &Result<ObstacleDistances, EvaluationError>) -> Self {
        match outcome {
            Ok(d) => d.minimum().map_or(Fitness::Failed, Fitness::Measured),
            Err(_) => Fitness::Failed,
        }
    }

    /// Numeric value; a failure is never competitive.
    pub fn value(&self) -> f64 {
        match self {
            Fitness::Measured(v) => *v,
            Fitness::Failed => f64::INFINITY,
        }
    }

    /// Returns true for failed evaluations.
    pub fn is_failed(&self) -> bool {
        matches!(self, Fitness::Failed)
    }

    /// Minimization with ties favoring the challenger. A failure never improves.
    pub fn improves_on(&self, incumbent: &Fitness) -> bool {
        match self {
            Fitness::Measured(v) => *v <= incumbent.value(),
            Fitness::Failed => false,
        }
    }
}

/// Default grace period granted to a cancelled evaluation to wind down.
const DEFAULT_CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Wraps a gateway so every call is bounded by a deadline.
///
/// Each evaluation runs on a worker thread while the caller waits on a channel
/// with a timeout. On expiry the cancel token is raised and the call reports
/// [`EvaluationError::Timeout`]. The inner gateway sits behind a mutex, so a
/// worker that is still winding down blocks the next evaluation instead of
/// running alongside it.
pub struct DeadlineGateway<G> {
    inner: Arc<Mutex<G>>,
    timeout: Option<Duration>,
    cancel_grace: Duration,
}

impl<G: FitnessGateway + 'static> DeadlineGateway<G> {
    /// Wraps `gateway`. A `None` timeout waits indefinitely.
    pub fn new(gateway: G, timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gateway)),
            timeout,
            cancel_grace: DEFAULT_CANCEL_GRACE,
        }
    }

    /// Builds the wrapper from a millisecond budget (0 = unlimited).
    pub fn with_timeout_ms(gateway: G, timeout_ms: u64) -> Self {
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        Self::new(gateway, timeout)
    }

    /// Sets how long to wait for a cancelled worker before moving on.
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    /// Configured deadline.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl<G: FitnessGateway + 'static> FitnessGateway for DeadlineGateway<G> {
    fn evaluate(
        &mut self,
        obstacles: &[ObstacleSpec; 2],
        cancel: &CancelToken,
    ) -> Result<ObstacleDistances, EvaluationError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let specs = *obstacles;
        let token = cancel.clone();

        thread::Builder::new()
            .name("fitness-eval".into())
            .spawn(move || {
                let mut gateway = match inner.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                let result = if token.is_cancelled() {
                    Err(EvaluationError::Cancelled)
                } else {
                    gateway.evaluate(&specs, &token)
                };
                // The receiver is gone if the deadline already expired.
                let _ = tx.send(result);
            })
            .map_err(|e| EvaluationError::Simulator(format!("failed to spawn worker: {e}")))?;

        let Some(timeout) = self.timeout else {
            return rx.recv().unwrap_or(Err(EvaluationError::Disconnected));
        };

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                log::warn!("Evaluation exceeded {:?}, cancelling", timeout);
                if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(self.cancel_grace) {
                    log::warn!(
                        "Evaluation worker still busy {:?} after cancellation",
                        self.cancel_grace
                    );
                }
                Err(EvaluationError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(EvaluationError::Disconnected),
        }
    }
}
