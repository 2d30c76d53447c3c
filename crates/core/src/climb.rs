//! Budgeted hill climbing with restart on stagnation.
//!
//! The runner owns the search loop and its bookkeeping; problem-specific work
//! (drawing parents, mutating, simulating) is delegated to a [`ClimbProblem`].
//!
//! # State machine
//!
//! - **INIT**: draw a parent and evaluate it.
//! - **MUTATE / EVALUATE / SELECT**: derive a child, evaluate it, and keep it if
//!   its fitness is at most the parent's (minimization, ties favor the child).
//! - **RESTART**: after `stagnation_limit` consecutive rejections, go back to INIT.
//! - **DONE**: every evaluation of the budget has been spent.
//!
//! Every evaluation, including a restart's parent evaluation and failed
//! simulations, consumes one unit of budget.

use rand::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::fitness::Fitness;
use crate::{Error, Result};

/// Configuration for hill climbing.
#[derive(Debug, Clone)]
pub struct ClimbConfig {
    /// Total number of evaluations allowed.
    pub budget: u64,
    /// Consecutive rejected children before a restart.
    pub stagnation_limit: u32,
    /// Maximum wall-clock time (None = budget only).
    pub time_limit: Option<Duration>,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            budget: 200,
            stagnation_limit: 10,
            time_limit: None,
        }
    }
}

impl ClimbConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the evaluation budget.
    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the stagnation limit.
    pub fn with_stagnation_limit(mut self, limit: u32) -> Self {
        self.stagnation_limit = limit.max(1);
        self
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }
}

/// Problem-specific operations driven by [`ClimbRunner`].
pub trait ClimbProblem {
    /// A candidate solution.
    type Solution: Clone + fmt::Debug;

    /// Draws a fresh parent (INIT).
    fn initial_solution<R: Rng>(&mut self, rng: &mut R) -> Result<Self::Solution>;

    /// Derives a child from the current parent (MUTATE).
    fn neighbor<R: Rng>(
        &mut self,
        parent: &Self::Solution,
        rng: &mut R,
    ) -> Result<Self::Solution>;

    /// Evaluates a solution. `evaluation` is the 1-based index within the budget.
    fn evaluate(&mut self, solution: &Self::Solution, evaluation: u64) -> Fitness;

    /// Called when a child replaces the parent.
    fn on_accept(&mut self, _evaluation: u64, _solution: &Self::Solution, _fitness: Fitness) {
        // Default: do nothing
    }

    /// Called before a stagnation restart draws a new parent.
    fn on_restart(&mut self, _evaluation: u64, _stagnation: u32) {
        // Default: do nothing
    }
}

/// Result of a hill-climbing run.
#[derive(Debug, Clone)]
pub struct ClimbResult<S> {
    /// Best solution seen across all restarts.
    pub best: S,
    /// Fitness of the best solution.
    pub best_fitness: Fitness,
    /// Parent held when the run stopped.
    pub parent: S,
    /// Fitness of the final parent.
    pub parent_fitness: Fitness,
    /// Evaluations consumed.
    pub evaluations: u64,
    /// Number of INIT draws (the first parent plus one per restart).
    pub initializations: u32,
    /// Number of stagnation restarts.
    pub restarts: u32,
    /// Evaluations that failed or timed out.
    pub failed_evaluations: u64,
    /// Whether the run was cancelled before spending the budget.
    pub cancelled: bool,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// Best fitness after each evaluation.
    pub history: Vec<f64>,
    /// Parent fitness after each evaluation. It only rises at a restart.
    pub parent_history: Vec<f64>,
}

/// Budgeted hill-climbing runner.
pub struct ClimbRunner<P: ClimbProblem> {
    config: ClimbConfig,
    problem: P,
    cancelled: Arc<AtomicBool>,
}

impl<P: ClimbProblem> ClimbRunner<P> {
    /// Creates a new runner.
    pub fn new(config: ClimbConfig, problem: P) -> Self {
        Self {
            config,
            problem,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a handle to cancel the run between evaluations.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClimbConfig {
        &self.config
    }

    /// Returns the configuration mutably, e.g. to set the budget of the next run.
    pub fn config_mut(&mut self) -> &mut ClimbConfig {
        &mut self.config
    }

    /// Returns the problem.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Returns the problem mutably.
    pub fn problem_mut(&mut self) -> &mut P {
        &mut self.problem
    }

    /// Consumes the runner and returns the problem.
    pub fn into_problem(self) -> P {
        self.problem
    }

    /// Runs the search with a thread-local RNG.
    pub fn run(&mut self) -> Result<ClimbResult<P::Solution>> {
        self.run_with_rng(&mut thread_rng())
    }

    /// Runs the search with a specific RNG.
    pub fn run_with_rng<R: Rng>(&mut self, rng: &mut R) -> Result<ClimbResult<P::Solution>> {
        let budget = self.config.budget;
        if budget == 0 {
            return Err(Error::InvalidConfig(
                "evaluation budget must be at least 1".into(),
            ));
        }
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        let start = Instant::now();
        let limit = self.config.stagnation_limit.max(1);
        let mut history = Vec::with_capacity(budget.min(4096) as usize);
        let mut parent_history = Vec::with_capacity(budget.min(4096) as usize);
        let mut failed_evaluations = 0u64;

        // INIT + EVALUATE(parent)
        let mut parent = self.problem.initial_solution(rng)?;
        let mut initializations = 1u32;
        let mut evaluations = 1u64;
        let mut parent_fitness = self.problem.evaluate(&parent, evaluations);
        if parent_fitness.is_failed() {
            failed_evaluations += 1;
        }

        let mut best = parent.clone();
        let mut best_fitness = parent_fitness;
        history.push(best_fitness.value());
        parent_history.push(parent_fitness.value());

        let mut stagnation = 0u32;
        let mut restarts = 0u32;
        let mut cancelled = false;

        while evaluations < budget {
            if self.cancelled.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
            if let Some(time_limit) = self.config.time_limit {
                if start.elapsed() > time_limit {
                    log::info!("Time limit {:?} reached", time_limit);
                    break;
                }
            }

            // RESTART
            if stagnation >= limit {
                log::info!(
                    "Local minimum after {} rejected children, drawing a new parent",
                    stagnation
                );
                self.problem.on_restart(evaluations, stagnation);
                parent = self.problem.initial_solution(rng)?;
                initializations += 1;
                restarts += 1;
                stagnation = 0;

                evaluations += 1;
                parent_fitness = self.problem.evaluate(&parent, evaluations);
                if parent_fitness.is_failed() {
                    failed_evaluations += 1;
                }
                if parent_fitness.improves_on(&best_fitness) {
                    best = parent.clone();
                    best_fitness = parent_fitness;
                }
                history.push(best_fitness.value());
                parent_history.push(parent_fitness.value());
                continue;
            }

            // MUTATE + EVALUATE(child)
            let child = self.problem.neighbor(&parent, rng)?;
            evaluations += 1;
            let child_fitness = self.problem.evaluate(&child, evaluations);
            if child_fitness.is_failed() {
                failed_evaluations += 1;
            }

            // SELECT
            if child_fitness.improves_on(&parent_fitness) {
                self.problem.on_accept(evaluations, &child, child_fitness);
                parent = child;
                parent_fitness = child_fitness;
                stagnation = 0;
                if parent_fitness.improves_on(&best_fitness) {
                    best = parent.clone();
                    best_fitness = parent_fitness;
                }
            } else {
                stagnation += 1;
            }

            history.push(best_fitness.value());
            parent_history.push(parent_fitness.value());
            log::debug!(
                "Evaluation {}/{}: parent fitness {:.4}, best {:.4}",
                evaluations,
                budget,
                parent_fitness.value(),
                best_fitness.value()
            );
        }

        Ok(ClimbResult {
            best,
            best_fitness,
            parent,
            parent_fitness,
            evaluations,
            initializations,
            restarts,
            failed_evaluations,
            cancelled,
            elapsed: start.elapsed(),
            history,
            parent_history,
        })
    }
}
