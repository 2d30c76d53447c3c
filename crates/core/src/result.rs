//! Search report representation.

use crate::fitness::Fitness;
use crate::geometry::FlightSegment;
use crate::obstacle::{ObstacleConfiguration, ObstacleSpec};

/// Summary of a finished obstacle search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Best configuration found across all restarts.
    pub best: ObstacleConfiguration,

    /// Obstacles of the best configuration as sent to the simulator.
    pub best_obstacles: [ObstacleSpec; 2],

    /// Closest approach achieved by the best configuration.
    pub best_fitness: Fitness,

    /// Parent held when the budget ran out.
    pub final_parent: ObstacleConfiguration,

    /// Fitness of the final parent.
    pub final_parent_fitness: Fitness,

    /// Reference segment candidates were generated around.
    pub segment: FlightSegment,

    /// Evaluations consumed.
    pub evaluations: u64,

    /// INIT draws made by the search loop (first parent plus restarts).
    pub initializations: u32,

    /// Stagnation restarts.
    pub restarts: u32,

    /// Fresh parents drawn by mutation after running out of attempts.
    pub mutation_reseeds: u32,

    /// Evaluations that failed or timed out.
    pub failed_evaluations: u64,

    /// Cases handed to persistence.
    pub interesting_cases: u64,

    /// Distinct configurations tried.
    pub history_size: usize,

    /// Candidate filter threshold when the search ended, in meters.
    pub final_threshold: f64,

    /// Whether the run was cancelled early.
    pub cancelled: bool,

    /// Computation time in milliseconds.
    pub computation_time_ms: u64,

    /// Best fitness after each evaluation.
    pub fitness_history: Vec<f64>,

    /// Parent fitness after each evaluation.
    pub parent_fitness_history: Vec<f64>,
}

impl SearchReport {
    /// Returns true if at least one evaluation produced a distance.
    pub fn has_measurement(&self) -> bool {
        !self.best_fitness.is_failed()
    }

    /// Returns true if the budget was spent without cancellation.
    pub fn completed_normally(&self) -> bool {
        !self.cancelled
    }

    /// Fraction of evaluations that failed.
    pub fn failure_rate(&self) -> f64 {
        if self.evaluations == 0 {
            0.0
        } else {
            self.failed_evaluations as f64 / self.evaluations as f64
        }
    }
}
