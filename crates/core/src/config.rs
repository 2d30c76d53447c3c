//! Search configuration.
//!
//! Every tunable constant of the search lives in one immutable [`SearchConfig`]
//! passed to each component's constructor.

use crate::geometry::GenerationArea;
use crate::obstacle::ObstacleDimensions;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mutation operator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MutationOperator {
    /// Change one of the six parameters by a single grid step.
    #[default]
    UnitStep,
    /// Move or rotate a whole obstacle using vehicle-size displacements.
    Block,
}

/// Parameters of the golden-angle spiral that seeds candidate points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiralParams {
    /// Number of spiral points generated before clipping to the area.
    pub num_points: usize,
    /// Angle increment between consecutive points, in radians.
    pub golden_angle: f64,
    /// Radius increment between consecutive points, in meters.
    pub radius_increment: f64,
}

impl Default for SpiralParams {
    fn default() -> Self {
        Self {
            num_points: 3500,
            golden_angle: 0.1,
            radius_increment: 0.01,
        }
    }
}

/// Configuration shared by every component of the search.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchConfig {
    /// Placement region for both obstacles.
    pub area: GenerationArea,

    /// Spiral generation parameters.
    pub spiral: SpiralParams,

    /// Initial distance threshold for candidate filtering, in meters.
    pub threshold_distance: f64,

    /// Amount the threshold grows each time the candidate pool runs dry.
    pub threshold_increment: f64,

    /// Grid step for candidate snapping and unit-step moves, in meters.
    pub round_step: f64,

    /// Vehicle size used to scale block displacements, in meters.
    pub vehicle_size: f64,

    /// Block displacement multiples of `vehicle_size`.
    pub displacement_multiples: Vec<f64>,

    /// Fixed obstacle dimensions.
    pub obstacle: ObstacleDimensions,

    /// Rotation grid step, in degrees.
    pub angle_step: f64,

    /// Largest rotation on the grid, in degrees.
    pub max_rotation: f64,

    /// Mutation operator family.
    pub mutation_operator: MutationOperator,

    /// Attempts per mutation before a fresh parent is drawn.
    pub max_mutation_attempts: usize,

    /// Fresh parents a mutation may draw before the region is declared infeasible.
    pub max_mutation_restarts: usize,

    /// Consecutive rejected children before the search restarts.
    pub stagnation_limit: u32,

    /// Fitness below which a case is handed to persistence, in meters.
    pub interesting_distance: f64,

    /// Wall-clock deadline for a single simulation in milliseconds (0 = unlimited).
    pub evaluation_timeout_ms: u64,

    /// Wall-clock limit for a whole run in milliseconds (0 = budget only).
    pub time_limit_ms: u64,

    /// Seed for the search RNG (None = OS entropy).
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            area: GenerationArea::default(),
            spiral: SpiralParams::default(),
            threshold_distance: 3.0,
            threshold_increment: 1.0,
            round_step: 1.0,
            vehicle_size: 0.55,
            displacement_multiples: vec![-15.0, -10.0, -5.0, 5.0, 10.0, 15.0],
            obstacle: ObstacleDimensions::default(),
            angle_step: 10.0,
            max_rotation: 90.0,
            mutation_operator: MutationOperator::UnitStep,
            max_mutation_attempts: 1000,
            max_mutation_restarts: 50,
            stagnation_limit: 10,
            interesting_distance: 50.0,
            evaluation_timeout_ms: 10 * 60 * 1000,
            time_limit_ms: 0,
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the generation area.
    pub fn with_area(mut self, area: GenerationArea) -> Self {
        self.area = area;
        self
    }

    /// Sets the spiral parameters.
    pub fn with_spiral(mut self, spiral: SpiralParams) -> Self {
        self.spiral = spiral;
        self
    }

    /// Sets the initial candidate threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold_distance = threshold;
        self
    }

    /// Sets the obstacle dimensions.
    pub fn with_obstacle(mut self, obstacle: ObstacleDimensions) -> Self {
        self.obstacle = obstacle;
        self
    }

    /// Sets the rotation grid step.
    pub fn with_angle_step(mut self, step: f64) -> Self {
        self.angle_step = step;
        self
    }

    /// Sets the mutation operator family.
    pub fn with_mutation_operator(mut self, operator: MutationOperator) -> Self {
        self.mutation_operator = operator;
        self
    }

    /// Sets the mutation attempt and restart caps.
    pub fn with_mutation_limits(mut self, attempts: usize, restarts: usize) -> Self {
        self.max_mutation_attempts = attempts.max(1);
        self.max_mutation_restarts = restarts;
        self
    }

    /// Sets the stagnation limit.
    pub fn with_stagnation_limit(mut self, limit: u32) -> Self {
        self.stagnation_limit = limit.max(1);
        self
    }

    /// Sets the interesting-distance threshold.
    pub fn with_interesting_distance(mut self, distance: f64) -> Self {
        self.interesting_distance = distance;
        self
    }

    /// Sets the per-evaluation deadline in milliseconds.
    pub fn with_evaluation_timeout(mut self, ms: u64) -> Self {
        self.evaluation_timeout_ms = ms;
        self
    }

    /// Sets the run's wall-clock limit in milliseconds.
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Discrete rotation grid `{0, step, 2·step, …, ≤ max_rotation}`.
    pub fn angle_grid(&self) -> Vec<f64> {
        let steps = (self.max_rotation / self.angle_step).floor() as usize;
        (0..=steps).map(|i| i as f64 * self.angle_step).collect()
    }

    /// Block displacement set, in meters.
    pub fn displacement_set(&self) -> Vec<f64> {
        self.displacement_multiples
            .iter()
            .map(|m| m * self.vehicle_size)
            .collect()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.area.validate()?;

        let positive = [
            ("spiral.golden_angle", self.spiral.golden_angle),
            ("spiral.radius_increment", self.spiral.radius_increment),
            ("threshold_distance", self.threshold_distance),
            ("threshold_increment", self.threshold_increment),
            ("round_step", self.round_step),
            ("vehicle_size", self.vehicle_size),
            ("angle_step", self.angle_step),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        if self.spiral.num_points == 0 {
            return Err(Error::InvalidConfig(
                "spiral.num_points must be at least 1".into(),
            ));
        }
        if !(0.0..=90.0).contains(&self.max_rotation) {
            return Err(Error::InvalidConfig(format!(
                "max_rotation must lie in [0, 90], got {}",
                self.max_rotation
            )));
        }
        let dims = &self.obstacle;
        if [dims.length, dims.width, dims.height]
            .iter()
            .any(|d| !(d.is_finite() && *d >= 0.0))
        {
            return Err(Error::InvalidConfig(
                "obstacle dimensions must be non-negative and finite".into(),
            ));
        }
        if self.displacement_multiples.is_empty() {
            return Err(Error::InvalidConfig(
                "displacement_multiples must not be empty".into(),
            ));
        }
        if self.max_mutation_attempts == 0 {
            return Err(Error::InvalidConfig(
                "max_mutation_attempts must be at least 1".into(),
            ));
        }
        if self.stagnation_limit == 0 {
            return Err(Error::InvalidConfig(
                "stagnation_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
