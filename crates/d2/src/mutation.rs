//! Neighbor generation for the search.
//!
//! A mutation walks away from the parent one step at a time on a working copy.
//! Each step is checked; the first configuration that is geometrically valid
//! and has never been tried is recorded in the history and returned. Invalid
//! intermediate states are kept on the working copy, so the walk can cross
//! them on its way to a valid placement.

use rand::prelude::*;

use obstacle_search_core::{
    ConfigurationHistory, Error, MutationOperator, ObstacleConfiguration, Result, SearchConfig,
};

use crate::validator::GeometryValidator;

/// Block-operator action probabilities: move first, rotate first, move second,
/// rotate second.
const BLOCK_WEIGHTS: [f64; 4] = [0.3, 0.2, 0.3, 0.2];

/// One block-operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockAction {
    Move(usize),
    Rotate(usize),
}

impl BlockAction {
    fn sample<R: Rng>(rng: &mut R) -> Self {
        let r: f64 = rng.gen();
        let mut acc = 0.0;
        for (i, w) in BLOCK_WEIGHTS.iter().enumerate() {
            acc += w;
            if r < acc {
                return Self::from_index(i);
            }
        }
        Self::from_index(BLOCK_WEIGHTS.len() - 1)
    }

    fn from_index(i: usize) -> Self {
        match i {
            0 => Self::Move(0),
            1 => Self::Rotate(0),
            2 => Self::Move(1),
            _ => Self::Rotate(1),
        }
    }
}

/// Produces valid, never-seen neighbors of a parent configuration.
#[derive(Debug, Clone)]
pub struct MutationEngine {
    operator: MutationOperator,
    round_step: f64,
    angle_grid: Vec<f64>,
    displacements: Vec<f64>,
    max_attempts: usize,
    max_restarts: usize,
    validator: GeometryValidator,
    reseeds: u32,
}

impl MutationEngine {
    /// Creates an engine from the search configuration.
    pub fn new(config: &SearchConfig, validator: GeometryValidator) -> Self {
        Self {
            operator: config.mutation_operator,
            round_step: config.round_step,
            angle_grid: config.angle_grid(),
            displacements: config.displacement_set(),
            max_attempts: config.max_mutation_attempts.max(1),
            max_restarts: config.max_mutation_restarts,
            validator,
            reseeds: 0,
        }
    }

    /// Operator family in use.
    pub fn operator(&self) -> MutationOperator {
        self.operator
    }

    /// Fresh parents drawn so far by [`Self::mutate_or_reseed`].
    pub fn reseeds(&self) -> u32 {
        self.reseeds
    }

    /// Validator used to accept steps.
    pub fn validator(&self) -> &GeometryValidator {
        &self.validator
    }

    fn random_angle<R: Rng>(&self, rng: &mut R) -> f64 {
        self.angle_grid.choose(rng).copied().unwrap_or(0.0)
    }

    fn random_displacement<R: Rng>(&self, rng: &mut R) -> f64 {
        self.displacements.choose(rng).copied().unwrap_or(0.0)
    }

    /// Applies one step of the configured operator.
    pub fn step<R: Rng>(
        &self,
        config: &ObstacleConfiguration,
        rng: &mut R,
    ) -> ObstacleConfiguration {
        match self.operator {
            MutationOperator::UnitStep => self.unit_step(config, rng),
            MutationOperator::Block => self.block_step(config, rng),
        }
    }

    /// Changes one of the six parameters: a position moves by one grid step,
    /// a rotation is resampled from the angle grid.
    fn unit_step<R: Rng>(
        &self,
        config: &ObstacleConfiguration,
        rng: &mut R,
    ) -> ObstacleConfiguration {
        let index = rng.gen_range(0..ObstacleConfiguration::LEN);
        let value = if ObstacleConfiguration::is_rotation_index(index) {
            self.random_angle(rng)
        } else if rng.gen_bool(0.5) {
            config.get(index) + self.round_step
        } else {
            config.get(index) - self.round_step
        };
        config.with_value(index, value)
    }

    /// Moves or rotates a whole obstacle.
    fn block_step<R: Rng>(
        &self,
        config: &ObstacleConfiguration,
        rng: &mut R,
    ) -> ObstacleConfiguration {
        match BlockAction::sample(rng) {
            BlockAction::Move(i) => {
                let dx = self.random_displacement(rng);
                let dy = self.random_displacement(rng);
                config
                    .with_value(3 * i, config.get(3 * i) + dx)
                    .with_value(3 * i + 1, config.get(3 * i + 1) + dy)
            }
            BlockAction::Rotate(i) => config.with_value(3 * i + 2, self.random_angle(rng)),
        }
    }

    /// Walks from `parent` until a valid configuration missing from `history`
    /// is found, or the attempt budget runs out.
    ///
    /// The returned configuration has already been added to `history`.
    pub fn mutate<R: Rng>(
        &self,
        parent: &ObstacleConfiguration,
        history: &mut ConfigurationHistory,
        rng: &mut R,
    ) -> Option<ObstacleConfiguration> {
        let mut working = *parent;
        for _ in 0..self.max_attempts {
            working = self.step(&working, rng);
            if self.validator.is_valid(&working) && history.insert(working) {
                return Some(working);
            }
        }
        None
    }

    /// Like [`Self::mutate`], but draws a fresh parent through `reseed` each
    /// time the attempts run out.
    ///
    /// Fails with [`Error::NoFeasibleRegion`] once `max_mutation_restarts`
    /// fresh parents have been exhausted as well.
    pub fn mutate_or_reseed<R, F>(
        &mut self,
        parent: &ObstacleConfiguration,
        history: &mut ConfigurationHistory,
        rng: &mut R,
        mut reseed: F,
    ) -> Result<ObstacleConfiguration>
    where
        R: Rng,
        F: FnMut(&mut R) -> Result<ObstacleConfiguration>,
    {
        let mut current = *parent;
        let mut restarts = 0usize;
        loop {
            if let Some(child) = self.mutate(&current, history, rng) {
                return Ok(child);
            }
            if restarts >= self.max_restarts {
                return Err(Error::NoFeasibleRegion { restarts });
            }
            restarts += 1;
            self.reseeds += 1;
            log::warn!(
                "No valid unseen neighbor of {} after {} attempts, drawing a fresh parent ({}/{})",
                current,
                self.max_attempts,
                restarts,
                self.max_restarts
            );
            current = reseed(rng)?;
        }
    }
}
