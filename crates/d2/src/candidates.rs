//! Candidate pool for drawing fresh parents.
//!
//! A fresh parent places the two obstacles on two distinct spiral candidates.
//! Every unordered pair is handed out at most once per run; once all pairs at
//! the current threshold are used, the spiral is re-filtered at a larger
//! threshold.

use std::collections::HashSet;

use rand::prelude::*;

use obstacle_search_core::{
    Error, ObstacleConfiguration, ObstaclePose, Point2D, Result, SearchConfig,
};

use crate::spiral::SpiralGenerator;

/// Random draws tried before falling back to enumerating the free pairs.
const SAMPLE_TRIES: usize = 64;

type PairKey = ((u64, u64), (u64, u64));

fn pair_key(a: &Point2D, b: &Point2D) -> PairKey {
    let (ka, kb) = (a.key(), b.key());
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

/// Spiral candidates plus the set of point pairs already handed out.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    spiral: SpiralGenerator,
    used: HashSet<PairKey>,
    threshold_increment: f64,
    max_threshold: f64,
    angle_grid: Vec<f64>,
    draws: u64,
}

impl CandidatePool {
    /// Wraps a spiral generator.
    pub fn new(spiral: SpiralGenerator, config: &SearchConfig) -> Self {
        Self {
            spiral,
            used: HashSet::new(),
            threshold_increment: config.threshold_increment,
            max_threshold: config.area.diagonal(),
            angle_grid: config.angle_grid(),
            draws: 0,
        }
    }

    /// Underlying spiral.
    pub fn spiral(&self) -> &SpiralGenerator {
        &self.spiral
    }

    /// Current filter threshold.
    pub fn threshold(&self) -> f64 {
        self.spiral.threshold()
    }

    /// Candidates at the current threshold.
    pub fn candidates(&self) -> &[Point2D] {
        self.spiral.candidates()
    }

    /// Pairs handed out so far.
    pub fn used_pairs(&self) -> usize {
        self.used.len()
    }

    /// Successful draws so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    fn sample_free_pair<R: Rng>(&self, rng: &mut R) -> Option<(Point2D, Point2D)> {
        let points = self.spiral.candidates();
        if points.len() < 2 {
            return None;
        }

        for _ in 0..SAMPLE_TRIES {
            let pair: Vec<&Point2D> = points.choose_multiple(rng, 2).collect();
            let (a, b) = (*pair[0], *pair[1]);
            if !self.used.contains(&pair_key(&a, &b)) {
                return Some((a, b));
            }
        }

        let free: Vec<(usize, usize)> = (0..points.len())
            .flat_map(|i| (i + 1..points.len()).map(move |j| (i, j)))
            .filter(|&(i, j)| !self.used.contains(&pair_key(&points[i], &points[j])))
            .collect();
        free.choose(rng).map(|&(i, j)| {
            if rng.gen_bool(0.5) {
                (points[i], points[j])
            } else {
                (points[j], points[i])
            }
        })
    }

    /// Draws an unused unordered pair of distinct candidates.
    ///
    /// Grows the threshold by `threshold_increment` while no free pair is
    /// left. Fails with [`Error::CandidatePoolExhausted`] once the threshold
    /// would exceed the area diagonal.
    pub fn draw_pair<R: Rng>(&mut self, rng: &mut R) -> Result<(Point2D, Point2D)> {
        loop {
            if let Some((a, b)) = self.sample_free_pair(rng) {
                self.used.insert(pair_key(&a, &b));
                self.draws += 1;
                return Ok((a, b));
            }

            let current = self.spiral.threshold();
            let next = current + self.threshold_increment;
            if next > self.max_threshold {
                return Err(Error::CandidatePoolExhausted { threshold: current });
            }
            log::info!(
                "Candidate pairs exhausted at {:.1}m, widening to {:.1}m",
                current,
                next
            );
            self.spiral.recalculate_with_threshold(next)?;
        }
    }

    /// Draws a naive parent: an unused pair with random grid rotations.
    ///
    /// The result is not checked for validity.
    pub fn draw_configuration<R: Rng>(&mut self, rng: &mut R) -> Result<ObstacleConfiguration> {
        let (a, b) = self.draw_pair(rng)?;
        let mut rotation = || self.angle_grid.choose(rng).copied().unwrap_or(0.0);
        let first = ObstaclePose {
            x: a.x,
            y: a.y,
            rotation: rotation(),
        };
        let second = ObstaclePose {
            x: b.x,
            y: b.y,
            rotation: rotation(),
        };
        Ok(ObstacleConfiguration::from_poses(first, second))
    }
}
