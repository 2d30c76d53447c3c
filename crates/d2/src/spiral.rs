//! Golden-angle spiral candidate generation.
//!
//! Candidate anchor points are laid out on a deterministic spiral around the
//! midpoint of the reference segment, clipped to the generation area, and then
//! filtered down to the ones close to the line the vehicle flies along.
//!
//! # Algorithm
//!
//! Point `i` sits at radius `radius_increment · (i + 1)` and angle
//! `i · golden_angle` from the center. Filtering snaps each point to the
//! `round_step` grid, keeps it if its distance to the *infinite* line through
//! the segment is below the threshold and it is still inside the area, and
//! drops duplicates created by snapping.

use std::collections::HashSet;

use obstacle_search_core::{
    Error, FlightSegment, GenerationArea, Point2D, Result, SearchConfig, SpiralParams,
};

/// Distance from `point` to the infinite line through `segment`.
///
/// With the line through `(x2, y2)`-`(x3, y3)` written as `a·x + b·y + c = 0`
/// (`a = y3 − y2`, `b = x2 − x3`, `c = x3·y2 − x2·y3`) the distance is
/// `|a·x1 + b·y1 + c| / √(a² + b²)`. A degenerate segment falls back to the
/// distance to its single point.
pub fn distance_to_line(point: &Point2D, segment: &FlightSegment) -> f64 {
    let (x1, y1) = (point.x, point.y);
    let (x2, y2) = (segment.start.x, segment.start.y);
    let (x3, y3) = (segment.end.x, segment.end.y);

    let a = y3 - y2;
    let b = x2 - x3;
    let c = x3 * y2 - x2 * y3;

    let norm = a.hypot(b);
    if norm <= f64::EPSILON {
        return point.distance_to(&segment.start);
    }
    (a * x1 + b * y1 + c).abs() / norm
}

/// Generates the spiral around `center`, keeping points inside `area`.
pub fn generate(center: Point2D, area: &GenerationArea, params: &SpiralParams) -> Vec<Point2D> {
    (0..params.num_points)
        .filter_map(|i| {
            let radius = params.radius_increment * (i + 1) as f64;
            let theta = i as f64 * params.golden_angle;
            let (sin, cos) = theta.sin_cos();
            let p = Point2D::new(center.x + radius * cos, center.y + radius * sin);
            area.contains(&p).then_some(p)
        })
        .collect()
}

/// Filters spiral points down to snapped, deduplicated candidates near the segment.
///
/// The output keeps the order in which points first appear. Snapping happens
/// before the distance test, so filtering an already-filtered set is a no-op.
pub fn filter(
    points: &[Point2D],
    segment: &FlightSegment,
    threshold: f64,
    area: &GenerationArea,
    round_step: f64,
) -> Vec<Point2D> {
    let mut seen = HashSet::new();
    points
        .iter()
        .map(|p| p.snapped(round_step))
        .filter(|p| distance_to_line(p, segment) < threshold && area.contains(p))
        .filter(|p| seen.insert(p.key()))
        .collect()
}

/// Spiral candidate source for one search run.
#[derive(Debug, Clone)]
pub struct SpiralGenerator {
    center: Point2D,
    area: GenerationArea,
    segment: FlightSegment,
    round_step: f64,
    points: Vec<Point2D>,
    threshold: f64,
    candidates: Vec<Point2D>,
}

impl SpiralGenerator {
    /// Builds the spiral around the segment midpoint and filters it at the
    /// configured initial threshold.
    ///
    /// Fails with [`Error::EmptySpiral`] if no spiral point falls inside the area.
    pub fn new(config: &SearchConfig, segment: FlightSegment) -> Result<Self> {
        let center = segment.midpoint();
        let points = generate(center, &config.area, &config.spiral);
        if points.is_empty() {
            return Err(Error::EmptySpiral {
                num_points: config.spiral.num_points,
            });
        }

        let candidates = filter(
            &points,
            &segment,
            config.threshold_distance,
            &config.area,
            config.round_step,
        );
        log::info!(
            "Spiral around ({:.2}, {:.2}): {} points in area, {} candidates within {:.1}m",
            center.x,
            center.y,
            points.len(),
            candidates.len(),
            config.threshold_distance
        );

        Ok(Self {
            center,
            area: config.area,
            segment,
            round_step: config.round_step,
            points,
            threshold: config.threshold_distance,
            candidates,
        })
    }

    /// Spiral center.
    pub fn center(&self) -> Point2D {
        self.center
    }

    /// Reference segment.
    pub fn segment(&self) -> &FlightSegment {
        &self.segment
    }

    /// Full spiral, clipped to the area.
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Candidates at the current threshold.
    pub fn candidates(&self) -> &[Point2D] {
        &self.candidates
    }

    /// Current filter threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Re-filters the full spiral at a strictly larger threshold.
    pub fn recalculate_with_threshold(&mut self, threshold: f64) -> Result<&[Point2D]> {
        if !(threshold > self.threshold) {
            return Err(Error::InvalidConfig(format!(
                "new threshold {threshold} must exceed current threshold {}",
                self.threshold
            )));
        }
        self.threshold = threshold;
        self.candidates = filter(
            &self.points,
            &self.segment,
            threshold,
            &self.area,
            self.round_step,
        );
        log::debug!(
            "Re-filtered spiral at {:.1}m: {} candidates",
            threshold,
            self.candidates.len()
        );
        Ok(&self.candidates)
    }
}
