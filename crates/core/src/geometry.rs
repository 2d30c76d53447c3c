//! Planar geometry primitives: points, the generation area and flight segments.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point on the ground plane, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2D {
    /// East coordinate.
    pub x: f64,
    /// North coordinate.
    pub y: f64,
}

impl Point2D {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Snaps both coordinates to the nearest multiple of `step`.
    pub fn snapped(&self, step: f64) -> Self {
        Self {
            x: (self.x / step).round() * step,
            y: (self.y / step).round() * step,
        }
    }

    /// Bit-exact key usable in hash sets. `-0.0` and `0.0` share a key.
    pub fn key(&self) -> (u64, u64) {
        ((self.x + 0.0).to_bits(), (self.y + 0.0).to_bits())
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangular region eligible for obstacle placement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationArea {
    /// Bottom-left corner.
    pub min: Point2D,
    /// Top-right corner.
    pub max: Point2D,
}

impl GenerationArea {
    /// Creates a generation area, rejecting empty or inverted bounds.
    pub fn new(min: Point2D, max: Point2D) -> Result<Self> {
        let area = Self { min, max };
        area.validate()?;
        Ok(area)
    }

    /// Validates that `min` is strictly below `max` on both axes.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.min.x, self.min.y, self.max.x, self.max.y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(Error::InvalidConfig(
                "generation area bounds must be finite".into(),
            ));
        }
        if self.min.x >= self.max.x || self.min.y >= self.max.y {
            return Err(Error::InvalidConfig(format!(
                "generation area min ({}, {}) must be below max ({}, {})",
                self.min.x, self.min.y, self.max.x, self.max.y
            )));
        }
        Ok(())
    }

    /// Returns true if the point lies inside or on the border of the area.
    pub fn contains(&self, p: &Point2D) -> bool {
        self.min.x <= p.x && p.x <= self.max.x && self.min.y <= p.y && p.y <= self.max.y
    }

    /// Width along x.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height along y.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Length of the diagonal; no point of the area is farther than this from
    /// any line crossing it.
    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    /// Center of the area.
    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }
}

impl Default for GenerationArea {
    fn default() -> Self {
        Self {
            min: Point2D::new(-40.0, 10.0),
            max: Point2D::new(30.0, 40.0),
        }
    }
}

/// Ordered pair of points describing one straight leg of the flight path.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlightSegment {
    /// Start of the leg.
    pub start: Point2D,
    /// End of the leg.
    pub end: Point2D,
}

impl FlightSegment {
    /// Creates a new segment.
    pub const fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Midpoint of the segment.
    pub fn midpoint(&self) -> Point2D {
        Point2D::new(
            (self.start.x + self.end.x) * 0.5,
            (self.start.y + self.end.y) * 0.5,
        )
    }

    /// True if both endpoints coincide.
    pub fn is_degenerate(&self) -> bool {
        self.length() <= f64::EPSILON
    }
}

impl From<(Point2D, Point2D)> for FlightSegment {
    fn from((start, end): (Point2D, Point2D)) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_rejects_inverted_bounds() {
        let err = GenerationArea::new(Point2D::new(10.0, 0.0), Point2D::new(-10.0, 5.0));
        assert!(matches!(err, Err(Error::InvalidConfig(_))));

        let flat = GenerationArea::new(Point2D::new(0.0, 5.0), Point2D::new(10.0, 5.0));
        assert!(flat.is_err());
    }

    #[test]
    fn test_area_contains_border() {
        let area = GenerationArea::default();
        assert!(area.contains(&Point2D::new(-40.0, 10.0)));
        assert!(area.contains(&Point2D::new(30.0, 40.0)));
        assert!(!area.contains(&Point2D::new(-40.01, 20.0)));
        assert!((area.diagonal() - 70.0_f64.hypot(30.0)).abs() < 1e-12);
    }

    #[test]
    fn test_point_key_ignores_signed_zero() {
        assert_eq!(Point2D::new(-0.0, 1.0).key(), Point2D::new(0.0, 1.0).key());
        assert_eq!(Point2D::new(2.4, -1.6).snapped(1.0), Point2D::new(2.0, -2.0));
    }

    #[test]
    fn test_segment_midpoint() {
        let seg = FlightSegment::new(Point2D::new(0.0, 0.0), Point2D::new(4.0, 2.0));
        assert_eq!(seg.midpoint(), Point2D::new(2.0, 1.0));
        assert!(!seg.is_degenerate());
    }
}
