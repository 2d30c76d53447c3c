//! Obstacle encodings: the 6-value search vector and the concrete box records
//! handed to the simulator.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::geometry::Point2D;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration values are snapped to 1/SCALE (a micrometer).
const SCALE: f64 = 1e6;

fn quantize(value: f64) -> f64 {
    // `+ 0.0` folds -0.0 into 0.0 so equal values hash equally.
    (value * SCALE).round() / SCALE + 0.0
}

/// Position and rotation of one obstacle inside a configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstaclePose {
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
}

impl ObstaclePose {
    /// Center of the obstacle.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Ordered 6-tuple `(x1, y1, r1, x2, y2, r2)` placing two obstacles.
///
/// Values are quantized on construction, so two configurations reached through
/// different sequences of steps compare and hash equal when they describe the
/// same placement.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "[f64; 6]", into = "[f64; 6]"))]
pub struct ObstacleConfiguration {
    values: [f64; 6],
}

impl ObstacleConfiguration {
    /// Number of parameters in a configuration.
    pub const LEN: usize = 6;

    /// Creates a configuration from its six values.
    pub fn new(values: [f64; 6]) -> Self {
        Self {
            values: values.map(quantize),
        }
    }

    /// Creates a configuration from two poses.
    pub fn from_poses(first: ObstaclePose, second: ObstaclePose) -> Self {
        Self::new([
            first.x,
            first.y,
            first.rotation,
            second.x,
            second.y,
            second.rotation,
        ])
    }

    /// Returns the raw values.
    pub fn values(&self) -> &[f64; 6] {
        &self.values
    }

    /// Returns the value at `index` (0..6).
    pub fn get(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Returns a copy with the value at `index` replaced.
    pub fn with_value(&self, index: usize, value: f64) -> Self {
        let mut values = self.values;
        values[index] = value;
        Self::new(values)
    }

    /// Pose of obstacle `i` (0 or 1).
    pub fn pose(&self, i: usize) -> ObstaclePose {
        ObstaclePose {
            x: self.values[3 * i],
            y: self.values[3 * i + 1],
            rotation: self.values[3 * i + 2],
        }
    }

    /// True if `index` addresses a rotation parameter.
    pub fn is_rotation_index(index: usize) -> bool {
        index % 3 == 2
    }
}

impl PartialEq for ObstacleConfiguration {
    fn eq(&self, other: &Self) -> bool {
        self.values
            .iter()
            .zip(other.values.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for ObstacleConfiguration {}

impl Hash for ObstacleConfiguration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for v in &self.values {
            v.to_bits().hash(state);
        }
    }
}

impl fmt::Debug for ObstacleConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl fmt::Display for ObstacleConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.values;
        write!(
            f,
            "[({:.2}, {:.2}, {:.0}°), ({:.2}, {:.2}, {:.0}°)]",
            v[0], v[1], v[2], v[3], v[4], v[5]
        )
    }
}

impl From<[f64; 6]> for ObstacleConfiguration {
    fn from(values: [f64; 6]) -> Self {
        Self::new(values)
    }
}

impl From<ObstacleConfiguration> for [f64; 6] {
    fn from(config: ObstacleConfiguration) -> Self {
        config.values
    }
}

/// Append-only record of every configuration tried during one run.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationHistory {
    seen: HashSet<ObstacleConfiguration>,
}

impl ConfigurationHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the configuration was already tried.
    pub fn contains(&self, config: &ObstacleConfiguration) -> bool {
        self.seen.contains(config)
    }

    /// Records a configuration. Returns false if it was already present.
    pub fn insert(&mut self, config: ObstacleConfiguration) -> bool {
        self.seen.insert(config)
    }

    /// Number of distinct configurations tried.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Iterates the recorded configurations in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &ObstacleConfiguration> {
        self.seen.iter()
    }
}

/// Fixed box dimensions shared by every generated obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObstacleDimensions {
    /// Extent along the rotated x axis, in meters.
    pub length: f64,
    /// Extent along the rotated y axis, in meters.
    pub width: f64,
    /// Vertical extent, in meters.
    pub height: f64,
    /// Base elevation, in meters.
    pub z: f64,
}

impl Default for ObstacleDimensions {
    fn default() -> Self {
        Self {
            length: 20.0,
            width: 2.0,
            height: 25.0,
            z: 0.0,
        }
    }
}

/// Concrete obstacle record consumed by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObstacleSpec {
    /// Center x, in meters.
    pub x: f64,
    /// Center y, in meters.
    pub y: f64,
    /// Base elevation, in meters.
    pub z: f64,
    /// Rotation about the vertical axis, in degrees.
    pub rotation: f64,
    /// Length, in meters.
    pub length: f64,
    /// Width, in meters.
    pub width: f64,
    /// Height, in meters.
    pub height: f64,
}

impl ObstacleSpec {
    /// Builds a spec from a pose and the fixed dimensions.
    pub fn from_pose(pose: ObstaclePose, dims: &ObstacleDimensions) -> Self {
        Self {
            x: pose.x,
            y: pose.y,
            z: dims.z,
            rotation: pose.rotation,
            length: dims.length,
            width: dims.width,
            height: dims.height,
        }
    }

    /// Center on the ground plane.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}
