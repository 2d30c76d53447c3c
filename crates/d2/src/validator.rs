//! Geometric validity of obstacle pairs.
//!
//! Obstacles are rotated rectangles on the ground plane. A pair is valid when
//! the two footprints do not intersect and both lie entirely inside the
//! generation area. Touching counts as intersecting.

use obstacle_search_core::{
    GenerationArea, ObstacleConfiguration, ObstacleDimensions, ObstaclePose, Point2D, Transform2D,
};

/// Corner ring and local axes of one footprint.
#[derive(Debug, Clone, Copy)]
pub struct Footprint {
    /// Corners in counter-clockwise order.
    pub corners: [(f64, f64); 4],
    /// Unit edge directions of the rectangle.
    pub axes: [(f64, f64); 2],
}

impl Footprint {
    /// Projects the corners onto `axis` and returns the covered interval.
    fn project(&self, axis: (f64, f64)) -> (f64, f64) {
        self.corners
            .iter()
            .map(|&(x, y)| x * axis.0 + y * axis.1)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            })
    }
}

/// Separating axis test on both rectangles' edge directions.
///
/// The intervals are closed, so rectangles sharing an edge or a corner are
/// reported as intersecting. Symmetric in its arguments.
pub fn footprints_intersect(a: &Footprint, b: &Footprint) -> bool {
    for axis in a.axes.iter().chain(b.axes.iter()) {
        let (a_lo, a_hi) = a.project(*axis);
        let (b_lo, b_hi) = b.project(*axis);
        if a_hi < b_lo || b_hi < a_lo {
            return false;
        }
    }
    true
}

/// Checks obstacle placements against the area and each other.
#[derive(Debug, Clone, Copy)]
pub struct GeometryValidator {
    area: GenerationArea,
    half_length: f64,
    half_width: f64,
}

impl GeometryValidator {
    /// Creates a validator for obstacles of the given dimensions.
    pub fn new(area: GenerationArea, dims: &ObstacleDimensions) -> Self {
        Self {
            area,
            half_length: 0.5 * dims.length,
            half_width: 0.5 * dims.width,
        }
    }

    /// Generation area checked against.
    pub fn area(&self) -> &GenerationArea {
        &self.area
    }

    /// Footprint of an obstacle placed at `pose`.
    pub fn footprint(&self, pose: &ObstaclePose) -> Footprint {
        let (hl, hw) = (self.half_length, self.half_width);
        let transform = Transform2D::from_degrees(pose.x, pose.y, pose.rotation);
        Footprint {
            corners: transform.transform_array([(hl, hw), (-hl, hw), (-hl, -hw), (hl, -hw)]),
            axes: transform.local_axes(),
        }
    }

    /// Corners of an obstacle placed at `pose`.
    pub fn corners(&self, pose: &ObstaclePose) -> [Point2D; 4] {
        self.footprint(pose).corners.map(Point2D::from)
    }

    /// Returns true if the two footprints intersect or touch.
    pub fn overlaps(&self, a: &ObstaclePose, b: &ObstaclePose) -> bool {
        footprints_intersect(&self.footprint(a), &self.footprint(b))
    }

    /// Returns true if every corner lies inside the area (bounds inclusive).
    pub fn inside_area(&self, pose: &ObstaclePose) -> bool {
        self.corners(pose).iter().all(|c| self.area.contains(c))
    }

    /// A configuration is valid when neither obstacle leaves the area and they
    /// do not intersect.
    pub fn is_valid(&self, config: &ObstacleConfiguration) -> bool {
        let first = config.pose(0);
        let second = config.pose(1);
        self.inside_area(&first) && self.inside_area(&second) && !self.overlaps(&first, &second)
    }
}
