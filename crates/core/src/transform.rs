//! Rigid 2D transforms used to place obstacle footprints on the ground plane.

use nalgebra::{Isometry2, Point2, RealField, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D rigid transformation (rotation about the origin, then translation).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform2D<S: RealField + Copy> {
    /// Translation in x direction.
    pub tx: S,
    /// Translation in y direction.
    pub ty: S,
    /// Rotation angle in radians.
    pub angle: S,
}

impl<S: RealField + Copy> Transform2D<S> {
    /// Creates a new identity transform.
    pub fn identity() -> Self {
        Self {
            tx: S::zero(),
            ty: S::zero(),
            angle: S::zero(),
        }
    }

    /// Creates a new transform with both translation and rotation.
    pub fn new(tx: S, ty: S, angle: S) -> Self {
        Self { tx, ty, angle }
    }

    /// Converts to a nalgebra Isometry2.
    pub fn to_isometry(&self) -> Isometry2<S> {
        Isometry2::new(Vector2::new(self.tx, self.ty), self.angle)
    }

    /// Transforms a 2D point.
    pub fn transform_point(&self, x: S, y: S) -> (S, S) {
        let p = self.to_isometry().transform_point(&Point2::new(x, y));
        (p.x, p.y)
    }

    /// Transforms a fixed-size set of points in one pass.
    pub fn transform_array<const N: usize>(&self, points: [(S, S); N]) -> [(S, S); N] {
        let iso = self.to_isometry();
        points.map(|(x, y)| {
            let p = iso.transform_point(&Point2::new(x, y));
            (p.x, p.y)
        })
    }

    /// Unit vectors of the rotated local x and y axes.
    ///
    /// These never degenerate, whatever the extent of the shape being placed.
    pub fn local_axes(&self) -> [(S, S); 2] {
        let (sin, cos) = self.angle.sin_cos();
        [(cos, sin), (-sin, cos)]
    }
}

impl Transform2D<f64> {
    /// Creates a placement transform from a center and a rotation in degrees.
    pub fn from_degrees(x: f64, y: f64, rotation_deg: f64) -> Self {
        Self::new(x, y, rotation_deg.to_radians())
    }
}

impl<S: RealField + Copy> Default for Transform2D<S> {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotation_then_translation() {
        let t = Transform2D::new(10.0, 0.0, FRAC_PI_2);
        let (x, y) = t.transform_point(1.0, 0.0);
        assert_relative_eq!(x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_degrees_matches_radians() {
        let t = Transform2D::from_degrees(0.0, 0.0, 90.0);
        let [(ax, ay), (bx, by)] = t.local_axes();
        assert_relative_eq!(ax, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ay, 1.0, epsilon = 1e-12);
        assert_relative_eq!(bx, -1.0, epsilon = 1e-12);
        assert_relative_eq!(by, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_array_identity() {
        let t: Transform2D<f64> = Transform2D::identity();
        let pts = t.transform_array([(1.0, 2.0), (-3.0, 4.0)]);
        assert_eq!(pts, [(1.0, 2.0), (-3.0, 4.0)]);
    }
}
