//! Rectangular cluster bounds in the horizontal (x/z) plane.
//!
//! Derivations never repair their input: a bound with `min > max` yields a
//! negative width or height, and [`ClusterBounds::validate`] reports it as a
//! [`BoundsError`]. Zero-area bounds are valid.

use serde::{Deserialize, Serialize};

use super::core::Vertex3;

/// Axis of the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneAxis {
    X,
    Z,
}

impl std::fmt::Display for PlaneAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => f.write_str("x"),
            Self::Z => f.write_str("z"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    #[error("bound is inverted on the {axis} axis: min {min} > max {max}")]
    Inverted { axis: PlaneAxis, min: f64, max: f64 },
    #[error("bound has a non-finite coordinate")]
    NonFinite,
}

/// Canonical flat bound representation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl ClusterBounds {
    #[must_use]
    pub const fn new(min_x: f64, max_x: f64, min_z: f64, max_z: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Builds the flat form from a bottom-left / top-right corner pair.
    #[must_use]
    pub const fn from_corners(bottom_left: Vertex3, top_right: Vertex3) -> Self {
        Self::new(bottom_left.x, top_right.x, bottom_left.z, top_right.z)
    }

    /// Tightest bound around the given vertices, or `None` when empty.
    #[must_use]
    pub fn enclosing(vertices: &[Vertex3]) -> Option<Self> {
        let first = vertices.first()?;
        let mut bounds = Self::new(first.x, first.x, first.z, first.z);
        for v in &vertices[1..] {
            bounds.min_x = bounds.min_x.min(v.x);
            bounds.max_x = bounds.max_x.max(v.x);
            bounds.min_z = bounds.min_z.min(v.z);
            bounds.max_z = bounds.max_z.max(v.z);
        }
        Some(bounds)
    }

    /// Midpoint of each axis range as `(x, z)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }

    /// `(width, height)` as `max - min` per axis. Negative for malformed input.
    #[must_use]
    pub fn dimensions(&self) -> (f64, f64) {
        (self.max_x - self.min_x, self.max_z - self.min_z)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.dimensions().0
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.dimensions().1
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        let (width, height) = self.dimensions();
        width * height
    }

    /// Inclusive containment test on the horizontal plane.
    #[must_use]
    pub fn contains(&self, x: f64, z: f64) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    /// Corners in ring order: bottom-left, bottom-right, top-right, top-left.
    #[must_use]
    pub fn corners(&self, y: f64) -> [Vertex3; 4] {
        [
            Vertex3::new(self.min_x, y, self.min_z),
            Vertex3::new(self.max_x, y, self.min_z),
            Vertex3::new(self.max_x, y, self.max_z),
            Vertex3::new(self.min_x, y, self.max_z),
        ]
    }

    pub fn validate(&self) -> Result<(), BoundsError> {
        let coords = [self.min_x, self.max_x, self.min_z, self.max_z];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(BoundsError::NonFinite);
        }
        if self.min_x > self.max_x {
            return Err(BoundsError::Inverted {
                axis: PlaneAxis::X,
                min: self.min_x,
                max: self.max_x,
            });
        }
        if self.min_z > self.max_z {
            return Err(BoundsError::Inverted {
                axis: PlaneAxis::Z,
                min: self.min_z,
                max: self.max_z,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivations_on_regular_bound() {
        let b = ClusterBounds::new(-1.0, 3.0, 2.0, 2.5);
        assert_eq!(b.center(), (1.0, 2.25));
        assert_eq!(b.dimensions(), (4.0, 0.5));
        assert_eq!(b.area(), 2.0);
        assert!(b.is_well_formed());
    }

    #[test]
    fn degenerate_bound_has_zero_area() {
        let b = ClusterBounds::new(1.0, 1.0, -2.0, 5.0);
        assert_eq!(b.width(), 0.0);
        assert_eq!(b.area(), 0.0);
        assert_eq!(b.center(), (1.0, 1.5));
        assert!(b.validate().is_ok());
    }

    #[test]
    fn inverted_bound_surfaces_negative_width() {
        let b = ClusterBounds::new(2.0, 1.0, 0.0, 1.0);
        assert_eq!(b.width(), -1.0);
        assert_eq!(b.area(), -1.0);
        assert_eq!(
            b.validate(),
            Err(BoundsError::Inverted {
                axis: PlaneAxis::X,
                min: 2.0,
                max: 1.0
            })
        );
    }

    #[test]
    fn corner_form_and_enclosing_agree() {
        let from_corners =
            ClusterBounds::from_corners(Vertex3::planar(-1.0, -2.0), Vertex3::planar(1.0, 3.0));
        let enclosing = ClusterBounds::enclosing(&[
            Vertex3::planar(0.0, 3.0),
            Vertex3::planar(-1.0, 0.0),
            Vertex3::planar(1.0, -2.0),
        ])
        .expect("non-empty input");
        assert_eq!(from_corners, enclosing);
        assert!(ClusterBounds::enclosing(&[]).is_none());
    }

    #[test]
    fn contains_is_inclusive() {
        let b = ClusterBounds::new(0.0, 1.0, 0.0, 1.0);
        assert!(b.contains(0.0, 1.0));
        assert!(b.contains(0.5, 0.5));
        assert!(!b.contains(1.0001, 0.5));
    }
}
