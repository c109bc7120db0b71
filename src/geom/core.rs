use std::ops::Sub;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Vertex3
// ─────────────────────────────────────────────────────────────────────────────

/// A point in viewport space.
///
/// The horizontal plane is spanned by `x` and `z`; `y` is the up axis. Un-lifted
/// vertices in 2-D mode keep `y == 0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vertex3 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A vertex on the ground plane (`y = 0`).
    #[must_use]
    pub const fn planar(x: f64, z: f64) -> Self {
        Self::new(x, 0.0, z)
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Projection onto the horizontal plane as `[x, z]`.
    #[must_use]
    pub const fn to_planar(self) -> [f64; 2] {
        [self.x, self.z]
    }

    /// Paraboloid lift: `(x, y, z) -> (x, x² + z², z)`.
    #[must_use]
    pub fn lifted(self) -> Self {
        Self::new(self.x, self.x * self.x + self.z * self.z, self.z)
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Vertex3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Vertex3> for [f64; 3] {
    fn from(v: Vertex3) -> Self {
        v.to_array()
    }
}

/// `[x, z]` pairs map onto the ground plane.
impl From<[f64; 2]> for Vertex3 {
    fn from(value: [f64; 2]) -> Self {
        Self::planar(value[0], value[1])
    }
}

impl Sub for Vertex3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Triangle3 / Tetrahedron3
// ─────────────────────────────────────────────────────────────────────────────

/// Triangle with its corners owned by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle3 {
    pub id: String,
    pub a: Vertex3,
    pub b: Vertex3,
    pub c: Vertex3,
}

impl Triangle3 {
    #[must_use]
    pub fn new(id: impl Into<String>, a: Vertex3, b: Vertex3, c: Vertex3) -> Self {
        Self {
            id: id.into(),
            a,
            b,
            c,
        }
    }

    #[must_use]
    pub const fn corners(&self) -> [Vertex3; 3] {
        [self.a, self.b, self.c]
    }

    /// Lifts every corner onto the paraboloid; the id gains a `lifted-` prefix.
    #[must_use]
    pub fn lifted(&self) -> Self {
        Self {
            id: format!("lifted-{}", self.id),
            a: self.a.lifted(),
            b: self.b.lifted(),
            c: self.c.lifted(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tetrahedron3 {
    pub id: String,
    pub a: Vertex3,
    pub b: Vertex3,
    pub c: Vertex3,
    pub d: Vertex3,
}

impl Tetrahedron3 {
    #[must_use]
    pub fn new(id: impl Into<String>, a: Vertex3, b: Vertex3, c: Vertex3, d: Vertex3) -> Self {
        Self {
            id: id.into(),
            a,
            b,
            c,
            d,
        }
    }

    #[must_use]
    pub const fn corners(&self) -> [Vertex3; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Signed volume times six. Positive when `d` lies on the side of `abc`
    /// that the right-handed normal points to.
    #[must_use]
    pub fn orientation(&self) -> f64 {
        orient3d(self.a, self.b, self.c, self.d)
    }
}

/// Six times the signed volume of the tetrahedron `abcd`.
#[must_use]
pub fn orient3d(a: Vertex3, b: Vertex3, c: Vertex3, d: Vertex3) -> f64 {
    (b - a).cross(c - a).dot(d - a)
}

/// Applies the paraboloid lift to every vertex.
#[must_use]
pub fn lift_vertices(vertices: &[Vertex3]) -> Vec<Vertex3> {
    vertices.iter().map(|v| v.lifted()).collect()
}

/// Lifts each triangle independently.
#[must_use]
pub fn lift_triangles(triangles: &[Triangle3]) -> Vec<Triangle3> {
    triangles.iter().map(Triangle3::lifted).collect()
}
