mod bounds;
mod color;
mod core;

pub use bounds::{BoundsError, ClusterBounds, PlaneAxis};
pub use color::{BRIGHTNESS_FLOOR, Color, ColorParseError, color_for, hsl_to_rgb, palette};
pub use core::{Tetrahedron3, Triangle3, Vertex3, lift_triangles, lift_vertices, orient3d};
