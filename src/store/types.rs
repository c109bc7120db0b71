//! Domain types held by the result store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geom::{ClusterBounds, Color, Vertex3, color_for};

/// Active dimension mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    /// Smallest vertex count the generator accepts in this mode.
    #[must_use]
    pub const fn min_vertices(self) -> usize {
        match self {
            Self::Two => 3,
            Self::Three => 4,
        }
    }

    #[must_use]
    pub const fn is_planar(self) -> bool {
        matches!(self, Self::Two)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Two => f.write_str("TWO"),
            Self::Three => f.write_str("THREE"),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TWO" | "2D" | "2" => Ok(Self::Two),
            "THREE" | "3D" | "3" => Ok(Self::Three),
            other => Err(format!("unknown dimension `{other}`")),
        }
    }
}

/// Selects whether triangulation runs on raw vertices or on the clustering
/// pipeline's simplified output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriangulationMethod {
    Direct,
    VertexClustering,
}

impl fmt::Display for TriangulationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("DIRECT"),
            Self::VertexClustering => f.write_str("VERTEX_CLUSTERING"),
        }
    }
}

impl FromStr for TriangulationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "DIRECT" => Ok(Self::Direct),
            "VERTEX_CLUSTERING" => Ok(Self::VertexClustering),
            other => Err(format!("unknown triangulation method `{other}`")),
        }
    }
}

/// Progress of the clustering pipeline for the current vertex set.
///
/// The stage flags are projections of this single value, so simplification
/// can never be observed as complete without a clustering result.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    #[default]
    Idle,
    Clustered,
    Simplified,
    Triangulated,
}

impl Stage {
    #[must_use]
    pub fn is_clustering_complete(self) -> bool {
        self >= Self::Clustered
    }

    #[must_use]
    pub fn is_simplification_complete(self) -> bool {
        self >= Self::Simplified
    }
}

/// Group of nearby vertices produced by the geometry engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub vertices: Vec<Vertex3>,
    pub bounds: ClusterBounds,
}

impl Cluster {
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Visualization-facing projection of a [`Cluster`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRectangle {
    pub id: String,
    pub bounds: ClusterBounds,
    pub vertex_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl ClusterRectangle {
    /// The explicit color when the engine supplied one, otherwise the
    /// identifier-derived fallback.
    #[must_use]
    pub fn display_color(&self) -> Color {
        self.color.unwrap_or_else(|| color_for(&self.id))
    }
}

impl From<&Cluster> for ClusterRectangle {
    fn from(cluster: &Cluster) -> Self {
        Self {
            id: cluster.id.clone(),
            bounds: cluster.bounds,
            vertex_count: cluster.vertices.len(),
            color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_flags_are_monotonic_projections() {
        assert!(!Stage::Idle.is_clustering_complete());
        assert!(Stage::Clustered.is_clustering_complete());
        assert!(!Stage::Clustered.is_simplification_complete());
        assert!(Stage::Simplified.is_simplification_complete());
        assert!(Stage::Triangulated.is_simplification_complete());
        assert!(Stage::Triangulated.is_clustering_complete());
    }

    #[test]
    fn parses_method_and_dimension_spellings() {
        assert_eq!(
            "vertex-clustering".parse::<TriangulationMethod>(),
            Ok(TriangulationMethod::VertexClustering)
        );
        assert_eq!("DIRECT".parse::<TriangulationMethod>(), Ok(TriangulationMethod::Direct));
        assert!("e-circles".parse::<TriangulationMethod>().is_err());
        assert_eq!("2d".parse::<Dimension>(), Ok(Dimension::Two));
        assert_eq!("THREE".parse::<Dimension>(), Ok(Dimension::Three));
    }

    #[test]
    fn rectangle_falls_back_to_hashed_color() {
        let cluster = Cluster {
            id: "cluster_0_0".to_owned(),
            vertices: vec![Vertex3::planar(0.1, 0.2), Vertex3::planar(0.3, 0.4)],
            bounds: ClusterBounds::new(0.0, 1.0, 0.0, 1.0),
        };
        let mut rect = ClusterRectangle::from(&cluster);
        assert_eq!(rect.vertex_count, 2);
        assert_eq!(rect.display_color(), color_for("cluster_0_0"));

        rect.color = Some(Color::new(1, 2, 3));
        assert_eq!(rect.display_color(), Color::new(1, 2, 3));
    }
}
