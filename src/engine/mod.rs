//! Boundary to the geometry engine.
//!
//! The engine computes triangulations, tetrahedralizations, clusters and
//! simplified vertex sets. In the browser it lives behind an asynchronous
//! command bridge; natively it is any [`GeometryEngine`] implementation, such as
//! the in-process [`LocalEngine`].

mod local;

use serde::{Deserialize, Serialize};

use crate::geom::{Tetrahedron3, Triangle3, Vertex3};
use crate::store::{Cluster, ClusterRectangle};

pub use local::LocalEngine;

/// Fouttype voor engine-aanroepen.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("grid size must be a positive finite number, got {0}")]
    InvalidGridSize(f64),
    #[error("{operation} needs at least {required} vertices, got {actual}")]
    Degenerate {
        operation: &'static str,
        required: usize,
        actual: usize,
    },
    #[error("epsilon must be a non-negative finite number, got {0}")]
    InvalidEpsilon(f64),
    /// The Delaunay kernel refused the vertex set.
    #[error("{operation} failed: {message}")]
    Kernel {
        operation: &'static str,
        message: String,
    },
    #[error("No clusters provided for simplification")]
    NoClusters,
    #[error("vertex {index} has a non-finite coordinate")]
    NonFiniteVertex { index: usize },
    /// Failure reported by a remote backend, carried as its message.
    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriangulationRequest {
    pub vertices: Vec<Vertex3>,
    pub epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriangulationResult {
    pub triangles: Vec<Triangle3>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TetrahedralizationResult {
    pub tetrahedra: Vec<Tetrahedron3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringRequest {
    pub vertices: Vec<Vertex3>,
    pub grid_size: f64,
}

/// Clusters, optionally with precomputed rectangles. When `cluster_rectangles`
/// is empty the rectangles are derived from the clusters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringResult {
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub cluster_rectangles: Vec<ClusterRectangle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplificationRequest {
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplificationResult {
    pub simplified_vertices: Vec<Vertex3>,
}

/// Serializable request payload handed to the front-end bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "request", rename_all = "camelCase")]
pub enum EngineRequest {
    Triangulate(TriangulationRequest),
    Tetrahedralize(TriangulationRequest),
    #[serde(rename = "cluster2d")]
    Cluster(ClusteringRequest),
    #[serde(rename = "simplify2d")]
    Simplify(SimplificationRequest),
}

impl EngineRequest {
    /// Name of the backend command that serves this request; matches the
    /// serialized `command` tag.
    #[must_use]
    pub fn command(&self) -> &'static str {
        match self {
            Self::Triangulate(_) => "triangulate",
            Self::Tetrahedralize(_) => "tetrahedralize",
            Self::Cluster(_) => "cluster2d",
            Self::Simplify(_) => "simplify2d",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "camelCase")]
pub enum EngineResponse {
    Triangulated(TriangulationResult),
    Tetrahedralized(TetrahedralizationResult),
    Clustered(ClusteringResult),
    Simplified(SimplificationResult),
}

impl EngineResponse {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Triangulated(_) => "triangulated",
            Self::Tetrahedralized(_) => "tetrahedralized",
            Self::Clustered(_) => "clustered",
            Self::Simplified(_) => "simplified",
        }
    }
}

/// Request/response contract of the geometry engine.
pub trait GeometryEngine {
    fn triangulate(
        &mut self,
        request: &TriangulationRequest,
    ) -> Result<TriangulationResult, EngineError>;

    fn tetrahedralize(
        &mut self,
        request: &TriangulationRequest,
    ) -> Result<TetrahedralizationResult, EngineError>;

    fn cluster(&mut self, request: &ClusteringRequest) -> Result<ClusteringResult, EngineError>;

    fn simplify(
        &mut self,
        request: &SimplificationRequest,
    ) -> Result<SimplificationResult, EngineError>;

    fn dispatch(&mut self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        match request {
            EngineRequest::Triangulate(r) => self.triangulate(r).map(EngineResponse::Triangulated),
            EngineRequest::Tetrahedralize(r) => {
                self.tetrahedralize(r).map(EngineResponse::Tetrahedralized)
            }
            EngineRequest::Cluster(r) => self.cluster(r).map(EngineResponse::Clustered),
            EngineRequest::Simplify(r) => self.simplify(r).map(EngineResponse::Simplified),
        }
    }
}

pub(crate) fn ensure_finite(vertices: &[Vertex3]) -> Result<(), EngineError> {
    match vertices.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(EngineError::NonFiniteVertex { index }),
        None => Ok(()),
    }
}
