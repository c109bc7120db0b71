//! Central result store.
//!
//! Every slice is replaced wholesale by the transition that owns it; there is no
//! incremental merge. Cross-slice invalidation lives in exactly one place per
//! triggering event:
//!
//! | event | clears |
//! |---|---|
//! | [`ResultStore::set_vertices`] | triangles, tetrahedra, lifted vertices/triangles, clustering |
//! | [`ResultStore::set_method`] | clustering |
//! | [`ResultStore::set_dimension`] to THREE | lifted vertices/triangles, clustering |
//! | [`ResultStore::set_triangles`] / [`ResultStore::set_tetrahedra`] | lifted triangles |
//!
//! Each mutation bumps [`ResultStore::revision`] so derived views can memoize.

mod types;

use serde::Serialize;

use crate::geom::{self, Tetrahedron3, Triangle3, Vertex3};

pub use types::{Cluster, ClusterRectangle, Dimension, Stage, TriangulationMethod};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("lifting is only available in 2-D mode")]
    LiftOutsideTwoD,
    #[error("cannot record {what} while the pipeline is at stage {stage:?}")]
    StageOrder { what: &'static str, stage: Stage },
}

/// Clustering-workflow slice of the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringState {
    method: TriangulationMethod,
    stage: Stage,
    clusters: Vec<Cluster>,
    cluster_rectangles: Vec<ClusterRectangle>,
    simplified_vertices: Vec<Vertex3>,
}

impl ClusteringState {
    fn new(method: TriangulationMethod) -> Self {
        Self {
            method,
            stage: Stage::Idle,
            clusters: Vec::new(),
            cluster_rectangles: Vec::new(),
            simplified_vertices: Vec::new(),
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.method);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStore {
    dimension: Dimension,
    epsilon: f64,
    vertices: Vec<Vertex3>,
    triangles: Vec<Triangle3>,
    tetrahedra: Vec<Tetrahedron3>,
    lifted_vertices: Vec<Vertex3>,
    lifted_triangles: Vec<Triangle3>,
    clustering: ClusteringState,
    #[serde(skip)]
    revision: u64,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(Dimension::Three, TriangulationMethod::Direct, 0.0)
    }
}

impl ResultStore {
    #[must_use]
    pub fn new(dimension: Dimension, method: TriangulationMethod, epsilon: f64) -> Self {
        Self {
            dimension,
            epsilon,
            vertices: Vec::new(),
            triangles: Vec::new(),
            tetrahedra: Vec::new(),
            lifted_vertices: Vec::new(),
            lifted_triangles: Vec::new(),
            clustering: ClusteringState::new(method),
            revision: 0,
        }
    }

    // --- Reads ---

    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[must_use]
    pub fn method(&self) -> TriangulationMethod {
        self.clustering.method
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vertex3] {
        &self.vertices
    }

    #[must_use]
    pub fn triangles(&self) -> &[Triangle3] {
        &self.triangles
    }

    #[must_use]
    pub fn tetrahedra(&self) -> &[Tetrahedron3] {
        &self.tetrahedra
    }

    #[must_use]
    pub fn lifted_vertices(&self) -> &[Vertex3] {
        &self.lifted_vertices
    }

    #[must_use]
    pub fn lifted_triangles(&self) -> &[Triangle3] {
        &self.lifted_triangles
    }

    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clustering.clusters
    }

    #[must_use]
    pub fn cluster_rectangles(&self) -> &[ClusterRectangle] {
        &self.clustering.cluster_rectangles
    }

    #[must_use]
    pub fn simplified_vertices(&self) -> &[Vertex3] {
        &self.clustering.simplified_vertices
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.clustering.stage
    }

    #[must_use]
    pub fn is_clustering_complete(&self) -> bool {
        self.clustering.stage.is_clustering_complete()
    }

    #[must_use]
    pub fn is_simplification_complete(&self) -> bool {
        self.clustering.stage.is_simplification_complete()
    }

    /// Monotonic counter bumped by every mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- Direct setters ---

    /// Replaces the raw vertex set and invalidates everything derived from it.
    pub fn set_vertices(&mut self, vertices: Vec<Vertex3>) {
        self.vertices = vertices;
        self.triangles.clear();
        self.tetrahedra.clear();
        self.lifted_vertices.clear();
        self.lifted_triangles.clear();
        self.clustering.reset();
        self.touch();
    }

    /// Switching to THREE drops lifted geometry and the clustering workflow,
    /// both of which are only meaningful in 2-D.
    pub fn set_dimension(&mut self, dimension: Dimension) {
        self.dimension = dimension;
        if dimension == Dimension::Three {
            self.lifted_vertices.clear();
            self.lifted_triangles.clear();
            self.clustering.reset();
        }
        self.touch();
    }

    /// Selects a method and resets the clustering workflow unconditionally.
    pub fn set_method(&mut self, method: TriangulationMethod) {
        self.clustering.method = method;
        self.clustering.reset();
        self.touch();
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
        self.touch();
    }

    pub fn set_triangles(&mut self, triangles: Vec<Triangle3>) {
        self.triangles = triangles;
        self.lifted_triangles.clear();
        self.touch();
    }

    pub fn set_tetrahedra(&mut self, tetrahedra: Vec<Tetrahedron3>) {
        self.tetrahedra = tetrahedra;
        self.lifted_triangles.clear();
        self.touch();
    }

    // --- Local transforms ---

    /// Lifts the raw vertices onto the paraboloid. Returns the lifted count.
    pub fn lift_vertices(&mut self) -> Result<usize, StoreError> {
        if !self.dimension.is_planar() {
            return Err(StoreError::LiftOutsideTwoD);
        }
        self.lifted_vertices = geom::lift_vertices(&self.vertices);
        self.touch();
        Ok(self.lifted_vertices.len())
    }

    /// Lifts the current triangles. Returns the lifted count.
    pub fn lift_triangles(&mut self) -> Result<usize, StoreError> {
        if !self.dimension.is_planar() {
            return Err(StoreError::LiftOutsideTwoD);
        }
        self.lifted_triangles = geom::lift_triangles(&self.triangles);
        self.touch();
        Ok(self.lifted_triangles.len())
    }

    // --- Workflow setters ---

    /// Records a clustering result. Earlier simplified vertices belong to the
    /// previous clustering and are dropped with it.
    pub fn apply_clustering(&mut self, clusters: Vec<Cluster>, rectangles: Vec<ClusterRectangle>) {
        let clustering = &mut self.clustering;
        clustering.clusters = clusters;
        clustering.cluster_rectangles = rectangles;
        clustering.simplified_vertices.clear();
        clustering.stage = Stage::Clustered;
        self.touch();
    }

    pub fn apply_simplification(&mut self, simplified: Vec<Vertex3>) -> Result<(), StoreError> {
        if !self.clustering.stage.is_clustering_complete() {
            return Err(StoreError::StageOrder {
                what: "a simplification",
                stage: self.clustering.stage,
            });
        }
        self.clustering.simplified_vertices = simplified;
        self.clustering.stage = Stage::Simplified;
        self.touch();
        Ok(())
    }

    pub fn apply_simplified_triangulation(
        &mut self,
        triangles: Vec<Triangle3>,
    ) -> Result<(), StoreError> {
        if !self.clustering.stage.is_simplification_complete() {
            return Err(StoreError::StageOrder {
                what: "a triangulation of simplified vertices",
                stage: self.clustering.stage,
            });
        }
        self.triangles = triangles;
        self.lifted_triangles.clear();
        self.clustering.stage = Stage::Triangulated;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
