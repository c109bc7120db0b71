//! Read-only views derived from a [`ResultStore`] snapshot.
//!
//! Everything here is a pure function of its inputs; callers that need to
//! avoid recomputation key on [`ResultStore::revision`].

use std::cmp::Ordering;

use serde::Serialize;

use crate::geom::Color;
use crate::store::{
    Cluster, ClusterRectangle, Dimension, ResultStore, Stage, TriangulationMethod,
};
use crate::workflow::EngineAction;

/// Which pipeline steps the method and stage allow, ignoring busy slots and
/// vertex counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub can_cluster: bool,
    pub can_simplify: bool,
    pub can_triangulate: bool,
}

#[must_use]
pub fn capabilities(method: TriangulationMethod, stage: Stage) -> Capabilities {
    let clustering = method == TriangulationMethod::VertexClustering;
    Capabilities {
        can_cluster: clustering && !stage.is_clustering_complete(),
        can_simplify: clustering
            && stage.is_clustering_complete()
            && !stage.is_simplification_complete(),
        can_triangulate: clustering && stage.is_simplification_complete(),
    }
}

impl From<&ResultStore> for Capabilities {
    fn from(store: &ResultStore) -> Self {
        capabilities(store.method(), store.stage())
    }
}

/// Per-control enablement for the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlState {
    pub min_vertices: usize,
    pub max_vertices: usize,
    pub default_vertex_count: usize,
    pub lift_vertices: bool,
    /// Triangulate in TWO, tetrahedralize in THREE.
    pub triangulate: bool,
    pub lift_triangles: bool,
    pub cluster: bool,
    pub simplify: bool,
    pub triangulate_simplified: bool,
    pub busy: Vec<EngineAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStats {
    pub total_clusters: usize,
    pub total_vertices: usize,
    pub average_vertices_per_cluster: f64,
    pub largest_cluster_size: usize,
    pub smallest_cluster_size: usize,
    pub total_area: f64,
    pub average_area: f64,
}

/// Aggregate statistics. Vertex figures come from `clusters`, areas from
/// `rectangles`. All zero when there are no clusters.
#[must_use]
pub fn cluster_stats(clusters: &[Cluster], rectangles: &[ClusterRectangle]) -> ClusterStats {
    if clusters.is_empty() {
        return ClusterStats::default();
    }

    let total_vertices = total_clustered_vertices(clusters);
    let sizes = clusters.iter().map(Cluster::len);
    let largest_cluster_size = sizes.clone().max().unwrap_or(0);
    let smallest_cluster_size = sizes.min().unwrap_or(0);

    let total_area: f64 = rectangles.iter().map(|rect| rect.bounds.area()).sum();
    let average_area = if rectangles.is_empty() {
        0.0
    } else {
        total_area / rectangles.len() as f64
    };

    ClusterStats {
        total_clusters: clusters.len(),
        total_vertices,
        average_vertices_per_cluster: total_vertices as f64 / clusters.len() as f64,
        largest_cluster_size,
        smallest_cluster_size,
        total_area,
        average_area,
    }
}

#[must_use]
pub fn total_clustered_vertices(clusters: &[Cluster]) -> usize {
    clusters.iter().map(Cluster::len).sum()
}

#[must_use]
pub fn is_vertex_clustering_method(store: &ResultStore) -> bool {
    store.method() == TriangulationMethod::VertexClustering
}

#[must_use]
pub fn has_cluster_rectangles(store: &ResultStore) -> bool {
    !store.cluster_rectangles().is_empty()
}

#[must_use]
pub fn can_visualize_clusters(store: &ResultStore) -> bool {
    store.is_clustering_complete() && has_cluster_rectangles(store)
}

/// Resolved display color of every rectangle, in store order.
#[must_use]
pub fn cluster_rectangle_colors(rectangles: &[ClusterRectangle]) -> Vec<Color> {
    rectangles.iter().map(ClusterRectangle::display_color).collect()
}

#[must_use]
pub fn cluster_by_id<'a>(clusters: &'a [Cluster], id: &str) -> Option<&'a Cluster> {
    clusters.iter().find(|cluster| cluster.id == id)
}

#[must_use]
pub fn cluster_rectangle_by_id<'a>(
    rectangles: &'a [ClusterRectangle],
    id: &str,
) -> Option<&'a ClusterRectangle> {
    rectangles.iter().find(|rect| rect.id == id)
}

/// Ids of rectangles whose bounds are inverted or non-finite.
#[must_use]
pub fn malformed_rectangles(rectangles: &[ClusterRectangle]) -> Vec<&str> {
    rectangles
        .iter()
        .filter(|rect| !rect.bounds.is_well_formed())
        .map(|rect| rect.id.as_str())
        .collect()
}

/// Layout of one cluster rectangle for the renderer. Width and height are
/// raw, so malformed bounds show up as negative extents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRenderData {
    pub id: String,
    pub center_x: f64,
    pub center_z: f64,
    pub width: f64,
    pub height: f64,
    pub color: Color,
    pub vertex_count: usize,
}

impl From<&ClusterRectangle> for ClusterRenderData {
    fn from(rect: &ClusterRectangle) -> Self {
        let (center_x, center_z) = rect.bounds.center();
        let (width, height) = rect.bounds.dimensions();
        Self {
            id: rect.id.clone(),
            center_x,
            center_z,
            width,
            height,
            color: rect.display_color(),
            vertex_count: rect.vertex_count,
        }
    }
}

#[must_use]
pub fn cluster_render_data(rectangles: &[ClusterRectangle]) -> Vec<ClusterRenderData> {
    rectangles.iter().map(ClusterRenderData::from).collect()
}

/// Counts and flags shown in the status bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub dimension: Dimension,
    pub method: TriangulationMethod,
    pub stage: Stage,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub tetrahedron_count: usize,
    pub lifted_vertex_count: usize,
    pub lifted_triangle_count: usize,
    pub cluster_count: usize,
    pub cluster_rectangle_count: usize,
    pub simplified_vertex_count: usize,
    pub can_visualize_clusters: bool,
    pub capabilities: Capabilities,
    pub cluster_stats: ClusterStats,
}

#[must_use]
pub fn summary(store: &ResultStore) -> Summary {
    Summary {
        dimension: store.dimension(),
        method: store.method(),
        stage: store.stage(),
        vertex_count: store.vertices().len(),
        triangle_count: store.triangles().len(),
        tetrahedron_count: store.tetrahedra().len(),
        lifted_vertex_count: store.lifted_vertices().len(),
        lifted_triangle_count: store.lifted_triangles().len(),
        cluster_count: store.clusters().len(),
        cluster_rectangle_count: store.cluster_rectangles().len(),
        simplified_vertex_count: store.simplified_vertices().len(),
        can_visualize_clusters: can_visualize_clusters(store),
        capabilities: Capabilities::from(store),
        cluster_stats: cluster_stats(store.clusters(), store.cluster_rectangles()),
    }
}

/// Comparators for `sort_by`.
pub mod sort {
    use super::{Cluster, Ordering};

    /// Largest cluster first.
    #[must_use]
    pub fn by_vertex_count(a: &Cluster, b: &Cluster) -> Ordering {
        b.len().cmp(&a.len())
    }

    /// Largest area first.
    #[must_use]
    pub fn by_area(a: &Cluster, b: &Cluster) -> Ordering {
        b.bounds.area().total_cmp(&a.bounds.area())
    }

    #[must_use]
    pub fn by_id(a: &Cluster, b: &Cluster) -> Ordering {
        a.id.cmp(&b.id)
    }
}

/// Predicates for `filter`.
pub mod filter {
    use super::Cluster;

    pub fn min_vertex_count(min: usize) -> impl Fn(&&Cluster) -> bool {
        move |cluster| cluster.len() >= min
    }

    pub fn min_area(min: f64) -> impl Fn(&&Cluster) -> bool {
        move |cluster| cluster.bounds.area() >= min
    }

    /// Bounds are closed on every side.
    pub fn containing_point(x: f64, z: f64) -> impl Fn(&&Cluster) -> bool {
        move |cluster| cluster.bounds.contains(x, z)
    }
}
