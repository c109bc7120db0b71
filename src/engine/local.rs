//! In-process reference engine.

use std::collections::BTreeMap;
use std::fmt;

use rita::{Tetrahedralization, Triangulation};

use crate::debug_log;
use crate::geom::{ClusterBounds, Tetrahedron3, Triangle3, Vertex3};
use crate::store::{Cluster, ClusterRectangle};

use super::{
    ClusteringRequest, ClusteringResult, EngineError, GeometryEngine, SimplificationRequest,
    SimplificationResult, TetrahedralizationResult, TriangulationRequest, TriangulationResult,
    ensure_finite,
};

/// Geometry engine that runs on the calling thread.
///
/// - triangulation: `rita` Delaunay on the x/z projection
/// - tetrahedralization: `rita` 3-D Delaunay
/// - clustering: uniform grid binning anchored at the minimum x/z
/// - simplification: one centroid per cluster
///
/// The request epsilon is handed to `rita` as its predicate tolerance.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEngine;

impl LocalEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn checked_epsilon(epsilon: f64) -> Result<f64, EngineError> {
    if epsilon.is_finite() && epsilon >= 0.0 {
        Ok(epsilon)
    } else {
        Err(EngineError::InvalidEpsilon(epsilon))
    }
}

fn require_vertices(
    operation: &'static str,
    required: usize,
    vertices: &[Vertex3],
) -> Result<(), EngineError> {
    if vertices.len() < required {
        return Err(EngineError::Degenerate {
            operation,
            required,
            actual: vertices.len(),
        });
    }
    ensure_finite(vertices)
}

fn kernel_error(operation: &'static str, err: &impl fmt::Debug) -> EngineError {
    log::error!("{operation}: kernel rejected the input: {err:?}");
    EngineError::Kernel {
        operation,
        message: format!("{err:?}"),
    }
}

impl GeometryEngine for LocalEngine {
    fn triangulate(
        &mut self,
        request: &TriangulationRequest,
    ) -> Result<TriangulationResult, EngineError> {
        let epsilon = checked_epsilon(request.epsilon)?;
        let vertices = &request.vertices;
        require_vertices("triangulation", 3, vertices)?;

        let planar: Vec<[f64; 2]> = vertices.iter().map(|v| v.to_planar()).collect();
        let mut triangulation = Triangulation::new(Some(epsilon));
        triangulation
            .insert_vertices(&planar, None, true)
            .map_err(|err| kernel_error("triangulation", &err))?;

        // The kernel only sees the plan view; put each input height back.
        let heights: BTreeMap<(u64, u64), f64> = vertices
            .iter()
            .map(|v| ((v.x.to_bits(), v.z.to_bits()), v.y))
            .collect();
        let restore = |[x, z]: [f64; 2]| {
            let y = heights
                .get(&(x.to_bits(), z.to_bits()))
                .copied()
                .unwrap_or(0.0);
            Vertex3::new(x, y, z)
        };

        let triangles: Vec<Triangle3> = triangulation
            .tris()
            .iter()
            .enumerate()
            .map(|(index, &[a, b, c])| {
                Triangle3::new(format!("tri-{index}"), restore(a), restore(b), restore(c))
            })
            .collect();

        debug_log!(
            "local triangulate: {} vertices, epsilon {} -> {} triangles",
            vertices.len(),
            epsilon,
            triangles.len()
        );
        Ok(TriangulationResult { triangles })
    }

    fn tetrahedralize(
        &mut self,
        request: &TriangulationRequest,
    ) -> Result<TetrahedralizationResult, EngineError> {
        let epsilon = checked_epsilon(request.epsilon)?;
        let vertices = &request.vertices;
        require_vertices("tetrahedralization", 4, vertices)?;

        let points: Vec<[f64; 3]> = vertices.iter().map(|v| v.to_array()).collect();
        let mut tetrahedralization = Tetrahedralization::new(Some(epsilon));
        tetrahedralization
            .insert_vertices(&points, None, true)
            .map_err(|err| kernel_error("tetrahedralization", &err))?;

        let tetrahedra: Vec<Tetrahedron3> = tetrahedralization
            .tets()
            .iter()
            .enumerate()
            .map(|(index, &[a, b, c, d])| {
                Tetrahedron3::new(
                    format!("tet-{index}"),
                    Vertex3::from(a),
                    Vertex3::from(b),
                    Vertex3::from(c),
                    Vertex3::from(d),
                )
            })
            .collect();

        debug_log!(
            "local tetrahedralize: {} vertices, epsilon {} -> {} tetrahedra",
            vertices.len(),
            epsilon,
            tetrahedra.len()
        );
        Ok(TetrahedralizationResult { tetrahedra })
    }

    fn cluster(&mut self, request: &ClusteringRequest) -> Result<ClusteringResult, EngineError> {
        let grid_size = request.grid_size;
        if !(grid_size.is_finite() && grid_size > 0.0) {
            return Err(EngineError::InvalidGridSize(grid_size));
        }
        ensure_finite(&request.vertices)?;

        let Some(extent) = ClusterBounds::enclosing(&request.vertices) else {
            return Ok(ClusteringResult::default());
        };

        let mut bins: BTreeMap<(usize, usize), Vec<Vertex3>> = BTreeMap::new();
        for vertex in &request.vertices {
            let ix = ((vertex.x - extent.min_x) / grid_size).floor() as usize;
            let iz = ((vertex.z - extent.min_z) / grid_size).floor() as usize;
            bins.entry((ix, iz)).or_default().push(*vertex);
        }

        let clusters: Vec<Cluster> = bins
            .into_iter()
            .map(|((ix, iz), vertices)| {
                let min_x = extent.min_x + ix as f64 * grid_size;
                let min_z = extent.min_z + iz as f64 * grid_size;
                Cluster {
                    id: format!("cluster_{ix}_{iz}"),
                    vertices,
                    bounds: ClusterBounds::new(min_x, min_x + grid_size, min_z, min_z + grid_size),
                }
            })
            .collect();
        let cluster_rectangles = clusters.iter().map(ClusterRectangle::from).collect();

        debug_log!(
            "local cluster: {} vertices, grid {} -> {} clusters",
            request.vertices.len(),
            grid_size,
            clusters.len()
        );
        Ok(ClusteringResult {
            clusters,
            cluster_rectangles,
        })
    }

    fn simplify(
        &mut self,
        request: &SimplificationRequest,
    ) -> Result<SimplificationResult, EngineError> {
        if request.clusters.is_empty() {
            return Err(EngineError::NoClusters);
        }

        let simplified_vertices = request
            .clusters
            .iter()
            .filter(|cluster| !cluster.is_empty())
            .map(|cluster| {
                let count = cluster.len() as f64;
                let (sum_x, sum_z) = cluster
                    .vertices
                    .iter()
                    .fold((0.0, 0.0), |(x, z), v| (x + v.x, z + v.z));
                Vertex3::planar(sum_x / count, sum_z / count)
            })
            .collect();

        Ok(SimplificationResult {
            simplified_vertices,
        })
    }
}
