//! Renderable primitive descriptors derived from the store.
//!
//! [`primitives`] is a pure function of a store snapshot. [`Scene`] keeps the
//! previous list by stable key and reports what changed, so the front-end only
//! rebuilds buffers that differ.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::geom::{ClusterBounds, Color, Tetrahedron3, Triangle3, Vertex3};
use crate::store::{ClusterRectangle, ResultStore, TriangulationMethod};

/// Height of cluster outlines above the y = 0 plane.
pub const RECTANGLE_Y: f64 = 0.001;

const POINT_SIZE: f64 = 0.1;
const SIMPLIFIED_POINT_SIZE: f64 = 0.15;

const RAW_POINTS: Color = Color::WHITE;
const FADED_POINTS: Color = Color::GRAY;
const SIMPLIFIED_POINTS: Color = Color::from_hex_u32(0xff_4d_4d);
const LIFTED_POINTS: Color = Color::from_hex_u32(0x4d_a6_ff);
const SURFACE: Color = Color::from_hex_u32(0x15_62_89);
const SURFACE_EMISSIVE: Color = Color::from_hex_u32(0x07_25_34);
const LIFTED_SURFACE: Color = Color::from_hex_u32(0xff_6b_6b);

const TRIANGLE_EDGES: [[u32; 2]; 3] = [[0, 1], [1, 2], [2, 0]];
const TETRAHEDRON_FACES: [[u32; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
const TETRAHEDRON_EDGES: [[u32; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];
const RECTANGLE_EDGES: [[u32; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub color: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissive: Option<Color>,
    pub opacity: f64,
    pub double_sided: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_size: Option<f64>,
}

impl Material {
    #[must_use]
    pub const fn solid(color: Color) -> Self {
        Self {
            color,
            emissive: None,
            opacity: 1.0,
            double_sided: false,
            point_size: None,
        }
    }

    #[must_use]
    pub const fn points(color: Color, size: f64) -> Self {
        Self {
            point_size: Some(size),
            ..Self::solid(color)
        }
    }

    #[must_use]
    pub const fn with_opacity(self, opacity: f64) -> Self {
        Self { opacity, ..self }
    }

    #[must_use]
    pub const fn with_emissive(self, emissive: Color) -> Self {
        Self {
            emissive: Some(emissive),
            ..self
        }
    }

    #[must_use]
    pub const fn double_sided(self) -> Self {
        Self {
            double_sided: true,
            ..self
        }
    }

    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// One drawable item. `key` is stable across recomputations of the same
/// source object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Primitive {
    Points {
        key: String,
        positions: Vec<[f64; 3]>,
        material: Material,
    },
    Mesh {
        key: String,
        positions: Vec<[f64; 3]>,
        faces: Vec<[u32; 3]>,
        material: Material,
    },
    /// Line segments indexing into `positions`.
    Lines {
        key: String,
        positions: Vec<[f64; 3]>,
        segments: Vec<[u32; 2]>,
        material: Material,
    },
}

impl Primitive {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Points { key, .. } | Self::Mesh { key, .. } | Self::Lines { key, .. } => key,
        }
    }

    fn key_mut(&mut self) -> &mut String {
        match self {
            Self::Points { key, .. } | Self::Mesh { key, .. } | Self::Lines { key, .. } => key,
        }
    }

    #[must_use]
    pub fn material(&self) -> &Material {
        match self {
            Self::Points { material, .. }
            | Self::Mesh { material, .. }
            | Self::Lines { material, .. } => material,
        }
    }
}

/// Every primitive for the current store contents. Empty sources contribute
/// nothing.
#[must_use]
pub fn primitives(store: &ResultStore) -> Vec<Primitive> {
    let mut out = Vec::new();

    let raw_color = if store.is_simplification_complete() {
        FADED_POINTS
    } else {
        RAW_POINTS
    };
    push_points(&mut out, "vertices", store.vertices(), Material::points(raw_color, POINT_SIZE));
    push_points(
        &mut out,
        "simplified-vertices",
        store.simplified_vertices(),
        Material::points(SIMPLIFIED_POINTS, SIMPLIFIED_POINT_SIZE),
    );
    push_points(
        &mut out,
        "lifted-vertices",
        store.lifted_vertices(),
        Material::points(LIFTED_POINTS, POINT_SIZE),
    );

    for triangle in store.triangles() {
        push_triangle(
            &mut out,
            "triangle",
            triangle,
            Material::solid(SURFACE).double_sided(),
            Material::solid(Color::WHITE).with_opacity(0.5),
        );
    }
    for triangle in store.lifted_triangles() {
        push_triangle(
            &mut out,
            "lifted-triangle",
            triangle,
            Material::solid(LIFTED_SURFACE).with_opacity(0.7).double_sided(),
            Material::solid(LIFTED_SURFACE).with_opacity(0.8),
        );
    }
    for tetrahedron in store.tetrahedra() {
        push_tetrahedron(&mut out, tetrahedron);
    }

    if store.method() == TriangulationMethod::VertexClustering {
        out.extend(store.cluster_rectangles().iter().map(rectangle_outline));
    }

    out
}

fn push_points(out: &mut Vec<Primitive>, key: &str, vertices: &[Vertex3], material: Material) {
    if vertices.is_empty() {
        return;
    }
    out.push(Primitive::Points {
        key: key.to_owned(),
        positions: vertices.iter().map(|v| v.to_array()).collect(),
        material,
    });
}

fn push_triangle(
    out: &mut Vec<Primitive>,
    prefix: &str,
    triangle: &Triangle3,
    surface: Material,
    edges: Material,
) {
    let positions: Vec<[f64; 3]> = triangle.corners().map(Vertex3::to_array).to_vec();
    out.push(Primitive::Mesh {
        key: format!("{prefix}:{}:mesh", triangle.id),
        positions: positions.clone(),
        faces: vec![[0, 1, 2]],
        material: surface,
    });
    out.push(Primitive::Lines {
        key: format!("{prefix}:{}:edges", triangle.id),
        positions,
        segments: TRIANGLE_EDGES.to_vec(),
        material: edges,
    });
}

fn push_tetrahedron(out: &mut Vec<Primitive>, tetrahedron: &Tetrahedron3) {
    let positions: Vec<[f64; 3]> = tetrahedron.corners().map(Vertex3::to_array).to_vec();
    out.push(Primitive::Mesh {
        key: format!("tetrahedron:{}:mesh", tetrahedron.id),
        positions: positions.clone(),
        faces: TETRAHEDRON_FACES.to_vec(),
        material: Material::solid(SURFACE)
            .with_emissive(SURFACE_EMISSIVE)
            .double_sided(),
    });
    out.push(Primitive::Lines {
        key: format!("tetrahedron:{}:edges", tetrahedron.id),
        positions,
        segments: TETRAHEDRON_EDGES.to_vec(),
        material: Material::solid(Color::WHITE).with_opacity(0.5),
    });
}

fn rectangle_outline(rectangle: &ClusterRectangle) -> Primitive {
    Primitive::Lines {
        key: format!("cluster-rectangle:{}", rectangle.id),
        positions: outline_positions(&rectangle.bounds),
        segments: RECTANGLE_EDGES.to_vec(),
        material: Material::solid(rectangle.display_color()).with_opacity(0.8),
    }
}

fn outline_positions(bounds: &ClusterBounds) -> Vec<[f64; 3]> {
    bounds.corners(RECTANGLE_Y).map(Vertex3::to_array).to_vec()
}

/// Changes between two consecutive primitive lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneDiff {
    pub added: Vec<Primitive>,
    pub updated: Vec<Primitive>,
    pub removed: Vec<String>,
}

impl SceneDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Last rendered primitive set, keyed by stable key.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    current: BTreeMap<String, Primitive>,
    synced_revision: Option<u64>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes primitives when the store revision moved and returns the
    /// difference to the previous sync.
    pub fn sync(&mut self, store: &ResultStore) -> SceneDiff {
        if self.synced_revision == Some(store.revision()) {
            return SceneDiff::default();
        }

        let mut next: BTreeMap<String, Primitive> = BTreeMap::new();
        for mut primitive in primitives(store) {
            if next.contains_key(primitive.key()) {
                // Duplicate engine ids; keep both under a suffixed key.
                let base = primitive.key().to_owned();
                let key = (1..)
                    .map(|n| format!("{base}#{n}"))
                    .find(|candidate| !next.contains_key(candidate))
                    .unwrap_or_default();
                log::warn!("duplicate primitive key `{base}`, stored as `{key}`");
                *primitive.key_mut() = key;
            }
            next.insert(primitive.key().to_owned(), primitive);
        }

        let mut diff = SceneDiff::default();
        for (key, primitive) in &next {
            match self.current.get(key) {
                Some(existing) if existing == primitive => {}
                Some(_) => diff.updated.push(primitive.clone()),
                None => diff.added.push(primitive.clone()),
            }
        }
        diff.removed = self
            .current
            .keys()
            .filter(|key| !next.contains_key(*key))
            .cloned()
            .collect();

        self.current = next;
        self.synced_revision = Some(store.revision());
        diff
    }

    /// Forgets the previous sync so the next one reports everything as added.
    pub fn reset(&mut self) {
        self.current.clear();
        self.synced_revision = None;
    }

    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.current.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Cluster, Dimension};

    fn planar_store(method: TriangulationMethod) -> ResultStore {
        let mut store = ResultStore::new(Dimension::Two, method, 0.0);
        store.set_vertices(vec![
            Vertex3::planar(0.0, 0.0),
            Vertex3::planar(1.0, 0.0),
            Vertex3::planar(0.0, 1.0),
        ]);
        store
    }

    fn keys(primitives: &[Primitive]) -> Vec<&str> {
        primitives.iter().map(Primitive::key).collect()
    }

    #[test]
    fn empty_store_renders_nothing() {
        assert!(primitives(&ResultStore::default()).is_empty());
    }

    #[test]
    fn triangles_render_as_mesh_and_edges() {
        let mut store = planar_store(TriangulationMethod::Direct);
        let [a, b, c] = [
            Vertex3::planar(0.0, 0.0),
            Vertex3::planar(1.0, 0.0),
            Vertex3::planar(0.0, 1.0),
        ];
        store.set_triangles(vec![Triangle3::new("tri-0", a, b, c)]);
        store.lift_triangles().expect("2-D");

        let out = primitives(&store);
        assert_eq!(
            keys(&out),
            [
                "vertices",
                "triangle:tri-0:mesh",
                "triangle:tri-0:edges",
                "lifted-triangle:lifted-tri-0:mesh",
                "lifted-triangle:lifted-tri-0:edges",
            ]
        );
        assert_eq!(out[0].material().color, Color::WHITE);
        assert_eq!(out[3].material().opacity, 0.7);
    }

    #[test]
    fn rectangles_only_under_vertex_clustering() {
        let mut store = planar_store(TriangulationMethod::VertexClustering);
        let cluster = Cluster {
            id: "cluster_0_0".to_owned(),
            vertices: store.vertices().to_vec(),
            bounds: ClusterBounds::new(0.0, 1.0, 0.0, 1.0),
        };
        let rect = ClusterRectangle::from(&cluster);
        store.apply_clustering(vec![cluster], vec![rect]);
        store
            .apply_simplification(vec![Vertex3::planar(0.3, 0.3)])
            .expect("clustered");

        let out = primitives(&store);
        assert_eq!(
            keys(&out),
            ["vertices", "simplified-vertices", "cluster-rectangle:cluster_0_0"]
        );
        assert_eq!(out[0].material().color, Color::GRAY);
        let Primitive::Lines { positions, segments, .. } = &out[2] else {
            panic!("rectangle should be a line primitive");
        };
        assert_eq!(segments.len(), 4);
        assert!(positions.iter().all(|p| p[1] == RECTANGLE_Y));

        store.set_method(TriangulationMethod::Direct);
        assert_eq!(keys(&primitives(&store)), ["vertices"]);
    }

    #[test]
    fn scene_reports_changes_by_key() {
        let mut store = planar_store(TriangulationMethod::Direct);
        let mut scene = Scene::new();

        let first = scene.sync(&store);
        assert_eq!(keys(&first.added), ["vertices"]);
        assert!(scene.sync(&store).is_empty());

        store.lift_vertices().expect("2-D");
        let second = scene.sync(&store);
        assert_eq!(keys(&second.added), ["lifted-vertices"]);
        assert!(second.updated.is_empty());

        store.set_vertices(vec![Vertex3::planar(2.0, 2.0)]);
        let third = scene.sync(&store);
        assert_eq!(keys(&third.updated), ["vertices"]);
        assert_eq!(third.removed, ["lifted-vertices"]);
        assert_eq!(scene.len(), 1);

        scene.reset();
        assert_eq!(scene.sync(&store).added.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_kept_under_suffixed_keys() {
        let mut store = planar_store(TriangulationMethod::Direct);
        let [a, b, c] = [
            Vertex3::planar(0.0, 0.0),
            Vertex3::planar(1.0, 0.0),
            Vertex3::planar(0.0, 1.0),
        ];
        let d = Vertex3::planar(1.0, 1.0);
        store.set_triangles(vec![
            Triangle3::new("dup", a, b, c),
            Triangle3::new("dup", b, d, c),
        ]);

        let mut scene = Scene::new();
        let diff = scene.sync(&store);
        assert_eq!(
            keys(&diff.added),
            [
                "triangle:dup:edges",
                "triangle:dup:edges#1",
                "triangle:dup:mesh",
                "triangle:dup:mesh#1",
                "vertices",
            ]
        );
        assert_eq!(scene.len(), 5);
    }

    #[test]
    fn tetrahedra_carry_emissive_surface() {
        let mut store = ResultStore::default();
        store.set_tetrahedra(vec![Tetrahedron3::new(
            "tet-0",
            Vertex3::new(0.0, 0.0, 0.0),
            Vertex3::new(1.0, 0.0, 0.0),
            Vertex3::new(0.0, 1.0, 0.0),
            Vertex3::new(0.0, 0.0, 1.0),
        )]);
        let out = primitives(&store);
        let Primitive::Mesh { faces, material, .. } = &out[0] else {
            panic!("tetrahedron should start with a mesh");
        };
        assert_eq!(faces.len(), 4);
        assert_eq!(material.emissive, Some(SURFACE_EMISSIVE));
        let Primitive::Lines { segments, .. } = &out[1] else {
            panic!("tetrahedron edges should follow the mesh");
        };
        assert_eq!(segments.len(), 6);
    }
}
