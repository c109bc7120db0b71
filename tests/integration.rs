use pointviz_engine::Viewer;
use pointviz_engine::config::SessionConfig;
use pointviz_engine::engine::{EngineRequest, GeometryEngine, LocalEngine};
use pointviz_engine::notify::Level;
use pointviz_engine::selectors;
use pointviz_engine::store::{Dimension, Stage, TriangulationMethod};
use pointviz_engine::visual::Scene;
use pointviz_engine::workflow::{EngineAction, Outcome, Session};

fn seeded_viewer(seed: u64) -> Viewer {
    Viewer::from_config(SessionConfig {
        seed: Some(seed),
        ..SessionConfig::default()
    })
    .expect("valid config")
}

#[test]
fn viewer_initializes() {
    let viewer = Viewer::new();
    assert!(viewer.is_initialized());
    assert_eq!(viewer.session().store().dimension(), Dimension::Three);
    assert_eq!(viewer.session().store().method(), TriangulationMethod::Direct);
    assert!(viewer.session().store().vertices().is_empty());
}

#[test]
fn viewer_rejects_unknown_names() {
    let mut viewer = Viewer::new();
    assert!(viewer.set_dimension("FOUR").is_err());
    assert!(viewer.set_method("e-circles").is_err());
    assert!(viewer.is_busy("lift").is_err());
    assert!(viewer.run_local("cluster").is_err());
    assert!(viewer.generate_vertices(1).is_err());
    assert!(viewer.set_grid_size(-1.0).is_err());
}

#[test]
fn viewer_tetrahedralizes_in_three_d() {
    let mut viewer = seeded_viewer(3);
    viewer.generate_vertices(12).expect("in range");
    assert_eq!(viewer.triangulation_action(), "tetrahedralize");

    let action = viewer.triangulation_action();
    assert_eq!(viewer.run_local(&action).expect("legal"), "applied");

    let session = viewer.session();
    let count = session.store().tetrahedra().len();
    assert!(count > 0);
    assert_eq!(
        session.notifications().last().map(|n| n.message.clone()),
        Some(format!("Tetrahedralization with {count} tetrahedra computed."))
    );
}

#[test]
fn viewer_lifts_in_two_d_and_clears_on_three() {
    let mut viewer = seeded_viewer(11);
    viewer.set_dimension("2d").expect("known dimension");
    viewer.generate_vertices(8).expect("in range");

    assert_eq!(viewer.lift_vertices().expect("2-D"), 8);
    assert_eq!(viewer.run_local("triangulate").expect("legal"), "applied");
    let triangles = viewer.session().store().triangles().len();
    assert_eq!(viewer.lift_triangles().expect("2-D"), triangles);

    viewer.set_dimension("THREE").expect("known dimension");
    let store = viewer.session().store();
    assert!(store.lifted_vertices().is_empty());
    assert!(store.lifted_triangles().is_empty());
    assert!(viewer.lift_vertices().is_err());
}

#[test]
fn viewer_runs_clustering_pipeline() {
    let mut viewer = seeded_viewer(5);
    viewer.set_dimension("TWO").expect("known dimension");
    viewer.set_method("VERTEX_CLUSTERING").expect("known method");
    viewer.generate_vertices(30).expect("in range");

    assert!(viewer.is_busy("cluster").is_ok_and(|busy| !busy));
    assert!(viewer.run_local("triangulate-simplified").is_err());
    assert_eq!(viewer.run_local("cluster").expect("legal"), "applied");
    assert!(viewer.run_local("cluster").is_err());
    assert_eq!(viewer.run_local("simplify").expect("legal"), "applied");

    let store = viewer.session().store();
    assert_eq!(store.stage(), Stage::Simplified);
    assert_eq!(store.simplified_vertices().len(), store.clusters().len());
    assert!(viewer.session().controls().triangulate_simplified);
}

#[test]
fn local_engine_dispatches_tagged_requests() {
    let mut session = Session::new(SessionConfig {
        seed: Some(9),
        initial_dimension: Dimension::Two,
        initial_method: TriangulationMethod::VertexClustering,
        ..SessionConfig::default()
    })
    .expect("valid config");
    session.regenerate_vertices(20).expect("in range");

    let pending = session.begin(EngineAction::Cluster).expect("legal");
    assert_eq!(pending.request.command(), "cluster2d");
    let EngineRequest::Cluster(request) = &pending.request else {
        panic!("cluster action should build a clustering request");
    };
    assert_eq!(request.vertices.len(), 20);
    assert_eq!(request.grid_size, 1.0);

    let response = LocalEngine::new().dispatch(&pending.request).expect("clusters");
    assert_eq!(response.kind(), "clustered");
    assert_eq!(
        session.complete(pending.ticket, response).expect("matching ticket"),
        Outcome::Applied
    );
    assert!(session.store().is_clustering_complete());
}

#[test]
fn scene_follows_the_pipeline() {
    let mut session = Session::new(SessionConfig {
        seed: Some(21),
        initial_dimension: Dimension::Two,
        initial_method: TriangulationMethod::VertexClustering,
        ..SessionConfig::default()
    })
    .expect("valid config");
    let mut engine = LocalEngine::new();
    let mut scene = Scene::new();

    session.regenerate_vertices(25).expect("in range");
    let diff = scene.sync(session.store());
    assert_eq!(diff.added.len(), 1);

    session.cluster(&mut engine).expect("legal");
    let diff = scene.sync(session.store());
    assert_eq!(diff.added.len(), session.store().cluster_rectangles().len());
    assert!(diff.removed.is_empty());

    session.simplify(&mut engine).expect("legal");
    let diff = scene.sync(session.store());
    // Raw points turn gray and the simplified cloud appears.
    assert_eq!(diff.updated.len(), 1);
    assert_eq!(diff.added.len(), 1);

    let rectangles = session.store().cluster_rectangles().len();
    session.set_method(TriangulationMethod::Direct);
    let diff = scene.sync(session.store());
    assert_eq!(diff.removed.len(), rectangles + 1);
    assert!(diff.removed.iter().any(|key| key == "simplified-vertices"));
    assert!(
        diff.removed
            .iter()
            .filter(|key| key.as_str() != "simplified-vertices")
            .all(|key| key.starts_with("cluster-rectangle:"))
    );
    assert_eq!(scene.len(), 1);
}

#[test]
fn cli_style_summary_reports_counts() {
    let mut session = Session::new(SessionConfig {
        seed: Some(2),
        initial_dimension: Dimension::Two,
        ..SessionConfig::default()
    })
    .expect("valid config");
    session.regenerate_vertices(12).expect("in range");
    session.triangulate(&mut LocalEngine::new()).expect("legal");

    let summary = selectors::summary(session.store());
    assert_eq!(summary.vertex_count, 12);
    assert!(summary.triangle_count > 0);
    assert_eq!(summary.cluster_stats, selectors::ClusterStats::default());

    let notes = session.take_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, Level::Success);
    assert_eq!(
        notes[0].message,
        format!("Triangulation with {} triangles computed.", summary.triangle_count)
    );
}
