//! Clustering workflow state machine and engine request protocol.
//!
//! A [`Session`] owns the [`ResultStore`] and is the only thing that mutates
//! it. Engine-backed actions are split into [`Session::begin`], which checks
//! the guards and hands out a serializable request, and
//! [`Session::complete`] / [`Session::fail`], which apply or drop the answer.
//! Every reset bumps a generation counter so answers to requests issued before
//! the reset are discarded instead of applied.

mod action;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ConfigError, SessionConfig};
use crate::engine::{
    ClusteringRequest, ClusteringResult, EngineError, EngineRequest, EngineResponse,
    GeometryEngine, SimplificationRequest, TriangulationRequest,
};
use crate::geom::Vertex3;
use crate::notify::Notification;
use crate::selectors::ControlState;
use crate::store::{ClusterRectangle, Dimension, ResultStore, StoreError, TriangulationMethod};

pub use action::{EngineAction, Outcome, PendingRequest, Ticket};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{action} requires the {required} method")]
    WrongMethod {
        action: EngineAction,
        required: TriangulationMethod,
    },
    #[error("{action} is only available in {required} mode")]
    WrongDimension {
        action: EngineAction,
        required: Dimension,
    },
    #[error("{action} needs at least {required} vertices, got {actual}")]
    NotEnoughVertices {
        action: EngineAction,
        required: usize,
        actual: usize,
    },
    #[error("vertices are already clustered")]
    AlreadyClustered,
    #[error("clusters are already simplified")]
    AlreadySimplified,
    #[error("clustering has not completed")]
    NotClustered,
    #[error("simplification has not completed")]
    NotSimplified,
    #[error("{0} already has a request in flight")]
    Busy(EngineAction),
    #[error("vertex count {count} is outside [{min}, {max}] in {dimension} mode")]
    VertexCountOutOfRange {
        count: usize,
        min: usize,
        max: usize,
        dimension: Dimension,
    },
    #[error("ticket {0} does not match an in-flight request")]
    UnknownTicket(u64),
    #[error("{action} cannot accept a `{kind}` response")]
    ResponseMismatch {
        action: EngineAction,
        kind: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One interactive session: configuration, result store, in-flight requests
/// and pending notifications.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    store: ResultStore,
    grid_size: f64,
    rng: StdRng,
    generation: u64,
    next_ticket: u64,
    in_flight: [Option<Ticket>; EngineAction::SLOTS],
    notifications: Vec<Notification>,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_valid_config(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, WorkflowError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: SessionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            store: ResultStore::new(
                config.initial_dimension,
                config.initial_method,
                config.epsilon,
            ),
            grid_size: config.grid_size,
            rng,
            generation: 0,
            next_ticket: 0,
            in_flight: [None; EngineAction::SLOTS],
            notifications: Vec::new(),
            config,
        }
    }

    // ───────────────────────────── reads ─────────────────────────────

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    #[must_use]
    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Reset counter; bumped by vertex regeneration, method switches and
    /// switching to THREE.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_busy(&self, action: EngineAction) -> bool {
        self.in_flight[action.slot()].is_some()
    }

    /// Tickets of every request still awaiting an answer.
    pub fn in_flight(&self) -> impl Iterator<Item = &Ticket> {
        self.in_flight.iter().flatten()
    }

    /// Accepted vertex-count range for the active dimension.
    #[must_use]
    pub fn vertex_range(&self) -> (usize, usize) {
        (
            self.store.dimension().min_vertices(),
            self.config.max_vertices,
        )
    }

    /// The engine action behind the "Triangulate" control: a planar
    /// triangulation in TWO, a tetrahedralization in THREE.
    #[must_use]
    pub fn triangulation_action(&self) -> EngineAction {
        if self.store.dimension().is_planar() {
            EngineAction::Triangulate
        } else {
            EngineAction::Tetrahedralize
        }
    }

    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    #[must_use]
    pub fn controls(&self) -> ControlState {
        let store = &self.store;
        let planar = store.dimension().is_planar();
        let (min_vertices, max_vertices) = self.vertex_range();
        ControlState {
            min_vertices,
            max_vertices,
            default_vertex_count: self.config.initial_vertex_count.clamp(min_vertices, max_vertices),
            lift_vertices: planar && !store.vertices().is_empty(),
            triangulate: self.check(self.triangulation_action()).is_ok(),
            lift_triangles: planar && !store.triangles().is_empty(),
            cluster: self.check(EngineAction::Cluster).is_ok(),
            simplify: self.check(EngineAction::Simplify).is_ok(),
            triangulate_simplified: self.check(EngineAction::TriangulateSimplified).is_ok(),
            busy: self.in_flight().map(|ticket| ticket.action).collect(),
        }
    }

    // ───────────────────────── local transitions ─────────────────────────

    pub fn set_dimension(&mut self, dimension: Dimension) {
        log::info!("dimension -> {dimension}");
        self.store.set_dimension(dimension);
        if dimension == Dimension::Three {
            self.invalidate_in_flight("dimension switch");
        }
    }

    /// Always resets the clustering workflow, even when `method` is already
    /// active.
    pub fn set_method(&mut self, method: TriangulationMethod) {
        log::info!("triangulation method -> {method}");
        self.store.set_method(method);
        self.invalidate_in_flight("method switch");
    }

    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<(), WorkflowError> {
        if !(epsilon.is_finite() && epsilon >= 0.0) {
            return Err(ConfigError::InvalidEpsilon(epsilon).into());
        }
        self.store.set_epsilon(epsilon);
        Ok(())
    }

    pub fn set_grid_size(&mut self, grid_size: f64) -> Result<(), WorkflowError> {
        if !(grid_size.is_finite() && grid_size > 0.0) {
            return Err(ConfigError::InvalidGridSize(grid_size).into());
        }
        self.grid_size = grid_size;
        Ok(())
    }

    /// Replaces the vertex set with `count` random vertices.
    ///
    /// Coordinates fall in `[-half_span, half_span)` on every axis; in TWO the
    /// y coordinate is 0.
    pub fn regenerate_vertices(&mut self, count: usize) -> Result<(), WorkflowError> {
        let dimension = self.store.dimension();
        let (min, max) = self.vertex_range();
        if !(min..=max).contains(&count) {
            return Err(WorkflowError::VertexCountOutOfRange {
                count,
                min,
                max,
                dimension,
            });
        }

        let half = self.config.half_span();
        let rng = &mut self.rng;
        let mut coordinate = move || rng.random_range(-half..half);
        let vertices: Vec<Vertex3> = (0..count)
            .map(|_| {
                let x = coordinate();
                let y = if dimension.is_planar() { 0.0 } else { coordinate() };
                let z = coordinate();
                Vertex3::new(x, y, z)
            })
            .collect();

        log::info!("generated {count} vertices in {dimension} mode");
        self.set_vertices(vertices);
        Ok(())
    }

    /// Installs an explicit vertex set, with the same resets as
    /// [`Self::regenerate_vertices`].
    pub fn set_vertices(&mut self, vertices: Vec<Vertex3>) {
        self.store.set_vertices(vertices);
        self.invalidate_in_flight("vertex regeneration");
    }

    pub fn lift_vertices(&mut self) -> Result<usize, WorkflowError> {
        let count = self.store.lift_vertices()?;
        log::info!("lifted {count} vertices");
        Ok(count)
    }

    pub fn lift_triangles(&mut self) -> Result<usize, WorkflowError> {
        let count = self.store.lift_triangles()?;
        log::info!("lifted {count} triangles");
        Ok(count)
    }

    // ───────────────────────── engine protocol ─────────────────────────

    /// Checks whether `action` may be issued right now.
    pub fn check(&self, action: EngineAction) -> Result<(), WorkflowError> {
        let store = &self.store;
        match action {
            EngineAction::Cluster => {
                self.require_method(action, TriangulationMethod::VertexClustering)?;
                self.require_dimension(action, Dimension::Two)?;
                self.require_vertices(action, 3)?;
                if store.is_clustering_complete() {
                    return Err(WorkflowError::AlreadyClustered);
                }
            }
            EngineAction::Simplify => {
                self.require_method(action, TriangulationMethod::VertexClustering)?;
                self.require_dimension(action, Dimension::Two)?;
                if !store.is_clustering_complete() {
                    return Err(WorkflowError::NotClustered);
                }
                if store.is_simplification_complete() {
                    return Err(WorkflowError::AlreadySimplified);
                }
            }
            EngineAction::TriangulateSimplified => {
                self.require_method(action, TriangulationMethod::VertexClustering)?;
                self.require_dimension(action, Dimension::Two)?;
                if !store.is_simplification_complete() {
                    return Err(WorkflowError::NotSimplified);
                }
            }
            EngineAction::Triangulate => {
                self.require_method(action, TriangulationMethod::Direct)?;
                self.require_dimension(action, Dimension::Two)?;
                self.require_vertices(action, 3)?;
            }
            EngineAction::Tetrahedralize => {
                self.require_dimension(action, Dimension::Three)?;
                self.require_vertices(action, 4)?;
            }
        }

        if self.is_busy(action) {
            return Err(WorkflowError::Busy(action));
        }
        Ok(())
    }

    /// Validates `action`, marks its slot busy and returns the request to send.
    pub fn begin(&mut self, action: EngineAction) -> Result<PendingRequest, WorkflowError> {
        if let Err(err) = self.check(action) {
            log::warn!("rejected {action}: {err}");
            return Err(err);
        }

        let request = self.request_for(action);
        let ticket = Ticket {
            id: self.next_ticket,
            action,
            generation: self.generation,
        };
        self.next_ticket += 1;
        self.in_flight[action.slot()] = Some(ticket);

        log::info!(
            "{action}: sending `{}` request (ticket {})",
            request.command(),
            ticket.id
        );
        Ok(PendingRequest { ticket, request })
    }

    /// Applies an engine response through the single store transition that
    /// owns it.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        response: EngineResponse,
    ) -> Result<Outcome, WorkflowError> {
        if !self.release(ticket)? {
            return Ok(Outcome::Discarded);
        }

        let message = match (ticket.action, response) {
            (EngineAction::Triangulate, EngineResponse::Triangulated(result)) => {
                let count = result.triangles.len();
                self.store.set_triangles(result.triangles);
                format!("Triangulation with {count} triangles computed.")
            }
            (EngineAction::TriangulateSimplified, EngineResponse::Triangulated(result)) => {
                let count = result.triangles.len();
                self.store.apply_simplified_triangulation(result.triangles)?;
                format!("Triangulation with {count} triangles computed.")
            }
            (EngineAction::Tetrahedralize, EngineResponse::Tetrahedralized(result)) => {
                let count = result.tetrahedra.len();
                self.store.set_tetrahedra(result.tetrahedra);
                format!("Tetrahedralization with {count} tetrahedra computed.")
            }
            (EngineAction::Cluster, EngineResponse::Clustered(result)) => {
                let count = result.clusters.len();
                self.apply_clustering(result);
                format!("Clustering produced {count} clusters.")
            }
            (EngineAction::Simplify, EngineResponse::Simplified(result)) => {
                let count = result.simplified_vertices.len();
                self.store.apply_simplification(result.simplified_vertices)?;
                format!("Simplification produced {count} representative vertices.")
            }
            (action, other) => {
                log::error!("{action}: unexpected `{}` response", other.kind());
                return Err(WorkflowError::ResponseMismatch {
                    action,
                    kind: other.kind(),
                });
            }
        };

        log::info!("{}: {message}", ticket.action);
        self.notifications.push(Notification::success(message));
        Ok(Outcome::Applied)
    }

    /// Records an engine failure. The store is left untouched.
    pub fn fail(&mut self, ticket: Ticket, error: EngineError) -> Result<Outcome, WorkflowError> {
        if !self.release(ticket)? {
            return Ok(Outcome::Discarded);
        }
        log::error!("{} failed: {error}", ticket.action);
        self.notifications.push(Notification::error(error.to_string()));
        Ok(Outcome::Failed(error))
    }

    /// Issues `action` against `engine` and applies the answer in one step.
    pub fn run<E>(&mut self, action: EngineAction, engine: &mut E) -> Result<Outcome, WorkflowError>
    where
        E: GeometryEngine + ?Sized,
    {
        let pending = self.begin(action)?;
        match engine.dispatch(&pending.request) {
            Ok(response) => self.complete(pending.ticket, response),
            Err(error) => self.fail(pending.ticket, error),
        }
    }

    pub fn cluster<E: GeometryEngine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> Result<Outcome, WorkflowError> {
        self.run(EngineAction::Cluster, engine)
    }

    pub fn simplify<E: GeometryEngine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> Result<Outcome, WorkflowError> {
        self.run(EngineAction::Simplify, engine)
    }

    pub fn triangulate<E: GeometryEngine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> Result<Outcome, WorkflowError> {
        self.run(EngineAction::Triangulate, engine)
    }

    pub fn triangulate_from_simplified<E: GeometryEngine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> Result<Outcome, WorkflowError> {
        self.run(EngineAction::TriangulateSimplified, engine)
    }

    pub fn tetrahedralize<E: GeometryEngine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> Result<Outcome, WorkflowError> {
        self.run(EngineAction::Tetrahedralize, engine)
    }

    // ───────────────────────────── helpers ─────────────────────────────

    fn request_for(&self, action: EngineAction) -> EngineRequest {
        let store = &self.store;
        let triangulation = |vertices: &[Vertex3]| TriangulationRequest {
            vertices: vertices.to_vec(),
            epsilon: store.epsilon(),
        };
        match action {
            EngineAction::Cluster => EngineRequest::Cluster(ClusteringRequest {
                vertices: store.vertices().to_vec(),
                grid_size: self.grid_size,
            }),
            EngineAction::Simplify => EngineRequest::Simplify(SimplificationRequest {
                clusters: store.clusters().to_vec(),
            }),
            EngineAction::Triangulate => {
                EngineRequest::Triangulate(triangulation(store.vertices()))
            }
            EngineAction::TriangulateSimplified => {
                EngineRequest::Triangulate(triangulation(store.simplified_vertices()))
            }
            EngineAction::Tetrahedralize => {
                EngineRequest::Tetrahedralize(triangulation(store.vertices()))
            }
        }
    }

    /// Frees the slot held by `ticket`. Returns `false` for stale tickets.
    fn release(&mut self, ticket: Ticket) -> Result<bool, WorkflowError> {
        if ticket.generation != self.generation {
            log::info!(
                "discarding stale {} response (ticket {}, generation {} != {})",
                ticket.action,
                ticket.id,
                ticket.generation,
                self.generation
            );
            return Ok(false);
        }

        let slot = &mut self.in_flight[ticket.action.slot()];
        if *slot != Some(ticket) {
            return Err(WorkflowError::UnknownTicket(ticket.id));
        }
        *slot = None;
        Ok(true)
    }

    fn apply_clustering(&mut self, result: ClusteringResult) {
        let ClusteringResult {
            clusters,
            cluster_rectangles,
        } = result;
        let rectangles = if cluster_rectangles.is_empty() {
            clusters.iter().map(ClusterRectangle::from).collect()
        } else {
            cluster_rectangles
        };

        for rectangle in &rectangles {
            if let Err(err) = rectangle.bounds.validate() {
                log::warn!("cluster rectangle `{}`: {err}", rectangle.id);
            }
        }
        self.store.apply_clustering(clusters, rectangles);
    }

    fn invalidate_in_flight(&mut self, reason: &str) {
        self.generation = self.generation.wrapping_add(1);
        let abandoned = self.in_flight.iter_mut().filter_map(Option::take).count();
        if abandoned > 0 {
            log::info!("{reason}: abandoning {abandoned} in-flight request(s)");
        }
    }

    fn require_method(
        &self,
        action: EngineAction,
        required: TriangulationMethod,
    ) -> Result<(), WorkflowError> {
        if self.store.method() == required {
            Ok(())
        } else {
            Err(WorkflowError::WrongMethod { action, required })
        }
    }

    fn require_dimension(
        &self,
        action: EngineAction,
        required: Dimension,
    ) -> Result<(), WorkflowError> {
        if self.store.dimension() == required {
            Ok(())
        } else {
            Err(WorkflowError::WrongDimension { action, required })
        }
    }

    fn require_vertices(&self, action: EngineAction, required: usize) -> Result<(), WorkflowError> {
        let actual = self.store.vertices().len();
        if actual >= required {
            Ok(())
        } else {
            Err(WorkflowError::NotEnoughVertices {
                action,
                required,
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        LocalEngine, SimplificationResult, TetrahedralizationResult, TriangulationResult,
    };
    use crate::geom::{ClusterBounds, Triangle3};
    use crate::notify::Level;
    use crate::store::{Cluster, Stage};

    fn seeded(dimension: Dimension, method: TriangulationMethod) -> Session {
        Session::new(SessionConfig {
            seed: Some(42),
            initial_dimension: dimension,
            initial_method: method,
            ..SessionConfig::default()
        })
        .expect("valid config")
    }

    fn grid_points() -> Vec<Vertex3> {
        vec![
            Vertex3::planar(0.1, 0.1),
            Vertex3::planar(0.6, 0.4),
            Vertex3::planar(1.4, 0.2),
            Vertex3::planar(1.8, 0.9),
            Vertex3::planar(0.3, 1.5),
            Vertex3::planar(1.2, 1.7),
        ]
    }

    fn triangle(id: &str) -> Triangle3 {
        Triangle3::new(
            id,
            Vertex3::planar(0.0, 0.0),
            Vertex3::planar(1.0, 0.0),
            Vertex3::planar(0.0, 1.0),
        )
    }

    #[test]
    fn regeneration_respects_dimension() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::Direct);
        session.regenerate_vertices(25).expect("in range");
        let vertices = session.store().vertices();
        assert_eq!(vertices.len(), 25);
        assert!(vertices.iter().all(|v| v.y == 0.0));
        assert!(vertices.iter().all(|v| (-2.5..2.5).contains(&v.x) && (-2.5..2.5).contains(&v.z)));

        session.set_dimension(Dimension::Three);
        session.regenerate_vertices(30).expect("in range");
        let vertices = session.store().vertices();
        assert!(vertices.iter().all(|v| (-2.5..2.5).contains(&v.y)));
        assert!(vertices.iter().any(|v| v.y != 0.0));
    }

    #[test]
    fn regeneration_rejects_out_of_range_counts() {
        let mut session = seeded(Dimension::Three, TriangulationMethod::Direct);
        assert!(matches!(
            session.regenerate_vertices(3),
            Err(WorkflowError::VertexCountOutOfRange { min: 4, max: 100, .. })
        ));
        assert!(session.regenerate_vertices(101).is_err());
        assert!(session.store().vertices().is_empty());

        session.set_dimension(Dimension::Two);
        assert_eq!(session.regenerate_vertices(3), Ok(()));
    }

    #[test]
    fn seeded_sessions_generate_identical_vertices() {
        let mut a = seeded(Dimension::Three, TriangulationMethod::Direct);
        let mut b = seeded(Dimension::Three, TriangulationMethod::Direct);
        a.regenerate_vertices(10).expect("in range");
        b.regenerate_vertices(10).expect("in range");
        assert_eq!(a.store().vertices(), b.store().vertices());
    }

    #[test]
    fn guards_follow_method_and_stage() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::Direct);
        session.set_vertices(grid_points());

        assert!(matches!(
            session.check(EngineAction::Cluster),
            Err(WorkflowError::WrongMethod { .. })
        ));
        assert_eq!(session.check(EngineAction::Triangulate), Ok(()));
        assert!(matches!(
            session.check(EngineAction::Tetrahedralize),
            Err(WorkflowError::WrongDimension { .. })
        ));

        session.set_method(TriangulationMethod::VertexClustering);
        assert_eq!(session.check(EngineAction::Cluster), Ok(()));
        assert_eq!(session.check(EngineAction::Simplify), Err(WorkflowError::NotClustered));
        assert_eq!(
            session.check(EngineAction::TriangulateSimplified),
            Err(WorkflowError::NotSimplified)
        );
        assert!(matches!(
            session.check(EngineAction::Triangulate),
            Err(WorkflowError::WrongMethod { .. })
        ));
    }

    #[test]
    fn cluster_needs_three_vertices() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::VertexClustering);
        session.set_vertices(grid_points()[..2].to_vec());
        assert!(matches!(
            session.check(EngineAction::Cluster),
            Err(WorkflowError::NotEnoughVertices { required: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn one_request_per_action_at_a_time() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::Direct);
        session.set_vertices(grid_points());

        let pending = session.begin(EngineAction::Triangulate).expect("legal");
        assert!(session.is_busy(EngineAction::Triangulate));
        assert!(session.is_busy(EngineAction::TriangulateSimplified));
        assert_eq!(
            session.begin(EngineAction::Triangulate),
            Err(WorkflowError::Busy(EngineAction::Triangulate))
        );
        assert!(!session.controls().triangulate);

        let outcome = session
            .complete(
                pending.ticket,
                EngineResponse::Triangulated(TriangulationResult {
                    triangles: vec![triangle("t0")],
                }),
            )
            .expect("matching ticket");
        assert_eq!(outcome, Outcome::Applied);
        assert!(!session.is_busy(EngineAction::Triangulate));
        assert_eq!(session.store().triangles().len(), 1);

        let notes = session.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "Triangulation with 1 triangles computed.");
        assert!(session.notifications().is_empty());
    }

    #[test]
    fn reset_discards_late_responses() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::Direct);
        session.set_vertices(grid_points());
        let pending = session.begin(EngineAction::Triangulate).expect("legal");

        session.regenerate_vertices(5).expect("in range");
        assert!(!session.is_busy(EngineAction::Triangulate));
        let revision = session.store().revision();

        let outcome = session
            .complete(
                pending.ticket,
                EngineResponse::Triangulated(TriangulationResult {
                    triangles: vec![triangle("late")],
                }),
            )
            .expect("stale tickets are not errors");
        assert_eq!(outcome, Outcome::Discarded);
        assert!(session.store().triangles().is_empty());
        assert_eq!(session.store().revision(), revision);
        assert!(session.notifications().is_empty());
    }

    #[test]
    fn failure_leaves_store_untouched() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::VertexClustering);
        session.set_vertices(grid_points());
        session.cluster(&mut LocalEngine::new()).expect("legal");
        session.take_notifications();
        let snapshot = session.store().clone();

        let pending = session.begin(EngineAction::Simplify).expect("legal");
        let outcome = session
            .fail(pending.ticket, EngineError::Backend("engine crashed".to_owned()))
            .expect("matching ticket");

        assert_eq!(outcome, Outcome::Failed(EngineError::Backend("engine crashed".to_owned())));
        assert_eq!(session.store(), &snapshot);
        assert!(!session.is_busy(EngineAction::Simplify));
        let notes = session.take_notifications();
        assert_eq!(notes[0].level, Level::Error);
        assert_eq!(notes[0].message, "engine crashed");
    }

    #[test]
    fn mismatched_response_is_rejected() {
        let mut session = seeded(Dimension::Three, TriangulationMethod::Direct);
        session.regenerate_vertices(6).expect("in range");
        let pending = session.begin(EngineAction::Tetrahedralize).expect("legal");
        let err = session
            .complete(
                pending.ticket,
                EngineResponse::Simplified(SimplificationResult::default()),
            )
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::ResponseMismatch {
                action: EngineAction::Tetrahedralize,
                kind: "simplified",
            }
        );
        assert!(session.store().tetrahedra().is_empty());
        assert!(!session.is_busy(EngineAction::Tetrahedralize));
    }

    #[test]
    fn unknown_ticket_is_an_error() {
        let mut session = seeded(Dimension::Three, TriangulationMethod::Direct);
        session.regenerate_vertices(6).expect("in range");
        let forged = Ticket {
            id: 99,
            action: EngineAction::Tetrahedralize,
            generation: session.generation(),
        };
        assert_eq!(
            session.complete(
                forged,
                EngineResponse::Tetrahedralized(TetrahedralizationResult::default())
            ),
            Err(WorkflowError::UnknownTicket(99))
        );
    }

    #[test]
    fn missing_rectangles_are_derived_from_clusters() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::VertexClustering);
        session.set_vertices(grid_points());
        let pending = session.begin(EngineAction::Cluster).expect("legal");
        let clusters = vec![Cluster {
            id: "only".to_owned(),
            vertices: grid_points(),
            bounds: ClusterBounds::new(0.0, 2.0, 0.0, 2.0),
        }];
        session
            .complete(
                pending.ticket,
                EngineResponse::Clustered(ClusteringResult {
                    clusters,
                    cluster_rectangles: Vec::new(),
                }),
            )
            .expect("matching ticket");

        let rects = session.store().cluster_rectangles();
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].id, "only");
        assert_eq!(rects[0].vertex_count, 6);
        assert_eq!(session.store().stage(), Stage::Clustered);
    }

    #[test]
    fn pipeline_runs_against_local_engine() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::VertexClustering);
        let mut engine = LocalEngine::new();
        session.set_vertices(grid_points());

        assert!(session.cluster(&mut engine).expect("legal").is_applied());
        assert_eq!(session.check(EngineAction::Cluster), Err(WorkflowError::AlreadyClustered));
        assert!(session.simplify(&mut engine).expect("legal").is_applied());
        assert_eq!(session.check(EngineAction::Simplify), Err(WorkflowError::AlreadySimplified));
        assert_eq!(session.store().simplified_vertices().len(), 4);

        assert!(session.triangulate_from_simplified(&mut engine).expect("legal").is_applied());
        assert_eq!(session.store().stage(), Stage::Triangulated);
        assert_eq!(session.store().triangles().len(), 2);
    }

    /// Forwards to [`LocalEngine`] and remembers the tolerance it was given.
    #[derive(Default)]
    struct RecordingEngine {
        inner: LocalEngine,
        epsilons: Vec<f64>,
    }

    impl GeometryEngine for RecordingEngine {
        fn triangulate(
            &mut self,
            request: &TriangulationRequest,
        ) -> Result<TriangulationResult, EngineError> {
            self.epsilons.push(request.epsilon);
            self.inner.triangulate(request)
        }

        fn tetrahedralize(
            &mut self,
            request: &TriangulationRequest,
        ) -> Result<TetrahedralizationResult, EngineError> {
            self.epsilons.push(request.epsilon);
            self.inner.tetrahedralize(request)
        }

        fn cluster(
            &mut self,
            request: &ClusteringRequest,
        ) -> Result<ClusteringResult, EngineError> {
            self.inner.cluster(request)
        }

        fn simplify(
            &mut self,
            request: &SimplificationRequest,
        ) -> Result<SimplificationResult, EngineError> {
            self.inner.simplify(request)
        }
    }

    #[test]
    fn epsilon_reaches_the_engine() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::Direct);
        let mut engine = RecordingEngine::default();
        session.set_vertices(grid_points());
        session.set_epsilon(1e-6).expect("valid epsilon");
        assert!(session.triangulate(&mut engine).expect("legal").is_applied());

        session.set_dimension(Dimension::Three);
        session.regenerate_vertices(8).expect("in range");
        session.set_epsilon(0.0).expect("valid epsilon");
        assert!(session.tetrahedralize(&mut engine).expect("legal").is_applied());

        assert_eq!(engine.epsilons, vec![1e-6, 0.0]);
        assert!(session.set_epsilon(-1.0).is_err());
        assert_eq!(session.store().epsilon(), 0.0);
    }

    #[test]
    fn switching_to_three_cancels_in_flight_work() {
        let mut session = seeded(Dimension::Two, TriangulationMethod::VertexClustering);
        session.set_vertices(grid_points());
        let before = session.generation();
        session.begin(EngineAction::Cluster).expect("legal");

        session.set_dimension(Dimension::Three);
        assert!(session.generation() > before);
        assert_eq!(session.in_flight().count(), 0);
        assert!(matches!(
            session.check(EngineAction::Cluster),
            Err(WorkflowError::WrongDimension { .. })
        ));
    }
}
