#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod geom;
pub mod notify;
pub mod selectors;
pub mod store;
pub mod visual;
pub mod workflow;

use std::fmt;

use config::SessionConfig;
use engine::{
    ClusteringResult, EngineError, EngineResponse, LocalEngine, SimplificationResult,
    TetrahedralizationResult, TriangulationResult,
};
use geom::Vertex3;
use serde::Serialize;
use store::{Dimension, TriangulationMethod};
use visual::Scene;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;
use workflow::{EngineAction, Session, Ticket, WorkflowError};

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Public entry point for the front-end.
///
/// Wraps a [`Session`] and the [`Scene`] that mirrors it. Engine actions can
/// be driven through the asynchronous bridge (`begin_action` /
/// `complete_action` / `fail_action`) or run in-process with `run_local`.
#[wasm_bindgen]
pub struct Viewer {
    initialized: bool,
    session: Session,
    scene: Scene,
    engine: LocalEngine,
}

#[wasm_bindgen]
impl Viewer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Viewer {
        Viewer::from_session(Session::default())
    }

    /// Maakt een viewer met een (gedeeltelijke) configuratie.
    #[wasm_bindgen]
    pub fn with_config(config: JsValue) -> Result<Viewer, JsValue> {
        let config: SessionConfig = if config.is_undefined() || config.is_null() {
            SessionConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
        };
        let session = Session::new(config).map_err(to_js_error)?;
        Ok(Viewer::from_session(session))
    }

    #[wasm_bindgen]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Accepts `TWO`/`THREE` (also `2d`/`3d`).
    #[wasm_bindgen]
    pub fn set_dimension(&mut self, dimension: &str) -> Result<(), JsValue> {
        let dimension: Dimension = dimension.parse().map_err(|err: String| js_error(&err))?;
        self.session.set_dimension(dimension);
        Ok(())
    }

    /// Accepts `DIRECT` or `VERTEX_CLUSTERING`.
    #[wasm_bindgen]
    pub fn set_method(&mut self, method: &str) -> Result<(), JsValue> {
        let method: TriangulationMethod =
            method.parse().map_err(|err: String| js_error(&err))?;
        self.session.set_method(method);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<(), JsValue> {
        self.session.set_epsilon(epsilon).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn set_grid_size(&mut self, grid_size: f64) -> Result<(), JsValue> {
        self.session.set_grid_size(grid_size).map_err(to_js_error)
    }

    /// Genereer `count` willekeurige vertices voor de actieve dimensie.
    #[wasm_bindgen]
    pub fn generate_vertices(&mut self, count: usize) -> Result<(), JsValue> {
        self.session.regenerate_vertices(count).map_err(to_js_error)
    }

    /// Replaces the vertex set with an array of `{x, y, z}` objects.
    #[wasm_bindgen]
    pub fn set_vertices(&mut self, vertices: JsValue) -> Result<(), JsValue> {
        let vertices: Vec<Vertex3> = serde_wasm_bindgen::from_value(vertices).map_err(to_js_error)?;
        self.session.set_vertices(vertices);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn lift_vertices(&mut self) -> Result<usize, JsValue> {
        self.session.lift_vertices().map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn lift_triangles(&mut self) -> Result<usize, JsValue> {
        self.session.lift_triangles().map_err(to_js_error)
    }

    /// Name of the action behind the "Triangulate" control in the current
    /// dimension.
    #[wasm_bindgen]
    pub fn triangulation_action(&self) -> String {
        self.session.triangulation_action().name().to_owned()
    }

    #[wasm_bindgen]
    pub fn is_busy(&self, action: &str) -> Result<bool, JsValue> {
        Ok(self.session.is_busy(parse_action(action)?))
    }

    /// Start een engine-actie. Geeft `{ ticket, request: { command, request } }`
    /// terug; `command` is de naam van het backend-commando.
    #[wasm_bindgen]
    pub fn begin_action(&mut self, action: &str) -> Result<JsValue, JsValue> {
        let pending = self
            .session
            .begin(parse_action(action)?)
            .map_err(to_js_error)?;
        to_js_value(&pending)
    }

    /// Hands the backend's answer for `ticket` to the session. `response` is
    /// the plain result object of the command. Returns `applied` or
    /// `discarded`.
    #[wasm_bindgen]
    pub fn complete_action(&mut self, ticket: JsValue, response: JsValue) -> Result<String, JsValue> {
        let ticket: Ticket = serde_wasm_bindgen::from_value(ticket).map_err(to_js_error)?;
        let response = decode_response(ticket.action, response)?;
        let outcome = self.session.complete(ticket, response).map_err(to_js_error)?;
        Ok(outcome.as_str().to_owned())
    }

    /// Reports a backend failure for `ticket`. Returns `failed` or
    /// `discarded`.
    #[wasm_bindgen]
    pub fn fail_action(&mut self, ticket: JsValue, message: &str) -> Result<String, JsValue> {
        let ticket: Ticket = serde_wasm_bindgen::from_value(ticket).map_err(to_js_error)?;
        let outcome = self
            .session
            .fail(ticket, EngineError::Backend(message.to_owned()))
            .map_err(to_js_error)?;
        Ok(outcome.as_str().to_owned())
    }

    /// Runs `action` against the in-process engine.
    #[wasm_bindgen]
    pub fn run_local(&mut self, action: &str) -> Result<String, JsValue> {
        let action = parse_action(action)?;
        let outcome = self
            .session
            .run(action, &mut self.engine)
            .map_err(to_js_error)?;
        Ok(outcome.as_str().to_owned())
    }

    /// Haalt de primitieven op in een "diff" formaat.
    #[wasm_bindgen]
    pub fn get_primitives_diff(&mut self) -> Result<JsValue, JsValue> {
        let diff = self.scene.sync(self.session.store());
        to_js_value(&diff)
    }

    /// Forces the next diff to contain every primitive.
    #[wasm_bindgen]
    pub fn reset_scene(&mut self) {
        self.scene.reset();
    }

    #[wasm_bindgen]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        to_js_value(&selectors::summary(self.session.store()))
    }

    #[wasm_bindgen]
    pub fn get_controls(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.session.controls())
    }

    #[wasm_bindgen]
    pub fn get_cluster_render_data(&self) -> Result<JsValue, JsValue> {
        to_js_value(&selectors::cluster_render_data(
            self.session.store().cluster_rectangles(),
        ))
    }

    /// Full store snapshot.
    #[wasm_bindgen]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        to_js_value(self.session.store())
    }

    #[wasm_bindgen]
    pub fn take_notifications(&mut self) -> Result<JsValue, JsValue> {
        to_js_value(&self.session.take_notifications())
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewer {
    fn from_session(session: Session) -> Self {
        Self {
            initialized: true,
            session,
            scene: Scene::new(),
            engine: LocalEngine::new(),
        }
    }

    /// Native counterpart of `with_config`.
    pub fn from_config(config: SessionConfig) -> Result<Self, WorkflowError> {
        Ok(Self::from_session(Session::new(config)?))
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// Decodes a plain backend result into the response kind `action` expects.
fn decode_response(action: EngineAction, value: JsValue) -> Result<EngineResponse, JsValue> {
    let response = match action {
        EngineAction::Triangulate | EngineAction::TriangulateSimplified => {
            EngineResponse::Triangulated(
                serde_wasm_bindgen::from_value::<TriangulationResult>(value).map_err(to_js_error)?,
            )
        }
        EngineAction::Tetrahedralize => EngineResponse::Tetrahedralized(
            serde_wasm_bindgen::from_value::<TetrahedralizationResult>(value)
                .map_err(to_js_error)?,
        ),
        EngineAction::Cluster => EngineResponse::Clustered(
            serde_wasm_bindgen::from_value::<ClusteringResult>(value).map_err(to_js_error)?,
        ),
        EngineAction::Simplify => EngineResponse::Simplified(
            serde_wasm_bindgen::from_value::<SimplificationResult>(value).map_err(to_js_error)?,
        ),
    };
    Ok(response)
}

fn parse_action(action: &str) -> Result<EngineAction, JsValue> {
    action.parse().map_err(|err: String| js_error(&err))
}

fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsError::new(&err.to_string()).into())
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
