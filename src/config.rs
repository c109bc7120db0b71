//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::store::{Dimension, TriangulationMethod};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("coordinate span must be a positive finite number, got {0}")]
    InvalidSpan(f64),
    #[error("grid size must be a positive finite number, got {0}")]
    InvalidGridSize(f64),
    #[error("epsilon must be a non-negative finite number, got {0}")]
    InvalidEpsilon(f64),
    #[error("max vertices {max} is below the minimum of {min}")]
    MaxVerticesTooSmall { max: usize, min: usize },
    #[error("initial vertex count {count} is outside [{min}, {max}]")]
    InitialCountOutOfRange { count: usize, min: usize, max: usize },
}

/// Tunables for a [`Session`](crate::workflow::Session).
///
/// Deserializes from a partial camelCase object; missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Width of the generation range on every axis, centered on the origin.
    pub coordinate_span: f64,
    pub max_vertices: usize,
    pub initial_vertex_count: usize,
    pub grid_size: f64,
    pub epsilon: f64,
    /// Fixed seed for reproducible vertex generation.
    pub seed: Option<u64>,
    pub initial_dimension: Dimension,
    pub initial_method: TriangulationMethod,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            coordinate_span: 5.0,
            max_vertices: 100,
            initial_vertex_count: 4,
            grid_size: 1.0,
            epsilon: 1e-10,
            seed: None,
            initial_dimension: Dimension::Three,
            initial_method: TriangulationMethod::Direct,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.coordinate_span.is_finite() && self.coordinate_span > 0.0) {
            return Err(ConfigError::InvalidSpan(self.coordinate_span));
        }
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }

        let floor = Dimension::Three.min_vertices();
        if self.max_vertices < floor {
            return Err(ConfigError::MaxVerticesTooSmall {
                max: self.max_vertices,
                min: floor,
            });
        }

        let min = self.initial_dimension.min_vertices();
        if !(min..=self.max_vertices).contains(&self.initial_vertex_count) {
            return Err(ConfigError::InitialCountOutOfRange {
                count: self.initial_vertex_count,
                min,
                max: self.max_vertices,
            });
        }
        Ok(())
    }

    /// Half of [`Self::coordinate_span`]; generated coordinates fall in
    /// `[-half_span, half_span)`.
    #[must_use]
    pub fn half_span(&self) -> f64 {
        self.coordinate_span * 0.5
    }
}
