use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, EngineRequest};

/// Engine-backed user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineAction {
    Cluster,
    Simplify,
    /// Direct triangulation of the raw vertices.
    Triangulate,
    /// Triangulation of the simplified vertices at the end of the pipeline.
    TriangulateSimplified,
    Tetrahedralize,
}

impl EngineAction {
    pub const ALL: [Self; 5] = [
        Self::Cluster,
        Self::Simplify,
        Self::Triangulate,
        Self::TriangulateSimplified,
        Self::Tetrahedralize,
    ];

    pub(crate) const SLOTS: usize = 4;

    /// Both triangulations write the triangle slice and share one slot.
    pub(crate) const fn slot(self) -> usize {
        match self {
            Self::Cluster => 0,
            Self::Simplify => 1,
            Self::Triangulate | Self::TriangulateSimplified => 2,
            Self::Tetrahedralize => 3,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Simplify => "simplify",
            Self::Triangulate => "triangulate",
            Self::TriangulateSimplified => "triangulate-simplified",
            Self::Tetrahedralize => "tetrahedralize",
        }
    }
}

impl fmt::Display for EngineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|action| action.name() == normalized)
            .ok_or_else(|| format!("unknown action `{}`", s.trim()))
    }
}

/// Handle for one in-flight engine request.
///
/// The generation is the session's reset counter at issue time; a response
/// whose ticket predates the latest reset is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    pub action: EngineAction,
    pub generation: u64,
}

/// Request payload plus the ticket that must accompany its response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub request: EngineRequest,
}

/// What happened to a response handed back to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The response was written to the store.
    Applied,
    /// The engine reported an error; the store is unchanged.
    Failed(EngineError),
    /// The ticket predates a reset; the response was ignored.
    Discarded,
}

impl Outcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Failed(_) => "failed",
            Self::Discarded => "discarded",
        }
    }
}
