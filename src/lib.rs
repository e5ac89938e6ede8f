//! # Clinsight
//!
//! Clinical risk inference and analysis engine.
//!
//! For a single patient snapshot, this crate answers: what is the risk
//! score, which features drove it, how would it change under a
//! hypothetical modification, how does the patient compare to a reference
//! population, and whether risk is trending up or down over repeated
//! assessments.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (Patient, Assessment, Trend)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (model artifact, CSV population
//!   table, SQLite history)
//! - `application`: Use cases orchestrating domain and ports

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use application::{ClinicalEngine, EngineConfig, EngineStatus, ExplainConfig};
pub use domain::{Assessment, PatientRecord, RiskBand, TrendResult};

use ports::PredictionError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// An engine collaborator that can be independently unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The fitted classifier artifact
    Scorer,
    /// The attribution background sample
    Explainer,
    /// The reference population table
    Cohort,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scorer => write!(f, "scorer"),
            Self::Explainer => write!(f, "explainer"),
            Self::Cohort => write!(f, "cohort"),
        }
    }
}

/// Main error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required artifact failed to load at startup; the engine is
    /// running degraded and this component is unavailable.
    #[error("{0} not ready: required artifact failed to load")]
    NotReady(Component),

    /// The prepared vector is incompatible with the loaded classifier's
    /// fitted schema. Fatal for the request: a deployment inconsistency.
    #[error("feature mismatch: model expects {expected:?}, got {got:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// Unexpected numeric failure inside an auxiliary analysis.
    #[error("computation failed: {0}")]
    Computation(String),

    #[error("artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("population table error: {0}")]
    Population(#[from] adapters::PopulationError),

    #[error("storage error: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<PredictionError> for EngineError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::FeatureMismatch { expected, got } => {
                Self::FeatureMismatch { expected, got }
            }
            PredictionError::NonFinite => {
                Self::Computation("prediction produced a non-finite value".into())
            }
        }
    }
}
