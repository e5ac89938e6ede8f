//! Application layer: use cases orchestrating domain and ports.

pub mod cohort;
pub mod engine;
pub mod explain;
pub mod features;
pub mod scoring;
pub mod simulate;
pub mod trend;
pub mod worker;

pub use cohort::{CohortService, DEFAULT_TWINS};
pub use engine::{ClinicalEngine, EngineConfig, EngineStatus};
pub use explain::{ExplainConfig, ExplainService};
pub use scoring::ScoringService;
pub use simulate::SimulationService;
pub use trend::{velocity, TrendService, TREND_WINDOW};
pub use worker::{ExplainProgress, ExplainWorker, ExplainWorkerHandle};
