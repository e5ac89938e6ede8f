//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no external service
//! dependencies. All types are serializable.

mod assessment;
mod cohort;
mod history;
mod patient;

pub use assessment::{
    Assessment, AttributionEntry, ImpactLabel, RiskBand, ScenarioResult, SimulationResult,
    TrendResult, TrendState, LOW_MODERATE_BOUNDARY, MODERATE_HIGH_BOUNDARY, NEUTRAL_IMPACT_ZONE,
    TREND_CRITICAL_SLOPE, TREND_IMPROVING_SLOPE, TREND_WARNING_SLOPE,
};
pub use cohort::{patient_vitals, CohortPercentiles, DigitalTwin, VITAL_COLUMNS};
pub use history::HistoryRecord;
pub use patient::{
    BmiCategory, FeatureVector, PatientRecord, RecordPatch, Sex, SmokingHistory, FEATURE_COLUMNS,
};
