//! Counterfactual simulator: what-if rescoring and the scenario battery.
//!
//! Modifications are always applied to a copy of the caller's record; the
//! original is never mutated.

use crate::application::scoring::ScoringService;
use crate::domain::{PatientRecord, RecordPatch, ScenarioResult, SimulationResult};
use crate::ports::Classifier;
use crate::EngineError;

/// HbA1c floor for the glycemic-control scenario.
const HBA1C_SCENARIO_FLOOR: f64 = 5.0;

/// Service for counterfactual simulation.
pub struct SimulationService<C: Classifier> {
    scoring: ScoringService<C>,
}

impl<C: Classifier> SimulationService<C> {
    /// Create a new simulation service on top of a scoring service.
    pub fn new(scoring: ScoringService<C>) -> Self {
        Self { scoring }
    }

    /// Rescore under a set of field modifications.
    ///
    /// Unlisted fields are unchanged; the caller's record is untouched.
    /// An empty patch yields `new_score == original_score`.
    ///
    /// # Errors
    /// Returns error if either scoring pass fails.
    pub fn simulate(
        &self,
        record: &PatientRecord,
        modifications: &RecordPatch,
    ) -> Result<SimulationResult, EngineError> {
        let original = self.scoring.score(record)?;
        let modified = modifications.apply(record);
        let updated = self.scoring.score(&modified)?;

        Ok(SimulationResult {
            original_score: original.score,
            new_score: updated.score,
            risk_reduction: original.score - updated.score,
            modified,
        })
    }

    /// Evaluate the fixed battery of clinically motivated improvements.
    ///
    /// Each scenario is conditionally applicable; scenarios whose
    /// precondition fails are omitted entirely.
    ///
    /// # Errors
    /// Returns error if a scoring pass fails.
    pub fn generate_scenarios(
        &self,
        record: &PatientRecord,
    ) -> Result<Vec<ScenarioResult>, EngineError> {
        let original = self.scoring.score(record)?.score;
        let mut scenarios = Vec::new();

        if record.bmi > 25.0 {
            let patch = RecordPatch {
                bmi: Some(record.bmi * 0.95),
                ..Default::default()
            };
            let modified = patch.apply(record);
            let new_score = self.scoring.score(&modified)?.score;
            scenarios.push(ScenarioResult {
                name: "Lose 5% Weight",
                description: format!("Reduce BMI to {:.1}", modified.bmi),
                original_score: original,
                new_score,
                risk_reduction: original - new_score,
            });
        }

        if record.hba1c > 6.0 {
            let target = (record.hba1c - 1.0).max(HBA1C_SCENARIO_FLOOR);
            let patch = RecordPatch {
                hba1c: Some(target),
                ..Default::default()
            };
            let modified = patch.apply(record);
            let new_score = self.scoring.score(&modified)?.score;
            scenarios.push(ScenarioResult {
                name: "Improve Glycemic Control",
                description: format!("Lower HbA1c to {target:.1}"),
                original_score: original,
                new_score,
                risk_reduction: original - new_score,
            });
        }

        if record.smoking_history.is_active() {
            let patch = RecordPatch {
                smoking_history: Some(crate::domain::SmokingHistory::Never),
                ..Default::default()
            };
            let modified = patch.apply(record);
            let new_score = self.scoring.score(&modified)?.score;
            scenarios.push(ScenarioResult {
                name: "Quit Smoking",
                description: "Change status to 'Never'".to_string(),
                original_score: original,
                new_score,
                risk_reduction: original - new_score,
            });
        }

        Ok(scenarios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifact::{test_pipeline, LogisticArtifact};
    use crate::domain::{Sex, SmokingHistory};
    use std::sync::Arc;

    fn service() -> SimulationService<LogisticArtifact> {
        let artifact = LogisticArtifact::from_pipeline(test_pipeline()).expect("build");
        SimulationService::new(ScoringService::new(Arc::new(artifact)))
    }

    fn sample_record() -> PatientRecord {
        PatientRecord {
            sex: Sex::Female,
            age: 45.0,
            hypertension: 0,
            heart_disease: 0,
            smoking_history: SmokingHistory::Never,
            bmi: 28.5,
            hba1c: 6.2,
            blood_glucose: 140.0,
        }
    }

    #[test]
    fn test_empty_modifications_keep_score() {
        let result = service()
            .simulate(&sample_record(), &RecordPatch::default())
            .expect("Should simulate");

        assert!((result.new_score - result.original_score).abs() < f64::EPSILON);
        assert!(result.risk_reduction.abs() < f64::EPSILON);
    }

    #[test]
    fn test_lowering_hba1c_reduces_risk() {
        let record = sample_record();
        let patch = RecordPatch {
            hba1c: Some(5.0),
            ..Default::default()
        };

        let result = service().simulate(&record, &patch).expect("Should simulate");
        assert!(result.new_score <= result.original_score);
        assert!(result.risk_reduction >= 0.0);
        assert!((result.modified.hba1c - 5.0).abs() < f64::EPSILON);
        // Caller's record untouched
        assert!((record.hba1c - 6.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_risk_reduction_may_be_negative() {
        let patch = RecordPatch {
            hba1c: Some(9.5),
            blood_glucose: Some(220.0),
            ..Default::default()
        };

        let result = service()
            .simulate(&sample_record(), &patch)
            .expect("Should simulate");
        assert!(result.risk_reduction < 0.0);
    }

    #[test]
    fn test_scenarios_respect_preconditions() {
        // Overweight, elevated HbA1c, never-smoker: exactly two scenarios.
        let scenarios = service()
            .generate_scenarios(&sample_record())
            .expect("Should generate");

        let names: Vec<&str> = scenarios.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Lose 5% Weight", "Improve Glycemic Control"]);
    }

    #[test]
    fn test_quit_smoking_only_for_active_categories() {
        let mut record = sample_record();
        record.smoking_history = SmokingHistory::Current;

        let scenarios = service().generate_scenarios(&record).expect("generate");
        assert!(scenarios.iter().any(|s| s.name == "Quit Smoking"));

        record.smoking_history = SmokingHistory::Former;
        let scenarios = service().generate_scenarios(&record).expect("generate");
        assert!(!scenarios.iter().any(|s| s.name == "Quit Smoking"));
    }

    #[test]
    fn test_no_scenarios_for_healthy_record() {
        let mut record = sample_record();
        record.bmi = 22.0;
        record.hba1c = 5.4;

        let scenarios = service().generate_scenarios(&record).expect("generate");
        assert!(scenarios.is_empty());
    }

    #[test]
    fn test_hba1c_scenario_floors_at_five() {
        let mut record = sample_record();
        record.hba1c = 5.5;
        // Above 6.0 triggers; 5.5 does not.
        let scenarios = service().generate_scenarios(&record).expect("generate");
        assert!(!scenarios
            .iter()
            .any(|s| s.name == "Improve Glycemic Control"));

        record.hba1c = 6.1;
        let scenarios = service().generate_scenarios(&record).expect("generate");
        let scenario = scenarios
            .iter()
            .find(|s| s.name == "Improve Glycemic Control")
            .expect("scenario present");
        assert!(scenario.description.contains("5.1"));
    }
}
