//! Scoring service: probability scoring against the fitted classifier.
//!
//! Stateless after construction; the loaded classifier is read-only shared
//! state, so concurrent scoring requests need no locking.

use std::sync::Arc;

use crate::application::features::prepare;
use crate::domain::{Assessment, PatientRecord};
use crate::ports::Classifier;
use crate::EngineError;

/// Service for scoring patient records.
///
/// Every score is derived through feature preparation and the classifier;
/// there is no shortcut path. Scoring failures always propagate — this is
/// the engine's primary contract and is never downgraded to a default.
pub struct ScoringService<C: Classifier> {
    classifier: Arc<C>,
}

impl<C: Classifier> Clone for ScoringService<C> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<C: Classifier> ScoringService<C> {
    /// Create a new scoring service.
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    /// Shared handle to the underlying classifier.
    #[must_use]
    pub fn classifier(&self) -> Arc<C> {
        Arc::clone(&self.classifier)
    }

    /// Score a patient record.
    ///
    /// # Errors
    /// Returns [`EngineError::FeatureMismatch`] if the prepared vector is
    /// incompatible with the fitted schema, [`EngineError::Computation`]
    /// if the prediction degenerates.
    pub fn score(&self, record: &PatientRecord) -> Result<Assessment, EngineError> {
        let vector = prepare(record);
        let probability = self.classifier.predict_probability(&vector)?;

        tracing::debug!("Scored record: probability={probability:.4}");

        Ok(Assessment::new(probability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifact::{test_pipeline, LogisticArtifact};
    use crate::domain::{RiskBand, Sex, SmokingHistory};

    fn service() -> ScoringService<LogisticArtifact> {
        let artifact = LogisticArtifact::from_pipeline(test_pipeline()).expect("build");
        ScoringService::new(Arc::new(artifact))
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
    fn test_score_is_probability_with_consistent_band() {
        let assessment = service().score(&sample_record()).expect("Should score");

        assert!((0.0..=1.0).contains(&assessment.score));
        assert_eq!(assessment.band, RiskBand::from_score(assessment.score));
    }

    #[test]
    fn test_repeated_scoring_is_identical() {
        let service = service();
        let record = sample_record();

        let first = service.score(&record).expect("Should score");
        let second = service.score(&record).expect("Should score");
        assert!((first.score - second.score).abs() < f64::EPSILON);
    }

    #[test]
    fn test_higher_hba1c_scores_higher() {
        let service = service();
        let low = sample_record();
        let mut high = sample_record();
        high.hba1c = 8.5;

        let p_low = service.score(&low).expect("score").score;
        let p_high = service.score(&high).expect("score").score;
        assert!(p_high > p_low);
    }
}
