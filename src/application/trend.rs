//! Trend analyzer: risk velocity over a subject's recent assessments.
//!
//! Fits an ordinary least-squares line over the most recent scores and
//! classifies the slope into a discrete alert state.

use std::sync::Arc;

use crate::adapters::StorageError;
use crate::domain::{
    Assessment, HistoryRecord, PatientRecord, TrendResult, TrendState,
};
use crate::ports::HistoryStore;
use crate::EngineError;

/// At most this many recent points enter the fit.
pub const TREND_WINDOW: usize = 5;

/// Compute risk velocity over chronologically ordered scores.
///
/// Fewer than two points yields (0.0, InsufficientData). Otherwise the
/// slope of an OLS fit against index positions 0..n-1 over the most
/// recent [`TREND_WINDOW`] points, rounded to 4 decimal places. A
/// degenerate fit recovers to (0.0, Stable) rather than failing the
/// request.
#[must_use]
pub fn velocity(scores: &[f64]) -> TrendResult {
    if scores.len() < 2 {
        return TrendResult {
            slope: 0.0,
            state: TrendState::InsufficientData,
        };
    }

    let window = &scores[scores.len().saturating_sub(TREND_WINDOW)..];
    let n = window.len() as f64;

    let x_mean = (n - 1.0) / 2.0;
    let y_mean = window.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in window.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    let slope = numerator / denominator;
    if !slope.is_finite() {
        tracing::warn!("Degenerate trend fit, reporting zero slope");
        return TrendResult {
            slope: 0.0,
            state: TrendState::Stable,
        };
    }

    TrendResult {
        state: TrendState::from_slope(slope),
        slope: (slope * 10_000.0).round() / 10_000.0,
    }
}

/// Service for longitudinal risk-trend analysis over the history store.
pub struct TrendService<H: HistoryStore> {
    store: Arc<H>,
}

impl<H> TrendService<H>
where
    H: HistoryStore,
    H::Error: Into<StorageError>,
{
    /// Create a new trend service.
    pub fn new(store: Arc<H>) -> Self {
        Self { store }
    }

    /// Append an assessment to the subject's history.
    ///
    /// # Errors
    /// Returns error if the storage operation fails.
    pub fn record_assessment(
        &self,
        subject_id: &str,
        record: &PatientRecord,
        assessment: &Assessment,
    ) -> Result<HistoryRecord, EngineError> {
        let history = HistoryRecord::new(subject_id, record.clone(), assessment);
        self.store
            .append(&history)
            .map_err(|e| EngineError::Storage(e.into()))?;
        Ok(history)
    }

    /// Risk velocity over the subject's most recent assessments.
    ///
    /// # Errors
    /// Returns error if the storage operation fails.
    pub fn velocity_for(&self, subject_id: &str) -> Result<TrendResult, EngineError> {
        let recent = self
            .store
            .recent(subject_id, TREND_WINDOW)
            .map_err(|e| EngineError::Storage(e.into()))?;

        // The store returns newest first; the fit wants chronological order.
        let scores: Vec<f64> = recent.iter().rev().map(|r| r.score).collect();
        Ok(velocity(&scores))
    }

    /// Most recent history (newest first) together with the trend.
    ///
    /// # Errors
    /// Returns error if the storage operation fails.
    pub fn history(
        &self,
        subject_id: &str,
        limit: usize,
    ) -> Result<(Vec<HistoryRecord>, TrendResult), EngineError> {
        let records = self
            .store
            .recent(subject_id, limit)
            .map_err(|e| EngineError::Storage(e.into()))?;
        let trend = self.velocity_for(subject_id)?;
        Ok((records, trend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteHistoryStore;
    use crate::domain::{Sex, SmokingHistory};

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
    fn test_steadily_rising_scores_are_critical() {
        let result = velocity(&[0.1, 0.2, 0.3, 0.4, 0.5]);
        assert!(result.slope > 0.0);
        assert_eq!(result.state, TrendState::Critical);
        assert!((result.slope - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let result = velocity(&[0.4]);
        assert_eq!(result.state, TrendState::InsufficientData);
        assert!(result.slope.abs() < f64::EPSILON);
    }

    #[test]
    fn test_only_last_five_points_enter_the_fit() {
        // Early spike followed by a flat tail: window excludes the spike.
        let result = velocity(&[0.9, 0.3, 0.3, 0.3, 0.3, 0.3, 0.3]);
        assert_eq!(result.state, TrendState::Stable);
        assert!(result.slope.abs() < 1e-9);
    }

    #[test]
    fn test_decreasing_scores_are_improving() {
        let result = velocity(&[0.6, 0.5, 0.4, 0.35, 0.3]);
        assert_eq!(result.state, TrendState::Improving);
        assert!(result.slope < 0.0);
    }

    #[test]
    fn test_slope_rounded_to_four_decimals() {
        let result = velocity(&[0.10001, 0.10002]);
        assert!((result.slope * 10_000.0).fract().abs() < 1e-9);
    }

    #[test]
    fn test_velocity_through_store() {
        let store = Arc::new(SqliteHistoryStore::in_memory().expect("db"));
        let service = TrendService::new(store);

        let base = chrono::Utc::now();
        for (i, score) in [0.1, 0.2, 0.3, 0.4, 0.5].iter().enumerate() {
            let mut assessment = Assessment::new(*score);
            assessment.created_at = base + chrono::Duration::seconds(i as i64);
            service
                .record_assessment("subject-1", &sample_record(), &assessment)
                .expect("Should record");
        }

        let trend = service.velocity_for("subject-1").expect("Should compute");
        assert_eq!(trend.state, TrendState::Critical);
        assert!((trend.slope - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let store = Arc::new(SqliteHistoryStore::in_memory().expect("db"));
        let service = TrendService::new(store);

        let trend = service.velocity_for("nobody").expect("Should compute");
        assert_eq!(trend.state, TrendState::InsufficientData);
    }
}
