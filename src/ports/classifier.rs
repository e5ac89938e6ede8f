//! Classifier port: Trait for the pre-fitted probabilistic classifier.
//!
//! This trait abstracts the serialized model artifact from the
//! application logic. Implementations consume a trained, already-fitted
//! binary classifier; no training or online update happens behind it.

use crate::domain::FeatureVector;

/// Error type for prediction calls.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    /// The prepared vector's columns do not match what the loaded
    /// classifier was fitted on. Signals a deployment inconsistency.
    #[error("feature columns do not match the fitted model: expected {expected:?}, got {got:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// The model produced a non-finite value.
    #[error("prediction produced a non-finite value")]
    NonFinite,
}

/// Trait for probability scoring against a fitted binary classifier.
///
/// Implementations must be safe for unsynchronized concurrent reads:
/// scoring is a pure computation over immutable loaded parameters.
pub trait Classifier: Send + Sync {
    /// Feature column names the classifier was fitted on, in order.
    fn feature_columns(&self) -> &[String];

    /// Probability of the positive class for a prepared vector, in [0, 1].
    ///
    /// The probability is surfaced exactly as the fitted artifact produces
    /// it; calibration, if any, is baked into the artifact.
    ///
    /// # Errors
    /// Returns [`PredictionError::FeatureMismatch`] if the vector's columns
    /// do not match the fitted schema, [`PredictionError::NonFinite`] if
    /// the computation degenerates.
    fn predict_probability(&self, vector: &FeatureVector) -> Result<f64, PredictionError>;
}
