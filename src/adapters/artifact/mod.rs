//! Artifact adapter: Implementation of Classifier from a serialized model.
//!
//! Loads the scoring pipeline exported by the training side: a
//! standardizing logistic model (feature names, scaler statistics,
//! coefficients, intercept) serialized as JSON at a versioned path.
//!
//! The engine never trains or updates this artifact; it is read once at
//! startup and treated as read-only shared state thereafter. The raw
//! artifact bytes are fingerprinted with SHA-256 at load time so the
//! deployed model version is observable in logs and diagnostics.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::FeatureVector;
use crate::ports::{Classifier, PredictionError};

/// Artifact schema version this build understands.
const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid artifact format: {0}")]
    Format(String),

    #[error("Artifact schema violation: {0}")]
    Schema(String),
}

/// Model parameters exported by the training pipeline.
///
/// `scaler_mean` / `scaler_scale` reproduce the standardization fitted at
/// training time; `coefficients` and `intercept` are the fitted logistic
/// weights over standardized features. Calibration is baked into these
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedPipeline {
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// A loaded, validated scoring pipeline.
pub struct LogisticArtifact {
    pipeline: ExportedPipeline,
    fingerprint: String,
}

impl LogisticArtifact {
    /// Load and validate an artifact from a JSON file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or fails the
    /// shape sanity checks.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path)?;
        let fingerprint = sha256_hex(&bytes);

        let pipeline: ExportedPipeline = serde_json::from_slice(&bytes)
            .map_err(|e| ArtifactError::Format(e.to_string()))?;
        Self::validate(&pipeline)?;

        tracing::info!(
            "Loaded scoring artifact from {:?} (n_features={}, fingerprint={})",
            path,
            pipeline.feature_names.len(),
            &fingerprint[..16],
        );

        Ok(Self {
            pipeline,
            fingerprint,
        })
    }

    /// Build an artifact directly from exported parameters.
    ///
    /// The fingerprint is computed over the canonical JSON serialization.
    ///
    /// # Errors
    /// Returns error if the parameters fail the shape sanity checks.
    pub fn from_pipeline(pipeline: ExportedPipeline) -> Result<Self, ArtifactError> {
        Self::validate(&pipeline)?;
        let bytes = serde_json::to_vec(&pipeline)
            .map_err(|e| ArtifactError::Format(e.to_string()))?;
        Ok(Self {
            fingerprint: sha256_hex(&bytes),
            pipeline,
        })
    }

    /// SHA-256 fingerprint (hex) of the loaded artifact.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn validate(pipeline: &ExportedPipeline) -> Result<(), ArtifactError> {
        if pipeline.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(ArtifactError::Schema(format!(
                "unsupported schema_version {} (supported: {SUPPORTED_SCHEMA_VERSION})",
                pipeline.schema_version
            )));
        }

        let n = pipeline.feature_names.len();
        if n == 0 {
            return Err(ArtifactError::Schema("feature_names is empty".into()));
        }
        if pipeline.coefficients.len() != n
            || pipeline.scaler_mean.len() != n
            || pipeline.scaler_scale.len() != n
        {
            return Err(ArtifactError::Schema(
                "parameter lengths do not match feature_names length".into(),
            ));
        }

        for (i, &s) in pipeline.scaler_scale.iter().enumerate() {
            if !s.is_finite() || s <= 0.0 {
                return Err(ArtifactError::Schema(format!(
                    "scaler_scale[{i}] must be finite and > 0, got {s}"
                )));
            }
        }
        if pipeline
            .coefficients
            .iter()
            .chain(pipeline.scaler_mean.iter())
            .chain(std::iter::once(&pipeline.intercept))
            .any(|v| !v.is_finite())
        {
            return Err(ArtifactError::Schema(
                "model parameters contain non-finite values".into(),
            ));
        }

        Ok(())
    }
}

impl Classifier for LogisticArtifact {
    fn feature_columns(&self) -> &[String] {
        &self.pipeline.feature_names
    }

    fn predict_probability(&self, vector: &FeatureVector) -> Result<f64, PredictionError> {
        let columns = FeatureVector::columns();
        if self.pipeline.feature_names.len() != columns.len()
            || !self
                .pipeline
                .feature_names
                .iter()
                .zip(columns.iter())
                .all(|(a, b)| a == b)
        {
            return Err(PredictionError::FeatureMismatch {
                expected: self.pipeline.feature_names.clone(),
                got: columns.iter().map(|c| (*c).to_string()).collect(),
            });
        }

        let mut logit = self.pipeline.intercept;
        for (i, &x) in vector.values().iter().enumerate() {
            let standardized =
                (x - self.pipeline.scaler_mean[i]) / self.pipeline.scaler_scale[i];
            logit += self.pipeline.coefficients[i] * standardized;
        }

        let probability = sigmoid(logit);
        if !probability.is_finite() {
            return Err(PredictionError::NonFinite);
        }

        Ok(probability)
    }
}

/// Background reference sample for the attribution explainer.
///
/// A small, representative subset of training rows with the same feature
/// schema as the fitted classifier. Optional: the engine runs without it,
/// with attribution reported as unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundSample {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl BackgroundSample {
    /// Load a background sample and verify it against the classifier's
    /// fitted feature schema.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or the schema differs
    /// from `expected_columns`.
    pub fn load(path: &Path, expected_columns: &[String]) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path)?;
        let sample: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ArtifactError::Format(e.to_string()))?;
        sample.validate(expected_columns)?;

        tracing::info!(
            "Loaded background sample from {:?} ({} rows)",
            path,
            sample.rows.len()
        );

        Ok(sample)
    }

    fn validate(&self, expected_columns: &[String]) -> Result<(), ArtifactError> {
        if self.feature_names != expected_columns {
            return Err(ArtifactError::Schema(format!(
                "background columns {:?} do not match classifier columns {:?}",
                self.feature_names, expected_columns
            )));
        }
        if self.rows.is_empty() {
            return Err(ArtifactError::Schema("background sample is empty".into()));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.feature_names.len() {
                return Err(ArtifactError::Schema(format!(
                    "background row {i} has {} values, expected {}",
                    row.len(),
                    self.feature_names.len()
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ArtifactError::Schema(format!(
                    "background row {i} contains non-finite values"
                )));
            }
        }
        Ok(())
    }

    /// Number of background rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the sample holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Fixture pipeline shared by unit tests across the crate.
///
/// Positive weights on hba1c and blood_glucose so directional properties
/// hold in end-to-end tests.
#[cfg(test)]
pub(crate) fn test_pipeline() -> ExportedPipeline {
    let n = crate::domain::FEATURE_COLUMNS.len();
    let mut coefficients = vec![0.1; n];
    coefficients[6] = 1.2; // hba1c
    coefficients[7] = 0.8; // blood_glucose

    ExportedPipeline {
        schema_version: 1,
        feature_names: crate::domain::FEATURE_COLUMNS
            .iter()
            .map(|c| (*c).to_string())
            .collect(),
        scaler_mean: vec![0.5, 45.0, 0.1, 0.05, 1.5, 27.0, 5.7, 140.0, 1.8, 1215.0, 800.0],
        scaler_scale: vec![0.5, 15.0, 0.3, 0.2, 1.5, 6.0, 1.0, 40.0, 0.9, 700.0, 350.0],
        coefficients,
        intercept: -2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FEATURE_COLUMNS;

    #[test]
    fn test_load_artifact_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("risk_pipeline_v1.json");
        let json = serde_json::to_string(&test_pipeline()).expect("serialize");
        std::fs::write(&path, json).expect("write");

        let artifact = LogisticArtifact::load(&path).expect("Should load");
        assert_eq!(artifact.feature_columns().len(), FEATURE_COLUMNS.len());
        assert_eq!(artifact.fingerprint().len(), 64);
    }

    #[test]
    fn test_prediction_is_probability() {
        let artifact = LogisticArtifact::from_pipeline(test_pipeline()).expect("build");
        let vector = FeatureVector::new(vec![1.0; FEATURE_COLUMNS.len()]);

        let p = artifact.predict_probability(&vector).expect("predict");
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_prediction_is_monotonic_in_positive_weight() {
        let artifact = LogisticArtifact::from_pipeline(test_pipeline()).expect("build");

        let mut low = vec![0.0; FEATURE_COLUMNS.len()];
        let mut high = low.clone();
        low[6] = 5.0;
        high[6] = 9.0;

        let p_low = artifact
            .predict_probability(&FeatureVector::new(low))
            .expect("predict");
        let p_high = artifact
            .predict_probability(&FeatureVector::new(high))
            .expect("predict");
        assert!(p_high > p_low);
    }

    #[test]
    fn test_feature_mismatch_is_rejected() {
        let mut pipeline = test_pipeline();
        pipeline.feature_names[0] = "gender".to_string();
        let artifact = LogisticArtifact::from_pipeline(pipeline).expect("build");

        let vector = FeatureVector::new(vec![0.0; FEATURE_COLUMNS.len()]);
        let err = artifact.predict_probability(&vector).expect_err("must fail");
        assert!(matches!(err, PredictionError::FeatureMismatch { .. }));
    }

    #[test]
    fn test_schema_validation_rejects_bad_shapes() {
        let mut pipeline = test_pipeline();
        pipeline.coefficients.pop();
        assert!(LogisticArtifact::from_pipeline(pipeline).is_err());

        let mut pipeline = test_pipeline();
        pipeline.scaler_scale[0] = 0.0;
        assert!(LogisticArtifact::from_pipeline(pipeline).is_err());

        let mut pipeline = test_pipeline();
        pipeline.schema_version = 2;
        assert!(LogisticArtifact::from_pipeline(pipeline).is_err());
    }

    #[test]
    fn test_background_schema_check() {
        let artifact = LogisticArtifact::from_pipeline(test_pipeline()).expect("build");
        let columns: Vec<String> = artifact.feature_columns().to_vec();

        let good = BackgroundSample {
            feature_names: columns.clone(),
            rows: vec![vec![0.0; columns.len()]],
        };
        assert!(good.validate(&columns).is_ok());

        let wrong_width = BackgroundSample {
            feature_names: columns.clone(),
            rows: vec![vec![0.0; columns.len() - 1]],
        };
        assert!(wrong_width.validate(&columns).is_err());

        let wrong_names = BackgroundSample {
            feature_names: vec!["x".to_string()],
            rows: vec![vec![0.0]],
        };
        assert!(wrong_names.validate(&columns).is_err());
    }
}
