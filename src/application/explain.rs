//! Attribution explainer: perturbation-based feature contributions.
//!
//! Estimates each feature's marginal contribution to the classifier's
//! output relative to a background reference sample, by Monte-Carlo
//! permutation sampling: for each sample, a background row and a random
//! feature order are drawn, the patient's values are swapped in one
//! feature at a time, and the probability deltas are accumulated per
//! feature. Contributions over all features sum approximately to
//! (patient score - background average score).
//!
//! This is many re-scorings per explanation; callers should not assume it
//! is O(1) relative to scoring. The worker module offloads it so
//! scoring-only requests are never blocked.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::adapters::artifact::BackgroundSample;
use crate::application::features::prepare;
use crate::domain::{AttributionEntry, FeatureVector, PatientRecord};
use crate::ports::Classifier;
use crate::EngineError;

/// Tunables for the attribution estimate.
#[derive(Debug, Clone, Copy)]
pub struct ExplainConfig {
    /// Number of (background row, permutation) samples. More samples
    /// tighten the estimate at linear cost in re-scorings.
    pub samples: usize,

    /// Fixed RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            samples: 256,
            seed: None,
        }
    }
}

/// Service for explaining individual risk scores.
pub struct ExplainService<C: Classifier> {
    classifier: Arc<C>,
    background: Arc<BackgroundSample>,
    config: ExplainConfig,
}

impl<C: Classifier> ExplainService<C> {
    /// Create a new explain service over a validated background sample.
    pub fn new(classifier: Arc<C>, background: Arc<BackgroundSample>, config: ExplainConfig) -> Self {
        Self {
            classifier,
            background,
            config,
        }
    }

    /// Estimate per-feature contributions for a patient record.
    ///
    /// Returns entries sorted by descending absolute impact. A degenerate
    /// numeric failure inside the sampling recovers to an empty list: the
    /// explanation is auxiliary and a degraded answer is preferable to
    /// failing the request.
    ///
    /// # Errors
    /// Returns [`EngineError::FeatureMismatch`] if the feature schema is
    /// inconsistent with the loaded classifier — that is a deployment
    /// problem, not a recoverable one.
    pub fn explain(&self, record: &PatientRecord) -> Result<Vec<AttributionEntry>, EngineError> {
        self.check_schema()?;
        let vector = prepare(record);

        let impacts = match self.sample_impacts(&vector) {
            Ok(impacts) => impacts,
            Err(e @ EngineError::FeatureMismatch { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!("Attribution sampling failed, returning empty explanation: {e}");
                return Ok(Vec::new());
            }
        };

        if impacts.iter().any(|v| !v.is_finite()) {
            tracing::warn!("Attribution produced non-finite impacts, returning empty explanation");
            return Ok(Vec::new());
        }

        let mut entries: Vec<AttributionEntry> = FeatureVector::columns()
            .iter()
            .zip(impacts.iter())
            .map(|(name, &impact)| AttributionEntry::new(*name, impact))
            .collect();

        entries.sort_by(|a, b| {
            b.impact
                .abs()
                .partial_cmp(&a.impact.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(entries)
    }

    /// The hybrid vectors built during sampling reuse background rows, so
    /// the fitted schema must match the build's column set before any
    /// [`FeatureVector`] is constructed from them.
    fn check_schema(&self) -> Result<(), EngineError> {
        let expected = self.classifier.feature_columns();
        let columns = FeatureVector::columns();
        if expected.len() != columns.len()
            || !expected.iter().zip(columns.iter()).all(|(a, b)| a == b)
        {
            return Err(EngineError::FeatureMismatch {
                expected: expected.to_vec(),
                got: columns.iter().map(|c| (*c).to_string()).collect(),
            });
        }
        Ok(())
    }

    fn sample_impacts(&self, vector: &FeatureVector) -> Result<Vec<f64>, EngineError> {
        let n = vector.values().len();
        let samples = self.config.samples.max(1);

        let mut rng = match self.config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };

        let mut impacts = vec![0.0; n];
        let mut order: Vec<usize> = (0..n).collect();

        for _ in 0..samples {
            let row = self
                .background
                .rows
                .choose(&mut rng)
                .ok_or_else(|| EngineError::Computation("background sample is empty".into()))?;

            let mut hybrid = row.clone();
            order.shuffle(&mut rng);

            let mut previous = self.predict(&hybrid)?;
            for &i in &order {
                hybrid[i] = vector.values()[i];
                let next = self.predict(&hybrid)?;
                impacts[i] += next - previous;
                previous = next;
            }
        }

        for impact in &mut impacts {
            *impact /= samples as f64;
        }

        Ok(impacts)
    }

    fn predict(&self, values: &[f64]) -> Result<f64, EngineError> {
        let vector = FeatureVector::new(values.to_vec());
        Ok(self.classifier.predict_probability(&vector)?)
    }

    /// Average classifier output over the whole background sample.
    ///
    /// # Errors
    /// Returns error if prediction fails for a background row.
    pub fn background_mean_score(&self) -> Result<f64, EngineError> {
        self.check_schema()?;
        let mut total = 0.0;
        for row in &self.background.rows {
            total += self.predict(row)?;
        }
        Ok(total / self.background.rows.len() as f64)
    }
}
