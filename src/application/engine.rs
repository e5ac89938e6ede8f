//! Engine facade: one entry point over the analysis services.
//!
//! Collaborators load independently at startup; a failed load degrades
//! the affected capability instead of aborting the engine. Each analysis
//! method reports unavailability the way its contract demands: scoring
//! and twin retrieval fail with `NotReady`, attribution and percentiles
//! degrade to empty results.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::adapters::artifact::{BackgroundSample, LogisticArtifact};
use crate::adapters::population::PopulationTable;
use crate::adapters::sqlite::SqliteHistoryStore;
use crate::adapters::StorageError;
use crate::application::cohort::CohortService;
use crate::application::explain::{ExplainConfig, ExplainService};
use crate::application::scoring::ScoringService;
use crate::application::simulate::SimulationService;
use crate::application::trend::TrendService;
use crate::application::worker::{ExplainWorker, ExplainWorkerHandle};
use crate::domain::{
    Assessment, AttributionEntry, CohortPercentiles, DigitalTwin, HistoryRecord, PatientRecord,
    RecordPatch, ScenarioResult, SimulationResult, TrendResult,
};
use crate::ports::{Classifier, HistoryStore};
use crate::{Component, EngineError};

/// Startup paths and tunables for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Serialized scoring pipeline (JSON)
    pub model_path: PathBuf,
    /// Attribution background sample (JSON)
    pub background_path: PathBuf,
    /// Reference population table (CSV)
    pub population_path: PathBuf,
    /// Assessment history database (SQLite)
    pub history_db: PathBuf,
    /// Attribution sample count
    pub explain_samples: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("data/risk_pipeline_v1.json"),
            background_path: PathBuf::from("data/background_sample.json"),
            population_path: PathBuf::from("data/population_reference.csv"),
            history_db: PathBuf::from("data/clinsight.db"),
            explain_samples: 256,
        }
    }
}

impl EngineConfig {
    /// Build a config from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("CLINSIGHT_MODEL_PATH") {
            cfg.model_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CLINSIGHT_BACKGROUND_PATH") {
            cfg.background_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CLINSIGHT_POPULATION_PATH") {
            cfg.population_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CLINSIGHT_HISTORY_DB") {
            cfg.history_db = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CLINSIGHT_EXPLAIN_SAMPLES") {
            if let Ok(n) = v.trim().parse::<usize>() {
                if n > 0 {
                    cfg.explain_samples = n;
                }
            }
        }

        cfg
    }
}

/// Readiness of the engine's independently loaded capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub scorer_ready: bool,
    pub explainer_ready: bool,
    pub cohort_ready: bool,
}

/// The clinical risk engine.
///
/// Generic over the classifier and history store so tests can inject
/// fixtures; production wiring uses [`ClinicalEngine::from_config`].
pub struct ClinicalEngine<C: Classifier, H: HistoryStore> {
    scoring: Option<ScoringService<C>>,
    explainer: Option<Arc<ExplainService<C>>>,
    cohort: CohortService,
    trend: TrendService<H>,
}

impl<C, H> ClinicalEngine<C, H>
where
    C: Classifier,
    H: HistoryStore,
    H::Error: Into<StorageError>,
{
    /// Assemble an engine from its (possibly missing) collaborators.
    ///
    /// The explainer requires both the classifier and a background
    /// sample; it is absent if either is.
    pub fn new(
        classifier: Option<Arc<C>>,
        background: Option<Arc<BackgroundSample>>,
        explain_config: ExplainConfig,
        population: Option<Arc<PopulationTable>>,
        store: Arc<H>,
    ) -> Self {
        let scoring = classifier.as_ref().map(|c| ScoringService::new(Arc::clone(c)));
        let explainer = match (classifier, background) {
            (Some(classifier), Some(background)) => Some(Arc::new(ExplainService::new(
                classifier,
                background,
                explain_config,
            ))),
            _ => None,
        };

        if scoring.is_none() {
            tracing::warn!("Engine starting without a classifier: scoring unavailable");
        }
        if explainer.is_none() {
            tracing::warn!("Engine starting without an explainer: attributions will be empty");
        }

        Self {
            scoring,
            explainer,
            cohort: CohortService::new(population),
            trend: TrendService::new(store),
        }
    }

    /// Readiness of each capability.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            scorer_ready: self.scoring.is_some(),
            explainer_ready: self.explainer.is_some(),
            cohort_ready: self.cohort.is_ready(),
        }
    }

    fn scoring(&self) -> Result<&ScoringService<C>, EngineError> {
        self.scoring
            .as_ref()
            .ok_or(EngineError::NotReady(Component::Scorer))
    }

    /// Score a patient record.
    ///
    /// # Errors
    /// Returns [`EngineError::NotReady`] if the classifier is not loaded;
    /// scoring failures always propagate.
    pub fn score(&self, record: &PatientRecord) -> Result<Assessment, EngineError> {
        self.scoring()?.score(record)
    }

    /// Per-feature attributions for a record, sorted by absolute impact.
    ///
    /// Degrades to an empty list when the explainer is unavailable.
    ///
    /// # Errors
    /// Returns error on a feature schema mismatch.
    pub fn explain(&self, record: &PatientRecord) -> Result<Vec<AttributionEntry>, EngineError> {
        match &self.explainer {
            Some(explainer) => explainer.explain(record),
            None => Ok(Vec::new()),
        }
    }

    /// Run attribution on a background thread.
    ///
    /// Returns `None` when the explainer is unavailable.
    pub fn spawn_explain(&self, record: PatientRecord) -> Option<ExplainWorkerHandle>
    where
        C: 'static,
    {
        self.explainer
            .as_ref()
            .map(|explainer| ExplainWorker::spawn(Arc::clone(explainer), record))
    }

    /// Rescore under a set of field modifications.
    ///
    /// # Errors
    /// Returns [`EngineError::NotReady`] if the classifier is not loaded.
    pub fn simulate(
        &self,
        record: &PatientRecord,
        modifications: &RecordPatch,
    ) -> Result<SimulationResult, EngineError> {
        SimulationService::new(self.scoring()?.clone()).simulate(record, modifications)
    }

    /// Evaluate the battery of clinically motivated improvement scenarios.
    ///
    /// # Errors
    /// Returns [`EngineError::NotReady`] if the classifier is not loaded.
    pub fn generate_scenarios(
        &self,
        record: &PatientRecord,
    ) -> Result<Vec<ScenarioResult>, EngineError> {
        SimulationService::new(self.scoring()?.clone()).generate_scenarios(record)
    }

    /// Percentile rank of the patient's vitals against the population.
    ///
    /// Empty when the reference table is not loaded.
    #[must_use]
    pub fn percentiles(&self, record: &PatientRecord) -> CohortPercentiles {
        self.cohort.percentiles(record)
    }

    /// The `k` population records nearest to the patient.
    ///
    /// # Errors
    /// Returns [`EngineError::NotReady`] if the reference table is not
    /// loaded.
    pub fn nearest_twins(
        &self,
        record: &PatientRecord,
        k: usize,
    ) -> Result<Vec<DigitalTwin>, EngineError> {
        self.cohort.nearest_twins(record, k)
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
        self.trend.record_assessment(subject_id, record, assessment)
    }

    /// Risk velocity over the subject's most recent assessments.
    ///
    /// # Errors
    /// Returns error if the storage operation fails.
    pub fn velocity(&self, subject_id: &str) -> Result<TrendResult, EngineError> {
        self.trend.velocity_for(subject_id)
    }

    /// Most recent history (newest first) with the current trend.
    ///
    /// # Errors
    /// Returns error if the storage operation fails.
    pub fn history(
        &self,
        subject_id: &str,
        limit: usize,
    ) -> Result<(Vec<HistoryRecord>, TrendResult), EngineError> {
        self.trend.history(subject_id, limit)
    }
}

impl ClinicalEngine<LogisticArtifact, SqliteHistoryStore> {
    /// Wire up the production engine from configured paths.
    ///
    /// A collaborator that fails to load is logged and left absent; the
    /// engine starts degraded. The history database is the exception: it
    /// is also the write path, so failing to open it fails startup.
    ///
    /// # Errors
    /// Returns error if the history database cannot be opened.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let classifier = match LogisticArtifact::load(&config.model_path) {
            Ok(artifact) => Some(Arc::new(artifact)),
            Err(e) => {
                tracing::warn!("Failed to load scoring artifact: {e}");
                None
            }
        };

        let background = classifier.as_ref().and_then(|classifier| {
            match BackgroundSample::load(&config.background_path, classifier.feature_columns()) {
                Ok(sample) => Some(Arc::new(sample)),
                Err(e) => {
                    tracing::warn!("Failed to load background sample: {e}");
                    None
                }
            }
        });

        let population = match PopulationTable::load(&config.population_path) {
            Ok(table) => Some(Arc::new(table)),
            Err(e) => {
                tracing::warn!("Failed to load population table: {e}");
                None
            }
        };

        let store = Arc::new(SqliteHistoryStore::new(&config.history_db)?);

        Ok(Self::new(
            classifier,
            background,
            ExplainConfig {
                samples: config.explain_samples,
                seed: None,
            },
            population,
            store,
        ))
    }
}
