//! Cohort analyzer: population percentiles and digital-twin retrieval.
//!
//! Both operations share one fixed reference table loaded at startup, but
//! present unavailability differently: percentile ranking degrades to an
//! empty mapping, twin retrieval surfaces "cohort engine not ready".

use std::sync::Arc;

use crate::adapters::population::PopulationTable;
use crate::domain::{patient_vitals, CohortPercentiles, DigitalTwin, PatientRecord, VITAL_COLUMNS};
use crate::{Component, EngineError};

/// Default number of digital twins to retrieve.
pub const DEFAULT_TWINS: usize = 5;

/// Service for population-relative analysis.
pub struct CohortService {
    table: Option<Arc<PopulationTable>>,
}

impl CohortService {
    /// Create a service over an optionally loaded reference table.
    pub fn new(table: Option<Arc<PopulationTable>>) -> Self {
        if table.is_none() {
            tracing::warn!("Cohort service starting without a reference table");
        }
        Self { table }
    }

    /// Whether the reference table is loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.table.is_some()
    }

    /// Percentile rank of the patient's vitals against the population.
    ///
    /// Each rank is the fraction of the population strictly below the
    /// patient's value, scaled to 0-100 and rounded to one decimal.
    /// Returns an empty mapping when the table is absent.
    #[must_use]
    pub fn percentiles(&self, record: &PatientRecord) -> CohortPercentiles {
        let Some(table) = &self.table else {
            return CohortPercentiles::new();
        };

        let vitals = patient_vitals(record);
        VITAL_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let rank = table.percentile_of(i, vitals[i]);
                ((*name).to_string(), (rank * 10.0).round() / 10.0)
            })
            .collect()
    }

    /// The `k` population records nearest to the patient in standardized
    /// vital space, nearest first. Distance ties break by original table
    /// order.
    ///
    /// # Errors
    /// Returns [`EngineError::NotReady`] if the reference table is absent.
    pub fn nearest_twins(
        &self,
        record: &PatientRecord,
        k: usize,
    ) -> Result<Vec<DigitalTwin>, EngineError> {
        let table = self
            .table
            .as_ref()
            .ok_or(EngineError::NotReady(Component::Cohort))?;

        let query = table.standardized_vitals(record);

        let mut ranked: Vec<(f64, usize)> = table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let z = table.stats().standardize(row.vitals());
                let distance: f64 = query
                    .iter()
                    .zip(z.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt();
                (distance, i)
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(_, i)| table.rows()[i].clone())
            .collect())
    }
}
