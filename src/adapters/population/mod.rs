//! Population adapter: reference-population table for cohort analysis.
//!
//! Loads a CSV of historical patient vitals with known outcomes, and fits
//! standardization statistics (zero mean, unit variance) over the whole
//! table once at load time. The table is read-only for the process
//! lifetime; percentile ranks and twin retrieval are computed against this
//! same fixed table.

use std::fs::File;
use std::path::Path;

use crate::domain::{patient_vitals, DigitalTwin, PatientRecord, VITAL_COLUMNS};

/// Error type for population-table loading.
#[derive(Debug, thiserror::Error)]
pub enum PopulationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Population table violation: {0}")]
    Schema(String),
}

/// Per-vital standardization statistics fitted over the whole table.
#[derive(Debug, Clone, Copy)]
pub struct VitalStats {
    pub mean: [f64; 4],
    pub std: [f64; 4],
}

impl VitalStats {
    fn fit(rows: &[DigitalTwin]) -> Self {
        let n = rows.len() as f64;
        let mut mean = [0.0; 4];
        for row in rows {
            let vitals = row.vitals();
            for (m, v) in mean.iter_mut().zip(vitals.iter()) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut std = [0.0; 4];
        for row in rows {
            let vitals = row.vitals();
            for i in 0..4 {
                let d = vitals[i] - mean[i];
                std[i] += d * d;
            }
        }
        for s in &mut std {
            *s = (*s / n).sqrt();
            // A constant column would otherwise divide by zero.
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { mean, std }
    }

    /// Standardize a raw vital vector.
    #[must_use]
    pub fn standardize(&self, vitals: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for i in 0..4 {
            out[i] = (vitals[i] - self.mean[i]) / self.std[i];
        }
        out
    }
}

/// The loaded reference population.
pub struct PopulationTable {
    rows: Vec<DigitalTwin>,
    stats: VitalStats,
}

impl PopulationTable {
    /// Load the table from a CSV file with one [`DigitalTwin`] per row.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, a row fails to parse, or
    /// the table is empty.
    pub fn load(path: &Path) -> Result<Self, PopulationError> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);

        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let row: DigitalTwin = result?;
            rows.push(row);
        }

        let table = Self::from_rows(rows)?;
        tracing::info!(
            "Loaded population table from {:?} ({} records)",
            path,
            table.len()
        );
        Ok(table)
    }

    /// Build a table from already-parsed rows (used by tests and fakes).
    ///
    /// # Errors
    /// Returns error if `rows` is empty or contains non-finite vitals.
    pub fn from_rows(rows: Vec<DigitalTwin>) -> Result<Self, PopulationError> {
        if rows.is_empty() {
            return Err(PopulationError::Schema("population table is empty".into()));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.vitals().iter().any(|v| !v.is_finite()) {
                return Err(PopulationError::Schema(format!(
                    "row {i} contains non-finite vitals"
                )));
            }
        }

        let stats = VitalStats::fit(&rows);
        Ok(Self { rows, stats })
    }

    /// Number of population records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All population rows, in original table order.
    #[must_use]
    pub fn rows(&self) -> &[DigitalTwin] {
        &self.rows
    }

    /// The standardization statistics fitted at load time.
    #[must_use]
    pub fn stats(&self) -> &VitalStats {
        &self.stats
    }

    /// The patient's vitals in standardized space.
    #[must_use]
    pub fn standardized_vitals(&self, record: &PatientRecord) -> [f64; 4] {
        self.stats.standardize(patient_vitals(record))
    }

    /// Fraction of the population strictly below `value` for the vital at
    /// `vital_index`, scaled to 0-100.
    #[must_use]
    pub fn percentile_of(&self, vital_index: usize, value: f64) -> f64 {
        debug_assert!(vital_index < VITAL_COLUMNS.len());
        let below = self
            .rows
            .iter()
            .filter(|row| row.vitals()[vital_index] < value)
            .count();
        below as f64 / self.rows.len() as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Sex, SmokingHistory};

    fn twin(age: f64, bmi: f64, hba1c: f64, glucose: f64, outcome: u8) -> DigitalTwin {
        DigitalTwin {
            sex: Sex::Female,
            age,
            hypertension: 0,
            heart_disease: 0,
            smoking_history: SmokingHistory::Never,
            bmi,
            hba1c,
            blood_glucose: glucose,
            outcome,
        }
    }

    #[test]
    fn test_load_from_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("population.csv");
        std::fs::write(
            &path,
            "sex,age,hypertension,heart_disease,smoking_history,bmi,hba1c,blood_glucose,outcome\n\
             female,45,0,0,never,28.5,6.2,140,0\n\
             male,62,1,0,former,31.0,7.1,185,1\n",
        )
        .expect("write csv");

        let table = PopulationTable::load(&path).expect("Should load");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].sex, Sex::Male);
        assert_eq!(table.rows()[1].outcome, 1);
    }

    #[test]
    fn test_standardization_is_zero_mean_unit_variance() {
        let rows = vec![
            twin(30.0, 22.0, 5.0, 100.0, 0),
            twin(50.0, 28.0, 6.0, 140.0, 0),
            twin(70.0, 34.0, 7.0, 180.0, 1),
        ];
        let table = PopulationTable::from_rows(rows).expect("build");

        let mut sums = [0.0; 4];
        let mut sq_sums = [0.0; 4];
        for row in table.rows() {
            let z = table.stats().standardize(row.vitals());
            for i in 0..4 {
                sums[i] += z[i];
                sq_sums[i] += z[i] * z[i];
            }
        }
        for i in 0..4 {
            assert!(sums[i].abs() < 1e-9);
            assert!((sq_sums[i] / 3.0 - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let rows = vec![twin(50.0, 28.0, 6.0, 140.0, 0), twin(50.0, 30.0, 6.5, 150.0, 0)];
        let table = PopulationTable::from_rows(rows).expect("build");
        let z = table.stats().standardize([50.0, 29.0, 6.25, 145.0]);
        assert!(z.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert!(PopulationTable::from_rows(Vec::new()).is_err());
    }
}
