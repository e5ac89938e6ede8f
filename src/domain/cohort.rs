//! Population cohort types.
//!
//! Digital twins are reference-population rows closest to a query patient
//! in standardized vital space.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::patient::{PatientRecord, Sex, SmokingHistory};

/// The fixed vital set used for percentile ranking and twin retrieval.
pub const VITAL_COLUMNS: [&str; 4] = ["age", "bmi", "hba1c", "blood_glucose"];

/// Vital name -> percentile rank in [0, 100].
pub type CohortPercentiles = BTreeMap<String, f64>;

/// A reference-population record with a known outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalTwin {
    pub sex: Sex,
    pub age: f64,
    pub hypertension: u8,
    pub heart_disease: u8,
    pub smoking_history: SmokingHistory,
    pub bmi: f64,
    pub hba1c: f64,
    pub blood_glucose: f64,

    /// Known outcome label: 0 = negative, 1 = positive
    pub outcome: u8,
}

impl DigitalTwin {
    /// Vital values in [`VITAL_COLUMNS`] order.
    #[must_use]
    pub fn vitals(&self) -> [f64; 4] {
        [self.age, self.bmi, self.hba1c, self.blood_glucose]
    }
}

/// Vital values of a patient in [`VITAL_COLUMNS`] order.
#[must_use]
pub fn patient_vitals(record: &PatientRecord) -> [f64; 4] {
    [record.age, record.bmi, record.hba1c, record.blood_glucose]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vital_order_matches_columns() {
        let twin = DigitalTwin {
            sex: Sex::Male,
            age: 60.0,
            hypertension: 1,
            heart_disease: 0,
            smoking_history: SmokingHistory::Former,
            bmi: 31.0,
            hba1c: 6.8,
            blood_glucose: 155.0,
            outcome: 1,
        };

        let vitals = twin.vitals();
        assert!((vitals[0] - 60.0).abs() < f64::EPSILON);
        assert!((vitals[1] - 31.0).abs() < f64::EPSILON);
        assert!((vitals[2] - 6.8).abs() < f64::EPSILON);
        assert!((vitals[3] - 155.0).abs() < f64::EPSILON);
    }
}
