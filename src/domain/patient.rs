//! Patient record and feature-vector types for diabetes risk inference.
//!
//! The feature schema mirrors the training pipeline exactly: raw clinical
//! attributes plus the engineered BMI category and interaction terms, in a
//! fixed column order the fitted classifier depends on.

use serde::{Deserialize, Serialize};

/// Patient sex category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
    Other,
}

impl Sex {
    /// Ordinal code used at training time.
    #[must_use]
    pub fn code(&self) -> f64 {
        match self {
            Self::Female => 0.0,
            Self::Male => 1.0,
            Self::Other => 2.0,
        }
    }
}

/// Smoking-history category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmokingHistory {
    Never,
    NoInfo,
    Former,
    Current,
    Ever,
    NotCurrent,
}

impl SmokingHistory {
    /// Ordinal code used at training time.
    #[must_use]
    pub fn code(&self) -> f64 {
        match self {
            Self::Never => 0.0,
            Self::NoInfo => 1.0,
            Self::Former => 2.0,
            Self::Current => 3.0,
            Self::Ever => 4.0,
            Self::NotCurrent => 5.0,
        }
    }

    /// Whether this category qualifies for the quit-smoking scenario.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Current | Self::Ever)
    }
}

/// A single patient snapshot.
///
/// Immutable for the duration of an inference call; counterfactual
/// simulation produces a modified copy via [`RecordPatch`], never an
/// in-place mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub sex: Sex,

    /// Age in years
    pub age: f64,

    /// Hypertension flag: 0 = no, 1 = yes
    pub hypertension: u8,

    /// Heart disease flag: 0 = no, 1 = yes
    pub heart_disease: u8,

    pub smoking_history: SmokingHistory,

    /// Body-mass index in kg/m^2
    pub bmi: f64,

    /// Glycated hemoglobin (HbA1c) in %
    pub hba1c: f64,

    /// Blood glucose level in mg/dL
    pub blood_glucose: f64,
}

/// BMI category derived with the same breakpoints as the training pipeline.
///
/// Boundaries: <=18.5 underweight, (18.5, 24.9] normal, (24.9, 29.9]
/// overweight, everything above is the obese catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Classify a BMI value.
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi <= 18.5 {
            Self::Underweight
        } else if bmi <= 24.9 {
            Self::Normal
        } else if bmi <= 29.9 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    /// Ordinal code used at training time.
    #[must_use]
    pub fn code(&self) -> f64 {
        match self {
            Self::Underweight => 0.0,
            Self::Normal => 1.0,
            Self::Overweight => 2.0,
            Self::Obese => 3.0,
        }
    }
}

/// Feature column names in the exact order the fitted classifier expects.
pub const FEATURE_COLUMNS: [&str; 11] = [
    "sex",
    "age",
    "hypertension",
    "heart_disease",
    "smoking_history",
    "bmi",
    "hba1c",
    "blood_glucose",
    "bmi_category",
    "bmi_age_interaction",
    "glucose_hba1c_interaction",
];

/// Fully-numeric, ordered representation of a patient consumed by the
/// classifier. Column order is fixed for the lifetime of a loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector from values in [`FEATURE_COLUMNS`] order.
    ///
    /// # Panics
    /// Panics if `values` does not have exactly one entry per column.
    /// Construction happens only inside feature preparation, which always
    /// supplies the full set.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        assert_eq!(values.len(), FEATURE_COLUMNS.len());
        Self { values }
    }

    /// Column names, in order.
    #[must_use]
    pub fn columns() -> &'static [&'static str] {
        &FEATURE_COLUMNS
    }

    /// Feature values, in column order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up a value by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.values[i])
    }
}

/// A set of field-level overrides for counterfactual simulation.
///
/// Unset fields leave the original record unchanged. Deserializes from a
/// plain JSON object, so callers can send `{"hba1c": 5.0}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    pub sex: Option<Sex>,
    pub age: Option<f64>,
    pub hypertension: Option<u8>,
    pub heart_disease: Option<u8>,
    pub smoking_history: Option<SmokingHistory>,
    pub bmi: Option<f64>,
    pub hba1c: Option<f64>,
    pub blood_glucose: Option<f64>,
}

impl RecordPatch {
    /// Apply the overrides to a copy of `record`.
    #[must_use]
    pub fn apply(&self, record: &PatientRecord) -> PatientRecord {
        let mut out = record.clone();
        if let Some(sex) = self.sex {
            out.sex = sex;
        }
        if let Some(age) = self.age {
            out.age = age;
        }
        if let Some(hypertension) = self.hypertension {
            out.hypertension = hypertension;
        }
        if let Some(heart_disease) = self.heart_disease {
            out.heart_disease = heart_disease;
        }
        if let Some(smoking_history) = self.smoking_history {
            out.smoking_history = smoking_history;
        }
        if let Some(bmi) = self.bmi {
            out.bmi = bmi;
        }
        if let Some(hba1c) = self.hba1c {
            out.hba1c = hba1c;
        }
        if let Some(blood_glucose) = self.blood_glucose {
            out.blood_glucose = blood_glucose;
        }
        out
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sex.is_none()
            && self.age.is_none()
            && self.hypertension.is_none()
            && self.heart_disease.is_none()
            && self.smoking_history.is_none()
            && self.bmi.is_none()
            && self.hba1c.is_none()
            && self.blood_glucose.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_bmi_category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.6), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.9), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(29.9), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
        assert_eq!(BmiCategory::from_bmi(55.0), BmiCategory::Obese);
    }

    #[test]
    fn test_patch_leaves_original_untouched() {
        let record = sample_record();
        let patch = RecordPatch {
            hba1c: Some(5.0),
            ..Default::default()
        };

        let modified = patch.apply(&record);
        assert!((modified.hba1c - 5.0).abs() < f64::EPSILON);
        assert!((record.hba1c - 6.2).abs() < f64::EPSILON);
        assert!((modified.bmi - record.bmi).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let record = sample_record();
        let patch = RecordPatch::default();
        assert!(patch.is_empty());
        assert_eq!(patch.apply(&record), record);
    }

    #[test]
    fn test_patch_deserializes_from_partial_json() {
        let patch: RecordPatch =
            serde_json::from_str(r#"{"hba1c": 5.0, "smoking_history": "never"}"#)
                .expect("Should parse");
        assert_eq!(patch.hba1c, Some(5.0));
        assert_eq!(patch.smoking_history, Some(SmokingHistory::Never));
        assert!(patch.bmi.is_none());
    }

    #[test]
    fn test_feature_vector_lookup() {
        let values: Vec<f64> = (0..FEATURE_COLUMNS.len()).map(|i| i as f64).collect();
        let vector = FeatureVector::new(values);
        assert_eq!(vector.get("sex"), Some(0.0));
        assert_eq!(vector.get("glucose_hba1c_interaction"), Some(10.0));
        assert_eq!(vector.get("unknown"), None);
    }
}
