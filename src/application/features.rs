//! Feature preparation: raw patient attributes to the fixed feature vector.
//!
//! Replicates exactly the transformation used at training time, including
//! the engineered BMI category and interaction terms. Pure and
//! deterministic; every scoring path goes through here.

use crate::domain::{BmiCategory, FeatureVector, PatientRecord};

/// Derive the ordered feature vector for a patient record.
///
/// Column order is [`crate::domain::FEATURE_COLUMNS`]; categorical fields
/// use the ordinal codes baked in at training time.
#[must_use]
pub fn prepare(record: &PatientRecord) -> FeatureVector {
    let bmi_category = BmiCategory::from_bmi(record.bmi);

    FeatureVector::new(vec![
        record.sex.code(),
        record.age,
        f64::from(record.hypertension),
        f64::from(record.heart_disease),
        record.smoking_history.code(),
        record.bmi,
        record.hba1c,
        record.blood_glucose,
        bmi_category.code(),
        record.bmi * record.age,
        record.blood_glucose * record.hba1c,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_prepare_is_deterministic() {
        let record = sample_record();
        let first = prepare(&record);
        let second = prepare(&record);
        assert_eq!(first, second);
    }

    #[test]
    fn test_engineered_features() {
        let vector = prepare(&sample_record());

        // 28.5 is overweight
        assert_eq!(vector.get("bmi_category"), Some(2.0));
        assert_eq!(vector.get("bmi_age_interaction"), Some(28.5 * 45.0));
        assert_eq!(vector.get("glucose_hba1c_interaction"), Some(140.0 * 6.2));
    }

    #[test]
    fn test_categorical_codes() {
        let mut record = sample_record();
        record.sex = Sex::Male;
        record.smoking_history = SmokingHistory::Current;
        record.hypertension = 1;

        let vector = prepare(&record);
        assert_eq!(vector.get("sex"), Some(1.0));
        assert_eq!(vector.get("smoking_history"), Some(3.0));
        assert_eq!(vector.get("hypertension"), Some(1.0));
    }
}
