//! Assessment history types.
//!
//! History records are append-only and owned exclusively by the history
//! store; the trend analyzer only consumes ordered snapshots of them.

use serde::{Deserialize, Serialize};

use super::assessment::{Assessment, RiskBand};
use super::patient::PatientRecord;

/// One persisted assessment for a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unique identifier
    pub id: String,

    /// Subject the assessment belongs to
    pub subject_id: String,

    /// Snapshot of the scored record
    pub record: PatientRecord,

    /// Probability score at assessment time
    pub score: f64,

    /// Band classification at assessment time
    pub band: RiskBand,

    /// Timestamp of the assessment
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl HistoryRecord {
    /// Create a history record from an assessment.
    #[must_use]
    pub fn new(subject_id: impl Into<String>, record: PatientRecord, assessment: &Assessment) -> Self {
        Self {
            id: uuid_v4(),
            subject_id: subject_id.into(),
            record,
            score: assessment.score,
            band: assessment.band,
            created_at: assessment.created_at,
        }
    }
}

/// Generate a simple UUID v4 (random) using CSPRNG.
///
/// Uses ChaCha20Rng seeded from OS entropy to ensure unpredictable
/// identifiers on all platforms.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::{Sex, SmokingHistory};

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
    fn test_history_record_carries_assessment() {
        let assessment = Assessment::new(0.42);
        let record = HistoryRecord::new("subject-1", sample_record(), &assessment);

        assert_eq!(record.subject_id, "subject-1");
        assert!((record.score - 0.42).abs() < f64::EPSILON);
        assert_eq!(record.band, RiskBand::Moderate);
        assert_eq!(record.created_at, assessment.created_at);
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36); // UUID format with dashes
    }
}
