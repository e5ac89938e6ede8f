//! Risk assessment result types.
//!
//! Covers the outputs of scoring, attribution, counterfactual simulation
//! and trend analysis.

use serde::{Deserialize, Serialize};

use super::patient::PatientRecord;

/// Band boundary between low and moderate risk.
pub const LOW_MODERATE_BOUNDARY: f64 = 0.2;

/// Band boundary between moderate and high risk.
pub const MODERATE_HIGH_BOUNDARY: f64 = 0.6;

/// Risk band classification for a probability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    /// Score below 0.2
    Low,
    /// Score in [0.2, 0.6)
    Moderate,
    /// Score at or above 0.6
    High,
}

impl RiskBand {
    /// Classify a probability into its band.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < LOW_MODERATE_BOUNDARY {
            Self::Low
        } else if score < MODERATE_HIGH_BOUNDARY {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Immediate consultation advised",
        }
    }

    /// Stable storage label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
        }
    }

    /// Parse a storage label written by [`RiskBand::as_str`].
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "LOW" => Some(Self::Low),
            "MODERATE" => Some(Self::Moderate),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scored patient snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Probability of the positive class, in [0, 1], exactly as produced
    /// by the fitted classifier.
    pub score: f64,

    /// Band classification of the score.
    pub band: RiskBand,

    /// Timestamp of the assessment
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Assessment {
    /// Create an assessment from a raw probability.
    #[must_use]
    pub fn new(score: f64) -> Self {
        Self {
            score,
            band: RiskBand::from_score(score),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Impacts with absolute value at or below this are labeled neutral.
pub const NEUTRAL_IMPACT_ZONE: f64 = 0.01;

/// Qualitative label for a feature's attribution impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLabel {
    IncreasesRisk,
    DecreasesRisk,
    Neutral,
}

impl ImpactLabel {
    /// Label a signed impact value per the neutral-zone rule.
    #[must_use]
    pub fn from_impact(impact: f64) -> Self {
        if impact > NEUTRAL_IMPACT_ZONE {
            Self::IncreasesRisk
        } else if impact < -NEUTRAL_IMPACT_ZONE {
            Self::DecreasesRisk
        } else {
            Self::Neutral
        }
    }
}

/// One feature's estimated contribution to the score's deviation from the
/// background average. Positive impact increases risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionEntry {
    pub feature: String,
    pub impact: f64,
    pub label: ImpactLabel,
}

impl AttributionEntry {
    /// Create an entry, deriving the qualitative label from the impact.
    #[must_use]
    pub fn new(feature: impl Into<String>, impact: f64) -> Self {
        Self {
            feature: feature.into(),
            impact,
            label: ImpactLabel::from_impact(impact),
        }
    }
}

/// Result of rescoring a record under a counterfactual modification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Score of the unmodified record
    pub original_score: f64,

    /// Score of the modified record
    pub new_score: f64,

    /// original - new; negative means the modification increased risk
    pub risk_reduction: f64,

    /// The full modified record that was scored
    pub modified: PatientRecord,
}

/// A named, clinically motivated improvement scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: &'static str,

    /// Exact change that was applied
    pub description: String,

    pub original_score: f64,
    pub new_score: f64,
    pub risk_reduction: f64,
}

/// Slope threshold above which the trend is critical.
pub const TREND_CRITICAL_SLOPE: f64 = 0.05;

/// Slope threshold above which the trend is a warning.
pub const TREND_WARNING_SLOPE: f64 = 0.01;

/// Slope threshold below which the trend is improving.
pub const TREND_IMPROVING_SLOPE: f64 = -0.01;

/// Discrete alert state derived from the risk-velocity slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendState {
    /// Slope above 0.05
    Critical,
    /// Slope in (0.01, 0.05]
    Warning,
    /// Slope below -0.01
    Improving,
    /// Slope in [-0.01, 0.01]
    Stable,
    /// Fewer than two history points
    InsufficientData,
}

impl TrendState {
    /// Classify a fitted slope against the fixed thresholds.
    #[must_use]
    pub fn from_slope(slope: f64) -> Self {
        if slope > TREND_CRITICAL_SLOPE {
            Self::Critical
        } else if slope > TREND_WARNING_SLOPE {
            Self::Warning
        } else if slope < TREND_IMPROVING_SLOPE {
            Self::Improving
        } else {
            Self::Stable
        }
    }
}

impl std::fmt::Display for TrendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Critical => "Critical: Rapid Risk Increase",
            Self::Warning => "Warning: Rising Risk",
            Self::Improving => "Positive: Risk Decreasing",
            Self::Stable => "Stable",
            Self::InsufficientData => "Insufficient Data",
        };
        write!(f, "{text}")
    }
}

/// Risk velocity over a subject's recent assessments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendResult {
    /// OLS slope of the recent scores against their index positions,
    /// rounded to 4 decimal places.
    pub slope: f64,

    pub state: TrendState,
}
