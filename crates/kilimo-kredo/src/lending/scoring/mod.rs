mod confidence;
mod rules;
mod validation;

pub use confidence::{ConfidenceSource, FixedConfidence, RandomConfidence, CONFIDENCE_RANGE};
pub use rules::{LOAN_LIMIT_CEILING, LOAN_LIMIT_FLOOR, MAX_CREDIT_SCORE, MIN_CREDIT_SCORE};
pub use validation::ScoringInputError;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{CropType, EnvironmentalSnapshot, FarmerProfileSubmission};

/// Everything the score formula reads. Crop type is carried for the record only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringInput {
    pub vegetation_index: f64,
    pub rainfall_mm: f64,
    pub temperature_c: f64,
    pub crop_type: CropType,
    pub farm_size_sqm: f64,
    #[serde(default)]
    pub previous_loans: u32,
    #[serde(default)]
    pub defaulted_loans: u32,
    pub crop_yield_per_sqm: f64,
}

impl ScoringInput {
    pub fn from_submission(
        submission: &FarmerProfileSubmission,
        environment: &EnvironmentalSnapshot,
    ) -> Self {
        Self {
            vegetation_index: environment.vegetation_index,
            rainfall_mm: environment.rainfall_mm,
            temperature_c: environment.temperature_c,
            crop_type: submission.crop_type,
            farm_size_sqm: submission.farm_size_sqm,
            previous_loans: submission.previous_loans,
            defaulted_loans: submission.defaulted_loans,
            crop_yield_per_sqm: submission.crop_yield_per_sqm(),
        }
    }
}

/// Coarse risk classification derived from the clamped score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }
}

/// Terms of the raw score, in formula order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Base,
    Vegetation,
    Rainfall,
    Temperature,
    CropYield,
    FarmSize,
    LoanHistory,
    Defaults,
}

/// Discrete contribution to the raw score so assessments can be audited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub score: u16,
    pub interest_rate: u8,
    pub loan_limit: u64,
    pub loan_duration_months: u8,
    pub risk_tier: RiskTier,
    /// Display-only figure; nothing else in the assessment depends on it.
    pub confidence: f64,
    pub raw_score: f64,
    #[serde(default)]
    pub components: Vec<ScoreComponent>,
}

impl Assessment {
    /// True when every field except `confidence` matches.
    pub fn same_terms(&self, other: &Assessment) -> bool {
        self.score == other.score
            && self.interest_rate == other.interest_rate
            && self.loan_limit == other.loan_limit
            && self.loan_duration_months == other.loan_duration_months
            && self.risk_tier == other.risk_tier
    }
}

/// Score a farm. Inputs are taken as-is; run [`ScoringInput::validate`] first to reject
/// out-of-range values.
pub fn assess(input: &ScoringInput, confidence: &dyn ConfidenceSource) -> Assessment {
    let (components, raw_score) = rules::score_components(input);
    let score = rules::clamp_score(raw_score);

    Assessment {
        score,
        interest_rate: rules::interest_rate_for(score),
        loan_limit: rules::loan_limit_for(input),
        loan_duration_months: rules::loan_duration_for(score),
        risk_tier: rules::risk_tier_for(score),
        confidence: confidence.draw(),
        raw_score,
        components,
    }
}

/// Scoring entry point that owns its confidence source.
pub struct ScoringEngine {
    confidence: Arc<dyn ConfidenceSource>,
}

impl ScoringEngine {
    pub fn new(confidence: Arc<dyn ConfidenceSource>) -> Self {
        Self { confidence }
    }

    pub fn assess(&self, input: &ScoringInput) -> Assessment {
        assess(input, self.confidence.as_ref())
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(Arc::new(RandomConfidence::from_entropy()))
    }
}
