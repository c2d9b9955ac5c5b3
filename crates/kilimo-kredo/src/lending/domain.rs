use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scoring::{Assessment, RiskTier};

/// Expected yield assumed when a farmer leaves the field blank.
pub const DEFAULT_CROP_YIELD_PER_SQM: f64 = 5.0;

/// Loan terms, in months, offered on the application form.
pub const OFFERED_DURATIONS_MONTHS: [u16; 4] = [6, 12, 18, 24];

/// Identifier wrapper for submitted loan applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Farm coordinates plus whatever place name the farmer typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropType {
    Maize,
    Wheat,
    Tea,
    Coffee,
    Rice,
    Beans,
    Potatoes,
}

impl CropType {
    pub const fn label(self) -> &'static str {
        match self {
            CropType::Maize => "Maize",
            CropType::Wheat => "Wheat",
            CropType::Tea => "Tea",
            CropType::Coffee => "Coffee",
            CropType::Rice => "Rice",
            CropType::Beans => "Beans",
            CropType::Potatoes => "Potatoes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPurpose {
    SeedsAndFertilizer,
    Equipment,
    Irrigation,
    Labor,
    LandPreparation,
    Other,
}

impl LoanPurpose {
    pub const fn label(self) -> &'static str {
        match self {
            LoanPurpose::SeedsAndFertilizer => "Seeds & Fertilizer",
            LoanPurpose::Equipment => "Equipment",
            LoanPurpose::Irrigation => "Irrigation System",
            LoanPurpose::Labor => "Labor Costs",
            LoanPurpose::LandPreparation => "Land Preparation",
            LoanPurpose::Other => "Other",
        }
    }
}

/// Remote-sensing and weather readings used for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalSnapshot {
    pub vegetation_index: f64,
    pub rainfall_mm: f64,
    pub temperature_c: f64,
}

/// Profile form payload as submitted by the farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerProfileSubmission {
    pub name: String,
    pub phone: String,
    pub national_id: String,
    pub location: GeoLocation,
    pub farm_size_sqm: f64,
    pub crop_type: CropType,
    #[serde(default)]
    pub crop_yield_per_sqm: Option<f64>,
    #[serde(default)]
    pub previous_loans: u32,
    #[serde(default)]
    pub defaulted_loans: u32,
}

impl FarmerProfileSubmission {
    pub fn crop_yield_per_sqm(&self) -> f64 {
        self.crop_yield_per_sqm.unwrap_or(DEFAULT_CROP_YIELD_PER_SQM)
    }
}

/// Assessment attached to a profile together with the readings it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAssessment {
    pub assessment: Assessment,
    pub environment: EnvironmentalSnapshot,
    pub assessed_at: DateTime<Utc>,
}

/// The single active farmer profile. Replaced wholesale on every submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerProfile {
    pub name: String,
    pub phone: String,
    pub national_id: String,
    pub location: GeoLocation,
    pub farm_size_sqm: f64,
    pub crop_type: CropType,
    pub crop_yield_per_sqm: f64,
    pub previous_loans: u32,
    pub defaulted_loans: u32,
    #[serde(default)]
    pub assessment: Option<ProfileAssessment>,
    pub updated_at: DateTime<Utc>,
}

/// Loan form payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub amount: u64,
    pub purpose: LoanPurpose,
    pub duration_months: u16,
    #[serde(default)]
    pub seasonal_expense: u64,
    #[serde(default)]
    pub expected_yield_kg: f64,
}

impl LoanRequest {
    /// Checks the request against the recommended limit captured from the profile.
    pub fn validate(&self, recommended_limit: u64) -> Result<(), LoanRequestError> {
        if self.amount == 0 {
            return Err(LoanRequestError::ZeroAmount);
        }

        if self.amount > recommended_limit {
            return Err(LoanRequestError::ExceedsLimit {
                requested: self.amount,
                limit: recommended_limit,
            });
        }

        if !OFFERED_DURATIONS_MONTHS.contains(&self.duration_months) {
            return Err(LoanRequestError::UnsupportedDuration(self.duration_months));
        }

        if !self.expected_yield_kg.is_finite() || self.expected_yield_kg < 0.0 {
            return Err(LoanRequestError::InvalidExpectedYield(self.expected_yield_kg));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoanRequestError {
    #[error("loan amount must be greater than zero")]
    ZeroAmount,
    #[error("requested KSh {requested} exceeds the recommended limit of KSh {limit}")]
    ExceedsLimit { requested: u64, limit: u64 },
    #[error("loan duration of {0} months is not offered (choose 6, 12, 18 or 24)")]
    UnsupportedDuration(u16),
    #[error("expected yield must be a non-negative number, found {0}")]
    InvalidExpectedYield(f64),
}

/// Copy of the farmer's standing at submission time. Later profile edits never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSnapshot {
    pub credit_score: u16,
    pub interest_rate: u8,
    pub recommended_limit: u64,
    pub risk_tier: RiskTier,
    pub location: GeoLocation,
    pub crop_type: CropType,
    pub farm_size_sqm: f64,
    pub environment: EnvironmentalSnapshot,
}

impl ApplicationSnapshot {
    pub fn capture(profile: &FarmerProfile, assessed: &ProfileAssessment) -> Self {
        Self {
            credit_score: assessed.assessment.score,
            interest_rate: assessed.assessment.interest_rate,
            recommended_limit: assessed.assessment.loan_limit,
            risk_tier: assessed.assessment.risk_tier,
            location: profile.location.clone(),
            crop_type: profile.crop_type,
            farm_size_sqm: profile.farm_size_sqm,
            environment: assessed.environment,
        }
    }
}

/// Lifecycle status of a loan application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

/// The two outcomes a creditor may record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditorDecision {
    Approved,
    Rejected,
}

impl CreditorDecision {
    /// Only terminal statuses are decisions; anything else yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.parse::<ApplicationStatus>().ok()? {
            ApplicationStatus::Approved => Some(CreditorDecision::Approved),
            ApplicationStatus::Rejected => Some(CreditorDecision::Rejected),
            ApplicationStatus::Pending | ApplicationStatus::UnderReview => None,
        }
    }

    pub const fn status(self) -> ApplicationStatus {
        match self {
            CreditorDecision::Approved => ApplicationStatus::Approved,
            CreditorDecision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// Creditor review form payload. `decision` stays a raw string so unrecognized values
/// surface as a domain error rather than a deserialization failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub adjusted_amount: Option<u64>,
    #[serde(default)]
    pub adjusted_rate: Option<f64>,
}

impl DecisionRequest {
    pub fn new(decision: impl Into<String>, comments: impl Into<String>) -> Self {
        Self {
            decision: decision.into(),
            comments: comments.into(),
            adjusted_amount: None,
            adjusted_rate: None,
        }
    }

    pub fn with_adjustments(mut self, amount: Option<u64>, rate: Option<f64>) -> Self {
        self.adjusted_amount = amount;
        self.adjusted_rate = rate;
        self
    }
}

/// Recorded creditor decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: CreditorDecision,
    pub comments: String,
    pub reviewed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub application_id: ApplicationId,
    pub farmer_id: String,
    pub request: LoanRequest,
    pub snapshot: ApplicationSnapshot,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub decision: Option<DecisionRecord>,
    #[serde(default)]
    pub review_started_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

impl LoanApplication {
    pub fn decision_summary(&self) -> String {
        match (&self.status, &self.decision) {
            (ApplicationStatus::Approved, Some(record)) => {
                let amount = record.approved_amount.unwrap_or(self.request.amount);
                let rate = record
                    .approved_rate
                    .unwrap_or(f64::from(self.snapshot.interest_rate));
                format!("approved KSh {amount} at {rate:.1}%: {}", record.comments)
            }
            (ApplicationStatus::Rejected, Some(record)) => {
                format!("rejected: {}", record.comments)
            }
            (ApplicationStatus::UnderReview, _) => "under creditor review".to_string(),
            _ => "awaiting creditor review".to_string(),
        }
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.application_id.clone(),
            status: self.status.label(),
            amount: self.request.amount,
            credit_score: self.snapshot.credit_score,
            decision_summary: self.decision_summary(),
        }
    }
}

/// Compact row used by list views and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub amount: u64,
    pub credit_score: u16,
    pub decision_summary: String,
}
