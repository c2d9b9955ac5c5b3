//! Farmer credit assessment and the loan application lifecycle.
//!
//! Profiles are scored from farm, environmental, and credit-history inputs; applications
//! snapshot that assessment and move from `pending` through an optional `under_review`
//! stage to a terminal creditor decision.

pub mod domain;
pub mod environment;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod stats;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationSnapshot, ApplicationStatus, ApplicationStatusView, CreditorDecision,
    CropType, DecisionRecord, DecisionRequest, EnvironmentalSnapshot, FarmerProfile,
    FarmerProfileSubmission, GeoLocation, LoanApplication, LoanPurpose, LoanRequest,
    LoanRequestError, ProfileAssessment, DEFAULT_CROP_YIELD_PER_SQM, OFFERED_DURATIONS_MONTHS,
};
pub use environment::{
    EnvironmentalDataProvider, ProviderError, RetryPolicy, RetryingProvider,
    SyntheticEnvironmentProvider,
};
pub use repository::{
    ApplicationRepository, ProfileRepository, RepositoryError, StoreApplicationRepository,
    StoreProfileRepository,
};
pub use router::lending_router;
pub use scoring::{
    assess, Assessment, ConfidenceSource, FixedConfidence, RandomConfidence, RiskTier,
    ScoreComponent, ScoreFactor, ScoringEngine, ScoringInput, ScoringInputError,
};
pub use service::{LendingService, LendingServiceError};
pub use stats::ApplicationStats;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
