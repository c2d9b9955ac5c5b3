use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::domain::{
    ApplicationId, ApplicationSnapshot, ApplicationStatus, CreditorDecision, DecisionRecord,
    DecisionRequest, FarmerProfile, FarmerProfileSubmission, LoanApplication, LoanRequest,
    LoanRequestError, ProfileAssessment,
};
use super::environment::{EnvironmentalDataProvider, ProviderError};
use super::repository::{ApplicationRepository, ProfileRepository, RepositoryError};
use super::scoring::{Assessment, ScoringEngine, ScoringInput, ScoringInputError};
use super::stats::ApplicationStats;

const ID_ATTEMPTS: u32 = 3;

fn next_application_id() -> ApplicationId {
    let token = Uuid::new_v4().simple().to_string();
    ApplicationId(format!("APP-{}", token[..10].to_ascii_uppercase()))
}

/// Service composing the profile store, application store, environmental provider, and
/// scoring engine. All state changes go through here.
pub struct LendingService<P, A, E> {
    profiles: Arc<P>,
    applications: Arc<A>,
    environment: Arc<E>,
    engine: Arc<ScoringEngine>,
}

impl<P, A, E> LendingService<P, A, E>
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    pub fn new(
        profiles: Arc<P>,
        applications: Arc<A>,
        environment: Arc<E>,
        engine: ScoringEngine,
    ) -> Self {
        Self {
            profiles,
            applications,
            environment,
            engine: Arc::new(engine),
        }
    }

    /// Validate and score raw inputs without touching storage.
    pub fn assess(&self, input: &ScoringInput) -> Result<Assessment, LendingServiceError> {
        input.validate()?;
        Ok(self.engine.assess(input))
    }

    /// Fetch environmental readings, score the farm, and replace the stored profile.
    pub fn submit_profile(
        &self,
        submission: FarmerProfileSubmission,
    ) -> Result<FarmerProfile, LendingServiceError> {
        require_field("name", &submission.name)?;
        require_field("phone", &submission.phone)?;
        require_field("national_id", &submission.national_id)?;

        let environment = self.environment.fetch(&submission.location)?;
        let input = ScoringInput::from_submission(&submission, &environment);
        input.validate()?;
        let assessment = self.engine.assess(&input);
        let now = Utc::now();

        let profile = FarmerProfile {
            name: submission.name.trim().to_string(),
            phone: submission.phone.trim().to_string(),
            national_id: submission.national_id.trim().to_string(),
            crop_yield_per_sqm: input.crop_yield_per_sqm,
            location: submission.location,
            farm_size_sqm: submission.farm_size_sqm,
            crop_type: submission.crop_type,
            previous_loans: submission.previous_loans,
            defaulted_loans: submission.defaulted_loans,
            assessment: Some(ProfileAssessment {
                assessment,
                environment,
                assessed_at: now,
            }),
            updated_at: now,
        };

        self.profiles.save(profile.clone())?;

        if let Some(assessed) = &profile.assessment {
            info!(
                national_id = %profile.national_id,
                score = assessed.assessment.score,
                risk_tier = assessed.assessment.risk_tier.label(),
                loan_limit = assessed.assessment.loan_limit,
                "farmer profile assessed"
            );
        }

        Ok(profile)
    }

    pub fn current_profile(&self) -> Result<Option<FarmerProfile>, LendingServiceError> {
        Ok(self.profiles.load()?)
    }

    /// Create a pending application from the current profile and the request.
    pub fn submit(&self, request: LoanRequest) -> Result<LoanApplication, LendingServiceError> {
        let profile = self
            .profiles
            .load()?
            .ok_or(LendingServiceError::ProfileRequired)?;
        let assessed = profile
            .assessment
            .as_ref()
            .ok_or(LendingServiceError::ProfileRequired)?;

        request.validate(assessed.assessment.loan_limit)?;

        let snapshot = ApplicationSnapshot::capture(&profile, assessed);
        let submitted_at = Utc::now();
        let mut attempt = 1;

        loop {
            let application = LoanApplication {
                application_id: next_application_id(),
                farmer_id: profile.national_id.clone(),
                request: request.clone(),
                snapshot: snapshot.clone(),
                status: ApplicationStatus::Pending,
                decision: None,
                review_started_at: None,
                submitted_at,
            };

            match self.applications.insert(application) {
                Ok(stored) => {
                    info!(
                        application_id = %stored.application_id,
                        amount = stored.request.amount,
                        purpose = stored.request.purpose.label(),
                        "loan application submitted"
                    );
                    return Ok(stored);
                }
                Err(RepositoryError::Conflict) if attempt < ID_ATTEMPTS => {
                    warn!(attempt, "application id collision, drawing a new id");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Move a pending application into creditor review.
    pub fn start_review(
        &self,
        application_id: &ApplicationId,
    ) -> Result<LoanApplication, LendingServiceError> {
        let application = self
            .applications
            .transition(application_id, |application| match application.status {
                ApplicationStatus::UnderReview => Ok(false),
                ApplicationStatus::Pending => {
                    application.status = ApplicationStatus::UnderReview;
                    application.review_started_at = Some(Utc::now());
                    Ok(true)
                }
                status => Err(LendingServiceError::TerminalStateViolation {
                    application_id: application_id.clone(),
                    status,
                    attempted: ApplicationStatus::UnderReview,
                }),
            })
            .map_err(|err| missing_as_not_found(err, application_id))?;

        info!(application_id = %application_id, "application moved to review");
        Ok(application)
    }

    /// Record a creditor decision. Nothing is written unless every check passes, and the
    /// terminal-state check runs under the same repository lock as the write.
    pub fn decide(
        &self,
        application_id: &ApplicationId,
        request: DecisionRequest,
    ) -> Result<LoanApplication, LendingServiceError> {
        let comments = request.comments.trim();
        if comments.is_empty() {
            return Err(LendingServiceError::CommentsRequired);
        }

        let decision = CreditorDecision::parse(&request.decision)
            .ok_or_else(|| LendingServiceError::InvalidDecision(request.decision.clone()))?;

        if request.adjusted_amount == Some(0) {
            return Err(LendingServiceError::InvalidAdjustment(
                "adjusted amount must be greater than zero".to_string(),
            ));
        }
        if let Some(rate) = request.adjusted_rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(LendingServiceError::InvalidAdjustment(format!(
                    "adjusted rate must be a positive percentage, found {rate}"
                )));
            }
        }

        let application = self
            .applications
            .transition(application_id, |application| {
                if application.status.is_terminal() {
                    return Err(LendingServiceError::TerminalStateViolation {
                        application_id: application_id.clone(),
                        status: application.status,
                        attempted: decision.status(),
                    });
                }

                let limit = application.snapshot.recommended_limit;
                if let Some(amount) = request.adjusted_amount {
                    if amount > limit {
                        return Err(LendingServiceError::InvalidAdjustment(format!(
                            "adjusted amount KSh {amount} exceeds the limit of KSh {limit}"
                        )));
                    }
                }

                let (approved_amount, approved_rate) = match decision {
                    CreditorDecision::Approved => (
                        Some(request.adjusted_amount.unwrap_or(application.request.amount)),
                        Some(
                            request
                                .adjusted_rate
                                .unwrap_or(f64::from(application.snapshot.interest_rate)),
                        ),
                    ),
                    CreditorDecision::Rejected => (None, None),
                };

                application.status = decision.status();
                application.decision = Some(DecisionRecord {
                    decision,
                    comments: comments.to_string(),
                    reviewed_at: Utc::now(),
                    approved_amount,
                    approved_rate,
                });
                Ok(true)
            })
            .map_err(|err| missing_as_not_found(err, application_id))?;

        info!(
            application_id = %application_id,
            decision = application.status.label(),
            "creditor decision recorded"
        );
        Ok(application)
    }

    /// All applications, or those in `status`, in submission order.
    pub fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<LoanApplication>, LendingServiceError> {
        Ok(self.applications.list(status)?)
    }

    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<LoanApplication, LendingServiceError> {
        self.fetch_existing(application_id)
    }

    pub fn stats(&self) -> Result<ApplicationStats, LendingServiceError> {
        let applications = self.applications.list(None)?;
        Ok(ApplicationStats::from_applications(&applications))
    }

    fn fetch_existing(
        &self,
        application_id: &ApplicationId,
    ) -> Result<LoanApplication, LendingServiceError> {
        self.applications
            .fetch(application_id)?
            .ok_or_else(|| LendingServiceError::ApplicationNotFound(application_id.clone()))
    }
}

fn missing_as_not_found(
    error: LendingServiceError,
    application_id: &ApplicationId,
) -> LendingServiceError {
    match error {
        LendingServiceError::Repository(RepositoryError::NotFound) => {
            LendingServiceError::ApplicationNotFound(application_id.clone())
        }
        other => other,
    }
}

fn require_field(field: &'static str, value: &str) -> Result<(), LendingServiceError> {
    if value.trim().is_empty() {
        return Err(LendingServiceError::IncompleteProfile(field));
    }
    Ok(())
}

/// Error raised by the lending service.
#[derive(Debug, thiserror::Error)]
pub enum LendingServiceError {
    #[error("complete and assess a farmer profile before applying for a loan")]
    ProfileRequired,
    #[error("profile field '{0}' is required")]
    IncompleteProfile(&'static str),
    #[error("creditor comments are required for a decision")]
    CommentsRequired,
    #[error("'{0}' is not a valid decision; expected approved or rejected")]
    InvalidDecision(String),
    #[error("invalid adjustment: {0}")]
    InvalidAdjustment(String),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("application {application_id} is already {status} and cannot move to {attempted}")]
    TerminalStateViolation {
        application_id: ApplicationId,
        status: ApplicationStatus,
        attempted: ApplicationStatus,
    },
    #[error(transparent)]
    InvalidLoanRequest(#[from] LoanRequestError),
    #[error(transparent)]
    InvalidInput(#[from] ScoringInputError),
    #[error(transparent)]
    ProviderUnavailable(#[from] ProviderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
