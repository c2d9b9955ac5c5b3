use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::lending::domain::{
    ApplicationId, ApplicationSnapshot, ApplicationStatus, CropType, EnvironmentalSnapshot,
    FarmerProfileSubmission, GeoLocation, LoanApplication, LoanPurpose, LoanRequest,
};
use crate::lending::environment::{EnvironmentalDataProvider, ProviderError};
use crate::lending::repository::{
    ApplicationRepository, RepositoryError, StoreApplicationRepository, StoreProfileRepository,
};
use crate::lending::scoring::{FixedConfidence, RiskTier, ScoringEngine, ScoringInput};
use crate::lending::service::LendingService;
use crate::lending::store::MemoryStore;
use crate::lending::{lending_router, ProfileRepository};

pub(super) type MemoryProfiles = StoreProfileRepository<MemoryStore>;
pub(super) type MemoryApplications = StoreApplicationRepository<MemoryStore>;
pub(super) type TestService = LendingService<MemoryProfiles, MemoryApplications, FixedEnvironment>;

/// Provider returning the same readings for every location.
pub(super) struct FixedEnvironment {
    snapshot: EnvironmentalSnapshot,
    calls: AtomicU32,
}

impl FixedEnvironment {
    pub(super) fn new(snapshot: EnvironmentalSnapshot) -> Self {
        Self {
            snapshot,
            calls: AtomicU32::new(0),
        }
    }

    pub(super) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EnvironmentalDataProvider for FixedEnvironment {
    fn fetch(&self, _location: &GeoLocation) -> Result<EnvironmentalSnapshot, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot)
    }
}

pub(super) struct OfflineEnvironment;

impl EnvironmentalDataProvider for OfflineEnvironment {
    fn fetch(&self, _location: &GeoLocation) -> Result<EnvironmentalSnapshot, ProviderError> {
        Err(ProviderError::Unavailable("weather service offline".to_string()))
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn insert(&self, _application: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: LoanApplication) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn transition<E, F>(&self, _id: &ApplicationId, _edit: F) -> Result<LoanApplication, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut LoanApplication) -> Result<bool, E>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(
        &self,
        _status: Option<ApplicationStatus>,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn lush_environment() -> EnvironmentalSnapshot {
    EnvironmentalSnapshot {
        vegetation_index: 0.78,
        rainfall_mm: 120.0,
        temperature_c: 25.4,
    }
}

pub(super) fn nyeri() -> GeoLocation {
    GeoLocation {
        latitude: -0.4197,
        longitude: 36.9476,
        label: Some("Nyeri".to_string()),
    }
}

/// Inputs from the documented high-scoring example: raw score 8721, clamped to 850.
pub(super) fn high_scoring_input() -> ScoringInput {
    ScoringInput {
        vegetation_index: 0.78,
        rainfall_mm: 120.0,
        temperature_c: 25.4,
        crop_type: CropType::Maize,
        farm_size_sqm: 10_000.0,
        previous_loans: 0,
        defaulted_loans: 0,
        crop_yield_per_sqm: 5.0,
    }
}

/// Inputs from the documented defaulter example: exactly 500 after penalties.
pub(super) fn defaulter_input() -> ScoringInput {
    ScoringInput {
        vegetation_index: 0.0,
        rainfall_mm: 60.0,
        temperature_c: 25.0,
        crop_type: CropType::Beans,
        farm_size_sqm: 0.0,
        previous_loans: 0,
        defaulted_loans: 2,
        crop_yield_per_sqm: 0.0,
    }
}

pub(super) fn profile_submission() -> FarmerProfileSubmission {
    FarmerProfileSubmission {
        name: "Grace Wanjiru".to_string(),
        phone: "+254712345678".to_string(),
        national_id: "28765432".to_string(),
        location: nyeri(),
        farm_size_sqm: 10_000.0,
        crop_type: CropType::Coffee,
        crop_yield_per_sqm: Some(5.0),
        previous_loans: 2,
        defaulted_loans: 0,
    }
}

pub(super) fn loan_request(amount: u64) -> LoanRequest {
    LoanRequest {
        amount,
        purpose: LoanPurpose::SeedsAndFertilizer,
        duration_months: 12,
        seasonal_expense: 45_000,
        expected_yield_kg: 48_000.0,
    }
}

/// Application row built directly, bypassing the service checks.
pub(super) fn stored_application(id: &str, status: ApplicationStatus) -> LoanApplication {
    LoanApplication {
        application_id: ApplicationId(id.to_string()),
        farmer_id: "28765432".to_string(),
        request: loan_request(40_000),
        snapshot: ApplicationSnapshot {
            credit_score: 702,
            interest_rate: 12,
            recommended_limit: 120_000,
            risk_tier: RiskTier::Medium,
            location: nyeri(),
            crop_type: CropType::Tea,
            farm_size_sqm: 400.0,
            environment: lush_environment(),
        },
        status,
        decision: None,
        review_started_at: None,
        submitted_at: Utc::now(),
    }
}

pub(super) fn engine() -> ScoringEngine {
    ScoringEngine::new(Arc::new(FixedConfidence(0.95)))
}

pub(super) fn build_service() -> (TestService, Arc<MemoryStore>, Arc<FixedEnvironment>) {
    let store = Arc::new(MemoryStore::default());
    let environment = Arc::new(FixedEnvironment::new(lush_environment()));
    let service = LendingService::new(
        Arc::new(StoreProfileRepository::new(store.clone())),
        Arc::new(StoreApplicationRepository::new(store.clone())),
        environment.clone(),
        engine(),
    );
    (service, store, environment)
}

/// Service with a profile already assessed.
pub(super) fn service_with_profile() -> (TestService, Arc<MemoryStore>) {
    let (service, store, _) = build_service();
    service
        .submit_profile(profile_submission())
        .expect("profile assessed");
    (service, store)
}

pub(super) fn stored_applications(store: &Arc<MemoryStore>) -> Vec<LoanApplication> {
    StoreApplicationRepository::new(store.clone())
        .list(None)
        .expect("list succeeds")
}

pub(super) fn stored_profile_name(store: &Arc<MemoryStore>) -> Option<String> {
    StoreProfileRepository::new(store.clone())
        .load()
        .expect("load succeeds")
        .map(|profile| profile.name)
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    lending_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
