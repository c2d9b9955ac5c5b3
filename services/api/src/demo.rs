use crate::infra::{build_lending_service, open_store, parse_crop};
use clap::Args;
use kilimo_kredo::config::{ProviderConfig, StorageConfig};
use kilimo_kredo::error::AppError;
use kilimo_kredo::lending::{
    assess, ApplicationStats, Assessment, CropType, DecisionRequest, FarmerProfileSubmission,
    GeoLocation, LendingServiceError, LoanApplication, LoanPurpose, LoanRequest,
    RandomConfidence, ScoringInput, DEFAULT_CROP_YIELD_PER_SQM,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Vegetation index (NDVI) between 0 and 1
    #[arg(long)]
    pub(crate) vegetation_index: f64,
    /// Average rainfall in millimetres
    #[arg(long)]
    pub(crate) rainfall: f64,
    /// Average temperature in degrees Celsius
    #[arg(long)]
    pub(crate) temperature: f64,
    /// Farm size in square metres
    #[arg(long)]
    pub(crate) farm_size: f64,
    /// Expected yield per square metre
    #[arg(long, default_value_t = DEFAULT_CROP_YIELD_PER_SQM)]
    pub(crate) crop_yield: f64,
    /// Primary crop
    #[arg(long, default_value = "Maize", value_parser = parse_crop)]
    pub(crate) crop: CropType,
    #[arg(long, default_value_t = 0)]
    pub(crate) previous_loans: u32,
    #[arg(long, default_value_t = 0)]
    pub(crate) defaulted_loans: u32,
    /// Print the assessment as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Seed for the synthetic environmental readings and confidence draws
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Persist demo state under this directory instead of memory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let input = ScoringInput {
        vegetation_index: args.vegetation_index,
        rainfall_mm: args.rainfall,
        temperature_c: args.temperature,
        crop_type: args.crop,
        farm_size_sqm: args.farm_size,
        previous_loans: args.previous_loans,
        defaulted_loans: args.defaulted_loans,
        crop_yield_per_sqm: args.crop_yield,
    };
    input.validate().map_err(LendingServiceError::from)?;

    let assessment = assess(&input, &RandomConfidence::from_entropy());
    if args.json {
        let rendered = serde_json::to_string_pretty(&assessment)
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{rendered}");
    } else {
        render_assessment(&assessment);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = open_store(&StorageConfig {
        data_dir: args.data_dir,
    })?;
    let provider = ProviderConfig {
        max_attempts: 3,
        backoff_ms: 0,
        seed: Some(args.seed.unwrap_or(2024)),
    };
    let service = build_lending_service(store, &provider);

    println!("KilimoKredo lending demo");
    let profile = service.submit_profile(sample_farmer())?;
    println!(
        "\nFarmer: {} ({}) | {} on {:.0} m2 near {}",
        profile.name,
        profile.national_id,
        profile.crop_type.label(),
        profile.farm_size_sqm,
        profile.location.label.as_deref().unwrap_or("unknown location")
    );
    if let Some(assessed) = &profile.assessment {
        println!(
            "Readings: NDVI {:.3} | rainfall {:.2} mm | temperature {:.2} C",
            assessed.environment.vegetation_index,
            assessed.environment.rainfall_mm,
            assessed.environment.temperature_c
        );
        render_assessment(&assessed.assessment);
    }

    let seeds = service.submit(sample_request(60_000, LoanPurpose::SeedsAndFertilizer, 6))?;
    let irrigation = service.submit(sample_request(150_000, LoanPurpose::Irrigation, 12))?;
    let equipment = service.submit(sample_request(90_000, LoanPurpose::Equipment, 18))?;
    println!("\nSubmitted applications");
    render_applications(&service.list(None)?);

    service.start_review(&irrigation.application_id)?;
    service.decide(
        &seeds.application_id,
        DecisionRequest::new("approved", "healthy vegetation and clean repayment record"),
    )?;
    service.decide(
        &irrigation.application_id,
        DecisionRequest::new("approved", "approve first phase of the irrigation build")
            .with_adjustments(Some(100_000), Some(10.0)),
    )?;
    service.decide(
        &equipment.application_id,
        DecisionRequest::new("rejected", "equipment quote missing"),
    )?;

    println!("\nAfter creditor review");
    render_applications(&service.list(None)?);
    render_stats(&service.stats()?);

    Ok(())
}

fn sample_farmer() -> FarmerProfileSubmission {
    FarmerProfileSubmission {
        name: "Amina Chebet".to_string(),
        phone: "+254722555010".to_string(),
        national_id: "31456789".to_string(),
        location: GeoLocation {
            latitude: 0.5143,
            longitude: 35.2698,
            label: Some("Eldoret".to_string()),
        },
        farm_size_sqm: 8_000.0,
        crop_type: CropType::Maize,
        crop_yield_per_sqm: Some(4.5),
        previous_loans: 2,
        defaulted_loans: 0,
    }
}

fn sample_request(amount: u64, purpose: LoanPurpose, duration_months: u16) -> LoanRequest {
    LoanRequest {
        amount,
        purpose,
        duration_months,
        seasonal_expense: amount / 2,
        expected_yield_kg: 36_000.0,
    }
}

fn render_assessment(assessment: &Assessment) {
    println!(
        "Credit score {} ({} risk) | {}% interest | limit KSh {} | {} month term | confidence {:.0}%",
        assessment.score,
        assessment.risk_tier.label(),
        assessment.interest_rate,
        assessment.loan_limit,
        assessment.loan_duration_months,
        assessment.confidence * 100.0
    );
    println!("Score breakdown (raw {:.1}):", assessment.raw_score);
    for component in &assessment.components {
        println!("  - {:+9.1}  {}", component.points, component.notes);
    }
}

fn render_applications(applications: &[LoanApplication]) {
    for application in applications {
        let view = application.status_view();
        println!(
            "  - {} | {} | KSh {} | {} | {}",
            view.application_id,
            application.request.purpose.label(),
            view.amount,
            view.status,
            view.decision_summary
        );
    }
}

fn render_stats(stats: &ApplicationStats) {
    println!(
        "\nPortfolio: {} total | {} pending | {} under review | {} approved | {} rejected",
        stats.total, stats.pending, stats.under_review, stats.approved, stats.rejected
    );
    println!(
        "Requested KSh {} | approved KSh {}",
        stats.requested_amount, stats.approved_amount
    );
}
