use super::{RiskTier, ScoreComponent, ScoreFactor, ScoringInput};

pub const MIN_CREDIT_SCORE: u16 = 300;
pub const MAX_CREDIT_SCORE: u16 = 850;
pub const LOAN_LIMIT_FLOOR: u64 = 20_000;
pub const LOAN_LIMIT_CEILING: u64 = 500_000;

const BASE_SCORE: f64 = 600.0;
const VEGETATION_WEIGHT: f64 = 120.0;
const RAINFALL_BASELINE_MM: f64 = 60.0;
const RAINFALL_WEIGHT: f64 = 0.3;
const OPTIMAL_TEMPERATURE_C: f64 = 25.0;
const TEMPERATURE_PENALTY: f64 = 1.5;
const YIELD_WEIGHT: f64 = 2.0;
const FARM_SIZE_WEIGHT: f64 = 0.8;
const PREVIOUS_LOAN_PENALTY: f64 = 5.0;
const DEFAULT_PENALTY: f64 = 50.0;
const LOAN_LIMIT_MULTIPLIER: f64 = 500.0;

pub(crate) fn score_components(input: &ScoringInput) -> (Vec<ScoreComponent>, f64) {
    let temperature_gap = (input.temperature_c - OPTIMAL_TEMPERATURE_C).abs();

    let components = vec![
        ScoreComponent {
            factor: ScoreFactor::Base,
            points: BASE_SCORE,
            notes: "base score".to_string(),
        },
        ScoreComponent {
            factor: ScoreFactor::Vegetation,
            points: input.vegetation_index * VEGETATION_WEIGHT,
            notes: format!("vegetation index {:.3}", input.vegetation_index),
        },
        ScoreComponent {
            factor: ScoreFactor::Rainfall,
            points: (input.rainfall_mm - RAINFALL_BASELINE_MM) * RAINFALL_WEIGHT,
            notes: format!(
                "rainfall {:.1}mm against {RAINFALL_BASELINE_MM}mm baseline",
                input.rainfall_mm
            ),
        },
        ScoreComponent {
            factor: ScoreFactor::Temperature,
            points: -temperature_gap * TEMPERATURE_PENALTY,
            notes: format!(
                "{:.1}C is {temperature_gap:.1}C from {OPTIMAL_TEMPERATURE_C}C",
                input.temperature_c
            ),
        },
        ScoreComponent {
            factor: ScoreFactor::CropYield,
            points: input.crop_yield_per_sqm * YIELD_WEIGHT,
            notes: format!("expected yield {:.2} kg/m2", input.crop_yield_per_sqm),
        },
        ScoreComponent {
            factor: ScoreFactor::FarmSize,
            points: input.farm_size_sqm * FARM_SIZE_WEIGHT,
            notes: format!("farm size {:.0} m2", input.farm_size_sqm),
        },
        ScoreComponent {
            factor: ScoreFactor::LoanHistory,
            points: -f64::from(input.previous_loans) * PREVIOUS_LOAN_PENALTY,
            notes: format!("{} previous loan(s)", input.previous_loans),
        },
        ScoreComponent {
            factor: ScoreFactor::Defaults,
            points: -f64::from(input.defaulted_loans) * DEFAULT_PENALTY,
            notes: format!("{} defaulted loan(s)", input.defaulted_loans),
        },
    ];

    let raw_score = components.iter().map(|component| component.points).sum();
    (components, raw_score)
}

pub(crate) fn clamp_score(raw_score: f64) -> u16 {
    if raw_score.is_nan() {
        return MIN_CREDIT_SCORE;
    }

    raw_score
        .clamp(f64::from(MIN_CREDIT_SCORE), f64::from(MAX_CREDIT_SCORE))
        .round() as u16
}

pub(crate) fn interest_rate_for(score: u16) -> u8 {
    if score >= 750 {
        8
    } else if score >= 650 {
        12
    } else if score >= 550 {
        16
    } else {
        20
    }
}

pub(crate) fn loan_duration_for(score: u16) -> u8 {
    if score >= 700 {
        12
    } else if score >= 600 {
        9
    } else {
        6
    }
}

pub(crate) fn risk_tier_for(score: u16) -> RiskTier {
    if score >= 750 {
        RiskTier::Low
    } else if score >= 600 {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

/// Limit is computed from farm output alone, independent of the score.
pub(crate) fn loan_limit_for(input: &ScoringInput) -> u64 {
    let raw = (input.farm_size_sqm
        * input.crop_yield_per_sqm
        * input.vegetation_index
        * LOAN_LIMIT_MULTIPLIER)
        .round();

    if raw.is_nan() {
        return LOAN_LIMIT_FLOOR;
    }

    raw.clamp(LOAN_LIMIT_FLOOR as f64, LOAN_LIMIT_CEILING as f64) as u64
}
