use super::ScoringInput;

/// Rejections raised before scoring so bad readings never reach the formula.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringInputError {
    #[error("vegetation index must be within [0, 1], found {0}")]
    VegetationIndexOutOfRange(f64),
    #[error("average rainfall must be a non-negative number, found {0}")]
    InvalidRainfall(f64),
    #[error("average temperature must be a finite number, found {0}")]
    InvalidTemperature(f64),
    #[error("farm size must be greater than zero, found {0}")]
    InvalidFarmSize(f64),
    #[error("crop yield per square metre must be non-negative, found {0}")]
    InvalidCropYield(f64),
    #[error("defaulted loans ({defaulted}) exceed previous loans ({previous})")]
    DefaultsExceedHistory { previous: u32, defaulted: u32 },
}

impl ScoringInput {
    pub fn validate(&self) -> Result<(), ScoringInputError> {
        if !(0.0..=1.0).contains(&self.vegetation_index) {
            return Err(ScoringInputError::VegetationIndexOutOfRange(self.vegetation_index));
        }

        if !self.rainfall_mm.is_finite() || self.rainfall_mm < 0.0 {
            return Err(ScoringInputError::InvalidRainfall(self.rainfall_mm));
        }

        if !self.temperature_c.is_finite() {
            return Err(ScoringInputError::InvalidTemperature(self.temperature_c));
        }

        if !self.farm_size_sqm.is_finite() || self.farm_size_sqm <= 0.0 {
            return Err(ScoringInputError::InvalidFarmSize(self.farm_size_sqm));
        }

        if !self.crop_yield_per_sqm.is_finite() || self.crop_yield_per_sqm < 0.0 {
            return Err(ScoringInputError::InvalidCropYield(self.crop_yield_per_sqm));
        }

        if self.defaulted_loans > self.previous_loans {
            return Err(ScoringInputError::DefaultsExceedHistory {
                previous: self.previous_loans,
                defaulted: self.defaulted_loans,
            });
        }

        Ok(())
    }
}
