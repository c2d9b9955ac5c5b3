use std::ops::RangeInclusive;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const CONFIDENCE_RANGE: RangeInclusive<f64> = 0.90..=1.00;

/// Source of the display-only confidence figure attached to each assessment.
pub trait ConfidenceSource: Send + Sync {
    fn draw(&self) -> f64;
}

/// Uniform draw over [`CONFIDENCE_RANGE`].
pub struct RandomConfidence {
    rng: Mutex<StdRng>,
}

impl RandomConfidence {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ConfidenceSource for RandomConfidence {
    fn draw(&self) -> f64 {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(CONFIDENCE_RANGE)
    }
}

/// Constant confidence for tests and reproducible demos.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfidence(pub f64);

impl ConfidenceSource for FixedConfidence {
    fn draw(&self) -> f64 {
        self.0.clamp(*CONFIDENCE_RANGE.start(), *CONFIDENCE_RANGE.end())
    }
}
