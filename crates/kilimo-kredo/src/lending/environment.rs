use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use super::domain::{EnvironmentalSnapshot, GeoLocation};

/// Weather and remote-sensing lookup for a farm location.
pub trait EnvironmentalDataProvider: Send + Sync {
    fn fetch(&self, location: &GeoLocation) -> Result<EnvironmentalSnapshot, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("environmental data provider unavailable: {0}")]
    Unavailable(String),
    #[error("environmental data provider returned invalid data: {0}")]
    InvalidData(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Unavailable(_))
    }
}

/// Stand-in for a real weather service. Readings fall in the ranges a healthy
/// East African smallholding would report.
pub struct SyntheticEnvironmentProvider {
    rng: Mutex<StdRng>,
}

impl SyntheticEnvironmentProvider {
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

impl EnvironmentalDataProvider for SyntheticEnvironmentProvider {
    fn fetch(&self, _location: &GeoLocation) -> Result<EnvironmentalSnapshot, ProviderError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ProviderError::Unavailable("random source poisoned".to_string()))?;

        Ok(EnvironmentalSnapshot {
            vegetation_index: round_to(rng.gen_range(0.6..0.9), 3),
            rainfall_mm: round_to(rng.gen_range(800.0..1000.0), 2),
            temperature_c: round_to(rng.gen_range(20.0..30.0), 2),
        })
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn no_backoff(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// Wraps a provider and retries transient failures. Invalid data is returned immediately.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P> RetryingProvider<P>
where
    P: EnvironmentalDataProvider,
{
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P> EnvironmentalDataProvider for RetryingProvider<P>
where
    P: EnvironmentalDataProvider,
{
    fn fetch(&self, location: &GeoLocation) -> Result<EnvironmentalSnapshot, ProviderError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.inner.fetch(location) {
                Ok(snapshot) => return Ok(snapshot),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        "retrying environmental lookup"
                    );
                    if !backoff.is_zero() {
                        thread::sleep(backoff);
                    }
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
