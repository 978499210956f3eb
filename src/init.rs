//! Random weight initialisation.
//!
//! Anything `FnMut() -> f64` can initialise synapse weights;
//! [`UniformWeights`] is the provided initialiser: uniform over
//! `[min, max]`, quantised to a fixed number of steps.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{Error, Result};

/// Default quantisation granularity.
pub const DEFAULT_GRAN: u32 = 1_000_000;

#[derive(Debug, Clone)]
/// Uniform random weights over `[min, max]`, quantised to `gran` steps.
pub struct UniformWeights {
    min: f64,
    span: f64,
    gran: u32,
    steps: Uniform<u32>,
    rng: StdRng,
}

impl UniformWeights {
    fn build(min: f64, max: f64, gran: u32, rng: StdRng) -> Result<Self> {
        if min > max {
            return Err(Error::Config(format!(
                "weight range is reversed: min {min} > max {max}"
            )));
        }
        if gran == 0 {
            return Err(Error::Config("granularity must be > 0".to_owned()));
        }

        Ok(Self {
            min,
            span: max - min,
            gran,
            steps: Uniform::new_inclusive(0, gran),
            rng,
        })
    }

    /// Creates an OS-seeded initialiser with the default granularity.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        Self::build(min, max, DEFAULT_GRAN, StdRng::from_entropy())
    }

    /// Creates a deterministically seeded initialiser with the default
    /// granularity.
    pub fn seeded(min: f64, max: f64, seed: u64) -> Result<Self> {
        Self::build(min, max, DEFAULT_GRAN, StdRng::seed_from_u64(seed))
    }

    /// Creates an OS-seeded initialiser with an explicit granularity.
    pub fn with_gran(min: f64, max: f64, gran: u32) -> Result<Self> {
        Self::build(min, max, gran, StdRng::from_entropy())
    }

    /// Draws the next weight.
    pub fn sample(&mut self) -> f64 {
        let step = self.steps.sample(&mut self.rng);
        self.min + self.span * f64::from(step) / f64::from(self.gran)
    }
}
