//! Mutation strategies perturbing genes in place with a per-gene probability.
//!
//! Parameters are validated when a strategy is constructed, never at mutate
//! time, so a driver holding a strategy can assume it is well formed.

use rand::{Rng, RngCore};

use crate::GeneticError;

fn check_probability(value: f32) -> Result<(), GeneticError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(GeneticError::ProbabilityOutOfRange { value });
    }
    Ok(())
}

/// Perturbs genes in place.
pub trait MutationMethod: Send + Sync {
    /// Mutates `genes`, consulting `rng` once per gene at minimum.
    fn mutate(&self, rng: &mut dyn RngCore, genes: &mut [f32]);
}

/// Adds `±coeff · U(0, 1)` to each gene with probability `chance`.
#[derive(Debug, Clone, Copy)]
pub struct GaussianMutation {
    chance: f32,
    coeff: f32,
}

impl GaussianMutation {
    /// Creates the strategy; fails fast when `chance` is outside `[0, 1]`.
    pub fn new(chance: f32, coeff: f32) -> Result<Self, GeneticError> {
        check_probability(chance)?;
        Ok(Self { chance, coeff })
    }

    /// Per-gene mutation probability.
    #[must_use]
    pub const fn chance(&self) -> f32 {
        self.chance
    }

    /// Magnitude bound of a single perturbation.
    #[must_use]
    pub const fn coeff(&self) -> f32 {
        self.coeff
    }
}

impl MutationMethod for GaussianMutation {
    fn mutate(&self, rng: &mut dyn RngCore, genes: &mut [f32]) {
        for gene in genes {
            if rng.random::<f64>() < f64::from(self.chance) {
                let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
                *gene += sign * self.coeff * rng.random::<f32>();
            }
        }
    }
}

/// Replaces each gene with a uniform draw from `[min, max]` with the given
/// probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomResetMutation {
    probability: f32,
    min: f32,
    max: f32,
}

impl RandomResetMutation {
    /// Creates the strategy; fails fast for out-of-range probability or
    /// `min > max`.
    pub fn new(probability: f32, min: f32, max: f32) -> Result<Self, GeneticError> {
        check_probability(probability)?;
        if min > max {
            return Err(GeneticError::InvertedRange { min, max });
        }
        Ok(Self {
            probability,
            min,
            max,
        })
    }
}

impl MutationMethod for RandomResetMutation {
    fn mutate(&self, rng: &mut dyn RngCore, genes: &mut [f32]) {
        let range = self.max - self.min;
        for gene in genes {
            if rng.random::<f64>() < f64::from(self.probability) {
                *gene = self.min + rng.random::<f32>() * range;
            }
        }
    }
}
