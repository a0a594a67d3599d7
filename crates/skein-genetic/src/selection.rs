//! Selection strategies picking one individual from a population by fitness.

use ordered_float::OrderedFloat;
use rand::{Rng, RngCore};

use crate::GeneticError;

/// Picks the index of one individual from a fitness slice.
///
/// Operating on raw fitnesses keeps the trait object-safe and independent of
/// the concrete individual type; the driver resolves indices back to
/// individuals. Population order carries no meaning for any implementation.
pub trait SelectionMethod: Send + Sync {
    /// Selects one index into `fitnesses`.
    fn select(&self, rng: &mut dyn RngCore, fitnesses: &[f32]) -> Result<usize, GeneticError>;
}

/// Fitness-proportionate selection over a cumulative-weight table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouletteWheelSelection;

impl RouletteWheelSelection {
    /// Floor applied to each fitness so degenerate zero or negative fitness
    /// populations still yield a positive total weight.
    pub const MINIMUM_FITNESS: f32 = 1e-5;
}

impl SelectionMethod for RouletteWheelSelection {
    fn select(&self, rng: &mut dyn RngCore, fitnesses: &[f32]) -> Result<usize, GeneticError> {
        if fitnesses.is_empty() {
            return Err(GeneticError::EmptyPopulation);
        }

        let mut cumulative = Vec::with_capacity(fitnesses.len());
        let mut total = 0.0f32;
        for &fitness in fitnesses {
            total += fitness.max(Self::MINIMUM_FITNESS);
            cumulative.push(total);
        }

        let r = rng.random::<f32>() * total;

        // Smallest prefix sum >= r.
        let index = cumulative.partition_point(|&weight| weight < r);
        Ok(index.min(fitnesses.len() - 1))
    }
}

/// K-way tournament: draw `size` contenders uniformly with replacement and
/// return the fittest.
#[derive(Debug, Clone, Copy)]
pub struct TournamentSelection {
    size: usize,
}

impl TournamentSelection {
    /// Creates a tournament of the given size; fails for `size == 0`.
    pub fn new(size: usize) -> Result<Self, GeneticError> {
        if size == 0 {
            return Err(GeneticError::TournamentTooSmall);
        }
        Ok(Self { size })
    }

    /// Configured tournament size before clamping to the population.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }
}

impl SelectionMethod for TournamentSelection {
    fn select(&self, rng: &mut dyn RngCore, fitnesses: &[f32]) -> Result<usize, GeneticError> {
        if fitnesses.is_empty() {
            return Err(GeneticError::EmptyPopulation);
        }

        let rounds = self.size.min(fitnesses.len());
        let winner = (0..rounds)
            .map(|_| rng.random_range(0..fitnesses.len()))
            .max_by_key(|&index| OrderedFloat(fitnesses[index]))
            .unwrap_or(0);
        Ok(winner)
    }
}
