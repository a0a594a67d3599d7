//! Fitness statistics over a population.

use serde::{Deserialize, Serialize};

use crate::{GeneticError, Individual};

/// Immutable fitness summary of one population.
///
/// Values are computed once and the snapshot is independently serializable,
/// so batch harnesses can ship it across threads without sharing state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    min_fitness: f32,
    max_fitness: f32,
    avg_fitness: f32,
    median_fitness: f32,
}

impl Statistics {
    /// Summarises a population; fails when it is empty.
    pub fn from_population<I: Individual>(population: &[I]) -> Result<Self, GeneticError> {
        let fitnesses: Vec<f32> = population.iter().map(Individual::fitness).collect();
        Self::from_fitnesses(&fitnesses)
    }

    /// Summarises raw fitness values; fails when the slice is empty.
    pub fn from_fitnesses(fitnesses: &[f32]) -> Result<Self, GeneticError> {
        if fitnesses.is_empty() {
            return Err(GeneticError::EmptyPopulation);
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f32;
        for &fitness in fitnesses {
            min = min.min(fitness);
            max = max.max(fitness);
            sum += fitness;
        }

        let mut sorted = fitnesses.to_vec();
        sorted.sort_by(f32::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Ok(Self {
            min_fitness: min,
            max_fitness: max,
            avg_fitness: sum / fitnesses.len() as f32,
            median_fitness: median,
        })
    }

    /// Lowest fitness in the population.
    #[must_use]
    pub const fn min_fitness(&self) -> f32 {
        self.min_fitness
    }

    /// Highest fitness in the population.
    #[must_use]
    pub const fn max_fitness(&self) -> f32 {
        self.max_fitness
    }

    /// Arithmetic mean fitness.
    #[must_use]
    pub const fn avg_fitness(&self) -> f32 {
        self.avg_fitness
    }

    /// Median fitness from a sorted copy; even-sized populations average the
    /// two middle values.
    #[must_use]
    pub const fn median_fitness(&self) -> f32 {
        self.median_fitness
    }
}
