//! Generic genetic-algorithm building blocks shared across the Skein workspace.
//!
//! The crate is organised around a flat-float [`Chromosome`] plus pluggable
//! [`SelectionMethod`], [`CrossoverMethod`], and [`MutationMethod`] strategies
//! that the [`GeneticAlgorithm`] driver composes over any [`Individual`].

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod crossover;
pub mod mutation;
pub mod selection;
pub mod statistics;

pub use crossover::{CrossoverMethod, SinglePointCrossover, UniformCrossover};
pub use mutation::{GaussianMutation, MutationMethod, RandomResetMutation};
pub use selection::{RouletteWheelSelection, SelectionMethod, TournamentSelection};
pub use statistics::Statistics;

/// Absolute tolerance used when comparing chromosomes gene by gene.
///
/// Independently evolved implementations accumulate float noise; two
/// chromosomes whose genes differ by less than this are considered equal.
pub const GENE_EPSILON: f32 = 1e-7;

/// Errors raised by genetic operators.
///
/// Every variant is an invalid-argument condition detected synchronously at
/// the boundary of the offending operation. Callers must fix their inputs;
/// retrying with the same arguments will fail identically.
#[derive(Debug, Error, PartialEq)]
pub enum GeneticError {
    #[error("population must not be empty")]
    EmptyPopulation,
    #[error("chromosome lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("probability {value} must lie within [0, 1]")]
    ProbabilityOutOfRange { value: f32 },
    #[error("minimum {min} must not exceed maximum {max}")]
    InvertedRange { min: f32, max: f32 },
    #[error("tournament size must be at least 1")]
    TournamentTooSmall,
}

/// Fixed-length vector of float genes.
///
/// Immutable except for [`Chromosome::mutate`], the one sanctioned in-place
/// operation, which borrows the genes mutably for the duration of the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chromosome {
    genes: Vec<f32>,
}

impl Chromosome {
    /// Wraps the provided genes.
    #[must_use]
    pub fn new(genes: Vec<f32>) -> Self {
        Self { genes }
    }

    /// Number of genes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns true when the chromosome carries no genes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Read-only view of the genes.
    #[must_use]
    pub fn genes(&self) -> &[f32] {
        &self.genes
    }

    /// Consumes the chromosome, yielding its genes.
    #[must_use]
    pub fn into_genes(self) -> Vec<f32> {
        self.genes
    }

    /// Applies `method` to the genes in place and returns the chromosome for
    /// chaining. This is the only way to alter an existing chromosome.
    pub fn mutate(&mut self, method: &dyn MutationMethod, rng: &mut dyn RngCore) -> &mut Self {
        method.mutate(rng, &mut self.genes);
        self
    }

    /// Iterates over gene values.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.genes.iter().copied()
    }
}

impl PartialEq for Chromosome {
    fn eq(&self, other: &Self) -> bool {
        self.genes.len() == other.genes.len()
            && self
                .genes
                .iter()
                .zip(&other.genes)
                .all(|(a, b)| (a - b).abs() <= GENE_EPSILON)
    }
}

impl From<Vec<f32>> for Chromosome {
    fn from(genes: Vec<f32>) -> Self {
        Self::new(genes)
    }
}

impl FromIterator<f32> for Chromosome {
    fn from_iter<T: IntoIterator<Item = f32>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl std::ops::Index<usize> for Chromosome {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.genes[index]
    }
}

/// A chromosome paired with a fitness value.
///
/// Fitness is read-only from the algorithm's point of view: selection,
/// crossover, mutation, and statistics never alter it.
pub trait Individual {
    /// Evolvable parameters of this individual.
    fn chromosome(&self) -> &Chromosome;

    /// Scalar fitness; higher is better.
    fn fitness(&self) -> f32;
}

/// Builds a fresh individual from an evolved chromosome.
pub type IndividualFactory<I> = Box<dyn Fn(Chromosome) -> I + Send + Sync>;

/// One-generation evolution driver.
///
/// Strategies are chosen once at construction time; the strategy set is
/// closed, so trait objects are sufficient and no runtime discovery happens.
pub struct GeneticAlgorithm<I> {
    selection: Box<dyn SelectionMethod>,
    crossover: Box<dyn CrossoverMethod>,
    mutation: Box<dyn MutationMethod>,
    factory: IndividualFactory<I>,
}

impl<I> std::fmt::Debug for GeneticAlgorithm<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneticAlgorithm").finish_non_exhaustive()
    }
}

impl<I: Individual> GeneticAlgorithm<I> {
    /// Assembles a driver from its strategy parts.
    #[must_use]
    pub fn new(
        selection: Box<dyn SelectionMethod>,
        crossover: Box<dyn CrossoverMethod>,
        mutation: Box<dyn MutationMethod>,
        factory: IndividualFactory<I>,
    ) -> Self {
        Self {
            selection,
            crossover,
            mutation,
            factory,
        }
    }

    /// Runs one generation step.
    ///
    /// For each of the `population.len()` output slots, two parents are
    /// selected independently (self-pairing is allowed), crossed over, and
    /// mutated; the caller-supplied factory materialises the child. The
    /// returned statistics describe the *input* population. The input is
    /// never mutated; the only side effect is consuming the random stream.
    pub fn evolve(
        &self,
        rng: &mut dyn RngCore,
        population: &[I],
    ) -> Result<(Vec<I>, Statistics), GeneticError> {
        if population.is_empty() {
            return Err(GeneticError::EmptyPopulation);
        }

        let fitnesses: Vec<f32> = population.iter().map(Individual::fitness).collect();
        let statistics = Statistics::from_fitnesses(&fitnesses)?;

        let mut next = Vec::with_capacity(population.len());
        for _ in 0..population.len() {
            let parent_a = &population[self.selection.select(rng, &fitnesses)?];
            let parent_b = &population[self.selection.select(rng, &fitnesses)?];

            let mut child =
                self.crossover
                    .crossover(rng, parent_a.chromosome(), parent_b.chromosome())?;
            child.mutate(self.mutation.as_ref(), rng);

            next.push((self.factory)(child));
        }

        Ok((next, statistics))
    }
}
