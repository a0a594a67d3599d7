//! Crossover strategies combining two parent chromosomes into a child.

use rand::{Rng, RngCore};

use crate::{Chromosome, GeneticError};

/// Combines two equal-length parents into a child chromosome.
pub trait CrossoverMethod: Send + Sync {
    /// Produces a child; fails when the parents' lengths differ.
    fn crossover(
        &self,
        rng: &mut dyn RngCore,
        parent_a: &Chromosome,
        parent_b: &Chromosome,
    ) -> Result<Chromosome, GeneticError>;
}

fn check_lengths(parent_a: &Chromosome, parent_b: &Chromosome) -> Result<(), GeneticError> {
    if parent_a.len() != parent_b.len() {
        return Err(GeneticError::LengthMismatch {
            left: parent_a.len(),
            right: parent_b.len(),
        });
    }
    Ok(())
}

/// Cuts both parents at one uniformly chosen point in `[1, len - 1]`.
///
/// The child's first gene therefore always comes from parent A and its last
/// gene from parent B whenever the parents carry at least two genes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePointCrossover;

impl CrossoverMethod for SinglePointCrossover {
    fn crossover(
        &self,
        rng: &mut dyn RngCore,
        parent_a: &Chromosome,
        parent_b: &Chromosome,
    ) -> Result<Chromosome, GeneticError> {
        check_lengths(parent_a, parent_b)?;

        let len = parent_a.len();
        if len < 2 {
            // No interior cut point exists; the child mirrors parent A.
            return Ok(parent_a.clone());
        }

        let cut = rng.random_range(1..len);
        let genes = parent_a
            .genes()
            .iter()
            .take(cut)
            .chain(parent_b.genes().iter().skip(cut))
            .copied()
            .collect();
        Ok(genes)
    }
}

/// Takes each gene independently from either parent with equal probability.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformCrossover;

impl CrossoverMethod for UniformCrossover {
    fn crossover(
        &self,
        rng: &mut dyn RngCore,
        parent_a: &Chromosome,
        parent_b: &Chromosome,
    ) -> Result<Chromosome, GeneticError> {
        check_lengths(parent_a, parent_b)?;

        let genes = parent_a
            .genes()
            .iter()
            .zip(parent_b.genes())
            .map(|(&a, &b)| if rng.random::<bool>() { a } else { b })
            .collect();
        Ok(genes)
    }
}
