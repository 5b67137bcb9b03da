//! Genetic crossover aligned by innovation number.

use super::genome::Genome;
use super::innovation::BreedingContext;
use rand::Rng;

impl Genome {
    /// Breed `self` (the fitter parent) with `other`.
    ///
    /// Matching genes come from either parent at random. Disjoint and excess
    /// genes of `self` are always kept; those of `other` only when
    /// `fitness_equal` is set.
    pub fn crossover<R: Rng>(&self, other: &Genome, fitness_equal: bool, ctx: &mut BreedingContext, rng: &mut R) -> Genome {
        let mut child = Genome::new(
            ctx.next_genome_id(),
            self.num_inputs(),
            self.uses_structural_mutation(),
            self.is_prey(),
            self.size_trait(),
        );

        let mine = self.genes();
        let theirs = other.genes();
        let (mut i, mut j) = (0, 0);

        while i < mine.len() && j < theirs.len() {
            let (a, b) = (mine[i], theirs[j]);
            if a.innovation() == b.innovation() {
                child.push_gene_unchecked(if rng.gen_bool(0.5) { a } else { b });
                i += 1;
                j += 1;
            } else if a.innovation() < b.innovation() {
                child.push_gene_unchecked(a);
                i += 1;
            } else {
                if fitness_equal {
                    child.push_gene_unchecked(b);
                }
                j += 1;
            }
        }

        for &gene in &mine[i..] {
            child.push_gene_unchecked(gene);
        }
        if fitness_equal {
            for &gene in &theirs[j..] {
                child.push_gene_unchecked(gene);
            }
        }

        if rng.gen_bool(0.5) {
            child.set_size_trait(other.size_trait());
        }
        child.raise_next_neuron_id(self.next_neuron_id().max(other.next_neuron_id()));
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::OUTPUT_BASE;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn genome_with(ctx: &mut BreedingContext, innovations: &[u32], weight: f32) -> Genome {
        let mut genome = Genome::new(ctx.next_genome_id(), 27, true, true, 15.0);
        for &innovation in innovations {
            genome.add_gene(innovation, innovation % 27, OUTPUT_BASE, weight, false);
        }
        genome
    }

    fn innovations(genome: &Genome) -> Vec<u32> {
        genome.genes().iter().map(|g| g.innovation()).collect()
    }

    #[test]
    fn test_crossover_unequal_keeps_dominant_tail() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ctx = BreedingContext::new();
        let a = genome_with(&mut ctx, &[1, 2, 3, 100, 101], 1.0);
        let b = genome_with(&mut ctx, &[1, 2, 3, 200, 201, 202], -1.0);

        let child = a.crossover(&b, false, &mut ctx, &mut rng);
        assert_eq!(innovations(&child), vec![1, 2, 3, 100, 101]);
    }

    #[test]
    fn test_crossover_equal_keeps_both_tails() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ctx = BreedingContext::new();
        let a = genome_with(&mut ctx, &[1, 2, 3, 100, 101], 1.0);
        let b = genome_with(&mut ctx, &[1, 2, 3, 200, 201, 202], -1.0);

        let child = a.crossover(&b, true, &mut ctx, &mut rng);
        assert_eq!(innovations(&child), vec![1, 2, 3, 100, 101, 200, 201, 202]);
    }

    #[test]
    fn test_matching_genes_counted_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut ctx = BreedingContext::new();
        let a = genome_with(&mut ctx, &[0, 4, 5, 9, 12, 30], 1.0);
        let b = genome_with(&mut ctx, &[0, 2, 5, 12, 13], -1.0);
        let shared: HashSet<u32> = [0, 5, 12].into_iter().collect();

        for equal in [false, true] {
            let child = a.crossover(&b, equal, &mut ctx, &mut rng);
            let matched = innovations(&child).iter().filter(|i| shared.contains(i)).count();
            assert_eq!(matched, shared.len());
            assert!(child.len() <= a.len() + b.len());
            // child stays ordered for the next crossover
            assert!(innovations(&child).windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_matching_genes_come_from_either_parent() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut ctx = BreedingContext::new();
        let a = genome_with(&mut ctx, &(0..64).collect::<Vec<_>>(), 1.0);
        let b = genome_with(&mut ctx, &(0..64).collect::<Vec<_>>(), -1.0);

        let child = a.crossover(&b, false, &mut ctx, &mut rng);
        let from_a = child.genes().iter().filter(|g| g.weight() > 0.0).count();
        assert!(from_a > 0 && from_a < 64);
    }

    #[test]
    fn test_child_takes_max_next_neuron_and_fresh_id() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut ctx = BreedingContext::new();
        let mut a = genome_with(&mut ctx, &[1], 1.0);
        let mut b = genome_with(&mut ctx, &[1], 1.0);
        a.add_gene(90, 0, 30, 0.5, false);
        b.add_gene(91, 0, 40, 0.5, false);

        let child = a.crossover(&b, false, &mut ctx, &mut rng);
        assert_eq!(child.next_neuron_id(), 41);
        assert_ne!(child.id(), a.id());
        assert_ne!(child.id(), b.id());
    }
}
