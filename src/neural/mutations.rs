//! Genome mutations (NEAT-style).

use super::gene::NeuronId;
use super::genome::Genome;
use super::innovation::BreedingContext;
use super::{MAX_INPUTS, NUM_OUTPUTS, OUTPUT_BASE};
use crate::math::mutation_chance_from_fitness;
use rand::Rng;

/// Base probability of each mutation operator
#[derive(Clone, Debug)]
pub struct MutationConfig {
    /// Probability of running the weight perturbation pass
    pub weight_mutation_rate: f32,
    /// Probability of adding a new connection
    pub add_connection_rate: f32,
    /// Probability of splitting a connection with a new neuron
    pub add_neuron_rate: f32,
    /// Probability of disabling a random gene
    pub disable_rate: f32,
    /// Probability of enabling a random gene
    pub enable_rate: f32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            weight_mutation_rate: 1.0,
            add_connection_rate: 0.075,
            add_neuron_rate: 0.075,
            disable_rate: 0.02,
            enable_rate: 0.02,
        }
    }
}

impl Genome {
    /// Apply mutations for an agent that died with `fitness`.
    ///
    /// Without structural mutation only the weights change.
    pub fn mutate<R: Rng>(&mut self, fitness: f32, config: &MutationConfig, ctx: &mut BreedingContext, rng: &mut R) {
        if self.uses_structural_mutation() {
            if rng.gen::<f32>() < config.weight_mutation_rate {
                self.mutate_weights(fitness, rng);
            }
            if rng.gen::<f32>() < config.add_connection_rate {
                self.mutate_add_connection(ctx, rng);
            }
            if rng.gen::<f32>() < config.add_neuron_rate {
                self.mutate_add_neuron(ctx, rng);
            }
            if rng.gen::<f32>() < config.disable_rate {
                self.mutate_disable(rng);
            }
            if rng.gen::<f32>() < config.enable_rate {
                self.mutate_enable(rng);
            }
        } else {
            self.mutate_weights(fitness, rng);
        }

        // Physical traits
        let chance = mutation_chance_from_fitness(fitness);
        if chance > 0.0 && rng.gen::<f32>() < chance {
            let size = self.size_trait() + rng.gen_range(-2.0 * chance..2.0 * chance);
            self.set_size_trait(size);
        }
    }

    /// Perturb each weight with a fitness-dependent chance and magnitude
    pub fn mutate_weights<R: Rng>(&mut self, fitness: f32, rng: &mut R) {
        let chance = mutation_chance_from_fitness(fitness);
        if chance <= 0.0 {
            return;
        }
        for gene in self.genes_mut() {
            if rng.gen::<f32>() < chance {
                let delta = rng.gen_range(-2.0 * chance..2.0 * chance);
                gene.set_weight(gene.weight() + delta);
            }
        }
    }

    /// Link a random source to a random non-sensor target unless already linked
    pub fn mutate_add_connection<R: Rng>(&mut self, ctx: &mut BreedingContext, rng: &mut R) {
        let source = random_neuron_id(self, true, rng);
        let target = random_neuron_id(self, false, rng);
        if !self.has_gene(source, target) {
            let innovation = ctx.next_innovation();
            self.add_gene(innovation, source, target, rng.gen_range(-1.0..=1.0), false);
        }
    }

    /// Split a random enabled gene with a new hidden neuron
    pub fn mutate_add_neuron<R: Rng>(&mut self, ctx: &mut BreedingContext, rng: &mut R) {
        if self.is_empty() {
            return;
        }
        let index = rng.gen_range(0..self.len());
        let gene = *self.gene(index);
        if gene.is_disabled() {
            return;
        }
        self.gene_mut(index).disable();

        let neuron = self.allocate_neuron_id();
        let into = ctx.next_innovation();
        self.add_gene(into, gene.source(), neuron, rng.gen_range(-1.0..=1.0), false);
        let out = ctx.next_innovation();
        self.add_gene(out, neuron, gene.target(), gene.weight(), false);
    }

    pub fn mutate_disable<R: Rng>(&mut self, rng: &mut R) {
        if !self.is_empty() {
            let index = rng.gen_range(0..self.len());
            self.gene_mut(index).disable();
        }
    }

    pub fn mutate_enable<R: Rng>(&mut self, rng: &mut R) {
        if !self.is_empty() {
            let index = rng.gen_range(0..self.len());
            self.gene_mut(index).enable();
        }
    }
}

/// Random neuron id drawn in proportion to the sensor, hidden and output pools.
///
/// Sensors are only returned when `allow_sensor` is set; the output pool
/// absorbs every draw the other pools cannot take.
pub fn random_neuron_id<R: Rng>(genome: &Genome, allow_sensor: bool, rng: &mut R) -> NeuronId {
    let num_inputs = genome.num_inputs();
    let num_hidden = genome.hidden_neuron_count();
    let total = (num_inputs + num_hidden + NUM_OUTPUTS) as f32;

    let input_share = num_inputs as f32 / total;
    let output_share = NUM_OUTPUTS as f32 / total;
    let selection: f32 = rng.gen();

    if allow_sensor && selection < input_share {
        rng.gen_range(0..num_inputs) as NeuronId
    } else if num_hidden > 0 && selection >= input_share && selection < 1.0 - output_share {
        (MAX_INPUTS + rng.gen_range(0..num_hidden)) as NeuronId
    } else {
        OUTPUT_BASE + rng.gen_range(0..NUM_OUTPUTS) as NeuronId
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn seeded(structural: bool) -> (Genome, BreedingContext, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut ctx = BreedingContext::new();
        let genome = ctx.seed_genome(27, structural, true, 15.0, &mut rng);
        (genome, ctx, rng)
    }

    #[test]
    fn test_add_neuron_splits_gene() {
        let (mut genome, mut ctx, mut rng) = seeded(true);
        let before_len = genome.len();
        let before_next = genome.next_neuron_id();
        let before_disabled = genome.genes().iter().filter(|g| g.is_disabled()).count();

        genome.mutate_add_neuron(&mut ctx, &mut rng);

        assert_eq!(genome.next_neuron_id(), before_next + 1);
        assert_eq!(genome.len(), before_len + 2);
        let disabled = genome.genes().iter().filter(|g| g.is_disabled()).count();
        assert_eq!(disabled, before_disabled + 1);

        let split = *genome.genes().iter().find(|g| g.is_disabled()).unwrap();
        let new_genes = &genome.genes()[before_len..];
        assert!(new_genes.iter().all(|g| g.is_enabled()));
        assert!(new_genes[0].connects(split.source(), before_next));
        assert!(new_genes[1].connects(before_next, split.target()));
        assert_eq!(new_genes[1].weight(), split.weight());
    }

    #[test]
    fn test_add_neuron_skips_disabled_gene() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = BreedingContext::new();
        let mut genome = Genome::new(0, 11, true, true, 10.0);
        genome.add_gene(0, 0, OUTPUT_BASE, 0.5, true);

        genome.mutate_add_neuron(&mut ctx, &mut rng);
        assert_eq!(genome.len(), 1);
        assert_eq!(genome.next_neuron_id(), MAX_INPUTS as NeuronId);
    }

    #[test]
    fn test_operators_skip_empty_genome() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = BreedingContext::new();
        let mut genome = Genome::new(0, 11, true, true, 10.0);
        genome.mutate_add_neuron(&mut ctx, &mut rng);
        genome.mutate_disable(&mut rng);
        genome.mutate_enable(&mut rng);
        assert!(genome.is_empty());
    }

    #[test]
    fn test_add_connection_never_targets_sensor() {
        let (mut genome, mut ctx, mut rng) = seeded(true);
        for _ in 0..200 {
            genome.mutate_add_neuron(&mut ctx, &mut rng);
            genome.mutate_add_connection(&mut ctx, &mut rng);
        }
        for gene in genome.genes() {
            assert!(gene.target() >= MAX_INPUTS as NeuronId);
        }
    }

    #[test]
    fn test_add_connection_no_duplicate_pairs() {
        let (mut genome, mut ctx, mut rng) = seeded(true);
        for _ in 0..500 {
            genome.mutate_add_connection(&mut ctx, &mut rng);
        }
        let mut pairs: Vec<(u32, u32)> = genome.genes().iter().map(|g| (g.source(), g.target())).collect();
        let total = pairs.len();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), total);
    }

    #[test]
    fn test_random_neuron_id_ranges() {
        let (mut genome, mut ctx, mut rng) = seeded(true);
        for _ in 0..5 {
            genome.mutate_add_neuron(&mut ctx, &mut rng);
        }
        let hidden_end = genome.next_neuron_id();
        for _ in 0..1000 {
            let id = random_neuron_id(&genome, true, &mut rng);
            let sensor = (id as usize) < genome.num_inputs();
            let hidden = id >= MAX_INPUTS as NeuronId && id < hidden_end;
            let output = (OUTPUT_BASE..OUTPUT_BASE + NUM_OUTPUTS as NeuronId).contains(&id);
            assert!(sensor || hidden || output);

            let target = random_neuron_id(&genome, false, &mut rng);
            assert!(target as usize >= MAX_INPUTS);
        }
    }

    #[test]
    fn test_weights_only_without_structural() {
        let (mut genome, mut ctx, mut rng) = seeded(false);
        let len = genome.len();
        let original: Vec<f32> = genome.genes().iter().map(|g| g.weight()).collect();
        for _ in 0..50 {
            genome.mutate(0.0, &MutationConfig::default(), &mut ctx, &mut rng);
        }
        assert_eq!(genome.len(), len);
        assert!(genome.genes().iter().all(|g| g.is_enabled()));
        let changed = genome.genes().iter().zip(&original).any(|(g, w)| g.weight() != *w);
        assert!(changed);
    }

    #[test]
    fn test_high_fitness_barely_mutates() {
        let (mut genome, _, mut rng) = seeded(false);
        let original: Vec<f32> = genome.genes().iter().map(|g| g.weight()).collect();
        genome.mutate_weights(50.0, &mut rng);
        let current: Vec<f32> = genome.genes().iter().map(|g| g.weight()).collect();
        assert_eq!(current, original);
    }

    fn size_steps(fitness: f32, rounds: usize) -> Vec<f32> {
        let (mut genome, mut ctx, mut rng) = seeded(false);
        let config = MutationConfig::default();
        let mut steps = Vec::new();
        for _ in 0..rounds {
            let before = genome.size_trait();
            genome.mutate(fitness, &config, &mut ctx, &mut rng);
            let step = genome.size_trait() - before;
            if step != 0.0 {
                steps.push(step);
            }
        }
        steps
    }

    #[test]
    fn test_size_trait_step_bounded_by_chance() {
        let unfit = mutation_chance_from_fitness(0.0);
        let steps = size_steps(0.0, 400);
        // about 30 changes expected at p = 0.075
        assert!(steps.len() > 10 && steps.len() < 60, "{} size changes", steps.len());
        assert!(steps.iter().all(|s| s.abs() <= 2.0 * unfit + 1e-5));
        assert!(steps.iter().any(|s| *s > 0.0) && steps.iter().any(|s| *s < 0.0));

        let fit = mutation_chance_from_fitness(0.5);
        let steps = size_steps(0.5, 2000);
        assert!(!steps.is_empty());
        assert!(steps.iter().all(|s| s.abs() <= 2.0 * fit + 1e-5));
    }
}
