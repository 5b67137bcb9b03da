//! Run-wide counters for innovation numbers and genome ids.

use super::genome::Genome;
use super::{MAX_INPUTS, NUM_OUTPUTS, OUTPUT_BASE};
use rand::Rng;

/// Innovations reserved for the sensor-to-output genes of seeded genomes
pub const RESERVED_INNOVATIONS: u32 = (MAX_INPUTS * NUM_OUTPUTS) as u32;

/// Owns the global counters every genome construction and mutation draws from
#[derive(Clone, Debug)]
pub struct BreedingContext {
    next_innovation: u32,
    next_genome_id: u32,
}

impl Default for BreedingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BreedingContext {
    pub fn new() -> Self {
        Self {
            next_innovation: RESERVED_INNOVATIONS,
            next_genome_id: 0,
        }
    }

    /// Context whose counters start past everything seen in `genomes`
    pub fn from_genomes<'a, I>(genomes: I) -> Self
    where
        I: IntoIterator<Item = &'a Genome>,
    {
        let mut ctx = Self::new();
        for genome in genomes {
            ctx.observe(genome);
        }
        ctx
    }

    /// Advance the counters past the ids used by `genome`
    pub fn observe(&mut self, genome: &Genome) {
        if let Some(innovation) = genome.max_innovation() {
            self.next_innovation = self.next_innovation.max(innovation + 1);
        }
        self.next_genome_id = self.next_genome_id.max(genome.id() + 1);
    }

    pub fn next_innovation(&mut self) -> u32 {
        let innovation = self.next_innovation;
        self.next_innovation += 1;
        innovation
    }

    pub fn next_genome_id(&mut self) -> u32 {
        let id = self.next_genome_id;
        self.next_genome_id += 1;
        id
    }

    pub fn peek_innovation(&self) -> u32 {
        self.next_innovation
    }

    pub fn peek_genome_id(&self) -> u32 {
        self.next_genome_id
    }

    /// Fresh genome with every sensor wired to every output.
    ///
    /// Sensor `i` to output `o` always carries innovation `i * NUM_OUTPUTS + o`,
    /// so seeded genomes of any species align during crossover.
    pub fn seed_genome<R: Rng>(
        &mut self,
        num_inputs: usize,
        uses_structural_mutation: bool,
        is_prey: bool,
        size_trait: f32,
        rng: &mut R,
    ) -> Genome {
        let mut genome = Genome::new(self.next_genome_id(), num_inputs, uses_structural_mutation, is_prey, size_trait);
        for input in 0..num_inputs {
            for output in 0..NUM_OUTPUTS {
                genome.add_gene(
                    (input * NUM_OUTPUTS + output) as u32,
                    input as u32,
                    OUTPUT_BASE + output as u32,
                    rng.gen_range(-1.0..=1.0),
                    false,
                );
            }
        }
        genome
    }
}
