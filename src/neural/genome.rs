//! Genome: the ordered gene list and physical traits of one agent.

use super::gene::{Gene, NeuronId};
use super::innovation::BreedingContext;
use super::{MAX_INPUTS, MIN_INPUTS, OUTPUT_BASE};
use crate::persistence::GenomeRecord;
use serde::{Deserialize, Serialize};

/// Genetic encoding of an agent's brain and body
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Genome {
    id: u32,
    num_inputs: usize,
    /// Smallest hidden neuron id not yet in use
    next_neuron_id: NeuronId,
    uses_structural_mutation: bool,
    is_prey: bool,
    size_trait: f32,
    /// Non-decreasing in innovation number
    genes: Vec<Gene>,
}

impl Genome {
    /// Create an empty genome.
    ///
    /// # Panics
    /// If `num_inputs` is outside `MIN_INPUTS..=MAX_INPUTS`.
    pub fn new(id: u32, num_inputs: usize, uses_structural_mutation: bool, is_prey: bool, size_trait: f32) -> Self {
        assert!(
            (MIN_INPUTS..=MAX_INPUTS).contains(&num_inputs),
            "unsupported input count {num_inputs}"
        );
        Self {
            id,
            num_inputs,
            next_neuron_id: MAX_INPUTS as NeuronId,
            uses_structural_mutation,
            is_prey,
            size_trait,
            genes: Vec::new(),
        }
    }

    /// Rebuild a genome from its persisted form
    pub fn from_record(record: &GenomeRecord, num_inputs: usize) -> Self {
        let mut genome = Self::new(
            record.id,
            num_inputs,
            record.uses_structural_mutation,
            record.is_prey,
            record.size_trait,
        );
        for gene in &record.genes {
            genome.add_gene(gene.innovation(), gene.source(), gene.target(), gene.weight(), gene.is_disabled());
        }
        genome
    }

    /// Persistable snapshot of this genome
    pub fn to_record(&self) -> GenomeRecord {
        GenomeRecord {
            id: self.id,
            uses_structural_mutation: self.uses_structural_mutation,
            is_prey: self.is_prey,
            size_trait: self.size_trait,
            genes: self.genes.clone(),
        }
    }

    /// Copy of this genome under a freshly allocated id
    pub fn duplicate(&self, ctx: &mut BreedingContext) -> Self {
        Self {
            id: ctx.next_genome_id(),
            ..self.clone()
        }
    }

    /// Append a gene, keeping genes ordered by innovation.
    ///
    /// Hidden endpoints beyond `next_neuron_id` advance it.
    pub fn add_gene(&mut self, innovation: u32, source: NeuronId, target: NeuronId, weight: f32, disabled: bool) {
        let gene = Gene::new(innovation, source, target, weight, disabled);
        match self.genes.last() {
            Some(last) if last.innovation() > innovation => {
                let at = self.genes.partition_point(|g| g.innovation() <= innovation);
                self.genes.insert(at, gene);
            }
            _ => self.genes.push(gene),
        }
        for id in [source, target] {
            if is_hidden_id(id) && id >= self.next_neuron_id {
                self.next_neuron_id = id + 1;
            }
        }
    }

    /// True if any gene (enabled or not) links `source` to `target`
    pub fn has_gene(&self, source: NeuronId, target: NeuronId) -> bool {
        self.genes.iter().any(|g| g.connects(source, target))
    }

    /// Gene at `index`.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn gene(&self, index: usize) -> &Gene {
        assert!(index < self.genes.len(), "gene index {index} out of bounds");
        &self.genes[index]
    }

    pub(crate) fn gene_mut(&mut self, index: usize) -> &mut Gene {
        assert!(index < self.genes.len(), "gene index {index} out of bounds");
        &mut self.genes[index]
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub(crate) fn genes_mut(&mut self) -> &mut [Gene] {
        &mut self.genes
    }

    pub fn clear(&mut self) {
        self.genes.clear();
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Number of hidden neuron ids allocated so far
    pub fn hidden_neuron_count(&self) -> usize {
        (self.next_neuron_id as usize).saturating_sub(MAX_INPUTS)
    }

    pub fn enabled_gene_count(&self) -> usize {
        self.genes.iter().filter(|g| g.is_enabled()).count()
    }

    /// Highest innovation number carried, if any
    pub fn max_innovation(&self) -> Option<u32> {
        self.genes.last().map(|g| g.innovation())
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn next_neuron_id(&self) -> NeuronId {
        self.next_neuron_id
    }

    pub(crate) fn allocate_neuron_id(&mut self) -> NeuronId {
        let id = self.next_neuron_id;
        self.next_neuron_id += 1;
        id
    }

    pub(crate) fn raise_next_neuron_id(&mut self, id: NeuronId) {
        self.next_neuron_id = self.next_neuron_id.max(id);
    }

    pub fn uses_structural_mutation(&self) -> bool {
        self.uses_structural_mutation
    }

    pub fn is_prey(&self) -> bool {
        self.is_prey
    }

    pub fn size_trait(&self) -> f32 {
        self.size_trait
    }

    pub fn set_size_trait(&mut self, size: f32) {
        self.size_trait = size;
    }

    pub(crate) fn push_gene_unchecked(&mut self, gene: Gene) {
        self.genes.push(gene);
    }
}

/// True for ids in the hidden neuron range
pub(crate) fn is_hidden_id(id: NeuronId) -> bool {
    id >= MAX_INPUTS as NeuronId && id < OUTPUT_BASE
}
