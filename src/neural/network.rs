//! Phenotype network built from a genome and evaluated once per tick.

use super::gene::NeuronId;
use super::genome::Genome;
use super::{MAX_INPUTS, NUM_OUTPUTS, OUTPUT_BASE};
use crate::math::neuron_sigmoid;
use glam::Vec2;
use std::collections::{BTreeMap, BTreeSet};

const SENSOR_ORIGIN: Vec2 = Vec2::new(15.0, 15.0);
const HIDDEN_ORIGIN: Vec2 = Vec2::new(750.0, 240.0);
const OUTPUT_ORIGIN: Vec2 = Vec2::new(1000.0, 420.0);
const NEURON_SPACING: f32 = 30.0;

/// Role of a neuron in the network
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeuronKind {
    Sensor,
    Hidden,
    Output,
}

/// Weighted edge read by a neuron; `source` indexes the network's neuron table
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Synapse {
    pub source: usize,
    pub weight: f32,
}

#[derive(Clone, Debug)]
pub struct Neuron {
    id: NeuronId,
    kind: NeuronKind,
    value: f32,
    /// Layout hint for drawing the network
    position: Vec2,
    inputs: Vec<Synapse>,
}

impl Neuron {
    fn new(id: NeuronId, kind: NeuronKind) -> Self {
        let position = match kind {
            NeuronKind::Sensor => SENSOR_ORIGIN + Vec2::new(0.0, id as f32 * NEURON_SPACING),
            NeuronKind::Hidden => HIDDEN_ORIGIN,
            NeuronKind::Output => OUTPUT_ORIGIN + Vec2::new(0.0, (id - OUTPUT_BASE) as f32 * NEURON_SPACING),
        };
        Self {
            id,
            kind,
            value: 0.0,
            position,
            inputs: Vec::new(),
        }
    }

    /// Register `source` as an input, overwriting any existing edge from it
    fn connect(&mut self, source: usize, weight: f32) {
        match self.inputs.iter_mut().find(|s| s.source == source) {
            Some(synapse) => synapse.weight = weight,
            None => self.inputs.push(Synapse { source, weight }),
        }
    }

    /// Pull a hidden neuron's layout position towards a connected neuron
    fn relax_towards(&mut self, other: Vec2) {
        if self.kind != NeuronKind::Hidden {
            return;
        }
        self.position = self.position * 0.7 + other * 0.3;
        if self.position.x >= other.x {
            self.position.x -= NEURON_SPACING;
        }
        let min_x = SENSOR_ORIGIN.x + NEURON_SPACING * 2.0;
        let max_x = OUTPUT_ORIGIN.x - NEURON_SPACING;
        self.position.x = self.position.x.clamp(min_x, max_x);
    }

    pub fn id(&self) -> NeuronId {
        self.id
    }

    pub fn kind(&self) -> NeuronKind {
        self.kind
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn inputs(&self) -> &[Synapse] {
        &self.inputs
    }
}

/// Sparse neural network evaluated in ascending neuron-id order
#[derive(Clone, Debug)]
pub struct NeuralNetwork {
    num_inputs: usize,
    /// Dense neuron table sorted by id
    neurons: Vec<Neuron>,
    index: BTreeMap<NeuronId, usize>,
}

impl NeuralNetwork {
    pub fn new(num_inputs: usize) -> Self {
        assert!(num_inputs <= MAX_INPUTS, "unsupported input count {num_inputs}");
        Self {
            num_inputs,
            neurons: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Discard the current phenotype and rebuild it from `genome`.
    ///
    /// Sensors and outputs always exist; hidden neurons only when an
    /// enabled gene references them.
    pub fn build(&mut self, genome: &Genome) {
        assert_eq!(genome.num_inputs(), self.num_inputs, "genome input count mismatch");

        let mut ids: BTreeSet<NeuronId> = (0..self.num_inputs as NeuronId).collect();
        ids.extend((0..NUM_OUTPUTS as NeuronId).map(|o| OUTPUT_BASE + o));
        for gene in genome.genes().iter().filter(|g| g.is_enabled()) {
            ids.insert(gene.source());
            ids.insert(gene.target());
        }

        self.neurons = ids.iter().map(|&id| Neuron::new(id, self.kind_of(id))).collect();
        self.index = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        for gene in genome.genes().iter().filter(|g| g.is_enabled()) {
            let source = self.index[&gene.source()];
            let target = self.index[&gene.target()];
            self.neurons[target].connect(source, gene.weight());

            let target_pos = self.neurons[target].position;
            self.neurons[source].relax_towards(target_pos);
            let source_pos = self.neurons[source].position;
            self.neurons[target].relax_towards(source_pos);
        }
    }

    /// Feed `inputs` through the network and write the motor values to `outputs`.
    ///
    /// Each neuron reads its sources' values as currently stored, so edges
    /// from a higher id see last tick's value.
    ///
    /// # Panics
    /// If the buffers do not match the network's arity.
    pub fn evaluate(&mut self, inputs: &[f32], outputs: &mut [f32]) {
        assert_eq!(inputs.len(), self.num_inputs, "input arity mismatch");
        assert_eq!(outputs.len(), NUM_OUTPUTS, "output arity mismatch");
        assert!(!self.neurons.is_empty(), "network evaluated before build");

        for (neuron, &value) in self.neurons.iter_mut().zip(inputs) {
            neuron.value = value;
        }

        for i in self.num_inputs..self.neurons.len() {
            if self.neurons[i].inputs.is_empty() {
                continue;
            }
            let sum: f32 = self.neurons[i]
                .inputs
                .iter()
                .map(|s| self.neurons[s.source].value * s.weight)
                .sum();
            self.neurons[i].value = neuron_sigmoid(sum);
        }

        for (o, out) in outputs.iter_mut().enumerate() {
            *out = self.neuron(OUTPUT_BASE + o as NeuronId).value;
        }
    }

    fn kind_of(&self, id: NeuronId) -> NeuronKind {
        if (id as usize) < self.num_inputs {
            NeuronKind::Sensor
        } else if id >= OUTPUT_BASE {
            NeuronKind::Output
        } else {
            NeuronKind::Hidden
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Neurons in evaluation order
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Neuron with the given id.
    ///
    /// # Panics
    /// If no such neuron exists in the phenotype.
    pub fn neuron(&self, id: NeuronId) -> &Neuron {
        match self.index.get(&id) {
            Some(&i) => &self.neurons[i],
            None => panic!("neuron {id} does not exist"),
        }
    }

    pub fn contains(&self, id: NeuronId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn hidden_count(&self) -> usize {
        self.neurons.iter().filter(|n| n.kind == NeuronKind::Hidden).count()
    }
}
