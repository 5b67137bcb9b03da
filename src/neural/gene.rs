//! A single synaptic connection gene.

use serde::{Deserialize, Serialize};

/// Identifier of a neuron inside one network.
///
/// Sensors use `0..num_inputs`, hidden neurons start at `MAX_INPUTS`, and
/// outputs occupy `OUTPUT_BASE..OUTPUT_BASE + NUM_OUTPUTS`.
pub type NeuronId = u32;

/// Connection gene carrying a historical innovation marker
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    innovation: u32,
    source: NeuronId,
    target: NeuronId,
    weight: f32,
    disabled: bool,
}

impl Gene {
    pub fn new(innovation: u32, source: NeuronId, target: NeuronId, weight: f32, disabled: bool) -> Self {
        Self {
            innovation,
            source,
            target,
            weight,
            disabled,
        }
    }

    pub fn innovation(&self) -> u32 {
        self.innovation
    }

    pub fn source(&self) -> NeuronId {
        self.source
    }

    pub fn target(&self) -> NeuronId {
        self.target
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    pub fn disable(&mut self) {
        self.disabled = true;
    }

    pub fn toggle_enabled(&mut self) {
        self.disabled = !self.disabled;
    }

    /// True when this gene wires `source` into `target`
    pub fn connects(&self, source: NeuronId, target: NeuronId) -> bool {
        self.source == source && self.target == target
    }
}
