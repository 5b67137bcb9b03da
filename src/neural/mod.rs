//! Neural encoding and phenotype for agent brains.
//!
//! Implements NEAT-style genomes with:
//! - Connection genes tagged with global innovation numbers
//! - Linear-merge crossover aligned by innovation
//! - Fitness-scaled weight and structural mutations
//! - Sparse graph networks evaluated in ascending neuron-id order

mod crossover;
mod gene;
mod genome;
mod innovation;
mod mutations;
mod network;

pub use gene::{Gene, NeuronId};
pub use genome::Genome;
pub use innovation::BreedingContext;
pub use mutations::{random_neuron_id, MutationConfig};
pub use network::{NeuralNetwork, Neuron, NeuronKind, Synapse};

/// First output neuron id
pub const OUTPUT_BASE: NeuronId = 10_000;

/// Largest supported sensor count; also the first hidden neuron id
pub const MAX_INPUTS: usize = 27;

/// Smallest supported sensor count
pub const MIN_INPUTS: usize = 11;

/// Hunger, thirst and energy sensors at the end of every input vector
pub const NUM_STATUS_INPUTS: usize = 3;

/// Speed, steer-left and steer-right
pub const NUM_OUTPUTS: usize = 3;

/// Index of each motor output
pub const OUTPUT_SPEED: usize = 0;
pub const OUTPUT_STEER_LEFT: usize = 1;
pub const OUTPUT_STEER_RIGHT: usize = 2;
