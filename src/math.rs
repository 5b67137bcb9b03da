//! Activation and trait curves shared by the genome, network and agents.

/// Steepness of the neuron activation curve.
pub const NEURON_STEEPNESS: f32 = 1.5;

/// Antisymmetric neuron activation on the open range (-1, 1).
#[inline]
pub fn neuron_sigmoid(x: f32) -> f32 {
    2.0 / ((-NEURON_STEEPNESS * x).exp() + 1.0) - 1.0
}

/// Top move speed for an agent of the given size. Larger agents are slower.
#[inline]
pub fn move_speed_from_size(size: f32) -> f32 {
    500.0 / ((0.04 * size).exp() + 1.0)
}

/// Top turn rate (radians per scaled second) for an agent of the given size.
#[inline]
pub fn steer_speed_from_size(size: f32) -> f32 {
    20.0 / ((0.04 * size).exp() + 1.0)
}

/// Per-gene mutation chance for a genome bred after a death with `fitness`.
///
/// Low fitness mutates more often and further: the curve starts at 0.075
/// for zero fitness and decays towards zero.
#[inline]
pub fn mutation_chance_from_fitness(fitness: f32) -> f32 {
    0.15 / ((4.0 * fitness).exp() + 1.0)
}
