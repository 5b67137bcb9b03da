//! Agents: a genome, the network it encodes, and a body driven by it.

use crate::collision::{Bodies, BodyId, CollisionRegistry, WorldBounds};
use crate::config::AgentConfig;
use crate::math::{move_speed_from_size, steer_speed_from_size};
use crate::neural::{
    Genome, NeuralNetwork, NUM_OUTPUTS, NUM_STATUS_INPUTS, OUTPUT_SPEED, OUTPUT_STEER_LEFT, OUTPUT_STEER_RIGHT,
};
use crate::perception::{encode_block, VISION_CONES};
use crate::species::Species;
use glam::{Mat2, Vec2};
use rand::Rng;

pub const MAX_HUNGER: f32 = 1.0;
pub const MAX_THIRST: f32 = 1.0;
pub const MAX_ENERGY: f32 = 1.0;

/// One population slot. The slot lives for the whole run; death only
/// deactivates it until a new genome is installed.
#[derive(Clone, Debug)]
pub struct Agent {
    slot: usize,
    species: Species,
    body: BodyId,
    genome: Genome,
    network: NeuralNetwork,
    /// Perception blocks followed by hunger, thirst and energy
    inputs: Vec<f32>,
    outputs: [f32; NUM_OUTPUTS],
    facing: Vec2,
    size: f32,
    max_speed: f32,
    max_steer: f32,
    time_alive: f32,
    alive: bool,
}

impl Agent {
    /// Create an inactive agent; call [`Agent::activate`] to bring it to life.
    ///
    /// # Panics
    /// If the genome's input count does not match the species.
    pub fn new(slot: usize, species: Species, body: BodyId, genome: Genome) -> Self {
        let num_inputs = species.num_inputs();
        assert_eq!(genome.num_inputs(), num_inputs, "genome does not fit {species}");
        Self {
            slot,
            species,
            body,
            genome,
            network: NeuralNetwork::new(num_inputs),
            inputs: vec![0.0; num_inputs],
            outputs: [0.0; NUM_OUTPUTS],
            facing: Vec2::X,
            size: 0.0,
            max_speed: 0.0,
            max_steer: 0.0,
            time_alive: 0.0,
            alive: false,
        }
    }

    /// Reset all state from the current genome and respawn at a random point
    pub fn activate<R: Rng>(&mut self, bodies: &mut Bodies, bounds: &WorldBounds, rng: &mut R) {
        self.size = self.genome.size_trait();
        self.max_speed = move_speed_from_size(self.size);
        self.max_steer = steer_speed_from_size(self.size);

        let n = self.inputs.len();
        self.inputs[n - 3] = rng.gen_range(MAX_HUNGER * 0.9..=MAX_HUNGER);
        self.inputs[n - 2] = rng.gen_range(MAX_THIRST * 0.9..=MAX_THIRST);
        self.inputs[n - 1] = rng.gen_range(MAX_ENERGY * 0.9..=MAX_ENERGY);
        self.time_alive = 0.0;
        self.alive = true;

        let body = bodies.get_mut(self.body);
        body.collision_active = true;
        body.radius = self.size;
        body.position = bounds.random_point(rng);

        self.network.build(&self.genome);
    }

    /// Drain hunger and thirst, digest into energy.
    ///
    /// Returns true if the agent starved or dehydrated.
    pub fn update_status(&mut self, dt: f32, config: &AgentConfig) -> bool {
        let hunger_decay = MAX_HUNGER / config.hunger_rate * dt;
        let thirst_decay = MAX_THIRST / config.thirst_rate * dt;
        let (hunger, thirst, energy) = self.status_indices();

        self.inputs[hunger] -= hunger_decay;
        self.inputs[thirst] -= thirst_decay;
        self.inputs[energy] = (self.inputs[energy] + config.digest_efficiency * hunger_decay).min(MAX_ENERGY);

        self.inputs[hunger] < 0.0 || self.inputs[thirst] < 0.0
    }

    /// Refresh every perception block from the registry
    pub fn update_perception(&mut self, registry: &CollisionRegistry, bodies: &Bodies, bounds: &WorldBounds) {
        let origin = bodies.get(self.body).position;
        let max_distance = bounds.max_distance();
        let me = self.body;

        for (block, &category) in self.species.perceives().iter().enumerate() {
            let objects = registry
                .active(category, bodies)
                .filter(|&id| id != me)
                .map(|id| bodies.get(id).position);
            let start = block * VISION_CONES;
            encode_block(origin, self.facing, objects, max_distance, &mut self.inputs[start..start + VISION_CONES]);
        }
    }

    /// Run the network on the current inputs
    pub fn think(&mut self) {
        self.network.evaluate(&self.inputs, &mut self.outputs);
    }

    /// Steer and move from the motor outputs. Agents without energy stay put.
    pub fn apply_movement(&mut self, dt: f32, config: &AgentConfig, bodies: &mut Bodies, bounds: &WorldBounds) {
        let (_, _, energy) = self.status_indices();
        if self.inputs[energy] <= 0.0 {
            return;
        }

        for output in &mut self.outputs {
            *output = output.clamp(-1.0, 1.0);
        }
        let speed = self.outputs[OUTPUT_SPEED];
        let steer = (self.outputs[OUTPUT_STEER_RIGHT] - self.outputs[OUTPUT_STEER_LEFT]) * self.max_steer * dt;
        self.set_facing(Mat2::from_angle(steer) * self.facing);

        let body = bodies.get_mut(self.body);
        body.position = bounds.clamp(body.position + self.facing * speed * self.max_speed * dt);

        let cost = speed.abs() / self.max_speed * self.size * config.move_cost;
        self.inputs[energy] = (self.inputs[energy] - cost).max(0.0);
    }

    /// True if `other` is an active body, not our own, overlapping this agent
    pub fn touches(&self, other: BodyId, bodies: &Bodies) -> bool {
        if other == self.body {
            return false;
        }
        let other = bodies.get(other);
        other.collision_active && bodies.get(self.body).touches(other)
    }

    /// Push this agent `distance` away from `other`'s center
    pub fn push_away(&self, other: BodyId, distance: f32, bodies: &mut Bodies) {
        let from = bodies.get(other).position;
        let body = bodies.get_mut(self.body);
        if let Some(direction) = (from - body.position).try_normalize() {
            body.position -= direction * distance;
        }
    }

    /// Accumulate scaled time; returns true once the lifetime is used up
    pub fn advance_age(&mut self, dt: f32, config: &AgentConfig) -> bool {
        self.time_alive += dt;
        self.time_alive >= config.max_lifetime
    }

    /// Weighted lifespan and health score
    pub fn fitness(&self, config: &AgentConfig) -> f32 {
        let w = &config.fitness;
        let (hunger, thirst, energy) = self.status_indices();
        let health = w.hunger * self.inputs[hunger] + w.thirst * self.inputs[thirst] + w.energy * self.inputs[energy];
        w.time * (self.time_alive / config.max_lifetime) + w.health * health
    }

    /// Deactivate collision and mark dead. Returns false if already dead.
    pub fn kill(&mut self, bodies: &mut Bodies) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        bodies.get_mut(self.body).collision_active = false;
        true
    }

    pub fn update_hunger(&mut self, amount: f32) {
        let (hunger, _, _) = self.status_indices();
        self.inputs[hunger] = (self.inputs[hunger] + amount).min(MAX_HUNGER);
    }

    pub fn update_thirst(&mut self, amount: f32) {
        let (_, thirst, _) = self.status_indices();
        self.inputs[thirst] = (self.inputs[thirst] + amount).min(MAX_THIRST);
    }

    fn status_indices(&self) -> (usize, usize, usize) {
        let n = self.inputs.len();
        debug_assert!(n >= NUM_STATUS_INPUTS);
        (n - 3, n - 2, n - 1)
    }

    /// Replace the genome; takes effect on the next activation
    pub fn set_genome(&mut self, genome: Genome) {
        assert_eq!(genome.num_inputs(), self.inputs.len(), "genome does not fit {}", self.species);
        self.genome = genome;
    }

    /// Set the facing direction; zero vectors are ignored
    pub fn set_facing(&mut self, facing: Vec2) {
        if let Some(facing) = facing.try_normalize() {
            self.facing = facing;
        }
    }

    /// Network input at `index`.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn input(&self, index: usize) -> f32 {
        assert!(index < self.inputs.len(), "input index {index} out of bounds");
        self.inputs[index]
    }

    /// # Panics
    /// If `index >= NUM_OUTPUTS`.
    pub fn output(&self, index: usize) -> f32 {
        assert!(index < NUM_OUTPUTS, "output index {index} out of bounds");
        self.outputs[index]
    }

    pub fn inputs(&self) -> &[f32] {
        &self.inputs
    }

    pub fn hunger(&self) -> f32 {
        self.inputs[self.status_indices().0]
    }

    pub fn thirst(&self) -> f32 {
        self.inputs[self.status_indices().1]
    }

    pub fn energy(&self) -> f32 {
        self.inputs[self.status_indices().2]
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn time_alive(&self) -> f32 {
        self.time_alive
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[cfg(test)]
    pub(crate) fn set_status(&mut self, hunger: f32, thirst: f32, energy: f32) {
        let (h, t, e) = self.status_indices();
        self.inputs[h] = hunger;
        self.inputs[t] = thirst;
        self.inputs[e] = energy;
    }

    #[cfg(test)]
    pub(crate) fn set_outputs(&mut self, outputs: [f32; NUM_OUTPUTS]) {
        self.outputs = outputs;
    }
}
