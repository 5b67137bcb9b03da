//! Configuration system for the simulation.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::clock::MAX_TIME_SCALE;
use crate::error::{Error, Result};
use crate::neural::MutationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub population: PopulationConfig,
    pub agents: AgentConfig,
    pub evolution: EvolutionConfig,
    pub resources: ResourceConfig,
    pub logging: LoggingConfig,
}

/// World/environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Width of the world rectangle
    pub width: f32,
    /// Height of the world rectangle
    pub height: f32,
    /// Raw seconds advanced per step
    pub time_step: f32,
    /// Integer multiplier applied to the raw step
    pub time_scale: u32,
}

/// Which species populate the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PopulationMode {
    /// Predators hunt prey; both drink water, prey also eat food
    PredatorPrey { predators: usize, prey: usize },
    /// A single species of plain agents
    Agents { count: usize },
}

/// Initial population configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub mode: PopulationMode,
    /// Allow add-connection/add-neuron/enable/disable mutations
    pub structural_mutation: bool,
    /// Size trait range for freshly seeded genomes
    pub size_range: [f32; 2],
}

/// Agent physiology and fitness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Scaled seconds an agent may live
    pub max_lifetime: f32,
    /// Scaled seconds for hunger to drain from full to empty
    pub hunger_rate: f32,
    /// Scaled seconds for thirst to drain from full to empty
    pub thirst_rate: f32,
    /// Fraction of digested hunger converted into energy
    pub digest_efficiency: f32,
    /// Energy cost coefficient for movement
    pub move_cost: f32,
    /// Distance an agent is pushed back from anything it touches
    pub collision_separation: f32,
    /// Hunger a predator gains from a kill
    pub predation_yield: f32,
    pub fitness: FitnessWeights,
}

/// Weights of the fitness score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub time: f32,
    pub health: f32,
    pub hunger: f32,
    pub thirst: f32,
    pub energy: f32,
}

/// Evolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Mutate bred genomes (can be toggled at runtime)
    pub allow_mutation: bool,
    /// Probability of running the weight perturbation pass
    pub weight_mutation_rate: f32,
    /// Probability of adding a connection
    pub add_connection_rate: f32,
    /// Probability of splitting a connection with a new neuron
    pub add_neuron_rate: f32,
    /// Probability of disabling a random gene
    pub disable_rate: f32,
    /// Probability of enabling a random gene
    pub enable_rate: f32,
}

/// Food and water spawning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resources pre-allocated per kind
    pub pool_size: usize,
    /// Scaled seconds between food spawns
    pub food_spawn_interval: f32,
    /// Scaled seconds between water spawns
    pub water_spawn_interval: f32,
    /// Hunger restored by one food
    pub food_yield: f32,
    /// Thirst restored by one water
    pub water_yield: f32,
    /// Scaled seconds a resource stays before vanishing
    pub lifetime: f32,
    /// Collision radius of a resource
    pub size: f32,
}

/// Logging and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Steps between stats logging
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Directory for per-species fitness CSV files
    #[serde(default)]
    pub fitness_log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            population: PopulationConfig::default(),
            agents: AgentConfig::default(),
            evolution: EvolutionConfig::default(),
            resources: ResourceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 1000.0,
            time_step: 1.0 / 60.0,
            time_scale: 1,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            mode: PopulationMode::PredatorPrey {
                predators: 10,
                prey: 30,
            },
            structural_mutation: true,
            size_range: [10.0, 20.0],
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_lifetime: 600.0,
            hunger_rate: 100.0,
            thirst_rate: 100.0,
            digest_efficiency: 0.97,
            move_cost: 0.015,
            collision_separation: 5.0,
            predation_yield: 0.2,
            fitness: FitnessWeights::default(),
        }
    }
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            time: 0.8,
            health: 0.2,
            hunger: 0.15,
            thirst: 0.15,
            energy: 0.7,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            allow_mutation: true,
            weight_mutation_rate: 1.0,
            add_connection_rate: 0.075,
            add_neuron_rate: 0.075,
            disable_rate: 0.02,
            enable_rate: 0.02,
        }
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            pool_size: 25,
            food_spawn_interval: 3.0,
            water_spawn_interval: 3.0,
            food_yield: 0.2,
            water_yield: 0.2,
            lifetime: 30.0,
            size: 10.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 600,
            log_level: "info".to_string(),
            fitness_log_dir: None,
        }
    }
}

impl PopulationMode {
    /// Total number of agent slots
    pub fn total(&self) -> usize {
        match *self {
            PopulationMode::PredatorPrey { predators, prey } => predators + prey,
            PopulationMode::Agents { count } => count,
        }
    }
}

impl EvolutionConfig {
    /// Mutation operator probabilities
    pub fn mutation_config(&self) -> MutationConfig {
        MutationConfig {
            weight_mutation_rate: self.weight_mutation_rate,
            add_connection_rate: self.add_connection_rate,
            add_neuron_rate: self.add_neuron_rate,
            disable_rate: self.disable_rate,
            enable_rate: self.enable_rate,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            return invalid("world width and height must be > 0");
        }
        if self.world.time_step <= 0.0 {
            return invalid("time_step must be > 0");
        }
        if self.world.time_scale == 0 || self.world.time_scale > MAX_TIME_SCALE {
            return invalid("time_scale must be between 1 and MAX_TIME_SCALE");
        }
        if self.population.mode.total() == 0 {
            return invalid("population must contain at least one agent");
        }
        let [min_size, max_size] = self.population.size_range;
        if min_size <= 0.0 || min_size > max_size {
            return invalid("size_range must be positive and ordered");
        }
        let e = &self.evolution;
        let rates = [
            e.weight_mutation_rate,
            e.add_connection_rate,
            e.add_neuron_rate,
            e.disable_rate,
            e.enable_rate,
        ];
        if rates.iter().any(|r| !(0.0..=1.0).contains(r)) {
            return invalid("mutation rates must be in [0, 1]");
        }
        if self.agents.max_lifetime <= 0.0
            || self.agents.hunger_rate <= 0.0
            || self.agents.thirst_rate <= 0.0
        {
            return invalid("lifetime and status rates must be > 0");
        }
        if self.resources.food_spawn_interval <= 0.0 || self.resources.water_spawn_interval <= 0.0 {
            return invalid("resource spawn intervals must be > 0");
        }
        if self.logging.stats_interval == 0 {
            return invalid("stats_interval must be > 0");
        }
        Ok(())
    }
}
