//! # ECOGENESIS
//!
//! Open-ended predator/prey evolution with NEAT-style steering brains.
//!
//! ## Features
//!
//! - **Evolvable**: NEAT genomes with innovation-aligned crossover and
//!   fitness-scaled mutation
//! - **Steady state**: every death is replaced immediately by offspring of
//!   the fittest living members of the same species
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: Seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecogenesis::{Config, World};
//!
//! // Create world with default config
//! let config = Config::default();
//! let mut world = World::new(config).unwrap();
//!
//! // Run simulation
//! world.run(1000);
//!
//! // Check results
//! println!("Population: {}", world.population());
//! println!("Deaths: {}", world.fitness_log().total());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use ecogenesis::config::PopulationMode;
//! use ecogenesis::Config;
//!
//! let mut config = Config::default();
//! config.population.mode = PopulationMode::Agents { count: 60 };
//! config.evolution.add_neuron_rate = 0.1;
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Genome banks
//!
//! ```rust,no_run
//! use ecogenesis::persistence::GenomeBank;
//! use ecogenesis::{Config, World};
//!
//! let mut world = World::new_with_seed(Config::default(), 7).unwrap();
//! world.run(1000);
//!
//! // Save every slot's genome
//! world.genome_bank().save("genomes.bin").unwrap();
//!
//! // Continue evolving from the saved population
//! let bank = GenomeBank::load("genomes.bin").unwrap();
//! let restored = World::from_bank(Config::default(), &bank, 7).unwrap();
//! ```

pub mod agent;
pub mod clock;
pub mod collision;
pub mod config;
pub mod ecology;
pub mod error;
pub mod events;
pub mod evolution;
pub mod math;
pub mod neural;
pub mod perception;
pub mod persistence;
pub mod species;
pub mod stats;
pub mod world;

// Re-export main types
pub use agent::Agent;
pub use config::Config;
pub use error::{Error, Result};
pub use neural::{Gene, Genome, NeuralNetwork};
pub use persistence::GenomeBank;
pub use species::Species;
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
