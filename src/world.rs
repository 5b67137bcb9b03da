//! World simulation engine - main simulation loop.

use crate::agent::Agent;
use crate::clock::SimClock;
use crate::collision::{Bodies, Body, BodyId, CollisionRegistry, Owner, WorldBounds};
use crate::config::{Config, PopulationMode};
use crate::ecology::{ResourceKind, ResourcePools};
use crate::error::{Error, Result};
use crate::events::{EventQueue, SimEvent};
use crate::evolution::EvolutionEngine;
use crate::neural::{BreedingContext, Genome, MAX_INPUTS};
use crate::persistence::GenomeBank;
use crate::species::Species;
use crate::stats::{FitnessLog, Stats, StatsHistory};
use glam::Vec2;
use log::{debug, info, trace, warn};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

/// The simulation world
pub struct World {
    // Population, one agent per slot for the whole run
    pub agents: Vec<Agent>,

    // Environment
    pub bodies: Bodies,
    pub registry: CollisionRegistry,
    pub resources: ResourcePools,
    pub bounds: WorldBounds,

    // State
    pub clock: SimClock,
    pub time: u64,

    // Configuration
    pub config: Config,

    // Statistics
    pub stats: Stats,
    pub stats_history: StatsHistory,

    // Evolution
    pub evolution_engine: EvolutionEngine,
    breeding: BreedingContext,

    events: EventQueue,
    fitness_log: FitnessLog,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,
}

impl World {
    /// Create a new world with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a new world with freshly seeded genomes and a specific seed
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut breeding = BreedingContext::new();
        let [min_size, max_size] = config.population.size_range;

        let population: Vec<(Species, Genome)> = initial_species(&config.population.mode)
            .into_iter()
            .map(|species| {
                let size = rng.gen_range(min_size..=max_size);
                let genome = breeding.seed_genome(
                    species.num_inputs(),
                    config.population.structural_mutation,
                    species.is_prey(),
                    size,
                    &mut rng,
                );
                (species, genome)
            })
            .collect();

        let world = Self::assemble(config, seed, rng, breeding, population);
        info!(
            "World created: {} agents ({} slots), seed {}",
            world.population(),
            world.agents.len(),
            seed
        );
        Ok(world)
    }

    /// Create a world with one agent per genome in `bank`
    pub fn from_bank(config: Config, bank: &GenomeBank, seed: u64) -> Result<Self> {
        config.validate()?;
        if bank.is_empty() {
            return Err(Error::InvalidFormat("genome bank is empty".to_string()));
        }
        let predator_prey = matches!(config.population.mode, PopulationMode::PredatorPrey { .. });

        let mut population = Vec::with_capacity(bank.len());
        for record in &bank.genomes {
            let species = Species::from_prey_flag(record.is_prey, predator_prey);
            let num_inputs = species.num_inputs();
            let bad_sensor = record
                .genes
                .iter()
                .flat_map(|g| [g.source(), g.target()])
                .any(|id| (num_inputs..MAX_INPUTS).contains(&(id as usize)));
            if bad_sensor {
                return Err(Error::InvalidFormat(format!(
                    "genome {} references sensors a {} does not have",
                    record.id, species
                )));
            }
            population.push((species, Genome::from_record(record, num_inputs)));
        }

        let breeding = BreedingContext::from_genomes(population.iter().map(|(_, g)| g));
        let world = Self::assemble(config, seed, ChaCha8Rng::seed_from_u64(seed), breeding, population);
        info!(
            "World loaded from bank: {} genomes, next innovation {}, next genome id {}",
            bank.len(),
            world.breeding.peek_innovation(),
            world.breeding.peek_genome_id()
        );
        Ok(world)
    }

    fn assemble(
        config: Config,
        seed: u64,
        mut rng: ChaCha8Rng,
        breeding: BreedingContext,
        population: Vec<(Species, Genome)>,
    ) -> Self {
        let bounds = WorldBounds::new(config.world.width, config.world.height);
        let mut bodies = Bodies::new();
        let mut registry = CollisionRegistry::new();
        let resources = ResourcePools::new(&config.resources, &mut bodies, &mut registry);

        let mut agents = Vec::with_capacity(population.len());
        for (slot, (species, genome)) in population.into_iter().enumerate() {
            let body = bodies.insert(Body::new(Owner::Agent(slot), genome.size_trait()));
            registry.register(body, species.categories());

            let mut agent = Agent::new(slot, species, body, genome);
            agent.set_facing(Vec2::from_angle(rng.gen_range(0.0..TAU)));
            agent.activate(&mut bodies, &bounds, &mut rng);
            agents.push(agent);
        }

        let fitness_log = match &config.logging.fitness_log_dir {
            Some(dir) => FitnessLog::with_dir(dir).unwrap_or_else(|e| {
                warn!("Fitness log directory {} unavailable ({}), keeping log in memory", dir, e);
                FitnessLog::new()
            }),
            None => FitnessLog::new(),
        };

        let clock = SimClock::new(config.world.time_step, config.world.time_scale);
        let stats_history = StatsHistory::new(config.logging.stats_interval);
        let evolution_engine = EvolutionEngine::from_config(&config);

        let mut world = Self {
            agents,
            bodies,
            registry,
            resources,
            bounds,
            clock,
            time: 0,
            config,
            stats: Stats::new(),
            stats_history,
            evolution_engine,
            breeding,
            events: EventQueue::new(),
            fitness_log,
            rng,
            seed,
        };
        world.stats.update(
            0,
            0.0,
            &world.agents,
            &world.resources,
            &world.config.agents,
        );
        world
    }

    /// Execute one simulation step
    pub fn step(&mut self) {
        self.stats.begin_step();
        self.clock.tick();
        let dt = self.clock.delta_scaled();

        // Phase 1: Resource spawning and expiry
        self.resources.update(
            dt,
            &mut self.bodies,
            &mut self.registry,
            &mut self.events,
            &self.bounds,
            &mut self.rng,
        );

        // Phase 2: Agents in slot order
        for slot in 0..self.agents.len() {
            self.update_agent(slot, dt);
        }

        // Phase 3: Deaths and depletions, as one batch
        self.deliver_events();

        // Phase 4: Statistics
        self.update_stats();
        self.time += 1;
    }

    fn update_agent(&mut self, slot: usize, dt: f32) {
        if !self.agents[slot].is_alive() {
            return;
        }

        if self.agents[slot].update_status(dt, &self.config.agents) {
            self.kill_agent(slot);
            return;
        }

        let agent = &mut self.agents[slot];
        agent.update_perception(&self.registry, &self.bodies, &self.bounds);
        agent.think();
        agent.apply_movement(dt, &self.config.agents, &mut self.bodies, &self.bounds);

        self.resolve_contacts(slot);
        if !self.agents[slot].is_alive() {
            return;
        }

        if self.agents[slot].advance_age(dt, &self.config.agents) {
            self.kill_agent(slot);
        }
    }

    /// Scan the agent's collision categories, applying effects and pushing it
    /// away from everything it touches. Stops once the agent dies.
    fn resolve_contacts(&mut self, slot: usize) {
        let species = self.agents[slot].species();
        let separation = self.config.agents.collision_separation;

        for &category in species.collides_with() {
            let members: Vec<BodyId> = self.registry.members(category).to_vec();
            for other in members {
                if !self.agents[slot].is_alive() {
                    return;
                }
                if !self.agents[slot].touches(other, &self.bodies) {
                    continue;
                }
                let owner = self.bodies.get(other).owner;
                self.apply_contact(slot, owner);
                self.agents[slot].push_away(other, separation, &mut self.bodies);
            }
        }
    }

    fn apply_contact(&mut self, slot: usize, owner: Owner) {
        match owner {
            Owner::Resource(kind, index) => {
                if let Some(amount) = self.resources.consume(kind, index, &mut self.bodies, &mut self.events) {
                    let agent = &mut self.agents[slot];
                    match kind {
                        ResourceKind::Food => agent.update_hunger(amount),
                        ResourceKind::Water => agent.update_thirst(amount),
                    }
                    trace!("Slot {} consumed {:?} {}", slot, kind, index);
                }
            }
            Owner::Agent(other) => {
                let me = self.agents[slot].species();
                let them = self.agents[other].species();
                let (predator, prey) = if me.eats(them) {
                    (slot, other)
                } else if them.eats(me) {
                    (other, slot)
                } else {
                    return;
                };
                self.agents[predator].update_hunger(self.config.agents.predation_yield);
                self.kill_agent(prey);
                trace!("Predator {} caught prey {}", predator, prey);
            }
        }
    }

    fn kill_agent(&mut self, slot: usize) {
        if self.agents[slot].kill(&mut self.bodies) {
            self.events.push(SimEvent::AgentDied { slot });
        }
    }

    fn deliver_events(&mut self) {
        for event in self.events.drain() {
            match event {
                SimEvent::AgentDied { slot } => self.replace_agent(slot),
                SimEvent::ResourceDepleted { kind, index } => self.resources.recycle(kind, index),
            }
        }
    }

    /// Log the dead agent's fitness, breed its successor and reactivate the slot
    fn replace_agent(&mut self, slot: usize) {
        let species = self.agents[slot].species();
        let fitness = self.agents[slot].fitness(&self.config.agents);
        self.fitness_log.record(self.time, species, fitness);
        self.stats.record_death(species);

        let genome = self.evolution_engine.breed(
            slot,
            &self.agents,
            &self.config.agents,
            &mut self.breeding,
            &mut self.rng,
        );
        debug!(
            "{} in slot {} died at {:.1}s with fitness {:.3}; genome {} ({} genes) installed",
            species,
            slot,
            self.agents[slot].time_alive(),
            fitness,
            genome.id(),
            genome.len()
        );

        let agent = &mut self.agents[slot];
        agent.set_genome(genome);
        agent.activate(&mut self.bodies, &self.bounds, &mut self.rng);
    }

    fn update_stats(&mut self) {
        self.stats.update(
            self.time,
            self.clock.total_scaled(),
            &self.agents,
            &self.resources,
            &self.config.agents,
        );
        let interval = self.config.logging.stats_interval;
        if interval > 0 && self.time % interval == 0 {
            self.stats_history.record(self.stats.clone());
        }
    }

    /// Run simulation for N steps
    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Run simulation with callback for progress updates
    pub fn run_with_callback<F>(&mut self, steps: u64, mut callback: F)
    where
        F: FnMut(&World, u64),
    {
        for i in 0..steps {
            self.step();
            callback(self, i);
        }
    }

    /// Flip the global mutation switch and return the new state
    pub fn toggle_mutation(&mut self) -> bool {
        let enabled = self.evolution_engine.toggle_mutation();
        info!("Mutation {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    /// Snapshot every slot's genome
    pub fn genome_bank(&self) -> GenomeBank {
        GenomeBank::from_genomes(self.time, self.agents.iter().map(Agent::genome))
    }

    /// Number of living agents
    pub fn population(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    pub fn population_of(&self, species: Species) -> usize {
        self.agents
            .iter()
            .filter(|a| a.is_alive() && a.species() == species)
            .count()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, slot: usize) -> &Agent {
        &self.agents[slot]
    }

    pub fn fitness_log(&self) -> &FitnessLog {
        &self.fitness_log
    }

    pub fn fitness_log_mut(&mut self) -> &mut FitnessLog {
        &mut self.fitness_log
    }

    pub fn breeding(&self) -> &BreedingContext {
        &self.breeding
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Species of each slot, predators first
fn initial_species(mode: &PopulationMode) -> Vec<Species> {
    match *mode {
        PopulationMode::PredatorPrey { predators, prey } => std::iter::repeat(Species::Predator)
            .take(predators)
            .chain(std::iter::repeat(Species::Prey).take(prey))
            .collect(),
        PopulationMode::Agents { count } => vec![Species::Agent; count],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.population.mode = PopulationMode::PredatorPrey { predators: 4, prey: 8 };
        config
    }

    fn duel_world() -> World {
        let mut config = Config::default();
        config.population.mode = PopulationMode::PredatorPrey { predators: 1, prey: 1 };
        let mut world = World::new_with_seed(config, 7).unwrap();
        world.bodies.get_mut(world.agents[0].body()).position = Vec2::new(100.0, 100.0);
        world.bodies.get_mut(world.agents[1].body()).position = Vec2::new(900.0, 900.0);
        world
    }

    fn place(world: &mut World, slot: usize, position: Vec2) {
        let body = world.agents[slot].body();
        world.bodies.get_mut(body).position = position;
    }

    #[test]
    fn test_world_creation() {
        let world = World::new(Config::default()).unwrap();
        assert_eq!(world.population(), 40);
        assert_eq!(world.population_of(Species::Predator), 10);
        assert_eq!(world.population_of(Species::Prey), 30);
        assert_eq!(world.time, 0);
        assert_eq!(world.agent(0).genome().num_inputs(), 19);
        assert_eq!(world.agent(10).genome().num_inputs(), 27);
    }

    #[test]
    fn test_agents_mode() {
        let mut config = Config::default();
        config.population.mode = PopulationMode::Agents { count: 6 };
        let world = World::new_with_seed(config, 1).unwrap();
        assert_eq!(world.population_of(Species::Agent), 6);
        assert_eq!(world.registry.members(crate::collision::Category::Agent).len(), 6);
    }

    #[test]
    fn test_world_run() {
        let mut world = World::new_with_seed(test_config(), 3).unwrap();
        world.run(120);
        assert_eq!(world.time, 120);
        // dead slots are refilled within the step
        assert_eq!(world.population(), 12);
    }

    #[test]
    fn test_reproducibility() {
        let mut world1 = World::new_with_seed(test_config(), 42).unwrap();
        let mut world2 = World::new_with_seed(test_config(), 42).unwrap();
        world1.run(300);
        world2.run(300);

        for (a, b) in world1.agents().iter().zip(world2.agents()) {
            assert_eq!(a.genome().id(), b.genome().id());
            assert_eq!(
                world1.bodies.get(a.body()).position,
                world2.bodies.get(b.body()).position
            );
        }
    }

    #[test]
    fn test_predator_catches_prey() {
        let mut world = duel_world();
        world.agents[0].set_status(0.5, 1.0, 1.0);
        place(&mut world, 1, Vec2::new(105.0, 100.0));

        world.resolve_contacts(0);
        assert!((world.agents[0].hunger() - 0.7).abs() < 1e-6);
        assert!(!world.agents[1].is_alive());
        assert_eq!(world.events.len(), 1);
        // predator pushed away from the prey
        assert_eq!(world.bodies.get(world.agents[0].body()).position, Vec2::new(95.0, 100.0));
    }

    #[test]
    fn test_prey_contact_feeds_predator_clamped() {
        let mut world = duel_world();
        world.agents[0].set_status(0.9, 1.0, 1.0);
        place(&mut world, 1, Vec2::new(100.0, 105.0));

        world.resolve_contacts(1);
        assert_eq!(world.agents[0].hunger(), 1.0);
        assert!(!world.agents[1].is_alive());
    }

    #[test]
    fn test_same_species_contact_only_pushes() {
        let mut config = Config::default();
        config.population.mode = PopulationMode::PredatorPrey { predators: 0, prey: 2 };
        let mut world = World::new_with_seed(config, 5).unwrap();
        place(&mut world, 0, Vec2::new(300.0, 300.0));
        place(&mut world, 1, Vec2::new(300.0, 310.0));
        world.agents[0].set_status(0.5, 0.5, 0.5);

        world.resolve_contacts(0);
        assert!(world.agents[1].is_alive());
        assert_eq!(world.agents[0].hunger(), 0.5);
        assert_eq!(world.bodies.get(world.agents[0].body()).position, Vec2::new(300.0, 295.0));
    }

    #[test]
    fn test_food_contact_consumes_resource() {
        let mut world = duel_world();
        world.agents[0].kill(&mut world.bodies);
        world.resources.update(
            3.5,
            &mut world.bodies,
            &mut world.registry,
            &mut world.events,
            &world.bounds,
            &mut world.rng,
        );
        let food = world
            .registry
            .active(crate::collision::Category::Food, &world.bodies)
            .next()
            .unwrap();
        let food_pos = world.bodies.get(food).position;
        place(&mut world, 1, food_pos + Vec2::new(1.0, 0.0));
        world.agents[1].set_status(0.5, 0.5, 0.5);

        world.resolve_contacts(1);
        assert!((world.agents[1].hunger() - 0.7).abs() < 1e-6);
        assert!(!world.bodies.get(food).collision_active);
        assert_eq!(world.resources.active_count(ResourceKind::Food), 0);
    }

    #[test]
    fn test_death_replaced_after_batch() {
        let mut world = duel_world();
        let old_id = world.agents[1].genome().id();
        world.kill_agent(1);
        world.kill_agent(1);
        assert_eq!(world.events.len(), 1);
        assert!(!world.agents[1].is_alive());

        world.deliver_events();
        assert!(world.agents[1].is_alive());
        assert_ne!(world.agents[1].genome().id(), old_id);
        assert_eq!(world.fitness_log().len(), 1);
        assert_eq!(world.fitness_log().records()[0].species, Species::Prey);
        assert_eq!(world.agents[1].time_alive(), 0.0);
    }

    #[test]
    fn test_starving_agent_dies_and_is_reborn() {
        let mut world = duel_world();
        world.agents[1].set_status(0.0, 1.0, 1.0);
        world.step();
        assert_eq!(world.stats.deaths_this_step, 1);
        assert_eq!(world.fitness_log().len(), 1);
        assert!(world.agents[1].is_alive());
        assert!(world.agents[1].hunger() >= 0.9);
    }

    #[test]
    fn test_old_agent_dies_with_full_status() {
        let mut world = duel_world();
        let config = world.config.agents.clone();
        world.agents[0].advance_age(599.999, &config);
        world.agents[0].set_status(1.0, 1.0, 1.0);
        world.step();

        let record = world.fitness_log().records()[0];
        assert_eq!(record.species, Species::Predator);
        assert!(record.fitness > 0.8);
        assert_eq!(world.agents[0].time_alive(), 0.0);
    }

    #[test]
    fn test_select_parents_same_species_first_seen_wins() {
        let mut world = World::new_with_seed(test_config(), 9).unwrap();
        for agent in world.agents.iter_mut() {
            agent.set_status(0.5, 0.5, 0.5);
        }
        // slots 0..4 predators, 4..12 prey
        world.agents[6].set_status(1.0, 1.0, 1.0);
        world.agents[9].set_status(1.0, 1.0, 1.0);
        world.agents[2].set_status(1.0, 1.0, 1.0);

        let parents = EvolutionEngine::select_parents(&world.agents, Species::Prey, &world.config.agents);
        let (best, best_fitness) = parents.best.unwrap();
        let (second, second_fitness) = parents.second.unwrap();
        assert_eq!(best, 6);
        assert_eq!(second, 9);
        assert_eq!(best_fitness, second_fitness);

        world.agents[6].kill(&mut world.bodies);
        let parents = EvolutionEngine::select_parents(&world.agents, Species::Prey, &world.config.agents);
        assert_eq!(parents.best.unwrap().0, 9);
    }

    #[test]
    fn test_no_mutation_clones_dead_genome() {
        let mut world = duel_world();
        world.toggle_mutation();
        let genes = world.agents[0].genome().genes().to_vec();
        world.kill_agent(0);
        world.deliver_events();
        assert_eq!(world.agents[0].genome().genes(), genes.as_slice());
    }

    #[test]
    fn test_prey_killed_mid_pass_replaced_once() {
        let mut world = duel_world();
        // predator in slot 0 reaches the prey in slot 1 before the prey updates
        place(&mut world, 1, Vec2::new(103.0, 100.0));
        let prey_genome = world.agents[1].genome().id();
        let next_id = world.breeding().peek_genome_id();

        world.step();

        assert_eq!(world.fitness_log().total(), 1);
        assert_eq!(world.fitness_log().records()[0].species, Species::Prey);
        assert_eq!(world.stats.deaths_this_step, 1);
        assert_eq!(world.breeding().peek_genome_id(), next_id + 1);
        assert!(world.events.is_empty());

        let prey = world.agent(1);
        assert!(prey.is_alive());
        assert_ne!(prey.genome().id(), prey_genome);
        // reborn after the pass, so never aged in this step
        assert_eq!(prey.time_alive(), 0.0);
    }

    fn replaced_weight_changes(hunger: f32, age: f32) -> (f32, Vec<f32>) {
        let mut config = Config::default();
        config.population.mode = PopulationMode::Agents { count: 1 };
        let mut world = World::new_with_seed(config, 23).unwrap();
        let agent_config = world.config.agents.clone();
        world.agents[0].set_status(hunger, hunger, hunger);
        world.agents[0].advance_age(age, &agent_config);
        let fitness = world.agents[0].fitness(&agent_config);
        let parent = world.agents[0].genome().clone();

        world.kill_agent(0);
        world.deliver_events();

        let child = world.agents[0].genome();
        let changes = parent
            .genes()
            .iter()
            .filter_map(|p| {
                child
                    .genes()
                    .iter()
                    .find(|c| c.innovation() == p.innovation())
                    .map(|c| (c.weight() - p.weight()).abs())
            })
            .collect();
        (fitness, changes)
    }

    #[test]
    fn test_replacement_mutation_follows_dead_fitness() {
        use crate::math::mutation_chance_from_fitness;

        let (fit, fit_changes) = replaced_weight_changes(1.0, 599.0);
        let (weak, weak_changes) = replaced_weight_changes(0.0, 0.0);
        assert!(fit > 0.99);
        assert_eq!(weak, 0.0);

        // with no living parent the dead genome is cloned, so all its genes survive
        assert!(!fit_changes.is_empty());
        assert_eq!(fit_changes.len(), weak_changes.len());

        let fit_bound = 2.0 * mutation_chance_from_fitness(fit);
        assert!(fit_changes.iter().all(|&d| d <= fit_bound + 1e-6));
        assert!(weak_changes.iter().any(|&d| d > fit_bound));
        assert!(weak_changes.iter().sum::<f32>() > fit_changes.iter().sum::<f32>());
    }

    #[test]
    fn test_bank_roundtrip_reseeds_counters() {
        let mut world = World::new_with_seed(test_config(), 11).unwrap();
        world.run(200);
        let bank = world.genome_bank();

        let restored = World::from_bank(test_config(), &bank, 11).unwrap();
        assert_eq!(restored.population_of(Species::Predator), 4);
        assert_eq!(restored.population_of(Species::Prey), 8);
        assert!(restored.breeding().peek_genome_id() > bank.max_id().unwrap());
        if let Some(innovation) = bank.max_innovation() {
            assert!(restored.breeding().peek_innovation() > innovation);
        }
    }

    #[test]
    fn test_from_empty_bank_fails() {
        let bank = GenomeBank::new(0, Vec::new());
        assert!(World::from_bank(test_config(), &bank, 1).is_err());
    }
}
