//! Replacement breeding for dead agents.

use crate::agent::Agent;
use crate::config::{AgentConfig, Config};
use crate::neural::{BreedingContext, Genome, MutationConfig};
use crate::species::Species;
use rand::Rng;

/// Best and runner-up living agents of one species, as `(slot, fitness)`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Parents {
    pub best: Option<(usize, f32)>,
    pub second: Option<(usize, f32)>,
}

/// How the replacement genome is produced
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BreedingPlan {
    /// Copy the dead agent's own genome
    CloneDead,
    /// Copy the only living candidate
    Clone(usize),
    /// Cross the two fittest candidates
    Crossover {
        best: usize,
        second: usize,
        fitness_equal: bool,
    },
}

/// Evolution engine for replacing dead agents
pub struct EvolutionEngine {
    pub mutation_config: MutationConfig,
    pub allow_mutation: bool,
}

impl EvolutionEngine {
    /// Create evolution engine from config
    pub fn from_config(config: &Config) -> Self {
        Self {
            mutation_config: config.evolution.mutation_config(),
            allow_mutation: config.evolution.allow_mutation,
        }
    }

    /// Flip the global mutation switch and return the new state
    pub fn toggle_mutation(&mut self) -> bool {
        self.allow_mutation = !self.allow_mutation;
        self.allow_mutation
    }

    /// Scan living agents of `species` in slot order; ties keep the earlier slot
    pub fn select_parents(agents: &[Agent], species: Species, config: &AgentConfig) -> Parents {
        let mut parents = Parents::default();
        for agent in agents.iter().filter(|a| a.is_alive() && a.species() == species) {
            let candidate = (agent.slot(), agent.fitness(config));
            match parents.best {
                None => parents.best = Some(candidate),
                Some(best) if candidate.1 > best.1 => {
                    parents.second = parents.best;
                    parents.best = Some(candidate);
                }
                Some(_) => {
                    if parents.second.map_or(true, |second| candidate.1 > second.1) {
                        parents.second = Some(candidate);
                    }
                }
            }
        }
        parents
    }

    pub fn plan(&self, parents: &Parents) -> BreedingPlan {
        match (self.allow_mutation, parents.best, parents.second) {
            (false, _, _) | (true, None, _) => BreedingPlan::CloneDead,
            (true, Some((best, _)), None) => BreedingPlan::Clone(best),
            (true, Some((best, best_fitness)), Some((second, second_fitness))) => BreedingPlan::Crossover {
                best,
                second,
                fitness_equal: best_fitness == second_fitness,
            },
        }
    }

    /// Breed the replacement genome for the agent in slot `dead`.
    ///
    /// Mutation strength follows the dead agent's fitness.
    pub fn breed<R: Rng>(
        &self,
        dead: usize,
        agents: &[Agent],
        config: &AgentConfig,
        ctx: &mut BreedingContext,
        rng: &mut R,
    ) -> Genome {
        let dead_agent = &agents[dead];
        let parents = Self::select_parents(agents, dead_agent.species(), config);

        let mut genome = match self.plan(&parents) {
            BreedingPlan::CloneDead => dead_agent.genome().duplicate(ctx),
            BreedingPlan::Clone(slot) => agents[slot].genome().duplicate(ctx),
            BreedingPlan::Crossover {
                best,
                second,
                fitness_equal,
            } => agents[best]
                .genome()
                .crossover(agents[second].genome(), fitness_equal, ctx, rng),
        };

        if self.allow_mutation {
            genome.mutate(dead_agent.fitness(config), &self.mutation_config, ctx, rng);
        }
        genome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(allow_mutation: bool) -> EvolutionEngine {
        let mut config = Config::default();
        config.evolution.allow_mutation = allow_mutation;
        EvolutionEngine::from_config(&config)
    }

    #[test]
    fn test_plan_without_candidates_clones_dead() {
        let plan = engine(true).plan(&Parents::default());
        assert_eq!(plan, BreedingPlan::CloneDead);
    }

    #[test]
    fn test_plan_mutation_disabled_clones_dead() {
        let parents = Parents {
            best: Some((1, 0.5)),
            second: Some((2, 0.4)),
        };
        assert_eq!(engine(false).plan(&parents), BreedingPlan::CloneDead);
    }

    #[test]
    fn test_plan_single_candidate() {
        let parents = Parents {
            best: Some((4, 0.5)),
            second: None,
        };
        assert_eq!(engine(true).plan(&parents), BreedingPlan::Clone(4));
    }

    #[test]
    fn test_plan_exact_equality() {
        let equal = Parents {
            best: Some((1, 0.5)),
            second: Some((2, 0.5)),
        };
        let close = Parents {
            best: Some((1, 0.5)),
            second: Some((2, 0.5 - f32::EPSILON)),
        };
        assert!(matches!(
            engine(true).plan(&equal),
            BreedingPlan::Crossover { fitness_equal: true, .. }
        ));
        assert!(matches!(
            engine(true).plan(&close),
            BreedingPlan::Crossover { fitness_equal: false, .. }
        ));
    }

    #[test]
    fn test_toggle_mutation() {
        let mut engine = engine(true);
        assert!(!engine.toggle_mutation());
        assert!(engine.toggle_mutation());
    }
}
