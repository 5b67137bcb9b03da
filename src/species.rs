//! Per-species behaviour table.

use crate::collision::Category;
use crate::neural::{MAX_INPUTS, NUM_STATUS_INPUTS};
use crate::perception::VISION_CONES;
use serde::{Deserialize, Serialize};

/// Concrete agent species
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Plain forager that sees food, water and every other agent
    Agent,
    Predator,
    Prey,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Agent, Species::Predator, Species::Prey];

    /// Categories scanned for perception, one input block each, in block order
    pub fn perceives(self) -> &'static [Category] {
        match self {
            Species::Agent => &[Category::Food, Category::Water, Category::Agent],
            Species::Predator => &[Category::Water, Category::Prey],
            Species::Prey => &[Category::Food, Category::Water, Category::Predator],
        }
    }

    /// Categories scanned for contacts, in scan order
    pub fn collides_with(self) -> &'static [Category] {
        match self {
            Species::Agent | Species::Prey => &[Category::Water, Category::Food, Category::Agent],
            Species::Predator => &[Category::Water, Category::Agent],
        }
    }

    /// Registry categories an agent of this species is listed under
    pub fn categories(self) -> &'static [Category] {
        match self {
            Species::Agent => &[Category::Agent],
            Species::Predator => &[Category::Agent, Category::Predator],
            Species::Prey => &[Category::Agent, Category::Prey],
        }
    }

    /// Network input count: one block per perceived category plus status
    pub fn num_inputs(self) -> usize {
        let inputs = self.perceives().len() * VISION_CONES + NUM_STATUS_INPUTS;
        debug_assert!(inputs <= MAX_INPUTS);
        inputs
    }

    /// True if `self` hunts `other`
    pub fn eats(self, other: Species) -> bool {
        matches!((self, other), (Species::Predator, Species::Prey))
    }

    /// Persisted species flag
    pub fn is_prey(self) -> bool {
        self != Species::Predator
    }

    /// Species for a persisted genome under the given population layout
    pub fn from_prey_flag(is_prey: bool, predator_prey: bool) -> Self {
        match (predator_prey, is_prey) {
            (false, _) => Species::Agent,
            (true, true) => Species::Prey,
            (true, false) => Species::Predator,
        }
    }

    /// Name used for logs and fitness files
    pub fn tag(self) -> &'static str {
        match self {
            Species::Agent => "agent",
            Species::Predator => "predator",
            Species::Prey => "prey",
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
