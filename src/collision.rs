//! Collidable bodies and the category-indexed registry used for scans.

use crate::ecology::ResourceKind;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a body in the [`Bodies`] arena
pub type BodyId = usize;

/// Registry category a body can be listed under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Water,
    Agent,
    Predator,
    Prey,
}

/// What a body belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    /// Agent population slot
    Agent(usize),
    /// Resource index inside the pool of its kind
    Resource(ResourceKind, usize),
}

/// A circle in the world
#[derive(Clone, Debug)]
pub struct Body {
    pub position: Vec2,
    pub radius: f32,
    pub collision_active: bool,
    pub owner: Owner,
}

impl Body {
    pub fn new(owner: Owner, radius: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            radius,
            collision_active: false,
            owner,
        }
    }

    /// True if the two circles overlap
    #[inline]
    pub fn touches(&self, other: &Body) -> bool {
        self.position.distance(other.position) < self.radius + other.radius
    }
}

/// Dense storage for every body in the world
#[derive(Clone, Debug, Default)]
pub struct Bodies {
    bodies: Vec<Body>,
}

impl Bodies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: Body) -> BodyId {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    #[inline]
    pub fn get(&self, id: BodyId) -> &Body {
        &self.bodies[id]
    }

    #[inline]
    pub fn get_mut(&mut self, id: BodyId) -> &mut Body {
        &mut self.bodies[id]
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Category to body lookup.
///
/// Membership is fixed once a body is registered; activation only flips
/// [`Body::collision_active`], so scans never see the lists change.
#[derive(Clone, Debug, Default)]
pub struct CollisionRegistry {
    lists: HashMap<Category, Vec<BodyId>>,
}

impl CollisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// List `body` under each of `categories`
    pub fn register(&mut self, body: BodyId, categories: &[Category]) {
        for &category in categories {
            let list = self.lists.entry(category).or_default();
            if !list.contains(&body) {
                list.push(body);
            }
        }
    }

    /// Remove `body` from every category
    pub fn unregister(&mut self, body: BodyId) {
        for list in self.lists.values_mut() {
            list.retain(|&id| id != body);
        }
    }

    /// Every body registered under `category`, in registration order
    pub fn members(&self, category: Category) -> &[BodyId] {
        self.lists.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Members of `category` whose collision is active
    pub fn active<'a>(&'a self, category: Category, bodies: &'a Bodies) -> impl Iterator<Item = BodyId> + 'a {
        self.members(category)
            .iter()
            .copied()
            .filter(move |&id| bodies.get(id).collision_active)
    }
}

/// Rectangle the world lives in, anchored at the origin
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Largest possible distance between two points (the diagonal)
    pub fn max_distance(&self) -> f32 {
        Vec2::new(self.width, self.height).length()
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(rng.gen_range(0.0..=self.width), rng.gen_range(0.0..=self.height))
    }
}
