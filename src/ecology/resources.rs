//! Food and water pools: timed spawning, expiry and consumption.

use crate::collision::{Bodies, Body, BodyId, Category, CollisionRegistry, Owner, WorldBounds};
use crate::config::ResourceConfig;
use crate::events::{EventQueue, SimEvent};
use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Restores hunger
    Food,
    /// Restores thirst
    Water,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Food, ResourceKind::Water];

    pub fn category(self) -> Category {
        match self {
            ResourceKind::Food => Category::Food,
            ResourceKind::Water => Category::Water,
        }
    }
}

/// One consumable item
#[derive(Clone, Debug)]
pub struct Resource {
    body: BodyId,
    time_active: f32,
    active: bool,
}

impl Resource {
    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Pool of one resource kind
#[derive(Clone, Debug)]
pub struct ResourcePool {
    kind: ResourceKind,
    resources: Vec<Resource>,
    active: Vec<usize>,
    inactive: Vec<usize>,
    spawn_interval: f32,
    next_spawn: f32,
    yield_amount: f32,
}

impl ResourcePool {
    fn new(kind: ResourceKind, spawn_interval: f32, yield_amount: f32) -> Self {
        Self {
            kind,
            resources: Vec::new(),
            active: Vec::new(),
            inactive: Vec::new(),
            spawn_interval,
            next_spawn: spawn_interval,
            yield_amount,
        }
    }

    /// Allocate a new inactive resource and return its index
    fn grow(&mut self, size: f32, bodies: &mut Bodies, registry: &mut CollisionRegistry) -> usize {
        let index = self.resources.len();
        let body = bodies.insert(Body::new(Owner::Resource(self.kind, index), size));
        registry.register(body, &[self.kind.category()]);
        self.resources.push(Resource {
            body,
            time_active: 0.0,
            active: false,
        });
        index
    }

    fn spawn<R: Rng>(
        &mut self,
        size: f32,
        bodies: &mut Bodies,
        registry: &mut CollisionRegistry,
        bounds: &WorldBounds,
        rng: &mut R,
    ) {
        let index = match self.inactive.pop() {
            Some(index) => index,
            None => self.grow(size, bodies, registry),
        };
        let resource = &mut self.resources[index];
        resource.time_active = 0.0;
        resource.active = true;

        let body = bodies.get_mut(resource.body);
        body.position = bounds.random_point(rng);
        body.collision_active = true;
        self.active.push(index);
        trace!("{:?} {} spawned at {:?}", self.kind, index, body.position);
    }

    fn deactivate(&mut self, index: usize, bodies: &mut Bodies, events: &mut EventQueue) -> bool {
        let resource = &mut self.resources[index];
        if !resource.active {
            return false;
        }
        resource.active = false;
        bodies.get_mut(resource.body).collision_active = false;
        events.push(SimEvent::ResourceDepleted { kind: self.kind, index });
        true
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }
}

/// Both resource pools and the shared spawn clock
#[derive(Clone, Debug)]
pub struct ResourcePools {
    food: ResourcePool,
    water: ResourcePool,
    time: f32,
    lifetime: f32,
    size: f32,
}

impl ResourcePools {
    /// Pre-allocate `pool_size` inactive resources of each kind
    pub fn new(config: &ResourceConfig, bodies: &mut Bodies, registry: &mut CollisionRegistry) -> Self {
        let mut pools = Self {
            food: ResourcePool::new(ResourceKind::Food, config.food_spawn_interval, config.food_yield),
            water: ResourcePool::new(ResourceKind::Water, config.water_spawn_interval, config.water_yield),
            time: 0.0,
            lifetime: config.lifetime,
            size: config.size,
        };
        for kind in ResourceKind::ALL {
            let size = pools.size;
            let pool = pools.pool_mut(kind);
            for _ in 0..config.pool_size {
                let index = pool.grow(size, bodies, registry);
                pool.inactive.push(index);
            }
        }
        pools
    }

    /// Spawn on schedule and expire resources that outlived their lifetime
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        bodies: &mut Bodies,
        registry: &mut CollisionRegistry,
        events: &mut EventQueue,
        bounds: &WorldBounds,
        rng: &mut R,
    ) {
        self.time += dt;
        let (time, lifetime, size) = (self.time, self.lifetime, self.size);

        for kind in ResourceKind::ALL {
            let pool = self.pool_mut(kind);
            if time > pool.next_spawn {
                pool.next_spawn = time + pool.spawn_interval;
                pool.spawn(size, bodies, registry, bounds, rng);
            }

            for i in 0..pool.active.len() {
                let index = pool.active[i];
                let resource = &mut pool.resources[index];
                if !resource.active {
                    continue;
                }
                resource.time_active += dt;
                if resource.time_active >= lifetime {
                    pool.deactivate(index, bodies, events);
                }
            }
        }
    }

    /// Consume a resource on contact. Returns its yield if it was still active.
    pub fn consume(
        &mut self,
        kind: ResourceKind,
        index: usize,
        bodies: &mut Bodies,
        events: &mut EventQueue,
    ) -> Option<f32> {
        let pool = self.pool_mut(kind);
        pool.deactivate(index, bodies, events).then_some(pool.yield_amount)
    }

    /// Return a depleted resource to its inactive list
    pub fn recycle(&mut self, kind: ResourceKind, index: usize) {
        let pool = self.pool_mut(kind);
        if let Some(pos) = pool.active.iter().position(|&i| i == index) {
            pool.active.remove(pos);
            pool.inactive.push(index);
        }
    }

    pub fn pool(&self, kind: ResourceKind) -> &ResourcePool {
        match kind {
            ResourceKind::Food => &self.food,
            ResourceKind::Water => &self.water,
        }
    }

    fn pool_mut(&mut self, kind: ResourceKind) -> &mut ResourcePool {
        match kind {
            ResourceKind::Food => &mut self.food,
            ResourceKind::Water => &mut self.water,
        }
    }

    /// Resources currently in the world, counted from the active flag
    pub fn active_count(&self, kind: ResourceKind) -> usize {
        self.pool(kind).resources.iter().filter(|r| r.active).count()
    }
}
