//! Consumable world resources.
//!
//! Food and water are pooled: a fixed set of bodies is allocated up front
//! and recycled as items are eaten or expire.

pub mod resources;

pub use resources::{Resource, ResourceKind, ResourcePool, ResourcePools};
