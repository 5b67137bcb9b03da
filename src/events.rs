//! Deferred per-tick event queue.
//!
//! Components push events while the tick runs; the world drains the whole
//! batch once every component has updated, so nothing reacts mid-scan.

use crate::ecology::ResourceKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimEvent {
    /// An agent died and its slot needs a new genome
    AgentDied { slot: usize },
    /// A resource was eaten or expired and can return to its pool
    ResourceDepleted { kind: ResourceKind, index: usize },
}

#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    pending: Vec<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    /// Take every queued event, oldest first
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
