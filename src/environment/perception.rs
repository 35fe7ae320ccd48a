//! Perception snapshots - what an agent is shown of the environment
//!
//! A perception is recomputed on every call and never mutated afterwards.
//! Entity views are the part subject to visibility filtering; resource and
//! dynamics sections are system-wide signals shown to everyone.

use crate::core::types::{AgentId, LifecycleState, Tick};
use crate::environment::events::EnvironmentEvent;
use crate::environment::resources::ResourceUsage;
use crate::environment::spatial::Location;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// One visible entity as seen through perception
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub id: AgentId,
    pub location: Location,
    pub state: LifecycleState,
    pub allocations: AHashMap<String, f64>,
    pub created_tick: Tick,
}

/// Snapshot of the dynamic state variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicsView {
    pub variables: AHashMap<String, f64>,
    pub time_of_day: f64,
}

/// A filtered snapshot of the environment for one observer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perception {
    pub observer: AgentId,
    pub tick: Tick,
    pub entities: Vec<EntityView>,
    pub resources: AHashMap<String, ResourceUsage>,
    pub dynamics: DynamicsView,
    pub recent_events: Vec<EnvironmentEvent>,
}

impl Perception {
    /// Whether a given entity survived filtering into this snapshot
    pub fn sees(&self, id: AgentId) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    /// Visible entities other than the observer
    pub fn peers(&self) -> impl Iterator<Item = &EntityView> {
        self.entities.iter().filter(move |e| e.id != self.observer)
    }
}
