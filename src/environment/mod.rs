//! The shared environment agents live in
//!
//! One `Environment` is constructed explicitly and handed (behind an `Arc`)
//! to every agent's controller; nothing is looked up globally. All mutating
//! entry points (`execute_action`, `add_agent`, `remove_agent`, `update`)
//! serialize on a single write lock, which is what makes multi-resource
//! allocation linearizable; `perceive` is read-only and runs concurrently
//! with other perceivers.

pub mod constraints;
pub mod dynamics;
pub mod events;
pub mod observability;
pub mod perception;
pub mod resources;
pub mod spatial;

pub use constraints::{Constraint, ConstraintCheck, ConstraintEngine, ConstraintKind};
pub use dynamics::{DynamicsRule, EnvironmentDynamics};
pub use events::{EnvironmentEvent, EventKind, EventLog};
pub use observability::VisibilityLevel;
pub use perception::{DynamicsView, EntityView, Perception};
pub use resources::{ResourceManager, ResourcePool, ResourceUsage};
pub use spatial::{Location, SpatialModel};

use crate::actions::{Action, ActionKind, ActionOutcome};
use crate::core::config::EnvironmentConfig;
use crate::core::error::{HabitatError, Result};
use crate::core::types::{AgentId, LifecycleState, Tick};
use ahash::AHashMap;
use constraints::ConstraintContext;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::RwLock;

/// The environment-side record of one agent's presence
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: AgentId,
    pub location: Location,
    pub state: LifecycleState,
    pub created_tick: Tick,
    pub visibility: VisibilityLevel,
}

/// Everything behind the lock
struct EnvState {
    tick: Tick,
    entities: AHashMap<AgentId, Entity>,
    spatial: SpatialModel,
    resources: ResourceManager,
    dynamics: EnvironmentDynamics,
    constraints: ConstraintEngine,
    events: EventLog,
    drift_rng: StdRng,
}

impl EnvState {
    /// Unfiltered entity views, allocations joined in from the manager
    fn raw_views(&self) -> Vec<EntityView> {
        self.entities
            .values()
            .map(|e| EntityView {
                id: e.id,
                location: e.location.clone(),
                state: e.state,
                allocations: self.resources.holdings(e.id),
                created_tick: e.created_tick,
            })
            .collect()
    }

    /// Full snapshot for one observer, filtered to its visibility level
    fn perception_for(&self, observer: &Entity, event_window: usize) -> Perception {
        let raw = Perception {
            observer: observer.id,
            tick: self.tick,
            entities: self.raw_views(),
            resources: self.resources.usage(),
            dynamics: DynamicsView {
                variables: self.dynamics.variables().clone(),
                time_of_day: self.dynamics.time_of_day(),
            },
            recent_events: self.events.recent(event_window),
        };
        observability::filter_perception(observer.id, &observer.location, observer.visibility, raw)
    }

    fn push_event(&mut self, kind: EventKind, source: Option<AgentId>, payload: serde_json::Value) {
        self.events.push(EnvironmentEvent {
            tick: self.tick,
            kind,
            source,
            payload,
        });
    }
}

/// Façade over all environment subsystems
pub struct Environment {
    config: EnvironmentConfig,
    state: RwLock<EnvState>,
}

impl Environment {
    pub fn new(config: EnvironmentConfig, seed: u64) -> Self {
        let walk_max = config.dynamics_walk_max;
        let capacity = config.event_log_capacity;
        Self {
            config,
            state: RwLock::new(EnvState {
                tick: 0,
                entities: AHashMap::new(),
                spatial: SpatialModel::new(),
                resources: ResourceManager::new(),
                dynamics: EnvironmentDynamics::new(walk_max, seed).with_default_rules(),
                constraints: ConstraintEngine::new(),
                events: EventLog::new(capacity),
                drift_rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            }),
        }
    }

    /// Register a resource pool
    pub fn add_resource_pool(&self, pool: ResourcePool) {
        self.state.write().unwrap().resources.add_pool(pool);
    }

    /// Declare a system constraint
    pub fn add_constraint(&self, constraint: Constraint) {
        self.state.write().unwrap().constraints.add(constraint);
    }

    /// Replace the dynamics rule list
    pub fn set_dynamics_rules(&self, rules: Vec<DynamicsRule>) {
        self.state.write().unwrap().dynamics.set_rules(rules);
    }

    /// Admit a new agent at a location with a fixed visibility level
    pub fn add_agent(&self, location: Location, visibility: VisibilityLevel) -> AgentId {
        let id = AgentId::new();
        let mut state = self.state.write().unwrap();
        let tick = state.tick;
        state.spatial.set_location(id, location.clone());
        state.entities.insert(
            id,
            Entity {
                id,
                location,
                state: LifecycleState::Active,
                created_tick: tick,
                visibility,
            },
        );
        state.push_event(EventKind::AgentAdded, Some(id), serde_json::Value::Null);
        tracing::info!(agent = %id, "agent admitted");
        id
    }

    /// Remove an agent, releasing everything it holds
    pub fn remove_agent(&self, id: AgentId) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.entities.remove(&id).is_none() {
            return Err(HabitatError::AgentNotFound(id));
        }
        state.spatial.remove(id);
        state.resources.release_all(id);
        state.push_event(EventKind::AgentRemoved, Some(id), serde_json::Value::Null);
        tracing::info!(agent = %id, "agent removed");
        Ok(())
    }

    /// Whether an agent is currently admitted
    pub fn contains(&self, id: AgentId) -> bool {
        self.state.read().unwrap().entities.contains_key(&id)
    }

    /// Current tick counter
    pub fn tick(&self) -> Tick {
        self.state.read().unwrap().tick
    }

    /// Visibility-filtered snapshot for one agent
    ///
    /// Read-only: concurrent perceivers never block each other.
    pub fn perceive(&self, agent: AgentId) -> Result<Perception> {
        let state = self.state.read().unwrap();
        let observer = state
            .entities
            .get(&agent)
            .ok_or(HabitatError::AgentNotFound(agent))?;
        Ok(state.perception_for(observer, self.config.perception_event_window))
    }

    /// Check constraints, then dispatch one action by kind
    ///
    /// Every failure is reported as an `ActionOutcome` value; the only
    /// `Err` is an unknown caller.
    pub fn execute_action(&self, agent: AgentId, action: &Action) -> Result<ActionOutcome> {
        let mut state = self.state.write().unwrap();
        if !state.entities.contains_key(&agent) {
            return Err(HabitatError::AgentNotFound(agent));
        }

        // Constraint gate: nothing mutates on a violation
        let usage = state.resources.usage();
        let location = state.entities.get(&agent).map(|e| e.location.clone());
        let verdict = state.constraints.check(
            action,
            &ConstraintContext {
                agent,
                location: location.as_ref(),
                usage: &usage,
            },
        );
        if !verdict.passed {
            tracing::debug!(agent = %agent, kind = %action.kind, violations = ?verdict.violations,
                "action rejected by constraints");
            return Ok(ActionOutcome::Rejected {
                violations: verdict.violations,
            });
        }

        let Some(kind) = ActionKind::parse(&action.kind) else {
            return Ok(ActionOutcome::Unsupported {
                kind: action.kind.clone(),
            });
        };

        let outcome = match kind {
            ActionKind::AllocateResource => match action.resource_amounts() {
                Some(amounts) => match state.resources.request(agent, &amounts) {
                    Ok(()) => {
                        state.push_event(
                            EventKind::ResourcesAllocated,
                            Some(agent),
                            serde_json::json!({ "resources": amounts }),
                        );
                        ActionOutcome::Completed
                    }
                    Err(err) => ActionOutcome::InsufficientResources {
                        shortfalls: err.shortfalls,
                    },
                },
                None => ActionOutcome::Malformed {
                    reason: "allocate_resource requires a resources map".into(),
                },
            },
            ActionKind::ReleaseResource => match action.resource_amounts() {
                Some(amounts) => {
                    state.resources.release(agent, &amounts);
                    state.push_event(
                        EventKind::ResourcesReleased,
                        Some(agent),
                        serde_json::json!({ "resources": amounts }),
                    );
                    ActionOutcome::Completed
                }
                None => ActionOutcome::Malformed {
                    reason: "release_resource requires a resources map".into(),
                },
            },
            ActionKind::Move => match action.destination() {
                Some(destination) => {
                    state.spatial.set_location(agent, destination.clone());
                    if let Some(entity) = state.entities.get_mut(&agent) {
                        entity.location = destination.clone();
                    }
                    state.push_event(
                        EventKind::AgentMoved,
                        Some(agent),
                        serde_json::json!({ "to": destination }),
                    );
                    ActionOutcome::Completed
                }
                None => ActionOutcome::Malformed {
                    reason: "move requires a location payload".into(),
                },
            },
            ActionKind::Communicate => {
                let Some(target) = action.target_agent() else {
                    return Ok(ActionOutcome::Malformed {
                        reason: "communicate requires an agent-id target".into(),
                    });
                };
                // An agent cannot address an entity it cannot see: the check
                // runs against the caller's own filtered perception
                let observer = state.entities.get(&agent).cloned();
                let visible = observer
                    .map(|o| {
                        state
                            .perception_for(&o, self.config.perception_event_window)
                            .sees(target)
                    })
                    .unwrap_or(false);
                if !visible {
                    ActionOutcome::TargetNotVisible {
                        target: target.to_string(),
                    }
                } else {
                    state.push_event(
                        EventKind::Communication,
                        Some(agent),
                        serde_json::json!({
                            "to": target,
                            "message": action.content.get("message").cloned()
                                .unwrap_or(serde_json::Value::Null),
                        }),
                    );
                    ActionOutcome::Completed
                }
            }
        };
        Ok(outcome)
    }

    /// Advance environment time: dynamics tick, event drain, resource drift
    pub fn update(&self, delta_time: f64) {
        let mut state = self.state.write().unwrap();
        state.tick += 1;
        let delta_hours = delta_time * self.config.hours_per_time_unit;
        let firings = state.dynamics.update(delta_hours);
        for firing in firings {
            state.push_event(
                EventKind::DynamicsRuleFired,
                None,
                serde_json::json!({ "rule": firing.rule, "adjusted": firing.adjusted }),
            );
        }
        let drift_max = self.config.resource_drift_max;
        // Split borrow: the RNG and the pools live in the same state struct
        let EnvState {
            resources,
            drift_rng,
            ..
        } = &mut *state;
        resources.drift_used(drift_rng, drift_max);
    }

    /// Per-pool observable resource state
    pub fn resource_usage(&self) -> AHashMap<String, ResourceUsage> {
        self.state.read().unwrap().resources.usage()
    }

    /// Other live agents within `radius` of `agent`
    pub fn neighbors(&self, agent: AgentId, radius: f64) -> Vec<AgentId> {
        self.state.read().unwrap().spatial.neighbors_within(agent, radius)
    }

    /// Wire two agents into the explicit connection topology
    pub fn add_connection(&self, a: AgentId, b: AgentId) {
        self.state.write().unwrap().spatial.add_connection(a, b);
    }

    /// Explicit connections of one agent
    pub fn connections_of(&self, agent: AgentId) -> Vec<AgentId> {
        self.state.read().unwrap().spatial.connections_of(agent)
    }
}
