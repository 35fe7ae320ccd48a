//! Fixed-size resource pools with atomic multi-resource allocation
//!
//! Pools carry two kinds of load: `used` (organic background load the
//! environment drifts on its own) and `allocated` (amounts reserved by
//! agents). The pool invariant `used + allocated <= total` holds at every
//! observable instant; `request` is all-or-nothing across every resource
//! named in the request.

use crate::core::types::AgentId;
use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single named pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePool {
    pub name: String,
    pub total: f64,
    pub used: f64,
    pub allocated: f64,
}

impl ResourcePool {
    pub fn new(name: impl Into<String>, total: f64) -> Self {
        Self {
            name: name.into(),
            total,
            used: 0.0,
            allocated: 0.0,
        }
    }

    /// Capacity not consumed by organic load
    pub fn available(&self) -> f64 {
        self.total - self.used
    }

    /// Fraction of total capacity committed, organic plus reserved
    pub fn utilization(&self) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        (self.used + self.allocated) / self.total
    }

    /// Headroom a new allocation can draw from
    fn headroom(&self) -> f64 {
        self.total - self.used - self.allocated
    }
}

/// Observable snapshot of one pool, the only window into resource state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub total: f64,
    pub used: f64,
    pub allocated: f64,
    pub available: f64,
    pub utilization: f64,
}

/// One resource that could not satisfy a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub resource: String,
    pub requested: f64,
    pub headroom: f64,
}

/// All-or-nothing request failure: nothing was allocated
#[derive(Error, Debug, Clone, PartialEq)]
#[error("insufficient resources: {shortfalls:?}")]
pub struct InsufficientResources {
    pub shortfalls: Vec<Shortfall>,
}

/// Owns every pool and every per-agent allocation
///
/// No other component reads or writes pool state directly; `usage()` is the
/// observation window and `request`/`release` are the only mutations agents
/// can cause. Serialization of concurrent callers is the owning
/// `Environment`'s job (one write lock around all mutating entry points).
#[derive(Debug, Default)]
pub struct ResourceManager {
    pools: AHashMap<String, ResourcePool>,
    allocations: AHashMap<AgentId, AHashMap<String, f64>>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool; replaces any existing pool of the same name
    pub fn add_pool(&mut self, pool: ResourcePool) {
        self.pools.insert(pool.name.clone(), pool);
    }

    /// Atomically reserve every requested amount, or nothing at all
    ///
    /// Verifies headroom for every named resource first; a single failing
    /// check aborts the whole request with the full shortfall list and no
    /// partial allocation. Unknown resource names count as shortfalls with
    /// zero headroom.
    pub fn request(
        &mut self,
        agent: AgentId,
        wanted: &AHashMap<String, f64>,
    ) -> Result<(), InsufficientResources> {
        let mut shortfalls = Vec::new();
        for (name, &amount) in wanted {
            if amount < 0.0 {
                shortfalls.push(Shortfall {
                    resource: name.clone(),
                    requested: amount,
                    headroom: 0.0,
                });
                continue;
            }
            match self.pools.get(name) {
                Some(pool) if pool.headroom() >= amount => {}
                Some(pool) => shortfalls.push(Shortfall {
                    resource: name.clone(),
                    requested: amount,
                    headroom: pool.headroom(),
                }),
                None => shortfalls.push(Shortfall {
                    resource: name.clone(),
                    requested: amount,
                    headroom: 0.0,
                }),
            }
        }
        if !shortfalls.is_empty() {
            return Err(InsufficientResources { shortfalls });
        }

        // Every check passed: commit all of it
        let held = self.allocations.entry(agent).or_default();
        for (name, &amount) in wanted {
            if amount == 0.0 {
                continue;
            }
            // Pool presence was verified above
            if let Some(pool) = self.pools.get_mut(name) {
                pool.allocated += amount;
                *held.entry(name.clone()).or_insert(0.0) += amount;
            }
        }
        Ok(())
    }

    /// Return reserved amounts to their pools
    ///
    /// Each release is clamped to what the agent actually holds, so
    /// `allocated` can never go below zero; fully released entries are
    /// dropped from the agent's holding map.
    pub fn release(&mut self, agent: AgentId, amounts: &AHashMap<String, f64>) {
        let Some(held) = self.allocations.get_mut(&agent) else {
            return;
        };
        for (name, &amount) in amounts {
            let Some(current) = held.get_mut(name) else {
                continue;
            };
            let freed = amount.max(0.0).min(*current);
            *current -= freed;
            if let Some(pool) = self.pools.get_mut(name) {
                pool.allocated = (pool.allocated - freed).max(0.0);
            }
            if *current <= 0.0 {
                held.remove(name);
            }
        }
        if held.is_empty() {
            self.allocations.remove(&agent);
        }
    }

    /// Release everything an agent holds (agent removal path)
    pub fn release_all(&mut self, agent: AgentId) {
        if let Some(held) = self.allocations.remove(&agent) {
            for (name, amount) in held {
                if let Some(pool) = self.pools.get_mut(&name) {
                    pool.allocated = (pool.allocated - amount).max(0.0);
                }
            }
        }
    }

    /// Per-pool observable state
    pub fn usage(&self) -> AHashMap<String, ResourceUsage> {
        self.pools
            .iter()
            .map(|(name, pool)| {
                (
                    name.clone(),
                    ResourceUsage {
                        total: pool.total,
                        used: pool.used,
                        allocated: pool.allocated,
                        available: pool.available(),
                        utilization: pool.utilization(),
                    },
                )
            })
            .collect()
    }

    /// What one agent currently holds
    pub fn holdings(&self, agent: AgentId) -> AHashMap<String, f64> {
        self.allocations.get(&agent).cloned().unwrap_or_default()
    }

    /// Apply organic background drift to each pool's `used` load
    ///
    /// Each pool moves by a uniform step in [-max_step, +max_step], clamped
    /// so the pool invariant survives: `0 <= used <= total - allocated`.
    pub fn drift_used<R: Rng>(&mut self, rng: &mut R, max_step: f64) {
        if max_step <= 0.0 {
            return;
        }
        for pool in self.pools.values_mut() {
            let step = rng.gen_range(-max_step..=max_step);
            pool.used = (pool.used + step).clamp(0.0, pool.total - pool.allocated);
        }
    }

    /// Invariant check used by tests and debug assertions
    pub fn invariant_holds(&self) -> bool {
        self.pools
            .values()
            .all(|p| p.used + p.allocated <= p.total + 1e-9 && p.used >= 0.0 && p.allocated >= 0.0)
    }
}
