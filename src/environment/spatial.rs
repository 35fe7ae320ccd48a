//! Spatial placement and tiered distance between agent locations
//!
//! Distance is deliberately not Euclidean-by-default: agents live on hosts,
//! inside processes, under hierarchical namespaces. Two agents on different
//! hosts are effectively unreachable regardless of any coordinates they
//! carry, so the metric is tiered from the outside in.

use crate::core::types::AgentId;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// Fixed penalty for locations on different hosts (environment-unreachable)
pub const HOST_DISTANCE: f64 = 1000.0;

/// Fixed penalty for locations in different processes on the same host
pub const PROCESS_DISTANCE: f64 = 100.0;

/// Cost per step of namespace divergence within the same process
pub const NAMESPACE_STEP_DISTANCE: f64 = 10.0;

/// Where an agent resides in the environment
///
/// Immutable once issued to an entity; a `move` action replaces the whole
/// record rather than mutating it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub host: String,
    pub process: Option<String>,
    /// Hierarchical namespace path, `/`-separated (e.g. `services/search/indexer`)
    pub namespace: String,
    /// Optional numeric coordinates, keyed by axis name
    pub coordinates: Option<AHashMap<String, f64>>,
}

impl Location {
    pub fn new(host: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            process: None,
            namespace: namespace.into(),
            coordinates: None,
        }
    }

    pub fn with_process(mut self, process: impl Into<String>) -> Self {
        self.process = Some(process.into());
        self
    }

    pub fn with_coordinates(mut self, coords: impl IntoIterator<Item = (String, f64)>) -> Self {
        self.coordinates = Some(coords.into_iter().collect());
        self
    }

    /// Non-empty namespace segments, in order
    pub fn namespace_segments(&self) -> Vec<&str> {
        self.namespace.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// First namespace segment, used for isolation and namespace-level visibility
    pub fn top_namespace(&self) -> &str {
        self.namespace_segments().first().copied().unwrap_or("")
    }

    /// Tiered distance between two locations
    ///
    /// Not a true metric: the triangle inequality can fail across tiers.
    /// It is symmetric, which is all the neighbor queries rely on.
    pub fn distance(&self, other: &Location) -> f64 {
        if self.host != other.host {
            return HOST_DISTANCE;
        }
        if self.process != other.process {
            return PROCESS_DISTANCE;
        }
        if self.namespace != other.namespace {
            let a = self.namespace_segments();
            let b = other.namespace_segments();
            let common = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
            return NAMESPACE_STEP_DISTANCE * (a.len() + b.len() - 2 * common) as f64;
        }
        match (&self.coordinates, &other.coordinates) {
            (None, None) => 0.0,
            (a, b) => {
                let empty = AHashMap::new();
                let a = a.as_ref().unwrap_or(&empty);
                let b = b.as_ref().unwrap_or(&empty);
                let keys: AHashSet<&String> = a.keys().chain(b.keys()).collect();
                keys.into_iter()
                    .map(|k| {
                        let d = a.get(k).copied().unwrap_or(0.0) - b.get(k).copied().unwrap_or(0.0);
                        d * d
                    })
                    .sum::<f64>()
                    .sqrt()
            }
        }
    }
}

/// Tracks entity locations and an explicit connection topology
///
/// The connection graph is independent of distance: neighbors-by-distance
/// answers "who is nearby", connections answer "who is wired to whom" for
/// topology-aware operations such as broadcast.
#[derive(Debug, Default)]
pub struct SpatialModel {
    locations: AHashMap<AgentId, Location>,
    connections: AHashMap<AgentId, AHashSet<AgentId>>,
}

impl SpatialModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place (or re-place) an entity; a move replaces the location wholesale
    pub fn set_location(&mut self, id: AgentId, location: Location) {
        self.locations.insert(id, location);
    }

    pub fn location(&self, id: AgentId) -> Option<&Location> {
        self.locations.get(&id)
    }

    /// Drop an entity's location and every connection touching it
    pub fn remove(&mut self, id: AgentId) {
        self.locations.remove(&id);
        if let Some(peers) = self.connections.remove(&id) {
            for peer in peers {
                if let Some(set) = self.connections.get_mut(&peer) {
                    set.remove(&id);
                }
            }
        }
    }

    /// Distance between two tracked entities, if both are placed
    pub fn distance_between(&self, a: AgentId, b: AgentId) -> Option<f64> {
        Some(self.locations.get(&a)?.distance(self.locations.get(&b)?))
    }

    /// All other tracked entities within `radius` of `id`
    pub fn neighbors_within(&self, id: AgentId, radius: f64) -> Vec<AgentId> {
        let Some(origin) = self.locations.get(&id) else {
            return Vec::new();
        };
        self.locations
            .iter()
            .filter(|(other, _)| **other != id)
            .filter(|(_, loc)| origin.distance(loc) <= radius)
            .map(|(other, _)| *other)
            .collect()
    }

    /// Add an undirected connection between two entities
    pub fn add_connection(&mut self, a: AgentId, b: AgentId) {
        if a == b {
            return;
        }
        self.connections.entry(a).or_default().insert(b);
        self.connections.entry(b).or_default().insert(a);
    }

    /// Entities explicitly connected to `id`
    pub fn connections_of(&self, id: AgentId) -> Vec<AgentId> {
        self.connections
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}
