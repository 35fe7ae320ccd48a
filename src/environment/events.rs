//! Environment event records and the bounded event log

use crate::core::types::{AgentId, Tick};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What happened in the environment, visible to agents through perception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    AgentAdded,
    AgentRemoved,
    AgentMoved,
    ResourcesAllocated,
    ResourcesReleased,
    Communication,
    DynamicsRuleFired,
}

/// A single append-only event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentEvent {
    pub tick: Tick,
    pub kind: EventKind,
    pub source: Option<AgentId>,
    pub payload: serde_json::Value,
}

/// Bounded ring buffer of recent events
///
/// Once capacity is reached the oldest entries are evicted. Agents only
/// ever observe the tail window through perception, never the whole log.
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<EnvironmentEvent>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, event: EnvironmentEvent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    /// The most recent `n` events, oldest first
    pub fn recent(&self, n: usize) -> Vec<EnvironmentEvent> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
