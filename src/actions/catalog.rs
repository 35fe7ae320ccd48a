//! Action records and the kind catalog
//!
//! An action's kind stays a plain string on the record: rule templates and
//! deliberative output both produce kinds freely, and only execution needs
//! to care whether the environment understands one. `ActionKind::parse`
//! resolves the environment-dispatchable subset; everything else flows to
//! the outbound dispatcher untouched, or comes back `Unsupported` if it is
//! handed to the environment anyway.

use crate::core::types::{AgentId, ProcessingMode};
use crate::environment::resources::Shortfall;
use crate::environment::spatial::Location;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Action kinds the environment can execute directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    AllocateResource,
    ReleaseResource,
    Move,
    Communicate,
}

impl ActionKind {
    /// Resolve a wire-form kind string against the catalog
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allocate_resource" => Some(Self::AllocateResource),
            "release_resource" => Some(Self::ReleaseResource),
            "move" => Some(Self::Move),
            "communicate" => Some(Self::Communicate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllocateResource => "allocate_resource",
            Self::ReleaseResource => "release_resource",
            Self::Move => "move",
            Self::Communicate => "communicate",
        }
    }
}

/// A well-formed outbound action record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Wire-form kind, e.g. `communicate`, `inform`, `allocate_resource`
    #[serde(rename = "type")]
    pub kind: String,
    /// Addressee or object of the action, when there is one
    pub target: Option<String>,
    /// Kind-specific payload
    #[serde(default)]
    pub content: serde_json::Value,
    /// How sure the producing path is of this action, in [0, 1]
    pub confidence: f64,
    /// Which decision path produced it
    pub processing_mode: Option<ProcessingMode>,
    /// Name of the reflexive rule that fired, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    /// Id of the stimulus that triggered it, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<String>,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            content: serde_json::Value::Null,
            confidence: 1.0,
            processing_mode: None,
            rule_name: None,
            triggered_by: None,
        }
    }

    pub fn allocate(resources: &AHashMap<String, f64>) -> Self {
        let mut action = Self::new(ActionKind::AllocateResource.as_str());
        action.content = serde_json::json!({ "resources": resources.clone() });
        action
    }

    pub fn release(resources: &AHashMap<String, f64>) -> Self {
        let mut action = Self::new(ActionKind::ReleaseResource.as_str());
        action.content = serde_json::json!({ "resources": resources.clone() });
        action
    }

    pub fn move_to(location: &Location) -> Self {
        let mut action = Self::new(ActionKind::Move.as_str());
        action.content = serde_json::json!({ "location": location });
        action
    }

    pub fn communicate(target: AgentId, message: serde_json::Value) -> Self {
        let mut action = Self::new(ActionKind::Communicate.as_str());
        action.target = Some(target.to_string());
        action.content = serde_json::json!({ "message": message });
        action
    }

    /// Resource amounts carried by an allocate/release payload
    pub fn resource_amounts(&self) -> Option<AHashMap<String, f64>> {
        let map = self.content.get("resources")?.as_object()?;
        let mut amounts = AHashMap::new();
        for (name, value) in map {
            amounts.insert(name.clone(), value.as_f64()?);
        }
        Some(amounts)
    }

    /// Destination carried by a move payload
    pub fn destination(&self) -> Option<Location> {
        serde_json::from_value(self.content.get("location")?.clone()).ok()
    }

    /// Target parsed as an agent id
    pub fn target_agent(&self) -> Option<AgentId> {
        self.target
            .as_deref()
            .and_then(|t| uuid::Uuid::parse_str(t).ok())
            .map(AgentId)
    }
}

/// Result of asking the environment to execute an action
///
/// Every failure path is a value; execution never panics on agent input.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Completed,
    /// One or more declared constraints rejected the action; nothing mutated
    Rejected { violations: Vec<String> },
    /// Atomic allocation failed; nothing mutated
    InsufficientResources { shortfalls: Vec<Shortfall> },
    /// The kind is not in the environment catalog
    Unsupported { kind: String },
    /// The kind is known but the payload is unusable
    Malformed { reason: String },
    /// A communicate action addressed an entity outside the caller's own
    /// filtered perception
    TargetNotVisible { target: String },
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }
}
