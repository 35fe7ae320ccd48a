//! Pre-action constraint checking
//!
//! Constraints are declared against the environment, never owned by agents.
//! They are advisory-blocking: a violation aborts the action before any
//! state mutates and reports the violated names back to the caller. A
//! constraint check never raises, and there is no partial application.

use crate::actions::{Action, ActionKind};
use crate::core::types::AgentId;
use crate::environment::resources::ResourceUsage;
use crate::environment::spatial::Location;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Broad category of a constraint, for reporting and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    ResourceLimit,
    Policy,
    Threshold,
    Isolation,
}

/// The interpretable predicate of a constraint
///
/// A tagged variant rather than a closure so constraint sets can be
/// declared in data and inspected after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintCheck {
    /// Reject an allocation that would push the pool's utilization above
    /// the limit (organic load plus all reservations, fraction of total)
    MaxUtilization { resource: String, limit: f64 },
    /// Reject actions of the listed kinds outright
    DeniedKinds { kinds: Vec<String> },
    /// Reject any single requested amount above the limit
    MaxRequestAmount { resource: String, limit: f64 },
    /// Reject moves that leave the agent's top-level namespace segment
    NamespaceBoundary,
}

/// A declared constraint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub check: ConstraintCheck,
}

/// The slice of environment state a constraint check may see
pub struct ConstraintContext<'a> {
    pub agent: AgentId,
    pub location: Option<&'a Location>,
    pub usage: &'a AHashMap<String, ResourceUsage>,
}

/// Outcome of evaluating every declared constraint against one action
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub violations: Vec<String>,
}

/// Evaluates declared constraints before actions execute
#[derive(Debug, Default)]
pub struct ConstraintEngine {
    constraints: Vec<Constraint>,
}

impl ConstraintEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Evaluate every constraint; collect the names of all violators
    pub fn check(&self, action: &Action, ctx: &ConstraintContext<'_>) -> Verdict {
        let violations: Vec<String> = self
            .constraints
            .iter()
            .filter(|c| Self::violates(&c.check, action, ctx))
            .map(|c| c.name.clone())
            .collect();
        Verdict {
            passed: violations.is_empty(),
            violations,
        }
    }

    fn violates(check: &ConstraintCheck, action: &Action, ctx: &ConstraintContext<'_>) -> bool {
        match check {
            ConstraintCheck::MaxUtilization { resource, limit } => {
                if ActionKind::parse(&action.kind) != Some(ActionKind::AllocateResource) {
                    return false;
                }
                let Some(amounts) = action.resource_amounts() else {
                    return false;
                };
                let Some(requested) = amounts.get(resource) else {
                    return false;
                };
                match ctx.usage.get(resource) {
                    Some(u) if u.total > 0.0 => {
                        (u.used + u.allocated + requested) / u.total > *limit
                    }
                    _ => false,
                }
            }
            ConstraintCheck::DeniedKinds { kinds } => kinds.iter().any(|k| k == &action.kind),
            ConstraintCheck::MaxRequestAmount { resource, limit } => {
                if ActionKind::parse(&action.kind) != Some(ActionKind::AllocateResource) {
                    return false;
                }
                action
                    .resource_amounts()
                    .and_then(|amounts| amounts.get(resource).copied())
                    .map(|amount| amount > *limit)
                    .unwrap_or(false)
            }
            ConstraintCheck::NamespaceBoundary => {
                if ActionKind::parse(&action.kind) != Some(ActionKind::Move) {
                    return false;
                }
                let (Some(current), Some(destination)) = (ctx.location, action.destination())
                else {
                    return false;
                };
                destination.top_namespace() != current.top_namespace()
            }
        }
    }
}
