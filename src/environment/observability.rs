//! Visibility levels and perception filtering
//!
//! Each entity is admitted with a visibility level that bounds what it can
//! see of other entities. Only the entity list is level-gated: resource and
//! dynamics sections pass through unfiltered on purpose, because resource
//! scarcity is a system-wide signal every agent needs in order to behave
//! cooperatively.

use crate::core::types::AgentId;
use crate::environment::perception::Perception;
use crate::environment::spatial::Location;
use serde::{Deserialize, Serialize};

/// How much of the entity population an observer may see
///
/// Ordered from most to least permissive. Each tier adds a requirement on
/// top of the previous one: `Host` shares the host, `Process` additionally
/// shares the process id, `Namespace` additionally shares the top-level
/// namespace segment. `None` sees nothing but itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityLevel {
    Full,
    Host,
    Process,
    Namespace,
    None,
}

/// Drop entities the observer is not entitled to see
///
/// The observer's own record is always retained, whatever the level.
pub fn filter_perception(
    observer: AgentId,
    observer_location: &Location,
    level: VisibilityLevel,
    mut raw: Perception,
) -> Perception {
    raw.entities.retain(|view| {
        if view.id == observer {
            return true;
        }
        match level {
            VisibilityLevel::Full => true,
            VisibilityLevel::Host => view.location.host == observer_location.host,
            VisibilityLevel::Process => {
                view.location.host == observer_location.host
                    && view.location.process == observer_location.process
            }
            VisibilityLevel::Namespace => {
                view.location.host == observer_location.host
                    && view.location.process == observer_location.process
                    && view.location.top_namespace() == observer_location.top_namespace()
            }
            VisibilityLevel::None => false,
        }
    });
    raw
}
