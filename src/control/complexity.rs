//! Situational complexity assessment
//!
//! A bounded heuristic: fixed increments per contributing factor, clamped
//! to [0, 1]. The increments are deliberately coarse; the score only has to
//! rank situations well enough to route them between the cheap and the
//! expensive path.

use crate::control::stimulus::{Stimulus, StimulusKind};
use crate::core::config::ControllerConfig;

/// Performatives that signal a deliberation-worthy exchange
pub const DELIBERATIVE_PERFORMATIVES: [&str; 3] = ["propose", "negotiate", "query"];

/// Task types that involve other agents and planning depth
pub const COORDINATION_TASK_TYPES: [&str; 3] = ["coordination", "negotiation", "planning"];

/// Per-message increment for deliberative performatives
pub const DELIBERATIVE_MESSAGE_WEIGHT: f64 = 0.3;
/// Per-message increment for large content
pub const LARGE_CONTENT_WEIGHT: f64 = 0.2;
/// Per-task increment for critical priority
pub const CRITICAL_TASK_WEIGHT: f64 = 0.4;
/// Per-task increment for coordination-class types
pub const COORDINATION_TASK_WEIGHT: f64 = 0.3;
/// One-time increment when the visible peer population is crowded
pub const CROWDING_WEIGHT: f64 = 0.2;
/// One-time increment when any conflict is present
pub const CONFLICT_WEIGHT: f64 = 0.5;

/// Score the current situation in [0, 1]
pub fn assess_complexity(
    stimuli: &[Stimulus],
    visible_peers: usize,
    config: &ControllerConfig,
) -> f64 {
    let mut score: f64 = 0.0;
    let mut conflict_present = false;

    for stimulus in stimuli {
        match stimulus.kind {
            StimulusKind::Message => {
                if stimulus
                    .performative()
                    .map(|p| DELIBERATIVE_PERFORMATIVES.contains(&p))
                    .unwrap_or(false)
                {
                    score += DELIBERATIVE_MESSAGE_WEIGHT;
                }
                if stimulus.content_len() > config.large_content_bytes {
                    score += LARGE_CONTENT_WEIGHT;
                }
            }
            StimulusKind::Task => {
                if stimulus.is_critical_task() {
                    score += CRITICAL_TASK_WEIGHT;
                }
                if stimulus
                    .task_type()
                    .map(|t| COORDINATION_TASK_TYPES.contains(&t))
                    .unwrap_or(false)
                {
                    score += COORDINATION_TASK_WEIGHT;
                }
            }
            StimulusKind::Conflict => conflict_present = true,
            StimulusKind::Proximity => {}
        }
    }

    if visible_peers > config.crowding_peer_count {
        score += CROWDING_WEIGHT;
    }
    if conflict_present {
        score += CONFLICT_WEIGHT;
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::stimulus::TaskPriority;

    fn config() -> ControllerConfig {
        ControllerConfig::default()
    }

    #[test]
    fn test_empty_situation_scores_zero() {
        assert!(assess_complexity(&[], 0, &config()).abs() < 1e-9);
    }

    #[test]
    fn test_deliberative_message_increment() {
        let stimuli = vec![Stimulus::message("a", "propose", "split the work?")];
        assert!((assess_complexity(&stimuli, 0, &config()) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_plain_inform_does_not_count() {
        let stimuli = vec![Stimulus::message("a", "inform", "done")];
        assert!(assess_complexity(&stimuli, 0, &config()).abs() < 1e-9);
    }

    #[test]
    fn test_large_content_adds_on_top_of_performative() {
        let big = "x".repeat(600);
        let stimuli = vec![Stimulus::message("a", "query", big)];
        // 0.3 (query) + 0.2 (large)
        assert!((assess_complexity(&stimuli, 0, &config()) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_critical_coordination_task_stacks() {
        let stimuli = vec![Stimulus::task("coordination", TaskPriority::Critical)];
        // 0.4 (critical) + 0.3 (coordination)
        assert!((assess_complexity(&stimuli, 0, &config()) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_crowding_and_conflict() {
        let stimuli = vec![Stimulus::conflict("contested cpu claim")];
        // 0.5 (conflict) + 0.2 (crowding beyond 5 peers)
        assert!((assess_complexity(&stimuli, 6, &config()) - 0.7).abs() < 1e-9);
        // 5 peers is not yet crowded
        assert!((assess_complexity(&stimuli, 5, &config()) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_score_clamped_to_one() {
        let big = "x".repeat(600);
        let stimuli = vec![
            Stimulus::message("a", "propose", big.clone()),
            Stimulus::message("b", "negotiate", big),
            Stimulus::task("planning", TaskPriority::Critical),
            Stimulus::conflict("everything is contested"),
        ];
        let score = assess_complexity(&stimuli, 20, &config());
        assert!((score - 1.0).abs() < 1e-9);
    }
}
