//! The deliberative path: context assembly and generation requests
//!
//! The controller owns timeout and degradation policy; the generation
//! collaborator owns prompt formatting and model selection behind the
//! `Generator` trait. The context object is a compact serializable mirror
//! of what the agent knows, not a transcript.

use crate::actions::Action;
use crate::control::modes::ModeHistoryEntry;
use crate::control::recovery;
use crate::control::stimulus::Stimulus;
use crate::core::error::Result;
use crate::core::types::{AgentId, ProcessingMode};
use crate::environment::perception::Perception;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// How the collaborator should shape its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// A JSON object with an `actions` array
    JsonActions,
    /// Free text
    PlainText,
}

/// The external generation collaborator
///
/// Implementations must not panic; every failure comes back as an error
/// value for the controller to degrade on.
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        format: ResponseFormat,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// In-memory beliefs/desires/intentions, snapshot-serializable for the
/// external store at cycle boundaries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    pub beliefs: AHashMap<String, serde_json::Value>,
    pub desires: Vec<String>,
    pub intentions: Vec<String>,
    pub capabilities: Vec<String>,
}

/// Compact view of a perception for the generation prompt
#[derive(Debug, Clone, Serialize)]
pub struct PerceptionSummary {
    pub tick: u64,
    pub visible_peers: Vec<String>,
    /// resource name -> utilization in [0, 1]
    pub resource_utilization: AHashMap<String, f64>,
    pub dynamics: AHashMap<String, f64>,
    pub time_of_day: f64,
    pub recent_event_count: usize,
}

impl PerceptionSummary {
    pub fn from_perception(perception: &Perception) -> Self {
        Self {
            tick: perception.tick,
            visible_peers: perception.peers().map(|e| e.id.to_string()).collect(),
            resource_utilization: perception
                .resources
                .iter()
                .map(|(name, usage)| (name.clone(), usage.utilization))
                .collect(),
            dynamics: perception.dynamics.variables.clone(),
            time_of_day: perception.dynamics.time_of_day,
            recent_event_count: perception.recent_events.len(),
        }
    }
}

/// Everything handed to the collaborator for one deliberation
#[derive(Debug, Clone, Serialize)]
pub struct CognitiveContext {
    pub agent: AgentId,
    pub perception: PerceptionSummary,
    pub recent_modes: Vec<ModeHistoryEntry>,
    pub state: AgentState,
    pub stimuli: Vec<Stimulus>,
}

impl CognitiveContext {
    /// Render the context as the user portion of a generation prompt
    pub fn to_prompt(&self) -> String {
        // Context serialization cannot fail: every field is plain data
        let body = serde_json::to_string_pretty(self).unwrap_or_default();
        format!(
            "SITUATION:\n{}\n\nDecide this agent's next actions. \
             Respond with JSON: {{\"actions\": [{{\"type\": ..., \"target\": ..., \
             \"content\": ..., \"confidence\": 0.0-1.0}}]}}",
            body
        )
    }
}

/// Run one deliberation with a hard timeout
///
/// `Err` means the collaborator failed or timed out (the caller degrades to
/// reflexive results); `Ok(vec![])` means it answered but produced nothing
/// usable, which is a legitimate empty decision.
pub async fn deliberate<G: Generator>(
    generator: &G,
    context: &CognitiveContext,
    timeout: Duration,
) -> Result<Vec<Action>> {
    let prompt = context.to_prompt();
    let response = tokio::time::timeout(
        timeout,
        generator.generate(&prompt, ResponseFormat::JsonActions),
    )
    .await
    .map_err(|_| {
        crate::core::error::HabitatError::LlmError(format!(
            "generation timed out after {:?}",
            timeout
        ))
    })??;

    let mut actions = recovery::recover_actions(&response);
    for action in &mut actions {
        action.processing_mode = Some(ProcessingMode::Cognitive);
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HabitatError;

    /// Scripted generator: returns a fixed response or a fixed failure
    struct Scripted {
        response: std::result::Result<String, String>,
        delay: Duration,
    }

    impl Generator for Scripted {
        async fn generate(&self, _prompt: &str, _format: ResponseFormat) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            self.response
                .clone()
                .map_err(HabitatError::LlmError)
        }
    }

    fn context() -> CognitiveContext {
        CognitiveContext {
            agent: AgentId::new(),
            perception: PerceptionSummary {
                tick: 3,
                visible_peers: vec![],
                resource_utilization: AHashMap::new(),
                dynamics: AHashMap::new(),
                time_of_day: 9.0,
                recent_event_count: 0,
            },
            recent_modes: vec![],
            state: AgentState::default(),
            stimuli: vec![],
        }
    }

    #[tokio::test]
    async fn test_deliberate_tags_actions_cognitive() {
        let generator = Scripted {
            response: Ok(r#"{"actions": [{"type": "inform", "target": "a"}]}"#.into()),
            delay: Duration::ZERO,
        };
        let actions = deliberate(&generator, &context(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].processing_mode, Some(ProcessingMode::Cognitive));
    }

    #[tokio::test]
    async fn test_deliberate_times_out_as_error() {
        let generator = Scripted {
            response: Ok("{\"actions\": []}".into()),
            delay: Duration::from_millis(200),
        };
        let result = deliberate(&generator, &context(), Duration::from_millis(10)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_deliberate_garbage_is_empty_not_error() {
        let generator = Scripted {
            response: Ok("no structure here at all".into()),
            delay: Duration::ZERO,
        };
        let actions = deliberate(&generator, &context(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn test_prompt_carries_situation_and_format() {
        let prompt = context().to_prompt();
        assert!(prompt.contains("SITUATION:"));
        assert!(prompt.contains("\"actions\""));
    }
}
