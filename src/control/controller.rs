//! The adaptive hybrid decision loop
//!
//! Each cycle: perceive, assess complexity, select a processing mode, run
//! the reflexive and/or cognitive path, merge, hand the actions out, and
//! learn from whatever outcome feedback arrives later. Mode is recomputed
//! every cycle; there is no terminal state.

use crate::actions::Action;
use crate::control::cognitive::{
    deliberate, AgentState, CognitiveContext, Generator, PerceptionSummary,
};
use crate::control::complexity::assess_complexity;
use crate::control::learning::OutcomeLearner;
use crate::control::modes::{select_mode, ModeHistory, ModeHistoryEntry};
use crate::control::stimulus::{Stimulus, StimulusKind};
use crate::core::config::ControllerConfig;
use crate::core::error::{HabitatError, Result};
use crate::core::types::{AgentId, ProcessingMode};
use crate::environment::Environment;
use crate::rules::RuleEngine;
use ahash::AHashSet;
use std::sync::Arc;
use std::time::Duration;

/// Complexity above which mixed mode also runs the cognitive path
pub const MIXED_ESCALATION_COMPLEXITY: f64 = 0.8;

/// What one cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub mode: ProcessingMode,
    pub complexity: f64,
    pub actions: Vec<Action>,
}

/// Post-hoc feedback for one executed cycle
#[derive(Debug, Clone, Copy)]
pub struct CycleOutcome {
    pub mode: ProcessingMode,
    pub success: bool,
}

/// Per-agent hybrid controller
///
/// Holds the agent's reflexive rule set, its in-memory BDI state, the
/// bounded mode history, and the outcome learner that owns the adaptive
/// cognitive threshold. The environment is injected, never looked up.
pub struct DecisionController<G: Generator> {
    agent: AgentId,
    environment: Arc<Environment>,
    rules: RuleEngine,
    generator: Option<Arc<G>>,
    state: AgentState,
    history: ModeHistory,
    learner: OutcomeLearner,
    config: ControllerConfig,
}

impl<G: Generator> DecisionController<G> {
    pub fn new(
        agent: AgentId,
        environment: Arc<Environment>,
        rules: RuleEngine,
        generator: Option<Arc<G>>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            agent,
            environment,
            rules,
            generator,
            state: AgentState::default(),
            history: ModeHistory::new(config.mode_history_capacity),
            learner: OutcomeLearner::new(config.clone()),
            config,
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }

    pub fn cognitive_threshold(&self) -> f64 {
        self.learner.cognitive_threshold()
    }

    pub fn mode_history(&self) -> &ModeHistory {
        &self.history
    }

    /// One full perceive -> assess -> select -> decide cycle
    ///
    /// The returned actions are the cycle's output; executing them against
    /// the environment or an outbound channel is the caller's job.
    pub async fn run_cycle(&mut self, stimuli: Vec<Stimulus>) -> Result<CycleReport> {
        let perception = self.environment.perceive(self.agent)?;
        let visible_peers = perception.peers().count();

        let complexity = assess_complexity(&stimuli, visible_peers, &self.config);
        let mode = select_mode(
            complexity,
            self.config.reflexive_threshold,
            self.learner.cognitive_threshold(),
        );
        self.history.push(ModeHistoryEntry {
            mode,
            complexity,
            tick: perception.tick,
        });
        tracing::debug!(agent = %self.agent, ?mode, complexity, "cycle mode selected");

        let actions = match mode {
            ProcessingMode::Reflexive => self.rules.process(&stimuli),
            ProcessingMode::Cognitive => {
                match self.run_cognitive(&perception, &stimuli).await {
                    Some(actions) => actions,
                    // Collaborator unavailable or failed: degrade to the
                    // reflexive result set rather than stalling the cycle
                    None => self.rules.process(&stimuli),
                }
            }
            ProcessingMode::Mixed => {
                let reflexive = self.rules.process(&stimuli);
                if self.should_escalate(complexity, &reflexive, &stimuli) {
                    match self.run_cognitive(&perception, &stimuli).await {
                        Some(cognitive) if !cognitive.is_empty() => {
                            Self::merge(cognitive, reflexive)
                        }
                        _ => reflexive,
                    }
                } else {
                    reflexive
                }
            }
        };

        // A removed agent's late deliberation is discarded; nothing may
        // execute on its behalf
        if !self.environment.contains(self.agent) {
            tracing::info!(agent = %self.agent, "agent removed mid-cycle, result discarded");
            return Err(HabitatError::AgentNotFound(self.agent));
        }

        Ok(CycleReport {
            mode,
            complexity,
            actions,
        })
    }

    /// Record outcome feedback for a completed cycle
    pub fn learn(&mut self, outcome: CycleOutcome) {
        self.learner.record(outcome.mode, outcome.success);
    }

    /// Run the cognitive path; `None` means it failed and the caller
    /// should fall back, `Some(vec![])` is a legitimate empty decision
    async fn run_cognitive(
        &self,
        perception: &crate::environment::Perception,
        stimuli: &[Stimulus],
    ) -> Option<Vec<Action>> {
        let generator = self.generator.as_ref()?;
        let context = CognitiveContext {
            agent: self.agent,
            perception: PerceptionSummary::from_perception(perception),
            recent_modes: self.history.recent(self.config.context_history_window),
            state: self.state.clone(),
            stimuli: stimuli.to_vec(),
        };
        let timeout = Duration::from_millis(self.config.generation_timeout_ms);
        match deliberate(generator.as_ref(), &context, timeout).await {
            Ok(actions) => Some(actions),
            Err(err) => {
                tracing::warn!(agent = %self.agent, %err, "cognitive path failed, degrading");
                None
            }
        }
    }

    /// Mixed-mode escalation: deliberate as well when the situation is
    /// genuinely hard, when reflexes came up empty on real messages, or
    /// when something critical is pending
    fn should_escalate(
        &self,
        complexity: f64,
        reflexive: &[Action],
        stimuli: &[Stimulus],
    ) -> bool {
        if complexity > MIXED_ESCALATION_COMPLEXITY {
            return true;
        }
        let messages_exist = stimuli.iter().any(|s| s.kind == StimulusKind::Message);
        if reflexive.is_empty() && messages_exist {
            return true;
        }
        stimuli.iter().any(|s| s.is_critical_task())
    }

    /// Cognitive output wins on a `(kind, target)` collision; reflexive
    /// actions with no collision are appended
    fn merge(cognitive: Vec<Action>, reflexive: Vec<Action>) -> Vec<Action> {
        let taken: AHashSet<(String, Option<String>)> = cognitive
            .iter()
            .map(|a| (a.kind.clone(), a.target.clone()))
            .collect();
        let mut merged = cognitive;
        for action in reflexive {
            if !taken.contains(&(action.kind.clone(), action.target.clone())) {
                merged.push(action);
            }
        }
        merged
    }
}
