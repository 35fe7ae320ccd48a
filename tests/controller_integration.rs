//! Integration tests for the hybrid decision loop
//!
//! These run real controllers against a real environment with a scripted
//! generation collaborator: mode routing under growing pressure, recovery
//! of malformed deliberative output, threshold adaptation over a run of
//! outcomes, and the full tokio runtime plumbing.

use agent_habitat::actions::Action;
use agent_habitat::control::cognitive::{Generator, ResponseFormat};
use agent_habitat::control::{
    CycleOutcome, DecisionController, Stimulus, TaskPriority,
};
use agent_habitat::core::config::{ControllerConfig, EnvironmentConfig};
use agent_habitat::core::error::{HabitatError, Result};
use agent_habitat::core::types::ProcessingMode;
use agent_habitat::environment::{Environment, Location, ResourcePool, VisibilityLevel};
use agent_habitat::rules::{ActionTemplate, Condition, Rule, RuleEngine};
use agent_habitat::runtime::{spawn_agent, spawn_dynamics};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Generator that always answers with one fixed response
struct Scripted(String);

impl Generator for Scripted {
    async fn generate(&self, _prompt: &str, _format: ResponseFormat) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Generator that always fails
struct Offline;

impl Generator for Offline {
    async fn generate(&self, _prompt: &str, _format: ResponseFormat) -> Result<String> {
        Err(HabitatError::LlmError("offline".into()))
    }
}

fn environment() -> Arc<Environment> {
    let env = Environment::new(EnvironmentConfig::default(), 21);
    env.add_resource_pool(ResourcePool::new("cpu", 100.0));
    Arc::new(env)
}

fn ack_rules() -> RuleEngine {
    RuleEngine::with_rules([Rule::new(
        "ack_ping",
        10,
        ActionTemplate::new("acknowledge", "pong").acknowledging(),
    )
    .when("performative", Condition::Equals(json!("ping")))])
}

#[tokio::test]
async fn test_mode_routing_tracks_situation_pressure() {
    let env = environment();
    let agent = env.add_agent(Location::new("alpha", "svc"), VisibilityLevel::Full);
    let generator = Arc::new(Scripted(r#"{"actions": []}"#.into()));
    let mut ctl = DecisionController::new(
        agent,
        env,
        ack_rules(),
        Some(generator),
        ControllerConfig::default(),
    );

    // Quiet inbox: reflexive
    let calm = ctl
        .run_cycle(vec![Stimulus::message("p", "ping", "hi")])
        .await
        .unwrap();
    assert_eq!(calm.mode, ProcessingMode::Reflexive);

    // One deliberative message: mixed
    let middling = ctl
        .run_cycle(vec![
            Stimulus::message("p", "query", "status please"),
            Stimulus::message("p", "ping", "hi"),
        ])
        .await
        .unwrap();
    assert_eq!(middling.mode, ProcessingMode::Mixed);

    // Conflict plus critical task: cognitive
    let tense = ctl
        .run_cycle(vec![
            Stimulus::conflict("pool contested"),
            Stimulus::task("rebalance", TaskPriority::Critical),
        ])
        .await
        .unwrap();
    assert_eq!(tense.mode, ProcessingMode::Cognitive);
}

#[tokio::test]
async fn test_malformed_deliberation_recovered_through_pipeline() {
    let env = environment();
    let agent = env.add_agent(Location::new("alpha", "svc"), VisibilityLevel::Full);
    // Prose wrapper plus trailing comma: stages 1 and 2 fail, stage 3 lands
    let generator = Arc::new(Scripted(
        "Here: {\"actions\": [{\"type\":\"inform\",}]}".into(),
    ));
    let mut ctl = DecisionController::new(
        agent,
        env,
        RuleEngine::new(),
        Some(generator),
        ControllerConfig::default(),
    );

    let report = ctl
        .run_cycle(vec![
            Stimulus::conflict("contested"),
            Stimulus::task("repair", TaskPriority::Critical),
        ])
        .await
        .unwrap();

    assert_eq!(report.mode, ProcessingMode::Cognitive);
    assert_eq!(report.actions.len(), 1, "recovery must salvage the action");
    assert_eq!(report.actions[0].kind, "inform");
    assert_eq!(
        report.actions[0].processing_mode,
        Some(ProcessingMode::Cognitive)
    );
}

#[tokio::test]
async fn test_offline_collaborator_never_stalls_the_agent() {
    let env = environment();
    let agent = env.add_agent(Location::new("alpha", "svc"), VisibilityLevel::Full);
    let mut ctl = DecisionController::new(
        agent,
        env,
        ack_rules(),
        Some(Arc::new(Offline)),
        ControllerConfig::default(),
    );

    let report = ctl
        .run_cycle(vec![
            Stimulus::conflict("contested"),
            Stimulus::task("repair", TaskPriority::Critical),
            Stimulus::message("p", "ping", "anyone?"),
        ])
        .await
        .unwrap();

    // Degraded to the reflexive result set
    assert_eq!(report.actions.len(), 1);
    assert_eq!(report.actions[0].kind, "acknowledge");
}

#[tokio::test]
async fn test_threshold_adapts_and_changes_routing() {
    let env = environment();
    let agent = env.add_agent(Location::new("alpha", "svc"), VisibilityLevel::Full);
    let generator = Arc::new(Scripted(r#"{"actions": []}"#.into()));
    let mut ctl = DecisionController::new(
        agent,
        env,
        ack_rules(),
        Some(generator),
        ControllerConfig::default(),
    );

    // complexity 0.7 (critical 0.4 + coordination 0.3) sits below the
    // default threshold: mixed
    let stimuli = || vec![Stimulus::task("coordination", TaskPriority::Critical)];
    let before = ctl.run_cycle(stimuli()).await.unwrap();
    assert_eq!(before.mode, ProcessingMode::Mixed);

    // Ten mediocre reflexive outcomes drop the threshold to 0.65
    for i in 0..10 {
        ctl.learn(CycleOutcome {
            mode: ProcessingMode::Reflexive,
            success: i % 2 == 0,
        });
    }
    assert!((ctl.cognitive_threshold() - 0.65).abs() < 1e-9);

    // The same situation now routes to the cognitive path
    let after = ctl.run_cycle(stimuli()).await.unwrap();
    assert_eq!(after.mode, ProcessingMode::Cognitive);
}

#[tokio::test]
async fn test_threshold_never_leaves_bounds_under_any_feedback() {
    let env = environment();
    let agent = env.add_agent(Location::new("alpha", "svc"), VisibilityLevel::Full);
    let mut ctl: DecisionController<Offline> = DecisionController::new(
        agent,
        env,
        ack_rules(),
        None,
        ControllerConfig::default(),
    );

    for i in 0..1000 {
        let mode = match i % 3 {
            0 => ProcessingMode::Reflexive,
            1 => ProcessingMode::Cognitive,
            _ => ProcessingMode::Mixed,
        };
        ctl.learn(CycleOutcome {
            mode,
            success: i % 5 != 0,
        });
        let t = ctl.cognitive_threshold();
        assert!((0.5..=0.8).contains(&t), "threshold out of bounds: {}", t);
    }
}

#[tokio::test]
async fn test_full_runtime_agents_and_dynamics_together() {
    let env = environment();
    let dynamics = spawn_dynamics(env.clone(), Duration::from_millis(5), 1.0);

    let agent = env.add_agent(Location::new("alpha", "svc"), VisibilityLevel::Full);
    let ctl: DecisionController<Offline> = DecisionController::new(
        agent,
        env.clone(),
        ack_rules(),
        None,
        ControllerConfig::default(),
    );

    let (stimulus_tx, stimulus_rx) = mpsc::channel(16);
    let (action_tx, mut action_rx) = mpsc::channel::<Action>(16);
    let handle = spawn_agent(ctl, stimulus_rx, action_tx, Duration::from_millis(5));

    stimulus_tx
        .send(Stimulus::message("peer", "ping", "hello"))
        .await
        .unwrap();

    let action = tokio::time::timeout(Duration::from_secs(2), action_rx.recv())
        .await
        .expect("action within deadline")
        .expect("channel open");
    assert_eq!(action.kind, "acknowledge");
    assert_eq!(action.target.as_deref(), Some("peer"));

    // The dynamics ticker advanced the environment independently
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(env.tick() > 0);

    handle.join.abort();
    dynamics.abort();
}
