//! Task plumbing: one tokio task per agent cycle, one dynamics ticker
//!
//! Agents proceed at their own pace; there is no global lock-step. The
//! only state they share is the `Environment`, whose entry points enforce
//! their own serialization. The dynamics ticker runs on its own fixed
//! interval, independent of any agent's cycle cadence.

use crate::actions::Action;
use crate::control::cognitive::Generator;
use crate::control::controller::DecisionController;
use crate::control::stimulus::Stimulus;
use crate::core::error::HabitatError;
use crate::core::types::AgentId;
use crate::environment::Environment;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to one running agent loop
pub struct AgentHandle {
    pub agent: AgentId,
    pub join: JoinHandle<()>,
}

/// Drive `Environment::update` on a fixed interval
///
/// Runs until the returned handle is aborted; each firing advances the
/// environment by `delta_time`.
pub fn spawn_dynamics(
    environment: Arc<Environment>,
    period: Duration,
    delta_time: f64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            environment.update(delta_time);
        }
    })
}

/// Run one agent's perceive-decide-act loop as an independent task
///
/// Stimuli are drained from `inbox` each cycle; produced actions go to the
/// outbound `actions` channel (the external dispatcher's side). The loop
/// ends when the agent is removed from the environment, or when either
/// channel closes.
pub fn spawn_agent<G: Generator + 'static>(
    mut controller: DecisionController<G>,
    mut inbox: mpsc::Receiver<Stimulus>,
    actions: mpsc::Sender<Action>,
    period: Duration,
) -> AgentHandle {
    let agent = controller.agent();
    let join = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;

            let mut batch = Vec::new();
            let mut inbox_closed = false;
            loop {
                match inbox.try_recv() {
                    Ok(stimulus) => batch.push(stimulus),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        inbox_closed = true;
                        break;
                    }
                }
            }

            match controller.run_cycle(batch).await {
                Ok(report) => {
                    for action in report.actions {
                        if actions.send(action).await.is_err() {
                            tracing::info!(agent = %agent, "action sink closed, stopping");
                            return;
                        }
                    }
                }
                Err(HabitatError::AgentNotFound(_)) => {
                    tracing::info!(agent = %agent, "agent gone from environment, stopping");
                    return;
                }
                Err(err) => {
                    // Transient faults never kill the loop
                    tracing::warn!(agent = %agent, %err, "cycle failed");
                }
            }

            if inbox_closed {
                tracing::info!(agent = %agent, "inbox closed, stopping");
                return;
            }
        }
    });
    AgentHandle { agent, join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::cognitive::ResponseFormat;
    use crate::core::config::{ControllerConfig, EnvironmentConfig};
    use crate::core::error::Result;
    use crate::environment::{Location, ResourcePool, VisibilityLevel};
    use crate::rules::{ActionTemplate, Condition, Rule, RuleEngine};
    use serde_json::json;

    struct NoGenerator;

    impl Generator for NoGenerator {
        async fn generate(&self, _prompt: &str, _format: ResponseFormat) -> Result<String> {
            Err(HabitatError::LlmError("unused".into()))
        }
    }

    fn env() -> Arc<Environment> {
        let env = Environment::new(EnvironmentConfig::default(), 11);
        env.add_resource_pool(ResourcePool::new("cpu", 100.0));
        Arc::new(env)
    }

    fn ack_controller(environment: Arc<Environment>, agent: AgentId) -> DecisionController<NoGenerator> {
        let rules = RuleEngine::with_rules([Rule::new(
            "ack_ping",
            1,
            ActionTemplate::new("acknowledge", "pong").acknowledging(),
        )
        .when("performative", Condition::Equals(json!("ping")))]);
        DecisionController::new(agent, environment, rules, None, ControllerConfig::default())
    }

    #[tokio::test]
    async fn test_agent_loop_processes_inbox_and_emits_actions() {
        let environment = env();
        let agent = environment.add_agent(Location::new("alpha", "svc"), VisibilityLevel::Full);
        let controller = ack_controller(environment.clone(), agent);

        let (stimulus_tx, stimulus_rx) = mpsc::channel(16);
        let (action_tx, mut action_rx) = mpsc::channel(16);
        let handle = spawn_agent(
            controller,
            stimulus_rx,
            action_tx,
            Duration::from_millis(5),
        );

        stimulus_tx
            .send(Stimulus::message("peer", "ping", "hello"))
            .await
            .unwrap();

        let action = tokio::time::timeout(Duration::from_secs(2), action_rx.recv())
            .await
            .expect("action within deadline")
            .expect("channel open");
        assert_eq!(action.kind, "acknowledge");

        handle.join.abort();
    }

    #[tokio::test]
    async fn test_agent_loop_stops_after_removal() {
        let environment = env();
        let agent = environment.add_agent(Location::new("alpha", "svc"), VisibilityLevel::Full);
        let controller = ack_controller(environment.clone(), agent);

        let (_stimulus_tx, stimulus_rx) = mpsc::channel(16);
        let (action_tx, _action_rx) = mpsc::channel(16);
        let handle = spawn_agent(
            controller,
            stimulus_rx,
            action_tx,
            Duration::from_millis(5),
        );

        environment.remove_agent(agent).unwrap();
        // The loop notices the removal and exits on its own
        tokio::time::timeout(Duration::from_secs(2), handle.join)
            .await
            .expect("loop exits")
            .expect("no panic");
    }

    #[tokio::test]
    async fn test_dynamics_ticker_advances_environment() {
        let environment = env();
        let handle = spawn_dynamics(environment.clone(), Duration::from_millis(5), 1.0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.abort();
        assert!(environment.tick() > 0);
    }
}
