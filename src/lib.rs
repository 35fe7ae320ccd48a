//! Agent Habitat - shared simulated environment with hybrid agent control
//!
//! Many autonomous agents act inside one resource-constrained, partially
//! observable environment. Each agent runs a hybrid decision loop that
//! picks, per situation, between a cheap rule-based reaction and an
//! expensive LLM-backed deliberation, and adapts the switch-over threshold
//! from outcome feedback.

pub mod actions;
pub mod control;
pub mod core;
pub mod environment;
pub mod llm;
pub mod rules;
pub mod runtime;

/// Initialize logging for processes embedding the habitat
///
/// Honors `RUST_LOG`-style filters; defaults to debug-level output for
/// this crate only.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_habitat=debug".into()),
        )
        .init();
}
