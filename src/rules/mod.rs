//! Reflexive rule matching: conditions, engine, TOML loading

pub mod condition;
pub mod engine;
mod loader;

pub use condition::{Condition, ConditionError};
pub use engine::{ActionTemplate, Rule, RuleEngine, REFLEXIVE_CONFIDENCE};
pub use loader::{load_dynamics_rules, load_rules, parse_dynamics_toml, parse_rules_toml};
