//! Outbound action records and the environment-executable kind catalog

pub mod catalog;

pub use catalog::{Action, ActionKind, ActionOutcome};
