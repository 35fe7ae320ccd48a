//! The hybrid decision controller and its supporting pieces

pub mod cognitive;
pub mod complexity;
pub mod controller;
pub mod learning;
pub mod modes;
pub mod recovery;
pub mod stimulus;

pub use cognitive::{AgentState, CognitiveContext, Generator, ResponseFormat};
pub use complexity::assess_complexity;
pub use controller::{CycleOutcome, CycleReport, DecisionController};
pub use learning::OutcomeLearner;
pub use modes::{select_mode, ModeHistory, ModeHistoryEntry};
pub use recovery::recover_actions;
pub use stimulus::{Stimulus, StimulusKind, TaskPriority};
