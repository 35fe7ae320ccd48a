//! Outcome feedback: per-mode success rates and threshold adaptation
//!
//! Each recorded outcome updates a running average for the mode that
//! produced it. The cognitive threshold then retunes itself: poor reflexive
//! outcomes lower it (deliberate more), strong outcomes on both paths raise
//! it (deliberate less). Adaptation never moves the threshold outside its
//! configured bounds and never acts on fewer samples than the configured
//! minimum.

use crate::core::config::ControllerConfig;
use crate::core::types::ProcessingMode;
use serde::{Deserialize, Serialize};

/// Reflexive success rate below which the threshold is lowered
pub const REFLEXIVE_STRUGGLING_RATE: f64 = 0.6;
/// Reflexive success rate that counts as strong for raising the threshold
pub const REFLEXIVE_STRONG_RATE: f64 = 0.8;
/// Cognitive success rate that counts as strong for raising the threshold
pub const COGNITIVE_STRONG_RATE: f64 = 0.9;

/// Running outcome statistics for one mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ModeStats {
    pub attempts: usize,
    pub success_rate: f64,
}

impl ModeStats {
    fn record(&mut self, success: bool) {
        self.attempts += 1;
        let n = self.attempts as f64;
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate = (self.success_rate * (n - 1.0) + outcome) / n;
    }
}

/// Tracks outcomes and owns the adaptive cognitive threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeLearner {
    reflexive: ModeStats,
    cognitive: ModeStats,
    mixed: ModeStats,
    cognitive_threshold: f64,
    #[serde(skip, default = "ControllerConfig::default")]
    config: ControllerConfig,
}

impl OutcomeLearner {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            reflexive: ModeStats::default(),
            cognitive: ModeStats::default(),
            mixed: ModeStats::default(),
            cognitive_threshold: config.initial_cognitive_threshold,
            config,
        }
    }

    pub fn cognitive_threshold(&self) -> f64 {
        self.cognitive_threshold
    }

    pub fn stats(&self, mode: ProcessingMode) -> ModeStats {
        match mode {
            ProcessingMode::Reflexive => self.reflexive,
            ProcessingMode::Cognitive => self.cognitive,
            ProcessingMode::Mixed => self.mixed,
        }
    }

    /// Record one outcome and retune the threshold
    pub fn record(&mut self, mode: ProcessingMode, success: bool) {
        match mode {
            ProcessingMode::Reflexive => self.reflexive.record(success),
            ProcessingMode::Cognitive => self.cognitive.record(success),
            ProcessingMode::Mixed => self.mixed.record(success),
        }
        self.adapt();
    }

    /// Threshold adaptation, gated on a minimum sample count per mode
    fn adapt(&mut self) {
        let min = self.config.min_adaptation_samples;
        let before = self.cognitive_threshold;

        if self.reflexive.attempts >= min && self.reflexive.success_rate < REFLEXIVE_STRUGGLING_RATE
        {
            self.cognitive_threshold = (self.cognitive_threshold
                - self.config.threshold_decrease_step)
                .max(self.config.threshold_floor);
        } else if self.reflexive.attempts >= min
            && self.cognitive.attempts >= min
            && self.reflexive.success_rate > REFLEXIVE_STRONG_RATE
            && self.cognitive.success_rate > COGNITIVE_STRONG_RATE
        {
            self.cognitive_threshold = (self.cognitive_threshold
                + self.config.threshold_increase_step)
                .min(self.config.threshold_cap);
        }

        if (self.cognitive_threshold - before).abs() > f64::EPSILON {
            tracing::debug!(
                from = before,
                to = self.cognitive_threshold,
                reflexive_rate = self.reflexive.success_rate,
                cognitive_rate = self.cognitive.success_rate,
                "cognitive threshold retuned"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn learner() -> OutcomeLearner {
        OutcomeLearner::new(ControllerConfig::default())
    }

    #[test]
    fn test_running_average_matches_formula() {
        let mut l = learner();
        // successes: 1, 0, 1 -> 2/3
        l.record(ProcessingMode::Mixed, true);
        l.record(ProcessingMode::Mixed, false);
        l.record(ProcessingMode::Mixed, true);
        let stats = l.stats(ProcessingMode::Mixed);
        assert_eq!(stats.attempts, 3);
        assert!((stats.success_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_adaptation_before_minimum_samples() {
        let mut l = learner();
        for _ in 0..9 {
            l.record(ProcessingMode::Reflexive, false);
        }
        // Rate is 0.0 but only nine samples: threshold untouched
        assert!((l.cognitive_threshold() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_ten_outcomes_at_half_rate_step_down_once() {
        let mut l = learner();
        // Alternate success/failure: rate settles at 0.5 after ten outcomes
        for i in 0..10 {
            l.record(ProcessingMode::Reflexive, i % 2 == 0);
        }
        let stats = l.stats(ProcessingMode::Reflexive);
        assert_eq!(stats.attempts, 10);
        assert!((stats.success_rate - 0.5).abs() < 1e-9);
        // Exactly one decrease step from 0.7
        assert!((l.cognitive_threshold() - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_floors_at_lower_bound() {
        let mut l = learner();
        for _ in 0..100 {
            l.record(ProcessingMode::Reflexive, false);
        }
        assert!((l.cognitive_threshold() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_caps_at_upper_bound() {
        let mut l = learner();
        for _ in 0..100 {
            l.record(ProcessingMode::Reflexive, true);
            l.record(ProcessingMode::Cognitive, true);
        }
        assert!((l.cognitive_threshold() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_stays_in_bounds_under_mixed_feedback() {
        let mut l = learner();
        for i in 0..500 {
            l.record(ProcessingMode::Reflexive, i % 3 != 0);
            l.record(ProcessingMode::Cognitive, i % 7 != 0);
            let t = l.cognitive_threshold();
            assert!((0.5..=0.8).contains(&t), "threshold escaped bounds: {}", t);
        }
    }

    #[test]
    fn test_increase_requires_both_modes_strong() {
        let mut l = learner();
        // Reflexive strong, cognitive mediocre: no increase
        for i in 0..50 {
            l.record(ProcessingMode::Reflexive, true);
            l.record(ProcessingMode::Cognitive, i % 2 == 0);
        }
        assert!((l.cognitive_threshold() - 0.7).abs() < 1e-9);
    }
}
