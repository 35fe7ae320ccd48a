//! Environment-wide state variables and declarative reaction rules
//!
//! Variables follow a bounded random walk in [0, 100]; time-of-day advances
//! with delta time and wraps at 24. On top of the walk, a fixed list of
//! declarative rules fires in declaration order: probabilistic perturbations
//! and threshold-triggered corrections. Rule firings are reported so the
//! environment can append them to the shared event log.

use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Variables walk within this range
pub const VARIABLE_MIN: f64 = 0.0;
pub const VARIABLE_MAX: f64 = 100.0;

/// Hours in a simulated day; time-of-day wraps here
pub const HOURS_PER_DAY: f64 = 24.0;

/// When a rule fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DynamicsTrigger {
    /// Fires with this probability on each update
    Probability(f64),
    /// Fires when the named variable reaches or exceeds the limit
    Threshold { variable: String, at_least: f64 },
}

/// How a firing rule adjusts one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Adjustment {
    /// Add a fixed amount (may be negative)
    Fixed(f64),
    /// Add a uniform random amount from [low, high]
    RandomRange { low: f64, high: f64 },
}

/// One effect of a firing rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicsEffect {
    pub variable: String,
    pub adjustment: Adjustment,
}

/// A declarative rule: trigger -> bounded adjustments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicsRule {
    pub name: String,
    pub trigger: DynamicsTrigger,
    pub effects: Vec<DynamicsEffect>,
}

/// Record of one rule firing during an update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFiring {
    pub rule: String,
    /// (variable, value after adjustment)
    pub adjusted: Vec<(String, f64)>,
}

/// The dynamic portion of environment state
#[derive(Debug)]
pub struct EnvironmentDynamics {
    variables: AHashMap<String, f64>,
    time_of_day: f64,
    rules: Vec<DynamicsRule>,
    walk_max: f64,
    rng: StdRng,
}

impl EnvironmentDynamics {
    /// Standard variable set: load, memory pressure, network congestion
    pub fn new(walk_max: f64, seed: u64) -> Self {
        let mut variables = AHashMap::new();
        variables.insert("system_load".to_string(), 30.0);
        variables.insert("memory_pressure".to_string(), 30.0);
        variables.insert("network_congestion".to_string(), 20.0);
        Self {
            variables,
            time_of_day: 8.0,
            rules: Vec::new(),
            walk_max,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Default reaction rules
    ///
    /// Occasional load spikes, plus a collection pass that bleeds memory
    /// pressure back down once it crosses a high-water mark.
    pub fn with_default_rules(mut self) -> Self {
        self.rules = vec![
            DynamicsRule {
                name: "load_spike".to_string(),
                trigger: DynamicsTrigger::Probability(0.1),
                effects: vec![DynamicsEffect {
                    variable: "system_load".to_string(),
                    adjustment: Adjustment::RandomRange { low: 5.0, high: 20.0 },
                }],
            },
            DynamicsRule {
                name: "memory_collection".to_string(),
                trigger: DynamicsTrigger::Threshold {
                    variable: "memory_pressure".to_string(),
                    at_least: 80.0,
                },
                effects: vec![DynamicsEffect {
                    variable: "memory_pressure".to_string(),
                    adjustment: Adjustment::Fixed(-25.0),
                }],
            },
            DynamicsRule {
                name: "congestion_burst".to_string(),
                trigger: DynamicsTrigger::Probability(0.05),
                effects: vec![DynamicsEffect {
                    variable: "network_congestion".to_string(),
                    adjustment: Adjustment::RandomRange { low: 10.0, high: 30.0 },
                }],
            },
        ];
        self
    }

    pub fn set_rules(&mut self, rules: Vec<DynamicsRule>) {
        self.rules = rules;
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: f64) {
        self.variables
            .insert(name.into(), value.clamp(VARIABLE_MIN, VARIABLE_MAX));
    }

    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    pub fn variables(&self) -> &AHashMap<String, f64> {
        &self.variables
    }

    pub fn time_of_day(&self) -> f64 {
        self.time_of_day
    }

    /// Advance time, walk each variable, then evaluate rules in declaration
    /// order. Multiple rules may fire in the same update; each firing is
    /// returned for the event log.
    pub fn update(&mut self, delta_hours: f64) -> Vec<RuleFiring> {
        self.time_of_day = (self.time_of_day + delta_hours).rem_euclid(HOURS_PER_DAY);

        // Independent bounded random walk per variable
        if self.walk_max > 0.0 {
            for value in self.variables.values_mut() {
                let step = self.rng.gen_range(-self.walk_max..=self.walk_max);
                *value = (*value + step).clamp(VARIABLE_MIN, VARIABLE_MAX);
            }
        }

        let mut firings = Vec::new();
        // Rules index variables by name, so iterate by index to keep the
        // borrow on self.rules out of the adjustment writes
        for i in 0..self.rules.len() {
            let triggered = match &self.rules[i].trigger {
                DynamicsTrigger::Probability(p) => self.rng.gen::<f64>() < *p,
                DynamicsTrigger::Threshold { variable, at_least } => self
                    .variables
                    .get(variable)
                    .map(|v| *v >= *at_least)
                    .unwrap_or(false),
            };
            if !triggered {
                continue;
            }

            let rule = self.rules[i].clone();
            let mut adjusted = Vec::new();
            for effect in &rule.effects {
                let delta = match effect.adjustment {
                    Adjustment::Fixed(d) => d,
                    Adjustment::RandomRange { low, high } => self.rng.gen_range(low..=high),
                };
                let entry = self
                    .variables
                    .entry(effect.variable.clone())
                    .or_insert(VARIABLE_MIN);
                *entry = (*entry + delta).clamp(VARIABLE_MIN, VARIABLE_MAX);
                adjusted.push((effect.variable.clone(), *entry));
            }
            tracing::debug!(rule = %rule.name, ?adjusted, "dynamics rule fired");
            firings.push(RuleFiring {
                rule: rule.name,
                adjusted,
            });
        }
        firings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamics(seed: u64) -> EnvironmentDynamics {
        EnvironmentDynamics::new(5.0, seed)
    }

    #[test]
    fn test_time_of_day_wraps_at_24() {
        let mut dyns = dynamics(1);
        // Starts at 08:00; 20 hours later it is 04:00
        dyns.update(20.0);
        assert!((dyns.time_of_day() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_variables_stay_in_bounds() {
        let mut dyns = dynamics(2).with_default_rules();
        for _ in 0..500 {
            dyns.update(1.0);
            for (name, &value) in dyns.variables() {
                assert!(
                    (VARIABLE_MIN..=VARIABLE_MAX).contains(&value),
                    "{} out of bounds: {}",
                    name,
                    value
                );
            }
        }
    }

    #[test]
    fn test_threshold_rule_fires_and_reduces_pressure() {
        let mut dyns = EnvironmentDynamics::new(0.0, 3).with_default_rules();
        dyns.set_variable("memory_pressure", 95.0);

        let firings = dyns.update(1.0);
        assert!(firings.iter().any(|f| f.rule == "memory_collection"));
        assert!((dyns.variable("memory_pressure").unwrap() - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_rule_quiet_below_limit() {
        let mut dyns = EnvironmentDynamics::new(0.0, 4);
        dyns.set_rules(vec![DynamicsRule {
            name: "memory_collection".to_string(),
            trigger: DynamicsTrigger::Threshold {
                variable: "memory_pressure".to_string(),
                at_least: 80.0,
            },
            effects: vec![DynamicsEffect {
                variable: "memory_pressure".to_string(),
                adjustment: Adjustment::Fixed(-25.0),
            }],
        }]);
        dyns.set_variable("memory_pressure", 50.0);

        let firings = dyns.update(1.0);
        assert!(firings.is_empty());
        assert!((dyns.variable("memory_pressure").unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_probabilistic_rule_fires_eventually() {
        let mut dyns = EnvironmentDynamics::new(0.0, 5).with_default_rules();
        let mut spike_seen = false;
        for _ in 0..200 {
            if dyns.update(1.0).iter().any(|f| f.rule == "load_spike") {
                spike_seen = true;
                break;
            }
        }
        assert!(spike_seen, "10% spike rule should fire within 200 updates");
    }

    #[test]
    fn test_multiple_rules_can_fire_same_update() {
        let mut dyns = EnvironmentDynamics::new(0.0, 6);
        dyns.set_rules(vec![
            DynamicsRule {
                name: "always_a".to_string(),
                trigger: DynamicsTrigger::Probability(1.0),
                effects: vec![DynamicsEffect {
                    variable: "system_load".to_string(),
                    adjustment: Adjustment::Fixed(1.0),
                }],
            },
            DynamicsRule {
                name: "always_b".to_string(),
                trigger: DynamicsTrigger::Probability(1.0),
                effects: vec![DynamicsEffect {
                    variable: "network_congestion".to_string(),
                    adjustment: Adjustment::Fixed(1.0),
                }],
            },
        ]);

        let firings = dyns.update(1.0);
        assert_eq!(firings.len(), 2);
        // Declaration order preserved
        assert_eq!(firings[0].rule, "always_a");
        assert_eq!(firings[1].rule, "always_b");
    }
}
