//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other.

/// Configuration for the shared environment
///
/// These values have been tuned for stable behavior with a few dozen
/// concurrent agents. Changing them alters pacing, not correctness.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    // === EVENT LOG ===
    /// Maximum number of retained environment events
    ///
    /// The event log is a ring buffer: once full, the oldest events are
    /// evicted. Agents only ever see the most recent window through
    /// perception, so unbounded growth buys nothing.
    pub event_log_capacity: usize,

    /// Number of recent events included in each perception snapshot
    ///
    /// Kept well below `event_log_capacity` so that slow perceivers still
    /// see a coherent window rather than the whole buffer.
    pub perception_event_window: usize,

    // === RESOURCE DRIFT ===
    /// Maximum per-update change applied to a pool's organic `used` load
    ///
    /// Each `update()` nudges every pool's background usage by a uniform
    /// random amount in [-max, +max], independent of agent allocations.
    /// The drift is clamped so `used + allocated <= total` always holds.
    pub resource_drift_max: f64,

    // === DYNAMICS ===
    /// Maximum per-update random-walk step for dynamics variables
    ///
    /// Variables walk within [0, 100]. At 5.0, a variable can traverse the
    /// full range in no fewer than 20 updates, which keeps conditions from
    /// flapping faster than agents can react.
    pub dynamics_walk_max: f64,

    /// Hours of simulated time-of-day advanced per unit of delta_time
    ///
    /// At 1.0, `update(1.0)` advances one hour; time wraps at 24.
    pub hours_per_time_unit: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            event_log_capacity: 256,
            perception_event_window: 32,
            resource_drift_max: 2.0,
            dynamics_walk_max: 5.0,
            hours_per_time_unit: 1.0,
        }
    }
}

impl EnvironmentConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.perception_event_window > self.event_log_capacity {
            return Err(format!(
                "perception_event_window ({}) should be <= event_log_capacity ({})",
                self.perception_event_window, self.event_log_capacity
            ));
        }
        if self.resource_drift_max < 0.0 || self.dynamics_walk_max < 0.0 {
            return Err("drift and walk maxima must be non-negative".into());
        }
        if self.hours_per_time_unit <= 0.0 {
            return Err("hours_per_time_unit must be positive".into());
        }
        Ok(())
    }
}

/// Configuration for the hybrid decision controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    // === MODE SELECTION ===
    /// Complexity below which the reflexive path is used alone
    ///
    /// Situations under this score are cheap enough that deliberation
    /// would cost more than it returns.
    pub reflexive_threshold: f64,

    /// Starting value for the adaptive cognitive threshold
    ///
    /// Complexity above the cognitive threshold routes the cycle to the
    /// deliberative path. The threshold self-adjusts from outcomes but
    /// never leaves [`threshold_floor`, `threshold_cap`].
    pub initial_cognitive_threshold: f64,

    /// Lower bound for the adaptive cognitive threshold
    pub threshold_floor: f64,

    /// Upper bound for the adaptive cognitive threshold
    pub threshold_cap: f64,

    // === LEARNING ===
    /// Step subtracted from the threshold when reflexive outcomes are poor
    ///
    /// Applied when the reflexive success rate drops below 0.6, shifting
    /// more situations onto the cognitive path.
    pub threshold_decrease_step: f64,

    /// Step added to the threshold when both paths perform well
    ///
    /// Applied when reflexive > 0.8 and cognitive > 0.9, reclaiming cheap
    /// reflexive handling. Deliberately smaller than the decrease step so
    /// recovery toward reflexive handling is gradual.
    pub threshold_increase_step: f64,

    /// Minimum recorded outcomes for a mode before adaptation acts on it
    ///
    /// A success rate over one or two samples is noise. At 10, the first
    /// adjustment can fire no earlier than the tenth outcome for the
    /// triggering mode.
    pub min_adaptation_samples: usize,

    // === HISTORY ===
    /// Retained mode-history entries (ring buffer)
    pub mode_history_capacity: usize,

    /// Mode-history entries included in the cognitive context
    pub context_history_window: usize,

    // === COGNITIVE PATH ===
    /// Timeout for a single generation request, in milliseconds
    ///
    /// On expiry the cycle degrades to the reflexive result set rather
    /// than stalling the agent.
    pub generation_timeout_ms: u64,

    /// Content length (bytes) above which a message counts as "large"
    /// for complexity assessment
    pub large_content_bytes: usize,

    /// Visible peer count above which crowding contributes to complexity
    pub crowding_peer_count: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reflexive_threshold: 0.3,
            initial_cognitive_threshold: 0.7,
            threshold_floor: 0.5,
            threshold_cap: 0.8,
            threshold_decrease_step: 0.05,
            threshold_increase_step: 0.02,
            min_adaptation_samples: 10,
            mode_history_capacity: 50,
            context_history_window: 5,
            generation_timeout_ms: 10_000,
            large_content_bytes: 512,
            crowding_peer_count: 5,
        }
    }
}

impl ControllerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.reflexive_threshold >= self.threshold_floor {
            return Err(format!(
                "reflexive_threshold ({}) should be < threshold_floor ({})",
                self.reflexive_threshold, self.threshold_floor
            ));
        }
        if self.threshold_floor >= self.threshold_cap {
            return Err(format!(
                "threshold_floor ({}) should be < threshold_cap ({})",
                self.threshold_floor, self.threshold_cap
            ));
        }
        if self.initial_cognitive_threshold < self.threshold_floor
            || self.initial_cognitive_threshold > self.threshold_cap
        {
            return Err(format!(
                "initial_cognitive_threshold ({}) must lie within [{}, {}]",
                self.initial_cognitive_threshold, self.threshold_floor, self.threshold_cap
            ));
        }
        if self.context_history_window > self.mode_history_capacity {
            return Err(format!(
                "context_history_window ({}) should be <= mode_history_capacity ({})",
                self.context_history_window, self.mode_history_capacity
            ));
        }
        if self.min_adaptation_samples == 0 {
            return Err("min_adaptation_samples must be at least 1".into());
        }
        Ok(())
    }
}
