//! Priority-ordered reflexive rule matching
//!
//! Rules are tried in descending priority for each stimulus; the first
//! full condition match instantiates the rule's action template and (unless
//! the rule opts into `continue_matching`) ends matching for that stimulus.
//! Stimuli in one batch are processed independently of each other. A rule
//! whose condition evaluation faults is skipped and logged, and the
//! stimulus is re-offered to the next rule in line.

use crate::actions::Action;
use crate::control::stimulus::{Stimulus, StimulusKind};
use crate::core::types::ProcessingMode;
use crate::rules::condition::Condition;

/// Confidence assigned to every reflexively produced action
pub const REFLEXIVE_CONFIDENCE: f64 = 0.8;

/// What a matching rule emits, with `{field}` placeholders drawn from the
/// triggering stimulus
#[derive(Debug, Clone)]
pub struct ActionTemplate {
    pub kind: String,
    pub target: Option<String>,
    pub content: String,
    /// Acknowledging templates auto-address the stimulus source when the
    /// stimulus is a message and no explicit target is set
    pub acknowledge: bool,
}

impl ActionTemplate {
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            content: content.into(),
            acknowledge: false,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn acknowledging(mut self) -> Self {
        self.acknowledge = true;
        self
    }
}

/// One reflexive rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    /// Higher fires first; ties fire in declaration order
    pub priority: i32,
    /// Every (field, condition) pair must hold for the rule to match
    pub conditions: Vec<(String, Condition)>,
    pub action: ActionTemplate,
    pub continue_matching: bool,
}

impl Rule {
    pub fn new(name: impl Into<String>, priority: i32, action: ActionTemplate) -> Self {
        Self {
            name: name.into(),
            priority,
            conditions: Vec::new(),
            action,
            continue_matching: false,
        }
    }

    pub fn when(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.conditions.push((field.into(), condition));
        self
    }

    pub fn continuing(mut self) -> Self {
        self.continue_matching = true;
        self
    }
}

/// Generic condition/action matcher used by the reflexive path
#[derive(Debug, Default)]
pub struct RuleEngine {
    /// Kept sorted by descending priority; stable for equal priorities
    rules: Vec<Rule>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut engine = Self::new();
        for rule in rules {
            engine.add_rule(rule);
        }
        engine
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
        self.rules.sort_by_key(|r| std::cmp::Reverse(r.priority));
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Match one stimulus against the rule set
    pub fn match_stimulus(&self, stimulus: &Stimulus) -> Vec<Action> {
        let mut actions = Vec::new();
        for rule in &self.rules {
            match Self::rule_matches(rule, stimulus) {
                Ok(false) => continue,
                Ok(true) => {
                    actions.push(Self::instantiate(rule, stimulus));
                    if !rule.continue_matching {
                        break;
                    }
                }
                Err(err) => {
                    // Faulty rule, not a faulty cycle: skip and try the next
                    tracing::warn!(rule = %rule.name, stimulus = %stimulus.id, %err,
                        "rule evaluation failed, skipping");
                }
            }
        }
        actions
    }

    /// Match a batch; each stimulus is processed independently
    pub fn process(&self, stimuli: &[Stimulus]) -> Vec<Action> {
        stimuli
            .iter()
            .flat_map(|s| self.match_stimulus(s))
            .collect()
    }

    fn rule_matches(
        rule: &Rule,
        stimulus: &Stimulus,
    ) -> Result<bool, crate::rules::condition::ConditionError> {
        for (field, condition) in &rule.conditions {
            if !condition.evaluate(stimulus.field(field).as_ref())? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn instantiate(rule: &Rule, stimulus: &Stimulus) -> Action {
        let mut action = Action::new(rule.action.kind.clone());
        action.content =
            serde_json::Value::String(Self::substitute(&rule.action.content, stimulus));
        action.target = rule
            .action
            .target
            .as_ref()
            .map(|t| Self::substitute(t, stimulus));
        if action.target.is_none()
            && rule.action.acknowledge
            && stimulus.kind == StimulusKind::Message
        {
            action.target = stimulus.source.clone();
        }
        action.confidence = REFLEXIVE_CONFIDENCE;
        action.processing_mode = Some(ProcessingMode::Reflexive);
        action.rule_name = Some(rule.name.clone());
        action.triggered_by = Some(stimulus.id.clone());
        action
    }

    /// Replace `{field}` placeholders with the stimulus field's value
    fn substitute(template: &str, stimulus: &Stimulus) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            result.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[..close];
                    match stimulus.field(name) {
                        Some(serde_json::Value::String(s)) => result.push_str(&s),
                        Some(value) => result.push_str(&value.to_string()),
                        None => {
                            // Unknown placeholder stays as written
                            result.push('{');
                            result.push_str(name);
                            result.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    result.push('{');
                    rest = after;
                }
            }
        }
        result.push_str(rest);
        result
    }
}
