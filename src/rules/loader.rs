//! Load reflexive rules and dynamics rules from TOML files

use crate::environment::dynamics::{
    Adjustment, DynamicsEffect, DynamicsRule, DynamicsTrigger,
};
use crate::rules::condition::Condition;
use crate::rules::engine::{ActionTemplate, Rule};
use std::fs;
use std::path::Path;

/// Load a reflexive rule set from a TOML file
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_rules_toml(&content)
}

/// Load dynamics rules from a TOML file
pub fn load_dynamics_rules(path: &Path) -> Result<Vec<DynamicsRule>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_dynamics_toml(&content)
}

/// Parse `[[rules]]` tables into reflexive rules
pub fn parse_rules_toml(content: &str) -> Result<Vec<Rule>, String> {
    let toml: toml::Value = content.parse().map_err(|e| format!("Invalid TOML: {}", e))?;

    let mut rules = Vec::new();
    if let Some(entries) = toml.get("rules").and_then(|v| v.as_array()) {
        for entry in entries {
            rules.push(parse_rule(entry)?);
        }
    }
    Ok(rules)
}

fn parse_rule(value: &toml::Value) -> Result<Rule, String> {
    let name = value
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or("rule missing name")?
        .to_string();

    let priority = value
        .get("priority")
        .and_then(|v| v.as_integer())
        .ok_or_else(|| format!("{}: rule missing priority", name))? as i32;

    let action_table = value
        .get("action")
        .ok_or_else(|| format!("{}: rule missing action", name))?;
    let kind = action_table
        .get("kind")
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("{}: action missing kind", name))?;
    let content = action_table
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let mut template = ActionTemplate::new(kind, content);
    if let Some(target) = action_table.get("target").and_then(|v| v.as_str()) {
        template = template.with_target(target);
    }
    if action_table
        .get("acknowledge")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        template = template.acknowledging();
    }

    let mut rule = Rule::new(name.clone(), priority, template);
    if value
        .get("continue_matching")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        rule = rule.continuing();
    }

    if let Some(conditions) = value.get("conditions").and_then(|v| v.as_table()) {
        for (field, spec) in conditions {
            rule = rule.when(field.clone(), parse_condition(&name, spec)?);
        }
    }
    Ok(rule)
}

/// A condition is either a bare literal (equality) or an operator table
/// `{ op = ">", value = 0.5 }`
fn parse_condition(rule: &str, spec: &toml::Value) -> Result<Condition, String> {
    if let Some(table) = spec.as_table() {
        if let Some(op) = table.get("op").and_then(|v| v.as_str()) {
            let operand = table
                .get("value")
                .ok_or_else(|| format!("{}: operator condition missing value", rule))?;
            return Condition::from_operator(op, toml_to_json(operand))
                .map_err(|e| format!("{}: {}", rule, e));
        }
    }
    Ok(Condition::Equals(toml_to_json(spec)))
}

/// Parse `[[dynamics_rules]]` tables
pub fn parse_dynamics_toml(content: &str) -> Result<Vec<DynamicsRule>, String> {
    let toml: toml::Value = content.parse().map_err(|e| format!("Invalid TOML: {}", e))?;

    let mut rules = Vec::new();
    if let Some(entries) = toml.get("dynamics_rules").and_then(|v| v.as_array()) {
        for entry in entries {
            rules.push(parse_dynamics_rule(entry)?);
        }
    }
    Ok(rules)
}

fn parse_dynamics_rule(value: &toml::Value) -> Result<DynamicsRule, String> {
    let name = value
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or("dynamics rule missing name")?
        .to_string();

    let trigger_table = value
        .get("trigger")
        .ok_or_else(|| format!("{}: missing trigger", name))?;
    let trigger = if let Some(p) = trigger_table.get("probability").and_then(number) {
        DynamicsTrigger::Probability(p)
    } else {
        let variable = trigger_table
            .get("variable")
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("{}: trigger needs probability or variable", name))?;
        let at_least = trigger_table
            .get("at_least")
            .and_then(number)
            .ok_or_else(|| format!("{}: threshold trigger missing at_least", name))?;
        DynamicsTrigger::Threshold {
            variable: variable.to_string(),
            at_least,
        }
    };

    let mut effects = Vec::new();
    if let Some(entries) = value.get("effects").and_then(|v| v.as_array()) {
        for effect in entries {
            let variable = effect
                .get("variable")
                .and_then(|v| v.as_str())
                .ok_or_else(|| format!("{}: effect missing variable", name))?;
            let adjustment = if let Some(fixed) = effect.get("fixed").and_then(number) {
                Adjustment::Fixed(fixed)
            } else {
                let low = effect
                    .get("low")
                    .and_then(number)
                    .ok_or_else(|| format!("{}: effect needs fixed or low/high", name))?;
                let high = effect
                    .get("high")
                    .and_then(number)
                    .ok_or_else(|| format!("{}: effect needs fixed or low/high", name))?;
                Adjustment::RandomRange { low, high }
            };
            effects.push(DynamicsEffect {
                variable: variable.to_string(),
                adjustment,
            });
        }
    }
    if effects.is_empty() {
        return Err(format!("{}: dynamics rule has no effects", name));
    }

    Ok(DynamicsRule {
        name,
        trigger,
        effects,
    })
}

fn number(value: &toml::Value) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|i| i as f64))
}

fn toml_to_json(value: &toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::json!(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::json!(b),
        toml::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => serde_json::json!(dt.to_string()),
    }
}
