//! Recovery pipeline for malformed deliberative output
//!
//! Generation output is supposed to be a JSON object with an `actions`
//! array, but models wrap it in prose, leave trailing commas, or drop the
//! structure entirely. The pipeline tries four stages in order, each
//! side-effect free:
//!
//! 1. strict parse of the whole response
//! 2. strip trailing separators, parse again
//! 3. extract the first balanced `{...}` substring (separator strip
//!    re-applied) and parse that
//! 4. line-oriented `key: value` extraction with literal coercion
//!
//! If all four fail the cognitive path simply produced no actions; nothing
//! here raises.

use crate::actions::Action;

/// Confidence assigned to deliberative actions that carry none of their own
pub const DEFAULT_COGNITIVE_CONFIDENCE: f64 = 0.7;

/// Run the full pipeline over a raw response
pub fn recover_actions(raw: &str) -> Vec<Action> {
    // Stage 1: the response is exactly what was asked for
    if let Some(actions) = parse_stage(raw) {
        return actions;
    }
    // Stage 2: trailing separators are the most common corruption
    if let Some(actions) = parse_stage(&strip_trailing_separators(raw)) {
        tracing::debug!("cognitive output recovered by separator stripping");
        return actions;
    }
    // Stage 3: structure buried in prose
    if let Some(extracted) = extract_balanced_object(raw) {
        if let Some(actions) =
            parse_stage(extracted).or_else(|| parse_stage(&strip_trailing_separators(extracted)))
        {
            tracing::debug!("cognitive output recovered by balanced extraction");
            return actions;
        }
    }
    // Stage 4: no JSON at all, scrape key: value lines
    if let Some(actions) = extract_from_lines(raw) {
        tracing::debug!("cognitive output recovered by line extraction");
        return actions;
    }
    tracing::warn!("cognitive output unusable after all recovery stages");
    Vec::new()
}

fn parse_stage(text: &str) -> Option<Vec<Action>> {
    let value: serde_json::Value = serde_json::from_str(text.trim()).ok()?;
    actions_from_value(value)
}

/// Accepts `{"actions": [...]}`, a bare array, or a single action object
fn actions_from_value(value: serde_json::Value) -> Option<Vec<Action>> {
    let items = match value {
        serde_json::Value::Object(ref map) if map.contains_key("actions") => {
            match map.get("actions") {
                Some(serde_json::Value::Array(items)) => items.clone(),
                _ => return None,
            }
        }
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => return None,
    };
    Some(items.into_iter().filter_map(action_from_object).collect())
}

fn action_from_object(value: serde_json::Value) -> Option<Action> {
    let map = value.as_object()?;
    let kind = map.get("type")?.as_str()?.to_string();

    let mut action = Action::new(kind);
    action.target = map.get("target").and_then(|v| v.as_str()).map(String::from);
    action.content = map
        .get("content")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    action.confidence = map
        .get("confidence")
        .and_then(|v| v.as_f64())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_COGNITIVE_CONFIDENCE);
    Some(action)
}

/// Remove commas whose next non-whitespace character closes an object or
/// array. String literals are left untouched.
fn strip_trailing_separators(text: &str) -> String {
    let bytes: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in bytes.iter().enumerate() {
        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let next = bytes[i + 1..].iter().copied().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }
    result
}

/// First balanced `{...}` region, honoring string literals and escapes
fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Last resort: scrape `key: value` lines into a single action record
fn extract_from_lines(text: &str) -> Option<Vec<Action>> {
    let mut map = serde_json::Map::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches('"');
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        map.insert(key.to_string(), coerce_literal(value.trim()));
    }
    if !map.contains_key("type") {
        return None;
    }
    actions_from_value(serde_json::Value::Object(map))
}

/// Recognize boolean and numeric literals; everything else is a string
fn coerce_literal(raw: &str) -> serde_json::Value {
    let trimmed = raw.trim_end_matches(',').trim().trim_matches('"');
    match trimmed {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = trimmed.parse::<f64>() {
                serde_json::json!(n)
            } else {
                serde_json::Value::String(trimmed.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_parse_of_clean_response() {
        let raw = r#"{"actions": [{"type": "inform", "target": "agent-1", "confidence": 0.9}]}"#;
        let actions = recover_actions(raw);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, "inform");
        assert_eq!(actions[0].target.as_deref(), Some("agent-1"));
        assert!((actions[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_bare_array_accepted() {
        let raw = r#"[{"type": "inform"}, {"type": "query"}]"#;
        let actions = recover_actions(raw);
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_trailing_comma_recovered() {
        let raw = r#"{"actions": [{"type": "inform",}]}"#;
        let actions = recover_actions(raw);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, "inform");
    }

    #[test]
    fn test_prose_wrapped_object_with_trailing_comma() {
        // Prose prefix defeats stages 1 and 2; balanced extraction plus
        // separator stripping still lands it
        let raw = "Here: {\"actions\": [{\"type\":\"inform\",}]}";
        let actions = recover_actions(raw);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, "inform");
    }

    #[test]
    fn test_prose_wrapped_clean_object() {
        let raw = "Sure, here is my plan:\n{\"actions\": [{\"type\": \"move\"}]}\nDone.";
        let actions = recover_actions(raw);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, "move");
    }

    #[test]
    fn test_line_oriented_fallback_with_coercion() {
        let raw = "type: inform\ntarget: agent-9\nconfidence: 0.4\nurgent: true";
        let actions = recover_actions(raw);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, "inform");
        assert_eq!(actions[0].target.as_deref(), Some("agent-9"));
        assert!((actions[0].confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_unusable_output_yields_empty_not_panic() {
        assert!(recover_actions("I am not sure what to do.").is_empty());
        assert!(recover_actions("").is_empty());
        assert!(recover_actions("{\"thoughts\": \"no actions key\"").is_empty());
    }

    #[test]
    fn test_missing_confidence_gets_default() {
        let raw = r#"{"actions": [{"type": "inform"}]}"#;
        let actions = recover_actions(raw);
        assert!((actions[0].confidence - DEFAULT_COGNITIVE_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn test_comma_inside_string_survives_stripping() {
        let raw = r#"{"actions": [{"type": "inform", "content": "a, b,]",}]}"#;
        let actions = recover_actions(raw);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].content, serde_json::json!("a, b,]"));
    }

    #[test]
    fn test_non_action_items_are_dropped() {
        let raw = r#"{"actions": [{"type": "inform"}, "garbage", {"no_type": 1}]}"#;
        let actions = recover_actions(raw);
        assert_eq!(actions.len(), 1);
    }
}
