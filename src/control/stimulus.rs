//! Inbound stimulus records
//!
//! Stimuli arrive from external feeds (message bus, task queue, the
//! environment itself) and are treated as opaque records with a small
//! required field set. Typed accessors cover the fields the controller
//! cares about; everything else rides along for rule conditions to match.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Broad source category of a stimulus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusKind {
    Message,
    Task,
    Proximity,
    Conflict,
}

impl StimulusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Task => "task",
            Self::Proximity => "proximity",
            Self::Conflict => "conflict",
        }
    }
}

/// Priority attached to task stimuli
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Critical,
    High,
    Normal,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// One opaque inbound record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stimulus {
    pub id: String,
    pub kind: StimulusKind,
    pub source: Option<String>,
    pub fields: AHashMap<String, serde_json::Value>,
}

impl Stimulus {
    pub fn new(kind: StimulusKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            source: None,
            fields: AHashMap::new(),
        }
    }

    /// A message stimulus with performative and content
    pub fn message(
        source: impl Into<String>,
        performative: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let performative: String = performative.into();
        let content: String = content.into();
        let mut stimulus = Self::new(StimulusKind::Message);
        stimulus.source = Some(source.into());
        stimulus
            .fields
            .insert("performative".into(), serde_json::json!(performative));
        stimulus
            .fields
            .insert("content".into(), serde_json::json!(content));
        stimulus
    }

    /// A task stimulus with a type and priority
    pub fn task(task_type: impl Into<String>, priority: TaskPriority) -> Self {
        let task_type: String = task_type.into();
        let mut stimulus = Self::new(StimulusKind::Task);
        stimulus
            .fields
            .insert("task_type".into(), serde_json::json!(task_type));
        stimulus
            .fields
            .insert("priority".into(), serde_json::json!(priority.as_str()));
        stimulus
    }

    /// A conflict stimulus (competing claims, contested resources)
    pub fn conflict(description: impl Into<String>) -> Self {
        let description: String = description.into();
        let mut stimulus = Self::new(StimulusKind::Conflict);
        stimulus
            .fields
            .insert("description".into(), serde_json::json!(description));
        stimulus
    }

    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up a field, resolving the builtin names `kind`, `source`, `id`
    pub fn field(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            "kind" => Some(serde_json::json!(self.kind.as_str())),
            "source" => self.source.as_ref().map(|s| serde_json::json!(s)),
            "id" => Some(serde_json::json!(self.id)),
            _ => self.fields.get(name).cloned(),
        }
    }

    pub fn performative(&self) -> Option<&str> {
        self.fields.get("performative").and_then(|v| v.as_str())
    }

    /// Byte length of string content, 0 when absent
    pub fn content_len(&self) -> usize {
        self.fields
            .get("content")
            .and_then(|v| v.as_str())
            .map(str::len)
            .unwrap_or(0)
    }

    pub fn priority(&self) -> Option<TaskPriority> {
        self.fields
            .get("priority")
            .and_then(|v| v.as_str())
            .and_then(TaskPriority::parse)
    }

    pub fn task_type(&self) -> Option<&str> {
        self.fields.get("task_type").and_then(|v| v.as_str())
    }

    pub fn is_critical_task(&self) -> bool {
        self.kind == StimulusKind::Task && self.priority() == Some(TaskPriority::Critical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructor_sets_required_fields() {
        let stimulus = Stimulus::message("agent-1", "query", "what is the load?");
        assert_eq!(stimulus.kind, StimulusKind::Message);
        assert_eq!(stimulus.performative(), Some("query"));
        assert_eq!(stimulus.content_len(), "what is the load?".len());
        assert_eq!(stimulus.source.as_deref(), Some("agent-1"));
    }

    #[test]
    fn test_builtin_field_resolution() {
        let stimulus = Stimulus::message("agent-1", "inform", "x");
        assert_eq!(
            stimulus.field("kind"),
            Some(serde_json::json!("message"))
        );
        assert_eq!(
            stimulus.field("source"),
            Some(serde_json::json!("agent-1"))
        );
        assert!(stimulus.field("nonexistent").is_none());
    }

    #[test]
    fn test_task_priority_parse_roundtrip() {
        for p in [
            TaskPriority::Critical,
            TaskPriority::High,
            TaskPriority::Normal,
            TaskPriority::Low,
        ] {
            assert_eq!(TaskPriority::parse(p.as_str()), Some(p));
        }
        assert!(TaskPriority::parse("urgent").is_none());
    }

    #[test]
    fn test_critical_task_detection() {
        assert!(Stimulus::task("planning", TaskPriority::Critical).is_critical_task());
        assert!(!Stimulus::task("planning", TaskPriority::High).is_critical_task());
        assert!(!Stimulus::message("a", "propose", "x").is_critical_task());
    }
}
