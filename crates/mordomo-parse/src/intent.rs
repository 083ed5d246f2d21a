//! Intent-classification ontology: the typed result the parser LLM returns
//! for free-form analytic messages, validated at the boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Reminder,
    Event,
    Recurring,
    List,
    Query,
    Media,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Datetime,
    ItemName,
    Category,
    Location,
    Person,
    MediaTitle,
    Quantity,
    Recurrence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub value: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.9
}

/// A secondary action to offer after the main one (e.g. classify a recipe
/// reminder *and* propose a shopping list).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpSuggestion {
    pub task_type: TaskType,
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
    #[serde(default)]
    pub prompt_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    pub task_type: TaskType,
    pub confidence: f64,
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
    #[serde(default)]
    pub requires_clarification: bool,
    #[serde(default)]
    pub clarification_options: Option<Vec<String>>,
    #[serde(default)]
    pub follow_up_suggestion: Option<FollowUpSuggestion>,
}

impl IntentClassification {
    /// Below 0.7 the classification is not actionable on its own.
    pub const CLARIFICATION_THRESHOLD: f64 = 0.7;

    pub fn fallback() -> Self {
        Self {
            task_type: TaskType::General,
            confidence: 0.5,
            entities: Vec::new(),
            requires_clarification: true,
            clarification_options: None,
            follow_up_suggestion: None,
        }
    }

    fn normalize(mut self) -> Self {
        if self.confidence < Self::CLARIFICATION_THRESHOLD {
            self.requires_clarification = true;
        }
        self
    }
}

/// Pull a JSON object out of an LLM reply that may wrap it in a markdown
/// fence or surrounding prose.
pub fn extract_json(text: &str) -> &str {
    let t = text.trim();
    if let Some(start) = t.find("```") {
        let after = &t[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }
    match (t.find('{'), t.rfind('}')) {
        (Some(s), Some(e)) if e > s => &t[s..=e],
        _ => t,
    }
}

/// Parse the parser-LLM's classification reply. Any failure returns the
/// conservative fallback rather than an error — a bad judgement must never
/// break the turn.
pub fn parse_intent_reply(raw: &str) -> IntentClassification {
    let json = extract_json(raw);
    match serde_json::from_str::<IntentClassification>(json) {
        Ok(intent) => intent.normalize(),
        Err(_) => IntentClassification::fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_confidence_forces_clarification() {
        let raw = r#"{"task_type": "reminder", "confidence": 0.4}"#;
        let intent = parse_intent_reply(raw);
        assert_eq!(intent.task_type, TaskType::Reminder);
        assert!(intent.requires_clarification);
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "Here you go:\n```json\n{\"task_type\": \"list\", \"confidence\": 0.95}\n```";
        let intent = parse_intent_reply(raw);
        assert_eq!(intent.task_type, TaskType::List);
        assert!(!intent.requires_clarification);
    }

    #[test]
    fn garbage_falls_back_to_general() {
        let intent = parse_intent_reply("no json here");
        assert_eq!(intent.task_type, TaskType::General);
        assert!(intent.requires_clarification);
    }

    #[test]
    fn entities_deserialize_with_type_field() {
        let raw = r#"{"task_type":"event","confidence":0.9,
            "entities":[{"type":"datetime","value":"amanhã 10h","confidence":0.8}]}"#;
        let intent = parse_intent_reply(raw);
        assert_eq!(intent.entities.len(), 1);
        assert_eq!(intent.entities[0].entity_type, EntityType::Datetime);
    }
}
