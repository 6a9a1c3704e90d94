use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::personas::Persona;
use crate::preferences::AgentPreferences;

/// Maximum number of live messages kept in state. Oldest entries are evicted
/// first once the list grows past this, regardless of read/dismissed state.
pub const MAX_LIVE_MESSAGES: usize = 50;

/// Maximum number of suggestions kept in state, oldest evicted first.
pub const MAX_SUGGESTIONS: usize = 10;

/// Event kinds published by the host application, plus the synthetic
/// `user_idle` kind produced by the idle watchdog.
pub mod event_kinds {
    pub const CANVAS_EMPTIED: &str = "canvas_emptied";
    pub const CARD_CREATED: &str = "card_created";
    pub const CARD_DELETED: &str = "card_deleted";
    pub const GENERATION_STARTED: &str = "generation_started";
    pub const GENERATION_COMPLETED: &str = "generation_completed";
    pub const GENERATION_FAILED: &str = "generation_failed";
    pub const CONNECTION_CREATED: &str = "connection_created";
    pub const CONNECTION_DELETED: &str = "connection_deleted";
    pub const STYLE_APPLIED: &str = "style_applied";
    pub const WORKFLOW_COMPLETED: &str = "workflow_completed";
    pub const USER_IDLE: &str = "user_idle";
}

/// A notification from the host application (or the idle watchdog) that
/// something happened. Consumed synchronously, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(kind: &str) -> Self {
        Self::with_payload(kind, Value::Null)
    }

    pub fn with_payload(kind: &str, payload: Value) -> Self {
        Self {
            kind: kind.to_string(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Idle duration carried by a synthetic `user_idle` event, if present.
    pub fn idle_time_ms(&self) -> Option<u64> {
        self.payload.get("idleTimeMs").and_then(Value::as_u64)
    }
}

/// What a message is for, from the subscriber's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Suggestion,
    Recommendation,
    Education,
}

/// Response verbs a message or suggestion can carry.
///
/// Host-supplied actions deserialize unrecognized verbs into `Unknown`,
/// which the executor rejects as `{success: false, error: "unknown action"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Apply,
    Preview,
    Modify,
    Dismiss,
    Snooze,
    Never,
    Custom,
    #[serde(other)]
    Unknown,
}

/// An action embedded in a message or suggestion. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub label: String,
    pub is_primary: bool,
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Action {
    pub fn new(label: &str, kind: ActionKind, is_primary: bool) -> Self {
        Self {
            id: format!("act-{}", Uuid::new_v4()),
            label: label.to_string(),
            is_primary,
            kind,
            payload: None,
        }
    }

    pub fn with_payload(label: &str, kind: ActionKind, is_primary: bool, payload: Value) -> Self {
        Self {
            payload: Some(payload),
            ..Self::new(label, kind, is_primary)
        }
    }
}

/// A notification surfaced to the user on behalf of a persona.
///
/// `is_dismissed` is monotone: once set it never reverts. Messages are only
/// removed by capacity eviction or `clear_messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub persona: Persona,
    pub kind: MessageKind,
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub is_dismissed: bool,
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Message {
    pub fn new(persona: Persona, kind: MessageKind, title: &str, body: &str, actions: Vec<Action>) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4()),
            persona,
            kind,
            title: title.to_string(),
            body: body.to_string(),
            timestamp: Utc::now(),
            is_read: false,
            is_dismissed: false,
            actions,
            context: None,
        }
    }
}

/// A higher-confidence actionable recommendation produced by the analysis
/// pipeline (or supplied directly by the host).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub persona: Persona,
    pub title: String,
    pub description: String,
    /// Always within [0, 1].
    pub confidence: f64,
    pub actions: Vec<Action>,
    pub created_at: DateTime<Utc>,
}

/// Host-supplied suggestion fields; the orchestrator stamps id and creation
/// time on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionInput {
    pub persona: Persona,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl SuggestionInput {
    pub(crate) fn into_suggestion(self) -> Suggestion {
        Suggestion {
            id: format!("sug-{}", Uuid::new_v4()),
            persona: self.persona,
            title: self.title,
            description: self.description,
            confidence: self.confidence.clamp(0.0, 1.0),
            actions: self.actions,
            created_at: Utc::now(),
        }
    }
}

/// Result of dispatching an action, as handed back to the host UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionOutcome {
    pub fn ok(result: Option<Value>) -> Self {
        Self {
            success: true,
            result,
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
        }
    }
}

/// The aggregate orchestrator state handed to subscribers as a snapshot.
///
/// `unread_count` is derived: it is recomputed from `messages` after every
/// message mutation and never drifts from
/// `|{m : !m.is_read && !m.is_dismissed}|`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorState {
    pub active_persona: Option<Persona>,
    pub is_panel_open: bool,
    pub is_presence_visible: bool,
    pub messages: Vec<Message>,
    pub unread_count: usize,
    pub is_analyzing: bool,
    /// Percentage within [0, 100].
    pub analysis_progress: u8,
    pub suggestions: Vec<Suggestion>,
    pub preferences: AgentPreferences,
}

impl OrchestratorState {
    pub fn with_preferences(preferences: AgentPreferences) -> Self {
        Self {
            active_persona: None,
            is_panel_open: false,
            is_presence_visible: true,
            messages: Vec::new(),
            unread_count: 0,
            is_analyzing: false,
            analysis_progress: 0,
            suggestions: Vec::new(),
            preferences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_action_kind_deserializes_to_unknown() {
        let action: Action = serde_json::from_str(
            r#"{"id": "act-1", "label": "Do it", "isPrimary": true, "kind": "teleport"}"#,
        )
        .expect("deserialize");
        assert_eq!(action.kind, ActionKind::Unknown);
    }

    #[test]
    fn test_idle_time_payload_accessor() {
        let event = DomainEvent::with_payload(
            event_kinds::USER_IDLE,
            serde_json::json!({"idleTimeMs": 45000}),
        );
        assert_eq!(event.idle_time_ms(), Some(45000));

        let plain = DomainEvent::new(event_kinds::CARD_CREATED);
        assert_eq!(plain.idle_time_ms(), None);
    }

    #[test]
    fn test_suggestion_input_clamps_confidence() {
        let input = SuggestionInput {
            persona: Persona::Curator,
            title: "Group these".to_string(),
            description: "Three cards share a palette".to_string(),
            confidence: 1.7,
            actions: Vec::new(),
        };
        let suggestion = input.into_suggestion();
        assert!(suggestion.confidence <= 1.0);
        assert!(suggestion.id.starts_with("sug-"));
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = OrchestratorState::with_preferences(AgentPreferences::default());
        let json = serde_json::to_value(&state).expect("serialize");
        assert!(json.get("unreadCount").is_some());
        assert!(json.get("isPanelOpen").is_some());
        assert!(json.get("analysisProgress").is_some());
    }
}
