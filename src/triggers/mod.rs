//! Trigger definitions and condition evaluation
//!
//! Triggers are rate-limited rules mapping a condition over domain events to
//! a message template. The registry is built once at construction
//! ([`catalog::default_registry`]) and only its cooldown stamps mutate
//! afterwards; entries are never added or removed at runtime.

pub mod catalog;

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::personas::Persona;
use crate::types::{event_kinds, DomainEvent};

/// Condition over domain events deciding whether a trigger fires.
#[derive(Debug, Clone)]
pub enum TriggerCondition {
    /// Fires when an event of exactly this kind arrives.
    Event { name: String },
    /// Fires on `user_idle` events whose reported idle time meets the
    /// threshold.
    IdleTime { threshold: Duration },
    /// Requires host-application state this core does not own. Never
    /// matches; kept as an explicit variant, not a gap to fill silently.
    StateBased { params: Value },
    /// Requires host-application content inspection. Never matches; see
    /// `StateBased`.
    ContentBased { params: Value },
}

/// A rate-limited trigger owned by one persona.
///
/// `last_fired_at` is stamped only by the evaluator, is monotonically
/// non-decreasing, and gates re-firing by `cooldown`.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: String,
    pub trigger_type: String,
    pub persona: Persona,
    pub condition: TriggerCondition,
    pub cooldown: Duration,
    /// Descriptive metadata for UI sort/badge purposes; the evaluator does
    /// not use it to suppress lower-priority matches.
    pub priority: u8,
    pub last_fired_at: Option<Instant>,
}

impl Trigger {
    pub fn new(
        id: &str,
        trigger_type: &str,
        persona: Persona,
        condition: TriggerCondition,
        cooldown: Duration,
        priority: u8,
    ) -> Self {
        Self {
            id: id.to_string(),
            trigger_type: trigger_type.to_string(),
            persona,
            condition,
            cooldown,
            priority,
            last_fired_at: None,
        }
    }

    /// Whether the trigger is still inside its cooldown window at `now`.
    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.last_fired_at
            .map(|fired| now.duration_since(fired) < self.cooldown)
            .unwrap_or(false)
    }
}

/// Evaluate a condition against an incoming event.
pub fn condition_matches(condition: &TriggerCondition, event: &DomainEvent) -> bool {
    match condition {
        TriggerCondition::Event { name } => event.kind == *name,
        TriggerCondition::IdleTime { threshold } => {
            event.kind == event_kinds::USER_IDLE
                && event
                    .idle_time_ms()
                    .map(|ms| ms >= threshold.as_millis() as u64)
                    .unwrap_or(false)
        }
        TriggerCondition::StateBased { .. } | TriggerCondition::ContentBased { .. } => {
            log::debug!("triggers: state/content condition skipped (not wired to host state)");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_condition_matches_kind() {
        let condition = TriggerCondition::Event {
            name: event_kinds::CANVAS_EMPTIED.to_string(),
        };
        assert!(condition_matches(
            &condition,
            &DomainEvent::new(event_kinds::CANVAS_EMPTIED)
        ));
        assert!(!condition_matches(
            &condition,
            &DomainEvent::new(event_kinds::CARD_CREATED)
        ));
    }

    #[test]
    fn test_idle_condition_requires_threshold() {
        let condition = TriggerCondition::IdleTime {
            threshold: Duration::from_secs(60),
        };
        let over = DomainEvent::with_payload(event_kinds::USER_IDLE, json!({"idleTimeMs": 61000}));
        let under = DomainEvent::with_payload(event_kinds::USER_IDLE, json!({"idleTimeMs": 59000}));
        let missing = DomainEvent::new(event_kinds::USER_IDLE);

        assert!(condition_matches(&condition, &over));
        assert!(!condition_matches(&condition, &under));
        assert!(!condition_matches(&condition, &missing));
    }

    #[test]
    fn test_stubbed_conditions_never_match() {
        let state = TriggerCondition::StateBased {
            params: json!({"minCards": 12}),
        };
        let content = TriggerCondition::ContentBased {
            params: json!({"tags": ["heritage"]}),
        };
        let event = DomainEvent::new(event_kinds::CARD_CREATED);
        assert!(!condition_matches(&state, &event));
        assert!(!condition_matches(&content, &event));
    }

    #[test]
    fn test_cooldown_gate() {
        let mut trigger = Trigger::new(
            "tr-test",
            "test",
            Persona::Muse,
            TriggerCondition::Event {
                name: event_kinds::CARD_CREATED.to_string(),
            },
            Duration::from_secs(300),
            50,
        );

        let now = Instant::now();
        assert!(!trigger.in_cooldown(now), "never-fired trigger is eligible");

        trigger.last_fired_at = Some(now);
        assert!(trigger.in_cooldown(now));
        assert!(!trigger.in_cooldown(now + Duration::from_secs(301)));
    }
}
