//! Message factory
//!
//! Pure table-driven mapping from trigger type to message template. Each
//! template fixes the message kind, a title interpolating the persona's
//! display name and icon, a body, and an ordered action list with one
//! designated primary. Unknown trigger types produce no message. New trigger
//! types are added here and in `triggers::catalog` without touching the
//! evaluator.

use serde_json::json;

use crate::personas::{Persona, PersonaMeta};
use crate::types::{Action, ActionKind, DomainEvent, Message, MessageKind};

struct Template {
    kind: MessageKind,
    /// `{icon}` and `{name}` are replaced with the persona's metadata.
    title: &'static str,
    body: &'static str,
    actions: fn() -> Vec<Action>,
}

fn template_for(trigger_type: &str) -> Option<Template> {
    let template = match trigger_type {
        "empty_canvas" => Template {
            kind: MessageKind::Suggestion,
            title: "{icon} {name} has a starting point",
            body: "Your canvas is empty. Want a few seed compositions to react to \
                   instead of a blank page?",
            actions: || {
                vec![
                    Action::new("Show me", ActionKind::Apply, true),
                    Action::new("Preview", ActionKind::Preview, false),
                    Action::new("Not now", ActionKind::Dismiss, false),
                ]
            },
        },
        "long_pause" => Template {
            kind: MessageKind::Suggestion,
            title: "{icon} {name} noticed a pause",
            body: "You've been looking at this for a while. I can sketch a few \
                   variations of the last card to get things moving again.",
            actions: || {
                vec![
                    Action::new("Sketch variations", ActionKind::Apply, true),
                    Action::new("Open panel", ActionKind::Modify, false),
                    Action::new("Snooze", ActionKind::Snooze, false),
                ]
            },
        },
        "post_generation" => Template {
            kind: MessageKind::Recommendation,
            title: "{icon} {name} can file this",
            body: "That generation looks close to two of your existing collections. \
                   I can tag it and file it where it belongs.",
            actions: || {
                vec![
                    Action::new("Organize it", ActionKind::Apply, true),
                    Action::new("Preview placement", ActionKind::Preview, false),
                    Action::new("Dismiss", ActionKind::Dismiss, false),
                ]
            },
        },
        "error_occurred" => Template {
            kind: MessageKind::Education,
            title: "{icon} {name} found a likely fix",
            body: "The last generation failed at the upscale step. Lowering the \
                   batch size usually clears this; I can adjust the workflow.",
            actions: || {
                vec![
                    Action::new("Apply fix", ActionKind::Apply, true),
                    Action::with_payload("Retry as-is", ActionKind::Custom, false, json!({"action": "retry"})),
                    Action::new("Dismiss", ActionKind::Dismiss, false),
                ]
            },
        },
        "workflow_complete" => Template {
            kind: MessageKind::Recommendation,
            title: "{icon} {name} can package the results",
            body: "Your workflow finished with a full set of outputs. I can bundle \
                   them into a delivery-ready export.",
            actions: || {
                vec![
                    Action::new("Package", ActionKind::Apply, true),
                    Action::with_payload("Export raw", ActionKind::Custom, false, json!({"action": "export"})),
                    Action::new("Later", ActionKind::Snooze, false),
                ]
            },
        },
        "cultural_context" => Template {
            kind: MessageKind::Education,
            title: "{icon} {name} has context to share",
            body: "The style you applied draws on a specific tradition. Knowing its \
                   origins can sharpen how you use it, and how you credit it.",
            actions: || {
                vec![
                    Action::new("Learn more", ActionKind::Preview, true),
                    Action::new("Add context card", ActionKind::Apply, false),
                    Action::new("Don't show these", ActionKind::Never, false),
                ]
            },
        },
        "collection_growing" => Template {
            kind: MessageKind::Suggestion,
            title: "{icon} {name} sees a collection forming",
            body: "A dozen ungrouped cards share a palette and subject. Want me to \
                   draft a collection from them?",
            actions: || {
                vec![
                    Action::new("Draft collection", ActionKind::Apply, true),
                    Action::new("Preview grouping", ActionKind::Preview, false),
                    Action::new("Dismiss", ActionKind::Dismiss, false),
                ]
            },
        },
        "cultural_inspiration" => Template {
            kind: MessageKind::Education,
            title: "{icon} {name} found related traditions",
            body: "Your recent work echoes motifs from several folk traditions. I \
                   can pull reference material worth a look.",
            actions: || {
                vec![
                    Action::new("Show references", ActionKind::Preview, true),
                    Action::new("Add to board", ActionKind::Apply, false),
                    Action::new("Don't show these", ActionKind::Never, false),
                ]
            },
        },
        _ => return None,
    };
    Some(template)
}

/// Build the message for a fired trigger. Returns `None` for unknown trigger
/// types (defensive, not an error); the caller's cooldown stamp stands
/// either way.
pub fn build_message(
    trigger_type: &str,
    persona: Persona,
    meta: &PersonaMeta,
    event: &DomainEvent,
) -> Option<Message> {
    let template = template_for(trigger_type)?;

    let title = template
        .title
        .replace("{icon}", &meta.icon)
        .replace("{name}", &meta.display_name);

    let mut message = Message::new(persona, template.kind, title.trim(), template.body, (template.actions)());
    message.context = Some(json!({
        "triggerType": trigger_type,
        "eventKind": event.kind,
    }));
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::PersonaCatalog;
    use crate::types::event_kinds;

    #[test]
    fn test_known_type_builds_interpolated_message() {
        let catalog = PersonaCatalog::builtin();
        let meta = catalog.meta(Persona::Muse);
        let event = DomainEvent::new(event_kinds::CANVAS_EMPTIED);

        let message = build_message("empty_canvas", Persona::Muse, meta, &event).expect("message");
        assert_eq!(message.kind, MessageKind::Suggestion);
        assert!(message.title.contains("Muse"));
        assert!(!message.is_read);
        assert!(!message.is_dismissed);
        assert_eq!(
            message.context.as_ref().and_then(|c| c.get("triggerType")),
            Some(&serde_json::json!("empty_canvas"))
        );
    }

    #[test]
    fn test_exactly_one_primary_action_per_template() {
        let catalog = PersonaCatalog::builtin();
        let event = DomainEvent::new(event_kinds::CARD_CREATED);
        for trigger in crate::triggers::catalog::default_registry() {
            let meta = catalog.meta(trigger.persona);
            let message =
                build_message(&trigger.trigger_type, trigger.persona, meta, &event).expect("message");
            let primaries = message.actions.iter().filter(|a| a.is_primary).count();
            assert_eq!(primaries, 1, "template '{}'", trigger.trigger_type);
        }
    }

    #[test]
    fn test_unknown_type_returns_none() {
        let catalog = PersonaCatalog::builtin();
        let meta = catalog.meta(Persona::Muse);
        let event = DomainEvent::new(event_kinds::CANVAS_EMPTIED);
        assert!(build_message("totally_unknown", Persona::Muse, meta, &event).is_none());
    }
}
