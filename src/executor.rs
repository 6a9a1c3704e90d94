//! Action execution engine
//!
//! Interprets user/automated responses to a message. Every branch is wrapped
//! at the boundary so failures become `{success: false, error}` instead of
//! propagating; a bad action can never crash the host. The `apply` branch
//! runs the staged analysis pipeline: timer-driven progress ticks ending in
//! exactly one synthesized suggestion.

use std::time::Duration;

use serde_json::{json, Value};

use crate::error::ActionError;
use crate::orchestrator::Orchestrator;
use crate::personas::Persona;
use crate::suggestions;
use crate::types::{Action, ActionKind, ActionOutcome, Message, Suggestion};

/// Number of progress ticks in a staged analysis.
const ANALYSIS_STEPS: u8 = 10;

/// Delay between progress ticks.
const ANALYSIS_TICK: Duration = Duration::from_millis(100);

impl Orchestrator {
    /// Dispatch an action against the message that carried it.
    pub async fn execute_action(&self, message: &Message, action: &Action) -> ActionOutcome {
        log::debug!(
            "executor: {:?} on message {} ({})",
            action.kind,
            message.id,
            message.persona
        );
        match self.run_action(message, action).await {
            Ok(result) => ActionOutcome::ok(result),
            Err(e) => {
                log::warn!("executor: action failed: {}", e);
                ActionOutcome::failure(e.to_string())
            }
        }
    }

    async fn run_action(
        &self,
        message: &Message,
        action: &Action,
    ) -> Result<Option<Value>, ActionError> {
        match action.kind {
            ActionKind::Apply => {
                let suggestion = self.run_analysis(message).await;
                Ok(Some(serde_json::to_value(&suggestion)?))
            }
            // Explicitly read-only: no state mutation.
            ActionKind::Preview => Ok(Some(json!({ "preview": true }))),
            ActionKind::Modify => {
                self.store.open_panel(Some(message.persona));
                Ok(None)
            }
            ActionKind::Dismiss => {
                self.store.dismiss(&message.id);
                Ok(None)
            }
            // Snooze does not schedule a re-surface; it currently behaves
            // exactly like dismiss.
            ActionKind::Snooze => {
                self.store.dismiss(&message.id);
                Ok(None)
            }
            // Never dismisses without muting the trigger type; the mute set
            // stays host-managed via save_preferences.
            ActionKind::Never => {
                self.store.dismiss(&message.id);
                Ok(None)
            }
            ActionKind::Custom => self.run_custom(message, action),
            ActionKind::Unknown => Err(ActionError::UnknownAction),
        }
    }

    /// Payload-driven side channel. Recognized shapes: `{switchTo: persona}`
    /// and `{action: "retry"|"export"}` (acknowledged only; the host
    /// intercepts these through its own event hooks).
    fn run_custom(&self, _message: &Message, action: &Action) -> Result<Option<Value>, ActionError> {
        let payload = action.payload.as_ref().unwrap_or(&Value::Null);

        if let Some(target) = payload.get("switchTo").and_then(Value::as_str) {
            let persona = Persona::parse(target)
                .ok_or_else(|| ActionError::UnknownPersona(target.to_string()))?;
            self.store.open_panel(Some(persona));
            return Ok(None);
        }

        if let Some(name) = payload.get("action").and_then(Value::as_str) {
            log::info!("executor: custom action '{}' acknowledged (host-handled)", name);
            return Ok(Some(json!({ "acknowledged": name })));
        }

        log::debug!("executor: custom action with unrecognized payload, no-op");
        Ok(None)
    }

    /// The staged analysis protocol: progress advances 0→100 in fixed
    /// increments with a state notification at each step, then exactly one
    /// suggestion is appended and the originating message marked read.
    ///
    /// There is no cancellation path: once started the pipeline runs to
    /// completion. The analysis flag is process-wide, so overlapping apply
    /// calls clobber each other's progress; callers wanting isolation must
    /// serialize applies themselves.
    async fn run_analysis(&self, message: &Message) -> Suggestion {
        self.store.begin_analysis();

        for step in 1..=ANALYSIS_STEPS {
            tokio::time::sleep(ANALYSIS_TICK).await;
            self.store.set_analysis_progress(step * 10);
        }
        self.store.finish_analysis();

        let meta = self.catalog.meta(message.persona);
        let suggestion = suggestions::synthesize(message.persona, meta);
        self.store.push_suggestion(suggestion.clone());
        self.store.mark_read(&message.id);

        log::info!(
            "executor: analysis complete, suggestion {} for {}",
            suggestion.id,
            message.persona
        );
        suggestion
    }
}
