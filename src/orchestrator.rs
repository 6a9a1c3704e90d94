//! The orchestrator instance: event intake, trigger evaluation, exposed API
//!
//! One `Orchestrator` exists per process, constructed once with its injected
//! collaborators (preference store, persona catalog, trigger registry) and
//! shared as `Arc`. All state mutation flows through the internal store's
//! designated operations; the trigger registry's cooldown stamps are guarded
//! by a lock held for the whole evaluation pass, so concurrent `handle_event`
//! calls serialize.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use crate::messages::build_message;
use crate::personas::{Persona, PersonaCatalog};
use crate::preferences::{PreferenceStore, PreferencesGateway, PreferencesPatch};
use crate::store::{ListenerId, StateStore};
use crate::triggers::catalog::default_registry;
use crate::triggers::{condition_matches, Trigger};
use crate::types::{
    event_kinds, Action, DomainEvent, Message, MessageKind, OrchestratorState, Suggestion,
    SuggestionInput,
};
use crate::watchdog::IdleWatchdog;

pub struct Orchestrator {
    pub(crate) store: StateStore,
    pub(crate) catalog: PersonaCatalog,
    registry: parking_lot::Mutex<Vec<Trigger>>,
    gateway: PreferencesGateway,
    watchdog: IdleWatchdog,
}

impl Orchestrator {
    /// Construct with the built-in trigger registry and persona catalog.
    ///
    /// Must be called inside a Tokio runtime: `handle_event` schedules the
    /// idle watchdog on the ambient runtime.
    pub fn new(preference_store: Arc<dyn PreferenceStore>) -> Arc<Self> {
        Self::with_parts(default_registry(), PersonaCatalog::builtin(), preference_store)
    }

    /// Construct with explicit collaborators (custom registry/catalog).
    pub fn with_parts(
        triggers: Vec<Trigger>,
        catalog: PersonaCatalog,
        preference_store: Arc<dyn PreferenceStore>,
    ) -> Arc<Self> {
        let gateway = PreferencesGateway::new(preference_store);
        let preferences = gateway.load();
        log::info!(
            "orchestrator: starting with {} triggers, {} personas enabled",
            triggers.len(),
            preferences.enabled_personas.len()
        );

        Arc::new(Self {
            store: StateStore::new(preferences),
            catalog,
            registry: parking_lot::Mutex::new(triggers),
            gateway,
            watchdog: IdleWatchdog::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Snapshot and subscriptions
    // -----------------------------------------------------------------------

    pub fn state(&self) -> OrchestratorState {
        self.store.snapshot()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&OrchestratorState) + Send + Sync + 'static,
    ) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn subscribe_to_messages(
        &self,
        listener: impl Fn(&Message) + Send + Sync + 'static,
    ) -> ListenerId {
        self.store.subscribe_to_messages(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.store.unsubscribe(id);
    }

    // -----------------------------------------------------------------------
    // Event intake
    // -----------------------------------------------------------------------

    /// Ingest a domain event: reset the idle watchdog, then evaluate every
    /// registry trigger against it. Each matching eligible trigger fires at
    /// most one message; all eligible triggers fire independently.
    pub fn handle_event(self: &Arc<Self>, event: DomainEvent) {
        log::debug!("orchestrator: event '{}'", event.kind);

        self.watchdog.touch();
        let delay = Duration::from_millis(self.store.snapshot().preferences.auto_suggest_delay_ms);
        let weak = Arc::downgrade(self);
        self.watchdog.reschedule(delay, move || {
            if let Some(orchestrator) = weak.upgrade() {
                orchestrator.on_idle_timeout();
            }
        });

        self.evaluate_triggers(&event);
    }

    fn evaluate_triggers(&self, event: &DomainEvent) {
        let preferences = self.store.snapshot().preferences;

        // Stamp cooldowns and build messages under the registry lock, then
        // push outside it so listener callbacks cannot deadlock against a
        // concurrent evaluation.
        let fired: Vec<Message> = {
            let mut registry = self.registry.lock();
            let now = Instant::now();
            let mut fired = Vec::new();

            for trigger in registry.iter_mut() {
                if !preferences.enabled_personas.contains(&trigger.persona) {
                    continue;
                }
                if preferences.muted_trigger_types.contains(&trigger.trigger_type) {
                    continue;
                }
                if trigger.in_cooldown(now) {
                    continue;
                }
                if !condition_matches(&trigger.condition, event) {
                    continue;
                }

                // Stamp before consulting the factory: a broken template must
                // not hot-loop on every event.
                trigger.last_fired_at = Some(now);

                let meta = self.catalog.meta(trigger.persona);
                match build_message(&trigger.trigger_type, trigger.persona, meta, event) {
                    Some(message) => {
                        log::info!(
                            "orchestrator: trigger '{}' fired for {}",
                            trigger.trigger_type,
                            trigger.persona
                        );
                        fired.push(message);
                    }
                    None => log::warn!(
                        "orchestrator: trigger '{}' has no message template",
                        trigger.trigger_type
                    ),
                }
            }
            fired
        };

        for message in fired {
            self.store.push_message(message);
        }
    }

    fn on_idle_timeout(self: &Arc<Self>) {
        let idle_ms = self.watchdog.idle_elapsed().as_millis() as u64;
        log::debug!("orchestrator: idle for {}ms, synthesizing user_idle", idle_ms);
        self.handle_event(DomainEvent::with_payload(
            event_kinds::USER_IDLE,
            json!({ "idleTimeMs": idle_ms }),
        ));
    }

    /// Cancel the idle watchdog. Event handling after this restarts it.
    pub fn stop(&self) {
        self.watchdog.stop();
    }

    // -----------------------------------------------------------------------
    // Panel and presence
    // -----------------------------------------------------------------------

    pub fn open_panel(&self, persona: Option<Persona>) {
        self.store.open_panel(persona);
    }

    pub fn close_panel(&self) {
        self.store.close_panel();
    }

    pub fn set_active_persona(&self, persona: Persona) {
        self.store.set_active_persona(persona);
    }

    pub fn set_presence_visible(&self, visible: bool) {
        self.store.set_presence_visible(visible);
    }

    // -----------------------------------------------------------------------
    // Message lifecycle
    // -----------------------------------------------------------------------

    pub fn mark_read(&self, message_id: &str) -> bool {
        self.store.mark_read(message_id)
    }

    pub fn dismiss(&self, message_id: &str) -> bool {
        self.store.dismiss(message_id)
    }

    pub fn clear_messages(&self) {
        self.store.clear_messages();
    }

    /// Create a message directly, outside the trigger path. Returns the
    /// stored message.
    pub fn notify(
        &self,
        persona: Persona,
        kind: MessageKind,
        title: &str,
        body: &str,
        actions: Vec<Action>,
    ) -> Message {
        let message = Message::new(persona, kind, title, body, actions);
        self.store.push_message(message.clone());
        message
    }

    // -----------------------------------------------------------------------
    // Suggestion lifecycle
    // -----------------------------------------------------------------------

    pub fn add_suggestion(&self, input: SuggestionInput) -> Suggestion {
        let suggestion = input.into_suggestion();
        self.store.push_suggestion(suggestion.clone());
        suggestion
    }

    pub fn remove_suggestion(&self, suggestion_id: &str) -> bool {
        self.store.remove_suggestion(suggestion_id)
    }

    pub fn clear_suggestions(&self) {
        self.store.clear_suggestions();
    }

    // -----------------------------------------------------------------------
    // Host-driven analysis
    // -----------------------------------------------------------------------

    /// Flip the (process-wide) analysis flag on for a host-driven analysis.
    pub fn start_analysis(&self, persona: Persona) {
        log::info!("orchestrator: host-driven analysis started for {}", persona);
        self.store.begin_analysis();
    }

    pub fn update_analysis_progress(&self, pct: u8) {
        self.store.set_analysis_progress(pct);
    }

    pub fn complete_analysis(&self) {
        self.store.finish_analysis();
    }

    // -----------------------------------------------------------------------
    // Preferences
    // -----------------------------------------------------------------------

    /// Overlay a partial preferences update and persist through the gateway.
    /// Persistence failures are logged; in-memory state stays authoritative.
    pub fn save_preferences(&self, patch: PreferencesPatch) {
        let mut preferences = self.store.snapshot().preferences;
        patch.apply_to(&mut preferences);
        self.store.set_preferences(preferences.clone());
        self.gateway.save(&preferences);
    }
}
