//! State store and subscriber channels
//!
//! Holds the single mutable `OrchestratorState` snapshot. Every mutating
//! operation replaces the held state through a designated method and
//! synchronously notifies the state-changed channel with the new snapshot;
//! message creation additionally notifies the message-created channel with
//! just the new message. Listener callbacks run outside the state lock and
//! each call is panic-isolated, so one faulty subscriber cannot block or
//! poison the rest.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::personas::Persona;
use crate::preferences::AgentPreferences;
use crate::types::{Message, OrchestratorState, Suggestion, MAX_LIVE_MESSAGES, MAX_SUGGESTIONS};

type StateListener = Arc<dyn Fn(&OrchestratorState) + Send + Sync>;
type MessageListener = Arc<dyn Fn(&Message) + Send + Sync>;

/// Unsubscribe token returned by `subscribe`/`subscribe_to_messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

pub struct StateStore {
    state: RwLock<OrchestratorState>,
    state_listeners: Mutex<Vec<(u64, StateListener)>>,
    message_listeners: Mutex<Vec<(u64, MessageListener)>>,
    next_listener_id: AtomicU64,
}

impl StateStore {
    pub fn new(preferences: AgentPreferences) -> Self {
        Self {
            state: RwLock::new(OrchestratorState::with_preferences(preferences)),
            state_listeners: Mutex::new(Vec::new()),
            message_listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// Immutable snapshot of the current state.
    pub fn snapshot(&self) -> OrchestratorState {
        self.state.read().clone()
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub fn subscribe(
        &self,
        listener: impl Fn(&OrchestratorState) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.state_listeners.lock().push((id, Arc::new(listener)));
        ListenerId(id)
    }

    pub fn subscribe_to_messages(
        &self,
        listener: impl Fn(&Message) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.message_listeners.lock().push((id, Arc::new(listener)));
        ListenerId(id)
    }

    /// Remove a listener from whichever channel it was registered on.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.state_listeners.lock().retain(|(lid, _)| *lid != id.0);
        self.message_listeners.lock().retain(|(lid, _)| *lid != id.0);
    }

    fn notify_state(&self, snapshot: &OrchestratorState) {
        // Clone the listener handles out so callbacks run without the lock
        // held and may re-enter subscribe/snapshot.
        let listeners: Vec<(u64, StateListener)> = self.state_listeners.lock().clone();
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
                log::warn!("store: state listener {} panicked, continuing", id);
            }
        }
    }

    fn notify_message(&self, message: &Message) {
        let listeners: Vec<(u64, MessageListener)> = self.message_listeners.lock().clone();
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(message))).is_err() {
                log::warn!("store: message listener {} panicked, continuing", id);
            }
        }
    }

    /// Apply a mutation, recompute the unread count, and notify state
    /// listeners with the new snapshot.
    fn mutate(&self, f: impl FnOnce(&mut OrchestratorState)) {
        let snapshot = {
            let mut state = self.state.write();
            f(&mut state);
            state.unread_count = state
                .messages
                .iter()
                .filter(|m| !m.is_read && !m.is_dismissed)
                .count();
            state.clone()
        };
        self.notify_state(&snapshot);
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Append a message, evicting the oldest entries past capacity, and
    /// notify both channels.
    pub fn push_message(&self, message: Message) {
        self.mutate(|state| {
            state.messages.push(message.clone());
            if state.messages.len() > MAX_LIVE_MESSAGES {
                let overflow = state.messages.len() - MAX_LIVE_MESSAGES;
                state.messages.drain(..overflow);
            }
        });
        self.notify_message(&message);
    }

    pub fn mark_read(&self, id: &str) -> bool {
        let mut found = false;
        self.mutate(|state| {
            if let Some(message) = state.messages.iter_mut().find(|m| m.id == id) {
                message.is_read = true;
                found = true;
            }
        });
        found
    }

    /// Dismissal is monotone: this only ever sets the flag.
    pub fn dismiss(&self, id: &str) -> bool {
        let mut found = false;
        self.mutate(|state| {
            if let Some(message) = state.messages.iter_mut().find(|m| m.id == id) {
                message.is_dismissed = true;
                found = true;
            }
        });
        found
    }

    pub fn clear_messages(&self) {
        self.mutate(|state| state.messages.clear());
    }

    // -----------------------------------------------------------------------
    // Suggestions
    // -----------------------------------------------------------------------

    pub fn push_suggestion(&self, suggestion: Suggestion) {
        self.mutate(|state| {
            state.suggestions.push(suggestion);
            if state.suggestions.len() > MAX_SUGGESTIONS {
                let overflow = state.suggestions.len() - MAX_SUGGESTIONS;
                state.suggestions.drain(..overflow);
            }
        });
    }

    pub fn remove_suggestion(&self, id: &str) -> bool {
        let mut found = false;
        self.mutate(|state| {
            let before = state.suggestions.len();
            state.suggestions.retain(|s| s.id != id);
            found = state.suggestions.len() != before;
        });
        found
    }

    pub fn clear_suggestions(&self) {
        self.mutate(|state| state.suggestions.clear());
    }

    // -----------------------------------------------------------------------
    // Panel and presence
    // -----------------------------------------------------------------------

    pub fn open_panel(&self, persona: Option<Persona>) {
        self.mutate(|state| {
            state.is_panel_open = true;
            if let Some(persona) = persona {
                state.active_persona = Some(persona);
            }
        });
    }

    pub fn close_panel(&self) {
        self.mutate(|state| state.is_panel_open = false);
    }

    pub fn set_active_persona(&self, persona: Persona) {
        self.mutate(|state| state.active_persona = Some(persona));
    }

    pub fn set_presence_visible(&self, visible: bool) {
        self.mutate(|state| state.is_presence_visible = visible);
    }

    // -----------------------------------------------------------------------
    // Analysis flag
    // -----------------------------------------------------------------------

    pub fn begin_analysis(&self) {
        self.mutate(|state| {
            state.is_analyzing = true;
            state.analysis_progress = 0;
        });
    }

    pub fn set_analysis_progress(&self, pct: u8) {
        self.mutate(|state| state.analysis_progress = pct.min(100));
    }

    pub fn finish_analysis(&self) {
        self.mutate(|state| {
            state.is_analyzing = false;
            state.analysis_progress = 100;
        });
    }

    // -----------------------------------------------------------------------
    // Preferences
    // -----------------------------------------------------------------------

    pub fn set_preferences(&self, preferences: AgentPreferences) {
        self.mutate(|state| state.preferences = preferences);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, MessageKind};
    use parking_lot::Mutex as PlMutex;

    fn message(title: &str) -> Message {
        Message::new(Persona::Muse, MessageKind::Suggestion, title, "body", Vec::new())
    }

    fn store() -> StateStore {
        StateStore::new(AgentPreferences::default())
    }

    #[test]
    fn test_unread_count_tracks_messages() {
        let store = store();
        let first = message("one");
        let first_id = first.id.clone();
        store.push_message(first);
        store.push_message(message("two"));
        assert_eq!(store.snapshot().unread_count, 2);

        assert!(store.mark_read(&first_id));
        assert_eq!(store.snapshot().unread_count, 1);
    }

    #[test]
    fn test_dismiss_drops_from_unread_and_is_monotone() {
        let store = store();
        let msg = message("one");
        let id = msg.id.clone();
        store.push_message(msg);

        assert!(store.dismiss(&id));
        let state = store.snapshot();
        assert_eq!(state.unread_count, 0);
        assert!(state.messages[0].is_dismissed);

        // No operation reverts the flag.
        store.mark_read(&id);
        assert!(store.snapshot().messages[0].is_dismissed);
    }

    #[test]
    fn test_capacity_evicts_oldest_message() {
        let store = store();
        let first = message("first");
        let first_id = first.id.clone();
        store.push_message(first);
        for i in 0..MAX_LIVE_MESSAGES {
            store.push_message(message(&format!("m{}", i)));
        }

        let state = store.snapshot();
        assert_eq!(state.messages.len(), MAX_LIVE_MESSAGES);
        assert!(state.messages.iter().all(|m| m.id != first_id));
        assert_eq!(state.messages.last().map(|m| m.title.as_str()), Some("m49"));
    }

    #[test]
    fn test_suggestion_capacity() {
        let store = store();
        for i in 0..(MAX_SUGGESTIONS + 3) {
            store.push_suggestion(
                crate::types::SuggestionInput {
                    persona: Persona::Curator,
                    title: format!("s{}", i),
                    description: String::new(),
                    confidence: 0.9,
                    actions: Vec::new(),
                }
                .into_suggestion(),
            );
        }
        let state = store.snapshot();
        assert_eq!(state.suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(state.suggestions[0].title, "s3");
    }

    #[test]
    fn test_clear_messages_resets_unread() {
        let store = store();
        store.push_message(message("one"));
        store.push_message(message("two"));
        store.clear_messages();

        let state = store.snapshot();
        assert!(state.messages.is_empty());
        assert_eq!(state.unread_count, 0);
    }

    #[test]
    fn test_message_channel_receives_only_new_message() {
        let store = store();
        let seen: Arc<PlMutex<Vec<String>>> = Arc::new(PlMutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe_to_messages(move |m| sink.lock().push(m.title.clone()));

        store.push_message(message("hello"));
        store.mark_read("nonexistent");

        assert_eq!(seen.lock().as_slice(), ["hello".to_string()]);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let store = store();
        store.subscribe(|_| panic!("bad subscriber"));

        let seen = Arc::new(PlMutex::new(0usize));
        let sink = seen.clone();
        store.subscribe(move |_| *sink.lock() += 1);

        store.push_message(message("one"));
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = store();
        let seen = Arc::new(PlMutex::new(0usize));
        let sink = seen.clone();
        let id = store.subscribe(move |_| *sink.lock() += 1);

        store.close_panel();
        store.unsubscribe(id);
        store.close_panel();

        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_open_panel_sets_active_persona() {
        let store = store();
        store.open_panel(Some(Persona::Curator));
        let state = store.snapshot();
        assert!(state.is_panel_open);
        assert_eq!(state.active_persona, Some(Persona::Curator));

        // Reopening without a persona keeps the current one.
        store.close_panel();
        store.open_panel(None);
        assert_eq!(store.snapshot().active_persona, Some(Persona::Curator));
    }

    #[test]
    fn test_analysis_progress_clamped() {
        let store = store();
        store.begin_analysis();
        store.set_analysis_progress(250);
        let state = store.snapshot();
        assert!(state.is_analyzing);
        assert_eq!(state.analysis_progress, 100);

        store.finish_analysis();
        assert!(!store.snapshot().is_analyzing);
    }
}
