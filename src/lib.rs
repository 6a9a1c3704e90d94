//! Proactive agent orchestration core for the Atelier creative studio.
//!
//! Ingests domain events from the host application, evaluates a registry of
//! rate-limited triggers against them, surfaces templated persona messages
//! to subscribers, and manages the notification/suggestion lifecycle,
//! including the staged analysis pipeline behind the `apply` action and the
//! idle watchdog that turns event silence into synthetic `user_idle` events.
//!
//! The host constructs one [`Orchestrator`] at startup with its injected
//! collaborators and drives it through [`Orchestrator::handle_event`] and
//! [`Orchestrator::execute_action`]; the UI layer reads snapshots and
//! subscribes to the two notification channels.

pub mod error;
mod executor;
pub mod messages;
pub mod orchestrator;
pub mod personas;
pub mod preferences;
pub mod store;
pub mod suggestions;
pub mod triggers;
pub mod types;
mod watchdog;

pub use error::{ActionError, StoreError};
pub use orchestrator::Orchestrator;
pub use personas::{Persona, PersonaCatalog, PersonaMeta};
pub use preferences::{
    AgentPreferences, FilePreferenceStore, MemoryPreferenceStore, PreferenceStore,
    PreferencesPatch,
};
pub use store::ListenerId;
pub use types::{
    event_kinds, Action, ActionKind, ActionOutcome, DomainEvent, Message, MessageKind,
    OrchestratorState, Suggestion, SuggestionInput,
};
