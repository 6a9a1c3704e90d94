//! Suggestion synthesis for the analysis pipeline
//!
//! The `apply` action's staged analysis ends by synthesizing one suggestion
//! from a per-persona template. Content is placeholder copy (no real
//! inference happens here); confidence is drawn from a fixed band and always
//! capped below 1.0.

use chrono::Utc;
use rand::RngExt;
use uuid::Uuid;

use crate::personas::{Persona, PersonaMeta};
use crate::types::{Action, ActionKind, Suggestion};

/// Confidence band for synthesized suggestions.
const CONFIDENCE_MIN: f64 = 0.82;
const CONFIDENCE_MAX: f64 = 0.95;

fn copy_for(persona: Persona) -> (&'static str, &'static str) {
    match persona {
        Persona::Muse => (
            "Three directions worth exploring",
            "Seeded from your recent cards: a looser composition, a warmer \
             palette, and a close-crop variant.",
        ),
        Persona::Curator => (
            "Group these into a collection",
            "Several recent assets share palette and subject. Filing them \
             together will keep the library searchable.",
        ),
        Persona::Architect => (
            "Restructure the failing step",
            "Splitting the heavy step into two stages should stop the \
             failures you've been seeing.",
        ),
        Persona::Packager => (
            "Export set ready to assemble",
            "The finished outputs fit a standard delivery bundle: web-ready \
             sizes plus print-resolution originals.",
        ),
        Persona::HeritageGuide => (
            "Context worth attaching",
            "The motifs in this set have documented origins. Attaching a \
             short provenance note keeps the work well-attributed.",
        ),
    }
}

/// Synthesize the suggestion a completed analysis produces for `persona`.
pub fn synthesize(persona: Persona, meta: &PersonaMeta) -> Suggestion {
    let (title, description) = copy_for(persona);
    let confidence = rand::rng().random_range(CONFIDENCE_MIN..CONFIDENCE_MAX);

    Suggestion {
        id: format!("sug-{}", Uuid::new_v4()),
        persona,
        title: format!("{} {}", meta.icon, title).trim().to_string(),
        description: description.to_string(),
        confidence,
        actions: vec![
            Action::new("Apply", ActionKind::Apply, true),
            Action::new("Preview", ActionKind::Preview, false),
            Action::new("Dismiss", ActionKind::Dismiss, false),
        ],
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::PersonaCatalog;

    #[test]
    fn test_confidence_stays_in_band() {
        let catalog = PersonaCatalog::builtin();
        for persona in Persona::ALL {
            let suggestion = synthesize(persona, catalog.meta(persona));
            assert!(suggestion.confidence >= CONFIDENCE_MIN);
            assert!(suggestion.confidence < 1.0);
        }
    }

    #[test]
    fn test_suggestion_shape() {
        let catalog = PersonaCatalog::builtin();
        let suggestion = synthesize(Persona::Packager, catalog.meta(Persona::Packager));
        assert!(suggestion.id.starts_with("sug-"));
        assert_eq!(suggestion.persona, Persona::Packager);
        assert_eq!(suggestion.actions.iter().filter(|a| a.is_primary).count(), 1);
    }
}
