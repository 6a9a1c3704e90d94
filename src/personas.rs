//! Persona identities and the static persona catalog
//!
//! The orchestrator speaks on behalf of a fixed set of five agent personas.
//! The catalog maps each persona to its display metadata and prompt text; it
//! is read-only and consumed by the message/suggestion factories for text
//! interpolation. Hosts may inject a customized catalog at construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One of the fixed agent identities the orchestrator can speak for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Muse,
    Curator,
    Architect,
    Packager,
    HeritageGuide,
}

impl Persona {
    /// All personas in display order.
    pub const ALL: [Persona; 5] = [
        Persona::Muse,
        Persona::Curator,
        Persona::Architect,
        Persona::Packager,
        Persona::HeritageGuide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Muse => "muse",
            Persona::Curator => "curator",
            Persona::Architect => "architect",
            Persona::Packager => "packager",
            Persona::HeritageGuide => "heritage_guide",
        }
    }

    pub fn parse(value: &str) -> Option<Persona> {
        Persona::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata and prompt text for one persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaMeta {
    pub display_name: String,
    pub icon: String,
    /// Accent color as a hex string, e.g. `#c084fc`.
    pub color: String,
    pub description: String,
    pub expertise: Vec<String>,
    pub system_prompt: String,
}

/// Read-only catalog of persona metadata.
pub struct PersonaCatalog {
    entries: HashMap<Persona, PersonaMeta>,
}

/// Built-in catalog entries in display order:
/// (persona, name, icon, color, description, expertise).
const BUILTIN: &[(Persona, &str, &str, &str, &str, &[&str])] = &[
    (
        Persona::Muse,
        "Muse",
        "✨",
        "#c084fc",
        "Sparks new directions when the canvas goes quiet.",
        &["ideation", "prompting", "composition"],
    ),
    (
        Persona::Curator,
        "Curator",
        "🗂️",
        "#38bdf8",
        "Keeps the asset library organized and findable.",
        &["collections", "tagging", "visual-similarity"],
    ),
    (
        Persona::Architect,
        "Architect",
        "📐",
        "#34d399",
        "Diagnoses broken workflows and suggests structural fixes.",
        &["workflows", "debugging", "pipelines"],
    ),
    (
        Persona::Packager,
        "Packager",
        "📦",
        "#fbbf24",
        "Bundles finished work into deliverable sets.",
        &["export", "formats", "delivery"],
    ),
    (
        Persona::HeritageGuide,
        "Heritage Guide",
        "🏛️",
        "#f472b6",
        "Shares the cultural context behind styles and motifs.",
        &["art-history", "cultural-context", "attribution"],
    ),
];

impl PersonaCatalog {
    /// The embedded default catalog covering every persona.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(persona, name, icon, color, description, expertise)| {
                (
                    *persona,
                    PersonaMeta {
                        display_name: (*name).to_string(),
                        icon: (*icon).to_string(),
                        color: (*color).to_string(),
                        description: (*description).to_string(),
                        expertise: expertise.iter().map(|s| (*s).to_string()).collect(),
                        system_prompt: format!(
                            "You are {name}, a studio agent. {description}"
                        ),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Build a catalog from host-supplied entries. Personas the host leaves
    /// out fall back to a minimal derived entry so lookups never fail.
    pub fn new(mut entries: HashMap<Persona, PersonaMeta>) -> Self {
        for persona in Persona::ALL {
            entries.entry(persona).or_insert_with(|| PersonaMeta {
                display_name: persona.as_str().to_string(),
                icon: String::new(),
                color: "#94a3b8".to_string(),
                description: String::new(),
                expertise: Vec::new(),
                system_prompt: String::new(),
            });
        }
        Self { entries }
    }

    pub fn meta(&self, persona: Persona) -> &PersonaMeta {
        // Both constructors guarantee full coverage.
        &self.entries[&persona]
    }
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
